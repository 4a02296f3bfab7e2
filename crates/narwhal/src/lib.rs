#![forbid(unsafe_code)]

//! Headless layout for graphs with hierarchical dependencies and cosmetic relations.
//!
//! A run levels the nodes by their dependencies (longest path), seeds positions from the levels
//! (rows or concentric rings), relaxes them with a damped force simulation and repairs
//! overlaps, canvas bounds and parent/child ordering after every iteration. Everything is
//! deterministic: the same graph and options always produce the same positions.

pub mod algo;
pub mod error;
pub mod geom;
pub mod graph;
pub mod options;
pub mod result;

pub use algo::{Leveling, assign_levels};
pub use error::{Diagnostic, Error, Result};
pub use graph::{
    DependencyEdge, DependencySpec, Graph, GraphSpec, LayoutState, Node, NodeSpec, Parents,
    RelationEdge, RelationSpec,
};
pub use options::{LayoutOptions, Strategy};
pub use result::{LayoutResult, NodePosition};

/// Headless layout entry point: builds a graph from `spec` and lays it out.
///
/// Rejected input records do not fail the call; they show up in
/// [`LayoutResult::diagnostics`].
pub fn layout(spec: &GraphSpec, opts: &LayoutOptions) -> Result<LayoutResult> {
    let mut graph = Graph::from_spec(spec);
    graph.layout(opts).cloned()
}
