use crate::error::{Diagnostic, Error, Result};
use crate::geom::{Size, size};
use crate::options::LayoutOptions;
use crate::result::LayoutResult;
use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use serde::Serialize;

mod spec;

pub use spec::{DependencySpec, GraphSpec, NodeSpec, Parents, RelationSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub link: Option<String>,
    pub color: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
}

impl Node {
    /// Footprint used for spacing and clamping; unset dimensions fall back to the options.
    pub fn size(&self, opts: &LayoutOptions) -> Size {
        size(
            self.width.unwrap_or(opts.default_node_width),
            self.height.unwrap_or(opts.default_node_height),
        )
    }
}

/// `child` depends on `parent` (both are node indices).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub child: usize,
    pub parent: usize,
}

/// Undirected relation between two node indices, stored with the smaller index first so that
/// `{a, b}` and `{b, a}` are the same edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationEdge {
    a: usize,
    b: usize,
}

impl RelationEdge {
    pub fn new(x: usize, y: usize) -> Self {
        Self {
            a: x.min(y),
            b: x.max(y),
        }
    }

    pub fn endpoints(&self) -> (usize, usize) {
        (self.a, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutState {
    /// No layout, or the graph changed since the last one.
    #[default]
    Stale,
    Computing,
    /// The cached result matches the current structure.
    Fresh,
}

/// Nodes live in a dense arena; per-node data is addressed by index and `index` maps ids back.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: FxHashMap<String, usize>,
    parents: Vec<Vec<usize>>,
    dependencies: IndexSet<DependencyEdge>,
    relations: IndexSet<RelationEdge>,
    diagnostics: Vec<Diagnostic>,
    state: LayoutState,
    result: LayoutResult,
    result_options: Option<LayoutOptions>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from construction records. Rejected records are logged, kept in
    /// [`Graph::diagnostics`] and otherwise skipped.
    pub fn from_spec(spec: &GraphSpec) -> Self {
        let mut g = Self::new();
        for n in &spec.nodes {
            if let Err(err) = g.add_node(n.clone()) {
                g.report(err);
            }
        }
        for d in &spec.dependencies {
            for parent in d.parents.iter() {
                if let Err(err) = g.add_dependency(&d.child, parent) {
                    g.report(err);
                }
            }
        }
        for r in &spec.relations {
            if let Err(err) = g.add_relation(&r.node_a, &r.node_b) {
                g.report(err);
            }
        }
        g
    }

    fn report(&mut self, err: Error) {
        tracing::warn!(error = %err, "graph input skipped");
        self.diagnostics.push(Diagnostic::from(err));
    }

    fn invalidate(&mut self) {
        self.state = LayoutState::Stale;
        self.result = LayoutResult::default();
        self.result_options = None;
    }

    pub fn add_node(&mut self, spec: NodeSpec) -> Result<usize> {
        if self.index.contains_key(spec.id.as_str()) {
            return Err(Error::DuplicateNode { id: spec.id });
        }
        if let Some(err) = check_size(&spec.id, spec.width, spec.height) {
            return Err(err);
        }
        let idx = self.nodes.len();
        self.index.insert(spec.id.clone(), idx);
        self.nodes.push(Node {
            id: spec.id,
            title: spec.title,
            subtitle: spec.subtitle,
            link: spec.link,
            color: spec.color,
            width: spec.width,
            height: spec.height,
        });
        self.parents.push(Vec::new());
        self.invalidate();
        Ok(idx)
    }

    /// Records that `child` depends on `parent`. Repeating an existing dependency is a no-op.
    pub fn add_dependency(&mut self, child: &str, parent: &str) -> Result<()> {
        let c = self.lookup(child, "dependency")?;
        let p = self.lookup(parent, "dependency")?;
        if c == p {
            return Err(Error::SelfDependency {
                id: child.to_string(),
            });
        }
        if self.dependencies.insert(DependencyEdge {
            child: c,
            parent: p,
        }) {
            self.parents[c].push(p);
            self.invalidate();
        }
        Ok(())
    }

    /// Records an undirected relation. Returns `false` when the pair already existed (in
    /// either orientation).
    pub fn add_relation(&mut self, a: &str, b: &str) -> Result<bool> {
        let x = self.lookup(a, "relation")?;
        let y = self.lookup(b, "relation")?;
        if x == y {
            return Err(Error::SelfRelation { id: a.to_string() });
        }
        let inserted = self.relations.insert(RelationEdge::new(x, y));
        if inserted {
            self.invalidate();
        }
        Ok(inserted)
    }

    pub fn set_node_size(&mut self, id: &str, width: f64, height: f64) -> Result<()> {
        let idx = self.lookup(id, "size update")?;
        if let Some(err) = check_size(id, Some(width), Some(height)) {
            return Err(err);
        }
        let node = &mut self.nodes[idx];
        node.width = Some(width);
        node.height = Some(height);
        self.invalidate();
        Ok(())
    }

    fn lookup(&self, id: &str, context: &'static str) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownNode {
                context,
                id: id.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, idx: usize) -> Option<&Node> {
        self.nodes.get(idx)
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.index_of(id).and_then(|idx| self.node(idx))
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node ids in sorted order.
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn parents_of(&self, idx: usize) -> &[usize] {
        self.parents.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.dependencies.iter()
    }

    pub fn relations(&self) -> impl Iterator<Item = &RelationEdge> {
        self.relations.iter()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    /// Runs a full layout and caches it. Always recomputes; see [`Graph::ensure_layout`].
    pub fn layout(&mut self, opts: &LayoutOptions) -> Result<&LayoutResult> {
        opts.validate()?;
        self.state = LayoutState::Computing;
        self.result = crate::algo::run(self, opts);
        self.result_options = Some(opts.clone());
        self.state = LayoutState::Fresh;
        Ok(&self.result)
    }

    /// Returns the cached layout when it is fresh and was computed with `opts`; recomputes
    /// otherwise.
    pub fn ensure_layout(&mut self, opts: &LayoutOptions) -> Result<&LayoutResult> {
        let reusable =
            self.state == LayoutState::Fresh && self.result_options.as_ref() == Some(opts);
        if !reusable {
            self.layout(opts)?;
        }
        Ok(&self.result)
    }

    /// The last layout, only while it is still fresh.
    pub fn result(&self) -> Option<&LayoutResult> {
        (self.state == LayoutState::Fresh).then_some(&self.result)
    }
}

fn check_size(id: &str, width: Option<f64>, height: Option<f64>) -> Option<Error> {
    let ok = |v: Option<f64>| v.is_none_or(|v| v.is_finite() && v > 0.0);
    if ok(width) && ok(height) {
        return None;
    }
    Some(Error::InvalidSize {
        id: id.to_string(),
        width: width.unwrap_or(f64::NAN),
        height: height.unwrap_or(f64::NAN),
    })
}
