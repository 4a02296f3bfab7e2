use crate::error::Diagnostic;
use crate::geom::{Point, point};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodePosition {
    /// Center of the node.
    pub x: f64,
    pub y: f64,
    pub level: u32,
}

/// Output of a layout run. Positions are keyed (and therefore ordered) by node id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutResult {
    pub positions: BTreeMap<String, NodePosition>,
    /// Node ids grouped by level, shallowest first, sorted within each ring.
    pub levels: Vec<Vec<String>>,
    /// Relaxation iterations actually run.
    pub iterations: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl LayoutResult {
    pub fn position(&self, id: &str) -> Option<Point> {
        self.positions.get(id).map(|p| point(p.x, p.y))
    }

    pub fn level(&self, id: &str) -> Option<u32> {
        self.positions.get(id).map(|p| p.level)
    }

    pub fn has_cycle_warning(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::PossibleCycle { .. }))
    }

    /// Whether spacing or dependency ordering may be violated in [`Self::positions`].
    pub fn has_unmet_constraints(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::ConstraintsUnmet { .. }))
    }
}
