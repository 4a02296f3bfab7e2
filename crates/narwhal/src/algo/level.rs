//! Longest-path leveling over dependency edges.

use crate::error::Diagnostic;
use crate::graph::Graph;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Leveling {
    /// Level per node index.
    pub levels: Vec<u32>,
    /// Node indices grouped by level, shallowest first, each ring sorted by node id. Levels
    /// without nodes (possible only after a cycle) do not produce empty rings.
    pub rings: Vec<Vec<usize>>,
    pub passes: usize,
    /// Set when the pass bound was hit before the levels stabilized.
    pub cycle: Option<Diagnostic>,
}

/// Raises every child above its deepest parent, one sweep per pass, for at most one pass per
/// node. An acyclic graph always settles within that bound; hitting it means a cycle, in which
/// case the levels are frozen as they are.
pub fn assign(graph: &Graph) -> Leveling {
    let n = graph.len();
    let mut levels = vec![0u32; n];
    let mut passes = 0usize;
    let mut stable = n == 0;

    while passes < n {
        passes += 1;
        let mut changed = false;
        for child in 0..n {
            let Some(deepest) = graph.parents_of(child).iter().map(|&p| levels[p]).max() else {
                continue;
            };
            if levels[child] <= deepest {
                levels[child] = deepest.saturating_add(1);
                changed = true;
            }
        }
        if !changed {
            stable = true;
            break;
        }
    }

    let cycle = (!stable).then(|| {
        let mut nodes: Vec<String> = (0..n)
            .filter(|&child| {
                graph
                    .parents_of(child)
                    .iter()
                    .any(|&p| levels[child] <= levels[p])
            })
            .filter_map(|idx| graph.node(idx).map(|node| node.id.clone()))
            .collect();
        nodes.sort();
        tracing::warn!(
            passes,
            nodes = ?nodes,
            "possible circular dependency; keeping partial levels"
        );
        Diagnostic::PossibleCycle { passes, nodes }
    });

    let mut by_level: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (idx, &level) in levels.iter().enumerate() {
        by_level.entry(level).or_default().push(idx);
    }
    let rings = by_level
        .into_values()
        .map(|mut ring| {
            ring.sort_by(|&a, &b| node_id(graph, a).cmp(node_id(graph, b)));
            ring
        })
        .collect();

    Leveling {
        levels,
        rings,
        passes,
        cycle,
    }
}

fn node_id(graph: &Graph, idx: usize) -> &str {
    graph.node(idx).map(|n| n.id.as_str()).unwrap_or_default()
}
