//! The layout pipeline: leveling, seeding, relaxation and constraint repair.
//!
//! Per-node state is kept in flat arrays indexed like [`Graph`]'s node arena.

pub mod level;
mod relax;
mod repair;
mod seed;

use crate::error::Diagnostic;
use crate::geom::{Point, Size, Vector};
use crate::graph::Graph;
use crate::options::LayoutOptions;
use crate::result::{LayoutResult, NodePosition};

pub use level::{Leveling, assign as assign_levels};

/// Below this distance inverse-square forces are evaluated at the floor instead.
const MIN_FORCE_DISTANCE: f64 = 1.0;

/// `π(3 - √5)`. Successive multiples never line up, so coincident pairs split along
/// well-spread axes.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

pub(crate) struct Sim<'a> {
    graph: &'a Graph,
    opts: &'a LayoutOptions,
    pos: Vec<Point>,
    vel: Vec<Vector>,
    force: Vec<Vector>,
    sizes: Vec<Size>,
    /// Node indices ordered by level, so parents are repaired before their children.
    order: Vec<usize>,
}

impl<'a> Sim<'a> {
    fn new(graph: &'a Graph, opts: &'a LayoutOptions, leveling: &Leveling) -> Self {
        let n = graph.len();
        let sizes = graph.nodes().iter().map(|node| node.size(opts)).collect();
        let order = leveling.rings.iter().flatten().copied().collect();
        Self {
            graph,
            opts,
            pos: vec![Point::origin(); n],
            vel: vec![Vector::zero(); n],
            force: vec![Vector::zero(); n],
            sizes,
            order,
        }
    }

    fn len(&self) -> usize {
        self.pos.len()
    }

    /// Minimum center distance between `i` and `j`.
    fn spacing(&self, i: usize, j: usize) -> f64 {
        let radius = |s: Size| s.width.max(s.height) / 2.0;
        self.opts
            .min_dist
            .max(radius(self.sizes[i]) + radius(self.sizes[j]))
    }

    /// Unit vector pointing from `j` to `i` and their distance. Coincident nodes split along an
    /// axis derived from the index pair: the lower index moves against it, the higher along it.
    fn push_direction(&self, i: usize, j: usize) -> (Vector, f64) {
        match crate::geom::direction(self.pos[j], self.pos[i]) {
            Some(dir) => dir,
            None => {
                let axis = split_axis(i.min(j), i.max(j));
                let dir = if i < j { -axis } else { axis };
                (dir, 0.0)
            }
        }
    }

    fn footprints_overlap(&self, i: usize, j: usize) -> bool {
        crate::geom::footprints_overlap(self.pos[i], self.sizes[i], self.pos[j], self.sizes[j])
    }
}

fn split_axis(lo: usize, hi: usize) -> Vector {
    let angle = GOLDEN_ANGLE * ((lo + 1) as f64) * ((hi + 1) as f64);
    crate::geom::vector(angle.cos(), angle.sin())
}

pub(crate) fn run(graph: &Graph, opts: &LayoutOptions) -> LayoutResult {
    let leveling = level::assign(graph);
    let mut sim = Sim::new(graph, opts, &leveling);

    seed::place(&mut sim, &leveling.rings);
    repair::hierarchy(&mut sim);
    repair::clamp(&mut sim);

    let iterations = relax::run(&mut sim);
    let settled = repair::settle(&mut sim);

    tracing::debug!(
        nodes = graph.len(),
        levels = leveling.rings.len(),
        iterations,
        settle_passes = settled.passes,
        "layout finished"
    );

    let nodes = graph.nodes();
    let positions = nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| {
            let p = sim.pos[idx];
            (
                node.id.clone(),
                NodePosition {
                    x: p.x,
                    y: p.y,
                    level: leveling.levels[idx],
                },
            )
        })
        .collect();
    let levels = leveling
        .rings
        .iter()
        .map(|ring| ring.iter().map(|&idx| nodes[idx].id.clone()).collect())
        .collect();

    let mut diagnostics = graph.diagnostics().to_vec();
    diagnostics.extend(leveling.cycle);
    // A zero pass budget skips settling entirely; there is nothing to report.
    if !settled.converged && settled.passes > 0 {
        tracing::warn!(
            passes = settled.passes,
            "layout constraints still moving after the last settle pass"
        );
        diagnostics.push(Diagnostic::ConstraintsUnmet {
            passes: settled.passes,
        });
    }

    LayoutResult {
        positions,
        levels,
        iterations,
        diagnostics,
    }
}
