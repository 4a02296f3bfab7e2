//! Constraint repair: canvas fitting and clamping, pairwise overlap separation and dependency
//! ordering.
//!
//! Each pass reports whether it moved anything so [`settle`] can tell when all of them hold at
//! once.

use super::Sim;
use crate::geom::{Point, Size, vector};

/// Overlap deficits at or below this are treated as resolved.
const SPACING_TOLERANCE: f64 = 1e-6;
/// Ordering deficits and fit shifts at or below this are treated as resolved. Must stay above
/// rounding noise, or hierarchy repair and clamping keep trading sub-micron moves.
const HIERARCHY_TOLERANCE: f64 = 1e-6;

/// Keeps every footprint inside the padded canvas, per axis. A node larger than the inner
/// canvas on some axis is centered on that axis. Velocity into a wall is dropped.
pub(super) fn clamp(sim: &mut Sim<'_>) -> bool {
    let opts = sim.opts;
    let mut moved = false;
    for i in 0..sim.len() {
        let size = sim.sizes[i];
        let p = sim.pos[i];
        let x = clamp_axis(p.x, opts.container_width, size.width, opts.container_padding);
        let y = clamp_axis(p.y, opts.container_height, size.height, opts.container_padding);
        if x != p.x {
            sim.pos[i].x = x;
            sim.vel[i].x = 0.0;
            moved = true;
        }
        if y != p.y {
            sim.pos[i].y = y;
            sim.vel[i].y = 0.0;
            moved = true;
        }
    }
    moved
}

fn clamp_axis(v: f64, extent: f64, node_extent: f64, padding: f64) -> f64 {
    let lo = padding + node_extent / 2.0;
    let hi = extent - padding - node_extent / 2.0;
    if lo > hi || !v.is_finite() {
        return extent / 2.0;
    }
    v.clamp(lo, hi)
}

/// Translates the whole layout back into the padded canvas. When the footprints' bounding box
/// fits on an axis it is moved just far enough to lie inside; when it does not, it is centered.
/// Relative positions are untouched.
pub(super) fn fit(sim: &mut Sim<'_>) -> bool {
    if sim.pos.is_empty() {
        return false;
    }
    let opts = sim.opts;
    let (x_lo, x_hi) = footprint_span(sim, |p, s| (p.x, s.width));
    let (y_lo, y_hi) = footprint_span(sim, |p, s| (p.y, s.height));
    let dx = fit_shift(x_lo, x_hi, opts.container_width, opts.container_padding);
    let dy = fit_shift(y_lo, y_hi, opts.container_height, opts.container_padding);
    if !(dx.is_finite() && dy.is_finite())
        || (dx.abs() <= HIERARCHY_TOLERANCE && dy.abs() <= HIERARCHY_TOLERANCE)
    {
        return false;
    }
    let shift = vector(dx, dy);
    for p in &mut sim.pos {
        *p += shift;
    }
    true
}

fn footprint_span(sim: &Sim<'_>, axis: impl Fn(Point, Size) -> (f64, f64)) -> (f64, f64) {
    sim.pos
        .iter()
        .zip(&sim.sizes)
        .map(|(&p, &s)| axis(p, s))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (c, extent)| {
            (lo.min(c - extent / 2.0), hi.max(c + extent / 2.0))
        })
}

fn fit_shift(lo: f64, hi: f64, extent: f64, padding: f64) -> f64 {
    if hi - lo > extent - 2.0 * padding {
        return extent / 2.0 - (lo + hi) / 2.0;
    }
    if lo < padding {
        padding - lo
    } else if hi > extent - padding {
        extent - padding - hi
    } else {
        0.0
    }
}

/// Pushes every pair closer than its spacing apart along the line between their centers,
/// half the deficit each.
pub(super) fn separate_overlaps(sim: &mut Sim<'_>) -> bool {
    let n = sim.len();
    let mut moved = false;
    for i in 0..n {
        for j in (i + 1)..n {
            let spacing = sim.spacing(i, j);
            let (dir, dist) = sim.push_direction(i, j);
            let deficit = spacing - dist;
            if deficit <= SPACING_TOLERANCE {
                continue;
            }
            let half = dir * (deficit / 2.0);
            sim.pos[i] += half;
            sim.pos[j] -= half;
            moved = true;
        }
    }
    moved
}

/// Restores `level_offset` between every parent and child, then nudges each child
/// `1 / level_coef` of the way towards its parents' mean x.
pub(super) fn hierarchy(sim: &mut Sim<'_>) -> bool {
    repair_hierarchy(sim, true)
}

/// A violated edge closes its deficit from both ends: the child moves down half of it and the
/// parent moves up half.
fn repair_hierarchy(sim: &mut Sim<'_>, recenter: bool) -> bool {
    let graph = sim.graph;
    let offset = sim.opts.level_offset;
    let coef = sim.opts.level_coef;
    let mut moved = false;
    for k in 0..sim.order.len() {
        let child = sim.order[k];
        let parents = graph.parents_of(child);
        if parents.is_empty() {
            continue;
        }

        for &parent in parents {
            let deficit = sim.pos[parent].y + offset - sim.pos[child].y;
            if deficit > HIERARCHY_TOLERANCE {
                sim.pos[child].y += deficit / 2.0;
                sim.pos[parent].y -= deficit / 2.0;
                moved = true;
            }
        }

        if recenter {
            let mean_x =
                parents.iter().map(|&p| sim.pos[p].x).sum::<f64>() / parents.len() as f64;
            sim.pos[child].x += (mean_x - sim.pos[child].x) / coef;
        }
    }
    moved
}

/// Outcome of [`settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Settled {
    pub passes: usize,
    /// Whether a full pass left every node in place.
    pub converged: bool,
}

/// Repeats {vertical hierarchy, overlap, fit, clamp} until a full pass changes nothing or
/// `settle_passes` is reached. The pass ending on a clamp keeps the result inside the canvas
/// either way.
pub(super) fn settle(sim: &mut Sim<'_>) -> Settled {
    let limit = sim.opts.settle_passes;
    for pass in 1..=limit {
        let mut moved = repair_hierarchy(sim, false);
        moved |= separate_overlaps(sim);
        moved |= fit(sim);
        moved |= clamp(sim);
        if !moved {
            return Settled {
                passes: pass,
                converged: true,
            };
        }
    }
    Settled {
        passes: limit,
        converged: false,
    }
}
