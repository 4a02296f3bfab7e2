use super::Sim;
use crate::geom::{Point, Size, point};
use crate::options::{LayoutOptions, Strategy};
use std::f64::consts::PI;

pub(super) fn place(sim: &mut Sim<'_>, rings: &[Vec<usize>]) {
    let seeded = match sim.opts.strategy {
        Strategy::Row => rows(rings, &sim.sizes, sim.opts),
        Strategy::Radial => radial(rings, sim.opts),
    };
    for (idx, p) in seeded {
        sim.pos[idx] = p;
    }
}

/// One horizontal band per level inside the padded canvas; nodes evenly spread across the
/// full width.
///
/// A level with more nodes than fit side by side at their spacing wraps into sub-rows that
/// share the band, every other sub-row shifted by half a slot.
fn rows(rings: &[Vec<usize>], sizes: &[Size], opts: &LayoutOptions) -> Vec<(usize, Point)> {
    let level_count = rings.len() as f64;
    let band = opts.inner_height() / level_count;
    let mut out = Vec::new();
    for (li, ring) in rings.iter().enumerate() {
        let top = opts.container_padding + li as f64 * band;
        let capacity = row_capacity(ring, sizes, opts);
        let sub_rows = ring.len().div_ceil(capacity).max(1);
        let per_row = ring.len().div_ceil(sub_rows).max(1);
        for (si, chunk) in ring.chunks(per_row).enumerate() {
            let y = top + (si as f64 + 0.5) * band / sub_rows as f64;
            let slot = opts.container_width / (chunk.len() as f64 + 1.0);
            let stagger = if si % 2 == 1 { slot / 2.0 } else { 0.0 };
            for (ni, &idx) in chunk.iter().enumerate() {
                out.push((idx, point((ni as f64 + 1.0) * slot + stagger, y)));
            }
        }
    }
    out
}

/// How many of the ring's nodes fit across the inner width at their pairwise spacing.
fn row_capacity(ring: &[usize], sizes: &[Size], opts: &LayoutOptions) -> usize {
    let extent = ring
        .iter()
        .map(|&idx| sizes[idx].width.max(sizes[idx].height))
        .fold(0.0f64, f64::max);
    let spacing = opts.min_dist.max(extent);
    let room = opts.inner_width() - extent;
    if !(room.is_finite() && room > 0.0) {
        return 1;
    }
    (room / spacing).floor() as usize + 1
}

/// Concentric rings around the canvas center. Levels past `radial_levels - 1` share the
/// outermost ring.
fn radial(rings: &[Vec<usize>], opts: &LayoutOptions) -> Vec<(usize, Point)> {
    let ring_count = rings.len().min(opts.radial_levels);
    if ring_count == 0 {
        return Vec::new();
    }
    let mut merged: Vec<Vec<usize>> = rings[..ring_count - 1].to_vec();
    merged.push(rings[ring_count - 1..].iter().flatten().copied().collect());

    let cx = opts.container_width / 2.0;
    let cy = opts.container_height / 2.0;
    let step = opts.container_width.min(opts.container_height) / (2.0 * ring_count as f64);
    let mut out = Vec::new();
    for (ri, ring) in merged.iter().enumerate() {
        let radius = (ri as f64 + 1.0) * step;
        for (ni, &idx) in ring.iter().enumerate() {
            let angle = 2.0 * PI * ni as f64 / ring.len() as f64;
            out.push((idx, point(cx + radius * angle.cos(), cy + radius * angle.sin())));
        }
    }
    out
}
