//! Force-directed relaxation: inverse-square repulsion between every pair, Hooke springs along
//! edges, damped explicit integration.
//!
//! Repulsion is O(N²) per iteration, which keeps this practical for tens to low hundreds of
//! nodes.

use super::{MIN_FORCE_DISTANCE, Sim, repair};
use crate::geom::Vector;

/// Runs the configured number of iterations (or fewer, when a convergence epsilon is set and
/// reached). Returns the number of iterations run.
pub(super) fn run(sim: &mut Sim<'_>) -> usize {
    let max_iterations = sim.opts.iterations;
    for iteration in 1..=max_iterations {
        let moved = step(sim);
        if sim.opts.convergence_epsilon.is_some_and(|eps| moved < eps) {
            return iteration;
        }
    }
    max_iterations
}

/// One relaxation iteration followed by the per-iteration repairs. Returns the largest
/// displacement produced by the physics (before repair).
fn step(sim: &mut Sim<'_>) -> f64 {
    sim.force.fill(Vector::zero());
    apply_repulsion(sim);
    apply_springs(sim);
    let moved = integrate(sim);

    repair::fit(sim);
    repair::clamp(sim);
    repair::separate_overlaps(sim);
    repair::hierarchy(sim);
    moved
}

fn apply_repulsion(sim: &mut Sim<'_>) {
    let n = sim.len();
    let c = sim.opts.repulsion;
    for i in 0..n {
        for j in (i + 1)..n {
            let (dir, dist) = sim.push_direction(i, j);
            let d = dist.max(MIN_FORCE_DISTANCE);
            let mut magnitude = c / (d * d);
            if sim.footprints_overlap(i, j) {
                magnitude *= sim.opts.overlap_scale;
            }
            let f = dir * magnitude;
            sim.force[i] += f;
            sim.force[j] -= f;
        }
    }
}

fn apply_springs(sim: &mut Sim<'_>) {
    let graph = sim.graph;
    let dependencies = graph.dependencies().map(|e| (e.child, e.parent));
    let relations = graph
        .relations()
        .filter(|_| sim.opts.relation_attraction)
        .map(|e| e.endpoints());
    let springs: Vec<(usize, usize)> = dependencies.chain(relations).collect();

    let k = sim.opts.spring;
    let rest = sim.opts.min_dist;
    for (a, b) in springs {
        // Overlapping pairs are left to repulsion and overlap repair.
        if sim.footprints_overlap(a, b) {
            continue;
        }
        let (dir, dist) = sim.push_direction(b, a);
        if dist <= 0.0 {
            continue;
        }
        // `dir` points from a to b: positive force pulls a towards b.
        let f = dir * (k * (dist - rest));
        sim.force[a] += f;
        sim.force[b] -= f;
    }
}

/// `v = (v + F) * damping`, capped at `max_velocity`, then `pos += v`. Returns the largest
/// step length.
fn integrate(sim: &mut Sim<'_>) -> f64 {
    let damping = sim.opts.damping;
    let cap = sim.opts.max_velocity;
    let mut largest = 0.0f64;
    for i in 0..sim.len() {
        let mut v = (sim.vel[i] + sim.force[i]) * damping;
        if let Some(cap) = cap {
            let len = v.length();
            if len > cap {
                v = v * (cap / len);
            }
        }
        if !(v.x.is_finite() && v.y.is_finite()) {
            v = Vector::zero();
        }
        sim.vel[i] = v;
        sim.pos[i] += v;
        largest = largest.max(v.length());
    }
    largest
}
