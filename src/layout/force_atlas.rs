//! ForceAtlas2 step function.
//!
//! [`step`] advances the simulation by exactly one frame and mutates the
//! node buffer in place. It keeps no state of its own: everything it needs
//! from the previous frame lives in the nodes (`old_dx`/`old_dy`), and the
//! frame index only selects the phase multiplier. Callers drive it once per
//! animation tick and decide when to stop.
//!
//! Per step:
//! 1. phase multiplier from `frame / total_frames`
//! 2. save previous forces, clear accumulators
//! 3. mass-weighted repulsion between every pair
//! 4. LinLog (or linear) attraction along edges
//! 5. gravity toward the viewport center
//! 6. adaptive per-node and global speed from swinging vs traction
//! 7. capped displacement
//! 8. overlap correction, swept until clean or `max_overlap_sweeps`
//! 9. soft bounds

use super::models::{LayoutConfig, LayoutEdge, LayoutNode};

/// Distances are floored here before any division.
const MIN_DISTANCE: f64 = 0.01;

/// Added to swinging sums so a perfectly still system keeps a finite speed.
const SWING_EPSILON: f64 = 0.01;

/// Pairs within this much of `min_separation` count as separated.
const OVERLAP_TOLERANCE: f64 = 1e-9;

/// Spreads the push direction of coincident pairs around the circle.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Force scale for the current frame.
///
/// `2.0` for the first 20% of the budget (fast separation), `1.0` until 67%
/// (settling), then a linear decay from `1.0` down to `0.3` (fine-tuning).
/// Frames past the budget stay at `0.3`.
pub fn phase_multiplier(frame: usize, total_frames: usize) -> f64 {
    let progress = if total_frames == 0 {
        1.0
    } else {
        (frame as f64 / total_frames as f64).min(1.0)
    };

    if progress < 0.2 {
        2.0
    } else if progress < 0.67 {
        1.0
    } else {
        0.3 + 0.7 * (1.0 - (progress - 0.67) / 0.33)
    }
}

/// Advance the layout by one frame.
///
/// # Panics
///
/// Panics if an edge references a node index outside `nodes`;
/// [`LayoutSession`](super::session::LayoutSession) checks this up front.
pub fn step(
    nodes: &mut [LayoutNode],
    edges: &[LayoutEdge],
    config: &LayoutConfig,
    frame: usize,
    total_frames: usize,
) {
    if nodes.is_empty() {
        return;
    }
    let phase = phase_multiplier(frame, total_frames);

    for node in nodes.iter_mut() {
        node.old_dx = node.dx;
        node.old_dy = node.dy;
        node.dx = 0.0;
        node.dy = 0.0;
    }

    apply_repulsion(nodes, config, phase);
    apply_attraction(nodes, edges, config);
    apply_gravity(nodes, config, phase);

    let speed = adapt_speed(nodes, config);
    displace(nodes, config, speed);

    resolve_overlaps(nodes, config.min_separation, config.max_overlap_sweeps);
    pull_into_bounds(nodes, config);
}

/// Unit vector and floored length of `(dx, dy)`.
fn direction(dx: f64, dy: f64) -> (f64, f64, f64) {
    let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
    (dx / dist, dy / dist, dist)
}

/// Every pair pushes apart with `scaling_ratio · phase · m_i · m_j / d`.
fn apply_repulsion(nodes: &mut [LayoutNode], config: &LayoutConfig, phase: f64) {
    let n = nodes.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (ux, uy, dist) = direction(nodes[i].x - nodes[j].x, nodes[i].y - nodes[j].y);
            let force =
                config.scaling_ratio * phase * nodes[i].mass() * nodes[j].mass() / dist;

            nodes[i].dx += ux * force;
            nodes[i].dy += uy * force;
            nodes[j].dx -= ux * force;
            nodes[j].dy -= uy * force;
        }
    }
}

/// Edges pull their endpoints together.
fn apply_attraction(nodes: &mut [LayoutNode], edges: &[LayoutEdge], config: &LayoutConfig) {
    for edge in edges {
        let (s, t) = (edge.source, edge.target);
        let (ux, uy, dist) = direction(nodes[t].x - nodes[s].x, nodes[t].y - nodes[s].y);

        let weight = edge.weight.powf(config.edge_weight_influence);
        let mut force = if config.lin_log_mode {
            dist.ln_1p() * weight
        } else {
            dist * weight
        };
        if config.outbound_attraction_distribution {
            force /= nodes[s].mass();
        }

        nodes[s].dx += ux * force;
        nodes[s].dy += uy * force;
        nodes[t].dx -= ux * force;
        nodes[t].dy -= uy * force;
    }
}

fn apply_gravity(nodes: &mut [LayoutNode], config: &LayoutConfig, phase: f64) {
    let center = config.viewport.center();
    for node in nodes.iter_mut() {
        let (ux, uy, dist) = direction(center.x - node.x, center.y - node.y);
        let base = if config.strong_gravity_mode {
            config.gravity * node.mass()
        } else {
            config.gravity * node.mass() / dist
        };
        let force = base * phase;

        node.dx += ux * force;
        node.dy += uy * force;
    }
}

/// Update each node's convergence and return the global speed.
fn adapt_speed(nodes: &mut [LayoutNode], config: &LayoutConfig) -> f64 {
    let jitter = config.jitter_tolerance * config.jitter_tolerance;
    let mut total_swinging = 0.0;
    let mut total_traction = 0.0;

    for node in nodes.iter_mut() {
        let swinging = (node.dx - node.old_dx).hypot(node.dy - node.old_dy);
        let traction = (node.dx + node.old_dx).hypot(node.dy + node.old_dy) / 2.0;

        node.convergence = (jitter * traction / (swinging + SWING_EPSILON)).min(1.0);
        total_swinging += node.mass() * swinging;
        total_traction += node.mass() * traction;
    }

    (jitter * total_traction / (total_swinging + SWING_EPSILON)).min(config.max_global_speed)
}

fn displace(nodes: &mut [LayoutNode], config: &LayoutConfig, global_speed: f64) {
    for node in nodes.iter_mut() {
        let speed = global_speed * node.convergence / config.slowing_ratio;
        let mut mx = node.dx * speed;
        let mut my = node.dy * speed;

        let len = mx.hypot(my);
        if len > config.max_displacement {
            let scale = config.max_displacement / len;
            mx *= scale;
            my *= scale;
        }

        node.x += mx;
        node.y += my;
    }
}

/// Push apart every pair closer than `min_separation`, each node moving
/// half the deficit. Sweeps in index order until a sweep moves nothing or
/// `max_sweeps` is reached; returns the number of sweeps run.
fn resolve_overlaps(nodes: &mut [LayoutNode], min_separation: f64, max_sweeps: usize) -> usize {
    for sweep in 0..max_sweeps {
        if !overlap_sweep(nodes, min_separation) {
            return sweep;
        }
    }
    max_sweeps
}

/// One pass over all pairs. Returns whether any node moved.
fn overlap_sweep(nodes: &mut [LayoutNode], min_separation: f64) -> bool {
    let n = nodes.len();
    let mut moved = false;
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = nodes[j].x - nodes[i].x;
            let dy = nodes[j].y - nodes[i].y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist >= min_separation - OVERLAP_TOLERANCE {
                continue;
            }

            let (ux, uy) = if dist < MIN_DISTANCE {
                let angle = (i * n + j) as f64 * GOLDEN_ANGLE;
                (angle.cos(), angle.sin())
            } else {
                (dx / dist, dy / dist)
            };
            let push = (min_separation - dist) / 2.0;

            nodes[i].x -= ux * push;
            nodes[i].y -= uy * push;
            nodes[j].x += ux * push;
            nodes[j].y += uy * push;
            moved = true;
        }
    }
    moved
}

/// Pull nodes outside the margin box back by a fraction of the overflow.
fn pull_into_bounds(nodes: &mut [LayoutNode], config: &LayoutConfig) {
    let vp = &config.viewport;
    let pull = |value: f64, low: f64, high: f64| {
        if value < low {
            value + (low - value) * config.bounds_pull
        } else if value > high {
            value - (value - high) * config.bounds_pull
        } else {
            value
        }
    };

    for node in nodes.iter_mut() {
        node.x = pull(node.x, vp.margin, vp.width - vp.margin);
        node.y = pull(node.y, vp.margin, vp.height - vp.margin);
    }
}

// ============================================================================
// Tests
// ============================================================================
