use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

const DISTANCE_MIN_SQ: f32 = 1.0;

/// Deterministic nudge for coincident bodies so they separate instead of
/// producing a NaN direction.
fn jiggle(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

fn softened_distance_sq(delta: Vec2) -> f32 {
    let distance_sq = delta.length_sq();
    if distance_sq < DISTANCE_MIN_SQ {
        (DISTANCE_MIN_SQ * distance_sq).sqrt()
    } else {
        distance_sq
    }
}

#[derive(Clone, Copy)]
pub(super) struct ManyBody {
    pub(super) alpha: f32,
    pub(super) theta: f32,
    pub(super) strength: f32,
}

/// Adds the charge of every other body to `velocity`, approximating distant
/// cells by their center of charge.
pub(super) fn accumulate_many_body(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ManyBody,
    velocity: &mut Vec2,
) {
    if node.count == 0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }
            let mut delta = positions[other] - point;
            if delta.length_sq() == 0.0 {
                delta = jiggle(index, other);
            }
            *velocity += delta * (params.strength * params.alpha / softened_distance_sq(delta));
        }
        return;
    }

    let delta = node.center_of_charge - point;
    let distance = delta.length().max(1e-3);
    let far_enough = !node.bounds.contains(point)
        && (node.bounds.side_length() / distance) < params.theta;

    if far_enough {
        *velocity += delta * (node.charge * params.alpha / softened_distance_sq(delta));
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_many_body(child, index, positions, params, velocity);
    }
}

#[derive(Clone, Copy)]
pub(super) struct LinkSpring {
    pub(super) source: usize,
    pub(super) target: usize,
    /// Share of the correction the target absorbs, from endpoint degrees.
    pub(super) bias: f32,
}

pub(super) fn apply_link_spring(
    link: LinkSpring,
    positions: &[Vec2],
    velocities: &mut [Vec2],
    distance: f32,
    strength: f32,
    alpha: f32,
) {
    let mut delta = (positions[link.target] + velocities[link.target])
        - (positions[link.source] + velocities[link.source]);
    if delta.length_sq() == 0.0 {
        delta = jiggle(link.source, link.target);
    }

    let length = delta.length();
    let correction = delta * ((length - distance) / length * alpha * strength);

    velocities[link.target] -= correction * link.bias;
    velocities[link.source] += correction * (1.0 - link.bias);
}

/// Shifts every position so the mean lands on `center`.
pub(super) fn apply_centering(positions: &mut [Vec2], center: Vec2) {
    if positions.is_empty() {
        return;
    }

    let sum = positions.iter().fold(Vec2::ZERO, |sum, position| sum + *position);
    let shift = center - sum / positions.len() as f32;
    for position in positions {
        *position += shift;
    }
}
