mod forces;
mod quadtree;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use eframe::egui::{Vec2, vec2};
use log::debug;

use crate::ir::{Edge, Glyph, GlyphId, GraphIr};
use forces::{LinkSpring, ManyBody, accumulate_many_body, apply_centering, apply_link_spring};
use quadtree::QuadNode;

const BARNES_HUT_THETA: f32 = 0.9;
const ALPHA_MIN: f32 = 0.001;
const REHEAT_ALPHA: f32 = 0.3;
const SPIRAL_RADIUS: f32 = 10.0;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn alpha_decay() -> f32 {
    1.0 - ALPHA_MIN.powf(1.0 / 300.0)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct LayoutConfig {
    pub(in crate::app) charge_strength: f32,
    pub(in crate::app) link_distance: f32,
    pub(in crate::app) link_strength: f32,
    pub(in crate::app) velocity_decay: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            charge_strength: -220.0,
            link_distance: 80.0,
            link_strength: 0.9,
            velocity_decay: 0.4,
        }
    }
}

impl LayoutConfig {
    pub(in crate::app) const CHARGE_RANGE: std::ops::RangeInclusive<f32> = -1200.0..=-10.0;
    pub(in crate::app) const LINK_DISTANCE_RANGE: std::ops::RangeInclusive<f32> = 10.0..=400.0;
    pub(in crate::app) const LINK_STRENGTH_RANGE: std::ops::RangeInclusive<f32> = 0.0..=1.0;
    pub(in crate::app) const VELOCITY_DECAY_RANGE: std::ops::RangeInclusive<f32> = 0.05..=0.95;

    fn clamped(self) -> Self {
        let clamp = |value: f32, range: std::ops::RangeInclusive<f32>| {
            value.clamp(*range.start(), *range.end())
        };
        Self {
            charge_strength: clamp(self.charge_strength, Self::CHARGE_RANGE),
            link_distance: clamp(self.link_distance, Self::LINK_DISTANCE_RANGE),
            link_strength: clamp(self.link_strength, Self::LINK_STRENGTH_RANGE),
            velocity_decay: clamp(self.velocity_decay, Self::VELOCITY_DECAY_RANGE),
        }
    }
}

pub(in crate::app) struct SimNode {
    pub(in crate::app) id: GlyphId,
    pub(in crate::app) position: Vec2,
    pub(in crate::app) velocity: Vec2,
    /// `(fx, fy)` from a fixed layout hint; the node never leaves it.
    pub(in crate::app) pinned: Option<Vec2>,
}

/// Positions after one step. Borrowed from the simulation, so consumers read
/// it on every step instead of holding on to it.
pub(in crate::app) struct PositionSnapshot<'a> {
    pub(in crate::app) generation: u64,
    pub(in crate::app) step: u64,
    pub(in crate::app) nodes: &'a [SimNode],
}

#[derive(Default)]
struct StepScratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    springs: Vec<LinkSpring>,
    degree: Vec<usize>,
}

/// Force-directed layout over one graph. Each instance has its own
/// generation; loading another graph means building a new simulation.
pub(in crate::app) struct Simulation {
    generation: u64,
    nodes: Vec<SimNode>,
    links: Vec<(GlyphId, GlyphId)>,
    index_by_id: HashMap<GlyphId, usize>,
    center: Vec2,
    alpha: f32,
    step: u64,
    config: LayoutConfig,
    scratch: StepScratch,
}

impl Simulation {
    pub(in crate::app) fn new(
        glyphs: &[Glyph],
        edges: &[Edge],
        viewport_size: Vec2,
        config: LayoutConfig,
    ) -> Self {
        let center = viewport_size * 0.5;
        let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());

        let mut nodes = Vec::with_capacity(glyphs.len());
        let mut index_by_id = HashMap::with_capacity(glyphs.len());
        for glyph in glyphs {
            if index_by_id.contains_key(&glyph.id) {
                debug!("duplicate glyph id {} ignored by layout", glyph.id);
                continue;
            }

            let index = nodes.len();
            let hint = glyph.layout_hint();
            let hinted = hint
                .and_then(|hint| hint.position())
                .map(|(x, y)| vec2(x as f32, y as f32));
            let position = hinted.unwrap_or_else(|| {
                let radius = SPIRAL_RADIUS * (0.5 + index as f32).sqrt();
                let angle = index as f32 * golden_angle;
                center + vec2(angle.cos(), angle.sin()) * radius
            });
            let pinned = hint.filter(|hint| hint.is_pinned()).and(hinted);

            index_by_id.insert(glyph.id.clone(), index);
            nodes.push(SimNode {
                id: glyph.id.clone(),
                position,
                velocity: Vec2::ZERO,
                pinned,
            });
        }

        let links = edges
            .iter()
            .map(|edge| (edge.source.clone(), edge.target.clone()))
            .collect();

        Self {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            nodes,
            links,
            index_by_id,
            center,
            alpha: 1.0,
            step: 0,
            config,
            scratch: StepScratch::default(),
        }
    }

    pub(in crate::app) fn generation(&self) -> u64 {
        self.generation
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(in crate::app) fn is_settled(&self) -> bool {
        self.alpha < ALPHA_MIN
    }

    pub(in crate::app) fn set_config(&mut self, config: LayoutConfig) {
        if self.config != config {
            self.config = config;
            self.reheat();
        }
    }

    pub(in crate::app) fn reheat(&mut self) {
        self.alpha = self.alpha.max(REHEAT_ALPHA);
    }

    /// Re-targets the centering force on a viewport resize.
    pub(in crate::app) fn set_center(&mut self, viewport_size: Vec2) {
        let center = viewport_size * 0.5;
        if (center - self.center).length_sq() > 0.25 {
            self.center = center;
            self.reheat();
        }
    }

    pub(in crate::app) fn snapshot(&self) -> PositionSnapshot<'_> {
        PositionSnapshot {
            generation: self.generation,
            step: self.step,
            nodes: &self.nodes,
        }
    }

    /// Advances one tick. Returns `false` without touching anything once the
    /// layout has cooled down.
    pub(in crate::app) fn step(&mut self) -> bool {
        if self.nodes.is_empty() || self.is_settled() {
            return false;
        }

        self.alpha -= self.alpha * alpha_decay();
        let config = self.config.clamped();
        let node_count = self.nodes.len();

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.velocities.clear();
        for node in &self.nodes {
            scratch.positions.push(node.pinned.unwrap_or(node.position));
            scratch.velocities.push(node.velocity);
        }

        if node_count > 1
            && let Some(tree) = QuadNode::build(&scratch.positions, config.charge_strength)
        {
            let params = ManyBody {
                alpha: self.alpha,
                theta: BARNES_HUT_THETA,
                strength: config.charge_strength,
            };
            for (index, velocity) in scratch.velocities.iter_mut().enumerate() {
                accumulate_many_body(&tree, index, &scratch.positions, params, velocity);
            }
        }

        scratch.springs.clear();
        scratch.degree.clear();
        scratch.degree.resize(node_count, 0);
        for (source_id, target_id) in &self.links {
            let (Some(&source), Some(&target)) = (
                self.index_by_id.get(source_id),
                self.index_by_id.get(target_id),
            ) else {
                continue;
            };
            if source == target {
                continue;
            }
            scratch.degree[source] += 1;
            scratch.degree[target] += 1;
            scratch.springs.push(LinkSpring {
                source,
                target,
                bias: 0.5,
            });
        }
        for spring in &mut scratch.springs {
            let source_degree = scratch.degree[spring.source] as f32;
            let target_degree = scratch.degree[spring.target] as f32;
            spring.bias = source_degree / (source_degree + target_degree);
        }
        for &spring in &scratch.springs {
            apply_link_spring(
                spring,
                &scratch.positions,
                &mut scratch.velocities,
                config.link_distance,
                config.link_strength,
                self.alpha,
            );
        }

        apply_centering(&mut scratch.positions, self.center);

        let keep = 1.0 - config.velocity_decay;
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if let Some(pin) = node.pinned {
                node.position = pin;
                node.velocity = Vec2::ZERO;
            } else {
                node.velocity = scratch.velocities[index] * keep;
                node.position = scratch.positions[index] + node.velocity;
            }
        }

        self.step += 1;
        true
    }

    /// Copy of `ir` whose glyph layout hints carry the current positions.
    pub(in crate::app) fn annotate(&self, ir: &GraphIr) -> GraphIr {
        let mut annotated = ir.clone();
        for glyph in &mut annotated.glyphs {
            let Some(&index) = self.index_by_id.get(&glyph.id) else {
                continue;
            };
            let position = self.nodes[index].position;
            let hints = glyph.view_hints.get_or_insert_with(Default::default);
            let layout = hints.layout.get_or_insert_with(Default::default);
            layout.x = Some(f64::from(position.x));
            layout.y = Some(f64::from(position.y));
        }
        annotated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{GlyphId, GraphIr, decode_graph_document};

    fn chain_graph() -> GraphIr {
        decode_graph_document(
            r#"{
                "nodes": [
                    { "id": 1, "label": "a", "ache": 0.0 },
                    { "id": 2, "label": "b", "ache": 1.0 },
                    { "id": 3, "label": "c", "ache": 2.0 }
                ],
                "links": [
                    { "source": 1, "target": 2, "op": "a" },
                    { "source": 2, "target": 3, "op": "b" }
                ]
            }"#,
        )
        .unwrap()
    }

    fn run_until_settled(simulation: &mut Simulation) -> usize {
        let mut steps = 0;
        while simulation.step() {
            steps += 1;
            assert!(steps < 1_000, "simulation never settled");
        }
        steps
    }

    fn position_of(simulation: &Simulation, id: i64) -> Vec2 {
        let snapshot = simulation.snapshot();
        snapshot
            .nodes
            .iter()
            .find(|node| node.id == GlyphId::Index(id))
            .map(|node| node.position)
            .unwrap()
    }

    #[test]
    fn generations_are_unique() {
        let ir = chain_graph();
        let first = Simulation::new(&ir.glyphs, &ir.edges, vec2(800.0, 600.0), LayoutConfig::default());
        let second = Simulation::new(&ir.glyphs, &ir.edges, vec2(800.0, 600.0), LayoutConfig::default());
        assert_ne!(first.generation(), second.generation());
    }

    #[test]
    fn cools_down_and_stops() {
        let ir = chain_graph();
        let mut simulation =
            Simulation::new(&ir.glyphs, &ir.edges, vec2(800.0, 600.0), LayoutConfig::default());

        let steps = run_until_settled(&mut simulation);
        assert!((290..=310).contains(&steps));
        assert!(simulation.is_settled());

        let step_before = simulation.snapshot().step;
        assert!(!simulation.step());
        assert_eq!(simulation.snapshot().step, step_before);
    }

    #[test]
    fn linked_nodes_end_up_closer_than_unlinked() {
        let ir = decode_graph_document(
            r#"{
                "nodes": [{ "id": 1 }, { "id": 2 }, { "id": 3 }],
                "links": [{ "source": 1, "target": 2 }]
            }"#,
        )
        .unwrap();
        let mut simulation =
            Simulation::new(&ir.glyphs, &ir.edges, vec2(800.0, 600.0), LayoutConfig::default());
        run_until_settled(&mut simulation);

        let linked = (position_of(&simulation, 1) - position_of(&simulation, 2)).length();
        let unlinked = (position_of(&simulation, 1) - position_of(&simulation, 3)).length();
        assert!(linked < unlinked);
    }

    #[test]
    fn symmetric_pair_stays_centered() {
        let ir = decode_graph_document(
            r#"{ "nodes": [{ "id": 1 }, { "id": 2 }], "links": [{ "source": 1, "target": 2 }] }"#,
        )
        .unwrap();
        let mut simulation =
            Simulation::new(&ir.glyphs, &ir.edges, vec2(400.0, 300.0), LayoutConfig::default());
        for _ in 0..50 {
            simulation.step();
        }

        let midpoint = (position_of(&simulation, 1) + position_of(&simulation, 2)) * 0.5;
        assert!((midpoint - vec2(200.0, 150.0)).length() < 1.0);
    }

    #[test]
    fn pinned_glyph_never_moves() {
        let ir = decode_graph_document(
            r#"{
                "glyphs": [
                    { "id": "p", "label": "pinned",
                      "viewHints": { "layout": { "x": 5.0, "y": 7.0, "fixed": true } } },
                    { "id": "q", "label": "free" }
                ],
                "edges": [{ "id": "e", "source": "p", "target": "q" }]
            }"#,
        )
        .unwrap();
        let mut simulation =
            Simulation::new(&ir.glyphs, &ir.edges, vec2(800.0, 600.0), LayoutConfig::default());
        for _ in 0..40 {
            simulation.step();
        }

        let snapshot = simulation.snapshot();
        let pinned = &snapshot.nodes[0];
        assert_eq!(pinned.pinned, Some(vec2(5.0, 7.0)));
        assert_eq!(pinned.position, vec2(5.0, 7.0));
        assert_eq!(snapshot.nodes[1].pinned, None);
    }

    #[test]
    fn dangling_links_are_ignored() {
        let ir = decode_graph_document(
            r#"{
                "nodes": [{ "id": 1 }, { "id": 2 }],
                "links": [{ "source": 1, "target": 99 }, { "source": 1, "target": 2 }]
            }"#,
        )
        .unwrap();
        let mut simulation =
            Simulation::new(&ir.glyphs, &ir.edges, vec2(800.0, 600.0), LayoutConfig::default());
        run_until_settled(&mut simulation);

        for node in simulation.snapshot().nodes {
            assert!(node.position.x.is_finite() && node.position.y.is_finite());
        }
    }

    #[test]
    fn resize_retargets_and_reheats() {
        let ir = chain_graph();
        let mut simulation =
            Simulation::new(&ir.glyphs, &ir.edges, vec2(800.0, 600.0), LayoutConfig::default());
        run_until_settled(&mut simulation);

        simulation.set_center(vec2(1200.0, 600.0));
        assert!(!simulation.is_settled());
        assert!(simulation.alpha() >= REHEAT_ALPHA);

        for _ in 0..5 {
            simulation.step();
        }
        let sum = simulation
            .snapshot()
            .nodes
            .iter()
            .fold(Vec2::ZERO, |sum, node| sum + node.position);
        assert!((sum / 3.0 - vec2(600.0, 300.0)).length() < 40.0);
    }

    #[test]
    fn annotate_writes_current_positions() {
        let ir = chain_graph();
        let mut simulation =
            Simulation::new(&ir.glyphs, &ir.edges, vec2(800.0, 600.0), LayoutConfig::default());
        simulation.step();

        let annotated = simulation.annotate(&ir);
        let hint = annotated.glyphs[1].layout_hint().unwrap();
        let position = position_of(&simulation, 2);
        assert_eq!(hint.x, Some(f64::from(position.x)));
        assert_eq!(hint.fixed, None);
    }
}
