use std::collections::HashMap;

use eframe::egui::{Color32, Vec2};
use log::debug;

use crate::ir::{Edge, Glyph, GlyphId};
use crate::util::glyph_name;

use super::candidates::CoverageMatcher;
use super::layout::PositionSnapshot;
use super::render_utils::{ache_color, parse_hex_color};

pub(in crate::app) const NODE_RADIUS: f32 = 9.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum HighlightClass {
    Trace,
    Candidate,
    Search,
}

impl HighlightClass {
    const fn bit(self) -> u8 {
        match self {
            Self::Trace => 1,
            Self::Candidate => 1 << 1,
            Self::Search => 1 << 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct HighlightFlags(u8);

impl HighlightFlags {
    pub(in crate::app) fn contains(self, class: HighlightClass) -> bool {
        self.0 & class.bit() != 0
    }

    pub(in crate::app) fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn set(&mut self, class: HighlightClass, active: bool) {
        if active {
            self.0 |= class.bit();
        } else {
            self.0 &= !class.bit();
        }
    }

    #[cfg(test)]
    pub(in crate::app) fn from_classes(classes: &[HighlightClass]) -> Self {
        let mut flags = Self::default();
        for &class in classes {
            flags.set(class, true);
        }
        flags
    }
}

/// Highlight target. Glyph ids are unique but edge ids need not be, so edges
/// are addressed by their shape index in the bound scene.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(in crate::app) enum ElementId {
    Node(GlyphId),
    Edge(usize),
}

pub(in crate::app) struct NodeShape {
    pub(in crate::app) id: GlyphId,
    pub(in crate::app) name: String,
    pub(in crate::app) label: String,
    pub(in crate::app) ache: Option<f64>,
    pub(in crate::app) fill: Color32,
    pub(in crate::app) position: Vec2,
    pub(in crate::app) highlight: HighlightFlags,
}

pub(in crate::app) struct EdgeShape {
    pub(in crate::app) label: Option<String>,
    pub(in crate::app) source: usize,
    pub(in crate::app) target: usize,
    pub(in crate::app) highlight: HighlightFlags,
}

/// Drawable state for one bound graph: node and edge shapes, their positions
/// from the latest layout step and their highlight flags.
#[derive(Default)]
pub(in crate::app) struct Scene {
    generation: Option<u64>,
    nodes: Vec<NodeShape>,
    edges: Vec<EdgeShape>,
    node_index: HashMap<GlyphId, usize>,
    skipped_edges: usize,
    last_step: Option<u64>,
}

fn ache_range(glyphs: &[Glyph]) -> Option<(f64, f64)> {
    if glyphs.len() < 2 {
        return None;
    }

    let mut aches = glyphs
        .iter()
        .filter_map(|glyph| glyph.ache)
        .filter(|ache| ache.is_finite());
    let first = aches.next()?;
    let (min, max) = aches.fold((first, first), |(min, max), ache| (min.min(ache), max.max(ache)));
    (max > min).then_some((min, max))
}

impl Scene {
    /// Drops every shape and highlight and binds the given graph under the
    /// layout generation that will drive it.
    pub(in crate::app) fn bind(&mut self, generation: u64, glyphs: &[Glyph], edges: &[Edge]) {
        self.nodes.clear();
        self.edges.clear();
        self.node_index.clear();
        self.skipped_edges = 0;
        self.last_step = None;
        self.generation = Some(generation);

        let range = ache_range(glyphs);
        for glyph in glyphs {
            if self.node_index.contains_key(&glyph.id) {
                debug!("duplicate glyph id {} skipped", glyph.id);
                continue;
            }

            let override_color = glyph
                .view_hints
                .as_ref()
                .and_then(|hints| hints.color.as_deref())
                .and_then(parse_hex_color);
            let position = glyph
                .layout_hint()
                .and_then(|hint| hint.position())
                .map_or(Vec2::ZERO, |(x, y)| Vec2::new(x as f32, y as f32));

            self.node_index.insert(glyph.id.clone(), self.nodes.len());
            self.nodes.push(NodeShape {
                id: glyph.id.clone(),
                name: glyph_name(&glyph.id),
                label: glyph.label.clone(),
                ache: glyph.ache,
                fill: override_color.unwrap_or_else(|| ache_color(glyph.ache, range)),
                position,
                highlight: HighlightFlags::default(),
            });
        }

        for edge in edges {
            let (Some(&source), Some(&target)) = (
                self.node_index.get(&edge.source),
                self.node_index.get(&edge.target),
            ) else {
                debug!(
                    "edge {} skipped: endpoint {} -> {} not in graph",
                    edge.id, edge.source, edge.target
                );
                self.skipped_edges += 1;
                continue;
            };

            self.edges.push(EdgeShape {
                label: edge.label.clone(),
                source,
                target,
                highlight: HighlightFlags::default(),
            });
        }

        debug!(
            "scene bound to generation {generation}: {} nodes, {} edges, {} skipped",
            self.nodes.len(),
            self.edges.len(),
            self.skipped_edges
        );
    }

    pub(in crate::app) fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub(in crate::app) fn nodes(&self) -> &[NodeShape] {
        &self.nodes
    }

    pub(in crate::app) fn edges(&self) -> &[EdgeShape] {
        &self.edges
    }

    pub(in crate::app) fn skipped_edges(&self) -> usize {
        self.skipped_edges
    }

    /// Moves node shapes to the snapshot positions. Snapshots from a layout
    /// this scene is not bound to are ignored; returns whether anything moved.
    pub(in crate::app) fn on_tick(&mut self, snapshot: &PositionSnapshot<'_>) -> bool {
        if self.generation != Some(snapshot.generation) {
            return false;
        }

        for (index, sim_node) in snapshot.nodes.iter().enumerate() {
            let target = match self.nodes.get(index) {
                Some(shape) if shape.id == sim_node.id => Some(index),
                _ => self.node_index.get(&sim_node.id).copied(),
            };
            if let Some(target) = target {
                self.nodes[target].position = sim_node.position;
            }
        }
        self.last_step = Some(snapshot.step);
        true
    }

    pub(in crate::app) fn last_step(&self) -> Option<u64> {
        self.last_step
    }

    /// Sets or clears `class` on each named element. Unknown elements are
    /// ignored, and repeating a call changes nothing.
    pub(in crate::app) fn set_highlight(
        &mut self,
        elements: &[ElementId],
        class: HighlightClass,
        active: bool,
    ) {
        for element in elements {
            match element {
                ElementId::Node(id) => {
                    if let Some(&index) = self.node_index.get(id) {
                        self.nodes[index].highlight.set(class, active);
                    }
                }
                ElementId::Edge(index) => {
                    if let Some(edge) = self.edges.get_mut(*index) {
                        edge.highlight.set(class, active);
                    }
                }
            }
        }
    }

    pub(in crate::app) fn clear_highlight(&mut self, class: HighlightClass) {
        for node in &mut self.nodes {
            node.highlight.set(class, false);
        }
        for edge in &mut self.edges {
            edge.highlight.set(class, false);
        }
    }

    /// Makes `elements` the only ones carrying `class`.
    pub(in crate::app) fn replace_highlight(&mut self, elements: &[ElementId], class: HighlightClass) {
        self.clear_highlight(class);
        self.set_highlight(elements, class, true);
    }

    pub(in crate::app) fn highlighted(&self, class: HighlightClass) -> Vec<ElementId> {
        let nodes = self
            .nodes
            .iter()
            .filter(|node| node.highlight.contains(class))
            .map(|node| ElementId::Node(node.id.clone()));
        let edges = self
            .edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.highlight.contains(class))
            .map(|(index, _)| ElementId::Edge(index));
        nodes.chain(edges).collect()
    }

    pub(in crate::app) fn elements_matching(&self, matcher: &dyn CoverageMatcher) -> Vec<ElementId> {
        let nodes = self
            .nodes
            .iter()
            .filter(|node| matcher.covers_node(&node.id, &node.label))
            .map(|node| ElementId::Node(node.id.clone()));
        let edges = self
            .edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| {
                matcher.covers_edge(
                    edge.label.as_deref(),
                    &self.nodes[edge.source].id,
                    &self.nodes[edge.target].id,
                )
            })
            .map(|(index, _)| ElementId::Edge(index));
        nodes.chain(edges).collect()
    }

    /// Closest node whose disc (in world units) contains `point`.
    pub(in crate::app) fn hit_test(&self, point: Vec2, radius: f32) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (index, (node.position - point).length()))
            .filter(|(_, distance)| *distance <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::app::layout::{LayoutConfig, Simulation};
    use crate::app::render_utils::{ACHE_HIGH_COLOR, ACHE_LOW_COLOR, NEUTRAL_FILL};
    use crate::ir::{GraphIr, decode_graph_document};

    fn graph(text: &str) -> GraphIr {
        decode_graph_document(text).unwrap()
    }

    fn three_node_graph() -> GraphIr {
        graph(
            r#"{
                "nodes": [
                    { "id": 1, "label": "a", "ache": 0.0 },
                    { "id": 2, "label": "b", "ache": 1.0 },
                    { "id": 3, "label": "c", "ache": 2.0 }
                ],
                "links": [
                    { "source": 1, "target": 2 },
                    { "source": 2, "target": 3 },
                    { "source": 3, "target": 42 }
                ]
            }"#,
        )
    }

    #[test]
    fn unresolved_edges_are_skipped() {
        let ir = three_node_graph();
        let mut scene = Scene::default();
        scene.bind(1, &ir.glyphs, &ir.edges);

        assert_eq!(scene.nodes().len(), 3);
        assert_eq!(scene.edges().len(), 2);
        assert_eq!(scene.skipped_edges(), 1);
    }

    #[test]
    fn rebinding_clears_shapes_and_highlights() {
        let ir = three_node_graph();
        let mut scene = Scene::default();
        scene.bind(1, &ir.glyphs, &ir.edges);
        scene.set_highlight(
            &[ElementId::Node(GlyphId::Index(2))],
            HighlightClass::Trace,
            true,
        );

        let other = graph(r#"{ "nodes": [{ "id": 2, "label": "b" }], "links": [] }"#);
        scene.bind(2, &other.glyphs, &other.edges);

        assert_eq!(scene.nodes().len(), 1);
        assert!(scene.edges().is_empty());
        assert!(scene.highlighted(HighlightClass::Trace).is_empty());
        assert_eq!(scene.generation(), Some(2));
    }

    #[test]
    fn ache_drives_fill_color() {
        let ir = three_node_graph();
        let mut scene = Scene::default();
        scene.bind(1, &ir.glyphs, &ir.edges);

        let fills = scene.nodes().iter().map(|node| node.fill).collect::<Vec<_>>();
        assert_eq!(fills[0], ACHE_LOW_COLOR);
        assert_eq!(fills[1], Color32::from_rgb(44, 97, 157));
        assert_eq!(fills[2], ACHE_HIGH_COLOR);
    }

    #[test]
    fn flat_or_missing_ache_is_neutral() {
        let single = graph(r#"{ "nodes": [{ "id": 1, "ache": 5.0 }], "links": [] }"#);
        let mut scene = Scene::default();
        scene.bind(1, &single.glyphs, &single.edges);
        assert_eq!(scene.nodes()[0].fill, NEUTRAL_FILL);

        let flat = graph(
            r#"{ "nodes": [{ "id": 1, "ache": 1.0 }, { "id": 2, "ache": 1.0 }, { "id": 3 }], "links": [] }"#,
        );
        scene.bind(2, &flat.glyphs, &flat.edges);
        assert!(scene.nodes().iter().all(|node| node.fill == NEUTRAL_FILL));
    }

    #[test]
    fn hex_view_hint_overrides_ache() {
        let ir = graph(
            r##"{
                "glyphs": [
                    { "id": "a", "label": "a", "ache": 0.0, "viewHints": { "color": "#ff0000" } },
                    { "id": "b", "label": "b", "ache": 1.0, "viewHints": { "color": "red" } }
                ],
                "edges": []
            }"##,
        );
        let mut scene = Scene::default();
        scene.bind(1, &ir.glyphs, &ir.edges);

        assert_eq!(scene.nodes()[0].fill, Color32::from_rgb(255, 0, 0));
        assert_eq!(scene.nodes()[1].fill, ACHE_HIGH_COLOR);
    }

    #[test]
    fn highlight_classes_are_independent_and_idempotent() {
        let ir = three_node_graph();
        let mut scene = Scene::default();
        scene.bind(1, &ir.glyphs, &ir.edges);
        let two = [ElementId::Node(GlyphId::Index(2))];

        scene.set_highlight(&two, HighlightClass::Trace, true);
        scene.set_highlight(&two, HighlightClass::Trace, true);
        scene.set_highlight(&two, HighlightClass::Candidate, true);
        scene.clear_highlight(HighlightClass::Trace);

        let flags = scene.nodes()[1].highlight;
        assert!(!flags.contains(HighlightClass::Trace));
        assert!(flags.contains(HighlightClass::Candidate));
        assert!(!flags.contains(HighlightClass::Search));
    }

    #[test]
    fn ticks_from_another_generation_are_ignored() {
        let ir = three_node_graph();
        let mut simulation =
            Simulation::new(&ir.glyphs, &ir.edges, vec2(800.0, 600.0), LayoutConfig::default());
        let mut stale =
            Simulation::new(&ir.glyphs, &ir.edges, vec2(100.0, 100.0), LayoutConfig::default());

        let mut scene = Scene::default();
        scene.bind(simulation.generation(), &ir.glyphs, &ir.edges);

        simulation.step();
        assert!(scene.on_tick(&simulation.snapshot()));
        let position = scene.nodes()[0].position;
        assert_eq!(position, simulation.snapshot().nodes[0].position);

        stale.step();
        assert!(!scene.on_tick(&stale.snapshot()));
        assert_eq!(scene.nodes()[0].position, position);
        assert_eq!(scene.last_step(), Some(1));
    }

    #[test]
    fn hit_test_picks_nearest_node() {
        let ir = graph(
            r#"{
                "glyphs": [
                    { "id": 1, "label": "a", "viewHints": { "layout": { "x": 0.0, "y": 0.0 } } },
                    { "id": 2, "label": "b", "viewHints": { "layout": { "x": 10.0, "y": 0.0 } } }
                ],
                "edges": []
            }"#,
        );
        let mut scene = Scene::default();
        scene.bind(1, &ir.glyphs, &ir.edges);

        assert_eq!(scene.hit_test(vec2(7.0, 0.0), NODE_RADIUS), Some(1));
        assert_eq!(scene.hit_test(vec2(0.0, 40.0), NODE_RADIUS), None);
    }
}
