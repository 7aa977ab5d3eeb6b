use std::path::Path;

use eframe::egui::{self, Align, Context, Layout, Ui, Vec2, vec2};
use log::{info, warn};

use crate::ir::GraphIr;
use crate::load::{
    DEFAULT_GRAPH_DOCUMENT, DEFAULT_NBEST_DOCUMENT, DEFAULT_TRACE_DOCUMENT, DocumentPaths,
    LoadedBundle, save_graph_document,
};

use super::super::candidates::CandidateSelector;
use super::super::layout::{LayoutConfig, Simulation};
use super::super::scene::Scene;
use super::super::search::GlyphSearch;
use super::super::trace::TraceScrubber;
use super::super::ViewModel;

const DEFAULT_CANVAS_SIZE: Vec2 = vec2(960.0, 720.0);
const DEFAULT_EXPORT_PATH: &str = "graph.layout.json";

/// The three document location inputs, blank meaning the conventional name.
pub(in crate::app) fn document_inputs(ui: &mut Ui, paths: &mut DocumentPaths) {
    let fields = [
        ("Graph", DEFAULT_GRAPH_DOCUMENT, &mut paths.graph),
        ("Trace", DEFAULT_TRACE_DOCUMENT, &mut paths.trace),
        ("N-best", DEFAULT_NBEST_DOCUMENT, &mut paths.nbest),
    ];
    for (label, hint, value) in fields {
        ui.label(label);
        ui.add(
            egui::TextEdit::singleline(value)
                .hint_text(hint)
                .desired_width(180.0),
        )
        .on_hover_text("File path or http(s) URL.");
    }
}

impl ViewModel {
    pub(in crate::app) fn new(bundle: LoadedBundle, live_physics: bool) -> Self {
        let LoadedBundle {
            graph,
            trace,
            candidates,
            graph_source,
        } = bundle;
        let layout_config = LayoutConfig::default();
        let simulation = Simulation::new(&[], &[], DEFAULT_CANVAS_SIZE, layout_config);

        let mut model = Self {
            graph: GraphIr::default(),
            graph_source,
            simulation,
            layout_config,
            scene: Scene::default(),
            trace: TraceScrubber::new(trace),
            candidates: CandidateSelector::new(candidates),
            search: GlyphSearch::default(),
            pan: Vec2::ZERO,
            zoom: 1.0,
            live_physics,
            canvas_size: None,
            hovered: None,
            overlay_open: false,
            overlay_opened_this_frame: false,
            export_path: DEFAULT_EXPORT_PATH.to_owned(),
            status: None,
        };
        model.bind_graph(graph);
        model
    }

    /// Swaps in freshly loaded documents. Pan, zoom and physics tuning are
    /// kept; layout, highlights, trace cursor and candidate selection restart.
    pub(in crate::app) fn replace_bundle(&mut self, bundle: LoadedBundle) {
        let LoadedBundle {
            graph,
            trace,
            candidates,
            graph_source,
        } = bundle;

        self.graph_source = graph_source;
        self.bind_graph(graph);
        self.trace.replace(trace, &mut self.scene);
        self.candidates.replace(candidates, &mut self.scene);
        self.overlay_open = false;
        self.status = None;
    }

    fn bind_graph(&mut self, graph: GraphIr) {
        let canvas = self.canvas_size.unwrap_or(DEFAULT_CANVAS_SIZE);
        self.simulation = Simulation::new(&graph.glyphs, &graph.edges, canvas, self.layout_config);
        self.scene
            .bind(self.simulation.generation(), &graph.glyphs, &graph.edges);
        self.scene.on_tick(&self.simulation.snapshot());
        self.hovered = None;
        self.graph = graph;
    }

    fn export_layout(&mut self) {
        let annotated = self.simulation.annotate(&self.graph);
        let path = Path::new(self.export_path.trim());
        self.status = Some(match save_graph_document(path, &annotated) {
            Ok(()) => format!("Layout written to {}", path.display()),
            Err(error) => {
                warn!("layout export failed: {error:#}");
                format!("Export failed: {error:#}")
            }
        });
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        paths: &mut DocumentPaths,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.heading("Witness Studio");
                    ui.separator();
                    document_inputs(ui, paths);
                    let load_button = ui.add_enabled(!is_loading, egui::Button::new("Load"));
                    if load_button.clicked() {
                        *reload_requested = true;
                    }
                    if is_loading {
                        ui.spinner();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.graph_summary());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));

        self.draw_event_overlay(ctx);
    }

    fn graph_summary(&self) -> String {
        let mut summary = format!(
            "{}  |  glyphs: {}  edges: {}",
            self.graph_source,
            self.scene.nodes().len(),
            self.scene.edges().len()
        );
        if self.scene.skipped_edges() > 0 {
            summary.push_str(&format!("  (skipped {})", self.scene.skipped_edges()));
        }
        summary
    }

    pub(in crate::app) fn draw_export(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.export_path).desired_width(180.0));
            if ui
                .button("Export layout")
                .on_hover_text("Write the graph with current positions as layout hints.")
                .clicked()
            {
                info!("exporting layout to {}", self.export_path.trim());
                self.export_layout();
            }
        });
        if let Some(status) = &self.status {
            ui.small(status.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::scene::HighlightClass;
    use crate::ir::{decode_candidates, decode_graph_document, decode_trace, deserialize_ir};

    fn bundle(graph: &str) -> LoadedBundle {
        LoadedBundle {
            graph: decode_graph_document(graph).unwrap(),
            trace: decode_trace(r#"[{ "iter": 0, "rewrite": "r", "eclass": 1 }]"#).unwrap(),
            candidates: decode_candidates(
                r#"[{ "name": "c", "lambda": 0.0, "cost": 1.0, "expr": "(a b)" }]"#,
            )
            .unwrap(),
            graph_source: "graph.json".to_owned(),
        }
    }

    #[test]
    fn reload_keeps_view_but_resets_state() {
        let mut model = ViewModel::new(
            bundle(r#"{ "nodes": [{ "id": 1, "label": "a" }, { "id": 2, "label": "b" }], "links": [] }"#),
            true,
        );
        model.pan = vec2(40.0, -10.0);
        model.zoom = 2.0;
        model.trace.set_cursor(1, &mut model.scene);
        model.candidates.select(Some(0), &mut model.scene);
        let first_generation = model.simulation.generation();

        model.replace_bundle(bundle(
            r#"{ "nodes": [{ "id": 1, "label": "a" }, { "id": 3, "label": "c" }], "links": [] }"#,
        ));

        assert_eq!(model.pan, vec2(40.0, -10.0));
        assert_eq!(model.zoom, 2.0);
        assert_ne!(model.simulation.generation(), first_generation);
        assert_eq!(model.scene.generation(), Some(model.simulation.generation()));
        assert_eq!(model.trace.cursor(), 0);
        assert_eq!(model.candidates.selected(), None);
        assert!(model.scene.highlighted(HighlightClass::Trace).is_empty());
        assert!(model.scene.highlighted(HighlightClass::Candidate).is_empty());
    }

    #[test]
    fn export_writes_positions_as_layout_hints() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = ViewModel::new(
            bundle(r#"{ "nodes": [{ "id": 1, "label": "a" }, { "id": 2, "label": "b" }], "links": [] }"#),
            false,
        );
        model.export_path = dir.path().join("out.json").display().to_string();

        model.export_layout();

        let text = std::fs::read_to_string(dir.path().join("out.json")).unwrap();
        let exported = deserialize_ir(&text).unwrap();
        assert_eq!(exported.glyph_count(), 2);
        assert!(exported.glyphs.iter().all(|glyph| {
            glyph
                .layout_hint()
                .is_some_and(|hint| hint.position().is_some())
        }));
        assert!(model.status.as_deref().is_some_and(|status| status.starts_with("Layout written")));
    }
}
