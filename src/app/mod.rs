use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};
use log::{info, warn};

use crate::ir::GraphIr;
use crate::load::{DocumentPaths, LoadedBundle, load_bundle};

mod candidates;
mod graph;
mod layout;
mod render_utils;
mod scene;
mod search;
mod trace;
mod ui;

use candidates::CandidateSelector;
use layout::{LayoutConfig, Simulation};
use scene::Scene;
use search::GlyphSearch;
use trace::TraceScrubber;
use ui::document_inputs;

type LoadResult = Result<LoadedBundle, String>;

pub struct WitnessStudioApp {
    paths: DocumentPaths,
    live_physics: bool,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

/// Everything the viewer shows for one loaded bundle, plus the view settings
/// that survive a reload.
struct ViewModel {
    graph: GraphIr,
    graph_source: String,
    simulation: Simulation,
    layout_config: LayoutConfig,
    scene: Scene,
    trace: TraceScrubber,
    candidates: CandidateSelector,
    search: GlyphSearch,
    pan: Vec2,
    zoom: f32,
    live_physics: bool,
    canvas_size: Option<Vec2>,
    hovered: Option<usize>,
    overlay_open: bool,
    overlay_opened_this_frame: bool,
    export_path: String,
    status: Option<String>,
}

impl WitnessStudioApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, paths: DocumentPaths, live_physics: bool) -> Self {
        let state = Self::start_load(paths.clone());
        Self {
            paths,
            live_physics,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(paths: DocumentPaths) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_bundle(&paths).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(paths: DocumentPaths) -> AppState {
        info!("loading graph document {}", paths.graph_location());
        AppState::Loading {
            rx: Self::spawn_load(paths),
        }
    }
}

impl eframe::App for WitnessStudioApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(bundle)) => {
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(
                            bundle,
                            self.live_physics,
                        ))));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(AppState::Error(
                            "Background load worker disconnected".to_owned(),
                        ));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading glyph graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the graph document");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    document_inputs(ui, &mut self.paths);
                    ui.add_space(6.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.paths.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut self.paths, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    info!("reloading documents from {}", self.paths.graph_location());
                    self.reload_rx = Some(Self::spawn_load(self.paths.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(bundle)) => model.replace_bundle(bundle),
                        Ok(Err(error)) => {
                            warn!("reload failed: {error}");
                            transition = Some(AppState::Error(error));
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
