use eframe::egui::{self, Rect, Ui};

use super::super::render_utils::screen_to_world;
use super::super::scene::NODE_RADIUS;
use super::super::ViewModel;

const ZOOM_MIN: f32 = 0.2;
const ZOOM_MAX: f32 = 3.0;

pub(in crate::app) fn node_screen_radius(zoom: f32) -> f32 {
    (NODE_RADIUS * zoom.sqrt()).clamp(3.0, 22.0)
}

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(ZOOM_MIN, ZOOM_MAX);
        self.pan = pointer - rect.min - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    pub(in crate::app) fn update_hovered(&mut self, ui: &Ui, rect: Rect) {
        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer));
        self.hovered = pointer.and_then(|pointer| {
            let world = screen_to_world(rect, self.pan, self.zoom, pointer);
            self.scene
                .hit_test(world, node_screen_radius(self.zoom) / self.zoom)
        });
    }

    /// Keeps the layout centered on the canvas as the window resizes.
    pub(in crate::app) fn fit_canvas(&mut self, rect: Rect) {
        let size = rect.size();
        if self.canvas_size == Some(size) {
            return;
        }

        self.canvas_size = Some(size);
        self.simulation.set_center(size);
    }
}
