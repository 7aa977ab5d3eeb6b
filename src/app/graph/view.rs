use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, Ui, vec2};

use crate::util::format_ache;

use super::super::render_utils::{
    blend_color, circle_visible, dim_color, draw_background, edge_visible, world_to_screen,
};
use super::super::scene::{HighlightClass, HighlightFlags};
use super::super::ViewModel;
use super::interaction::node_screen_radius;

const TRACE_COLOR: Color32 = Color32::from_rgb(246, 196, 92);
const CANDIDATE_COLOR: Color32 = Color32::from_rgb(110, 231, 160);
const SEARCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

/// Strongest class wins when an element carries several.
fn highlight_tint(flags: HighlightFlags) -> Option<Color32> {
    if flags.contains(HighlightClass::Candidate) {
        Some(CANDIDATE_COLOR)
    } else if flags.contains(HighlightClass::Trace) {
        Some(TRACE_COLOR)
    } else if flags.contains(HighlightClass::Search) {
        Some(SEARCH_COLOR)
    } else {
        None
    }
}

impl ViewModel {
    /// Advances the layout one step and hands the snapshot to the scene.
    fn advance_layout(&mut self) -> bool {
        if !self.live_physics || !self.simulation.step() {
            return false;
        }
        self.scene.on_tick(&self.simulation.snapshot())
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.fit_canvas(rect);
        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        if self.scene.nodes().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "The graph document has no glyphs.",
                FontId::proportional(14.0),
                Color32::from_gray(200),
            );
            return;
        }

        if self.advance_layout() || response.dragged() {
            ui.ctx().request_repaint();
        }

        self.update_hovered(ui, rect);
        if self.hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        let pan = self.pan;
        let zoom = self.zoom;
        let zoom_sqrt = zoom.sqrt();
        let radius = node_screen_radius(zoom);
        let screen_positions = self
            .scene
            .nodes()
            .iter()
            .map(|node| world_to_screen(rect, pan, zoom, node.position))
            .collect::<Vec<Pos2>>();
        let any_highlight = self
            .scene
            .nodes()
            .iter()
            .any(|node| !node.highlight.is_empty());

        for edge in self.scene.edges() {
            let start = screen_positions[edge.source];
            let end = screen_positions[edge.target];
            if !edge_visible(rect, start, end, 2.0) {
                continue;
            }

            let stroke = match highlight_tint(edge.highlight) {
                Some(tint) => Stroke::new((2.6 * zoom_sqrt).clamp(1.4, 4.8), tint),
                None if any_highlight => Stroke::new(
                    (0.9 * zoom_sqrt).clamp(0.5, 2.0),
                    Color32::from_rgba_unmultiplied(80, 90, 110, 110),
                ),
                None => Stroke::new(
                    (1.2 * zoom_sqrt).clamp(0.6, 3.0),
                    Color32::from_rgba_unmultiplied(120, 130, 150, 170),
                ),
            };
            painter.line_segment([start, end], stroke);
        }

        for (index, node) in self.scene.nodes().iter().enumerate() {
            let position = screen_positions[index];
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let is_hovered = self.hovered == Some(index);
            let tint = highlight_tint(node.highlight);
            let fill = match tint {
                Some(tint) => blend_color(node.fill, tint, 0.55),
                None if any_highlight => dim_color(node.fill, 0.6),
                None => node.fill,
            };

            painter.circle_filled(position, radius, fill);
            let outline = if is_hovered {
                Stroke::new(2.2, Color32::from_rgb(255, 164, 101))
            } else if let Some(tint) = tint {
                Stroke::new(1.8, tint)
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(10, 10, 10, 190))
            };
            painter.circle_stroke(position, radius, outline);

            if is_hovered || tint.is_some() || zoom > 0.6 {
                painter.text(
                    position + vec2(radius + 4.0, 0.0),
                    Align2::LEFT_CENTER,
                    &node.name,
                    FontId::proportional(11.0),
                    Color32::from_gray(225),
                );
            }
        }

        if let Some(node) = self.hovered.and_then(|index| self.scene.nodes().get(index)) {
            let tooltip = format!(
                "e-class {}\nlabel: {}\n{}",
                node.name,
                node.label,
                format_ache(node.ache)
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                tooltip,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
