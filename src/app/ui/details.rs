use eframe::egui::{self, Context, RichText, Ui};

use crate::util::format_ache;

use super::super::scene::HighlightClass;
use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Candidate Expression");
        ui.add_space(4.0);

        let mut expression = self.candidates.expression();
        egui::ScrollArea::vertical()
            .id_salt("expression_scroll")
            .max_height(260.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut expression)
                        .code_editor()
                        .desired_width(f32::INFINITY)
                        .hint_text("Select a candidate to see its expression."),
                );
            });

        ui.separator();
        ui.heading("Glyph");
        ui.add_space(4.0);
        self.draw_hovered_glyph(ui);
    }

    fn draw_hovered_glyph(&self, ui: &mut Ui) {
        let Some(node) = self.hovered.and_then(|index| self.scene.nodes().get(index)) else {
            ui.label("Hover a glyph in the graph.");
            return;
        };

        ui.label(RichText::new(format!("e-class {}", node.name)).strong());
        ui.label(format!("label: {}", node.label));
        ui.label(format_ache(node.ache));

        let classes = [
            (HighlightClass::Trace, "touched by applied rewrites"),
            (HighlightClass::Candidate, "covered by candidate"),
            (HighlightClass::Search, "search match"),
        ];
        for (class, text) in classes {
            if node.highlight.contains(class) {
                ui.small(text);
            }
        }

        let Some(glyph) = self.graph.glyphs.iter().find(|glyph| glyph.id == node.id) else {
            return;
        };
        if let Some(provenance) = &glyph.provenance {
            if let Some(span) = &provenance.source_span {
                ui.label(format!("source span: {}..{}", span.start, span.end));
            }
            if let Some(history) = provenance.rule_history.as_ref().filter(|h| !h.is_empty()) {
                ui.label(format!("rules: {}", history.join(" → ")));
            }
        }
        for tag in glyph.tags.iter().flatten() {
            ui.small(format!("{} = {}", tag.key, tag.value));
        }
    }

    /// Detail window for the last applied rewrite event. Closed by its button or
    /// by a primary click outside it, except on the frame it was (re)opened.
    pub(in crate::app) fn draw_event_overlay(&mut self, ctx: &Context) {
        let opened_this_frame = std::mem::take(&mut self.overlay_opened_this_frame);
        if !self.overlay_open {
            return;
        }
        let Some(detail) = self.trace.detail() else {
            self.overlay_open = false;
            return;
        };

        let mut close = false;
        let window = egui::Window::new("Rewrite event")
            .collapsible(false)
            .resizable(true)
            .default_width(420.0)
            .show(ctx, |ui| {
                egui::Grid::new("event_detail_grid")
                    .num_columns(2)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        let rows = [
                            ("iteration", &detail.iteration),
                            ("rewrite", &detail.rule),
                            ("e-class", &detail.eclass),
                            ("before", &detail.before),
                            ("after", &detail.after),
                            ("lhs", &detail.lhs),
                            ("rhs", &detail.rhs),
                        ];
                        for (name, value) in rows {
                            ui.label(RichText::new(name).strong());
                            ui.monospace(value.as_str());
                            ui.end_row();
                        }
                    });
                ui.add_space(6.0);
                if ui.button("Close").clicked() {
                    close = true;
                }
            });

        if !opened_this_frame
            && let Some(window) = window
        {
            let clicked_outside = ctx.input(|input| {
                input.pointer.primary_clicked()
                    && input
                        .pointer
                        .interact_pos()
                        .is_some_and(|pos| !window.response.rect.contains(pos))
            });
            close |= clicked_outside;
        }

        if close {
            self.overlay_open = false;
        }
    }
}
