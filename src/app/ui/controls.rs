use std::ops::RangeInclusive;

use eframe::egui::{self, Key, Response, Ui};

use super::super::candidates::menu_label;
use super::super::layout::LayoutConfig;
use super::super::ViewModel;

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;
const TRACE_KEY_STEPS_PER_SEC: f32 = 0.6;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
    carry: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

fn default_slider_key_step(min: f32, max: f32) -> f32 {
    ((max - min) / 200.0).max(0.0005)
}

/// Signed distance to move a focused slider this frame while an arrow key is
/// held, accelerating the longer it stays down. Zero without focus.
fn arrow_key_delta(ui: &Ui, response: &Response, step: f32) -> f32 {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return 0.0;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };

    let direction = (increase_down as i8) - (decrease_down as i8);
    if direction == 0 {
        hold_state.carry = 0.0;
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, hold_state));
        return 0.0;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
    hold_state.carry += direction as f32 * step * speed * delta_time;

    let whole = hold_state.carry.trunc();
    hold_state.carry -= whole;

    ui.ctx().request_repaint();
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));
    whole
}

fn tuning_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    text: &str,
    hover: &str,
) -> bool {
    let (min, max) = (*range.start(), *range.end());
    let response = ui
        .add(
            egui::Slider::new(value, range)
                .text(text)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hover);
    if response.hovered() {
        response.request_focus();
    }

    let step = default_slider_key_step(min, max);
    // Whole key steps only; scale to slider units afterwards.
    let steps = arrow_key_delta(ui, &response, 1.0);
    let before = *value;
    *value = (*value + steps * step).clamp(min, max);
    response.changed() || (*value - before).abs() > f32::EPSILON
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Rewrite Trace");
        ui.separator();
        self.draw_trace_slider(ui);

        ui.add_space(8.0);
        ui.heading("Candidates");
        ui.separator();
        self.draw_candidate_menu(ui);

        ui.add_space(8.0);
        ui.label("Search glyphs (label or c<id>)")
            .on_hover_text("Fuzzy-highlight matching glyphs.");
        ui.text_edit_singleline(&mut self.search.query);
        self.search.refresh(&mut self.scene);
        if !self.search.query.trim().is_empty() {
            ui.small(format!("{} matches", self.search.match_count()));
        }

        ui.separator();
        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Step the force layout every frame until it settles.");
        if ui
            .button("Reheat layout")
            .on_hover_text("Restart cooling so the layout can rearrange.")
            .clicked()
        {
            self.simulation.reheat();
        }
        ui.small(format!(
            "step {}  alpha {:.3}{}",
            self.scene.last_step().unwrap_or(0),
            self.simulation.alpha(),
            if self.simulation.is_settled() {
                "  (settled)"
            } else {
                ""
            }
        ));

        ui.collapsing("Physics tuning", |ui| self.draw_physics_tuning(ui));

        ui.separator();
        self.draw_export(ui);
    }

    fn draw_trace_slider(&mut self, ui: &mut Ui) {
        let event_count = self.trace.len();
        let has_events = event_count > 0;

        let mut cursor = self.trace.cursor();
        let response = ui
            .add_enabled(
                has_events,
                egui::Slider::new(&mut cursor, self.trace_slider_range()).text("events applied"),
            )
            .on_hover_text("Highlight the e-classes touched by the first k rewrite events.")
            .on_disabled_hover_text("No rewrite events loaded.");
        if response.hovered() {
            response.request_focus();
        }

        let steps = arrow_key_delta(ui, &response, TRACE_KEY_STEPS_PER_SEC) as isize;
        if steps != 0 {
            cursor = cursor.saturating_add_signed(steps).min(event_count);
        }

        if cursor != self.trace.cursor() {
            self.trace.set_cursor(cursor, &mut self.scene);
            self.overlay_open = cursor > 0;
            self.overlay_opened_this_frame = self.overlay_open;
        }

        ui.add_enabled_ui(has_events, |ui| {
            ui.horizontal(|ui| {
                if ui.small_button("◀").clicked() {
                    self.trace.step_back(&mut self.scene);
                    self.overlay_open = self.trace.cursor() > 0;
                    self.overlay_opened_this_frame = self.overlay_open;
                }
                ui.label(format!("{} / {event_count}", self.trace.cursor()));
                if ui.small_button("▶").clicked() {
                    self.trace.step_forward(&mut self.scene);
                    self.overlay_open = self.trace.cursor() > 0;
                    self.overlay_opened_this_frame = self.overlay_open;
                }
                ui.small(format!("{} e-classes", self.trace.applied().len()));
            });
        });
    }

    /// Slider domain `0..=N`; an empty or missing trace leaves it at `0..=0`.
    fn trace_slider_range(&self) -> RangeInclusive<usize> {
        0..=self.trace.len()
    }

    fn draw_candidate_menu(&mut self, ui: &mut Ui) {
        let mut selection = self.candidates.selected();
        let placeholder = self.candidates.placeholder();

        egui::ComboBox::from_id_salt("candidate_menu")
            .width(ui.available_width())
            .selected_text(self.candidates.selected_label())
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut selection, None, placeholder);
                for (index, candidate) in self.candidates.candidates().iter().enumerate() {
                    ui.selectable_value(&mut selection, Some(index), menu_label(candidate));
                }
            });

        if selection != self.candidates.selected() {
            self.candidates.select(selection, &mut self.scene);
        }
    }

    fn draw_physics_tuning(&mut self, ui: &mut Ui) {
        let mut config = self.layout_config;

        let mut changed = tuning_slider(
            ui,
            &mut config.charge_strength,
            LayoutConfig::CHARGE_RANGE,
            "Charge",
            "Many-body strength; more negative pushes glyphs further apart.",
        );
        changed |= tuning_slider(
            ui,
            &mut config.link_distance,
            LayoutConfig::LINK_DISTANCE_RANGE,
            "Link distance",
            "Rest length of edge springs.",
        );
        changed |= tuning_slider(
            ui,
            &mut config.link_strength,
            LayoutConfig::LINK_STRENGTH_RANGE,
            "Link strength",
            "How hard edge springs pull toward their rest length.",
        );
        changed |= tuning_slider(
            ui,
            &mut config.velocity_decay,
            LayoutConfig::VELOCITY_DECAY_RANGE,
            "Velocity decay",
            "Share of velocity lost each step.",
        );

        if ui.button("Reset to defaults").clicked() {
            config = LayoutConfig::default();
            changed = true;
        }

        if changed {
            self.layout_config = config;
            self.simulation.set_config(config);
        }
    }
}
