//! WordSound desktop window: egui/eframe application.
//!
//! # Architecture
//!
//! [`WordSoundApp`] is the top-level [`eframe::App`].  It owns the
//! [`WordController`] and the text currently typed in the input box.  Each
//! frame it drains finished fetches, renders the word sections and feeds
//! clicks back to the controller.
//!
//! # Layout
//!
//! | Section | Content |
//! |---------|---------|
//! | Header | Title and subtitle |
//! | Error banner | `controller.error()` when set |
//! | Input | Multiline text box, "Create" and "Try sample" buttons |
//! | Unheard | Word buttons not yet played, count, "Clear" |
//! | Heard | Word buttons already played, count |

use std::time::Duration;

use eframe::egui;

use crate::config::AppConfig;
use crate::words::{WordController, WordEntry, WordId, WordStatus};

const PRIMARY: egui::Color32 = egui::Color32::from_rgb(79, 70, 229);
const SECONDARY: egui::Color32 = egui::Color32::from_rgb(16, 150, 110);
const MUTED: egui::Color32 = egui::Color32::from_rgb(120, 120, 120);
const ERROR: egui::Color32 = egui::Color32::from_rgb(200, 40, 40);

// ---------------------------------------------------------------------------
// WordSoundApp
// ---------------------------------------------------------------------------

/// eframe application: the WordSound window.
pub struct WordSoundApp {
    controller: WordController,
    /// Text in the input box; cleared after a successful "Create".
    input: String,
    /// Spinner animation phase (increases each frame while loading).
    spinner_phase: f32,
    config: AppConfig,
}

impl WordSoundApp {
    pub fn new(controller: WordController, config: AppConfig) -> Self {
        Self {
            controller,
            input: String::new(),
            spinner_phase: 0.0,
            config,
        }
    }

    // ── Actions ──────────────────────────────────────────────────────────

    /// Turn the input box into word buttons.  Blank input is a no-op.
    fn submit_input(&mut self) {
        if self.input.trim().is_empty() {
            return;
        }
        let ids = self.controller.add_input(&self.input);
        if !ids.is_empty() {
            self.input.clear();
        }
    }

    fn add_samples(&mut self) {
        let samples = self.config.ui.sample_words.clone();
        self.controller.add_words(samples);
    }

    // ── Panel renderers ──────────────────────────────────────────────────

    fn draw_header(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(8.0);
            ui.label(
                egui::RichText::new("WordSound")
                    .size(34.0)
                    .strong()
                    .color(PRIMARY),
            );
            ui.label(
                egui::RichText::new("Turn words into pronunciation buttons")
                    .size(15.0)
                    .color(MUTED),
            );
            ui.add_space(8.0);
        });
    }

    fn draw_error_banner(&self, ui: &mut egui::Ui) {
        let Some(message) = self.controller.error() else {
            return;
        };
        egui::Frame::new()
            .fill(egui::Color32::from_rgb(254, 242, 242))
            .stroke(egui::Stroke::new(1.0, ERROR))
            .corner_radius(egui::CornerRadius::same(4))
            .inner_margin(egui::Margin::same(10))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(egui::RichText::new(format!("! {message}")).color(ERROR));
            });
        ui.add_space(8.0);
    }

    fn draw_input(&mut self, ui: &mut egui::Ui) {
        section_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Input words").size(18.0).strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.link("Try sample").clicked() {
                        self.add_samples();
                    }
                });
            });
            ui.add_space(6.0);

            ui.add(
                egui::TextEdit::multiline(&mut self.input)
                    .hint_text("Type words here; they will be turned into buttons…")
                    .desired_rows(3)
                    .desired_width(f32::INFINITY),
            );

            ui.add_space(6.0);
            let can_submit = !self.input.trim().is_empty();
            if ui
                .add_enabled(
                    can_submit,
                    egui::Button::new(egui::RichText::new("Create").size(15.0).strong()),
                )
                .clicked()
            {
                self.submit_input();
            }

            ui.label(
                egui::RichText::new("Tip: separate words with spaces, commas, periods or new lines.")
                    .size(12.0)
                    .color(MUTED),
            );
        });
        ui.add_space(12.0);
    }

    /// Render the "unheard" section.  Returns the clicked word, if any.
    fn draw_unheard(&mut self, ui: &mut egui::Ui) -> Option<WordId> {
        let words = self.controller.words();
        let unheard: Vec<&WordEntry> = words.unheard().collect();
        let heard_count = words.heard().count();
        let mut clicked = None;
        let mut clear = false;

        section_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(format!("Click to hear (unheard: {})", unheard.len()))
                        .size(18.0)
                        .strong()
                        .color(PRIMARY),
                );
                if !words.is_empty() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Clear").clicked() {
                            clear = true;
                        }
                    });
                }
            });
            ui.add_space(8.0);

            if unheard.is_empty() && heard_count > 0 {
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new("Great job!").size(20.0).strong().color(SECONDARY));
                    ui.label(egui::RichText::new("You have listened to every word.").color(MUTED));
                });
            } else if unheard.is_empty() {
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new("Enter some words above to get started").color(MUTED));
                });
            } else {
                ui.horizontal_wrapped(|ui| {
                    for entry in &unheard {
                        if word_button(ui, entry, self.spinner_phase) {
                            clicked = Some(entry.id());
                        }
                    }
                });
            }
        });
        ui.add_space(12.0);

        if clear {
            self.controller.clear();
            return None;
        }
        clicked
    }

    /// Render the "heard" section.  Returns the clicked word, if any.
    fn draw_heard(&self, ui: &mut egui::Ui) -> Option<WordId> {
        let heard: Vec<&WordEntry> = self.controller.words().heard().collect();
        if heard.is_empty() {
            return None;
        }

        let mut clicked = None;
        section_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(
                egui::RichText::new(format!("Heard ({})", heard.len()))
                    .size(16.0)
                    .strong()
                    .color(MUTED),
            );
            ui.add_space(6.0);
            ui.horizontal_wrapped(|ui| {
                for entry in &heard {
                    if word_button(ui, entry, self.spinner_phase) {
                        clicked = Some(entry.id());
                    }
                }
            });
        });
        clicked
    }
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

fn section_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(egui::Color32::WHITE)
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_gray(225)))
        .corner_radius(egui::CornerRadius::same(10))
        .inner_margin(egui::Margin::same(14))
}

/// A simple rotating ASCII spinner character driven by `phase`.
fn spinner_char(phase: f32) -> char {
    let chars = ['|', '/', '-', '\\'];
    chars[(phase as usize) % chars.len()]
}

/// Draw one word button.  Disabled while loading.  Returns `true` on click.
fn word_button(ui: &mut egui::Ui, entry: &WordEntry, spinner_phase: f32) -> bool {
    let (label, color) = match (entry.is_loading(), entry.status()) {
        (true, _) => (format!("{} {}", spinner_char(spinner_phase), entry.text()), PRIMARY),
        (false, WordStatus::Unheard) => (entry.text().to_string(), PRIMARY),
        (false, WordStatus::Heard) => (format!("🔁 {}", entry.text()), SECONDARY),
    };

    let button = egui::Button::new(egui::RichText::new(label).size(17.0).color(color))
        .stroke(egui::Stroke::new(1.5, color))
        .corner_radius(egui::CornerRadius::same(16))
        .min_size(egui::vec2(64.0, 34.0));

    ui.add_enabled(!entry.is_loading(), button).clicked()
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for WordSoundApp {
    /// Called every frame by eframe.  Applies finished fetches, then renders.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.controller.poll_completions();

        // Repaint at ~15 fps while a fetch is pending so the spinner turns
        // and the completion is picked up without user input.
        if self.controller.has_pending() {
            self.spinner_phase = (self.spinner_phase + 0.25) % 4.0;
            ctx.request_repaint_after(Duration::from_millis(66));
        }

        let frame = egui::Frame::new()
            .fill(egui::Color32::from_rgb(248, 250, 252))
            .inner_margin(egui::Margin::same(16));

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.draw_header(ui);
                self.draw_error_banner(ui);
                self.draw_input(ui);

                let mut clicked = None;
                if !self.controller.words().is_empty() {
                    clicked = self.draw_unheard(ui);
                    clicked = clicked.or(self.draw_heard(ui));
                }

                if let Some(id) = clicked {
                    let outcome = self.controller.activate(id);
                    log::debug!("click on {id}: {outcome:?}");
                }

                ui.add_space(16.0);
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new(format!(
                            "WordSound · speech by {} ({})",
                            self.config.speech.model, self.config.speech.voice
                        ))
                        .size(11.0)
                        .color(MUTED),
                    );
                });
            });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("WordSound closing ({} words)", self.controller.words().len());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_cycles_through_four_frames() {
        assert_eq!(spinner_char(0.0), '|');
        assert_eq!(spinner_char(1.5), '/');
        assert_eq!(spinner_char(2.0), '-');
        assert_eq!(spinner_char(3.9), '\\');
        assert_eq!(spinner_char(4.0), '|');
    }
}
