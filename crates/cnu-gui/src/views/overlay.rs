//! Modal overlay shown while an upload runs.

use cnu_gui::state::AppState;
use cnu_gui::theme::{colors, spacing};
use egui::{Context, RichText};

pub struct ProgressOverlay;

impl ProgressOverlay {
    pub fn show(ctx: &Context, state: &AppState) {
        let screen = ctx.content_rect();
        egui::Area::new(egui::Id::new("upload_scrim"))
            .order(egui::Order::Foreground)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                ui.painter().rect_filled(screen, 0.0, colors::SCRIM);
                // Swallow clicks aimed at the window underneath.
                ui.allocate_rect(screen, egui::Sense::click_and_drag());
            });

        let (stage, message) = match &state.upload.progress {
            Some(progress) => (progress.stage.label(), progress.message.as_str()),
            None => ("Starting", "Connecting to QBench"),
        };
        egui::Window::new("Uploading")
            .order(egui::Order::Tooltip)
            .collapsible(false)
            .resizable(false)
            .title_bar(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.set_min_width(320.0);
                ui.vertical_centered(|ui| {
                    ui.add_space(spacing::MD);
                    ui.spinner();
                    ui.add_space(spacing::SM);
                    ui.label(RichText::new(stage).strong());
                    ui.label(RichText::new(message).weak());
                    ui.add_space(spacing::MD);
                });
            });
    }
}
