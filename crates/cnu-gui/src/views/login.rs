//! Sign-in screen.

use cnu_gui::state::AppState;
use cnu_gui::theme::{colors, spacing};
use egui::{RichText, Ui};

pub struct LoginView;

impl LoginView {
    /// Render the form. Returns true when the user submitted it.
    pub fn show(ui: &mut Ui, state: &mut AppState) -> bool {
        let mut submit = false;

        ui.vertical_centered(|ui| {
            ui.add_space(spacing::XL * 2.0);
            ui.heading(RichText::new("CN Upload Results").size(32.0));
            ui.add_space(spacing::SM);
            ui.label(
                RichText::new(format!("QBench environment: {}", state.environment())).weak(),
            );
            ui.add_space(spacing::XL);

            if let Some(error) = &state.settings_error {
                ui.label(
                    RichText::new(format!("{} {error}", egui_phosphor::regular::WARNING))
                        .color(colors::WARNING),
                );
                ui.add_space(spacing::MD);
            }

            ui.allocate_ui(egui::vec2(320.0, 0.0), |ui| {
                egui::Grid::new("login_form")
                    .num_columns(2)
                    .spacing([spacing::SM, spacing::SM])
                    .show(ui, |ui| {
                        ui.label("Email");
                        ui.add_enabled(
                            !state.login.busy,
                            egui::TextEdit::singleline(&mut state.login.email),
                        );
                        ui.end_row();

                        ui.label("Password");
                        let response = ui.add_enabled(
                            !state.login.busy,
                            egui::TextEdit::singleline(&mut state.login.password).password(true),
                        );
                        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                            submit = true;
                        }
                        ui.end_row();
                    });
            });

            ui.add_space(spacing::MD);
            ui.horizontal(|ui| {
                let button = egui::Button::new(format!(
                    "{} Sign in",
                    egui_phosphor::regular::SIGN_IN
                ));
                if ui.add_enabled(state.login.can_submit(), button).clicked() {
                    submit = true;
                }
                if state.login.busy {
                    ui.spinner();
                }
            });

            if let Some(error) = &state.login.error {
                ui.add_space(spacing::SM);
                ui.label(RichText::new(error).color(colors::ERROR));
            }
        });

        submit && state.login.can_submit()
    }
}
