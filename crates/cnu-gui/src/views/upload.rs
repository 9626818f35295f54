//! Upload screen: pick a workbook, preview it, process it.

use std::path::PathBuf;

use cnu_gui::state::{AppState, Tone};
use cnu_gui::theme::{colors, spacing};
use cnu_workflow::SampleOutcome;
use egui::{RichText, Ui};

use super::preview;

/// What the user asked for on this frame.
pub enum UploadAction {
    Open(PathBuf),
    Process,
    SignOut,
}

pub struct UploadView;

impl UploadView {
    pub fn show(ui: &mut Ui, state: &mut AppState) -> Option<UploadAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.heading(format!("{} CN Upload Results", egui_phosphor::regular::FLASK));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .button(format!("{} Sign out", egui_phosphor::regular::SIGN_OUT))
                    .clicked()
                {
                    action = Some(UploadAction::SignOut);
                }
                if let Some(session) = &state.session {
                    ui.label(RichText::new(session.display_name()).weak());
                }
                ui.label(RichText::new(state.environment().as_str()).weak().small());
            });
        });
        ui.separator();
        ui.add_space(spacing::SM);

        ui.horizontal(|ui| {
            let open = egui::Button::new(format!(
                "{} Open workbook",
                egui_phosphor::regular::FOLDER_OPEN
            ));
            if ui.add_enabled(!state.upload.running, open).clicked()
                && let Some(path) = rfd::FileDialog::new()
                    .add_filter("Excel workbook", &["xlsx", "xlsm", "xls"])
                    .pick_file()
            {
                action = Some(UploadAction::Open(path));
            }
            ui.label("Instrument");
            ui.add(egui::TextEdit::singleline(&mut state.instrument).desired_width(140.0));
            ui.checkbox(&mut state.dry_run, "Dry run");

            let process = egui::Button::new(format!(
                "{} Process",
                egui_phosphor::regular::UPLOAD_SIMPLE
            ));
            if ui.add_enabled(state.can_process(), process).clicked() {
                action = Some(UploadAction::Process);
            }
            if state.upload.parsing {
                ui.spinner();
            }
        });
        ui.add_space(spacing::SM);

        if let Some(banner) = &state.upload.banner {
            let color = match banner.tone {
                Tone::Success => colors::SUCCESS,
                Tone::Warning => colors::WARNING,
                Tone::Error => colors::ERROR,
            };
            ui.label(RichText::new(&banner.text).color(color).strong());
            ui.add_space(spacing::SM);
        }

        if let Some(report) = &state.upload.report {
            egui::CollapsingHeader::new(format!("Run {}", report.run_id))
                .default_open(true)
                .show(ui, |ui| {
                    for sample in &report.samples {
                        let (icon, color, detail) = match &sample.outcome {
                            SampleOutcome::Synchronized { tests } => (
                                egui_phosphor::regular::CHECK_CIRCLE,
                                colors::SUCCESS,
                                format!("{} test(s) updated", tests.len()),
                            ),
                            SampleOutcome::Skipped { reason } => (
                                egui_phosphor::regular::MINUS_CIRCLE,
                                colors::WARNING,
                                reason.to_string(),
                            ),
                            SampleOutcome::Failed { error, applied } if applied.is_empty() => (
                                egui_phosphor::regular::X_CIRCLE,
                                colors::ERROR,
                                error.describe(),
                            ),
                            SampleOutcome::Failed { error, applied } => (
                                egui_phosphor::regular::X_CIRCLE,
                                colors::ERROR,
                                format!(
                                    "{} test(s) updated, then: {}",
                                    applied.len(),
                                    error.describe()
                                ),
                            ),
                        };
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(icon).color(color));
                            ui.label(RichText::new(&sample.base_sample_id).strong());
                            ui.label(RichText::new(detail).weak());
                        });
                    }
                });
            ui.add_space(spacing::SM);
        }

        match &state.upload.extraction {
            Some(extraction) => {
                let metadata = &extraction.metadata;
                ui.label(format!(
                    "{}  |  run date {}  |  batches {}  |  {} column(s)",
                    metadata.source_filename,
                    metadata.run_date,
                    metadata.batch_codes.join(", "),
                    extraction.samples.len()
                ));
                if !extraction.warnings.is_empty() {
                    let cells: Vec<&str> = extraction
                        .warnings
                        .iter()
                        .map(|warning| warning.cell.as_str())
                        .collect();
                    ui.label(
                        RichText::new(format!(
                            "{} Non-numeric cells read as missing: {}",
                            egui_phosphor::regular::WARNING,
                            cells.join(", ")
                        ))
                        .color(colors::WARNING),
                    );
                }
                ui.add_space(spacing::XS);
                preview::show(ui, extraction);
            }
            None if !state.upload.parsing => {
                ui.add_space(spacing::LG);
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new("Open a results workbook to preview it.").weak());
                });
            }
            None => {}
        }

        action
    }
}
