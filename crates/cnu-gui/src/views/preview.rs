//! Workbook preview grid: one column per sample, one row per value.

use cnu_model::{AREA_RESULT_SUFFIX, Compound, SampleQuantification, WorkbookExtraction, format_optional};
use egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

type RowReader = Box<dyn Fn(&SampleQuantification) -> String>;

fn rows() -> Vec<(String, RowReader)> {
    let mut rows: Vec<(String, RowReader)> = vec![(
        "Batch".to_string(),
        Box::new(|s| s.batch_code.clone().unwrap_or_default()),
    )];
    for compound in Compound::ALL {
        rows.push((
            compound.name().to_string(),
            Box::new(move |s| format_optional(s.components.get(compound))),
        ));
    }
    rows.push(("Sample mass (mg)".to_string(), Box::new(|s| format_optional(s.sample_mass_mg))));
    rows.push(("Dilution".to_string(), Box::new(|s| format_optional(s.dilution))));
    rows.push(("Serving mass (g)".to_string(), Box::new(|s| format_optional(s.serving_mass_g))));
    rows.push((
        "Servings/package".to_string(),
        Box::new(|s| format_optional(s.servings_per_package)),
    ));
    for compound in Compound::ALL {
        rows.push((
            format!("{}{AREA_RESULT_SUFFIX}", compound.name()),
            Box::new(move |s| format_optional(s.area_results.get(compound))),
        ));
    }
    rows
}

pub fn show(ui: &mut Ui, extraction: &WorkbookExtraction) {
    let samples = extraction.ordered_samples();
    let rows = rows();

    egui::ScrollArea::horizontal().show(ui, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(140.0))
            .columns(Column::auto().at_least(80.0), samples.len())
            .header(22.0, |mut header| {
                header.col(|ui| {
                    ui.label(RichText::new("Row").strong());
                });
                for sample in &samples {
                    header.col(|ui| {
                        ui.label(RichText::new(sample.display_header()).strong());
                    });
                }
            })
            .body(|body| {
                body.rows(20.0, rows.len(), |mut row| {
                    let (label, read) = &rows[row.index()];
                    row.col(|ui| {
                        ui.label(RichText::new(label).strong());
                    });
                    for sample in &samples {
                        row.col(|ui| {
                            ui.label(read(sample));
                        });
                    }
                });
            });
    });
}
