//! Terminal tables for previews and run reports.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cnu_model::{AREA_RESULT_SUFFIX, Compound, WorkbookExtraction, format_optional};
use cnu_workflow::{PersistenceOutcome, RunReport, RunStatus, SampleOutcome, SampleReport};

pub fn print_preview(extraction: &WorkbookExtraction) {
    let metadata = &extraction.metadata;
    println!("File: {}", metadata.source_filename);
    println!("Run date: {}", metadata.run_date);
    println!(
        "Instrument: {}",
        metadata.instrument.as_deref().unwrap_or("-")
    );
    println!("Batches: {}", metadata.batch_codes.join(", "));
    println!("SHA-256: {}", metadata.workbook_hash);
    println!("{}", preview_table(extraction));
    if !extraction.warnings.is_empty() {
        println!();
        println!("Cells read as missing:");
        println!("{}", warning_table(extraction));
    }
}

/// One column per sample, one row per compound plus the metadata and area rows.
pub fn preview_table(extraction: &WorkbookExtraction) -> Table {
    let samples = extraction.ordered_samples();
    let mut table = Table::new();
    let mut header = vec![header_cell("Row")];
    header.extend(samples.iter().map(|sample| header_cell(sample.display_header())));
    table.set_header(header);
    apply_preview_style(&mut table);

    table.add_row(label_row(
        "Batch",
        samples
            .iter()
            .map(|s| s.batch_code.clone().unwrap_or_else(|| "-".to_string())),
    ));
    for compound in Compound::ALL {
        table.add_row(value_row(
            compound.name(),
            samples.iter().map(|s| s.components.get(compound)),
        ));
    }
    table.add_row(value_row("Sample mass (mg)", samples.iter().map(|s| s.sample_mass_mg)));
    table.add_row(value_row("Dilution", samples.iter().map(|s| s.dilution)));
    table.add_row(value_row("Serving mass (g)", samples.iter().map(|s| s.serving_mass_g)));
    table.add_row(value_row(
        "Servings/package",
        samples.iter().map(|s| s.servings_per_package),
    ));
    for compound in Compound::ALL {
        table.add_row(value_row(
            &format!("{}{AREA_RESULT_SUFFIX}", compound.name()),
            samples.iter().map(|s| s.area_results.get(compound)),
        ));
    }
    for index in 1..table.column_count() {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table
}

fn warning_table(extraction: &WorkbookExtraction) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Sheet"), header_cell("Cell"), header_cell("Value")]);
    apply_table_style(&mut table);
    for warning in &extraction.warnings {
        table.add_row(vec![
            Cell::new(&warning.sheet),
            Cell::new(&warning.cell).fg(Color::Yellow),
            Cell::new(&warning.value),
        ]);
    }
    table
}

pub fn print_report(report: &RunReport) {
    println!("Run: {}", report.run_id);
    println!(
        "File: {} ({})",
        report.extraction.metadata.source_filename, report.environment
    );
    println!("{}", report_table(report));
    println!("{}", status_line(report));
    match &report.persistence {
        PersistenceOutcome::Saved => println!("Audit record saved."),
        PersistenceOutcome::SkippedDryRun => println!("Dry run: nothing was written."),
        PersistenceOutcome::Failed(error) => eprintln!(
            "error: QBench updates were applied, but the audit record was not saved: {error}"
        ),
    }
}

/// Final status text, e.g. `Partially succeeded: 5/6 synchronized`.
pub fn status_line(report: &RunReport) -> String {
    format!("{}: {}", report.status.label(), report.summary_line())
}

pub fn report_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Sample"),
        header_cell("Columns"),
        header_cell("Outcome"),
        header_cell("Tests"),
        header_cell("Detail"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    for sample in &report.samples {
        table.add_row(vec![
            Cell::new(&sample.base_sample_id)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(sample.column_headers.join(", ")),
            outcome_cell(&sample.outcome),
            tests_cell(sample),
            detail_cell(sample),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(report.summary_line())
            .fg(status_color(report.status))
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    table
}

/// Compounds with the worksheet keys written for them.
pub fn compounds_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Compound"),
        header_cell("CN keys"),
        header_cell("HO keys"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for compound in Compound::ALL {
        let name = compound.name();
        table.add_row(vec![
            Cell::new(compound.position() + 1),
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new(format!("{name}, {name}{AREA_RESULT_SUFFIX}")),
            Cell::new(format!("{name}_0 .. {name}_2")),
        ]);
    }
    table
}

fn outcome_cell(outcome: &SampleOutcome) -> Cell {
    match outcome {
        SampleOutcome::Synchronized { .. } => Cell::new("synchronized").fg(Color::Green),
        SampleOutcome::Skipped { .. } => Cell::new("skipped").fg(Color::Yellow),
        SampleOutcome::Failed { .. } => Cell::new("failed")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
    }
}

fn tests_cell(sample: &SampleReport) -> Cell {
    let tests = sample.outcome.applied_tests();
    if tests.is_empty() {
        return dim_cell(format!("CN {} / HO {}", sample.available_cn, sample.available_ho));
    }
    Cell::new(
        tests
            .iter()
            .map(|test| format!("{} #{}", test.kind, test.test_id))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

fn detail_cell(sample: &SampleReport) -> Cell {
    match &sample.outcome {
        SampleOutcome::Synchronized { .. } if sample.skipped_columns.is_empty() => dim_cell("-"),
        SampleOutcome::Synchronized { .. } => Cell::new(format!(
            "unused columns: {}",
            sample.skipped_columns.join(", ")
        ))
        .fg(Color::Yellow),
        SampleOutcome::Skipped { reason } => Cell::new(reason.to_string()),
        SampleOutcome::Failed { error, applied } if applied.is_empty() => {
            Cell::new(error.describe()).fg(Color::Red)
        }
        SampleOutcome::Failed { error, applied } => Cell::new(format!(
            "{} (after {} update(s))",
            error.describe(),
            applied.len()
        ))
        .fg(Color::Red),
    }
}

fn status_color(status: RunStatus) -> Color {
    match status {
        RunStatus::Done => Color::Green,
        RunStatus::PartiallySucceeded => Color::Yellow,
        RunStatus::Failed => Color::Red,
    }
}

fn label_row(label: &str, values: impl Iterator<Item = String>) -> Vec<Cell> {
    let mut row = vec![Cell::new(label).add_attribute(Attribute::Bold)];
    row.extend(values.map(Cell::new));
    row
}

fn value_row(label: &str, values: impl Iterator<Item = Option<f64>>) -> Vec<Cell> {
    let mut row = vec![Cell::new(label).add_attribute(Attribute::Bold)];
    row.extend(values.map(|value| match value {
        Some(_) => Cell::new(format_optional(value)),
        None => dim_cell("-"),
    }));
    row
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn apply_preview_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Disabled);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
