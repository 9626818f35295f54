//! Workbook extraction.

use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Range, Reader, Sheets, open_workbook_auto_from_rs};
use cnu_model::{
    CellWarning, Compound, CompoundValues, RunMetadata, SampleQuantification, WorkbookExtraction,
};
use tracing::{debug, info, info_span};

use crate::cell::{SheetReader, cell_text};
use crate::error::{ParseError, Result};
use crate::hash::WorkbookBytes;
use crate::header::{HeaderKind, base_sample_id, classify_header, sanitize_batch_token};
use crate::layout::{
    AREA_RESULT_ROW_OFFSET, BATCH_COLUMN_STEP, BATCH_SHEET, COMPONENT_ROW_OFFSET, DILUTION_ROW,
    HEADER_ROW, INSTRUMENT_LABEL, RESULTS_SHEET, RUN_DATE_LABEL, SAMPLE_MASS_ROW,
    SERVING_MASS_ROW, SERVINGS_PER_PACKAGE_ROW, cell_ref,
};
use crate::run_date::{date_from_cell, find_labeled_value, parse_filename};

/// Options for [`parse_workbook`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Instrument name; overrides an `Instrument` cell in the sheet.
    pub instrument: Option<String>,
    /// Reject text in numeric cells instead of reading it as missing.
    pub strict_numeric: bool,
}

/// A sample column found in the results header.
#[derive(Debug)]
struct SampleColumn {
    col: u32,
    sample_id: String,
    display: String,
    batch_code: Option<String>,
}

/// Result of scanning the header row.
#[derive(Debug, Default)]
struct HeaderScan {
    columns: Vec<SampleColumn>,
    /// Batch markers in order of appearance.
    markers: Vec<String>,
    assignments: BTreeMap<String, Vec<String>>,
}

/// Parse a CN results workbook.
///
/// Reads the results sheet and the optional batch sheet; the file is never
/// modified. Identical bytes always produce an identical extraction.
pub fn parse_workbook(path: &Path, options: &ParseOptions) -> Result<WorkbookExtraction> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let span = info_span!("parse_workbook", file = %filename);
    let _guard = span.enter();

    let (workbook_hash, reader) = WorkbookBytes::read(path)?.into_parts();
    let mut workbook = open_workbook_auto_from_rs(reader).map_err(|e| ParseError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let sheet_names = workbook.sheet_names();
    if !sheet_names.iter().any(|name| name == RESULTS_SHEET) {
        return Err(ParseError::MissingSheet {
            sheet: RESULTS_SHEET,
            path: path.to_path_buf(),
        });
    }
    let results_range = read_range(&mut workbook, RESULTS_SHEET)?;
    let batch_range = if sheet_names.iter().any(|name| name == BATCH_SHEET) {
        Some(read_range(&mut workbook, BATCH_SHEET)?)
    } else {
        debug!(sheet = BATCH_SHEET, "sheet not found; skipping batch extraction");
        None
    };

    let results = SheetReader::new(RESULTS_SHEET, &results_range, options.strict_numeric);

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let filename_info = parse_filename(&stem)?;
    let run_date = match &filename_info {
        Some(info) => info.run_date,
        None => match find_labeled_value(&results, RUN_DATE_LABEL) {
            Some(cell) => date_from_cell(cell)?,
            None => return Err(ParseError::MissingRunDate { filename }),
        },
    };

    let instrument = options
        .instrument
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| find_labeled_value(&results, INSTRUMENT_LABEL).and_then(cell_text));

    let header = scan_header(&results)?;
    if header.columns.is_empty() {
        return Err(ParseError::NoSamples {
            sheet: RESULTS_SHEET,
        });
    }

    let sheet_batches = batch_range
        .as_ref()
        .map(|range| batches_from_sheet(&SheetReader::new(BATCH_SHEET, range, false)))
        .unwrap_or_default();
    let file_batches = filename_info
        .map(|info| info.batch_codes)
        .unwrap_or_default();
    let batch_codes = deduplicate(
        file_batches
            .into_iter()
            .chain(sheet_batches)
            .chain(header.markers.iter().cloned()),
    );

    let mut warnings = Vec::new();
    let samples = extract_samples(&results, &header.columns, &mut warnings)?;

    let metadata = RunMetadata {
        run_date,
        instrument,
        source_filename: filename,
        workbook_hash,
        batch_codes,
        batch_sample_map: header.assignments,
    };

    info!(
        run_date = %metadata.run_date,
        samples = samples.len(),
        batches = metadata.batch_codes.len(),
        warnings = warnings.len(),
        "parsed workbook"
    );

    let extraction = WorkbookExtraction {
        metadata,
        samples,
        warnings,
    };
    extraction.validate_batch_links()?;
    Ok(extraction)
}

fn read_range(workbook: &mut Sheets<Cursor<Vec<u8>>>, sheet: &str) -> Result<Range<Data>> {
    workbook
        .worksheet_range(sheet)
        .map_err(|e| ParseError::Sheet {
            sheet: sheet.to_string(),
            message: e.to_string(),
        })
}

/// Walk the header row, tracking the current batch marker.
fn scan_header(sheet: &SheetReader<'_>) -> Result<HeaderScan> {
    let mut scan = HeaderScan::default();
    let Some((_, last_col)) = sheet.end() else {
        return Ok(scan);
    };
    let mut current_batch: Option<String> = None;

    for col in 0..=last_col {
        let Some(text) = sheet.text(HEADER_ROW, col) else {
            continue;
        };
        match classify_header(&text) {
            HeaderKind::BatchMarker { code } => {
                if !scan.markers.contains(&code) {
                    scan.markers.push(code.clone());
                }
                current_batch = Some(code);
            }
            HeaderKind::MalformedBatch => {
                return Err(ParseError::UnrecognizedBatch {
                    header: text,
                    cell: cell_ref(HEADER_ROW, col),
                });
            }
            HeaderKind::Skip => {}
            HeaderKind::Sample { sample_id, display } => {
                if let Some(batch) = &current_batch {
                    let bucket = scan.assignments.entry(batch.clone()).or_default();
                    if !bucket.contains(&sample_id) {
                        bucket.push(sample_id.clone());
                    }
                }
                scan.columns.push(SampleColumn {
                    col,
                    sample_id,
                    display,
                    batch_code: current_batch.clone(),
                });
            }
        }
    }
    Ok(scan)
}

/// Batch numbers from the first row of the batch sheet, every other column,
/// up to the first empty cell.
fn batches_from_sheet(sheet: &SheetReader<'_>) -> Vec<String> {
    let Some((_, last_col)) = sheet.end() else {
        return Vec::new();
    };
    let mut batches = Vec::new();
    for col in (0..=last_col).step_by(BATCH_COLUMN_STEP) {
        let Some(token) = sheet.text(0, col) else {
            break;
        };
        if let Some(code) = sanitize_batch_token(&token) {
            batches.push(code);
        }
    }
    debug!(sheet = sheet.name(), count = batches.len(), "read batch sheet");
    batches
}

fn extract_samples(
    sheet: &SheetReader<'_>,
    columns: &[SampleColumn],
    warnings: &mut Vec<CellWarning>,
) -> Result<Vec<SampleQuantification>> {
    let mut test_counters: HashMap<String, usize> = HashMap::new();
    let mut samples = Vec::with_capacity(columns.len());

    for column in columns {
        let base = base_sample_id(&column.sample_id).to_string();
        let counter = test_counters.entry(base.clone()).or_default();
        let test_index = *counter;
        *counter += 1;

        let components = read_compounds(sheet, COMPONENT_ROW_OFFSET, column.col, warnings)?;
        let area_results = read_compounds(sheet, AREA_RESULT_ROW_OFFSET, column.col, warnings)?;

        samples.push(SampleQuantification {
            sample_id: column.sample_id.clone(),
            base_sample_id: base,
            test_index,
            column_header: column.display.clone(),
            batch_code: column.batch_code.clone(),
            components,
            area_results,
            sample_mass_mg: sheet.number(SAMPLE_MASS_ROW, column.col, warnings)?,
            dilution: sheet.number(DILUTION_ROW, column.col, warnings)?,
            serving_mass_g: sheet.number(SERVING_MASS_ROW, column.col, warnings)?,
            servings_per_package: sheet.number(SERVINGS_PER_PACKAGE_ROW, column.col, warnings)?,
        });
    }
    Ok(samples)
}

fn read_compounds(
    sheet: &SheetReader<'_>,
    first_row: u32,
    col: u32,
    warnings: &mut Vec<CellWarning>,
) -> Result<CompoundValues> {
    let mut values = CompoundValues::empty();
    for compound in Compound::ALL {
        let row = first_row + compound.position() as u32;
        values.set(compound, sheet.number(row, col, warnings)?);
    }
    Ok(values)
}

fn deduplicate(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for value in values {
        if !value.is_empty() && !result.contains(&value) {
            result.push(value);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_range(headers: &[&str]) -> Range<Data> {
        let mut range = Range::new((0, 0), (0, headers.len() as u32 - 1));
        for (col, header) in headers.iter().enumerate() {
            range.set_value((0, col as u32), Data::String(header.to_string()));
        }
        range
    }

    #[test]
    fn test_scan_header_tracks_batches() {
        let range = header_range(&["BS 8561", "14956", "14956-1", "Dup 14956", "BS 8545", "15001"]);
        let sheet = SheetReader::new(RESULTS_SHEET, &range, false);
        let scan = scan_header(&sheet).unwrap();

        let ids: Vec<_> = scan.columns.iter().map(|c| c.sample_id.as_str()).collect();
        assert_eq!(ids, vec!["14956", "14956-1", "15001"]);
        assert_eq!(scan.markers, vec!["8561", "8545"]);
        assert_eq!(scan.assignments["8561"], vec!["14956", "14956-1"]);
        assert_eq!(scan.columns[2].batch_code.as_deref(), Some("8545"));
    }

    #[test]
    fn test_samples_before_marker_have_no_batch() {
        let range = header_range(&["14956", "BS 8561", "15001"]);
        let sheet = SheetReader::new(RESULTS_SHEET, &range, false);
        let scan = scan_header(&sheet).unwrap();
        assert_eq!(scan.columns[0].batch_code, None);
        assert!(!scan.assignments.values().flatten().any(|id| id == "14956"));
    }

    #[test]
    fn test_marker_without_samples_is_not_mapped() {
        let range = header_range(&["BS 8561", "BS 8545", "15001"]);
        let sheet = SheetReader::new(RESULTS_SHEET, &range, false);
        let scan = scan_header(&sheet).unwrap();
        assert_eq!(scan.markers, vec!["8561", "8545"]);
        assert!(!scan.assignments.contains_key("8561"));
    }

    #[test]
    fn test_malformed_marker_is_error() {
        let range = header_range(&["14956", "BS-Con"]);
        let sheet = SheetReader::new(RESULTS_SHEET, &range, false);
        let err = scan_header(&sheet).unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedBatch { ref cell, .. } if cell == "B1"));
    }

    #[test]
    fn test_batches_from_sheet_stop_at_gap() {
        let mut range = Range::new((0, 0), (0, 6));
        range.set_value((0, 0), Data::Float(1234.0));
        range.set_value((0, 1), Data::String("ignored".to_string()));
        range.set_value((0, 2), Data::String("BS-5678".to_string()));
        range.set_value((0, 6), Data::Float(9999.0));
        let sheet = SheetReader::new(BATCH_SHEET, &range, false);
        assert_eq!(batches_from_sheet(&sheet), vec!["1234", "5678"]);
    }

    #[test]
    fn test_unknown_batch_link_is_error() {
        use chrono::NaiveDate;

        let sample = SampleQuantification {
            sample_id: "14956".to_string(),
            base_sample_id: "14956".to_string(),
            test_index: 0,
            column_header: "14956".to_string(),
            batch_code: Some("9999".to_string()),
            components: CompoundValues::empty(),
            area_results: CompoundValues::empty(),
            sample_mass_mg: None,
            dilution: None,
            serving_mass_g: None,
            servings_per_package: None,
        };
        let extraction = WorkbookExtraction {
            metadata: RunMetadata {
                run_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                instrument: None,
                source_filename: "20250101_8561.xlsx".to_string(),
                workbook_hash: String::new(),
                batch_codes: vec!["8561".to_string()],
                batch_sample_map: BTreeMap::new(),
            },
            samples: vec![sample],
            warnings: Vec::new(),
        };
        let err = ParseError::from(extraction.validate_batch_links().unwrap_err());
        assert!(matches!(err, ParseError::Inconsistent(_)));
        assert!(err.user_message().contains("9999"));
    }

    #[test]
    fn test_deduplicate_keeps_first_seen() {
        let values = ["b", "a", "b", "", "c"].map(str::to_string);
        assert_eq!(deduplicate(values), vec!["b", "a", "c"]);
    }
}
