//! Run date, file-name batches and labeled metadata cells.

use std::cmp::Ordering;

use calamine::Data;
use chrono::{Duration, NaiveDate};

use crate::cell::{SheetReader, cell_text};
use crate::error::{ParseError, Result};
use crate::layout::HEADER_ROW;

/// Day zero of the Excel 1900 date system for serials from 61 on.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Serial Excel assigns to 1900-02-29, a day that never existed.
const EXCEL_PHANTOM_LEAP_DAY: i64 = 60;

/// Text formats accepted in a labeled run date cell.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y%m%d"];

/// What the file name says about the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameInfo {
    pub run_date: NaiveDate,
    /// Digit-only tokens following the date.
    pub batch_codes: Vec<String>,
}

/// Parse `YYYYMMDD_<batch>_<batch> description` file stems.
///
/// Returns `Ok(None)` when the stem does not start with eight digits.
pub fn parse_filename(stem: &str) -> Result<Option<FilenameInfo>> {
    let primary = stem.split(' ').next().unwrap_or_default();
    let mut parts = primary.split('_').filter(|part| !part.is_empty());
    let Some(raw_date) = parts.next() else {
        return Ok(None);
    };
    if raw_date.len() != 8 || !raw_date.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    let run_date =
        NaiveDate::parse_from_str(raw_date, "%Y%m%d").map_err(|_| ParseError::InvalidRunDate {
            value: raw_date.to_string(),
        })?;
    let batch_codes = parts
        .filter(|part| part.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
        .collect();
    Ok(Some(FilenameInfo {
        run_date,
        batch_codes,
    }))
}

/// Find a `label` cell below the header row and return the cell to its right.
///
/// Labels match case-insensitively and may end with a colon.
pub(crate) fn find_labeled_value<'a>(sheet: &'a SheetReader<'_>, label: &str) -> Option<&'a Data> {
    let (last_row, last_col) = sheet.end()?;
    for row in (HEADER_ROW + 1)..=last_row {
        for col in 0..last_col {
            let Some(text) = sheet.text(row, col) else {
                continue;
            };
            let normalized = text.trim_end_matches(':').trim();
            if normalized.eq_ignore_ascii_case(label) {
                return sheet.get(row, col + 1);
            }
        }
    }
    None
}

/// Interpret a labeled run date cell.
pub(crate) fn date_from_cell(cell: &Data) -> Result<NaiveDate> {
    let invalid = || ParseError::InvalidRunDate {
        value: cell_text(cell).unwrap_or_default(),
    };
    match cell {
        Data::DateTime(value) => excel_serial_to_date(value.as_f64()).ok_or_else(invalid),
        Data::Float(value) => excel_serial_to_date(*value).ok_or_else(invalid),
        Data::Int(value) => excel_serial_to_date(*value as f64).ok_or_else(invalid),
        Data::DateTimeIso(text) => text
            .get(..10)
            .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
            .ok_or_else(invalid),
        Data::String(text) => parse_date_text(text).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Convert a 1900-system serial. Serials below 60 sit before the phantom
/// leap day and are one day closer to the epoch; 60 itself has no date.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let days = serial.floor() as i64;
    let offset = match days.cmp(&EXCEL_PHANTOM_LEAP_DAY) {
        Ordering::Less => days + 1,
        Ordering::Equal => return None,
        Ordering::Greater => days,
    };
    let (year, month, day) = EXCEL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(year, month, day)?;
    epoch.checked_add_signed(Duration::days(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_with_batches() {
        let info = parse_filename("20250101_8561_8545 run").unwrap().unwrap();
        assert_eq!(info.run_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(info.batch_codes, vec!["8561", "8545"]);
    }

    #[test]
    fn test_filename_ignores_non_numeric_tokens() {
        let info = parse_filename("20240315_CN_8561").unwrap().unwrap();
        assert_eq!(info.batch_codes, vec!["8561"]);
    }

    #[test]
    fn test_filename_without_date() {
        assert_eq!(parse_filename("CN results").unwrap(), None);
        assert_eq!(parse_filename("2025_8561").unwrap(), None);
        assert_eq!(parse_filename("").unwrap(), None);
    }

    #[test]
    fn test_filename_with_impossible_date() {
        let err = parse_filename("20251399_8561").unwrap_err();
        assert!(matches!(err, ParseError::InvalidRunDate { ref value } if value == "20251399"));
    }

    #[test]
    fn test_date_from_cell() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(date_from_cell(&Data::Float(45658.0)).unwrap(), expected);
        assert_eq!(
            date_from_cell(&Data::String("2025-01-01".to_string())).unwrap(),
            expected
        );
        assert_eq!(
            date_from_cell(&Data::String("01/01/2025".to_string())).unwrap(),
            expected
        );
        assert_eq!(
            date_from_cell(&Data::String("20250101".to_string())).unwrap(),
            expected
        );
        assert!(date_from_cell(&Data::String("soon".to_string())).is_err());
        assert!(date_from_cell(&Data::Empty).is_err());
    }

    #[test]
    fn test_serials_around_phantom_leap_day() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
        assert_eq!(excel_serial_to_date(1.0), date(1900, 1, 1));
        assert_eq!(excel_serial_to_date(59.0), date(1900, 2, 28));
        assert_eq!(excel_serial_to_date(60.0), None);
        assert_eq!(excel_serial_to_date(61.0), date(1900, 3, 1));
        assert_eq!(excel_serial_to_date(45658.0), date(2025, 1, 1));
        assert_eq!(excel_serial_to_date(0.0), None);
    }
}
