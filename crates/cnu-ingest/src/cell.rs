//! Cell access and numeric coercion.

use calamine::{Data, Range};
use cnu_model::CellWarning;

use crate::error::{ParseError, Result};
use crate::layout::cell_ref;

/// Read-only view of one worksheet addressed by absolute 0-based positions.
pub(crate) struct SheetReader<'a> {
    name: &'a str,
    range: &'a Range<Data>,
    strict_numeric: bool,
}

impl<'a> SheetReader<'a> {
    pub(crate) fn new(name: &'a str, range: &'a Range<Data>, strict_numeric: bool) -> Self {
        Self {
            name,
            range,
            strict_numeric,
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.name
    }

    /// Last used (row, column), or `None` for an empty sheet.
    pub(crate) fn end(&self) -> Option<(u32, u32)> {
        self.range.end()
    }

    pub(crate) fn get(&self, row: u32, col: u32) -> Option<&Data> {
        self.range.get_value((row, col))
    }

    /// Cell content as trimmed text; `None` for empty and error cells.
    pub(crate) fn text(&self, row: u32, col: u32) -> Option<String> {
        self.get(row, col).and_then(cell_text)
    }

    /// Read a numeric cell.
    ///
    /// Text that does not parse as a number is either recorded in `warnings`
    /// and read as missing, or rejected when strict numeric parsing is on.
    pub(crate) fn number(
        &self,
        row: u32,
        col: u32,
        warnings: &mut Vec<CellWarning>,
    ) -> Result<Option<f64>> {
        let Some(cell) = self.get(row, col) else {
            return Ok(None);
        };
        match coerce_number(cell) {
            Coerced::Number(value) => Ok(Some(value)),
            Coerced::Missing => Ok(None),
            Coerced::Invalid(value) => {
                let cell = cell_ref(row, col);
                if self.strict_numeric {
                    return Err(ParseError::NonNumeric {
                        sheet: self.name.to_string(),
                        cell,
                        value,
                    });
                }
                tracing::warn!(sheet = self.name, %cell, %value, "non-numeric cell read as missing");
                warnings.push(CellWarning {
                    sheet: self.name.to_string(),
                    cell,
                    value,
                });
                Ok(None)
            }
        }
    }
}

#[derive(Debug, PartialEq)]
enum Coerced {
    Number(f64),
    Missing,
    Invalid(String),
}

fn coerce_number(cell: &Data) -> Coerced {
    match cell {
        Data::Float(value) => Coerced::Number(*value),
        Data::Int(value) => Coerced::Number(*value as f64),
        Data::Empty => Coerced::Missing,
        Data::String(text) => parse_numeric_text(text),
        Data::Error(error) => Coerced::Invalid(error.to_string()),
        other => Coerced::Invalid(other.to_string()),
    }
}

fn parse_numeric_text(text: &str) -> Coerced {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Coerced::Missing;
    }
    match trimmed.replace(',', "").parse::<f64>() {
        Ok(value) if value.is_finite() => Coerced::Number(value),
        _ => Coerced::Invalid(trimmed.to_string()),
    }
}

/// Render a cell as trimmed text.
///
/// Whole floats are rendered without a fractional part so that numeric
/// headers such as `14956` read the same as their text form.
pub(crate) fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(text) => text.trim().to_string(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        other => other.to_string().trim().to_string(),
    };
    (!text.is_empty()).then_some(text)
}
