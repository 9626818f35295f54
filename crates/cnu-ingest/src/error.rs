//! Error types for workbook parsing.

use std::path::PathBuf;

use cnu_model::ModelError;
use thiserror::Error;

/// Errors that can occur while reading a results workbook.
///
/// Every variant aborts the parse; no partial extraction is returned.
#[derive(Debug, Error)]
pub enum ParseError {
    // === File Errors ===
    /// The workbook could not be opened or is not a spreadsheet.
    #[error("failed to open workbook {path}: {message}")]
    Open { path: PathBuf, message: String },

    /// The workbook file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Sheet Errors ===
    /// A required sheet is absent.
    #[error("sheet '{sheet}' not found in {path}")]
    MissingSheet { sheet: &'static str, path: PathBuf },

    /// A sheet exists but could not be read.
    #[error("failed to read sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },

    // === Content Errors ===
    /// Neither the file name nor the sheet carries a run date.
    #[error("no run date found in file name '{filename}' or in the results sheet")]
    MissingRunDate { filename: String },

    /// A run date candidate was found but is not a valid date.
    #[error("invalid run date '{value}'")]
    InvalidRunDate { value: String },

    /// A batch marker header without a batch number.
    #[error("unrecognized batch marker '{header}' in cell {cell}")]
    UnrecognizedBatch { header: String, cell: String },

    /// Text found in a numeric cell while strict numeric parsing is on.
    #[error("non-numeric value '{value}' in {sheet}!{cell}")]
    NonNumeric {
        sheet: String,
        cell: String,
        value: String,
    },

    /// The results sheet has no sample columns.
    #[error("no sample columns found in sheet '{sheet}'")]
    NoSamples { sheet: &'static str },

    /// The extraction breaks a model invariant.
    #[error(transparent)]
    Inconsistent(#[from] ModelError),
}

impl ParseError {
    /// Message suitable for the status overlay or CLI output.
    pub fn user_message(&self) -> String {
        match self {
            Self::Open { path, .. } => format!(
                "Could not open {}. Make sure it is an .xlsx or .xlsm workbook.",
                display_name(path)
            ),
            Self::Io { path, .. } => format!("Could not read {}.", display_name(path)),
            Self::MissingSheet { sheet, .. } => {
                format!("The workbook has no '{sheet}' sheet.")
            }
            Self::MissingRunDate { .. } => {
                "No run date found. Name the file YYYYMMDD_... or add a 'Run Date' cell."
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Result type for parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;
