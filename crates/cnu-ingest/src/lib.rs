//! CN results workbook parsing.
//!
//! Reads the `Results Transfer` sheet (one column per sample) and the optional
//! `Blank Spike Recovery` sheet into a [`cnu_model::WorkbookExtraction`].
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use cnu_ingest::{ParseOptions, parse_workbook};
//!
//! let extraction = parse_workbook(
//!     Path::new("20250101_8561_8545 run.xlsx"),
//!     &ParseOptions::default(),
//! )?;
//! println!("{} samples", extraction.samples.len());
//! ```

mod cell;
mod error;
mod hash;
mod header;
pub mod layout;
mod run_date;
mod workbook;

// === Error Types ===
pub use error::{ParseError, Result};

// === Parsing ===
pub use workbook::{ParseOptions, parse_workbook};

// === Helpers ===
pub use hash::WorkbookBytes;
pub use header::{
    HeaderKind, base_sample_id, classify_header, format_column_header, normalize_sample_header,
    sanitize_batch_token,
};
pub use run_date::{FilenameInfo, parse_filename};
