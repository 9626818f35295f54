//! Domain model for CN result uploads.
//!
//! Plain records passed between the parser, the QBench/Supabase clients and
//! the upload workflow. Everything here is created once and never mutated by
//! later stages.

pub mod compound;
pub mod error;
pub mod format;
pub mod record;
pub mod run;

pub use compound::{Compound, CompoundValues};
pub use error::{ModelError, Result};
pub use format::{format_number, format_optional};
pub use record::{ExcelPayload, UploadRecord};
pub use run::{CellWarning, RunMetadata, SampleQuantification, WorkbookExtraction};

/// Suffix appended to compound names for area-result worksheet keys.
pub const AREA_RESULT_SUFFIX: &str = "_area";
