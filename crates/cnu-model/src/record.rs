//! Audit row persisted once per run.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ModelError, Result};
use crate::run::{RunMetadata, SampleQuantification, WorkbookExtraction};

/// JSON snapshot of what was read from the workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcelPayload {
    pub metadata: RunMetadata,
    pub samples: Vec<SampleQuantification>,
}

/// One row of the audit table.
///
/// Built after publishing finishes and written exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub run_id: Uuid,
    pub run_date: NaiveDate,
    pub instrument: Option<String>,
    pub file_name: String,
    pub workbook_hash: String,
    pub batch_codes: Vec<String>,
    pub sample_ids: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub excel_payload: serde_json::Value,
    pub qbench_payload: serde_json::Value,
    pub notes: Option<String>,
}

impl UploadRecord {
    /// Assemble the audit row for a run.
    pub fn build(
        run_id: Uuid,
        extraction: &WorkbookExtraction,
        created_by: &str,
        qbench_payload: serde_json::Value,
        notes: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let metadata = &extraction.metadata;
        let excel_payload = serde_json::to_value(ExcelPayload {
            metadata: metadata.clone(),
            samples: extraction.samples.clone(),
        })
        .map_err(|source| ModelError::Serialize {
            what: "excel payload",
            source,
        })?;

        Ok(Self {
            run_id,
            run_date: metadata.run_date,
            instrument: metadata.instrument.clone(),
            file_name: metadata.source_filename.clone(),
            workbook_hash: metadata.workbook_hash.clone(),
            batch_codes: metadata.batch_codes.clone(),
            sample_ids: extraction.base_sample_ids(),
            created_by: created_by.to_string(),
            created_at,
            excel_payload,
            qbench_payload,
            notes,
        })
    }
}
