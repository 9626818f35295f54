//! Records produced by parsing one results workbook.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::compound::CompoundValues;
use crate::error::{ModelError, Result};

/// Details about the analytical run represented by a workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_date: NaiveDate,
    pub instrument: Option<String>,
    pub source_filename: String,
    /// Hex-encoded SHA-256 of the workbook bytes.
    pub workbook_hash: String,
    /// Ordered, de-duplicated batch codes.
    pub batch_codes: Vec<String>,
    /// Sample ids listed after each batch marker in the results header.
    pub batch_sample_map: BTreeMap<String, Vec<String>>,
}

impl RunMetadata {
    pub fn has_batch(&self, code: &str) -> bool {
        self.batch_codes.iter().any(|candidate| candidate == code)
    }
}

/// Quantitative results for a single sample column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleQuantification {
    /// Normalized header, e.g. `14956` or `14956-1`.
    pub sample_id: String,
    /// Sample id without replicate suffix.
    pub base_sample_id: String,
    /// Occurrence of `base_sample_id` among the sheet columns, starting at 0.
    pub test_index: usize,
    /// Header text as it appears in the sheet.
    pub column_header: String,
    pub batch_code: Option<String>,
    pub components: CompoundValues,
    pub area_results: CompoundValues,
    pub sample_mass_mg: Option<f64>,
    pub dilution: Option<f64>,
    pub serving_mass_g: Option<f64>,
    pub servings_per_package: Option<f64>,
}

impl SampleQuantification {
    /// Label used in previews and summaries.
    pub fn display_header(&self) -> &str {
        if self.column_header.is_empty() {
            &self.sample_id
        } else {
            &self.column_header
        }
    }
}

/// A cell that held text where a number was expected and was read as missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellWarning {
    pub sheet: String,
    /// A1-style reference.
    pub cell: String,
    pub value: String,
}

/// Everything extracted from one workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkbookExtraction {
    pub metadata: RunMetadata,
    pub samples: Vec<SampleQuantification>,
    #[serde(default)]
    pub warnings: Vec<CellWarning>,
}

impl WorkbookExtraction {
    /// Check that every sample batch code belongs to the run's batch set.
    pub fn validate_batch_links(&self) -> Result<()> {
        for sample in &self.samples {
            if let Some(code) = &sample.batch_code
                && !self.metadata.has_batch(code)
            {
                return Err(ModelError::UnknownBatch {
                    sample_id: sample.sample_id.clone(),
                    batch_code: code.clone(),
                });
            }
        }
        Ok(())
    }

    /// Unique base sample ids in first-seen order.
    pub fn base_sample_ids(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.samples
            .iter()
            .filter(|sample| seen.insert(sample.base_sample_id.as_str()))
            .map(|sample| sample.base_sample_id.clone())
            .collect()
    }

    /// Samples sorted by base id, then test index, then id.
    pub fn ordered_samples(&self) -> Vec<&SampleQuantification> {
        let mut ordered: Vec<&SampleQuantification> = self.samples.iter().collect();
        ordered.sort_by(|a, b| {
            (&a.base_sample_id, a.test_index, &a.sample_id).cmp(&(
                &b.base_sample_id,
                b.test_index,
                &b.sample_id,
            ))
        });
        ordered
    }
}
