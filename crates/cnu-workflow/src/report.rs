//! Run outcomes.

use chrono::{DateTime, Utc};
use cnu_config::Environment;
use cnu_model::WorkbookExtraction;
use cnu_qbench::WorksheetUpdate;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::plan::{SkipReason, TestKind};

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No base sample failed. Skipped samples count as handled.
    Done,
    /// At least one, but not every, base sample failed.
    PartiallySucceeded,
    /// Every base sample failed, or there was none.
    Failed,
}

impl RunStatus {
    pub fn from_counts(failed: usize, total: usize) -> Self {
        match failed {
            n if n == total => Self::Failed,
            0 => Self::Done,
            _ => Self::PartiallySucceeded,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Done => "Done",
            Self::PartiallySucceeded => "Partially succeeded",
            Self::Failed => "Failed",
        }
    }
}

/// One worksheet that was (or in a dry run, would have been) updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestUpdateSummary {
    pub test_id: u64,
    pub kind: TestKind,
    pub column_headers: Vec<String>,
    pub indices: Vec<usize>,
}

/// Why a sample failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SampleFailure {
    /// The sample does not exist in QBench.
    NotFound,
    /// QBench rejected or did not answer a request.
    Remote(String),
}

impl SampleFailure {
    pub fn describe(&self) -> String {
        match self {
            Self::NotFound => "not found in QBench".to_string(),
            Self::Remote(message) => message.clone(),
        }
    }
}

/// Outcome for one base sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SampleOutcome {
    Synchronized { tests: Vec<TestUpdateSummary> },
    Skipped { reason: SkipReason },
    Failed {
        error: SampleFailure,
        /// Worksheets written before the failing request.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        applied: Vec<TestUpdateSummary>,
    },
}

impl SampleOutcome {
    pub fn failed(error: SampleFailure) -> Self {
        Self::Failed {
            error,
            applied: Vec::new(),
        }
    }

    pub fn is_synchronized(&self) -> bool {
        matches!(self, Self::Synchronized { .. })
    }

    /// Tests that received values, whatever the outcome.
    pub fn applied_tests(&self) -> &[TestUpdateSummary] {
        match self {
            Self::Synchronized { tests } | Self::Failed { applied: tests, .. } => tests,
            Self::Skipped { .. } => &[],
        }
    }
}

/// Per-sample section of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleReport {
    pub base_sample_id: String,
    pub column_headers: Vec<String>,
    pub skipped_columns: Vec<String>,
    pub available_cn: usize,
    pub available_ho: usize,
    #[serde(flatten)]
    pub outcome: SampleOutcome,
}

/// A worksheet request and QBench's answer, kept for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub base_sample_id: String,
    pub test_id: u64,
    pub kind: TestKind,
    pub request: WorksheetUpdate,
    pub response: Value,
}

/// What happened to the audit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum PersistenceOutcome {
    Saved,
    SkippedDryRun,
    Failed(String),
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub environment: Environment,
    pub dry_run: bool,
    pub extraction: WorkbookExtraction,
    pub samples: Vec<SampleReport>,
    pub exchanges: Vec<Exchange>,
    pub persistence: PersistenceOutcome,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn synchronized_count(&self) -> usize {
        self.samples
            .iter()
            .filter(|sample| sample.outcome.is_synchronized())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.samples
            .iter()
            .filter(|sample| matches!(sample.outcome, SampleOutcome::Failed { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.samples
            .iter()
            .filter(|sample| matches!(sample.outcome, SampleOutcome::Skipped { .. }))
            .count()
    }

    /// Short summary such as `5/6 synchronized`.
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{}/{} synchronized",
            self.synchronized_count(),
            self.samples.len()
        );
        if self.dry_run {
            line.push_str(" (dry run)");
        }
        line
    }

    /// Final message for the user, including any persistence problem.
    pub fn user_message(&self) -> String {
        let mut message = format!("{}: {}", self.status.label(), self.summary_line());
        let failed = self.failed_count();
        if failed > 0 {
            message.push_str(&format!(", {failed} failed"));
        }
        let skipped = self.skipped_count();
        if skipped > 0 {
            message.push_str(&format!(", {skipped} skipped"));
        }
        message.push('.');
        if let PersistenceOutcome::Failed(error) = &self.persistence {
            let notice = if self.exchanges.is_empty() {
                "No QBench updates were made, and the audit record was not saved"
            } else {
                "QBench updates were applied, but the audit record was not saved"
            };
            message.push_str(&format!(" {notice}: {error}"));
        }
        message
    }

    /// JSON stored in the audit row's `qbench_payload` column.
    pub fn qbench_payload(&self) -> Value {
        serde_json::json!({
            "status": self.status,
            "environment": self.environment.as_str(),
            "dry_run": self.dry_run,
            "summary": self.summary_line(),
            "synced_at": self.finished_at,
            "samples": self.samples,
            "exchanges": self.exchanges,
        })
    }
}
