//! Upload orchestration.
//!
//! Turns a parsed workbook into QBench worksheet updates, then writes a
//! single audit row describing the run. Every external system sits behind a
//! trait in [`services`] so runs can be exercised without a network.

pub mod error;
pub mod payload;
pub mod plan;
pub mod progress;
pub mod report;
pub mod services;
pub mod upload;

pub use error::{Result, RunError};
pub use payload::{cannabinoid_payload, homogeneity_payload};
pub use plan::{
    EligibleTest, HO_ALLOWED_INDICES, REQUIRED_STATE, SamplePlan, ScheduledUpdate, SkipReason,
    TestKind, eligible_tests, plan_sample, replicate_index,
};
pub use progress::{NoProgress, Progress, ProgressSink, Stage};
pub use report::{
    Exchange, PersistenceOutcome, RunReport, RunStatus, SampleFailure, SampleOutcome,
    SampleReport, TestUpdateSummary,
};
pub use services::{
    AuditStore, NoAudit, SampleSource, SupabaseAudit, WorksheetSink, connect_audit, connect_qbench,
};
pub use upload::{Services, UploadOptions, group_by_base_sample, publish_extraction, run_upload};
