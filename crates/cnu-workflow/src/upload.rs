//! Run orchestration: parse, look up, publish, persist.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use cnu_config::Environment;
use cnu_ingest::{ParseOptions, parse_workbook};
use cnu_model::{SampleQuantification, UploadRecord, WorkbookExtraction};
use cnu_qbench::{QBenchError, QBenchSample};
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::plan::{SamplePlan, SkipReason, plan_sample};
use crate::progress::{Progress, ProgressSink, Stage};
use crate::report::{
    Exchange, PersistenceOutcome, RunReport, RunStatus, SampleFailure, SampleOutcome,
    SampleReport, TestUpdateSummary,
};
use crate::services::{AuditStore, SampleSource, WorksheetSink};

/// Sample lookups are retried once on network errors and HTTP 429/5xx.
const LOOKUP_ATTEMPTS: usize = 2;

/// Run behavior.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub environment: Environment,
    /// Plan and report without writing to QBench or Supabase.
    pub dry_run: bool,
    /// Leave tests alone whose worksheet already holds values.
    pub skip_processed_tests: bool,
    /// Recorded as `created_by` on the audit row.
    pub created_by: String,
    pub notes: Option<String>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            dry_run: false,
            skip_processed_tests: true,
            created_by: String::new(),
            notes: None,
        }
    }
}

/// The external systems a run talks to.
pub struct Services<'a> {
    pub samples: &'a dyn SampleSource,
    pub worksheets: &'a dyn WorksheetSink,
    pub audit: &'a dyn AuditStore,
}

/// Parse a workbook and publish it.
///
/// Parse failures abort before any network request.
pub fn run_upload(
    path: &Path,
    parse_options: &ParseOptions,
    options: &UploadOptions,
    services: &Services<'_>,
    progress: &dyn ProgressSink,
) -> Result<RunReport> {
    progress.report(Progress::new(
        Stage::Parsing,
        format!("Reading {}", path.display()),
    ));
    let extraction = parse_workbook(path, parse_options)?;
    publish_extraction(extraction, options, services, progress)
}

/// Publish an already parsed workbook and write the audit row.
pub fn publish_extraction(
    extraction: WorkbookExtraction,
    options: &UploadOptions,
    services: &Services<'_>,
    progress: &dyn ProgressSink,
) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    let span = info_span!(
        "upload_run",
        %run_id,
        file = %extraction.metadata.source_filename,
        dry_run = options.dry_run
    );
    let _guard = span.enter();

    let groups = group_by_base_sample(&extraction.samples);
    let total = groups.len();
    info!(samples = total, "starting upload");

    let mut samples = Vec::with_capacity(total);
    let mut exchanges = Vec::new();
    for (position, (base_sample_id, columns)) in groups.iter().enumerate() {
        let sample_span = info_span!("sample", base_sample_id = %base_sample_id);
        let _sample_guard = sample_span.enter();

        progress.report(Progress::new(
            Stage::LookingUp,
            format!("Sample {base_sample_id} ({}/{total})", position + 1),
        ));
        let report = process_sample(
            base_sample_id,
            columns,
            options,
            services,
            progress,
            &mut exchanges,
        );
        info!(outcome = ?report.outcome, "sample processed");
        samples.push(report);
    }

    let failed = samples
        .iter()
        .filter(|sample| matches!(sample.outcome, SampleOutcome::Failed { .. }))
        .count();
    let mut report = RunReport {
        run_id,
        status: RunStatus::from_counts(failed, samples.len()),
        environment: options.environment,
        dry_run: options.dry_run,
        extraction,
        samples,
        exchanges,
        persistence: PersistenceOutcome::SkippedDryRun,
        finished_at: Utc::now(),
    };

    report.persistence = if options.dry_run {
        info!("dry run: audit record not written");
        PersistenceOutcome::SkippedDryRun
    } else {
        progress.report(Progress::new(Stage::Persisting, "Saving audit record"));
        persist(&report, options, services.audit)
    };

    progress.report(Progress::new(Stage::Done, report.user_message()));
    info!(status = ?report.status, summary = %report.summary_line(), "upload finished");
    Ok(report)
}

/// Group columns by base sample id, first-seen order, each group ordered by
/// test index.
pub fn group_by_base_sample(
    samples: &[SampleQuantification],
) -> Vec<(String, Vec<SampleQuantification>)> {
    let mut groups: Vec<(String, Vec<SampleQuantification>)> = Vec::new();
    let mut positions: BTreeMap<&str, usize> = BTreeMap::new();
    for sample in samples {
        let position = *positions
            .entry(sample.base_sample_id.as_str())
            .or_insert_with(|| {
                groups.push((sample.base_sample_id.clone(), Vec::new()));
                groups.len() - 1
            });
        groups[position].1.push(sample.clone());
    }
    for (_, columns) in &mut groups {
        columns.sort_by_key(|column| column.test_index);
    }
    groups
}

fn process_sample(
    base_sample_id: &str,
    columns: &[SampleQuantification],
    options: &UploadOptions,
    services: &Services<'_>,
    progress: &dyn ProgressSink,
    exchanges: &mut Vec<Exchange>,
) -> SampleReport {
    let column_headers: Vec<String> = columns
        .iter()
        .map(|column| column.display_header().to_string())
        .collect();
    let mut report = SampleReport {
        base_sample_id: base_sample_id.to_string(),
        column_headers: column_headers.clone(),
        skipped_columns: column_headers,
        available_cn: 0,
        available_ho: 0,
        outcome: SampleOutcome::failed(SampleFailure::NotFound),
    };

    let qbench_sample = match find_sample(services.samples, base_sample_id) {
        Ok(sample) => sample,
        Err(QBenchError::NotFound { .. }) => {
            warn!("sample not found in QBench");
            return report;
        }
        Err(err) => {
            warn!(error = %err, "sample lookup failed");
            report.outcome = SampleOutcome::failed(SampleFailure::Remote(err.to_string()));
            return report;
        }
    };

    let plan = plan_sample(base_sample_id, columns, &qbench_sample);
    report.available_cn = plan.available_cn;
    report.available_ho = plan.available_ho;
    if let Some(reason) = plan.skip.clone() {
        info!(%reason, "sample skipped");
        report.skipped_columns = plan.skipped_columns;
        report.outcome = SampleOutcome::Skipped { reason };
        return report;
    }

    progress.report(Progress::new(
        Stage::Publishing,
        format!("Sample {base_sample_id}: {} update(s)", plan.updates.len()),
    ));
    let executed = execute_plan(&plan, options, services, exchanges);
    report.skipped_columns = plan.skipped_columns;
    report.skipped_columns.extend(executed.skipped_columns);
    report.outcome = match (executed.failure, executed.applied.is_empty()) {
        (Some(error), _) => SampleOutcome::Failed {
            error,
            applied: executed.applied,
        },
        (None, false) => SampleOutcome::Synchronized {
            tests: executed.applied,
        },
        (None, true) => SampleOutcome::Skipped {
            reason: executed.skip_reason.unwrap_or(SkipReason::NoPayload),
        },
    };
    report
}

fn find_sample(
    samples: &dyn SampleSource,
    base_sample_id: &str,
) -> std::result::Result<QBenchSample, QBenchError> {
    let mut attempt = 1;
    loop {
        match samples.find_sample(base_sample_id) {
            Err(err) if err.is_retryable() && attempt < LOOKUP_ATTEMPTS => {
                warn!(error = %err, attempt, "sample lookup failed; retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[derive(Default)]
struct ExecutedPlan {
    applied: Vec<TestUpdateSummary>,
    skipped_columns: Vec<String>,
    skip_reason: Option<SkipReason>,
    failure: Option<SampleFailure>,
}

/// Send each scheduled update; stops at the first failed request. Updates
/// sent before the failure stay in `applied`.
fn execute_plan(
    plan: &SamplePlan,
    options: &UploadOptions,
    services: &Services<'_>,
    exchanges: &mut Vec<Exchange>,
) -> ExecutedPlan {
    let mut executed = ExecutedPlan::default();

    for update in &plan.updates {
        let payload = update.payload();
        if payload.is_empty() {
            executed.skipped_columns.extend(update.column_headers());
            continue;
        }
        if options.skip_processed_tests && update.test.test.has_worksheet_values(payload.keys()) {
            info!(test_id = update.test.test_id, "worksheet already has values");
            executed.skipped_columns.extend(update.column_headers());
            executed.skip_reason.get_or_insert(SkipReason::AlreadyProcessed);
            continue;
        }

        if !options.dry_run {
            match services
                .worksheets
                .update_worksheet(update.test.test_id, &payload)
            {
                Ok(response) => exchanges.push(Exchange {
                    base_sample_id: plan.base_sample_id.clone(),
                    test_id: update.test.test_id,
                    kind: update.kind(),
                    request: payload,
                    response,
                }),
                Err(err) => {
                    warn!(test_id = update.test.test_id, error = %err, "worksheet update failed");
                    executed.failure = Some(SampleFailure::Remote(err.to_string()));
                    break;
                }
            }
        }

        executed.applied.push(TestUpdateSummary {
            test_id: update.test.test_id,
            kind: update.kind(),
            column_headers: update.column_headers(),
            indices: update.indices(),
        });
    }
    executed
}

/// Write the audit row. Failures are reported, never raised: QBench may
/// already hold the run's values.
fn persist(
    report: &RunReport,
    options: &UploadOptions,
    audit: &dyn AuditStore,
) -> PersistenceOutcome {
    let record = match UploadRecord::build(
        report.run_id,
        &report.extraction,
        &options.created_by,
        report.qbench_payload(),
        options.notes.clone(),
        report.finished_at,
    ) {
        Ok(record) => record,
        Err(err) => {
            warn!(error = %err, "audit record could not be assembled");
            return PersistenceOutcome::Failed(err.to_string());
        }
    };
    match audit.insert_upload_record(&record) {
        Ok(()) => PersistenceOutcome::Saved,
        Err(err) => {
            warn!(error = %err, "audit record not saved");
            PersistenceOutcome::Failed(err.to_string())
        }
    }
}
