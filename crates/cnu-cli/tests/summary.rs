//! Integration tests for the terminal tables.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use cnu_cli::summary::{compounds_table, preview_table, report_table, status_line};
use cnu_config::Environment;
use cnu_model::{
    CellWarning, Compound, CompoundValues, RunMetadata, SampleQuantification, WorkbookExtraction,
};
use cnu_workflow::{
    PersistenceOutcome, RunReport, RunStatus, SampleFailure, SampleOutcome, SampleReport,
    SkipReason, TestKind, TestUpdateSummary,
};
use uuid::Uuid;

fn sample(sample_id: &str, test_index: usize) -> SampleQuantification {
    let base = sample_id.split('-').next().unwrap_or(sample_id).to_string();
    SampleQuantification {
        sample_id: sample_id.to_string(),
        base_sample_id: base,
        test_index,
        column_header: sample_id.to_string(),
        batch_code: Some("8561".to_string()),
        components: CompoundValues::from_fn(|c| (c == Compound::Cbd).then_some(12.5)),
        area_results: CompoundValues::empty(),
        sample_mass_mg: Some(101.2),
        dilution: None,
        serving_mass_g: None,
        servings_per_package: None,
    }
}

fn extraction() -> WorkbookExtraction {
    WorkbookExtraction {
        metadata: RunMetadata {
            run_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            instrument: None,
            source_filename: "20250101_8561.xlsx".to_string(),
            workbook_hash: "00".repeat(32),
            batch_codes: vec!["8561".to_string()],
            batch_sample_map: BTreeMap::new(),
        },
        samples: vec![sample("14956", 0), sample("14956-1", 1), sample("15001", 0)],
        warnings: vec![CellWarning {
            sheet: "Results".to_string(),
            cell: "B24".to_string(),
            value: "n/a".to_string(),
        }],
    }
}

fn report(samples: Vec<SampleReport>, status: RunStatus) -> RunReport {
    RunReport {
        run_id: Uuid::nil(),
        status,
        environment: Environment::Sandbox,
        dry_run: false,
        extraction: extraction(),
        samples,
        exchanges: Vec::new(),
        persistence: PersistenceOutcome::Saved,
        finished_at: Utc::now(),
    }
}

fn sample_report(base: &str, outcome: SampleOutcome) -> SampleReport {
    SampleReport {
        base_sample_id: base.to_string(),
        column_headers: vec![base.to_string()],
        skipped_columns: Vec::new(),
        available_cn: 1,
        available_ho: 0,
        outcome,
    }
}

#[test]
fn preview_lists_every_column_and_row() {
    let mut table = preview_table(&extraction());
    table.force_no_tty();
    let rendered = table.to_string();

    assert_eq!(table.column_count(), 4);
    assert!(rendered.contains("14956-1"));
    assert!(rendered.contains("15001"));
    assert!(rendered.contains("12.5"));
    assert!(rendered.contains("101.2"));
    assert!(rendered.contains("CBD_area"));
    assert!(rendered.contains("Servings/package"));
}

#[test]
fn report_shows_outcomes_and_total() {
    let report = report(
        vec![
            sample_report(
                "14956",
                SampleOutcome::Synchronized {
                    tests: vec![TestUpdateSummary {
                        test_id: 501,
                        kind: TestKind::Cannabinoids,
                        column_headers: vec!["14956".to_string()],
                        indices: vec![0],
                    }],
                },
            ),
            sample_report(
                "15001",
                SampleOutcome::failed(SampleFailure::NotFound),
            ),
            sample_report(
                "15002",
                SampleOutcome::Skipped {
                    reason: SkipReason::NoEligibleTests,
                },
            ),
        ],
        RunStatus::PartiallySucceeded,
    );
    let mut table = report_table(&report);
    table.force_no_tty();
    let rendered = table.to_string();

    assert!(rendered.contains("CN #501"));
    assert!(rendered.contains("not found in QBench"));
    assert!(rendered.contains("skipped"));
    assert!(rendered.contains("1/3 synchronized"));
    assert_eq!(status_line(&report), "Partially succeeded: 1/3 synchronized");
}

#[test]
fn report_keeps_tests_written_before_a_failure() {
    let report = report(
        vec![sample_report(
            "14956",
            SampleOutcome::Failed {
                error: SampleFailure::Remote("QBench returned HTTP 500: boom".to_string()),
                applied: vec![TestUpdateSummary {
                    test_id: 501,
                    kind: TestKind::Cannabinoids,
                    column_headers: vec!["14956".to_string()],
                    indices: vec![0],
                }],
            },
        )],
        RunStatus::Failed,
    );
    let mut table = report_table(&report);
    table.force_no_tty();
    let rendered = table.to_string();

    assert!(rendered.contains("CN #501"));
    assert!(rendered.contains("after 1 update(s)"));
}

#[test]
fn compounds_table_has_one_row_per_compound() {
    let mut table = compounds_table();
    table.force_no_tty();
    assert_eq!(table.row_iter().count(), Compound::ALL.len());
    assert!(table.to_string().contains("D9-THC"));
}
