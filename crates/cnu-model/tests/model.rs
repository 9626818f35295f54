//! Tests for run records and the audit row.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};
use cnu_model::{
    Compound, CompoundValues, ModelError, RunMetadata, SampleQuantification, UploadRecord,
    WorkbookExtraction,
};
use uuid::Uuid;

fn sample(id: &str, base: &str, index: usize, batch: Option<&str>) -> SampleQuantification {
    SampleQuantification {
        sample_id: id.to_string(),
        base_sample_id: base.to_string(),
        test_index: index,
        column_header: format!("{id} Inj. 1"),
        batch_code: batch.map(String::from),
        components: CompoundValues::from_fn(|c| (c == Compound::Cbd).then_some(0.1)),
        area_results: CompoundValues::empty(),
        sample_mass_mg: Some(100.0),
        dilution: Some(2.0),
        serving_mass_g: None,
        servings_per_package: None,
    }
}

fn extraction() -> WorkbookExtraction {
    WorkbookExtraction {
        metadata: RunMetadata {
            run_date: NaiveDate::from_ymd_opt(2025, 9, 5).unwrap(),
            instrument: Some("HPLC-01".to_string()),
            source_filename: "20250905_run.xlsx".to_string(),
            workbook_hash: "abc123".to_string(),
            batch_codes: vec!["8398".to_string(), "8386".to_string()],
            batch_sample_map: BTreeMap::from([
                ("8398".to_string(), vec!["14691".to_string()]),
                (
                    "8386".to_string(),
                    vec!["14733".to_string(), "14733-1".to_string()],
                ),
            ]),
        },
        samples: vec![
            sample("14691", "14691", 0, Some("8398")),
            sample("14733", "14733", 0, Some("8386")),
            sample("14733-1", "14733", 1, Some("8386")),
        ],
        warnings: vec![],
    }
}

#[test]
fn batch_links_are_valid() {
    assert!(extraction().validate_batch_links().is_ok());
}

#[test]
fn unknown_batch_is_rejected() {
    let mut extraction = extraction();
    extraction.samples[0].batch_code = Some("9999".to_string());
    let err = extraction.validate_batch_links().unwrap_err();
    assert!(matches!(err, ModelError::UnknownBatch { ref batch_code, .. } if batch_code == "9999"));
}

#[test]
fn samples_without_batch_are_allowed() {
    let mut extraction = extraction();
    extraction.samples[0].batch_code = None;
    assert!(extraction.validate_batch_links().is_ok());
}

#[test]
fn base_sample_ids_are_unique_and_ordered() {
    assert_eq!(extraction().base_sample_ids(), vec!["14691", "14733"]);
}

#[test]
fn upload_record_collects_run_columns() {
    let extraction = extraction();
    let created_at = Utc.with_ymd_and_hms(2025, 9, 5, 12, 0, 0).unwrap();
    let record = UploadRecord::build(
        Uuid::nil(),
        &extraction,
        "user@example.com",
        serde_json::json!({"status": "completed"}),
        None,
        created_at,
    )
    .unwrap();

    assert_eq!(record.run_date.to_string(), "2025-09-05");
    assert_eq!(record.file_name, "20250905_run.xlsx");
    assert_eq!(record.instrument.as_deref(), Some("HPLC-01"));
    assert_eq!(record.batch_codes, vec!["8398", "8386"]);
    assert_eq!(record.sample_ids, vec!["14691", "14733"]);
    assert_eq!(record.created_by, "user@example.com");
    assert_eq!(record.excel_payload["samples"].as_array().unwrap().len(), 3);
    assert_eq!(
        record.excel_payload["metadata"]["batch_sample_map"]["8386"][1],
        "14733-1"
    );
    assert_eq!(record.qbench_payload["status"], "completed");

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["run_date"], "2025-09-05");
    assert_eq!(json["excel_payload"]["samples"][0]["components"]["CBD"], 0.1);
}
