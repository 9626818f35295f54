//! The insert body must carry exactly the audit table columns.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};
use cnu_model::{CompoundValues, RunMetadata, SampleQuantification, UploadRecord, WorkbookExtraction};
use cnu_supabase::Session;
use serde_json::json;
use uuid::Uuid;

fn extraction() -> WorkbookExtraction {
    let sample = |id: &str, base: &str, index: usize| SampleQuantification {
        sample_id: id.to_string(),
        base_sample_id: base.to_string(),
        test_index: index,
        column_header: id.to_string(),
        batch_code: Some("8561".to_string()),
        components: CompoundValues::empty(),
        area_results: CompoundValues::empty(),
        sample_mass_mg: Some(100.0),
        dilution: None,
        serving_mass_g: None,
        servings_per_package: None,
    };
    WorkbookExtraction {
        metadata: RunMetadata {
            run_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            instrument: Some("HPLC-2".to_string()),
            source_filename: "20250101_8561.xlsx".to_string(),
            workbook_hash: "ab".repeat(32),
            batch_codes: vec!["8561".to_string()],
            batch_sample_map: BTreeMap::from([(
                "8561".to_string(),
                vec!["14956".to_string(), "14956-1".to_string()],
            )]),
        },
        samples: vec![sample("14956", "14956", 0), sample("14956-1", "14956", 1)],
        warnings: Vec::new(),
    }
}

#[test]
fn insert_body_matches_table_columns() {
    let record = UploadRecord::build(
        Uuid::nil(),
        &extraction(),
        "analyst@lab.test",
        json!({"status": "done"}),
        None,
        Utc.with_ymd_and_hms(2025, 1, 2, 8, 30, 0).unwrap(),
    )
    .unwrap();

    let body = serde_json::to_value(&record).unwrap();
    let mut columns: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
    columns.sort();
    assert_eq!(
        columns,
        vec![
            "batch_codes",
            "created_at",
            "created_by",
            "excel_payload",
            "file_name",
            "instrument",
            "notes",
            "qbench_payload",
            "run_date",
            "run_id",
            "sample_ids",
            "workbook_hash",
        ]
    );
    assert_eq!(body["run_date"], "2025-01-01");
    assert_eq!(body["sample_ids"], json!(["14956"]));
    assert_eq!(body["excel_payload"]["samples"].as_array().unwrap().len(), 2);
}

#[test]
fn session_from_sign_in_response() {
    let session: Session = serde_json::from_value(json!({
        "access_token": "jwt",
        "token_type": "bearer",
        "user": {"id": "6f1c", "email": "analyst@lab.test", "role": "authenticated"}
    }))
    .unwrap();
    assert_eq!(session.user.id, "6f1c");
    assert_eq!(session.display_name(), "analyst@lab.test");
}
