//! Decoding of recorded QBench sample payloads.

use cnu_qbench::{ASSAY_ID_CN, ASSAY_ID_HO, WorksheetUpdate, decode_sample};
use std::collections::BTreeMap;

const SAMPLE_WITH_TESTS: &str = r#"{
    "id": 14956,
    "sample_type": "Gummy",
    "tests": [
        {
            "id": 90001,
            "assay": {"id": 16, "title": "Cannabinoids"},
            "state": "needs review (data team) ",
            "batches": [8561],
            "worksheet_processed": false,
            "worksheet_data": {"CBD": {"value": null}}
        },
        {
            "id": "90002",
            "assay": {"id": 34, "title": "Homogeneity"},
            "state": "IN PROGRESS",
            "batches": [],
            "worksheet_data": null
        },
        {
            "id": 90003,
            "assay": {"id": 7, "title": "Moisture"}
        }
    ]
}"#;

#[test]
fn decodes_recorded_sample() {
    let sample = decode_sample(SAMPLE_WITH_TESTS).unwrap();
    assert_eq!(sample.id, "14956");

    let cn = &sample.tests[0];
    assert_eq!(cn.id, Some(90001));
    assert_eq!(cn.assay_id(), Some(ASSAY_ID_CN));
    assert_eq!(cn.normalized_state(), "NEEDS REVIEW (DATA TEAM)");
    assert_eq!(cn.batches, vec!["8561"]);
    assert!(!cn.has_worksheet_values(["CBD"]));

    let ho = &sample.tests[1];
    assert_eq!(ho.id, Some(90002));
    assert_eq!(ho.assay_id(), Some(ASSAY_ID_HO));
    assert!(ho.worksheet_data.is_none());
    assert!(!ho.has_worksheet_values(["CBD_0"]));

    assert_eq!(sample.tests[2].assay_id(), Some(7));
    assert_eq!(sample.tests[2].state, None);
}

#[test]
fn malformed_payload_is_an_error() {
    assert!(decode_sample(r#"{"tests": []}"#).is_err());
    assert!(decode_sample("<html>maintenance</html>").is_err());
}

#[test]
fn worksheet_update_serializes_sorted_keys() {
    let update = WorksheetUpdate::new(BTreeMap::from([
        ("dilution".to_string(), "2".to_string()),
        ("CBD".to_string(), "1.5".to_string()),
    ]));
    assert_eq!(
        serde_json::to_string(&update).unwrap(),
        r#"{"data":{"CBD":"1.5","dilution":"2"}}"#
    );
    assert_eq!(update.keys().collect::<Vec<_>>(), vec!["CBD", "dilution"]);
}
