//! QBench API types.
//!
//! Ids arrive as numbers in some QBench deployments and as strings in others,
//! so every id field accepts both.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Assay id of the cannabinoid potency test.
pub const ASSAY_ID_CN: u64 = 16;
/// Assay id of the homogeneity test.
pub const ASSAY_ID_HO: u64 = 34;

/// A sample with its tests (`?include=tests`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QBenchSample {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub tests: Vec<QBenchTest>,
}

/// A test attached to a sample.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QBenchTest {
    /// `None` when QBench sent an id that is not an integer.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<u64>,
    #[serde(default)]
    pub assay: Option<AssayRef>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "batch_list")]
    pub batches: Vec<String>,
    #[serde(default)]
    pub worksheet_processed: bool,
    #[serde(default, alias = "label", alias = "test_name")]
    pub name: Option<String>,
    /// Current worksheet fields, keyed by field name.
    #[serde(default)]
    pub worksheet_data: Option<serde_json::Map<String, Value>>,
}

/// Assay reference embedded in a test.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssayRef {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
}

impl QBenchTest {
    pub fn assay_id(&self) -> Option<u64> {
        self.assay.as_ref().and_then(|assay| assay.id)
    }

    /// State text trimmed and upper-cased.
    pub fn normalized_state(&self) -> String {
        self.state
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_uppercase()
    }

    /// Whether any of `keys` already holds a non-blank, non-zero value.
    ///
    /// Fields may be plain values or objects carrying `value` or
    /// `default_numeric_value`.
    pub fn has_worksheet_values<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> bool {
        let Some(data) = &self.worksheet_data else {
            return false;
        };
        keys.into_iter().any(|key| match data.get(key) {
            None => false,
            Some(Value::Object(field)) => {
                let value = field
                    .get("value")
                    .filter(|v| !v.is_null())
                    .or_else(|| field.get("default_numeric_value"));
                value.is_some_and(|v| !is_blank_value(v))
            }
            Some(value) => !is_blank_value(value),
        })
    }
}

fn is_blank_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Number(number) => number.as_f64().is_some_and(|n| n == 0.0),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return true;
            }
            text.trim_end_matches('%')
                .parse::<f64>()
                .is_ok_and(|n| n == 0.0)
        }
        _ => false,
    }
}

/// Body of `PATCH /api/v1/test/{id}/worksheet`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorksheetUpdate {
    pub data: BTreeMap<String, String>,
}

impl WorksheetUpdate {
    pub fn new(data: BTreeMap<String, String>) -> Self {
        Self { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }
}

/// OAuth token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Sample responses may be bare or wrapped in `{"data": ...}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SampleEnvelope {
    Wrapped { data: QBenchSample },
    Bare(QBenchSample),
}

/// Decode a sample lookup response body.
pub fn decode_sample(body: &str) -> serde_json::Result<QBenchSample> {
    Ok(match serde_json::from_str(body)? {
        SampleEnvelope::Wrapped { data } => data,
        SampleEnvelope::Bare(sample) => sample,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Integer(u64),
    Float(f64),
    Text(String),
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawId>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| match raw {
        RawId::Integer(id) => Some(id),
        RawId::Float(id) if id >= 0.0 && id.fract() == 0.0 => Some(id as u64),
        RawId::Float(_) => None,
        RawId::Text(text) => text.trim().parse().ok(),
    }))
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Integer(id) => id.to_string(),
        RawId::Float(id) => id.to_string(),
        RawId::Text(text) => text.trim().to_string(),
    })
}

fn batch_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|value| match value {
            Value::Null => None,
            Value::String(text) => Some(text.trim().to_string()),
            Value::Object(mut object) => object.remove("id").map(|id| match id {
                Value::String(text) => text.trim().to_string(),
                other => other.to_string(),
            }),
            other => Some(other.to_string()),
        })
        .filter(|batch| !batch.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_sample_with_mixed_ids() {
        let body = json!({
            "id": 14956,
            "tests": [
                {"id": "501", "assay": {"id": 16}, "state": "NEEDS REVIEW (DATA TEAM)", "batches": [8561, "8545 "]},
                {"id": 502, "assay": {"id": "34"}, "label": "Homogeneity", "batches": [{"id": 9000}]},
                {"id": "abc", "assay": null}
            ]
        })
        .to_string();

        let sample = decode_sample(&body).unwrap();
        assert_eq!(sample.id, "14956");
        assert_eq!(sample.tests.len(), 3);
        assert_eq!(sample.tests[0].id, Some(501));
        assert_eq!(sample.tests[0].assay_id(), Some(ASSAY_ID_CN));
        assert_eq!(sample.tests[0].batches, vec!["8561", "8545"]);
        assert_eq!(sample.tests[1].assay_id(), Some(ASSAY_ID_HO));
        assert_eq!(sample.tests[1].name.as_deref(), Some("Homogeneity"));
        assert_eq!(sample.tests[1].batches, vec!["9000"]);
        assert_eq!(sample.tests[2].id, None);
        assert_eq!(sample.tests[2].assay_id(), None);
    }

    #[test]
    fn test_decode_wrapped_sample() {
        let body = r#"{"data": {"id": "14956", "tests": []}}"#;
        assert_eq!(decode_sample(body).unwrap().id, "14956");
    }

    #[test]
    fn test_worksheet_values() {
        let test: QBenchTest = serde_json::from_value(json!({
            "id": 1,
            "worksheet_data": {
                "CBD": {"value": null, "default_numeric_value": 0},
                "CBDA": "0.0%",
                "dilution": "",
                "sample_mass": {"value": "101.5"},
            }
        }))
        .unwrap();

        assert!(!test.has_worksheet_values(["CBD", "CBDA", "dilution", "THCA"]));
        assert!(test.has_worksheet_values(["CBD", "sample_mass"]));
    }

    #[test]
    fn test_worksheet_update_body() {
        let update = WorksheetUpdate::new(BTreeMap::from([(
            "CBD".to_string(),
            "1.25".to_string(),
        )]));
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"data": {"CBD": "1.25"}})
        );
    }
}
