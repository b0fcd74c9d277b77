//! Extraction of flat feature/target rows from raw incident documents.
//!
//! Every field listed in [`REQUIRED_FIELDS`] must be present with the
//! right type. There is no default and no per-document skip: the first bad
//! document aborts extraction for the whole corpus.

use chrono::NaiveDateTime;
use incident_predict_incident_models::{StatusTimes, is_mass_casualty};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Dotted path of the operational region.
pub const FIELD_REGION: &str = "operational_region";
/// Dotted path of the occurrence timestamp.
pub const FIELD_OCCURRED_AT: &str = "occurred_at";
/// Dotted path of the initial report text.
pub const FIELD_REPORT: &str = "nature.initial_report";
/// Dotted path of the incident group label.
pub const FIELD_GROUP: &str = "nature.group";
/// Dotted path of the casualty count.
pub const FIELD_CASUALTIES: &str = "mass_casualty.casualties";
/// Dotted path of the call receipt timestamp.
pub const FIELD_RECEIPT: &str = "status_times.h1_receipt";
/// Dotted path of the on-scene arrival timestamp.
pub const FIELD_ARRIVAL: &str = "status_times.h4_arrival";

/// Every field extraction reads.
pub const REQUIRED_FIELDS: &[&str] = &[
    FIELD_REGION,
    FIELD_OCCURRED_AT,
    FIELD_REPORT,
    FIELD_GROUP,
    FIELD_CASUALTIES,
    FIELD_RECEIPT,
    FIELD_ARRIVAL,
];

/// Errors raised while extracting a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// A required field is absent or null.
    #[error("document {index}: missing field '{field}'")]
    MissingField {
        /// 0-based position of the document in the corpus.
        index: usize,
        /// Dotted field path.
        field: &'static str,
    },

    /// A required field holds a value of the wrong type.
    #[error("document {index}: field '{field}' is not {expected}")]
    WrongType {
        /// 0-based position of the document in the corpus.
        index: usize,
        /// Dotted field path.
        field: &'static str,
        /// Description of the expected type.
        expected: &'static str,
    },

    /// A timestamp field could not be parsed.
    #[error("document {index}: malformed timestamp '{value}' in '{field}'")]
    MalformedTimestamp {
        /// 0-based position of the document in the corpus.
        index: usize,
        /// Dotted field path.
        field: &'static str,
        /// The raw value.
        value: String,
    },
}

/// One incident flattened into raw features and derived targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRow {
    /// Operational region (not yet encoded).
    pub region: String,
    /// When the incident occurred.
    pub occurred_at: NaiveDateTime,
    /// Initial report text (not yet encoded).
    pub report_text: String,
    /// Incident group label (classification target).
    pub group_label: String,
    /// Casualty count (regression target).
    pub casualty_count: u32,
    /// Minutes from receipt to arrival (regression target). Not clamped:
    /// out-of-order timestamps produce a negative value.
    pub response_minutes: f64,
    /// 1 when `casualty_count` meets the mass-casualty threshold.
    pub mass_flag: u8,
}

/// Looks up a dotted path in a JSON object, treating `null` as absent.
fn lookup<'a>(doc: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    (!current.is_null()).then_some(current)
}

fn required<'a>(
    doc: &'a Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<&'a Value, ExtractionError> {
    lookup(doc, field).ok_or(ExtractionError::MissingField { index, field })
}

fn string_field(
    doc: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<String, ExtractionError> {
    required(doc, index, field)?
        .as_str()
        .map(str::to_string)
        .ok_or(ExtractionError::WrongType {
            index,
            field,
            expected: "a string",
        })
}

fn count_field(
    doc: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<u32, ExtractionError> {
    required(doc, index, field)?
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(ExtractionError::WrongType {
            index,
            field,
            expected: "a non-negative integer",
        })
}

/// Parses a naive timestamp (ISO 8601 with optional fractional seconds, or
/// space-separated).
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    None
}

fn timestamp_field(
    doc: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<NaiveDateTime, ExtractionError> {
    let raw = required(doc, index, field)?
        .as_str()
        .ok_or(ExtractionError::WrongType {
            index,
            field,
            expected: "a timestamp string",
        })?;
    parse_timestamp(raw).ok_or_else(|| ExtractionError::MalformedTimestamp {
        index,
        field,
        value: raw.to_string(),
    })
}

/// Extracts a single document. `index` is only used for error reporting.
///
/// # Errors
///
/// Returns [`ExtractionError`] if any required field is missing, has the
/// wrong type, or holds a malformed timestamp.
pub fn extract_row(doc: &Map<String, Value>, index: usize) -> Result<ExtractedRow, ExtractionError> {
    let region = string_field(doc, index, FIELD_REGION)?;
    let occurred_at = timestamp_field(doc, index, FIELD_OCCURRED_AT)?;
    let report_text = string_field(doc, index, FIELD_REPORT)?;
    let group_label = string_field(doc, index, FIELD_GROUP)?;
    let casualty_count = count_field(doc, index, FIELD_CASUALTIES)?;

    let status_times = StatusTimes {
        h1_receipt: timestamp_field(doc, index, FIELD_RECEIPT)?,
        h4_arrival: timestamp_field(doc, index, FIELD_ARRIVAL)?,
    };

    Ok(ExtractedRow {
        region,
        occurred_at,
        report_text,
        group_label,
        casualty_count,
        response_minutes: status_times.response_minutes(),
        mass_flag: u8::from(is_mass_casualty(casualty_count)),
    })
}

/// Extracts every document in the corpus, in order.
///
/// # Errors
///
/// Returns the first [`ExtractionError`] encountered; no partial result is
/// returned.
pub fn extract_all(docs: &[Map<String, Value>]) -> Result<Vec<ExtractedRow>, ExtractionError> {
    let rows = docs
        .iter()
        .enumerate()
        .map(|(index, doc)| extract_row(doc, index))
        .collect::<Result<Vec<_>, _>>()?;

    let negative = rows.iter().filter(|r| r.response_minutes < 0.0).count();
    if negative > 0 {
        log::warn!("{negative} documents have arrival before receipt (negative response time)");
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn sample(casualties: u64) -> Map<String, Value> {
        doc(json!({
            "notice_number": "AV-00000001",
            "occurred_at": "2024-03-05T14:05:00",
            "operational_region": "SERTAO",
            "nature": { "initial_report": "Vegetation fire", "group": "FIRE" },
            "status_times": {
                "h1_receipt": "2024-03-05T14:05:00",
                "h4_arrival": "2024-03-05T14:12:00"
            },
            "mass_casualty": { "level": 0, "casualties": casualties }
        }))
    }

    #[test]
    fn extracts_features_and_targets() {
        let row = extract_row(&sample(2), 0).unwrap();

        assert_eq!(row.region, "SERTAO");
        assert_eq!(row.report_text, "Vegetation fire");
        assert_eq!(row.group_label, "FIRE");
        assert_eq!(row.casualty_count, 2);
        assert_eq!(row.mass_flag, 0);
    }

    #[test]
    fn seven_minute_response_is_exactly_seven() {
        let row = extract_row(&sample(0), 0).unwrap();
        assert_eq!(row.response_minutes, 7.0);
    }

    #[test]
    fn fractional_minutes_are_kept() {
        let mut d = sample(0);
        d["status_times"]["h4_arrival"] = json!("2024-03-05T14:05:30");
        let row = extract_row(&d, 0).unwrap();
        assert!((row.response_minutes - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_order_timestamps_give_negative_minutes() {
        let mut d = sample(0);
        d["status_times"]["h4_arrival"] = json!("2024-03-05T14:00:00");
        let row = extract_row(&d, 0).unwrap();
        assert_eq!(row.response_minutes, -5.0);
    }

    #[test]
    fn mass_flag_iff_at_least_five_casualties() {
        for casualties in 0..12 {
            let row = extract_row(&sample(casualties), 0).unwrap();
            assert_eq!(row.mass_flag == 1, casualties >= 5, "casualties = {casualties}");
        }
    }

    #[test]
    fn accepts_space_separated_and_fractional_timestamps() {
        assert!(parse_timestamp("2024-03-05 14:05:00").is_some());
        assert!(parse_timestamp("2024-03-05T14:05:00.123").is_some());
        assert!(parse_timestamp("05/03/2024 14:05").is_none());
    }

    #[test]
    fn missing_nested_field_is_fatal() {
        let mut d = sample(0);
        d["nature"].as_object_mut().unwrap().remove("group");

        let err = extract_row(&d, 4).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MissingField {
                index: 4,
                field: FIELD_GROUP
            }
        );
    }

    #[test]
    fn missing_region_is_fatal() {
        let mut d = sample(0);
        d.remove("operational_region");
        assert!(matches!(
            extract_row(&d, 0),
            Err(ExtractionError::MissingField {
                field: FIELD_REGION,
                ..
            })
        ));
    }

    #[test]
    fn null_counts_as_missing() {
        let mut d = sample(0);
        d["mass_casualty"]["casualties"] = Value::Null;
        assert!(matches!(
            extract_row(&d, 0),
            Err(ExtractionError::MissingField { .. })
        ));
    }

    #[test]
    fn negative_casualties_are_wrong_type() {
        let mut d = sample(0);
        d["mass_casualty"]["casualties"] = json!(-1);
        assert!(matches!(
            extract_row(&d, 0),
            Err(ExtractionError::WrongType {
                field: FIELD_CASUALTIES,
                ..
            })
        ));
    }

    #[test]
    fn malformed_timestamp_is_fatal() {
        let mut d = sample(0);
        d["status_times"]["h1_receipt"] = json!("yesterday");
        assert!(matches!(
            extract_row(&d, 0),
            Err(ExtractionError::MalformedTimestamp {
                field: FIELD_RECEIPT,
                ..
            })
        ));
    }

    #[test]
    fn extract_all_aborts_on_first_bad_document() {
        let mut bad = sample(0);
        bad.remove("occurred_at");
        let docs = vec![sample(0), bad, sample(1)];

        let err = extract_all(&docs).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MissingField {
                index: 1,
                field: FIELD_OCCURRED_AT
            }
        );
    }

    #[test]
    fn extraction_is_deterministic() {
        let docs = vec![sample(0), sample(3), sample(6)];
        assert_eq!(extract_all(&docs).unwrap(), extract_all(&docs).unwrap());
    }
}
