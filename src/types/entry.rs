//! Entry: one day's record against one tracker.

use serde_json::Value;

use super::versioned::{KEY_BASE_VERSION, KEY_LAST_MODIFIED_AT, KEY_LAST_MODIFIED_BY, KEY_VERSION};
use crate::error::AppError;

/// An entry as submitted by a client, keyed by `(date, trackerId)` at the
/// call site (the batch's `days` map carries the identity). `base_version`
/// carries the client's `_baseVersion` intent; entries never soft-delete.
#[derive(Debug, Clone)]
pub struct IncomingEntry {
    pub date: String,
    pub tracker_id: String,
    pub value: Option<f64>,
    pub completed: Option<bool>,
    pub base_version: i64,
}

impl IncomingEntry {
    pub fn from_value(date: String, tracker_id: String, value: Value) -> Result<Self, AppError> {
        let Value::Object(object) = value else {
            return Err(AppError::Validation("entry must be a JSON object".into()));
        };

        let value_field = object.get("value").and_then(number_or_null);
        let completed = object.get("completed").and_then(|v| v.as_bool());
        let base_version = object
            .get(KEY_BASE_VERSION)
            .and_then(|v| v.as_i64())
            .unwrap_or(0);

        if !is_valid_date(&date) {
            return Err(AppError::Validation(format!("malformed date: {date}")));
        }

        Ok(Self {
            date,
            tracker_id,
            value: value_field,
            completed,
            base_version,
        })
    }
}

fn number_or_null(v: &Value) -> Option<f64> {
    if v.is_null() {
        None
    } else {
        v.as_f64()
    }
}

/// Validates `YYYY-MM-DD` shape without pulling in a date-parsing crate for
/// just this check.
pub fn is_valid_date(date: &str) -> bool {
    let bytes = date.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[8..10].iter().all(u8::is_ascii_digit)
}

/// An entry as stored and served by the engine.
#[derive(Debug, Clone)]
pub struct Entry {
    pub date: String,
    pub tracker_id: String,
    pub value: Option<f64>,
    pub completed: Option<bool>,
    pub version: i64,
    pub last_modified_by: String,
    pub last_modified_at: String,
}

impl Entry {
    pub fn to_response_json(&self) -> Value {
        serde_json::json!({
            "value": self.value,
            "completed": self.completed,
            KEY_VERSION: self.version,
            KEY_LAST_MODIFIED_BY: self.last_modified_by,
            KEY_LAST_MODIFIED_AT: self.last_modified_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_entry() {
        let entry = IncomingEntry::from_value(
            "2026-07-20".into(),
            "t1".into(),
            json!({"value": 5, "completed": false, "_baseVersion": 0}),
        )
        .unwrap();
        assert_eq!(entry.value, Some(5.0));
        assert_eq!(entry.completed, Some(false));
        assert_eq!(entry.base_version, 0);
    }

    #[test]
    fn test_malformed_date_rejected() {
        let result = IncomingEntry::from_value(
            "not-a-date".into(),
            "t1".into(),
            json!({"value": 1}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_is_valid_date() {
        assert!(is_valid_date("2026-07-20"));
        assert!(!is_valid_date("2026-7-20"));
        assert!(!is_valid_date("20260720"));
    }

    #[test]
    fn test_null_value_preserved_as_none() {
        let entry = IncomingEntry::from_value(
            "2026-07-20".into(),
            "t1".into(),
            json!({"value": null}),
        )
        .unwrap();
        assert_eq!(entry.value, None);
    }
}
