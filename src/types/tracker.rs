//! Tracker: a client-defined definition of something that can be tracked.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::versioned::{
    strip_reserved_keys, KEY_BASE_VERSION, KEY_DELETED, KEY_LAST_MODIFIED_AT,
    KEY_LAST_MODIFIED_BY, KEY_VERSION,
};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerType {
    Simple,
    Quantifiable,
}

impl TrackerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerType::Simple => "simple",
            TrackerType::Quantifiable => "quantifiable",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "simple" => Ok(TrackerType::Simple),
            "quantifiable" => Ok(TrackerType::Quantifiable),
            other => Err(AppError::Validation(format!(
                "unknown tracker type: {other}"
            ))),
        }
    }
}

/// A tracker as submitted by a client, before conflict arbitration.
///
/// `metadata` holds every key the client sent beyond the known fields and
/// the reserved `_`-prefixed keys; it is preserved verbatim on round-trip.
/// `base_version` and `is_delete` carry the client's `_baseVersion`/
/// `_deleted` intent straight through to `conflict_detector::decide`.
#[derive(Debug, Clone)]
pub struct IncomingTracker {
    pub id: String,
    pub name: String,
    pub category: String,
    pub tracker_type: TrackerType,
    pub metadata: Map<String, Value>,
    pub base_version: i64,
    pub is_delete: bool,
}

impl IncomingTracker {
    /// Parses a single tracker object from a client's `config` array.
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        let Value::Object(mut object) = value else {
            return Err(AppError::Validation("tracker must be a JSON object".into()));
        };

        let id = take_string(&mut object, "id")?;
        let name = take_string_or_default(&mut object, "name");
        let category = object
            .remove("category")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let tracker_type = match object.remove("type") {
            Some(Value::String(s)) => TrackerType::parse(&s)?,
            Some(_) => return Err(AppError::Validation("tracker type must be a string".into())),
            None => TrackerType::Simple,
        };

        let base_version = object
            .remove(KEY_BASE_VERSION)
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        let is_delete = object
            .remove(KEY_DELETED)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        object.remove(KEY_VERSION);
        object.remove(KEY_LAST_MODIFIED_BY);
        object.remove(KEY_LAST_MODIFIED_AT);
        object.remove("id");
        object.remove("name");
        let metadata = strip_reserved_keys(object);

        Ok(Self {
            id,
            name,
            category,
            tracker_type,
            metadata,
            base_version,
            is_delete,
        })
    }
}

/// A tracker as stored and served by the engine: fully versioned.
#[derive(Debug, Clone)]
pub struct Tracker {
    pub id: String,
    pub name: String,
    pub category: String,
    pub tracker_type: TrackerType,
    pub metadata: Map<String, Value>,
    pub version: i64,
    pub last_modified_by: String,
    pub last_modified_at: String,
    pub deleted: bool,
}

impl Tracker {
    /// Rehydrates a tracker into the wire shape: known fields and metadata
    /// merged at the top level, reserved keys re-synthesized.
    pub fn to_response_json(&self) -> Value {
        let mut object = self.metadata.clone();
        object.insert("id".into(), Value::String(self.id.clone()));
        object.insert("name".into(), Value::String(self.name.clone()));
        object.insert("category".into(), Value::String(self.category.clone()));
        object.insert(
            "type".into(),
            Value::String(self.tracker_type.as_str().to_string()),
        );
        object.insert(KEY_VERSION.into(), Value::from(self.version));
        object.insert(
            KEY_LAST_MODIFIED_BY.into(),
            Value::String(self.last_modified_by.clone()),
        );
        object.insert(
            KEY_LAST_MODIFIED_AT.into(),
            Value::String(self.last_modified_at.clone()),
        );
        object.insert(KEY_DELETED.into(), Value::Bool(self.deleted));
        Value::Object(object)
    }
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> Result<String, AppError> {
    match object.get(key).and_then(|v| v.as_str()) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(AppError::Validation(format!("missing required field: {key}"))),
    }
}

fn take_string_or_default(object: &mut Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_tracker() {
        let v = json!({"id": "t1", "name": "Water", "type": "simple", "_baseVersion": 0});
        let tracker = IncomingTracker::from_value(v).unwrap();
        assert_eq!(tracker.id, "t1");
        assert_eq!(tracker.name, "Water");
        assert_eq!(tracker.tracker_type, TrackerType::Simple);
        assert_eq!(tracker.base_version, 0);
        assert!(!tracker.is_delete);
    }

    #[test]
    fn test_metadata_preserved() {
        let v = json!({
            "id": "t1", "name": "Water", "category": "health", "type": "quantifiable",
            "unit": "glasses", "goal": 8, "customField": "x", "_baseVersion": 0
        });
        let tracker = IncomingTracker::from_value(v).unwrap();
        assert_eq!(tracker.metadata.get("unit").unwrap(), "glasses");
        assert_eq!(tracker.metadata.get("goal").unwrap(), 8);
        assert_eq!(tracker.metadata.get("customField").unwrap(), "x");
        assert!(!tracker.metadata.contains_key("name"));
        assert!(!tracker.metadata.contains_key("category"));
        assert!(!tracker.metadata.contains_key("id"));
    }

    #[test]
    fn test_missing_id_rejected() {
        let v = json!({"name": "Water", "type": "simple"});
        assert!(IncomingTracker::from_value(v).is_err());
    }

    #[test]
    fn test_response_json_round_trips_metadata() {
        let mut metadata = Map::new();
        metadata.insert("unit".into(), json!("glasses"));
        let tracker = Tracker {
            id: "t1".into(),
            name: "Water".into(),
            category: "health".into(),
            tracker_type: TrackerType::Quantifiable,
            metadata,
            version: 1,
            last_modified_by: "device-1".into(),
            last_modified_at: "2026-01-01T00:00:00Z".into(),
            deleted: false,
        };
        let json = tracker.to_response_json();
        assert_eq!(json["unit"], "glasses");
        assert_eq!(json["_version"], 1);
        assert_eq!(json["_lastModifiedBy"], "device-1");
    }
}
