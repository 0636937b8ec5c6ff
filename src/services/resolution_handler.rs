//! Force-applies an operator-chosen resolution to a single entity (§4.8).

use serde_json::Value;

use crate::clock::Clock;
use crate::error::AppError;
use crate::types::{entity_id, ConflictRecord, EntityType, Entry, IncomingEntry, IncomingTracker, Resolution, Tracker};

use super::store::SyncStore;

pub struct ResolveRequest {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub resolution: Resolution,
    pub client_id: String,
    pub payload: Option<Value>,
}

/// Bypasses the conflict detector entirely: `client` overwrites and bumps
/// version, `server` leaves state untouched. Both log a `ConflictRecord`.
pub fn resolve(store: &SyncStore, clock: &Clock, req: ResolveRequest) -> Result<(), AppError> {
    let now = clock.now();

    match req.entity_type {
        EntityType::Tracker => resolve_tracker(store, &req, &now)?,
        EntityType::Entry => resolve_entry(store, &req, &now)?,
    }

    store.append_conflict_record(&ConflictRecord {
        entity_type: req.entity_type,
        entity_id: req.entity_id,
        resolution: req.resolution,
        client_id: req.client_id,
        resolved_at: now,
    })?;

    Ok(())
}

fn resolve_tracker(store: &SyncStore, req: &ResolveRequest, now: &str) -> Result<(), AppError> {
    let existing = store
        .get_tracker(&req.entity_id)?
        .ok_or_else(|| AppError::NotFound(format!("tracker not found: {}", req.entity_id)))?;

    if req.resolution == Resolution::Server {
        return Ok(());
    }

    let mut payload = req
        .payload
        .clone()
        .ok_or_else(|| AppError::Validation("client resolution requires a payload".into()))?;
    if let Value::Object(ref mut object) = payload {
        object
            .entry("id")
            .or_insert_with(|| Value::String(existing.id.clone()));
    }
    let incoming = IncomingTracker::from_value(payload)?;

    let tracker = Tracker {
        id: existing.id,
        name: incoming.name,
        category: incoming.category,
        tracker_type: incoming.tracker_type,
        metadata: incoming.metadata,
        version: existing.version + 1,
        last_modified_by: req.client_id.clone(),
        last_modified_at: now.to_string(),
        deleted: incoming.is_delete,
    };
    store.put_tracker(&tracker)?;
    Ok(())
}

fn resolve_entry(store: &SyncStore, req: &ResolveRequest, now: &str) -> Result<(), AppError> {
    let (date, tracker_id) = entity_id::split_entry_entity_id(&req.entity_id)?;
    let existing = store
        .get_entry(&date, &tracker_id)?
        .ok_or_else(|| AppError::NotFound(format!("entry not found: {}", req.entity_id)))?;

    if req.resolution == Resolution::Server {
        return Ok(());
    }

    let payload = req
        .payload
        .clone()
        .ok_or_else(|| AppError::Validation("client resolution requires a payload".into()))?;
    let incoming = IncomingEntry::from_value(date.clone(), tracker_id.clone(), payload)?;

    let entry = Entry {
        date,
        tracker_id,
        value: incoming.value,
        completed: incoming.completed,
        version: existing.version + 1,
        last_modified_by: req.client_id.clone(),
        last_modified_at: now.to_string(),
    };
    store.put_entry(&entry)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sync_engine::{apply_batch, BatchUpdate};
    use serde_json::json;

    fn seed_tracker(store: &SyncStore, clock: &Clock) {
        let batch = BatchUpdate::from_value(json!({
            "clientId": "device-1",
            "config": [{"id": "t", "name": "Original", "type": "simple", "_baseVersion": 0}],
            "days": {},
        }))
        .unwrap();
        apply_batch(store, clock, batch).unwrap();
    }

    #[test]
    fn test_client_resolution_bumps_version_and_overwrites() {
        let store = SyncStore::new_in_memory().unwrap();
        let clock = Clock::new();
        seed_tracker(&store, &clock);

        resolve(
            &store,
            &clock,
            ResolveRequest {
                entity_type: EntityType::Tracker,
                entity_id: "t".into(),
                resolution: Resolution::Client,
                client_id: "device-2".into(),
                payload: Some(json!({"id": "t", "name": "D2", "type": "simple"})),
            },
        )
        .unwrap();

        let tracker = store.get_tracker("t").unwrap().unwrap();
        assert_eq!(tracker.version, 2);
        assert_eq!(tracker.name, "D2");
        assert_eq!(tracker.last_modified_by, "device-2");
    }

    #[test]
    fn test_server_resolution_is_a_noop_besides_logging() {
        let store = SyncStore::new_in_memory().unwrap();
        let clock = Clock::new();
        seed_tracker(&store, &clock);

        resolve(
            &store,
            &clock,
            ResolveRequest {
                entity_type: EntityType::Tracker,
                entity_id: "t".into(),
                resolution: Resolution::Server,
                client_id: "device-2".into(),
                payload: None,
            },
        )
        .unwrap();

        let tracker = store.get_tracker("t").unwrap().unwrap();
        assert_eq!(tracker.version, 1);
        assert_eq!(tracker.name, "Original");
    }

    #[test]
    fn test_unknown_entity_fails() {
        let store = SyncStore::new_in_memory().unwrap();
        let clock = Clock::new();

        let result = resolve(
            &store,
            &clock,
            ResolveRequest {
                entity_type: EntityType::Tracker,
                entity_id: "nope".into(),
                resolution: Resolution::Server,
                client_id: "device-1".into(),
                payload: None,
            },
        );
        assert!(result.is_err());
    }
}
