//! Applies one batched update from a client (§4.5).

use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::error::AppError;
use crate::types::{ConflictDescriptor, Entry, EntityType, IncomingEntry, IncomingTracker, Tracker};

use super::conflict_detector::{self, Decision};
use super::store::SyncStore;

/// One client's batched update, as parsed from the `update` request body.
pub struct BatchUpdate {
    pub client_id: String,
    pub config: Vec<IncomingTracker>,
    pub days: Vec<IncomingEntry>,
}

impl BatchUpdate {
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        let Value::Object(mut object) = value else {
            return Err(AppError::Validation("update body must be a JSON object".into()));
        };

        let client_id = object
            .remove("clientId")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| AppError::Validation("missing required field: clientId".into()))?;

        let config = match object.remove("config") {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(IncomingTracker::from_value)
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(AppError::Validation("config must be an array".into())),
            None => Vec::new(),
        };

        let mut days = Vec::new();
        if let Some(Value::Object(day_map)) = object.remove("days") {
            for (date, trackers) in day_map {
                let Value::Object(tracker_map) = trackers else {
                    return Err(AppError::Validation(format!("days.{date} must be an object")));
                };
                for (tracker_id, entry_value) in tracker_map {
                    days.push(IncomingEntry::from_value(date.clone(), tracker_id, entry_value)?);
                }
            }
        }

        Ok(Self { client_id, config, days })
    }
}

pub struct UpdateResult {
    pub success: bool,
    pub conflicts: Vec<ConflictDescriptor>,
    pub applied_config: Vec<Tracker>,
    pub applied_days: Vec<Entry>,
    pub last_modified: Option<String>,
}

pub fn apply_batch(store: &SyncStore, clock: &Clock, batch: BatchUpdate) -> Result<UpdateResult, AppError> {
    let mut conflicts = Vec::new();
    let mut applied_config = Vec::new();
    let mut applied_days = Vec::new();
    let mut any_write = false;
    let now = clock.now();

    for incoming in batch.config {
        let existing = store.get_tracker(&incoming.id)?;
        let server_state = existing.as_ref().map(|t| (t.version, t.deleted));
        let decision = conflict_detector::decide(server_state, incoming.base_version, incoming.is_delete);

        match decision {
            Decision::Insert => {
                let tracker = Tracker {
                    id: incoming.id.clone(),
                    name: incoming.name,
                    category: incoming.category,
                    tracker_type: incoming.tracker_type,
                    metadata: incoming.metadata,
                    version: 1,
                    last_modified_by: batch.client_id.clone(),
                    last_modified_at: now.clone(),
                    deleted: incoming.is_delete,
                };
                store.put_tracker(&tracker)?;
                any_write = true;
                applied_config.push(tracker);
            }
            Decision::Apply { new_version, resurrect: _ } => {
                let tracker = Tracker {
                    id: incoming.id.clone(),
                    name: incoming.name,
                    category: incoming.category,
                    tracker_type: incoming.tracker_type,
                    metadata: incoming.metadata,
                    version: new_version,
                    last_modified_by: batch.client_id.clone(),
                    last_modified_at: now.clone(),
                    deleted: incoming.is_delete,
                };
                store.put_tracker(&tracker)?;
                any_write = true;
                applied_config.push(tracker);
            }
            Decision::Conflict => {
                let server = existing.expect("conflict implies a server record exists");
                conflicts.push(ConflictDescriptor {
                    entity_type: EntityType::Tracker,
                    entity_id: incoming.id,
                    server_version: server.version,
                    client_base_version: incoming.base_version,
                    server_data: server.to_response_json(),
                });
            }
            Decision::NoOp => {
                // Idempotent tombstone delete: nothing to report as applied
                // or conflicting.
            }
        }
    }

    for incoming in batch.days {
        let existing = store.get_entry(&incoming.date, &incoming.tracker_id)?;
        let server_state = existing.as_ref().map(|e| (e.version, false));
        let decision = conflict_detector::decide(server_state, incoming.base_version, false);

        match decision {
            Decision::Insert | Decision::Apply { .. } => {
                let new_version = match decision {
                    Decision::Insert => 1,
                    Decision::Apply { new_version, .. } => new_version,
                    _ => unreachable!(),
                };
                let entry = Entry {
                    date: incoming.date.clone(),
                    tracker_id: incoming.tracker_id.clone(),
                    value: incoming.value,
                    completed: incoming.completed,
                    version: new_version,
                    last_modified_by: batch.client_id.clone(),
                    last_modified_at: now.clone(),
                };
                store.put_entry(&entry)?;
                any_write = true;
                applied_days.push(entry);
            }
            Decision::Conflict => {
                let server = existing.expect("conflict implies a server record exists");
                conflicts.push(ConflictDescriptor {
                    entity_type: EntityType::Entry,
                    entity_id: crate::types::entity_id::join_entry_entity_id(&incoming.date, &incoming.tracker_id),
                    server_version: server.version,
                    client_base_version: incoming.base_version,
                    server_data: server.to_response_json(),
                });
            }
            Decision::NoOp => {}
        }
    }

    if any_write {
        store.set_sync_metadata(&now)?;
    }

    let success = conflicts.is_empty();
    Ok(UpdateResult {
        success,
        conflicts,
        applied_config,
        applied_days,
        last_modified: if success { Some(now) } else { None },
    })
}

/// Groups applied entries back into the `{date -> {trackerId -> entry}}`
/// response shape.
pub fn group_entries_by_day(entries: &[Entry]) -> Map<String, Value> {
    let mut days: Map<String, Value> = Map::new();
    for entry in entries {
        let day = days
            .entry(entry.date.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = day {
            map.insert(entry.tracker_id.clone(), entry.to_response_json());
        }
    }
    days
}
