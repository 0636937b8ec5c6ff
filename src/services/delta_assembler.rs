//! Builds full and incremental snapshot responses (§4.7).

use serde_json::Value;

use crate::clock::Clock;
use crate::error::AppError;

use super::store::SyncStore;
use super::sync_engine::group_entries_by_day;
use super::window_policy;

pub fn full_snapshot(store: &SyncStore, clock: &Clock) -> Result<Value, AppError> {
    let lower_bound = window_policy::entry_lower_bound();
    let trackers = store.list_trackers(false, None)?;
    let entries = store.list_entries(&lower_bound, None)?;

    let config: Vec<Value> = trackers.iter().map(|t| t.to_response_json()).collect();
    let days = group_entries_by_day(&entries);

    Ok(serde_json::json!({
        "config": config,
        "days": Value::Object(days),
        "serverTime": clock.now(),
    }))
}

pub fn delta_snapshot(store: &SyncStore, clock: &Clock, since: &str) -> Result<Value, AppError> {
    let lower_bound = window_policy::entry_lower_bound();
    let trackers = store.list_trackers(false, Some(since))?;
    let entries = store.list_entries(&lower_bound, Some(since))?;
    let deleted_ids = store.list_deleted_tracker_ids_since(since)?;

    let config: Vec<Value> = trackers.iter().map(|t| t.to_response_json()).collect();
    let days = group_entries_by_day(&entries);

    Ok(serde_json::json!({
        "config": config,
        "days": Value::Object(days),
        "deletedTrackers": deleted_ids,
        "serverTime": clock.now(),
    }))
}
