//! End-to-end sync scenarios, exercised directly against the engine and
//! store rather than over a live HTTP listener (matching the direct
//! service-level test style used throughout this crate).

use chrono::{Duration, Utc};
use serde_json::json;

use journal_sync::clock::Clock;
use journal_sync::services::{
    apply_batch, delta_assembler, resolution_handler, store::SyncStore, sync_engine::BatchUpdate,
    ResolveRequest,
};
use journal_sync::types::{EntityType, Resolution};

fn update(client_id: &str, config: Vec<serde_json::Value>, days: serde_json::Value) -> BatchUpdate {
    BatchUpdate::from_value(json!({
        "clientId": client_id,
        "config": config,
        "days": days,
    }))
    .unwrap()
}

#[test]
fn s1_tracker_conflict_and_resolution() {
    let store = SyncStore::new_in_memory().unwrap();
    let clock = Clock::new();

    store.upsert_client("device-1", "device-1", "2026-01-01T00:00:00Z").unwrap();
    store.upsert_client("device-2", "device-2", "2026-01-01T00:00:00Z").unwrap();

    let r1 = apply_batch(
        &store,
        &clock,
        update("device-1", vec![json!({"id": "t", "name": "Original", "type": "simple", "_baseVersion": 0})], json!({})),
    )
    .unwrap();
    assert_eq!(r1.applied_config[0].version, 1);

    let r2 = apply_batch(
        &store,
        &clock,
        update("device-1", vec![json!({"id": "t", "name": "D1", "type": "simple", "_baseVersion": 1})], json!({})),
    )
    .unwrap();
    assert_eq!(r2.applied_config[0].version, 2);

    let r3 = apply_batch(
        &store,
        &clock,
        update("device-2", vec![json!({"id": "t", "name": "D2", "type": "simple", "_baseVersion": 1})], json!({})),
    )
    .unwrap();
    assert!(!r3.success);
    assert_eq!(r3.conflicts.len(), 1);
    assert_eq!(r3.conflicts[0].entity_type, EntityType::Tracker);
    assert_eq!(r3.conflicts[0].server_version, 2);
    assert_eq!(r3.conflicts[0].client_base_version, 1);
    assert_eq!(r3.conflicts[0].server_data["name"], "D1");

    resolution_handler::resolve(
        &store,
        &clock,
        ResolveRequest {
            entity_type: EntityType::Tracker,
            entity_id: "t".into(),
            resolution: Resolution::Client,
            client_id: "device-2".into(),
            payload: Some(json!({"name": "D2", "type": "simple"})),
        },
    )
    .unwrap();

    let snapshot = delta_assembler::full_snapshot(&store, &clock).unwrap();
    let config = snapshot["config"].as_array().unwrap();
    let tracker = config.iter().find(|t| t["id"] == "t").unwrap();
    assert_eq!(tracker["name"], "D2");
    assert_eq!(tracker["_version"], 3);
}

#[test]
fn s2_partial_success_batch() {
    let store = SyncStore::new_in_memory().unwrap();
    let clock = Clock::new();

    apply_batch(
        &store,
        &clock,
        update(
            "device-1",
            vec![
                json!({"id": "t1", "name": "One", "type": "simple", "_baseVersion": 0}),
                json!({"id": "t2", "name": "Two", "type": "simple", "_baseVersion": 0}),
            ],
            json!({}),
        ),
    )
    .unwrap();

    apply_batch(
        &store,
        &clock,
        update("device-1", vec![json!({"id": "t1", "name": "One-v2", "type": "simple", "_baseVersion": 1})], json!({})),
    )
    .unwrap();

    let result = apply_batch(
        &store,
        &clock,
        update(
            "device-1",
            vec![
                json!({"id": "t1", "name": "Stale", "type": "simple", "_baseVersion": 1}),
                json!({"id": "t2", "name": "Two-v2", "type": "simple", "_baseVersion": 1}),
            ],
            json!({}),
        ),
    )
    .unwrap();

    assert!(!result.success);
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].entity_id, "t1");
    assert_eq!(result.applied_config.len(), 1);
    assert_eq!(result.applied_config[0].id, "t2");
    assert_eq!(result.applied_config[0].version, 2);
}

#[test]
fn s3_seven_day_window() {
    let store = SyncStore::new_in_memory().unwrap();
    let clock = Clock::new();

    apply_batch(
        &store,
        &clock,
        update("device-1", vec![json!({"id": "t", "name": "Water", "type": "simple", "_baseVersion": 0})], json!({})),
    )
    .unwrap();

    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let old_date = (Utc::now().date_naive() - Duration::days(10)).format("%Y-%m-%d").to_string();

    apply_batch(
        &store,
        &clock,
        update(
            "device-1",
            vec![],
            json!({
                today.clone(): {"t": {"value": 1, "completed": true, "_baseVersion": 0}},
                old_date: {"t": {"value": 2, "completed": true, "_baseVersion": 0}},
            }),
        ),
    )
    .unwrap();

    let full = delta_assembler::full_snapshot(&store, &clock).unwrap();
    let days = full["days"].as_object().unwrap();
    assert_eq!(days.len(), 1);
    assert!(days.contains_key(&today));

    let one_hour_ago = (Utc::now() - Duration::hours(1)).format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let delta = delta_assembler::delta_snapshot(&store, &clock, &one_hour_ago).unwrap();
    let delta_days = delta["days"].as_object().unwrap();
    assert_eq!(delta_days.len(), 1);
    assert!(delta_days.contains_key(&today));
}

#[test]
fn s4_soft_delete_tombstones() {
    let store = SyncStore::new_in_memory().unwrap();
    let clock = Clock::new();

    apply_batch(
        &store,
        &clock,
        update("device-1", vec![json!({"id": "t", "name": "Water", "type": "simple", "_baseVersion": 0})], json!({})),
    )
    .unwrap();
    apply_batch(
        &store,
        &clock,
        update("device-1", vec![json!({"id": "t", "name": "Water", "type": "simple", "_deleted": true, "_baseVersion": 1})], json!({})),
    )
    .unwrap();

    let full = delta_assembler::full_snapshot(&store, &clock).unwrap();
    assert!(full["config"].as_array().unwrap().is_empty());

    let one_hour_ago = (Utc::now() - Duration::hours(1)).format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let delta = delta_assembler::delta_snapshot(&store, &clock, &one_hour_ago).unwrap();
    let deleted = delta["deletedTrackers"].as_array().unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0], "t");
}

#[test]
fn s5_idempotent_registration() {
    let store = SyncStore::new_in_memory().unwrap();

    store.upsert_client("abcd1234-xyz", "abcd1234", "2026-01-01T00:00:00Z").unwrap();
    store.upsert_client("abcd1234-xyz", "abcd1234", "2026-01-02T00:00:00Z").unwrap();

    let client = store.get_client("abcd1234-xyz").unwrap().unwrap();
    assert_eq!(client.name, "abcd1234");
    assert_eq!(client.first_seen_at, "2026-01-01T00:00:00Z");
    assert_eq!(client.last_seen_at, "2026-01-02T00:00:00Z");
}

#[test]
fn s6_metadata_preservation() {
    let store = SyncStore::new_in_memory().unwrap();
    let clock = Clock::new();

    apply_batch(
        &store,
        &clock,
        update(
            "device-1",
            vec![json!({
                "id": "t", "name": "Water", "type": "quantifiable",
                "unit": "glasses", "goal": 8, "customField": "x", "_baseVersion": 0
            })],
            json!({}),
        ),
    )
    .unwrap();

    apply_batch(
        &store,
        &clock,
        update(
            "device-1",
            vec![json!({
                "id": "t", "name": "Water2", "type": "quantifiable",
                "unit": "glasses", "goal": 8, "customField": "x", "_baseVersion": 1
            })],
            json!({}),
        ),
    )
    .unwrap();

    let tracker = store.get_tracker("t").unwrap().unwrap();
    assert_eq!(tracker.name, "Water2");
    assert_eq!(tracker.metadata.get("unit").unwrap(), "glasses");
    assert_eq!(tracker.metadata.get("goal").unwrap(), 8);
    assert_eq!(tracker.metadata.get("customField").unwrap(), "x");
}
