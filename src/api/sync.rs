//! Sync API endpoints: registration, status, full/delta reads, batched
//! update, conflict resolution.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::AppError;
use crate::services::{self, delta_assembler, resolution_handler, sync_engine, ResolveRequest};
use crate::types::{client, EntityType, Resolution};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/status", get(status))
        .route("/full", get(full))
        .route("/delta", get(delta))
        .route("/update", post(update))
        .route("/resolve-conflict", post(resolve_conflict))
        .route("/conflicts", get(conflicts))
}

#[derive(Debug, Deserialize)]
pub struct RegisterQuery {
    pub client_id: String,
    pub client_name: Option<String>,
}

async fn register(
    State(state): State<AppState>,
    Query(query): Query<RegisterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let name = query
        .client_name
        .unwrap_or_else(|| client::default_client_name(&query.client_id));
    let now = state.clock.now();
    state.store.upsert_client(&query.client_id, &name, &now)?;
    debug!("registered client {}", query.client_id);

    Ok(Json(json!({
        "status": "ok",
        "clientId": query.client_id,
    })))
}

async fn status(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let last_modified = state.store.get_sync_metadata()?;
    Ok(Json(json!({ "lastModified": last_modified })))
}

async fn full(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let snapshot = delta_assembler::full_snapshot(&state.store, &state.clock)?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct DeltaQuery {
    pub since: Option<String>,
    pub client_id: Option<String>,
}

async fn delta(
    State(state): State<AppState>,
    Query(query): Query<DeltaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let since = query
        .since
        .ok_or_else(|| AppError::Validation("missing required query parameter: since".into()))?;
    query
        .client_id
        .ok_or_else(|| AppError::Validation("missing required query parameter: client_id".into()))?;

    let snapshot = delta_assembler::delta_snapshot(&state.store, &state.clock, &since)?;
    Ok(Json(snapshot))
}

async fn update(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let batch = sync_engine::BatchUpdate::from_value(body)?;
    let result = services::apply_batch(&state.store, &state.clock, batch)?;

    let applied_config: Vec<Value> = result.applied_config.iter().map(|t| t.to_response_json()).collect();
    let applied_days = sync_engine::group_entries_by_day(&result.applied_days);

    Ok(Json(json!({
        "success": result.success,
        "conflicts": result.conflicts,
        "appliedConfig": applied_config,
        "appliedDays": applied_days,
        "lastModified": result.last_modified,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ResolveConflictQuery {
    pub entity_type: String,
    pub entity_id: String,
    pub resolution: String,
    pub client_id: String,
}

async fn resolve_conflict(
    State(state): State<AppState>,
    Query(query): Query<ResolveConflictQuery>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, AppError> {
    let entity_type = EntityType::parse(&query.entity_type)
        .ok_or_else(|| AppError::Validation(format!("unknown entity_type: {}", query.entity_type)))?;
    let resolution = Resolution::parse(&query.resolution)
        .ok_or_else(|| AppError::Validation(format!("unknown resolution: {}", query.resolution)))?;

    resolution_handler::resolve(
        &state.store,
        &state.clock,
        ResolveRequest {
            entity_type,
            entity_id: query.entity_id.clone(),
            resolution,
            client_id: query.client_id,
            payload: body.map(|Json(v)| v),
        },
    )?;

    Ok(Json(json!({
        "status": "ok",
        "resolution": resolution,
        "entityId": query.entity_id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ConflictsQuery {
    pub client_id: Option<String>,
}

async fn conflicts(
    State(state): State<AppState>,
    Query(query): Query<ConflictsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let client_id = query
        .client_id
        .ok_or_else(|| AppError::Validation("missing required query parameter: client_id".into()))?;
    let unresolved = state.store.list_unresolved_conflicts(&client_id)?;
    let conflicts: Vec<Value> = unresolved
        .iter()
        .map(|c| {
            json!({
                "entityType": c.entity_type,
                "entityId": c.entity_id,
                "resolution": c.resolution,
                "clientId": c.client_id,
                "resolvedAt": c.resolved_at,
            })
        })
        .collect();
    Ok(Json(json!({ "conflicts": conflicts })))
}
