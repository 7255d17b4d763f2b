//! One generic handler set serving every registered lookup table.

use crate::handlers::error::{database_error, registry_error, ApiError};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use civic_database::LookupRepository;
use civic_models::{LookupListParams, MetaRegistry};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct LookupTableSummary {
    pub key: &'static str,
    pub display_name: &'static str,
    pub searchable_fields: &'static [&'static str],
    pub has_status: bool,
}

#[derive(Debug, Serialize)]
pub struct LookupPage {
    pub data: Vec<serde_json::Value>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// List registered lookup tables
pub async fn list_tables() -> Json<Vec<LookupTableSummary>> {
    Json(
        MetaRegistry::all()
            .iter()
            .map(|d| LookupTableSummary {
                key: d.name,
                display_name: d.display_name,
                searchable_fields: d.searchable_fields,
                has_status: d.has_status,
            })
            .collect(),
    )
}

/// List rows of one lookup table
pub async fn list_rows(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(params): Query<LookupListParams>,
) -> Result<Json<LookupPage>, ApiError> {
    let descriptor = MetaRegistry::resolve(&key).map_err(registry_error)?;
    let filter = descriptor.plan_list(&params).map_err(registry_error)?;

    let repo = LookupRepository::new(state.db.pool().clone());
    let data = repo
        .list(descriptor, &filter)
        .await
        .map_err(|e| database_error("Failed to list lookup rows", e))?;
    let total = repo
        .count(descriptor, &filter)
        .await
        .map_err(|e| database_error("Failed to count lookup rows", e))?;

    Ok(Json(LookupPage {
        data,
        total,
        limit: filter.limit,
        offset: filter.offset,
    }))
}

pub async fn get_row(
    State(state): State<Arc<AppState>>,
    Path((key, id)): Path<(String, i64)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let descriptor = MetaRegistry::resolve(&key).map_err(registry_error)?;

    LookupRepository::new(state.db.pool().clone())
        .get(descriptor, id)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to fetch lookup row", e))
}

pub async fn create_row(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let descriptor = MetaRegistry::resolve(&key).map_err(registry_error)?;
    let payload = descriptor
        .validate_payload(&payload, false)
        .map_err(registry_error)?;

    let created = LookupRepository::new(state.db.pool().clone())
        .create(descriptor, &payload, state.actor_id)
        .await
        .map_err(|e| database_error("Failed to create lookup row", e))?;

    tracing::info!("Created {} row {}", descriptor.name, created["id"]);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_row(
    State(state): State<Arc<AppState>>,
    Path((key, id)): Path<(String, i64)>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let descriptor = MetaRegistry::resolve(&key).map_err(registry_error)?;
    let payload = descriptor
        .validate_payload(&payload, true)
        .map_err(registry_error)?;

    LookupRepository::new(state.db.pool().clone())
        .update(descriptor, id, &payload, state.actor_id)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to update lookup row", e))
}
