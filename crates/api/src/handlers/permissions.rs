use crate::handlers::error::{bad_request, database_error, ApiError};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use civic_database::{PermissionRepository, SidebarRepository};
use civic_models::{is_valid_group_action, Permission, PermissionGroup, Sidebar};
use std::sync::Arc;

/// List active permission groups
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PermissionGroup>>, ApiError> {
    PermissionRepository::new(state.db.pool().clone())
        .list_groups()
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to list permission groups", e))
}

/// Every active permission across all groups
pub async fn list_permissions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Permission>>, ApiError> {
    PermissionRepository::new(state.db.pool().clone())
        .list_active()
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to list permissions", e))
}

/// Permissions under a group action such as `posts:*`
pub async fn list_group_permissions(
    State(state): State<Arc<AppState>>,
    Path(action): Path<String>,
) -> Result<Json<Vec<Permission>>, ApiError> {
    if !is_valid_group_action(&action) {
        return Err(bad_request(&format!(
            "'{}' is not a group action (expected resource:*)",
            action
        )));
    }

    PermissionRepository::new(state.db.pool().clone())
        .list_by_group_action(&action)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to list group permissions", e))
}

/// Full navigation menu
pub async fn list_sidebars(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Sidebar>>, ApiError> {
    SidebarRepository::new(state.db.pool().clone())
        .list()
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to list sidebars", e))
}
