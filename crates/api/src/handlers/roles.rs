use crate::handlers::error::{database_error, rbac_error, validation_error, ApiError};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use civic_database::{RoleRepository, SidebarRepository};
use civic_models::{GrantPermissions, NewRole, Permission, Role, Sidebar, UpdateRole};
use civic_rbac::SeedReport;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct ListRolesQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// List roles
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRolesQuery>,
) -> Result<Json<Vec<Role>>, ApiError> {
    RoleRepository::new(state.db.pool().clone())
        .list(query.include_inactive)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to list roles", e))
}

/// Create a role
pub async fn create_role(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewRole>,
) -> Result<(StatusCode, Json<Role>), ApiError> {
    request.validate().map_err(validation_error)?;

    let role = RoleRepository::new(state.db.pool().clone())
        .create(&request, state.actor_id)
        .await
        .map_err(|e| database_error("Failed to create role", e))?;

    tracing::info!("Created role {} ({})", role.name, role.id);
    Ok((StatusCode::CREATED, Json(role)))
}

/// Update a role; `parent_role_id` is stored as-is and grants nothing
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<i64>,
    Json(request): Json<UpdateRole>,
) -> Result<Json<Role>, ApiError> {
    request.validate().map_err(validation_error)?;

    RoleRepository::new(state.db.pool().clone())
        .update(role_id, &request, state.actor_id)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to update role", e))
}

pub async fn list_role_permissions(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<i64>,
) -> Result<Json<Vec<Permission>>, ApiError> {
    let roles = RoleRepository::new(state.db.pool().clone());
    roles
        .find_by_id(role_id)
        .await
        .map_err(|e| database_error("Failed to fetch role", e))?;

    roles
        .get_permissions(role_id)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to list role permissions", e))
}

/// Grant permissions to a role. Re-granting is a no-op.
pub async fn grant_role_permissions(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<i64>,
    Json(request): Json<GrantPermissions>,
) -> Result<Json<SeedReport>, ApiError> {
    request.validate().map_err(validation_error)?;

    state
        .rbac
        .grant_permissions(role_id, &request.permission_ids)
        .await
        .map(Json)
        .map_err(|e| rbac_error("Failed to grant permissions", e))
}

/// Soft-revoke one permission from a role
pub async fn revoke_role_permission(
    State(state): State<Arc<AppState>>,
    Path((role_id, permission_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    RoleRepository::new(state.db.pool().clone())
        .revoke_permission(role_id, permission_id, state.actor_id)
        .await
        .map_err(|e| database_error("Failed to revoke permission", e))?;

    tracing::info!("Revoked permission {} from role {}", permission_id, role_id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_role_sidebars(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<i64>,
) -> Result<Json<Vec<Sidebar>>, ApiError> {
    SidebarRepository::new(state.db.pool().clone())
        .get_role_sidebars(role_id)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to list role sidebars", e))
}
