use crate::handlers::error::{database_error, rbac_error, registry_error, validation_error, ApiError};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use civic_database::{RoleRepository, SidebarRepository, UserRepository};
use civic_models::{
    AssignRoles, NewUser, Permission, RegistryError, Role, Sidebar, StatusFilter, UpdateStatus,
    User,
};
use civic_rbac::SeedReport;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Parse a `status` query value (`1`, `0`, `all`; active by default)
pub(crate) fn status_filter(raw: Option<&str>) -> Result<Option<i16>, ApiError> {
    let filter = match raw {
        Some(raw) => raw
            .parse::<StatusFilter>()
            .map_err(|e| registry_error(RegistryError::InvalidStatusFilter(e)))?,
        None => StatusFilter::default(),
    };
    Ok(filter.as_status())
}

/// Clamp paging parameters the same way lookup lists do
pub(crate) fn paging(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (limit.unwrap_or(100).clamp(1, 1000), offset.unwrap_or(0).max(0))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let status = status_filter(query.status.as_deref())?;
    let (limit, offset) = paging(query.limit, query.offset);

    UserRepository::new(state.db.pool().clone())
        .list(status, limit, offset)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to list users", e))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    request.validate().map_err(validation_error)?;

    let user = UserRepository::new(state.db.pool().clone())
        .create(&request, state.actor_id)
        .await
        .map_err(|e| database_error("Failed to create user", e))?;

    tracing::info!("Created user {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_user_roles(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Role>>, ApiError> {
    UserRepository::new(state.db.pool().clone())
        .find_by_id(user_id)
        .await
        .map_err(|e| database_error("Failed to fetch user", e))?;

    RoleRepository::new(state.db.pool().clone())
        .get_user_roles(user_id)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to list user roles", e))
}

/// Assign roles to a user; already-held roles are left as they are
pub async fn assign_user_roles(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(request): Json<AssignRoles>,
) -> Result<Json<SeedReport>, ApiError> {
    request.validate().map_err(validation_error)?;

    state
        .rbac
        .assign_roles_to_user(user_id, &request.role_ids)
        .await
        .map(Json)
        .map_err(|e| rbac_error("Failed to assign roles", e))
}

pub async fn revoke_user_role(
    State(state): State<Arc<AppState>>,
    Path((user_id, role_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    RoleRepository::new(state.db.pool().clone())
        .revoke_from_user(user_id, role_id, state.actor_id)
        .await
        .map_err(|e| database_error("Failed to revoke role", e))?;

    tracing::info!("Revoked role {} from user {}", role_id, user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Effective permissions through every active role
pub async fn list_user_permissions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Permission>>, ApiError> {
    RoleRepository::new(state.db.pool().clone())
        .get_user_permissions(user_id)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to list user permissions", e))
}

pub async fn list_user_sidebars(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Sidebar>>, ApiError> {
    SidebarRepository::new(state.db.pool().clone())
        .get_user_sidebars(user_id)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to list user sidebars", e))
}

#[derive(Debug, Deserialize)]
pub struct PermissionCheckQuery {
    pub permission: String,
}

#[derive(Debug, serde::Serialize)]
pub struct PermissionCheckResponse {
    pub user_id: i64,
    pub permission: String,
    pub granted: bool,
}

/// Whether a user holds a permission through any active role
pub async fn check_user_permission(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<PermissionCheckQuery>,
) -> Result<Json<PermissionCheckResponse>, ApiError> {
    let granted = RoleRepository::new(state.db.pool().clone())
        .user_has_permission(user_id, &query.permission)
        .await
        .map_err(|e| database_error("Failed to check permission", e))?;

    Ok(Json(PermissionCheckResponse {
        user_id,
        permission: query.permission,
        granted,
    }))
}

/// Enable or disable a user account
pub async fn update_user_status(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(request): Json<UpdateStatus>,
) -> Result<Json<User>, ApiError> {
    request.validate().map_err(validation_error)?;

    let user = UserRepository::new(state.db.pool().clone())
        .set_status(user_id, request.status, state.actor_id)
        .await
        .map_err(|e| database_error("Failed to update user status", e))?;

    tracing::info!("User {} status set to {}", user.id, request.status);
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_defaults_to_active() {
        assert_eq!(status_filter(None).unwrap(), Some(1));
        assert_eq!(status_filter(Some("all")).unwrap(), None);
        assert_eq!(status_filter(Some("maybe")).unwrap_err().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_paging_is_clamped() {
        assert_eq!(paging(None, None), (100, 0));
        assert_eq!(paging(Some(5000), Some(-3)), (1000, 0));
        assert_eq!(paging(Some(0), Some(20)), (1, 20));
    }
}
