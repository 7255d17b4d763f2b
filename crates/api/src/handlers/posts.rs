use crate::handlers::error::{database_error, validation_error, ApiError};
use crate::handlers::users::{paging, status_filter};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use civic_database::PostRepository;
use civic_models::{NewPost, NewPostMedia, Post, PostMedia, PostWithMedia, UpdateStatus};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct ListContentQuery {
    pub user_id: Option<i64>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListContentQuery>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let status = status_filter(query.status.as_deref())?;
    let (limit, offset) = paging(query.limit, query.offset);

    PostRepository::new(state.db.pool().clone())
        .list(query.user_id, status, limit, offset)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to list posts", e))
}

/// Create a post together with its ordered media
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewPost>,
) -> Result<(StatusCode, Json<PostWithMedia>), ApiError> {
    request.validate().map_err(validation_error)?;

    let created = PostRepository::new(state.db.pool().clone())
        .create(&request, state.actor_id)
        .await
        .map_err(|e| database_error("Failed to create post", e))?;

    tracing::info!("Created post {} with {} media", created.post.id, created.media.len());
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
) -> Result<Json<PostWithMedia>, ApiError> {
    PostRepository::new(state.db.pool().clone())
        .find_with_media(post_id)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to fetch post", e))
}

/// Append a media item after the post's existing media
pub async fn add_post_media(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
    Json(request): Json<NewPostMedia>,
) -> Result<(StatusCode, Json<PostMedia>), ApiError> {
    request.validate().map_err(validation_error)?;

    PostRepository::new(state.db.pool().clone())
        .add_media(post_id, &request, state.actor_id)
        .await
        .map(|media| (StatusCode::CREATED, Json(media)))
        .map_err(|e| database_error("Failed to add post media", e))
}

pub async fn update_post_status(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
    Json(request): Json<UpdateStatus>,
) -> Result<Json<Post>, ApiError> {
    request.validate().map_err(validation_error)?;

    PostRepository::new(state.db.pool().clone())
        .set_status(post_id, request.status, state.actor_id)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to update post status", e))
}
