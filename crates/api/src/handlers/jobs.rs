use crate::handlers::error::{database_error, validation_error, ApiError};
use crate::handlers::posts::ListContentQuery;
use crate::handlers::users::{paging, status_filter};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use civic_database::JobRepository;
use civic_models::{Job, NewJob, UpdateStatus};
use std::sync::Arc;
use validator::Validate;

pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListContentQuery>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let status = status_filter(query.status.as_deref())?;
    let (limit, offset) = paging(query.limit, query.offset);

    JobRepository::new(state.db.pool().clone())
        .list(query.user_id, status, limit, offset)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to list jobs", e))
}

/// Submit a job application, for the submitter or on someone else's behalf
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewJob>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    request.validate().map_err(validation_error)?;

    let job = JobRepository::new(state.db.pool().clone())
        .create(&request, state.actor_id)
        .await
        .map_err(|e| database_error("Failed to create job", e))?;

    tracing::info!("Created job application {}", job.id);
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> Result<Json<Job>, ApiError> {
    JobRepository::new(state.db.pool().clone())
        .find_by_id(job_id)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to fetch job", e))
}

pub async fn update_job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
    Json(request): Json<UpdateStatus>,
) -> Result<Json<Job>, ApiError> {
    request.validate().map_err(validation_error)?;

    JobRepository::new(state.db.pool().clone())
        .set_status(job_id, request.status, state.actor_id)
        .await
        .map(Json)
        .map_err(|e| database_error("Failed to update job status", e))
}
