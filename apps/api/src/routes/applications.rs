//! Job listing and application management handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::UserContext;
use crate::errors::AppError;
use crate::models::application::{ApplicationRecord, ApplicationStatus};
use crate::models::job::JobRecord;
use crate::services::applications::{change_status, set_rating};
use crate::state::AppState;

/// GET /api/v1/jobs
/// Jobs posted by the calling employer, drafts included.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    user: UserContext,
) -> Result<Json<Vec<JobRecord>>, AppError> {
    let jobs = state.store.list_jobs(user.user_id).await?;
    Ok(Json(jobs))
}

/// GET /api/v1/jobs/:id/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
) -> Result<Json<Vec<ApplicationRecord>>, AppError> {
    let job = state
        .store
        .get_job(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    if job.employer_id != user.user_id {
        return Err(AppError::Unauthorized);
    }
    let applications = state.store.list_applications(id).await?;
    Ok(Json(applications))
}

#[derive(Deserialize)]
pub struct StatusChangeRequest {
    pub status: ApplicationStatus,
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
    Json(req): Json<StatusChangeRequest>,
) -> Result<StatusCode, AppError> {
    change_status(&state.store, &user, id, req.status).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct RatingRequest {
    /// 1-5, or null to clear.
    pub rating: Option<i16>,
}

/// PATCH /api/v1/applications/:id/rating
pub async fn handle_set_rating(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
    Json(req): Json<RatingRequest>,
) -> Result<StatusCode, AppError> {
    set_rating(&state.store, &user, id, req.rating).await?;
    Ok(StatusCode::NO_CONTENT)
}
