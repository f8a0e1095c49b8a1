//! Application management — explicit status transitions and ratings.
//!
//! Status transitions go through `ApplicationStatus::can_transition`, the
//! single source of truth. Rating changes never move the status: clearing
//! a rating leaves a reviewed application reviewed.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::UserContext;
use crate::errors::AppError;
use crate::models::application::{ApplicationRecord, ApplicationStatus};
use crate::store::RecordStore;

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

/// Loads an application and checks the caller owns the job it belongs to.
async fn authorize(
    store: &Arc<dyn RecordStore>,
    user: &UserContext,
    application_id: Uuid,
) -> Result<ApplicationRecord, AppError> {
    let application = store
        .get_application(application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
    let job = store
        .get_job(application.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", application.job_id)))?;
    if job.employer_id != user.user_id {
        return Err(AppError::Unauthorized);
    }
    Ok(application)
}

/// Moves an application to a new pipeline status.
pub async fn change_status(
    store: &Arc<dyn RecordStore>,
    user: &UserContext,
    application_id: Uuid,
    to: ApplicationStatus,
) -> Result<(), AppError> {
    let application = authorize(store, user, application_id).await?;
    if !application.status.can_transition(to) {
        return Err(AppError::UnprocessableEntity(format!(
            "Cannot move application from '{}' to '{}'",
            application.status.as_str(),
            to.as_str()
        )));
    }
    store.set_application_status(application_id, to).await?;
    Ok(())
}

/// Sets or clears the manual rating. The status is deliberately left
/// untouched either way.
pub async fn set_rating(
    store: &Arc<dyn RecordStore>,
    user: &UserContext,
    application_id: Uuid,
    rating: Option<i16>,
) -> Result<(), AppError> {
    if let Some(r) = rating {
        if !(MIN_RATING..=MAX_RATING).contains(&r) {
            return Err(AppError::Validation(format!(
                "Rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }
    }
    authorize(store, user, application_id).await?;
    store.set_application_rating(application_id, rating).await?;
    Ok(())
}
