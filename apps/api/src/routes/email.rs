use axum::{extract::State, Json};

use crate::auth::UserContext;
use crate::errors::AppError;
use crate::services::email::{send_bulk_email, BulkEmailRequest, BulkEmailResponse};
use crate::state::AppState;

/// POST /api/v1/email/bulk
pub async fn handle_bulk_email(
    State(state): State<AppState>,
    user: UserContext,
    Json(req): Json<BulkEmailRequest>,
) -> Result<Json<BulkEmailResponse>, AppError> {
    let response = send_bulk_email(&state.store, &state.email, &user, req).await?;
    Ok(Json(response))
}
