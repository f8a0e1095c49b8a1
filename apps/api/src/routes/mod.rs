pub mod applications;
pub mod email;
pub mod health;
pub mod wizard;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Wizard sessions
        .route("/api/v1/wizard/jobs", post(wizard::handle_open_job_wizard))
        .route(
            "/api/v1/wizard/applications",
            post(wizard::handle_open_application_wizard),
        )
        .route("/api/v1/wizard/:id", get(wizard::handle_get_session))
        .route("/api/v1/wizard/:id", delete(wizard::handle_close_session))
        .route(
            "/api/v1/wizard/:id/fields",
            patch(wizard::handle_update_fields),
        )
        .route("/api/v1/wizard/:id/advance", post(wizard::handle_advance))
        .route("/api/v1/wizard/:id/retreat", post(wizard::handle_retreat))
        .route("/api/v1/wizard/:id/goto", post(wizard::handle_go_to))
        .route("/api/v1/wizard/:id/generate", post(wizard::handle_generate))
        .route(
            "/api/v1/wizard/:id/artifacts/:kind",
            patch(wizard::handle_edit_artifact),
        )
        .route("/api/v1/wizard/:id/uploads", post(wizard::handle_upload))
        .route("/api/v1/wizard/:id/submit", post(wizard::handle_submit))
        // Jobs and applications
        .route("/api/v1/jobs", get(applications::handle_list_jobs))
        .route(
            "/api/v1/jobs/:id/applications",
            get(applications::handle_list_applications),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(applications::handle_change_status),
        )
        .route(
            "/api/v1/applications/:id/rating",
            patch(applications::handle_set_rating),
        )
        // Bulk email
        .route("/api/v1/email/bulk", post(email::handle_bulk_email))
        .with_state(state)
}
