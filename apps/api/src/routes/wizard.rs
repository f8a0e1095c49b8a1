//! Wizard session handlers.
//!
//! Every session operation checks the caller against the session owner
//! before touching any state; the registry lock is never held across an
//! upload, generation, or store call.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::UserContext;
use crate::errors::AppError;
use crate::services::generation::run_generation;
use crate::services::uploads::{extract_pdf_text, upload_attachment};
use crate::state::AppState;
use crate::wizard::artifacts::ArtifactKind;
use crate::wizard::registry::SessionRegistry;
use crate::wizard::session::{SessionView, WizardSession};
use crate::wizard::submission::{self, SubmissionResult, SubmissionTarget};
use crate::wizard::WizardError;

/// Runs `f` against an open session after the ownership check.
async fn with_owned<R>(
    sessions: &SessionRegistry,
    id: Uuid,
    user: &UserContext,
    f: impl FnOnce(&mut WizardSession) -> Result<R, WizardError>,
) -> Result<R, AppError> {
    let user_id = user.user_id;
    let result = sessions
        .with(id, |session| {
            if session.user_id != user_id {
                return Err(WizardError::MissingUser);
            }
            f(session)
        })
        .await
        .ok_or_else(|| AppError::NotFound(format!("Wizard session {id} not found")))?;
    Ok(result?)
}

async fn snapshot_of(
    sessions: &SessionRegistry,
    id: Uuid,
    user: &UserContext,
) -> Result<SessionView, AppError> {
    with_owned(sessions, id, user, |session| Ok(session.snapshot())).await
}

#[derive(Deserialize, Default)]
pub struct OpenJobWizardRequest {
    /// When present, the wizard opens pre-populated for editing this job.
    #[serde(default)]
    pub job_id: Option<Uuid>,
}

/// POST /api/v1/wizard/jobs
pub async fn handle_open_job_wizard(
    State(state): State<AppState>,
    user: UserContext,
    Json(req): Json<OpenJobWizardRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let session = match req.job_id {
        Some(job_id) => {
            let job = state
                .store
                .get_job(job_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
            if job.employer_id != user.user_id {
                return Err(AppError::Unauthorized);
            }
            WizardSession::for_job_edit(user.user_id, &job)
        }
        None => WizardSession::new_job(user.user_id),
    };
    let view = session.snapshot();
    state.sessions.insert(session).await;
    Ok((StatusCode::CREATED, Json(view)))
}

#[derive(Deserialize)]
pub struct OpenApplicationWizardRequest {
    pub job_id: Uuid,
}

/// POST /api/v1/wizard/applications
pub async fn handle_open_application_wizard(
    State(state): State<AppState>,
    user: UserContext,
    Json(req): Json<OpenApplicationWizardRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let job = state
        .store
        .get_job(req.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", req.job_id)))?;
    if !job.status.accepts_applications() {
        return Err(AppError::UnprocessableEntity(format!(
            "Job '{}' is not accepting applications",
            job.title
        )));
    }
    let session = WizardSession::new_application(user.user_id, &job);
    let view = session.snapshot();
    state.sessions.insert(session).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/wizard/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(snapshot_of(&state.sessions, id, &user).await?))
}

/// DELETE /api/v1/wizard/:id
/// Discards the session and everything in it.
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
) -> Result<StatusCode, AppError> {
    with_owned(&state.sessions, id, &user, |_| Ok(())).await?;
    state.sessions.remove(id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/wizard/:id/fields
pub async fn handle_update_fields(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
    Json(partial): Json<Map<String, Value>>,
) -> Result<Json<SessionView>, AppError> {
    with_owned(&state.sessions, id, &user, |session| {
        session.update_fields(partial)?;
        Ok(session.snapshot())
    })
    .await
    .map(Json)
}

/// POST /api/v1/wizard/:id/advance
pub async fn handle_advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
) -> Result<Json<SessionView>, AppError> {
    with_owned(&state.sessions, id, &user, |session| {
        session.advance()?;
        Ok(session.snapshot())
    })
    .await
    .map(Json)
}

/// POST /api/v1/wizard/:id/retreat
pub async fn handle_retreat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
) -> Result<Json<SessionView>, AppError> {
    with_owned(&state.sessions, id, &user, |session| {
        session.retreat()?;
        Ok(session.snapshot())
    })
    .await
    .map(Json)
}

#[derive(Deserialize)]
pub struct GoToRequest {
    pub step: usize,
}

/// POST /api/v1/wizard/:id/goto
pub async fn handle_go_to(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
    Json(req): Json<GoToRequest>,
) -> Result<Json<SessionView>, AppError> {
    with_owned(&state.sessions, id, &user, |session| {
        session.go_to(req.step)?;
        Ok(session.snapshot())
    })
    .await
    .map(Json)
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub kind: ArtifactKind,
    /// Confirms regeneration over manually edited content.
    #[serde(default)]
    pub force: bool,
}

/// POST /api/v1/wizard/:id/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<Value>, AppError> {
    let artifact = run_generation(
        state.sessions.clone(),
        state.generation.clone(),
        id,
        user,
        req.kind,
        req.force,
    )
    .await?;
    Ok(Json(json!({ "kind": req.kind, "artifact": artifact })))
}

#[derive(Deserialize)]
pub struct EditArtifactRequest {
    pub text: String,
}

/// PATCH /api/v1/wizard/:id/artifacts/:kind
/// Manual edit of generated content; marks the artifact as edited so a
/// later regeneration must be forced.
pub async fn handle_edit_artifact(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, ArtifactKind)>,
    user: UserContext,
    Json(req): Json<EditArtifactRequest>,
) -> Result<Json<SessionView>, AppError> {
    with_owned(&state.sessions, id, &user, |session| {
        session.artifacts.apply_edit(kind, req.text)?;
        Ok(session.snapshot())
    })
    .await
    .map(Json)
}

/// POST /api/v1/wizard/:id/uploads
///
/// Multipart fields route by name: `source_document` is a PDF whose
/// extracted text lands in the draft as `source_content`; `resume` is
/// stored and its URL written to `resume_url`; `video:<question_id>`
/// is stored and its URL merged into `interview_videos`. Each field is
/// merged as soon as it lands, so one failed upload does not undo the
/// ones already applied.
pub async fn handle_upload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    // Fail fast on closed or foreign sessions before moving any bytes.
    with_owned(&state.sessions, id, &user, |_| Ok(())).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or("upload.bin").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read field '{name}': {e}")))?;

        let mut partial = Map::new();
        match name.as_str() {
            "source_document" => {
                let text = extract_pdf_text(&bytes)?;
                partial.insert("source_content".to_string(), Value::String(text));
            }
            "resume" => {
                let url =
                    upload_attachment(&state.storage, user.user_id, "resume", &filename, bytes)
                        .await?;
                partial.insert("resume_url".to_string(), Value::String(url));
            }
            other => {
                let question_id = other
                    .strip_prefix("video:")
                    .filter(|q| !q.is_empty())
                    .ok_or_else(|| {
                        AppError::Validation(format!("Unknown upload field '{other}'"))
                    })?;
                let url = upload_attachment(
                    &state.storage,
                    user.user_id,
                    question_id,
                    &filename,
                    bytes,
                )
                .await?;
                let mut videos = Map::new();
                videos.insert(question_id.to_string(), Value::String(url));
                partial.insert("interview_videos".to_string(), Value::Object(videos));
            }
        }

        with_owned(&state.sessions, id, &user, |session| {
            session.update_fields(partial)
        })
        .await?;
    }

    Ok(Json(snapshot_of(&state.sessions, id, &user).await?))
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub target: SubmissionTarget,
}

/// POST /api/v1/wizard/:id/submit
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmissionResult>, AppError> {
    let result = submission::submit(&state.store, &state.sessions, id, user, req.target).await?;
    Ok(Json(result))
}
