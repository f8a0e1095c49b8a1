//! Submission coordinator.
//!
//! Maps the accumulated draft plus generated artifacts into a single
//! create-or-update call against the record store. Draft submissions only
//! need the first step; publishing re-checks every non-skipped step at
//! submission time, because fields may have been edited after a step was
//! left. Success resets the session and emits one notification; failure
//! leaves the session untouched so the user can retry.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::UserContext;
use crate::errors::AppError;
use crate::models::application::{ApplicationStatus, NewApplicationRecord};
use crate::models::job::{JobLocation, JobStatus, NewJobRecord};
use crate::store::RecordStore;
use crate::wizard::draft::{format_budget_range, DraftFormState};
use crate::wizard::registry::SessionRegistry;
use crate::wizard::session::{SessionPhase, WizardSession};
use crate::wizard::steps::{steps_for, WizardKind};
use crate::wizard::WizardError;

/// Persistence target. `Draft` has a relaxed validity bar; `Publish`
/// re-validates everything and maps to the "active" job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionTarget {
    Draft,
    Publish,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResult {
    pub record_id: Uuid,
    pub status: String,
}

/// Validates and maps a job draft, moving the session into `Submitting`.
/// Refused outright if a submission is already in flight, so no duplicate
/// record can be created.
pub fn prepare_job_submission(
    session: &mut WizardSession,
    user: &UserContext,
    target: SubmissionTarget,
) -> Result<NewJobRecord, WizardError> {
    if session.phase == SessionPhase::Submitting {
        return Err(WizardError::SubmissionInFlight);
    }
    if session.user_id != user.user_id {
        return Err(WizardError::MissingUser);
    }

    check_validity(session, target)?;
    if target == SubmissionTarget::Publish && session.artifacts.any_in_flight() {
        return Err(WizardError::GenerationUnsettled);
    }

    let draft = &session.draft;
    let source_verbatim =
        draft.bool_field("use_source_verbatim") && draft.has_text("source_content");

    let description = if draft.has_text("description") {
        draft.str_field("description").unwrap_or_default().to_string()
    } else {
        draft.str_field("source_content").unwrap_or_default().to_string()
    };

    let job_post = if source_verbatim {
        draft.str_field("source_content").map(String::from)
    } else if session.artifacts.job_post.has_content() {
        Some(session.artifacts.job_post.text.clone())
    } else {
        None
    };

    let record = NewJobRecord {
        employer_id: user.user_id,
        title: draft.str_field("title").unwrap_or_default().to_string(),
        description,
        employment_type: draft
            .str_field("employment_type")
            .unwrap_or_default()
            .to_string(),
        experience_level: draft
            .str_field("experience_level")
            .unwrap_or_default()
            .to_string(),
        skills: draft.string_list("skills"),
        status: match target {
            SubmissionTarget::Draft => JobStatus::Draft,
            SubmissionTarget::Publish => JobStatus::Active,
        },
        budget_range: combined_budget(draft),
        duration: draft.str_field("duration").map(String::from),
        location: draft
            .get("location")
            .and_then(|v| serde_json::from_value::<JobLocation>(v.clone()).ok()),
        job_post,
        skills_test: nonempty_artifact(&session.artifacts.skills_test.text),
        interview_questions: nonempty_artifact(&session.artifacts.interview_questions.text),
    };

    session.phase = SessionPhase::Submitting;
    Ok(record)
}

/// Validates and maps an application draft. Applications always submit at
/// full validity and land as `pending`.
pub fn prepare_application_submission(
    session: &mut WizardSession,
    user: &UserContext,
) -> Result<NewApplicationRecord, WizardError> {
    if session.phase == SessionPhase::Submitting {
        return Err(WizardError::SubmissionInFlight);
    }
    if session.user_id != user.user_id {
        return Err(WizardError::MissingUser);
    }
    check_validity(session, SubmissionTarget::Publish)?;

    let draft = &session.draft;
    let job_id = session.job_id.ok_or(WizardError::MissingUser)?;

    // Per-question answers: interview video URLs keyed by question id.
    let answers = draft
        .object("interview_videos")
        .map(|videos| {
            videos
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let record = NewApplicationRecord {
        job_id,
        candidate_name: draft
            .str_field("candidate_name")
            .unwrap_or_default()
            .to_string(),
        email: draft.str_field("email").unwrap_or_default().to_string(),
        status: ApplicationStatus::Pending,
        resume_url: draft.str_field("resume_url").map(String::from),
        cover_letter: draft.str_field("cover_letter").map(String::from),
        answers,
        test_responses: encode_test_responses(draft),
    };

    session.phase = SessionPhase::Submitting;
    Ok(record)
}

/// Re-checks step validity for the given target. Draft only needs the
/// first step; publish walks every step whose skip predicate is false.
fn check_validity(session: &WizardSession, target: SubmissionTarget) -> Result<(), WizardError> {
    let steps = steps_for(session.kind);
    let to_check: &[_] = match target {
        SubmissionTarget::Draft => &steps[..1],
        SubmissionTarget::Publish => steps,
    };
    for step in to_check {
        if step.is_skipped(&session.draft) {
            continue;
        }
        if !(step.validity)(&session.draft, &session.artifacts) {
            return Err(WizardError::StepIncomplete {
                index: step.index,
                label: step.label,
            });
        }
    }
    Ok(())
}

/// Combines the nested budget sub-fields into the stored string, falling
/// back to an already-combined `budget_range` field.
fn combined_budget(draft: &DraftFormState) -> Option<String> {
    if let Some(budget) = draft.object("budget") {
        let min = budget.get("min").and_then(|v| v.as_str()).unwrap_or("");
        let max = budget.get("max").and_then(|v| v.as_str()).unwrap_or("");
        let combined = format_budget_range(min, max);
        return (!combined.is_empty()).then_some(combined);
    }
    draft.str_field("budget_range").map(String::from)
}

/// Skills-test responses, JSON-serialized as an array ordered by question.
fn encode_test_responses(draft: &DraftFormState) -> Option<String> {
    let questions = draft.string_list("assessment_questions");
    if questions.is_empty() {
        return None;
    }
    let answers = draft.object("assessment_answers");
    let responses: Vec<_> = questions
        .iter()
        .map(|q| {
            let answer = answers
                .and_then(|a| a.get(q.as_str()))
                .and_then(|v| v.as_str())
                .unwrap_or("");
            serde_json::json!({"question_id": q, "answer": answer})
        })
        .collect();
    serde_json::to_string(&responses).ok()
}

fn nonempty_artifact(text: &str) -> Option<String> {
    (!text.trim().is_empty()).then(|| text.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestration against the registry
// ────────────────────────────────────────────────────────────────────────────

/// Submits the session's draft. The registry lock is released across the
/// store call; on confirmed success the session is reset and closed, on
/// failure it is returned to `Editing` with its state intact.
pub async fn submit(
    store: &Arc<dyn RecordStore>,
    registry: &SessionRegistry,
    session_id: Uuid,
    user: UserContext,
    target: SubmissionTarget,
) -> Result<SubmissionResult, AppError> {
    enum Prepared {
        Job(NewJobRecord, Option<Uuid>),
        Application(NewApplicationRecord),
    }

    let prepared = registry
        .with(session_id, |session| -> Result<Prepared, WizardError> {
            match session.kind {
                WizardKind::JobCreation => {
                    let record = prepare_job_submission(session, &user, target)?;
                    Ok(Prepared::Job(record, session.job_id))
                }
                WizardKind::Application => {
                    let record = prepare_application_submission(session, &user)?;
                    Ok(Prepared::Application(record))
                }
            }
        })
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))??;

    let outcome = match prepared {
        Prepared::Job(record, Some(existing)) => store
            .update_job(existing, record)
            .await
            .map(|job| (job.id, job.status.as_str())),
        Prepared::Job(record, None) => store
            .insert_job(record)
            .await
            .map(|job| (job.id, job.status.as_str())),
        Prepared::Application(record) => store
            .insert_application(record)
            .await
            .map(|app| (app.id, app.status.as_str())),
    };

    match outcome {
        Ok((record_id, status)) => {
            // Reset before close so a reopened id observes nothing stale.
            let closed = registry
                .with(session_id, |session| session.reset())
                .await
                .is_some();
            if closed {
                registry.remove(session_id).await;
            }
            // The single downstream notification for this submission.
            info!("Record {record_id} written with status '{status}'");
            Ok(SubmissionResult {
                record_id,
                status: status.to_string(),
            })
        }
        Err(err) => {
            registry
                .with(session_id, |session| {
                    session.phase = SessionPhase::Editing;
                })
                .await;
            warn!("Submission for session {session_id} failed: {err}");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::store::memory::MemoryRecordStore;
    use crate::wizard::session::WizardSession;

    fn step1_only_session(user_id: Uuid) -> WizardSession {
        let mut session = WizardSession::new_job(user_id);
        session
            .update_fields(
                json!({"title": "Backend Engineer", "description": "Build APIs"})
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .unwrap();
        session
    }

    async fn setup(
        session: WizardSession,
    ) -> (Arc<dyn RecordStore>, Arc<MemoryRecordStore>, SessionRegistry, Uuid) {
        let memory = Arc::new(MemoryRecordStore::new());
        let store: Arc<dyn RecordStore> = memory.clone();
        let registry = SessionRegistry::new();
        let id = registry.insert(session).await;
        (store, memory, registry, id)
    }

    #[tokio::test]
    async fn test_step1_only_draft_submits_but_publish_is_refused() {
        let user = UserContext {
            user_id: Uuid::new_v4(),
        };
        let (store, memory, registry, id) = setup(step1_only_session(user.user_id)).await;

        // Publish is blocked before any store call.
        let err = submit(&store, &registry, id, user, SubmissionTarget::Publish)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
        assert!(memory.list_jobs(user.user_id).await.unwrap().is_empty());

        // Draft goes through with only the first step filled.
        let result = submit(&store, &registry, id, user, SubmissionTarget::Draft)
            .await
            .unwrap();
        assert_eq!(result.status, "draft");
    }

    #[tokio::test]
    async fn test_successful_draft_submit_resets_and_closes_session() {
        let user = UserContext {
            user_id: Uuid::new_v4(),
        };
        let (store, memory, registry, id) = setup(step1_only_session(user.user_id)).await;

        let result = submit(&store, &registry, id, user, SubmissionTarget::Draft)
            .await
            .unwrap();

        let stored = memory.get_job(result.record_id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Backend Engineer");
        assert_eq!(stored.status, JobStatus::Draft);
        // Session is gone after confirmed success.
        assert!(registry.with(id, |_| ()).await.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_leaves_no_record_and_keeps_draft() {
        let user = UserContext {
            user_id: Uuid::new_v4(),
        };
        let (store, memory, registry, id) = setup(step1_only_session(user.user_id)).await;
        memory.fail_next_write();

        let err = submit(&store, &registry, id, user, SubmissionTarget::Draft)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));

        // No partial record in the store.
        assert!(memory.list_jobs(user.user_id).await.unwrap().is_empty());

        // Draft intact, session back in Editing, so retry succeeds.
        let title = registry
            .with(id, |s| s.draft.str_field("title").map(String::from))
            .await
            .unwrap();
        assert_eq!(title.as_deref(), Some("Backend Engineer"));
        submit(&store, &registry, id, user, SubmissionTarget::Draft)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_second_submit_while_submitting_is_refused() {
        let user = UserContext {
            user_id: Uuid::new_v4(),
        };
        let mut session = step1_only_session(user.user_id);
        session.phase = SessionPhase::Submitting;
        let (store, memory, registry, id) = setup(session).await;

        let err = submit(&store, &registry, id, user, SubmissionTarget::Draft)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(memory.list_jobs(user.user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_by_non_owner_is_refused() {
        let owner = Uuid::new_v4();
        let (store, memory, registry, id) = setup(step1_only_session(owner)).await;

        let intruder = UserContext {
            user_id: Uuid::new_v4(),
        };
        let err = submit(&store, &registry, id, intruder, SubmissionTarget::Draft)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
        assert!(memory.list_jobs(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_requires_settled_generation() {
        let user = UserContext {
            user_id: Uuid::new_v4(),
        };
        let mut session = step1_only_session(user.user_id);
        session
            .update_fields(
                json!({
                    "employment_type": "full-time",
                    "experience_level": "mid-level",
                    "skills": ["rust"],
                    "source_content": "Posting text",
                    "use_source_verbatim": true
                })
                .as_object()
                .unwrap()
                .clone(),
            )
            .unwrap();
        session
            .artifacts
            .begin(crate::wizard::artifacts::ArtifactKind::JobPost, false)
            .unwrap();
        let (store, _memory, registry, id) = setup(session).await;

        // Draft submission is allowed while generation is outstanding...
        let err = submit(&store, &registry, id, user, SubmissionTarget::Publish)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));

        let result = submit(&store, &registry, id, user, SubmissionTarget::Draft)
            .await
            .unwrap();
        assert_eq!(result.status, "draft");
    }

    #[tokio::test]
    async fn test_verbatim_source_becomes_the_job_post() {
        let user = UserContext {
            user_id: Uuid::new_v4(),
        };
        let mut session = WizardSession::new_job(user.user_id);
        session
            .update_fields(
                json!({
                    "title": "Backend Engineer",
                    "source_content": "Full posting from the PDF",
                    "use_source_verbatim": true,
                    "employment_type": "full-time",
                    "experience_level": "mid-level",
                    "skills": ["rust"],
                    "budget": {"min": "$2,000", "max": "$5,000"}
                })
                .as_object()
                .unwrap()
                .clone(),
            )
            .unwrap();
        let (store, memory, registry, id) = setup(session).await;

        let result = submit(&store, &registry, id, user, SubmissionTarget::Publish)
            .await
            .unwrap();
        let stored = memory.get_job(result.record_id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Active);
        assert_eq!(stored.job_post.as_deref(), Some("Full posting from the PDF"));
        assert_eq!(stored.budget_range.as_deref(), Some("$2,000 - $5,000"));
    }

    #[tokio::test]
    async fn test_end_to_end_draft_scenario() {
        let user = UserContext {
            user_id: Uuid::new_v4(),
        };
        let mut session = WizardSession::new_job(user.user_id);
        session
            .update_fields(
                json!({
                    "title": "Backend Engineer",
                    "description": "Build APIs",
                    "employment_type": "full-time",
                    "experience_level": "mid-level"
                })
                .as_object()
                .unwrap()
                .clone(),
            )
            .unwrap();
        let session_copy_check = session.id;
        let (store, memory, registry, id) = setup(session).await;
        assert_eq!(session_copy_check, id);

        let result = submit(&store, &registry, id, user, SubmissionTarget::Draft)
            .await
            .unwrap();

        let stored = memory.get_job(result.record_id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Backend Engineer");
        assert_eq!(stored.description, "Build APIs");
        assert_eq!(stored.employment_type, "full-time");
        assert_eq!(stored.experience_level, "mid-level");
        // The session (and with it the draft) is gone after success.
        assert!(registry.with(id, |_| ()).await.is_none());
    }

    #[tokio::test]
    async fn test_application_submission_encodes_test_responses() {
        let user = UserContext {
            user_id: Uuid::new_v4(),
        };
        let memory = Arc::new(MemoryRecordStore::new());
        let store: Arc<dyn RecordStore> = memory.clone();
        let job = memory
            .insert_job(NewJobRecord {
                employer_id: Uuid::new_v4(),
                title: "Backend Engineer".to_string(),
                description: "Build APIs".to_string(),
                employment_type: "full-time".to_string(),
                experience_level: "mid-level".to_string(),
                skills: vec!["rust".to_string()],
                status: JobStatus::Active,
                budget_range: None,
                duration: None,
                location: None,
                job_post: Some("We are hiring".to_string()),
                skills_test: Some(
                    r#"[{"type": "text", "id": "q1", "prompt": "Explain ownership."}]"#.to_string(),
                ),
                interview_questions: None,
            })
            .await
            .unwrap();

        let mut session = WizardSession::new_application(user.user_id, &job);
        session
            .update_fields(
                json!({
                    "candidate_name": "Ada Lovelace",
                    "email": "ada@example.com",
                    "resume_url": "https://cdn/resume.pdf",
                    "assessment_answers": {"q1": "Each value has one owner."}
                })
                .as_object()
                .unwrap()
                .clone(),
            )
            .unwrap();
        let registry = SessionRegistry::new();
        let id = registry.insert(session).await;

        let result = submit(&store, &registry, id, user, SubmissionTarget::Publish)
            .await
            .unwrap();
        let stored = memory.get_application(result.record_id).await.unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Pending);
        assert_eq!(stored.job_id, job.id);

        let responses: Vec<serde_json::Value> =
            serde_json::from_str(stored.test_responses.as_deref().unwrap()).unwrap();
        assert_eq!(responses[0]["question_id"], "q1");
        assert_eq!(responses[0]["answer"], "Each value has one owner.");
    }
}
