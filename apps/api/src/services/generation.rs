//! Content generation service.
//!
//! Drives the per-session generation gate: admit the request under the
//! registry lock, call the generation collaborator with no lock held, and
//! apply the completion under the lock again. A completion for a session
//! that was closed or reset in the meantime is dropped.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::UserContext;
use crate::errors::AppError;
use crate::llm_client::prompts::GROUNDING_INSTRUCTION;
use crate::llm_client::{strip_json_fences, LlmClient};
use crate::models::assessment::parse_questions;
use crate::services::prompts::{
    INTERVIEW_PROMPT_TEMPLATE, INTERVIEW_SYSTEM, JOB_POST_PROMPT_TEMPLATE, JOB_POST_SYSTEM,
    SKILLS_TEST_PROMPT_TEMPLATE, SKILLS_TEST_SYSTEM,
};
use crate::wizard::artifacts::{ArtifactKind, GeneratedArtifact};
use crate::wizard::draft::DraftFormState;
use crate::wizard::registry::SessionRegistry;
use crate::wizard::WizardError;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation call failed: {0}")]
    Upstream(String),

    #[error("generated content is malformed: {0}")]
    Malformed(String),
}

/// Structured employer input for job post generation.
#[derive(Debug, Clone, Serialize)]
pub struct JobContext {
    pub title: String,
    pub description: String,
    pub employment_type: String,
    pub experience_level: String,
    pub skills: Vec<String>,
}

impl JobContext {
    fn from_draft(draft: &DraftFormState) -> Self {
        let description = if draft.has_text("description") {
            draft.str_field("description").unwrap_or_default()
        } else {
            draft.str_field("source_content").unwrap_or_default()
        };
        Self {
            title: draft.str_field("title").unwrap_or_default().to_string(),
            description: description.to_string(),
            employment_type: draft
                .str_field("employment_type")
                .unwrap_or_default()
                .to_string(),
            experience_level: draft
                .str_field("experience_level")
                .unwrap_or_default()
                .to_string(),
            skills: draft.string_list("skills"),
        }
    }
}

/// One request to the generation collaborator, dispatched on `type`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GenerationRequest {
    JobPost { job_data: JobContext },
    SkillsTest { existing_job_post: String },
    InterviewQuestions {
        existing_job_post: String,
        existing_skills_test: Option<String>,
    },
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Production generation client backed by the LLM.
pub struct LlmGenerationClient {
    llm: LlmClient,
}

impl LlmGenerationClient {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl GenerationClient for LlmGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let (prompt, system) = match request {
            GenerationRequest::JobPost { job_data } => {
                let job_json = serde_json::to_string_pretty(job_data)
                    .map_err(|e| GenerationError::Upstream(e.to_string()))?;
                (
                    JOB_POST_PROMPT_TEMPLATE
                        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
                        .replace("{job_json}", &job_json),
                    JOB_POST_SYSTEM,
                )
            }
            GenerationRequest::SkillsTest { existing_job_post } => (
                SKILLS_TEST_PROMPT_TEMPLATE.replace("{job_post}", existing_job_post),
                SKILLS_TEST_SYSTEM,
            ),
            GenerationRequest::InterviewQuestions {
                existing_job_post,
                existing_skills_test,
            } => (
                INTERVIEW_PROMPT_TEMPLATE
                    .replace("{job_post}", existing_job_post)
                    .replace(
                        "{skills_test}",
                        existing_skills_test.as_deref().unwrap_or(""),
                    ),
                INTERVIEW_SYSTEM,
            ),
        };

        self.llm
            .call_text(&prompt, system)
            .await
            .map_err(|e| GenerationError::Upstream(e.to_string()))
    }
}

/// Runs one generation round trip for a session artifact.
///
/// `force` confirms regeneration over manually edited content. The second
/// call for the same artifact while one is outstanding is refused before
/// any network call is dispatched.
pub async fn run_generation(
    registry: Arc<SessionRegistry>,
    client: Arc<dyn GenerationClient>,
    session_id: Uuid,
    user: UserContext,
    kind: ArtifactKind,
    force: bool,
) -> Result<GeneratedArtifact, AppError> {
    // Admit the request and snapshot the inputs under the lock.
    let (ticket, request) = registry
        .with(session_id, |session| -> Result<_, WizardError> {
            if session.user_id != user.user_id {
                return Err(WizardError::MissingUser);
            }
            let ticket = session.artifacts.begin(kind, force)?;
            let request = build_request(kind, session);
            Ok((ticket, request))
        })
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))??;

    // Network call with no lock held.
    let outcome = client.generate(&request).await;
    let outcome = validate_generated(kind, outcome);

    if let Err(reason) = &outcome {
        warn!("Generation of {kind} for session {session_id} failed: {reason}");
    } else {
        info!("Generated {kind} for session {session_id}");
    }

    // Apply the completion; a closed session swallows it.
    registry
        .with(session_id, |session| {
            session.artifacts.complete(ticket, outcome);
            session.artifacts.get(kind).clone()
        })
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))
}

fn build_request(
    kind: ArtifactKind,
    session: &crate::wizard::session::WizardSession,
) -> GenerationRequest {
    match kind {
        ArtifactKind::JobPost => GenerationRequest::JobPost {
            job_data: JobContext::from_draft(&session.draft),
        },
        // begin() guarantees the job post prerequisite is present.
        ArtifactKind::SkillsTest => GenerationRequest::SkillsTest {
            existing_job_post: session.artifacts.job_post.text.clone(),
        },
        ArtifactKind::InterviewQuestions => GenerationRequest::InterviewQuestions {
            existing_job_post: session.artifacts.job_post.text.clone(),
            existing_skills_test: session
                .artifacts
                .skills_test
                .has_content()
                .then(|| session.artifacts.skills_test.text.clone()),
        },
    }
}

/// Structured artifacts must decode through the strict question schema;
/// malformed output is converted into a generation failure so prior good
/// content is preserved.
fn validate_generated(
    kind: ArtifactKind,
    outcome: Result<String, GenerationError>,
) -> Result<String, String> {
    let text = outcome.map_err(|e| e.to_string())?;
    match kind {
        ArtifactKind::JobPost => Ok(text),
        ArtifactKind::SkillsTest | ArtifactKind::InterviewQuestions => {
            // Models occasionally fence JSON output despite instructions.
            let text = strip_json_fences(&text).to_string();
            match parse_questions(&text) {
                Ok(_) => Ok(text),
                Err(e) => Err(GenerationError::Malformed(e.to_string()).to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tokio::sync::Notify;

    use crate::wizard::artifacts::ArtifactStatus;
    use crate::wizard::session::WizardSession;

    /// Client that blocks inside `generate` until released, counting calls.
    struct BlockingClient {
        calls: AtomicUsize,
        entered: Notify,
        release: Notify,
        response: String,
    }

    impl BlockingClient {
        fn new(response: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                entered: Notify::new(),
                release: Notify::new(),
                response: response.to_string(),
            }
        }
    }

    #[async_trait]
    impl GenerationClient for BlockingClient {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(self.response.clone())
        }
    }

    /// Client that answers immediately.
    struct ImmediateClient {
        calls: AtomicUsize,
        response: Result<String, String>,
    }

    impl ImmediateClient {
        fn ok(response: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Ok(response.to_string()),
            }
        }

        fn err(reason: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Err(reason.to_string()),
            }
        }
    }

    #[async_trait]
    impl GenerationClient for ImmediateClient {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response
                .clone()
                .map_err(GenerationError::Upstream)
        }
    }

    async fn open_session(registry: &SessionRegistry, user: UserContext) -> Uuid {
        let mut session = WizardSession::new_job(user.user_id);
        session
            .update_fields(
                json!({"title": "Backend Engineer", "description": "Build APIs"})
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .unwrap();
        registry.insert(session).await
    }

    #[tokio::test]
    async fn test_second_request_dispatches_no_second_network_call() {
        let user = UserContext {
            user_id: Uuid::new_v4(),
        };
        let registry = Arc::new(SessionRegistry::new());
        let client = Arc::new(BlockingClient::new("Generated post"));
        let id = open_session(&registry, user).await;

        let first = tokio::spawn(run_generation(
            registry.clone(),
            client.clone(),
            id,
            user,
            ArtifactKind::JobPost,
            false,
        ));
        client.entered.notified().await;

        // Second request while the first is unresolved: refused, no call.
        let err = run_generation(
            registry.clone(),
            client.clone(),
            id,
            user,
            ArtifactKind::JobPost,
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        client.release.notify_one();
        let artifact = first.await.unwrap().unwrap();
        assert_eq!(artifact.text, "Generated post");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_completion_for_closed_session_is_dropped() {
        let user = UserContext {
            user_id: Uuid::new_v4(),
        };
        let registry = Arc::new(SessionRegistry::new());
        let client = Arc::new(BlockingClient::new("Generated post"));
        let id = open_session(&registry, user).await;

        let task = tokio::spawn(run_generation(
            registry.clone(),
            client.clone(),
            id,
            user,
            ArtifactKind::JobPost,
            false,
        ));
        client.entered.notified().await;

        // The user closes the wizard mid-generation.
        registry.remove(id).await;
        client.release.notify_one();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_successful_generation_updates_artifact() {
        let user = UserContext {
            user_id: Uuid::new_v4(),
        };
        let registry = Arc::new(SessionRegistry::new());
        let client = Arc::new(ImmediateClient::ok("We are hiring a backend engineer."));
        let id = open_session(&registry, user).await;

        let artifact = run_generation(
            registry.clone(),
            client.clone(),
            id,
            user,
            ArtifactKind::JobPost,
            false,
        )
        .await
        .unwrap();
        assert_eq!(artifact.status, ArtifactStatus::Succeeded);
        assert_eq!(artifact.text, "We are hiring a backend engineer.");
    }

    #[tokio::test]
    async fn test_malformed_skills_test_fails_and_preserves_job_post() {
        let user = UserContext {
            user_id: Uuid::new_v4(),
        };
        let registry = Arc::new(SessionRegistry::new());
        let id = open_session(&registry, user).await;
        registry
            .with(id, |s| {
                s.artifacts.job_post.text = "We are hiring".to_string();
            })
            .await
            .unwrap();

        let client = Arc::new(ImmediateClient::ok("this is not a question array"));
        let artifact = run_generation(
            registry.clone(),
            client,
            id,
            user,
            ArtifactKind::SkillsTest,
            false,
        )
        .await
        .unwrap();
        assert_eq!(artifact.status, ArtifactStatus::Failed);
        assert!(artifact.error.unwrap().contains("malformed"));

        let job_post = registry
            .with(id, |s| s.artifacts.job_post.text.clone())
            .await
            .unwrap();
        assert_eq!(job_post, "We are hiring");
    }

    #[tokio::test]
    async fn test_skills_test_without_job_post_fails_fast() {
        let user = UserContext {
            user_id: Uuid::new_v4(),
        };
        let registry = Arc::new(SessionRegistry::new());
        let client = Arc::new(ImmediateClient::err("should never be called"));
        let id = open_session(&registry, user).await;

        let err = run_generation(
            registry.clone(),
            client.clone(),
            id,
            user,
            ArtifactKind::SkillsTest,
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
        // Refused before the request was issued.
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_skills_test_passes_strict_decoding() {
        let user = UserContext {
            user_id: Uuid::new_v4(),
        };
        let registry = Arc::new(SessionRegistry::new());
        let id = open_session(&registry, user).await;
        registry
            .with(id, |s| {
                s.artifacts.job_post.text = "We are hiring".to_string();
            })
            .await
            .unwrap();

        let questions = r#"[{"type": "text", "id": "q1", "prompt": "Explain ownership."}]"#;
        let client = Arc::new(ImmediateClient::ok(questions));
        let artifact = run_generation(
            registry.clone(),
            client,
            id,
            user,
            ArtifactKind::SkillsTest,
            false,
        )
        .await
        .unwrap();
        assert_eq!(artifact.status, ArtifactStatus::Succeeded);
        assert_eq!(artifact.text, questions);
    }
}
