//! Bulk email to applicants, with template variable substitution.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::auth::UserContext;
use crate::errors::AppError;
use crate::store::RecordStore;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email delivery failed: {0}")]
    Delivery(String),
}

/// Variables substituted into subject and body templates.
pub struct TemplateVars<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub position: &'a str,
    pub company: &'a str,
}

/// Replaces `{name}`, `{email}`, `{position}`, and `{company}` in a
/// template. Unknown placeholders pass through verbatim.
pub fn render_template(template: &str, vars: &TemplateVars<'_>) -> String {
    template
        .replace("{name}", vars.name)
        .replace("{email}", vars.email)
        .replace("{position}", vars.position)
        .replace("{company}", vars.company)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send_bulk(
        &self,
        emails: &[RenderedEmail],
        reply_to: &str,
    ) -> Result<(), EmailError>;
}

/// Production client posting to the hosted `send-bulk-email` function.
pub struct HttpEmailClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEmailClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl EmailClient for HttpEmailClient {
    async fn send_bulk(
        &self,
        emails: &[RenderedEmail],
        reply_to: &str,
    ) -> Result<(), EmailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({
                "emails": emails,
                "reply_to_email": reply_to,
            }))
            .send()
            .await
            .map_err(|e| EmailError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Delivery(format!("{status}: {body}")));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkEmailRequest {
    pub job_id: Uuid,
    pub application_ids: Vec<Uuid>,
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub template_id: Option<String>,
    pub company_name: String,
    pub reply_to_email: String,
}

#[derive(Debug, Serialize)]
pub struct BulkEmailResponse {
    pub sent: usize,
}

/// Renders one email per selected application and delivers the batch.
/// Only the employer who posted the job may email its applicants.
pub async fn send_bulk_email(
    store: &Arc<dyn RecordStore>,
    client: &Arc<dyn EmailClient>,
    user: &UserContext,
    request: BulkEmailRequest,
) -> Result<BulkEmailResponse, AppError> {
    let job = store
        .get_job(request.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", request.job_id)))?;
    if job.employer_id != user.user_id {
        return Err(AppError::Unauthorized);
    }

    let mut emails = Vec::with_capacity(request.application_ids.len());
    for id in &request.application_ids {
        let application = store
            .get_application(*id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
        if application.job_id != job.id {
            return Err(AppError::Validation(format!(
                "Application {id} does not belong to job {}",
                job.id
            )));
        }

        let vars = TemplateVars {
            name: &application.candidate_name,
            email: &application.email,
            position: &job.title,
            company: &request.company_name,
        };
        emails.push(RenderedEmail {
            to: application.email.clone(),
            subject: render_template(&request.subject, &vars),
            body: render_template(&request.content, &vars),
        });
    }

    if emails.is_empty() {
        return Err(AppError::Validation(
            "No applications selected".to_string(),
        ));
    }

    client
        .send_bulk(&emails, &request.reply_to_email)
        .await
        .map_err(|e| AppError::Email(e.to_string()))?;

    info!(
        "Sent {} emails for job '{}' (template {:?})",
        emails.len(),
        job.title,
        request.template_id
    );
    Ok(BulkEmailResponse { sent: emails.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::models::application::{ApplicationStatus, NewApplicationRecord};
    use crate::models::job::{JobStatus, NewJobRecord};
    use crate::store::memory::MemoryRecordStore;

    #[derive(Default)]
    struct RecordingEmailClient {
        sent: Mutex<Vec<RenderedEmail>>,
    }

    #[async_trait]
    impl EmailClient for RecordingEmailClient {
        async fn send_bulk(
            &self,
            emails: &[RenderedEmail],
            _reply_to: &str,
        ) -> Result<(), EmailError> {
            self.sent.lock().unwrap().extend_from_slice(emails);
            Ok(())
        }
    }

    #[test]
    fn test_render_template_substitutes_all_variables() {
        let vars = TemplateVars {
            name: "Ada",
            email: "ada@example.com",
            position: "Backend Engineer",
            company: "Initech",
        };
        let rendered = render_template(
            "Hi {name} ({email}), about the {position} role at {company}.",
            &vars,
        );
        assert_eq!(
            rendered,
            "Hi Ada (ada@example.com), about the Backend Engineer role at Initech."
        );
    }

    #[test]
    fn test_render_template_leaves_unknown_placeholders() {
        let vars = TemplateVars {
            name: "Ada",
            email: "a@b.c",
            position: "SRE",
            company: "Initech",
        };
        assert_eq!(render_template("{name} {salary}", &vars), "Ada {salary}");
    }

    #[tokio::test]
    async fn test_bulk_email_renders_per_recipient() {
        let memory = Arc::new(MemoryRecordStore::new());
        let store: Arc<dyn RecordStore> = memory.clone();
        let recording = Arc::new(RecordingEmailClient::default());
        let client: Arc<dyn EmailClient> = recording.clone();

        let employer = Uuid::new_v4();
        let job = memory
            .insert_job(NewJobRecord {
                employer_id: employer,
                title: "Backend Engineer".to_string(),
                description: "Build APIs".to_string(),
                employment_type: "full-time".to_string(),
                experience_level: "mid-level".to_string(),
                skills: vec![],
                status: JobStatus::Active,
                budget_range: None,
                duration: None,
                location: None,
                job_post: None,
                skills_test: None,
                interview_questions: None,
            })
            .await
            .unwrap();

        let mut ids = Vec::new();
        for (name, email) in [("Ada", "ada@example.com"), ("Grace", "grace@example.com")] {
            let app = memory
                .insert_application(NewApplicationRecord {
                    job_id: job.id,
                    candidate_name: name.to_string(),
                    email: email.to_string(),
                    status: ApplicationStatus::Pending,
                    resume_url: None,
                    cover_letter: None,
                    answers: Default::default(),
                    test_responses: None,
                })
                .await
                .unwrap();
            ids.push(app.id);
        }

        let response = send_bulk_email(
            &store,
            &client,
            &UserContext { user_id: employer },
            BulkEmailRequest {
                job_id: job.id,
                application_ids: ids,
                subject: "Update on {position}".to_string(),
                content: "Hi {name}, thanks for applying to {company}.".to_string(),
                template_id: None,
                company_name: "Initech".to_string(),
                reply_to_email: "jobs@initech.test".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(response.sent, 2);
        let sent = recording.sent.lock().unwrap();
        assert_eq!(sent[0].subject, "Update on Backend Engineer");
        assert_eq!(sent[0].body, "Hi Ada, thanks for applying to Initech.");
        assert_eq!(sent[1].to, "grace@example.com");
    }

    #[tokio::test]
    async fn test_bulk_email_rejects_cross_job_application() {
        let memory = Arc::new(MemoryRecordStore::new());
        let store: Arc<dyn RecordStore> = memory.clone();
        let client: Arc<dyn EmailClient> = Arc::new(RecordingEmailClient::default());

        let employer = Uuid::new_v4();
        let make_job = |title: &str| NewJobRecord {
            employer_id: employer,
            title: title.to_string(),
            description: "d".to_string(),
            employment_type: "full-time".to_string(),
            experience_level: "mid-level".to_string(),
            skills: vec![],
            status: JobStatus::Active,
            budget_range: None,
            duration: None,
            location: None,
            job_post: None,
            skills_test: None,
            interview_questions: None,
        };
        let job_a = memory.insert_job(make_job("A")).await.unwrap();
        let job_b = memory.insert_job(make_job("B")).await.unwrap();
        let app = memory
            .insert_application(NewApplicationRecord {
                job_id: job_b.id,
                candidate_name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                status: ApplicationStatus::Pending,
                resume_url: None,
                cover_letter: None,
                answers: Default::default(),
                test_responses: None,
            })
            .await
            .unwrap();

        let err = send_bulk_email(
            &store,
            &client,
            &UserContext { user_id: employer },
            BulkEmailRequest {
                job_id: job_a.id,
                application_ids: vec![app.id],
                subject: "s".to_string(),
                content: "c".to_string(),
                template_id: None,
                company_name: "Initech".to_string(),
                reply_to_email: "jobs@initech.test".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = send_bulk_email(
            &store,
            &client,
            &UserContext {
                user_id: Uuid::new_v4(),
            },
            BulkEmailRequest {
                job_id: job_a.id,
                application_ids: vec![app.id],
                subject: "s".to_string(),
                content: "c".to_string(),
                template_id: None,
                company_name: "Initech".to_string(),
                reply_to_email: "jobs@initech.test".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }
}
