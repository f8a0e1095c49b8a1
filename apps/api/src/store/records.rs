//! Record store — the single shared resource behind the wizards.
//!
//! Each create or update is one SQL statement, so a failed call leaves no
//! partial record visible to the rest of the system. Conflict detection
//! for two sessions editing the same record is intentionally absent.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::models::application::{ApplicationRecord, ApplicationStatus, NewApplicationRecord};
use crate::models::job::{JobRecord, JobStatus, NewJobRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record {0} not found")]
    NotFound(Uuid),

    #[error("write rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_job(&self, new: NewJobRecord) -> Result<JobRecord, StoreError>;
    async fn update_job(&self, id: Uuid, new: NewJobRecord) -> Result<JobRecord, StoreError>;
    async fn get_job(&self, id: Uuid) -> Result<Option<JobRecord>, StoreError>;
    async fn list_jobs(&self, employer_id: Uuid) -> Result<Vec<JobRecord>, StoreError>;

    async fn insert_application(
        &self,
        new: NewApplicationRecord,
    ) -> Result<ApplicationRecord, StoreError>;
    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRecord>, StoreError>;
    async fn list_applications(&self, job_id: Uuid) -> Result<Vec<ApplicationRecord>, StoreError>;
    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<(), StoreError>;
    async fn set_application_rating(
        &self,
        id: Uuid,
        rating: Option<i16>,
    ) -> Result<(), StoreError>;
}

/// PostgreSQL-backed record store.
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert_job(&self, new: NewJobRecord) -> Result<JobRecord, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO jobs
                (id, employer_id, title, description, employment_type, experience_level,
                 skills, status, budget_range, duration, location,
                 job_post, skills_test, interview_questions, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.employer_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.employment_type)
        .bind(&new.experience_level)
        .bind(serde_json::to_value(&new.skills).unwrap_or_default())
        .bind(new.status.as_str())
        .bind(&new.budget_range)
        .bind(&new.duration)
        .bind(
            new.location
                .as_ref()
                .map(|l| serde_json::to_value(l).unwrap_or_default()),
        )
        .bind(&new.job_post)
        .bind(&new.skills_test)
        .bind(&new.interview_questions)
        .fetch_one(&self.pool)
        .await?;

        map_job_row(&row)
    }

    async fn update_job(&self, id: Uuid, new: NewJobRecord) -> Result<JobRecord, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE jobs SET
                title = $2, description = $3, employment_type = $4, experience_level = $5,
                skills = $6, status = $7, budget_range = $8, duration = $9, location = $10,
                job_post = $11, skills_test = $12, interview_questions = $13
            WHERE id = $1 AND employer_id = $14
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.employment_type)
        .bind(&new.experience_level)
        .bind(serde_json::to_value(&new.skills).unwrap_or_default())
        .bind(new.status.as_str())
        .bind(&new.budget_range)
        .bind(&new.duration)
        .bind(
            new.location
                .as_ref()
                .map(|l| serde_json::to_value(l).unwrap_or_default()),
        )
        .bind(&new.job_post)
        .bind(&new.skills_test)
        .bind(&new.interview_questions)
        .bind(new.employer_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => map_job_row(&row),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_job_row).transpose()
    }

    async fn list_jobs(&self, employer_id: Uuid) -> Result<Vec<JobRecord>, StoreError> {
        let rows =
            sqlx::query("SELECT * FROM jobs WHERE employer_id = $1 ORDER BY created_at DESC")
                .bind(employer_id)
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(map_job_row).collect()
    }

    async fn insert_application(
        &self,
        new: NewApplicationRecord,
    ) -> Result<ApplicationRecord, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO applications
                (id, job_id, candidate_name, email, status, resume_url, cover_letter,
                 answers, test_responses, rating, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NULL, now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.job_id)
        .bind(&new.candidate_name)
        .bind(&new.email)
        .bind(new.status.as_str())
        .bind(&new.resume_url)
        .bind(&new.cover_letter)
        .bind(serde_json::to_value(&new.answers).unwrap_or_default())
        .bind(&new.test_responses)
        .fetch_one(&self.pool)
        .await?;

        map_application_row(&row)
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_application_row).transpose()
    }

    async fn list_applications(&self, job_id: Uuid) -> Result<Vec<ApplicationRecord>, StoreError> {
        let rows =
            sqlx::query("SELECT * FROM applications WHERE job_id = $1 ORDER BY created_at DESC")
                .bind(job_id)
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(map_application_row).collect()
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE applications SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn set_application_rating(
        &self,
        id: Uuid,
        rating: Option<i16>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE applications SET rating = $2 WHERE id = $1")
            .bind(id)
            .bind(rating)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

fn map_job_row(row: &PgRow) -> Result<JobRecord, StoreError> {
    let status_str: String = row.try_get("status")?;
    let status = JobStatus::parse(&status_str)
        .ok_or_else(|| StoreError::Rejected(format!("unknown job status '{status_str}'")))?;

    let skills: serde_json::Value = row.try_get("skills")?;
    let location: Option<serde_json::Value> = row.try_get("location")?;

    Ok(JobRecord {
        id: row.try_get("id")?,
        employer_id: row.try_get("employer_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        employment_type: row.try_get("employment_type")?,
        experience_level: row.try_get("experience_level")?,
        skills: serde_json::from_value(skills).unwrap_or_default(),
        status,
        budget_range: row.try_get("budget_range")?,
        duration: row.try_get("duration")?,
        location: location.and_then(|v| serde_json::from_value(v).ok()),
        job_post: row.try_get("job_post")?,
        skills_test: row.try_get("skills_test")?,
        interview_questions: row.try_get("interview_questions")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn map_application_row(row: &PgRow) -> Result<ApplicationRecord, StoreError> {
    let status_str: String = row.try_get("status")?;
    let status = ApplicationStatus::parse(&status_str).ok_or_else(|| {
        StoreError::Rejected(format!("unknown application status '{status_str}'"))
    })?;

    let answers: serde_json::Value = row.try_get("answers")?;
    let answers: BTreeMap<String, String> = serde_json::from_value(answers).unwrap_or_default();

    Ok(ApplicationRecord {
        id: row.try_get("id")?,
        job_id: row.try_get("job_id")?,
        candidate_name: row.try_get("candidate_name")?,
        email: row.try_get("email")?,
        status,
        resume_url: row.try_get("resume_url")?,
        cover_letter: row.try_get("cover_letter")?,
        answers,
        test_responses: row.try_get("test_responses")?,
        rating: row.try_get("rating")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}
