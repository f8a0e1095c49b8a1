use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Draft,
    Active,
    Paused,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Active => "active",
            JobStatus::Paused => "paused",
            JobStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(JobStatus::Draft),
            "active" => Some(JobStatus::Active),
            "paused" => Some(JobStatus::Paused),
            "closed" => Some(JobStatus::Closed),
            _ => None,
        }
    }

    /// Only active postings accept new applications.
    pub fn accepts_applications(&self) -> bool {
        matches!(self, JobStatus::Active)
    }
}

/// Optional structured location attached to a job posting.
/// Merged one level deep in the wizard draft; stored as JSONB.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub remote: bool,
}

/// A persisted job posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    pub description: String,
    pub employment_type: String,
    pub experience_level: String,
    pub skills: Vec<String>,
    pub status: JobStatus,
    /// Combined display string, e.g. "$2,000 - $5,000" or "Up to $5,000".
    /// See `wizard::draft::format_budget_range` for the derivation rule.
    pub budget_range: Option<String>,
    pub duration: Option<String>,
    pub location: Option<JobLocation>,
    /// Generated (or source-verbatim) job post text shown to candidates.
    pub job_post: Option<String>,
    /// Generated skills test, stored as a JSON array of questions.
    pub skills_test: Option<String>,
    /// Generated interview questions, stored as a JSON array of questions.
    pub interview_questions: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields written on job creation or update. The record store writes all
/// of them in a single statement so a failed write leaves nothing behind.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJobRecord {
    pub employer_id: Uuid,
    pub title: String,
    pub description: String,
    pub employment_type: String,
    pub experience_level: String,
    pub skills: Vec<String>,
    pub status: JobStatus,
    pub budget_range: Option<String>,
    pub duration: Option<String>,
    pub location: Option<JobLocation>,
    pub job_post: Option<String>,
    pub skills_test: Option<String>,
    pub interview_questions: Option<String>,
}
