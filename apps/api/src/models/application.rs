use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Review status of a candidate application.
///
/// Transitions are first-class: `can_transition` is the single source of
/// truth, and rating changes never move the status as a side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ApplicationStatus::Pending),
            "reviewed" => Some(ApplicationStatus::Reviewed),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    /// Whether a transition from `self` to `to` is legal.
    ///
    /// Forward moves through the pipeline are allowed, a reviewed or
    /// rejected application can be reopened, and an approval can still be
    /// withdrawn to rejected. Self-transitions are not transitions.
    pub fn can_transition(self, to: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        match (self, to) {
            (Pending, Reviewed) | (Pending, Approved) | (Pending, Rejected) => true,
            (Reviewed, Approved) | (Reviewed, Rejected) | (Reviewed, Pending) => true,
            (Approved, Rejected) => true,
            (Rejected, Pending) => true,
            _ => false,
        }
    }
}

/// A persisted candidate application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_name: String,
    pub email: String,
    pub status: ApplicationStatus,
    pub resume_url: Option<String>,
    pub cover_letter: Option<String>,
    /// Free-text answers keyed by question id.
    pub answers: BTreeMap<String, String>,
    /// Skills-test responses, JSON-serialized as an array.
    pub test_responses: Option<String>,
    /// Manual rating 1-5; clearing it does not touch `status`.
    pub rating: Option<i16>,
    pub created_at: DateTime<Utc>,
}

/// Fields written on application creation, in one atomic statement.
#[derive(Debug, Clone, PartialEq)]
pub struct NewApplicationRecord {
    pub job_id: Uuid,
    pub candidate_name: String,
    pub email: String,
    pub status: ApplicationStatus,
    pub resume_url: Option<String>,
    pub cover_letter: Option<String>,
    pub answers: BTreeMap<String, String>,
    pub test_responses: Option<String>,
}
