//! Static step definitions for both wizard kinds.
//!
//! A step's validity predicate is pure and cheap enough to recompute on
//! every field change. A skip predicate reads only the draft, so it gives
//! the same answer on forward and backward navigation.

use serde::{Deserialize, Serialize};

use crate::wizard::artifacts::ArtifactSet;
use crate::wizard::draft::DraftFormState;

pub type ValidityFn = fn(&DraftFormState, &ArtifactSet) -> bool;
pub type SkipFn = fn(&DraftFormState) -> bool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardKind {
    JobCreation,
    Application,
}

/// Static description of one wizard step.
pub struct StepDescriptor {
    pub index: usize,
    pub label: &'static str,
    pub validity: ValidityFn,
    pub skip: Option<SkipFn>,
}

impl StepDescriptor {
    pub fn is_skipped(&self, draft: &DraftFormState) -> bool {
        self.skip.map(|f| f(draft)).unwrap_or(false)
    }
}

pub fn steps_for(kind: WizardKind) -> &'static [StepDescriptor] {
    match kind {
        WizardKind::JobCreation => JOB_CREATION_STEPS,
        WizardKind::Application => APPLICATION_STEPS,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Job creation wizard (employer side, 4 steps)
// ────────────────────────────────────────────────────────────────────────────

static JOB_CREATION_STEPS: &[StepDescriptor] = &[
    StepDescriptor {
        index: 0,
        label: "Basics",
        validity: job_basics_valid,
        skip: None,
    },
    StepDescriptor {
        index: 1,
        label: "Details",
        validity: job_details_valid,
        skip: None,
    },
    StepDescriptor {
        index: 2,
        label: "Job post content",
        validity: job_content_valid,
        skip: Some(source_used_verbatim),
    },
    StepDescriptor {
        index: 3,
        label: "Review",
        validity: always_valid,
        skip: None,
    },
];

/// Title non-empty, plus either a hand-written description or extracted
/// source content to stand in for one.
fn job_basics_valid(draft: &DraftFormState, _artifacts: &ArtifactSet) -> bool {
    draft.has_text("title") && (draft.has_text("description") || draft.has_text("source_content"))
}

fn job_details_valid(draft: &DraftFormState, _artifacts: &ArtifactSet) -> bool {
    draft.has_text("employment_type")
        && draft.has_text("experience_level")
        && !draft.string_list("skills").is_empty()
}

fn job_content_valid(_draft: &DraftFormState, artifacts: &ArtifactSet) -> bool {
    artifacts.job_post.has_content()
}

/// The employer supplied source content and chose to use it verbatim, so
/// the generation step is bypassed in both directions.
fn source_used_verbatim(draft: &DraftFormState) -> bool {
    draft.bool_field("use_source_verbatim") && draft.has_text("source_content")
}

// ────────────────────────────────────────────────────────────────────────────
// Application wizard (candidate side, up to 5 steps)
// ────────────────────────────────────────────────────────────────────────────

static APPLICATION_STEPS: &[StepDescriptor] = &[
    StepDescriptor {
        index: 0,
        label: "Personal info",
        validity: personal_info_valid,
        skip: None,
    },
    StepDescriptor {
        index: 1,
        label: "Resume",
        validity: resume_valid,
        skip: None,
    },
    StepDescriptor {
        index: 2,
        label: "Skills assessment",
        validity: assessment_valid,
        skip: Some(no_skills_test),
    },
    StepDescriptor {
        index: 3,
        label: "Video interview",
        validity: interview_valid,
        skip: Some(no_interview_questions),
    },
    StepDescriptor {
        index: 4,
        label: "Review",
        validity: always_valid,
        skip: None,
    },
];

fn personal_info_valid(draft: &DraftFormState, _artifacts: &ArtifactSet) -> bool {
    draft.has_text("candidate_name")
        && draft
            .str_field("email")
            .map(|e| e.contains('@') && !e.trim().is_empty())
            .unwrap_or(false)
}

fn resume_valid(draft: &DraftFormState, _artifacts: &ArtifactSet) -> bool {
    draft.has_text("resume_url")
}

/// At least half of the assessment questions carry a non-blank answer.
fn assessment_valid(draft: &DraftFormState, _artifacts: &ArtifactSet) -> bool {
    let questions = draft.string_list("assessment_questions");
    if questions.is_empty() {
        return true;
    }
    let answers = draft.object("assessment_answers");
    let answered = questions
        .iter()
        .filter(|q| {
            answers
                .and_then(|a| a.get(q.as_str()))
                .and_then(|v| v.as_str())
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false)
        })
        .count();
    answered * 2 >= questions.len()
}

/// Every interview question has an uploaded video.
fn interview_valid(draft: &DraftFormState, _artifacts: &ArtifactSet) -> bool {
    let questions = draft.string_list("interview_questions");
    let videos = draft.object("interview_videos");
    questions.iter().all(|q| {
        videos
            .and_then(|v| v.get(q.as_str()))
            .and_then(|v| v.as_str())
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    })
}

fn no_skills_test(draft: &DraftFormState) -> bool {
    draft.string_list("assessment_questions").is_empty()
}

fn no_interview_questions(draft: &DraftFormState) -> bool {
    draft.string_list("interview_questions").is_empty()
}

/// Purely informational steps have no required fields.
fn always_valid(_draft: &DraftFormState, _artifacts: &ArtifactSet) -> bool {
    true
}
