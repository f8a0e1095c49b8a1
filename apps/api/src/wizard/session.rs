//! Wizard session — one open wizard, exclusively owning its draft,
//! artifacts, and step position. Nothing here survives a close: there is
//! no autosave between sessions.

use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::models::assessment::parse_questions;
use crate::models::job::JobRecord;
use crate::wizard::artifacts::{ArtifactSet, GeneratedArtifact};
use crate::wizard::draft::{parse_budget_range, DraftFormState};
use crate::wizard::sequencer::StepSequencer;
use crate::wizard::steps::WizardKind;
use crate::wizard::WizardError;

/// Per-session phase machine: `Editing -> Submitting -> (Editing | closed)`.
/// Closing removes the session from the registry, so there is no explicit
/// closed variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Editing,
    Submitting,
}

pub struct WizardSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: WizardKind,
    /// For the application wizard: the job being applied to.
    /// For the job wizard: the existing record being edited, if any.
    pub job_id: Option<Uuid>,
    pub draft: DraftFormState,
    pub artifacts: ArtifactSet,
    pub sequencer: StepSequencer,
    pub phase: SessionPhase,
}

impl WizardSession {
    /// Opens an empty job creation wizard.
    pub fn new_job(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind: WizardKind::JobCreation,
            job_id: None,
            draft: DraftFormState::new(),
            artifacts: ArtifactSet::default(),
            sequencer: StepSequencer::new(WizardKind::JobCreation),
            phase: SessionPhase::Editing,
        }
    }

    /// Opens a job wizard pre-populated from an existing record.
    pub fn for_job_edit(user_id: Uuid, job: &JobRecord) -> Self {
        let mut draft = DraftFormState::new();
        draft.update("title", json!(job.title));
        draft.update("description", json!(job.description));
        draft.update("employment_type", json!(job.employment_type));
        draft.update("experience_level", json!(job.experience_level));
        draft.update("skills", json!(job.skills));
        if let Some(duration) = &job.duration {
            draft.update("duration", json!(duration));
        }
        if let Some(location) = &job.location {
            draft.update("location", json!(location));
        }
        if let Some(stored) = &job.budget_range {
            // Split the stored string back into its editable sub-fields.
            let range = parse_budget_range(stored);
            draft.update("budget", json!({"min": range.min, "max": range.max}));
        }

        let mut artifacts = ArtifactSet::default();
        for (slot, stored) in [
            (&mut artifacts.job_post, &job.job_post),
            (&mut artifacts.skills_test, &job.skills_test),
            (&mut artifacts.interview_questions, &job.interview_questions),
        ] {
            if let Some(text) = stored {
                *slot = GeneratedArtifact::from_stored(text.clone());
            }
        }

        Self {
            id: Uuid::new_v4(),
            user_id,
            kind: WizardKind::JobCreation,
            job_id: Some(job.id),
            draft,
            artifacts,
            sequencer: StepSequencer::new(WizardKind::JobCreation),
            phase: SessionPhase::Editing,
        }
    }

    /// Opens an application wizard for a job, seeding the question lists
    /// that drive the skip predicates of the assessment and interview
    /// steps. Malformed stored content seeds no questions, which skips
    /// the corresponding step.
    pub fn new_application(user_id: Uuid, job: &JobRecord) -> Self {
        let mut draft = DraftFormState::new();

        let assessment_ids = question_ids(job.skills_test.as_deref());
        let interview_ids = question_ids(job.interview_questions.as_deref());
        draft.update("assessment_questions", json!(assessment_ids));
        draft.update("interview_questions", json!(interview_ids));

        Self {
            id: Uuid::new_v4(),
            user_id,
            kind: WizardKind::Application,
            job_id: Some(job.id),
            draft,
            artifacts: ArtifactSet::default(),
            sequencer: StepSequencer::new(WizardKind::Application),
            phase: SessionPhase::Editing,
        }
    }

    /// Merges a partial field update into the draft. Refused while a
    /// submission is in flight so the submitted snapshot stays coherent.
    pub fn update_fields(&mut self, partial: Map<String, Value>) -> Result<(), WizardError> {
        if self.phase == SessionPhase::Submitting {
            return Err(WizardError::SubmissionInFlight);
        }
        self.draft.merge(partial);
        Ok(())
    }

    pub fn can_advance(&self) -> bool {
        self.sequencer.can_advance(&self.draft, &self.artifacts)
    }

    pub fn advance(&mut self) -> Result<usize, WizardError> {
        self.sequencer.advance(&self.draft, &self.artifacts)
    }

    pub fn retreat(&mut self) -> Result<usize, WizardError> {
        self.sequencer.retreat(&self.draft)
    }

    pub fn go_to(&mut self, index: usize) -> Result<usize, WizardError> {
        self.sequencer.go_to(index)
    }

    /// Wipes draft and artifacts after a confirmed successful submission.
    pub fn reset(&mut self) {
        self.draft.reset();
        self.artifacts.reset();
        self.sequencer.reset();
        self.phase = SessionPhase::Editing;
    }

    pub fn snapshot(&self) -> SessionView {
        SessionView {
            id: self.id,
            kind: self.kind,
            job_id: self.job_id,
            step: self.sequencer.current(),
            step_label: self.sequencer.current_step().label,
            step_count: self.sequencer.step_count(),
            can_advance: self.can_advance(),
            is_last_step: self.sequencer.is_last(),
            phase: self.phase,
            draft: self.draft.clone(),
            artifacts: self.artifacts.clone(),
        }
    }
}

fn question_ids(stored: Option<&str>) -> Vec<String> {
    stored
        .and_then(|raw| parse_questions(raw).ok())
        .map(|questions| questions.iter().map(|q| q.id().to_string()).collect())
        .unwrap_or_default()
}

/// Serializable snapshot of a session, returned to the client.
#[derive(Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub kind: WizardKind,
    pub job_id: Option<Uuid>,
    pub step: usize,
    pub step_label: &'static str,
    pub step_count: usize,
    pub can_advance: bool,
    pub is_last_step: bool,
    pub phase: SessionPhase,
    pub draft: DraftFormState,
    pub artifacts: ArtifactSet,
}
