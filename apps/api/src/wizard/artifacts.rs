//! Generated artifacts and the content generation gate.
//!
//! Each wizard session carries up to three generated artifacts (job post,
//! skills test, interview questions). The gate enforces at most one
//! in-flight generation per artifact kind, preserves prior content on
//! failure, and requires explicit confirmation before regenerating over a
//! manual edit. Completions carry an epoch so a response arriving for a
//! superseded request is dropped.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::wizard::WizardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    JobPost,
    SkillsTest,
    InterviewQuestions,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::JobPost => "job-post",
            ArtifactKind::SkillsTest => "skills-test",
            ArtifactKind::InterviewQuestions => "interview-questions",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    #[default]
    NotStarted,
    InFlight,
    Succeeded,
    Failed,
}

/// One generated text artifact and its generation state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GeneratedArtifact {
    /// Last good content. Preserved across failed regeneration attempts.
    pub text: String,
    pub status: ArtifactStatus,
    /// Set when the user manually edits the text; regeneration must then
    /// be explicitly confirmed so edits are never silently discarded.
    pub edited: bool,
    pub error: Option<String>,
    #[serde(skip)]
    epoch: u64,
}

impl GeneratedArtifact {
    /// An artifact rehydrated from previously stored content.
    pub fn from_stored(text: String) -> Self {
        Self {
            text,
            status: ArtifactStatus::Succeeded,
            ..Self::default()
        }
    }

    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Handle returned by `begin`; required to complete the matching request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket {
    pub kind: ArtifactKind,
    epoch: u64,
}

/// All artifacts of one wizard session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactSet {
    pub job_post: GeneratedArtifact,
    pub skills_test: GeneratedArtifact,
    pub interview_questions: GeneratedArtifact,
}

impl ArtifactSet {
    pub fn get(&self, kind: ArtifactKind) -> &GeneratedArtifact {
        match kind {
            ArtifactKind::JobPost => &self.job_post,
            ArtifactKind::SkillsTest => &self.skills_test,
            ArtifactKind::InterviewQuestions => &self.interview_questions,
        }
    }

    fn get_mut(&mut self, kind: ArtifactKind) -> &mut GeneratedArtifact {
        match kind {
            ArtifactKind::JobPost => &mut self.job_post,
            ArtifactKind::SkillsTest => &mut self.skills_test,
            ArtifactKind::InterviewQuestions => &mut self.interview_questions,
        }
    }

    pub fn is_in_flight(&self, kind: ArtifactKind) -> bool {
        self.get(kind).status == ArtifactStatus::InFlight
    }

    pub fn any_in_flight(&self) -> bool {
        [
            ArtifactKind::JobPost,
            ArtifactKind::SkillsTest,
            ArtifactKind::InterviewQuestions,
        ]
        .into_iter()
        .any(|k| self.is_in_flight(k))
    }

    /// Admits a generation request for `kind`, or refuses it before any
    /// network call is issued.
    ///
    /// Refusals: a request for the same kind is in flight; the current
    /// text was manually edited and `force` is false; the skills test is
    /// requested before a non-empty job post exists.
    pub fn begin(
        &mut self,
        kind: ArtifactKind,
        force: bool,
    ) -> Result<GenerationTicket, WizardError> {
        if self.is_in_flight(kind) {
            return Err(WizardError::GenerationInFlight(kind));
        }
        if self.get(kind).edited && !force {
            return Err(WizardError::EditedContent(kind));
        }
        if kind == ArtifactKind::SkillsTest && !self.job_post.has_content() {
            return Err(WizardError::MissingPrerequisite {
                artifact: ArtifactKind::SkillsTest,
                prerequisite: ArtifactKind::JobPost,
            });
        }

        let artifact = self.get_mut(kind);
        artifact.epoch += 1;
        artifact.status = ArtifactStatus::InFlight;
        artifact.error = None;
        Ok(GenerationTicket {
            kind,
            epoch: artifact.epoch,
        })
    }

    /// Applies the outcome of the request identified by `ticket`.
    ///
    /// A stale ticket (the session was reset or a newer request was
    /// admitted) is a no-op. On success the content is replaced wholesale;
    /// on failure the prior content is kept and only the status changes.
    pub fn complete(&mut self, ticket: GenerationTicket, outcome: Result<String, String>) {
        let artifact = self.get_mut(ticket.kind);
        if artifact.epoch != ticket.epoch || artifact.status != ArtifactStatus::InFlight {
            return;
        }
        match outcome {
            Ok(text) => {
                artifact.text = text;
                artifact.status = ArtifactStatus::Succeeded;
                artifact.edited = false;
                artifact.error = None;
            }
            Err(reason) => {
                // Prior text stays in place; the status reports the attempt.
                artifact.status = ArtifactStatus::Failed;
                artifact.error = Some(reason);
            }
        }
    }

    /// Records a manual edit. Non-destructive: marks the artifact edited
    /// so later regeneration requires confirmation.
    pub fn apply_edit(&mut self, kind: ArtifactKind, text: String) -> Result<(), WizardError> {
        if self.is_in_flight(kind) {
            return Err(WizardError::GenerationInFlight(kind));
        }
        let artifact = self.get_mut(kind);
        artifact.text = text;
        artifact.status = ArtifactStatus::Succeeded;
        artifact.edited = true;
        artifact.error = None;
        Ok(())
    }

    pub fn reset(&mut self) {
        // Epochs advance so completions for the old session are dropped.
        for kind in [
            ArtifactKind::JobPost,
            ArtifactKind::SkillsTest,
            ArtifactKind::InterviewQuestions,
        ] {
            let artifact = self.get_mut(kind);
            let epoch = artifact.epoch + 1;
            *artifact = GeneratedArtifact {
                epoch,
                ..GeneratedArtifact::default()
            };
        }
    }
}
