//! Multi-step wizard engine.
//!
//! Both wizards in HirePath — the employer's 4-step job creation flow and
//! the candidate's up-to-5-step application flow — are one design: a linear
//! step sequence with per-step validity gates, conditional skip rules that
//! hold in both navigation directions, an in-memory draft aggregate, an
//! at-most-one-in-flight generation gate per artifact, and a submission
//! coordinator with a draft-vs-publish validity asymmetry.

pub mod artifacts;
pub mod draft;
pub mod registry;
pub mod sequencer;
pub mod session;
pub mod steps;
pub mod submission;

use thiserror::Error;

use artifacts::ArtifactKind;

/// Errors produced by the wizard engine. All of them gate UI affordances;
/// none of them destroy session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("step {index} ({label}) is incomplete")]
    StepIncomplete { index: usize, label: &'static str },

    #[error("already on the last step")]
    NoNextStep,

    #[error("already on the first step")]
    NoPreviousStep,

    #[error("cannot jump forward to unvisited step {0}")]
    ForwardJump(usize),

    #[error("a {0} generation is already in flight")]
    GenerationInFlight(ArtifactKind),

    #[error("{0} was manually edited; regeneration requires confirmation")]
    EditedContent(ArtifactKind),

    #[error("cannot generate {artifact}: {prerequisite} is missing or empty")]
    MissingPrerequisite {
        artifact: ArtifactKind,
        prerequisite: ArtifactKind,
    },

    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error("publishing requires all generation to have settled")]
    GenerationUnsettled,

    #[error("no authenticated user for this session")]
    MissingUser,
}
