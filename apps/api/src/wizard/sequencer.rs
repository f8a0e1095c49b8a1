//! Step sequencer — current position, gated advancement, symmetric skips.

use crate::wizard::artifacts::ArtifactSet;
use crate::wizard::draft::DraftFormState;
use crate::wizard::steps::{steps_for, StepDescriptor, WizardKind};
use crate::wizard::WizardError;

pub struct StepSequencer {
    steps: &'static [StepDescriptor],
    current: usize,
    /// Steps the user has actually landed on. Skipped steps stay false,
    /// which also keeps `go_to` from jumping into a bypassed step.
    visited: Vec<bool>,
}

impl StepSequencer {
    pub fn new(kind: WizardKind) -> Self {
        let steps = steps_for(kind);
        let mut visited = vec![false; steps.len()];
        visited[0] = true;
        Self {
            steps,
            current: 0,
            visited,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> &StepDescriptor {
        &self.steps[self.current]
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_last(&self) -> bool {
        self.current == self.steps.len() - 1
    }

    /// Whether the forward control is enabled: the current step's validity
    /// predicate over the live draft and artifacts. A step whose skip
    /// condition became true while the user is standing on it no longer
    /// applies, so it passes without its validity check.
    pub fn can_advance(&self, draft: &DraftFormState, artifacts: &ArtifactSet) -> bool {
        let step = self.current_step();
        step.is_skipped(draft) || (step.validity)(draft, artifacts)
    }

    /// Moves forward, jumping over any step whose skip predicate holds.
    pub fn advance(
        &mut self,
        draft: &DraftFormState,
        artifacts: &ArtifactSet,
    ) -> Result<usize, WizardError> {
        if !self.can_advance(draft, artifacts) {
            let step = self.current_step();
            return Err(WizardError::StepIncomplete {
                index: step.index,
                label: step.label,
            });
        }

        let mut next = self.current + 1;
        while next < self.steps.len() && self.steps[next].is_skipped(draft) {
            next += 1;
        }
        if next >= self.steps.len() {
            return Err(WizardError::NoNextStep);
        }

        self.current = next;
        self.visited[next] = true;
        Ok(next)
    }

    /// Moves backward, jumping over the same steps `advance` would skip.
    pub fn retreat(&mut self, draft: &DraftFormState) -> Result<usize, WizardError> {
        if self.current == 0 {
            return Err(WizardError::NoPreviousStep);
        }
        let mut prev = self.current - 1;
        while prev > 0 && self.steps[prev].is_skipped(draft) {
            prev -= 1;
        }
        // Step 0 is never skippable by construction.
        self.current = prev;
        Ok(prev)
    }

    /// Jumps directly to a step the user has already passed through, or
    /// stays on the current step. Arbitrary forward jumps are refused.
    pub fn go_to(&mut self, index: usize) -> Result<usize, WizardError> {
        if index == self.current {
            return Ok(index);
        }
        if index >= self.steps.len() || !self.visited[index] {
            return Err(WizardError::ForwardJump(index));
        }
        self.current = index;
        Ok(index)
    }

    pub fn reset(&mut self) {
        self.current = 0;
        self.visited.iter_mut().for_each(|v| *v = false);
        self.visited[0] = true;
    }
}
