//! Aggregate batch progress.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::JobState;

/// Summary of a batch, recomputed after every poll cycle.
///
/// `completed + failed + in_progress == total` always holds; `in_progress`
/// counts both pending and running jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub in_progress: usize,
    pub breakdown_by_state: BTreeMap<JobState, usize>,
}

impl BatchSummary {
    /// Fold job states into a summary.
    pub fn from_states<I>(states: I) -> Self
    where
        I: IntoIterator<Item = JobState>,
    {
        let mut summary = Self::default();
        for state in states {
            summary.total += 1;
            match state {
                JobState::Completed => summary.completed += 1,
                JobState::Failed => summary.failed += 1,
                JobState::Pending | JobState::Running => summary.in_progress += 1,
            }
            *summary.breakdown_by_state.entry(state).or_insert(0) += 1;
        }
        summary
    }

    /// Every job reached a terminal state.
    pub fn is_converged(&self) -> bool {
        self.completed + self.failed == self.total
    }

    /// Number of jobs in the given state.
    pub fn count(&self, state: JobState) -> usize {
        self.breakdown_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Converged with at least one failed scene.
    pub fn is_partial_failure(&self) -> bool {
        self.is_converged() && self.failed > 0
    }

    /// Share of terminal jobs, 0-100.
    pub fn percent_done(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (((self.completed + self.failed) * 100) / self.total) as u8
    }
}
