//! Status transition tables
//!
//! Which status moves a task may take, independent of who asks for them.

use crate::error::WorkflowError;
use crate::types::TaskStatus;
use serde::{Deserialize, Serialize};

/// Transition table for task status changes.
///
/// `Flat` accepts every transition between the three statuses. `Linear`
/// follows `todos -> in progress -> completed` and allows one step back.
/// Re-applying the current status is always accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusWorkflow {
    #[default]
    Flat,
    Linear,
}

impl StatusWorkflow {
    /// Statuses reachable from `from`, excluding `from` itself
    #[must_use]
    pub fn allowed_transitions(self, from: TaskStatus) -> Vec<TaskStatus> {
        use TaskStatus::*;
        match self {
            StatusWorkflow::Flat => TaskStatus::ALL.into_iter().filter(|s| *s != from).collect(),
            StatusWorkflow::Linear => match from {
                Todos => vec![InProgress],
                InProgress => vec![Completed, Todos],
                Completed => vec![InProgress],
            },
        }
    }

    /// Validate a transition
    ///
    /// # Errors
    /// - `WorkflowError::Validation` if the table forbids it
    pub fn validate_transition(self, from: TaskStatus, to: TaskStatus) -> Result<(), WorkflowError> {
        if from == to || self.allowed_transitions(from).contains(&to) {
            Ok(())
        } else {
            Err(WorkflowError::validation(format!(
                "Cannot move a task from {from:?} to {to:?}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TaskStatus::*;

    #[test]
    fn flat_allows_all_six_transitions() {
        let mut count = 0;
        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                assert!(StatusWorkflow::Flat.validate_transition(from, to).is_ok());
                if from != to {
                    count += 1;
                }
            }
        }
        assert_eq!(count, 6);
        assert!(StatusWorkflow::Flat.validate_transition(Completed, Todos).is_ok());
    }

    #[test]
    fn linear_blocks_skips_and_restarts() {
        let linear = StatusWorkflow::Linear;
        assert!(linear.validate_transition(Todos, InProgress).is_ok());
        assert!(linear.validate_transition(InProgress, Completed).is_ok());
        assert!(linear.validate_transition(Completed, InProgress).is_ok());
        assert!(linear.validate_transition(Todos, Completed).is_err());
        assert!(linear.validate_transition(Completed, Todos).is_err());
        assert!(linear.validate_transition(Completed, Completed).is_ok());
    }
}
