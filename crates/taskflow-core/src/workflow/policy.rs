//! Task authorization policy
//!
//! Both update paths (full edit and status-only) are decided here, keyed by
//! the actor, the stored task and the set of fields being changed.

use super::TaskPatch;
use crate::error::{WorkflowError, WorkflowResult};
use crate::types::{Actor, Task};

/// Kind of change requested on a task
#[derive(Debug, Clone, Copy)]
pub enum TaskChange<'a> {
    /// Dedicated status endpoint
    Status,
    /// Dedicated assignment endpoint
    Assign,
    /// Field-level edit
    Edit(&'a TaskPatch),
}

/// Decide whether `actor` may apply `change` to `task`.
///
/// - Status changes: the assignee only, whatever the role.
/// - Assignment: the creator or any manager.
/// - Edits: the creator or any manager; the assignee when only `status`
///   is touched.
///
/// # Errors
/// - `WorkflowError::Authorization` when the change is not allowed
pub fn authorize_task_change(actor: &Actor, task: &Task, change: TaskChange<'_>) -> WorkflowResult<()> {
    let is_assignee = task.assigned_to == Some(actor.id);
    let is_owner = actor.id == task.created_by || actor.is_manager();
    match change {
        TaskChange::Status if is_assignee => Ok(()),
        TaskChange::Status => Err(WorkflowError::forbidden(
            "You can only update tasks assigned to you",
        )),
        TaskChange::Assign | TaskChange::Edit(_) if is_owner => Ok(()),
        TaskChange::Assign => Err(WorkflowError::forbidden(
            "Only the task creator or a manager can assign this task",
        )),
        TaskChange::Edit(patch) if is_assignee && patch.touches_only_status() => Ok(()),
        TaskChange::Edit(_) => Err(WorkflowError::forbidden(
            "Only the task creator or a manager can edit this task",
        )),
    }
}
