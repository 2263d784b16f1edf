//! Workflow events
//!
//! The workflow engine and the issue service announce what happened through
//! an [`EventSink`]. They never talk to the fan-out channel directly; the
//! notification dispatcher is the production sink.

use crate::types::{Issue, Task, UserId};
use async_trait::async_trait;

/// Something a notification may be derived from
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    /// Task created with an assignee, or (re)assigned
    TaskAssigned { task: Task, assignee: UserId },
    /// Issue reported against a task
    IssueCreated { issue: Issue, task: Task },
    /// Issue fields changed
    IssueUpdated { issue: Issue, task: Task },
}

impl WorkflowEvent {
    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::TaskAssigned { .. } => "task_assigned",
            WorkflowEvent::IssueCreated { .. } => "issue_created",
            WorkflowEvent::IssueUpdated { .. } => "issue_updated",
        }
    }

    /// Task the event concerns
    #[must_use]
    pub fn task(&self) -> &Task {
        match self {
            WorkflowEvent::TaskAssigned { task, .. }
            | WorkflowEvent::IssueCreated { task, .. }
            | WorkflowEvent::IssueUpdated { task, .. } => task,
        }
    }
}

/// Receiver of workflow events
///
/// `emit` never fails from the caller's point of view; a sink logs its own
/// failures so the triggering request is unaffected.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Handle one event
    async fn emit(&self, event: WorkflowEvent);
}

/// Sink that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardEvents;

#[async_trait]
impl EventSink for DiscardEvents {
    async fn emit(&self, event: WorkflowEvent) {
        tracing::trace!(event = event.name(), "event discarded");
    }
}
