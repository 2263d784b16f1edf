//! Issue tracker
//!
//! Issues are reported against an existing task. Creation and updates are
//! announced so the task's assignee hears about them.

use crate::error::{EntityKind, WorkflowError, WorkflowResult};
use crate::events::{EventSink, WorkflowEvent};
use crate::store::{IssueFilter, Store};
use crate::types::{deserialize_opt_ref, non_blank, Actor, Issue, IssueId, IssueStatus, Priority, TaskId};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

/// Input for issue creation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub task: Option<TaskId>,
    pub priority: Option<Priority>,
}

/// Field-level issue edit
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<IssueStatus>,
    pub priority: Option<Priority>,
}

/// Issue CRUD with change announcements
#[derive(Clone)]
pub struct IssueService {
    store: Arc<dyn Store>,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for IssueService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueService").finish_non_exhaustive()
    }
}

impl IssueService {
    /// Create new service; issue events go to `events`
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn Store>, events: Arc<dyn EventSink>) -> Self {
        Self { store, events }
    }

    /// Report an issue against a task
    ///
    /// # Errors
    /// - `Validation` if title, description or task is missing
    /// - `NotFound` if the task is absent
    pub async fn create_issue(&self, draft: IssueDraft, actor: &Actor) -> WorkflowResult<Issue> {
        let (Some(title), Some(description), Some(task_id)) = (
            non_blank(draft.title),
            non_blank(draft.description),
            draft.task,
        ) else {
            return Err(WorkflowError::validation(
                "Please provide title, description, and task",
            ));
        };
        let task = self
            .store
            .task(task_id)
            .await?
            .ok_or(WorkflowError::not_found(EntityKind::Task))?;

        let issue = self
            .store
            .insert_issue(Issue {
                id: IssueId::new(),
                title,
                description,
                task: task_id,
                reported_by: actor.id,
                status: IssueStatus::Open,
                priority: draft.priority.unwrap_or_default(),
                created_at: Utc::now(),
            })
            .await?;
        tracing::info!(issue = %issue.id, task = %task_id, actor = %actor.id, "issue reported");

        self.events
            .emit(WorkflowEvent::IssueCreated {
                issue: issue.clone(),
                task,
            })
            .await;
        Ok(issue)
    }

    /// Issues matching `filter`
    pub async fn list_issues(&self, filter: IssueFilter) -> WorkflowResult<Vec<Issue>> {
        Ok(self.store.issues(filter).await?)
    }

    /// # Errors
    /// - `NotFound` if absent
    pub async fn get_issue(&self, id: IssueId) -> WorkflowResult<Issue> {
        self.store
            .issue(id)
            .await?
            .ok_or(WorkflowError::not_found(EntityKind::Issue))
    }

    /// Apply a field-level edit
    ///
    /// The announcement is skipped when the parent task no longer exists.
    ///
    /// # Errors
    /// - `NotFound` if absent
    /// - `Validation` on blank text fields
    pub async fn update_issue(
        &self,
        id: IssueId,
        patch: IssuePatch,
        actor: &Actor,
    ) -> WorkflowResult<Issue> {
        let mut issue = self.get_issue(id).await?;
        if let Some(title) = patch.title {
            issue.title = non_blank(Some(title))
                .ok_or_else(|| WorkflowError::validation("Issue title cannot be empty"))?;
        }
        if let Some(description) = patch.description {
            issue.description = non_blank(Some(description))
                .ok_or_else(|| WorkflowError::validation("Issue description cannot be empty"))?;
        }
        if let Some(status) = patch.status {
            issue.status = status;
        }
        if let Some(priority) = patch.priority {
            issue.priority = priority;
        }

        let issue = self.store.update_issue(issue).await?;
        tracing::info!(issue = %issue.id, actor = %actor.id, "issue updated");

        match self.store.task(issue.task).await {
            Ok(Some(task)) => {
                self.events
                    .emit(WorkflowEvent::IssueUpdated {
                        issue: issue.clone(),
                        task,
                    })
                    .await;
            }
            Ok(None) => tracing::debug!(issue = %issue.id, task = %issue.task, "parent task gone"),
            Err(e) => tracing::warn!(issue = %issue.id, task = %issue.task, "parent task lookup failed, notification skipped: {}", e),
        }
        Ok(issue)
    }

    /// Hard delete
    ///
    /// # Errors
    /// - `NotFound` if absent
    pub async fn delete_issue(&self, id: IssueId, actor: &Actor) -> WorkflowResult<()> {
        self.store.delete_issue(id).await?;
        tracing::info!(issue = %id, actor = %actor.id, "issue deleted");
        Ok(())
    }
}
