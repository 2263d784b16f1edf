//! Task workflow engine
//!
//! Owns the task lifecycle:
//! - Creation (validation, defaults, assignment event)
//! - Field edits and explicit (re)assignment
//! - Status changes guarded by the assignee rule and the transition table
//! - Hard deletion
//!
//! Events go to an [`EventSink`]; the engine has no knowledge of how
//! notifications are stored or delivered.

mod policy;
mod status;

pub use policy::{authorize_task_change, TaskChange};
pub use status::StatusWorkflow;

use crate::error::{EntityKind, WorkflowError, WorkflowResult};
use crate::events::{EventSink, WorkflowEvent};
use crate::store::{Store, TaskFilter};
use crate::types::{
    deserialize_opt_ref, deserialize_opt_timestamp, deserialize_patch_ref, non_blank, Actor, Priority,
    ProjectId, Task, TaskId, TaskStatus, UserId, WorkflowConfig,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// Input for task creation; required fields are checked by the engine
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub project: Option<ProjectId>,
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub assigned_to: Option<UserId>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub deadline: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
}

/// Field-level edit; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` unassigns
    #[serde(default, deserialize_with = "deserialize_patch_ref")]
    pub assigned_to: Option<Option<UserId>>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
}

impl TaskPatch {
    /// Whether `status` is the only field set
    #[must_use]
    pub fn touches_only_status(&self) -> bool {
        self.status.is_some()
            && self.title.is_none()
            && self.description.is_none()
            && self.assigned_to.is_none()
            && self.deadline.is_none()
            && self.priority.is_none()
    }
}

fn missing_status() -> WorkflowError {
    WorkflowError::validation("Please provide a status")
}

/// The task workflow engine
#[derive(Clone)]
pub struct TaskWorkflow {
    store: Arc<dyn Store>,
    events: Arc<dyn EventSink>,
    config: WorkflowConfig,
}

impl std::fmt::Debug for TaskWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskWorkflow")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TaskWorkflow {
    /// Create new engine
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn Store>, events: Arc<dyn EventSink>, config: WorkflowConfig) -> Self {
        Self {
            store,
            events,
            config,
        }
    }

    /// Create a task owned by `actor`
    ///
    /// # Errors
    /// - `Validation` if title, description, project or deadline is missing
    /// - `NotFound` if the project or the assignee does not exist
    pub async fn create_task(&self, draft: TaskDraft, actor: &Actor) -> WorkflowResult<Task> {
        let (Some(title), Some(description), Some(project), Some(deadline)) = (
            non_blank(draft.title),
            non_blank(draft.description),
            draft.project,
            draft.deadline,
        ) else {
            return Err(WorkflowError::validation(
                "Please provide title, description, project, and deadline",
            ));
        };

        if self.store.project(project).await?.is_none() {
            return Err(WorkflowError::not_found(EntityKind::Project));
        }
        if let Some(assignee) = draft.assigned_to {
            self.require_user(assignee).await?;
        }

        let task = self
            .store
            .insert_task(Task {
                id: TaskId::new(),
                title,
                description,
                project,
                assigned_to: draft.assigned_to,
                created_by: actor.id,
                deadline,
                status: TaskStatus::Todos,
                priority: draft.priority.unwrap_or_default(),
                created_at: Utc::now(),
                version: 0,
            })
            .await?;
        tracing::info!(task = %task.id, project = %project, actor = %actor.id, "task created");

        if let Some(assignee) = task.assigned_to {
            self.events
                .emit(WorkflowEvent::TaskAssigned {
                    task: task.clone(),
                    assignee,
                })
                .await;
        }
        Ok(task)
    }

    /// Fetch one task
    ///
    /// # Errors
    /// - `NotFound` if absent
    pub async fn get_task(&self, id: TaskId) -> WorkflowResult<Task> {
        self.store
            .task(id)
            .await?
            .ok_or(WorkflowError::not_found(EntityKind::Task))
    }

    /// Tasks matching `filter`
    pub async fn list_tasks(&self, filter: TaskFilter) -> WorkflowResult<Vec<Task>> {
        Ok(self.store.tasks(filter).await?)
    }

    /// Tasks of one project
    pub async fn project_tasks(&self, project: ProjectId) -> WorkflowResult<Vec<Task>> {
        self.list_tasks(TaskFilter {
            project: Some(project),
            ..TaskFilter::default()
        })
        .await
    }

    /// Apply a field-level edit
    ///
    /// A changed assignee is notified.
    ///
    /// # Errors
    /// - `NotFound` if the task (or a new assignee) is absent
    /// - `Authorization` per [`authorize_task_change`]
    /// - `Validation` for blank text fields or a forbidden status transition
    /// - `Conflict` if the task changed concurrently
    pub async fn update_task(&self, id: TaskId, patch: TaskPatch, actor: &Actor) -> WorkflowResult<Task> {
        let mut task = self.get_task(id).await?;
        authorize_task_change(actor, &task, TaskChange::Edit(&patch))?;

        let previous_assignee = task.assigned_to;
        if let Some(title) = patch.title {
            task.title = non_blank(Some(title))
                .ok_or_else(|| WorkflowError::validation("Task title cannot be empty"))?;
        }
        if let Some(description) = patch.description {
            task.description = non_blank(Some(description))
                .ok_or_else(|| WorkflowError::validation("Task description cannot be empty"))?;
        }
        if let Some(assigned_to) = patch.assigned_to {
            if let Some(user) = assigned_to {
                self.require_user(user).await?;
            }
            task.assigned_to = assigned_to;
        }
        if let Some(deadline) = patch.deadline {
            task.deadline = deadline;
        }
        if let Some(status) = patch.status {
            self.config
                .status_workflow
                .validate_transition(task.status, status)?;
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }

        let task = self.store.update_task(task).await?;
        tracing::info!(task = %task.id, actor = %actor.id, "task updated");

        if let Some(assignee) = task.assigned_to.filter(|a| Some(*a) != previous_assignee) {
            self.events
                .emit(WorkflowEvent::TaskAssigned {
                    task: task.clone(),
                    assignee,
                })
                .await;
        }
        Ok(task)
    }

    /// Assign (or reassign) a task; the assignee is always notified
    ///
    /// # Errors
    /// - `NotFound` if the task or the user is absent
    /// - `Authorization` unless `actor` created the task or is a manager
    /// - `Validation` if `assigned_to` is missing
    /// - `Conflict` if the task changed concurrently
    pub async fn assign_task(
        &self,
        id: TaskId,
        assigned_to: Option<UserId>,
        actor: &Actor,
    ) -> WorkflowResult<Task> {
        let mut task = self.get_task(id).await?;
        authorize_task_change(actor, &task, TaskChange::Assign)?;
        let assignee = assigned_to.ok_or_else(|| {
            WorkflowError::validation("Please provide a user to assign the task to")
        })?;
        self.require_user(assignee).await?;

        task.assigned_to = Some(assignee);
        let task = self.store.update_task(task).await?;
        tracing::info!(task = %task.id, assignee = %assignee, actor = %actor.id, "task assigned");

        self.events
            .emit(WorkflowEvent::TaskAssigned {
                task: task.clone(),
                assignee,
            })
            .await;
        Ok(task)
    }

    /// Change status; only the assignee may do this
    ///
    /// # Errors
    /// - `NotFound` if the task is absent
    /// - `Authorization` unless `actor` is the assignee
    /// - `Validation` if `status` is missing or the transition is forbidden
    /// - `Conflict` if the task changed concurrently
    pub async fn update_task_status(
        &self,
        id: TaskId,
        status: Option<TaskStatus>,
        actor: &Actor,
    ) -> WorkflowResult<Task> {
        let task = self.status_target(id, actor).await?;
        let status = status.ok_or_else(missing_status)?;
        self.apply_status(task, status, actor).await
    }

    /// [`update_task_status`](Self::update_task_status) with the status as
    /// its wire name; the name is only parsed once the actor is authorized
    ///
    /// # Errors
    /// Same as `update_task_status`, plus `Validation` for an unknown name
    pub async fn update_task_status_named(
        &self,
        id: TaskId,
        status: Option<&str>,
        actor: &Actor,
    ) -> WorkflowResult<Task> {
        let task = self.status_target(id, actor).await?;
        let status = status
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(missing_status)?
            .parse::<TaskStatus>()
            .map_err(WorkflowError::validation)?;
        self.apply_status(task, status, actor).await
    }

    async fn status_target(&self, id: TaskId, actor: &Actor) -> WorkflowResult<Task> {
        let task = self.get_task(id).await?;
        authorize_task_change(actor, &task, TaskChange::Status)?;
        Ok(task)
    }

    async fn apply_status(&self, mut task: Task, status: TaskStatus, actor: &Actor) -> WorkflowResult<Task> {
        self.config
            .status_workflow
            .validate_transition(task.status, status)?;

        let from = task.status;
        task.status = status;
        let task = self.store.update_task(task).await?;
        tracing::info!(task = %task.id, ?from, to = ?task.status, actor = %actor.id, "task status changed");
        Ok(task)
    }

    /// Hard delete; issues referencing the task are left in place
    ///
    /// # Errors
    /// - `NotFound` if absent
    pub async fn delete_task(&self, id: TaskId, actor: &Actor) -> WorkflowResult<()> {
        self.store.delete_task(id).await?;
        tracing::info!(task = %id, actor = %actor.id, "task deleted");
        Ok(())
    }

    async fn require_user(&self, id: UserId) -> WorkflowResult<()> {
        match self.store.user(id).await? {
            Some(_) => Ok(()),
            None => Err(WorkflowError::not_found(EntityKind::User)),
        }
    }
}
