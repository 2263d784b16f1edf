//! Project records
//!
//! Creation checks the schedule invariants (`startDate <= endDate`,
//! `deadline >= endDate`); updates re-check them against the merged record.

use crate::error::{EntityKind, WorkflowError, WorkflowResult};
use crate::store::Store;
use crate::types::{
    deserialize_opt_timestamp, non_blank, Actor, Project, ProjectId, ProjectStatus, Schedule, UserId,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Schedule as submitted; both ends required
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDraft {
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub end_date: Option<DateTime<Utc>>,
}

/// Input for project creation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub deadline: Option<DateTime<Utc>>,
    pub schedule: Option<ScheduleDraft>,
    #[serde(default)]
    pub members: Vec<UserId>,
}

/// Field-level project edit
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<ProjectStatus>,
}

fn check_dates(deadline: DateTime<Utc>, schedule: &Schedule) -> WorkflowResult<()> {
    if schedule.start_date > schedule.end_date {
        return Err(WorkflowError::validation(
            "Schedule start date must not be after its end date",
        ));
    }
    if deadline < schedule.end_date {
        return Err(WorkflowError::validation(
            "Project deadline must not be before the schedule end date",
        ));
    }
    Ok(())
}

/// Project CRUD
#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for ProjectService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectService").finish_non_exhaustive()
    }
}

impl ProjectService {
    /// Create new service
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a project owned by `actor`
    ///
    /// # Errors
    /// - `Validation` on missing fields or broken date ordering
    pub async fn create_project(&self, draft: ProjectDraft, actor: &Actor) -> WorkflowResult<Project> {
        let schedule = draft.schedule.unwrap_or_default();
        let (Some(name), Some(description), Some(deadline), Some(start_date), Some(end_date)) = (
            non_blank(draft.name),
            non_blank(draft.description),
            draft.deadline,
            schedule.start_date,
            schedule.end_date,
        ) else {
            return Err(WorkflowError::validation(
                "Please provide name, description, deadline, and schedule (startDate and endDate)",
            ));
        };
        let schedule = Schedule {
            start_date,
            end_date,
        };
        check_dates(deadline, &schedule)?;

        let project = self
            .store
            .insert_project(Project {
                id: ProjectId::new(),
                name,
                description,
                deadline,
                schedule,
                status: ProjectStatus::NotStarted,
                created_by: actor.id,
                members: draft.members.into_iter().collect::<BTreeSet<_>>(),
                created_at: Utc::now(),
                version: 0,
            })
            .await?;
        tracing::info!(project = %project.id, actor = %actor.id, "project created");
        Ok(project)
    }

    /// Fetch one project
    ///
    /// # Errors
    /// - `NotFound` if absent
    pub async fn get_project(&self, id: ProjectId) -> WorkflowResult<Project> {
        self.store
            .project(id)
            .await?
            .ok_or(WorkflowError::not_found(EntityKind::Project))
    }

    /// All projects
    pub async fn list_projects(&self) -> WorkflowResult<Vec<Project>> {
        Ok(self.store.projects().await?)
    }

    /// Apply a field-level edit
    ///
    /// # Errors
    /// - `NotFound` if absent
    /// - `Validation` on blank text or broken date ordering
    /// - `Conflict` if the project changed concurrently
    pub async fn update_project(
        &self,
        id: ProjectId,
        patch: ProjectPatch,
        actor: &Actor,
    ) -> WorkflowResult<Project> {
        let mut project = self.get_project(id).await?;
        if let Some(name) = patch.name {
            project.name = non_blank(Some(name))
                .ok_or_else(|| WorkflowError::validation("Project name cannot be empty"))?;
        }
        if let Some(description) = patch.description {
            project.description = non_blank(Some(description))
                .ok_or_else(|| WorkflowError::validation("Project description cannot be empty"))?;
        }
        if let Some(deadline) = patch.deadline {
            project.deadline = deadline;
        }
        if let Some(status) = patch.status {
            project.status = status;
        }
        check_dates(project.deadline, &project.schedule)?;

        let project = self.store.update_project(project).await?;
        tracing::info!(project = %project.id, actor = %actor.id, "project updated");
        Ok(project)
    }

    /// Hard delete
    ///
    /// # Errors
    /// - `NotFound` if absent
    pub async fn delete_project(&self, id: ProjectId, actor: &Actor) -> WorkflowResult<()> {
        self.store.delete_project(id).await?;
        tracing::info!(project = %id, actor = %actor.id, "project deleted");
        Ok(())
    }
}
