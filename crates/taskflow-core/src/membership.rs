//! Project membership manager
//!
//! Keeps `Project::members` a set: adding an existing member is a conflict,
//! removing a non-member succeeds without change.

use crate::error::{EntityKind, WorkflowError, WorkflowResult};
use crate::store::Store;
use crate::types::{Project, ProjectId, UserId, UserSummary};
use std::sync::Arc;

/// Membership operations on projects
#[derive(Clone)]
pub struct ProjectMembership {
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for ProjectMembership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectMembership").finish_non_exhaustive()
    }
}

impl ProjectMembership {
    /// Create new manager
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Add `user` to the project
    ///
    /// # Errors
    /// - `Validation` if `user` is missing
    /// - `NotFound` if the project or the user is absent
    /// - `Conflict` if already a member
    pub async fn add_member(&self, project: ProjectId, user: Option<UserId>) -> WorkflowResult<Project> {
        let user = user.ok_or_else(|| WorkflowError::validation("Please provide a userId"))?;
        let mut record = self.project(project).await?;
        if record.members.contains(&user) {
            return Err(WorkflowError::Conflict("User is already a member".to_string()));
        }
        if self.store.user(user).await?.is_none() {
            return Err(WorkflowError::not_found(EntityKind::User));
        }

        record.members.insert(user);
        let record = self.store.update_project(record).await?;
        tracing::info!(project = %project, user = %user, "member added");
        Ok(record)
    }

    /// Remove `user` from the project; no-op if not a member
    ///
    /// # Errors
    /// - `Validation` if `user` is missing
    /// - `NotFound` if the project is absent
    pub async fn remove_member(&self, project: ProjectId, user: Option<UserId>) -> WorkflowResult<Project> {
        let user = user.ok_or_else(|| WorkflowError::validation("Please provide a userId"))?;
        let mut record = self.project(project).await?;
        if !record.members.remove(&user) {
            return Ok(record);
        }

        let record = self.store.update_project(record).await?;
        tracing::info!(project = %project, user = %user, "member removed");
        Ok(record)
    }

    /// Display fields of every member; members whose account is gone are skipped
    ///
    /// # Errors
    /// - `NotFound` if the project is absent
    pub async fn list_members(&self, project: ProjectId) -> WorkflowResult<Vec<UserSummary>> {
        let record = self.project(project).await?;
        let mut members = Vec::with_capacity(record.members.len());
        for id in &record.members {
            if let Some(user) = self.store.user(*id).await? {
                members.push(user.summary());
            }
        }
        Ok(members)
    }

    async fn project(&self, id: ProjectId) -> WorkflowResult<Project> {
        self.store
            .project(id)
            .await?
            .ok_or(WorkflowError::not_found(EntityKind::Project))
    }
}
