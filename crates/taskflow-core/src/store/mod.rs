//! Persistence seam
//!
//! Durable records for users, projects, tasks, issues and notifications.
//! Every backend offers create/read/update/delete plus equality filters.
//! Task and project writes are versioned: an update carrying an outdated
//! `version` fails with [`StoreError::StaleWrite`].

mod memory;

pub use memory::MemoryStore;

use crate::error::StoreResult;
use crate::types::{
    Issue, IssueId, IssueStatus, Notification, NotificationId, Priority, Project, ProjectId, Task,
    TaskId, TaskStatus, User, UserId,
};
use async_trait::async_trait;

/// Equality filter over tasks; `None` matches everything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub project: Option<ProjectId>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<UserId>,
}

impl TaskFilter {
    /// Whether a task satisfies every set criterion
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.project.map_or(true, |p| task.project == p)
            && self.status.map_or(true, |s| task.status == s)
            && self.priority.map_or(true, |p| task.priority == p)
            && self.assigned_to.map_or(true, |u| task.assigned_to == Some(u))
    }
}

/// Equality filter over issues; `None` matches everything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub task: Option<TaskId>,
    pub status: Option<IssueStatus>,
    pub priority: Option<Priority>,
}

impl IssueFilter {
    /// Whether an issue satisfies every set criterion
    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        self.task.map_or(true, |t| issue.task == t)
            && self.status.map_or(true, |s| issue.status == s)
            && self.priority.map_or(true, |p| issue.priority == p)
    }
}

/// Persistence store
///
/// Lookups return `Ok(None)` for absent records; updates and deletes of
/// absent records fail with [`StoreError::NotFound`].
///
/// [`StoreError::NotFound`]: crate::error::StoreError::NotFound
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Insert a user; email must be unique
    async fn insert_user(&self, user: User) -> StoreResult<User>;
    async fn user(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>>;
    async fn user_by_reset_token(&self, token_hash: &str) -> StoreResult<Option<User>>;
    async fn update_user(&self, user: User) -> StoreResult<User>;
    async fn users(&self) -> StoreResult<Vec<User>>;

    async fn insert_project(&self, project: Project) -> StoreResult<Project>;
    async fn project(&self, id: ProjectId) -> StoreResult<Option<Project>>;
    async fn projects(&self) -> StoreResult<Vec<Project>>;
    /// Versioned write; returns the record with its bumped version
    async fn update_project(&self, project: Project) -> StoreResult<Project>;
    async fn delete_project(&self, id: ProjectId) -> StoreResult<Project>;

    async fn insert_task(&self, task: Task) -> StoreResult<Task>;
    async fn task(&self, id: TaskId) -> StoreResult<Option<Task>>;
    async fn tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>>;
    /// Versioned write; returns the record with its bumped version
    async fn update_task(&self, task: Task) -> StoreResult<Task>;
    async fn delete_task(&self, id: TaskId) -> StoreResult<Task>;

    async fn insert_issue(&self, issue: Issue) -> StoreResult<Issue>;
    async fn issue(&self, id: IssueId) -> StoreResult<Option<Issue>>;
    async fn issues(&self, filter: IssueFilter) -> StoreResult<Vec<Issue>>;
    async fn update_issue(&self, issue: Issue) -> StoreResult<Issue>;
    async fn delete_issue(&self, id: IssueId) -> StoreResult<Issue>;

    async fn insert_notification(&self, notification: Notification) -> StoreResult<Notification>;
    async fn notification(&self, id: NotificationId) -> StoreResult<Option<Notification>>;
    /// Recipient's notifications, newest first
    async fn notifications_for(&self, user: UserId) -> StoreResult<Vec<Notification>>;
    async fn update_notification(&self, notification: Notification) -> StoreResult<Notification>;
    async fn delete_notification(&self, id: NotificationId) -> StoreResult<Notification>;
}
