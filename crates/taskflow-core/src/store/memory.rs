//! In-memory store
//!
//! Concurrent maps keyed by entity id. Users sit behind a single lock so the
//! email uniqueness check and the insert happen atomically.

use super::{IssueFilter, Store, TaskFilter};
use crate::error::{EntityKind, StoreError, StoreResult};
use crate::types::{
    Issue, IssueId, Notification, NotificationId, Project, ProjectId, Task, TaskId, User, UserId,
};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;

/// Process-local [`Store`] implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    projects: DashMap<ProjectId, Project>,
    tasks: DashMap<TaskId, Task>,
    issues: DashMap<IssueId, Issue>,
    notifications: DashMap<NotificationId, Notification>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(kind: EntityKind, id: impl ToString) -> StoreError {
    StoreError::NotFound {
        kind,
        id: id.to_string(),
    }
}

/// Replace a record whose stored version equals the incoming one
fn versioned_replace<K, V>(
    map: &DashMap<K, V>,
    key: K,
    mut record: V,
    kind: EntityKind,
    version: impl Fn(&mut V) -> &mut u64,
) -> StoreResult<V>
where
    K: Eq + Hash + Clone + std::fmt::Display,
    V: Clone,
{
    let mut slot = map.get_mut(&key).ok_or_else(|| not_found(kind, &key))?;
    let current = *version(slot.value_mut());
    let incoming = version(&mut record);
    if *incoming != current {
        return Err(StoreError::StaleWrite {
            kind,
            id: key.to_string(),
        });
    }
    *incoming = current + 1;
    *slot.value_mut() = record.clone();
    Ok(record)
}

fn replace<K, V>(map: &DashMap<K, V>, key: K, record: V, kind: EntityKind) -> StoreResult<V>
where
    K: Eq + Hash + Clone + std::fmt::Display,
    V: Clone,
{
    let mut slot = map.get_mut(&key).ok_or_else(|| not_found(kind, &key))?;
    *slot.value_mut() = record.clone();
    Ok(record)
}

fn remove<K, V>(map: &DashMap<K, V>, key: K, kind: EntityKind) -> StoreResult<V>
where
    K: Eq + Hash + std::fmt::Display,
{
    map.remove(&key)
        .map(|(_, v)| v)
        .ok_or_else(|| not_found(kind, &key))
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write();
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Duplicate {
                field: "email",
                value: user.email,
            });
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.google_id.as_deref() == Some(google_id))
            .cloned())
    }

    async fn user_by_reset_token(&self, token_hash: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.reset_token_hash.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn update_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write();
        if users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Duplicate {
                field: "email",
                value: user.email,
            });
        }
        let slot = users
            .get_mut(&user.id)
            .ok_or_else(|| not_found(EntityKind::User, user.id))?;
        *slot = user.clone();
        Ok(user)
    }

    async fn users(&self) -> StoreResult<Vec<User>> {
        let mut all: Vec<User> = self.users.read().values().cloned().collect();
        all.sort_by_key(|u| u.id);
        Ok(all)
    }

    async fn insert_project(&self, project: Project) -> StoreResult<Project> {
        self.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        Ok(self.projects.get(&id).map(|p| p.clone()))
    }

    async fn projects(&self) -> StoreResult<Vec<Project>> {
        let mut all: Vec<Project> = self.projects.iter().map(|p| p.clone()).collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }

    async fn update_project(&self, project: Project) -> StoreResult<Project> {
        versioned_replace(&self.projects, project.id, project, EntityKind::Project, |p| {
            &mut p.version
        })
    }

    async fn delete_project(&self, id: ProjectId) -> StoreResult<Project> {
        remove(&self.projects, id, EntityKind::Project)
    }

    async fn insert_task(&self, task: Task) -> StoreResult<Task> {
        self.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        Ok(self.tasks.get(&id).map(|t| t.clone()))
    }

    async fn tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let mut found: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| filter.matches(t.value()))
            .map(|t| t.clone())
            .collect();
        found.sort_by_key(|t| t.id);
        Ok(found)
    }

    async fn update_task(&self, task: Task) -> StoreResult<Task> {
        versioned_replace(&self.tasks, task.id, task, EntityKind::Task, |t| &mut t.version)
    }

    async fn delete_task(&self, id: TaskId) -> StoreResult<Task> {
        remove(&self.tasks, id, EntityKind::Task)
    }

    async fn insert_issue(&self, issue: Issue) -> StoreResult<Issue> {
        self.issues.insert(issue.id, issue.clone());
        Ok(issue)
    }

    async fn issue(&self, id: IssueId) -> StoreResult<Option<Issue>> {
        Ok(self.issues.get(&id).map(|i| i.clone()))
    }

    async fn issues(&self, filter: IssueFilter) -> StoreResult<Vec<Issue>> {
        let mut found: Vec<Issue> = self
            .issues
            .iter()
            .filter(|i| filter.matches(i.value()))
            .map(|i| i.clone())
            .collect();
        found.sort_by_key(|i| i.id);
        Ok(found)
    }

    async fn update_issue(&self, issue: Issue) -> StoreResult<Issue> {
        replace(&self.issues, issue.id, issue, EntityKind::Issue)
    }

    async fn delete_issue(&self, id: IssueId) -> StoreResult<Issue> {
        remove(&self.issues, id, EntityKind::Issue)
    }

    async fn insert_notification(&self, notification: Notification) -> StoreResult<Notification> {
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn notification(&self, id: NotificationId) -> StoreResult<Option<Notification>> {
        Ok(self.notifications.get(&id).map(|n| n.clone()))
    }

    async fn notifications_for(&self, user: UserId) -> StoreResult<Vec<Notification>> {
        let mut found: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.user == user)
            .map(|n| n.clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn update_notification(&self, notification: Notification) -> StoreResult<Notification> {
        replace(
            &self.notifications,
            notification.id,
            notification,
            EntityKind::Notification,
        )
    }

    async fn delete_notification(&self, id: NotificationId) -> StoreResult<Notification> {
        remove(&self.notifications, id, EntityKind::Notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Priority, Role, Schedule, TaskStatus};
    use chrono::Utc;

    fn task(project: ProjectId, creator: UserId) -> Task {
        Task {
            id: TaskId::new(),
            title: "Write docs".to_string(),
            description: "README".to_string(),
            project,
            assigned_to: None,
            created_by: creator,
            deadline: Utc::now(),
            status: TaskStatus::Todos,
            priority: Priority::Medium,
            created_at: Utc::now(),
            version: 0,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let store = MemoryStore::new();
        store
            .insert_user(User::new("A", "a@example.com", Role::User))
            .await
            .unwrap();
        let err = store
            .insert_user(User::new("B", "A@Example.com", Role::User))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "email", .. }));
    }

    #[tokio::test]
    async fn versioned_update_bumps_and_rejects_stale_writes() {
        let store = MemoryStore::new();
        let t = store
            .insert_task(task(ProjectId::new(), UserId::new()))
            .await
            .unwrap();

        let mut first = t.clone();
        first.status = TaskStatus::InProgress;
        let saved = store.update_task(first).await.unwrap();
        assert_eq!(saved.version, 1);

        let mut stale = t;
        stale.status = TaskStatus::Completed;
        let err = store.update_task(stale).await.unwrap_err();
        assert!(matches!(err, StoreError::StaleWrite { kind: EntityKind::Task, .. }));

        let stored = store.task(saved.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn task_filter_matches_all_criteria() {
        let store = MemoryStore::new();
        let project = ProjectId::new();
        let creator = UserId::new();
        let mut high = task(project, creator);
        high.priority = Priority::High;
        store.insert_task(high.clone()).await.unwrap();
        store.insert_task(task(project, creator)).await.unwrap();
        store.insert_task(task(ProjectId::new(), creator)).await.unwrap();

        let by_project = store
            .tasks(TaskFilter {
                project: Some(project),
                ..TaskFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_project.len(), 2);

        let by_priority = store
            .tasks(TaskFilter {
                project: Some(project),
                priority: Some(Priority::High),
                ..TaskFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_priority, vec![high]);
    }

    #[tokio::test]
    async fn delete_missing_record_is_not_found() {
        let store = MemoryStore::new();
        let err = store.delete_issue(IssueId::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: EntityKind::Issue, .. }));
    }

    #[tokio::test]
    async fn project_round_trip_preserves_schedule() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let project = Project {
            id: ProjectId::new(),
            name: "Apollo".to_string(),
            description: "Moonshot".to_string(),
            deadline: now,
            schedule: Schedule {
                start_date: now,
                end_date: now,
            },
            status: Default::default(),
            created_by: UserId::new(),
            members: Default::default(),
            created_at: now,
            version: 0,
        };
        store.insert_project(project.clone()).await.unwrap();
        assert_eq!(store.project(project.id).await.unwrap(), Some(project));
    }
}
