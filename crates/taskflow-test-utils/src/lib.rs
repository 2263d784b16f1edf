//! Testing utilities for the Taskflow workspace
//!
//! Shared fixtures, recording doubles and a pre-seeded harness.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use taskflow_core::types::parse_timestamp;
use taskflow_core::{
    Actor, EventSink, Issue, IssueFilter, IssueId, MemoryStore, Notification, NotificationId,
    Project, ProjectDraft, ProjectId, Publisher, Role, ScheduleDraft, Services, Store, StoreError,
    StoreResult, Task, TaskDraft, TaskFilter, TaskId, User, UserId, WorkflowConfig, WorkflowEvent,
};

/// One call to [`Publisher::publish`]
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub recipient: UserId,
    pub event: String,
    pub payload: serde_json::Value,
}

/// Publisher that records every push and reports one connection reached
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<Published>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().clone()
    }

    pub fn published_to(&self, recipient: UserId) -> Vec<Published> {
        self.published
            .lock()
            .iter()
            .filter(|p| p.recipient == recipient)
            .cloned()
            .collect()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, recipient: UserId, event: &str, payload: &serde_json::Value) -> usize {
        self.published.lock().push(Published {
            recipient,
            event: event.to_string(),
            payload: payload.clone(),
        });
        1
    }
}

/// Event sink that keeps every event
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: WorkflowEvent) {
        self.events.lock().push(event);
    }
}

/// Memory store with switchable outages
///
/// `fail_notifications` makes notification inserts fail, `fail_task_reads`
/// makes single-task lookups fail; everything else goes to the inner store.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    notifications_down: AtomicBool,
    task_reads_down: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_notifications(&self, down: bool) {
        self.notifications_down.store(down, Ordering::SeqCst);
    }

    pub fn fail_task_reads(&self, down: bool) {
        self.task_reads_down.store(down, Ordering::SeqCst);
    }

    fn outage(flag: &AtomicBool, what: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(format!("{what} backend offline")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        self.inner.insert_user(user).await
    }
    async fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        self.inner.user(id).await
    }
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner.user_by_email(email).await
    }
    async fn user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>> {
        self.inner.user_by_google_id(google_id).await
    }
    async fn user_by_reset_token(&self, token_hash: &str) -> StoreResult<Option<User>> {
        self.inner.user_by_reset_token(token_hash).await
    }
    async fn update_user(&self, user: User) -> StoreResult<User> {
        self.inner.update_user(user).await
    }
    async fn users(&self) -> StoreResult<Vec<User>> {
        self.inner.users().await
    }

    async fn insert_project(&self, project: Project) -> StoreResult<Project> {
        self.inner.insert_project(project).await
    }
    async fn project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        self.inner.project(id).await
    }
    async fn projects(&self) -> StoreResult<Vec<Project>> {
        self.inner.projects().await
    }
    async fn update_project(&self, project: Project) -> StoreResult<Project> {
        self.inner.update_project(project).await
    }
    async fn delete_project(&self, id: ProjectId) -> StoreResult<Project> {
        self.inner.delete_project(id).await
    }

    async fn insert_task(&self, task: Task) -> StoreResult<Task> {
        self.inner.insert_task(task).await
    }
    async fn task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        Self::outage(&self.task_reads_down, "task")?;
        self.inner.task(id).await
    }
    async fn tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        self.inner.tasks(filter).await
    }
    async fn update_task(&self, task: Task) -> StoreResult<Task> {
        self.inner.update_task(task).await
    }
    async fn delete_task(&self, id: TaskId) -> StoreResult<Task> {
        self.inner.delete_task(id).await
    }

    async fn insert_issue(&self, issue: Issue) -> StoreResult<Issue> {
        self.inner.insert_issue(issue).await
    }
    async fn issue(&self, id: IssueId) -> StoreResult<Option<Issue>> {
        self.inner.issue(id).await
    }
    async fn issues(&self, filter: IssueFilter) -> StoreResult<Vec<Issue>> {
        self.inner.issues(filter).await
    }
    async fn update_issue(&self, issue: Issue) -> StoreResult<Issue> {
        self.inner.update_issue(issue).await
    }
    async fn delete_issue(&self, id: IssueId) -> StoreResult<Issue> {
        self.inner.delete_issue(id).await
    }

    async fn insert_notification(&self, notification: Notification) -> StoreResult<Notification> {
        Self::outage(&self.notifications_down, "notification")?;
        self.inner.insert_notification(notification).await
    }
    async fn notification(&self, id: NotificationId) -> StoreResult<Option<Notification>> {
        self.inner.notification(id).await
    }
    async fn notifications_for(&self, user: UserId) -> StoreResult<Vec<Notification>> {
        self.inner.notifications_for(user).await
    }
    async fn update_notification(&self, notification: Notification) -> StoreResult<Notification> {
        self.inner.update_notification(notification).await
    }
    async fn delete_notification(&self, id: NotificationId) -> StoreResult<Notification> {
        self.inner.delete_notification(id).await
    }
}

pub async fn seed_user(store: &dyn Store, name: &str, role: Role) -> User {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    store
        .insert_user(User::new(name, email, role))
        .await
        .unwrap()
}

pub fn actor(user: &User) -> Actor {
    Actor::new(user.id, user.role)
}

/// Valid project draft: Jan 2025 schedule, deadline Feb 1st
pub fn project_draft(name: &str) -> ProjectDraft {
    ProjectDraft {
        name: Some(name.to_string()),
        description: Some(format!("{name} description")),
        deadline: parse_timestamp("2025-02-01"),
        schedule: Some(ScheduleDraft {
            start_date: parse_timestamp("2025-01-01"),
            end_date: parse_timestamp("2025-01-31"),
        }),
        members: Vec::new(),
    }
}

pub fn task_draft(title: &str, project: &Project, assigned_to: Option<UserId>) -> TaskDraft {
    TaskDraft {
        title: Some(title.to_string()),
        description: Some(format!("{title} description")),
        project: Some(project.id),
        assigned_to,
        deadline: parse_timestamp("2025-01-20"),
        priority: None,
    }
}

/// Services over a memory store with a manager, a regular user and an
/// outsider already registered
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub publisher: Arc<RecordingPublisher>,
    pub services: Services,
    pub manager: User,
    pub member: User,
    pub outsider: User,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(WorkflowConfig::new()).await
    }

    pub async fn with_config(config: WorkflowConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let services = Services::new(store.clone(), publisher.clone(), config);
        let manager = seed_user(store.as_ref(), "Mia Manager", Role::Manager).await;
        let member = seed_user(store.as_ref(), "Uma User", Role::User).await;
        let outsider = seed_user(store.as_ref(), "Otto Outsider", Role::User).await;
        Self {
            store,
            publisher,
            services,
            manager,
            member,
            outsider,
        }
    }

    pub async fn project(&self) -> Project {
        self.services
            .projects
            .create_project(project_draft("Launch"), &actor(&self.manager))
            .await
            .unwrap()
    }

    /// Task created by the manager and assigned to the member
    pub async fn assigned_task(&self, project: &Project) -> Task {
        self.services
            .tasks
            .create_task(
                task_draft("Write docs", project, Some(self.member.id)),
                &actor(&self.manager),
            )
            .await
            .unwrap()
    }
}
