//! Notification dispatcher
//!
//! Turns workflow events into persisted notifications and hands them to the
//! fan-out channel. Persistence happens first; delivery is best-effort and
//! a recipient without live connections is not an error.

use crate::error::WorkflowResult;
use crate::events::{EventSink, WorkflowEvent};
use crate::fanout::Publisher;
use crate::store::Store;
use crate::types::{Notification, UserId};
use async_trait::async_trait;
use std::sync::Arc;

/// Event name for assignment notifications
pub const TASK_NOTIFICATION_EVENT: &str = "receiveNotification";
/// Event name for issue notifications
pub const ISSUE_NOTIFICATION_EVENT: &str = "notification";

/// Persists and pushes notifications derived from workflow events
#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn Store>,
    publisher: Arc<dyn Publisher>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher").finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    /// Create new dispatcher
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn Store>, publisher: Arc<dyn Publisher>) -> Self {
        Self { store, publisher }
    }

    /// Persist the notification for `event`, then push it.
    ///
    /// Returns `None` when the event has no recipient (issue on an
    /// unassigned task).
    ///
    /// # Errors
    /// Propagates store failures; nothing is pushed in that case.
    pub async fn dispatch(&self, event: &WorkflowEvent) -> WorkflowResult<Option<Notification>> {
        let Some((recipient, message, channel)) = render(event) else {
            tracing::debug!(event = event.name(), task = %event.task().id, "no recipient, skipping");
            return Ok(None);
        };

        let notification = self
            .store
            .insert_notification(Notification::new(recipient, message, event.task().link()))
            .await?;

        match serde_json::to_value(&notification) {
            Ok(payload) => {
                let reached = self.publisher.publish(recipient, channel, &payload);
                tracing::info!(
                    event = event.name(),
                    notification = %notification.id,
                    user = %recipient,
                    reached,
                    "notification dispatched"
                );
            }
            Err(e) => tracing::error!("failed to encode notification {}: {}", notification.id, e),
        }

        Ok(Some(notification))
    }
}

/// Recipient, message and real-time event name for an event
fn render(event: &WorkflowEvent) -> Option<(UserId, String, &'static str)> {
    match event {
        WorkflowEvent::TaskAssigned { task, assignee } => Some((
            *assignee,
            format!("You have been assigned a new task: {}", task.title),
            TASK_NOTIFICATION_EVENT,
        )),
        WorkflowEvent::IssueCreated { task, .. } => task.assigned_to.map(|assignee| {
            (
                assignee,
                format!("A new issue has been reported for the task: {}", task.title),
                ISSUE_NOTIFICATION_EVENT,
            )
        }),
        WorkflowEvent::IssueUpdated { task, .. } => task.assigned_to.map(|assignee| {
            (
                assignee,
                format!("An issue has been updated for the task: {}", task.title),
                ISSUE_NOTIFICATION_EVENT,
            )
        }),
    }
}

#[async_trait]
impl EventSink for NotificationDispatcher {
    async fn emit(&self, event: WorkflowEvent) {
        if let Err(e) = self.dispatch(&event).await {
            tracing::error!("notification for {} failed: {}", event.name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fanout::MockPublisher;
    use crate::store::MemoryStore;
    use crate::types::{
        Issue, IssueId, IssueStatus, Priority, ProjectId, Task, TaskId, TaskStatus,
    };
    use chrono::Utc;
    use mockall::predicate::{always, eq};

    fn task(assigned_to: Option<UserId>) -> Task {
        Task {
            id: TaskId::new(),
            title: "Ship release".to_string(),
            description: "v1".to_string(),
            project: ProjectId::new(),
            assigned_to,
            created_by: UserId::new(),
            deadline: Utc::now(),
            status: TaskStatus::Todos,
            priority: Priority::High,
            created_at: Utc::now(),
            version: 0,
        }
    }

    fn issue(task: &Task) -> Issue {
        Issue {
            id: IssueId::new(),
            title: "Crash".to_string(),
            description: "on start".to_string(),
            task: task.id,
            reported_by: UserId::new(),
            status: IssueStatus::Open,
            priority: Priority::Medium,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn assignment_is_persisted_then_published() {
        let store = Arc::new(MemoryStore::new());
        let assignee = UserId::new();
        let mut publisher = MockPublisher::new();
        publisher
            .expect_publish()
            .with(eq(assignee), eq(TASK_NOTIFICATION_EVENT), always())
            .times(1)
            .return_const(1usize);
        let dispatcher = NotificationDispatcher::new(store.clone(), Arc::new(publisher));

        let t = task(Some(assignee));
        let created = dispatcher
            .dispatch(&WorkflowEvent::TaskAssigned {
                task: t.clone(),
                assignee,
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(created.link, format!("/tasks/{}", t.id));
        assert_eq!(created.message, "You have been assigned a new task: Ship release");
        let stored = store.notifications_for(assignee).await.unwrap();
        assert_eq!(stored, vec![created]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn record_is_stored_before_publish_runs() {
        let store = Arc::new(MemoryStore::new());
        let assignee = UserId::new();
        let seen = Arc::clone(&store);
        let mut publisher = MockPublisher::new();
        publisher
            .expect_publish()
            .times(1)
            .returning(move |recipient, _, payload| {
                let stored = tokio::task::block_in_place(|| {
                    tokio::runtime::Handle::current().block_on(seen.notifications_for(recipient))
                })
                .unwrap();
                assert_eq!(stored.len(), 1);
                assert_eq!(payload["id"], serde_json::json!(stored[0].id.to_string()));
                1
            });
        let dispatcher = NotificationDispatcher::new(store, Arc::new(publisher));

        dispatcher
            .dispatch(&WorkflowEvent::TaskAssigned {
                task: task(Some(assignee)),
                assignee,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn offline_recipient_still_gets_durable_record() {
        let store = Arc::new(MemoryStore::new());
        let assignee = UserId::new();
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().times(1).return_const(0usize);
        let dispatcher = NotificationDispatcher::new(store.clone(), Arc::new(publisher));

        let t = task(Some(assignee));
        dispatcher
            .emit(WorkflowEvent::IssueCreated {
                issue: issue(&t),
                task: t,
            })
            .await;

        let stored = store.notifications_for(assignee).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].message.starts_with("A new issue has been reported"));
    }

    #[tokio::test]
    async fn unassigned_task_issue_is_a_no_op() {
        let store = Arc::new(MemoryStore::new());
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().times(0);
        let dispatcher = NotificationDispatcher::new(store, Arc::new(publisher));

        let t = task(None);
        let out = dispatcher
            .dispatch(&WorkflowEvent::IssueUpdated {
                issue: issue(&t),
                task: t,
            })
            .await
            .unwrap();
        assert!(out.is_none());
    }
}
