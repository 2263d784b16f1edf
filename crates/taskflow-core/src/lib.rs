//! Taskflow Core - task workflow and notifications
//!
//! The domain layer of Taskflow:
//! - Projects with schedules and member sets
//! - Tasks with an assignee-guarded status workflow
//! - Issues reported against tasks
//! - Notifications persisted per recipient and pushed in real time
//!
//! # Example
//!
//! ```rust,ignore
//! use taskflow_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), WorkflowError> {
//! let store = Arc::new(MemoryStore::new());
//! let rooms = Arc::new(RoomRegistry::new());
//! let services = Services::new(store, rooms, WorkflowConfig::new());
//!
//! let tasks = services.tasks.project_tasks(ProjectId::new()).await?;
//! println!("{} tasks", tasks.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod error;
pub mod events;
pub mod fanout;
pub mod issues;
pub mod membership;
pub mod notifications;
pub mod projects;
pub mod services;
pub mod store;
pub mod types;
pub mod workflow;

// Re-exports for convenience
pub use error::{EntityKind, ErrorKind, StoreError, StoreResult, WorkflowError, WorkflowResult};
pub use events::{DiscardEvents, EventSink, WorkflowEvent};
pub use fanout::{ConnectionHandle, ConnectionId, FanoutError, Frame, Publisher, RoomRegistry};
pub use issues::{IssueDraft, IssuePatch, IssueService};
pub use membership::ProjectMembership;
pub use notifications::{
    NotificationDispatcher, NotificationInbox, ISSUE_NOTIFICATION_EVENT, TASK_NOTIFICATION_EVENT,
};
pub use projects::{ProjectDraft, ProjectPatch, ProjectService, ScheduleDraft};
pub use services::Services;
pub use store::{IssueFilter, MemoryStore, Store, TaskFilter};
pub use types::{
    Actor, Issue, IssueId, IssueStatus, Notification, NotificationId, Priority, Project,
    ProjectId, ProjectStatus, Role, Schedule, Task, TaskId, TaskStatus, User, UserId,
    UserSummary, WorkflowConfig,
};
pub use workflow::{authorize_task_change, StatusWorkflow, TaskChange, TaskDraft, TaskPatch, TaskWorkflow};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Taskflow Core
    pub use crate::{
        Actor, MemoryStore, ProjectId, Role, RoomRegistry, Services, Store, TaskDraft, TaskId,
        TaskPatch, TaskStatus, UserId, WorkflowConfig, WorkflowError, WorkflowResult,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn assignment_reaches_a_live_connection() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let rooms = Arc::new(RoomRegistry::new());
        let services = Services::new(Arc::clone(&store), rooms.clone(), WorkflowConfig::new());

        let manager = store
            .insert_user(User::new("Mia Manager", "mia@example.com", Role::Manager))
            .await
            .unwrap();
        let member = store
            .insert_user(User::new("Uma User", "uma@example.com", Role::User))
            .await
            .unwrap();
        let actor = Actor::new(manager.id, manager.role);

        let project = services
            .projects
            .create_project(
                serde_json::from_value(serde_json::json!({
                    "name": "Launch",
                    "description": "Ship it",
                    "deadline": "2025-03-01",
                    "schedule": { "startDate": "2025-01-01", "endDate": "2025-02-01" }
                }))
                .unwrap(),
                &actor,
            )
            .await
            .unwrap();

        let mut handle = rooms.connect().unwrap();
        rooms.join(handle.id, member.id).unwrap();

        let task = services
            .tasks
            .create_task(
                TaskDraft {
                    title: Some("Write docs".to_string()),
                    description: Some("All of them".to_string()),
                    project: Some(project.id),
                    assigned_to: Some(member.id),
                    deadline: types::parse_timestamp("2025-02-15"),
                    priority: None,
                },
                &actor,
            )
            .await
            .unwrap();

        let frame = handle.frames.try_recv().unwrap();
        assert_eq!(frame.event, TASK_NOTIFICATION_EVENT);
        assert_eq!(frame.data["link"], format!("/tasks/{}", task.id));
        assert_eq!(store.notifications_for(member.id).await.unwrap().len(), 1);
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
