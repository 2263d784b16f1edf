//! Service wiring
//!
//! Builds every domain service over one store and one publisher, with the
//! notification dispatcher installed as the event sink.

use crate::events::EventSink;
use crate::fanout::Publisher;
use crate::issues::IssueService;
use crate::membership::ProjectMembership;
use crate::notifications::{NotificationDispatcher, NotificationInbox};
use crate::projects::ProjectService;
use crate::store::Store;
use crate::types::WorkflowConfig;
use crate::workflow::TaskWorkflow;
use std::sync::Arc;

/// All domain services sharing one store
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn Store>,
    pub tasks: TaskWorkflow,
    pub projects: ProjectService,
    pub membership: ProjectMembership,
    pub issues: IssueService,
    pub inbox: NotificationInbox,
}

impl Services {
    /// Wire services with notifications persisted and pushed via `publisher`
    #[must_use]
    pub fn new(store: Arc<dyn Store>, publisher: Arc<dyn Publisher>, config: WorkflowConfig) -> Self {
        let dispatcher: Arc<dyn EventSink> =
            Arc::new(NotificationDispatcher::new(Arc::clone(&store), publisher));
        Self::with_event_sink(store, dispatcher, config)
    }

    /// Wire services with a custom event sink
    #[must_use]
    pub fn with_event_sink(
        store: Arc<dyn Store>,
        events: Arc<dyn EventSink>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            tasks: TaskWorkflow::new(Arc::clone(&store), Arc::clone(&events), config),
            projects: ProjectService::new(Arc::clone(&store)),
            membership: ProjectMembership::new(Arc::clone(&store)),
            issues: IssueService::new(Arc::clone(&store), events),
            inbox: NotificationInbox::new(Arc::clone(&store)),
            store,
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}
