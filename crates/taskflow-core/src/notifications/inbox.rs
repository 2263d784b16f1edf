//! Recipient-facing notification operations

use crate::error::{EntityKind, WorkflowError, WorkflowResult};
use crate::store::Store;
use crate::types::{Actor, Notification, NotificationId};
use std::sync::Arc;

/// List, acknowledge and delete notifications
#[derive(Clone)]
pub struct NotificationInbox {
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for NotificationInbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationInbox").finish_non_exhaustive()
    }
}

impl NotificationInbox {
    /// Create new inbox
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Actor's notifications, newest first
    pub async fn list(&self, actor: &Actor) -> WorkflowResult<Vec<Notification>> {
        Ok(self.store.notifications_for(actor.id).await?)
    }

    /// Mark as read; idempotent
    ///
    /// # Errors
    /// - `NotFound` if absent
    /// - `Authorization` if the actor is not the recipient
    pub async fn mark_as_read(
        &self,
        id: NotificationId,
        actor: &Actor,
    ) -> WorkflowResult<Notification> {
        let mut notification = self.owned(id, actor).await?;
        if notification.read {
            return Ok(notification);
        }
        notification.read = true;
        Ok(self.store.update_notification(notification).await?)
    }

    /// Delete permanently
    ///
    /// # Errors
    /// - `NotFound` if absent
    /// - `Authorization` if the actor is not the recipient
    pub async fn delete(&self, id: NotificationId, actor: &Actor) -> WorkflowResult<()> {
        self.owned(id, actor).await?;
        self.store.delete_notification(id).await?;
        Ok(())
    }

    async fn owned(&self, id: NotificationId, actor: &Actor) -> WorkflowResult<Notification> {
        let notification = self
            .store
            .notification(id)
            .await?
            .ok_or(WorkflowError::not_found(EntityKind::Notification))?;
        if notification.user != actor.id {
            return Err(WorkflowError::forbidden(
                "You can only manage your own notifications",
            ));
        }
        Ok(notification)
    }
}
