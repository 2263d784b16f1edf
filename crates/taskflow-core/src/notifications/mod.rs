//! Notifications: derivation from workflow events and recipient inbox

mod dispatcher;
mod inbox;

pub use dispatcher::{NotificationDispatcher, ISSUE_NOTIFICATION_EVENT, TASK_NOTIFICATION_EVENT};
pub use inbox::NotificationInbox;
