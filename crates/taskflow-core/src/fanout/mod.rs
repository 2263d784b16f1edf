//! Real-time fan-out channel
//!
//! Routes events to the live connections of a user:
//! - Connections register and receive an outbound frame queue
//! - A connection joins rooms keyed by user id
//! - `publish` pushes a frame to every connection in a room
//!
//! Delivery is best-effort. A room with no connection drops the event, as
//! does a connection whose small outbound buffer is full. Nothing is
//! replayed or retried.

mod rooms;

pub use rooms::{ConnectionHandle, ConnectionId, FanoutError, RoomRegistry, DEFAULT_QUEUE_CAPACITY};

use crate::types::UserId;
use serde::{Deserialize, Serialize};

/// Event pushed to (or received from) a real-time client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Event name, e.g. `receiveNotification`
    pub event: String,
    /// Event payload
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Frame {
    /// Create new frame
    #[inline]
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Error frame with a human-readable message
    #[inline]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(
            "error",
            serde_json::json!({ "message": message.into() }),
        )
    }
}

/// Outbound side of the fan-out channel as seen by the domain
#[cfg_attr(test, mockall::automock)]
pub trait Publisher: Send + Sync {
    /// Push `payload` under `event` to every connection in `recipient`'s room.
    ///
    /// Returns the number of connections reached; zero means dropped.
    fn publish(&self, recipient: UserId, event: &str, payload: &serde_json::Value) -> usize;
}
