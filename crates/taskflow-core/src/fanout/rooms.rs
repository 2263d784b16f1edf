//! Room registry for connection lifecycle and targeted push

use super::{Frame, Publisher};
use crate::types::UserId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use ulid::Ulid;

/// Unique connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Ulid);

impl ConnectionId {
    /// Generate new connection ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Room registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FanoutError {
    /// Connection was never registered or already left
    #[error("connection not registered: {0}")]
    UnknownConnection(ConnectionId),

    /// Registry no longer accepts connections
    #[error("fan-out channel is shut down")]
    ShutDown,

    /// Outbound queue of a connection is full; the frame was dropped
    #[error("outbound queue full for connection {0}")]
    QueueFull(ConnectionId),
}

/// Handle returned on registration
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Connection ID
    pub id: ConnectionId,
    /// Frames routed to this connection; ends when the registry drops it
    pub frames: mpsc::Receiver<Frame>,
}

#[derive(Debug)]
struct ConnectionEntry {
    sender: mpsc::Sender<Frame>,
    rooms: HashSet<UserId>,
}

/// Mapping from user id to the live connections in that user's room
///
/// Owned by the server state and injected wherever events are published;
/// `shutdown` closes every outbound queue. Each queue holds at most
/// `queue_capacity` frames; a frame for a full queue is dropped.
#[derive(Debug)]
pub struct RoomRegistry {
    connections: DashMap<ConnectionId, ConnectionEntry>,
    rooms: DashMap<UserId, HashSet<ConnectionId>>,
    closed: AtomicBool,
    queue_capacity: usize,
}

/// Default per-connection outbound queue size
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::with_queue_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl RoomRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty registry with a custom per-connection queue size
    #[must_use]
    pub fn with_queue_capacity(capacity: usize) -> Self {
        Self {
            connections: DashMap::new(),
            rooms: DashMap::new(),
            closed: AtomicBool::new(false),
            queue_capacity: capacity.max(1),
        }
    }

    /// Register a connection
    ///
    /// # Errors
    /// - `FanoutError::ShutDown` once `shutdown` ran
    pub fn connect(&self) -> Result<ConnectionHandle, FanoutError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FanoutError::ShutDown);
        }
        let id = ConnectionId::new();
        let (sender, frames) = mpsc::channel(self.queue_capacity);
        self.connections.insert(
            id,
            ConnectionEntry {
                sender,
                rooms: HashSet::new(),
            },
        );
        tracing::debug!(connection = %id, "connection registered");
        Ok(ConnectionHandle { id, frames })
    }

    /// Add a connection to `room`; joining twice is a no-op
    ///
    /// # Errors
    /// - `FanoutError::UnknownConnection` if the connection left
    pub fn join(&self, connection: ConnectionId, room: UserId) -> Result<(), FanoutError> {
        {
            let mut entry = self
                .connections
                .get_mut(&connection)
                .ok_or(FanoutError::UnknownConnection(connection))?;
            entry.rooms.insert(room);
        }
        self.rooms.entry(room).or_default().insert(connection);
        tracing::info!(connection = %connection, user = %room, "joined user room");
        Ok(())
    }

    /// Drop a connection and its room memberships
    pub fn leave_all(&self, connection: ConnectionId) {
        let Some((_, entry)) = self.connections.remove(&connection) else {
            return;
        };
        for room in entry.rooms {
            self.evict(room, connection);
        }
        tracing::debug!(connection = %connection, "connection left");
    }

    /// Close every connection and refuse new ones
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        let drained = self.connections.len();
        self.connections.clear();
        self.rooms.clear();
        tracing::info!(connections = drained, "fan-out channel shut down");
    }

    /// Live connection count
    #[inline]
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Connections currently in `room`
    #[must_use]
    pub fn room_size(&self, room: UserId) -> usize {
        self.rooms.get(&room).map_or(0, |members| members.len())
    }

    /// Push a frame to one connection, outside any room
    ///
    /// # Errors
    /// - `FanoutError::UnknownConnection` if the connection left
    /// - `FanoutError::QueueFull` if the client is not draining its queue
    pub fn send_to(&self, connection: ConnectionId, frame: Frame) -> Result<(), FanoutError> {
        let entry = self
            .connections
            .get(&connection)
            .ok_or(FanoutError::UnknownConnection(connection))?;
        entry.sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => FanoutError::QueueFull(connection),
            TrySendError::Closed(_) => FanoutError::UnknownConnection(connection),
        })
    }

    fn evict(&self, room: UserId, connection: ConnectionId) {
        if let Some(mut members) = self.rooms.get_mut(&room) {
            members.remove(&connection);
        }
        self.rooms.remove_if(&room, |_, members| members.is_empty());
    }
}

impl Publisher for RoomRegistry {
    fn publish(&self, recipient: UserId, event: &str, payload: &serde_json::Value) -> usize {
        let members: Vec<ConnectionId> = match self.rooms.get(&recipient) {
            Some(members) => members.iter().copied().collect(),
            None => {
                tracing::debug!(user = %recipient, event, "recipient offline, event dropped");
                return 0;
            }
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for id in members {
            let Some(entry) = self.connections.get(&id) else {
                dead.push(id);
                continue;
            };
            match entry.sender.try_send(Frame::new(event, payload.clone())) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(connection = %id, user = %recipient, event, "outbound queue full, event dropped");
                }
                Err(TrySendError::Closed(_)) => dead.push(id),
            }
        }
        for id in dead {
            self.leave_all(id);
            self.evict(recipient, id);
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn publish_reaches_every_connection_in_room() {
        let registry = RoomRegistry::new();
        let user = UserId::new();
        let mut a = registry.connect().unwrap();
        let mut b = registry.connect().unwrap();
        registry.join(a.id, user).unwrap();
        registry.join(b.id, user).unwrap();

        let delivered = registry.publish(user, "receiveNotification", &json!({"n": 1}));
        assert_eq!(delivered, 2);
        assert_eq!(a.frames.recv().await.unwrap().event, "receiveNotification");
        assert_eq!(b.frames.recv().await.unwrap().data, json!({"n": 1}));
    }

    #[test]
    fn publish_to_empty_room_is_dropped() {
        let registry = RoomRegistry::new();
        assert_eq!(registry.publish(UserId::new(), "notification", &json!({})), 0);
    }

    #[tokio::test]
    async fn rooms_are_isolated_per_user() {
        let registry = RoomRegistry::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let mut conn = registry.connect().unwrap();
        registry.join(conn.id, alice).unwrap();

        assert_eq!(registry.publish(bob, "notification", &json!({})), 0);
        assert!(conn.frames.try_recv().is_err());
    }

    #[test]
    fn leave_all_empties_rooms() {
        let registry = RoomRegistry::new();
        let user = UserId::new();
        let conn = registry.connect().unwrap();
        registry.join(conn.id, user).unwrap();
        registry.join(conn.id, user).unwrap();
        assert_eq!(registry.room_size(user), 1);

        registry.leave_all(conn.id);
        assert_eq!(registry.room_size(user), 0);
        assert_eq!(registry.connection_count(), 0);
        assert_eq!(
            registry.join(conn.id, user),
            Err(FanoutError::UnknownConnection(conn.id))
        );
    }

    #[test]
    fn closed_receivers_are_pruned_on_publish() {
        let registry = RoomRegistry::new();
        let user = UserId::new();
        let conn = registry.connect().unwrap();
        registry.join(conn.id, user).unwrap();
        drop(conn.frames);

        assert_eq!(registry.publish(user, "notification", &json!({})), 0);
        assert_eq!(registry.room_size(user), 0);
        assert_eq!(registry.connection_count(), 0);
    }

    #[tokio::test]
    async fn send_to_targets_one_connection() {
        let registry = RoomRegistry::new();
        let mut conn = registry.connect().unwrap();
        registry.send_to(conn.id, Frame::error("nope")).unwrap();

        let frame = conn.frames.recv().await.unwrap();
        assert_eq!(frame.event, "error");
        assert_eq!(frame.data["message"], "nope");

        registry.leave_all(conn.id);
        assert!(registry.send_to(conn.id, Frame::error("gone")).is_err());
    }

    #[tokio::test]
    async fn stalled_connection_queue_stays_capped() {
        let registry = RoomRegistry::with_queue_capacity(4);
        let user = UserId::new();
        let mut conn = registry.connect().unwrap();
        registry.join(conn.id, user).unwrap();

        let delivered: usize = (0..1_000)
            .map(|n| registry.publish(user, "notification", &json!({ "n": n })))
            .sum();
        assert_eq!(delivered, 4);
        assert_eq!(registry.room_size(user), 1);
        assert_eq!(
            registry.send_to(conn.id, Frame::error("late")),
            Err(FanoutError::QueueFull(conn.id))
        );

        let mut received = Vec::new();
        while let Ok(frame) = conn.frames.try_recv() {
            received.push(frame.data["n"].as_i64().unwrap());
        }
        assert_eq!(received, vec![0, 1, 2, 3]);

        assert_eq!(registry.publish(user, "notification", &json!({ "n": 1_000 })), 1);
    }

    #[tokio::test]
    async fn shutdown_closes_queues_and_refuses_connections() {
        let registry = RoomRegistry::new();
        let mut conn = registry.connect().unwrap();
        registry.shutdown();

        assert!(conn.frames.recv().await.is_none());
        assert_eq!(registry.connect().unwrap_err(), FanoutError::ShutDown);
    }
}
