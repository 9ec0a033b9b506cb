//! Connection and room registry.
//!
//! DESIGN
//! ======
//! Every live connection, websocket or polling, gets a UUID and a bounded
//! outbound queue. Rooms are sets of connection ids keyed by room name.
//! Emitting to a room clones the envelope into each member's queue with
//! `try_send`: a slow client whose queue is full misses that envelope rather
//! than stalling the broadcaster. Emitting to an empty or unknown room is a
//! no-op. Disconnecting removes the connection from every room it joined,
//! and a room with no members is forgotten.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use events::{Envelope, Room};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

/// Outbound queue depth per connection.
pub const CONNECTION_BUFFER: usize = 256;

pub type ConnectionId = Uuid;

struct Connection {
    tx: mpsc::Sender<Envelope>,
    rooms: HashSet<String>,
}

#[derive(Default)]
struct Registry {
    connections: HashMap<ConnectionId, Connection>,
    rooms: HashMap<String, HashSet<ConnectionId>>,
}

#[derive(Clone, Default)]
pub struct RoomRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl RoomRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return its id plus the queue to drain.
    pub async fn connect(&self) -> (ConnectionId, mpsc::Receiver<Envelope>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER);
        let mut registry = self.inner.write().await;
        registry.connections.insert(id, Connection { tx, rooms: HashSet::new() });
        (id, rx)
    }

    /// Forget a connection. Returns `false` if it was already gone.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let mut registry = self.inner.write().await;
        let Some(connection) = registry.connections.remove(&id) else {
            return false;
        };
        for name in connection.rooms {
            if let Some(members) = registry.rooms.get_mut(&name) {
                members.remove(&id);
                if members.is_empty() {
                    registry.rooms.remove(&name);
                }
            }
        }
        true
    }

    /// Add a connection to a room. Returns `false` for unknown connections.
    pub async fn join(&self, id: ConnectionId, room: &Room) -> bool {
        let name = room.name();
        let mut registry = self.inner.write().await;
        let Some(connection) = registry.connections.get_mut(&id) else {
            return false;
        };
        connection.rooms.insert(name.clone());
        registry.rooms.entry(name).or_default().insert(id);
        true
    }

    /// Remove a connection from a room. Returns `false` if it was not a member.
    pub async fn leave(&self, id: ConnectionId, room: &Room) -> bool {
        let name = room.name();
        let mut registry = self.inner.write().await;
        let Some(connection) = registry.connections.get_mut(&id) else {
            return false;
        };
        if !connection.rooms.remove(&name) {
            return false;
        }
        if let Some(members) = registry.rooms.get_mut(&name) {
            members.remove(&id);
            if members.is_empty() {
                registry.rooms.remove(&name);
            }
        }
        true
    }

    /// Queue an envelope for every member of `room`. Returns how many
    /// members accepted it.
    pub async fn emit(&self, room: &Room, envelope: &Envelope) -> usize {
        let registry = self.inner.read().await;
        let Some(members) = registry.rooms.get(&room.name()) else {
            return 0;
        };
        members
            .iter()
            .filter_map(|id| registry.connections.get(id).map(|c| (id, c)))
            .filter(|(id, connection)| offer(**id, &connection.tx, envelope))
            .count()
    }

    /// Queue an envelope for every connection.
    pub async fn emit_all(&self, envelope: &Envelope) -> usize {
        let registry = self.inner.read().await;
        registry
            .connections
            .iter()
            .filter(|(id, connection)| offer(**id, &connection.tx, envelope))
            .count()
    }

    pub async fn member_count(&self, room: &Room) -> usize {
        self.inner.read().await.rooms.get(&room.name()).map_or(0, HashSet::len)
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    pub async fn is_connected(&self, id: ConnectionId) -> bool {
        self.inner.read().await.connections.contains_key(&id)
    }

    /// Room names a connection belongs to, sorted.
    pub async fn rooms_of(&self, id: ConnectionId) -> Vec<String> {
        let registry = self.inner.read().await;
        let mut names: Vec<String> = registry
            .connections
            .get(&id)
            .map(|c| c.rooms.iter().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

fn offer(id: ConnectionId, tx: &mpsc::Sender<Envelope>, envelope: &Envelope) -> bool {
    match tx.try_send(envelope.clone()) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!(connection_id = %id, "rooms: outbound queue full, dropping envelope");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!(connection_id = %id, "rooms: connection closing, dropping envelope");
            false
        }
    }
}

#[cfg(test)]
#[path = "rooms_test.rs"]
mod tests;
