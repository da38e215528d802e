//! Connection registry: the membership table and identity counter.
//!
//! A connection is in the table iff it has joined and has not disconnected.
//! Identities are allocated from a process-wide counter that starts at 0 and
//! is never reset or reused.

use axum::extract::ws::Message;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::RelayError;

/// Sender half of a connection's outbound queue. The writer task owns the receiver.
pub type ConnectionSender = mpsc::UnboundedSender<Message>;

/// Opaque key for one live socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Handle to one client's outbound channel. Cloning it does not keep the socket open.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    sender: ConnectionSender,
}

impl Connection {
    pub fn new(sender: ConnectionSender) -> Self {
        Self {
            id: ConnectionId::new(),
            sender,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a text payload. Never blocks; fails only once the writer is gone.
    pub fn send_text(&self, payload: &str) -> Result<(), RelayError> {
        self.send(Message::Text(payload.to_owned().into()))
    }

    pub fn send(&self, message: Message) -> Result<(), RelayError> {
        self.sender
            .send(message)
            .map_err(|_| RelayError::DeliveryFailure(self.id))
    }
}

/// The (id, name) pair assigned on join. Names are client-supplied and may collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: u64,
    pub name: String,
}

/// One row of the membership table.
#[derive(Debug, Clone)]
pub struct Member {
    pub connection: Connection,
    pub identity: Identity,
}

#[derive(Debug, Default)]
pub struct Registry {
    members: RwLock<HashMap<ConnectionId, Member>>,
    next_id: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next identity to `conn` and add it to the table.
    ///
    /// A connection that already joined keeps its identity and the call fails
    /// with `DuplicateRegistration`; no id is consumed in that case.
    pub fn register(&self, conn: &Connection, name: &str) -> Result<Identity, RelayError> {
        let mut members = self.members.write();

        if let Some(existing) = members.get(&conn.id()) {
            return Err(RelayError::DuplicateRegistration {
                conn_id: conn.id(),
                existing: existing.identity.clone(),
            });
        }

        let identity = Identity {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
        };
        members.insert(
            conn.id(),
            Member {
                connection: conn.clone(),
                identity: identity.clone(),
            },
        );

        tracing::debug!(
            conn_id = %conn.id(),
            member_id = identity.id,
            members = members.len(),
            "Connection registered"
        );

        Ok(identity)
    }

    /// Remove `conn_id` from the table and return the identity it held.
    pub fn unregister(&self, conn_id: ConnectionId) -> Result<Identity, RelayError> {
        let mut members = self.members.write();
        let member = members
            .remove(&conn_id)
            .ok_or(RelayError::NotFound(conn_id))?;

        tracing::debug!(
            conn_id = %conn_id,
            member_id = member.identity.id,
            members = members.len(),
            "Connection unregistered"
        );

        Ok(member.identity)
    }

    /// Point-in-time copy of the table, ordered by identity id.
    pub fn snapshot_members(&self) -> Vec<Member> {
        let mut snapshot: Vec<Member> = self.members.read().values().cloned().collect();
        snapshot.sort_by_key(|m| m.identity.id);
        snapshot
    }

    pub fn identity_of(&self, conn_id: ConnectionId) -> Option<Identity> {
        self.members
            .read()
            .get(&conn_id)
            .map(|m| m.identity.clone())
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }
}
