//! Per-connection event dispatch.
//!
//! A connection is either unjoined or joined. `chat_new_join` moves it to
//! joined, `chat_message` is only accepted once joined, and disconnect drops it
//! from the table. Every operation returns an explicit result; the caller
//! decides what to log.

use std::sync::Arc;

use crate::chat::render::{ChatEvent, Renderer};
use crate::error::RelayError;
use crate::ws::broadcast::{broadcast_all, broadcast_except, send_to, DeliveryReport};
use crate::ws::protocol::{decode_frame, InboundEvent};
use crate::ws::registry::{Connection, ConnectionId, Identity, Registry};

/// What a successfully dispatched frame did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Joined {
        identity: Identity,
        /// Deliveries of the join announcement.
        announced: DeliveryReport,
    },
    Message {
        sender: Identity,
        report: DeliveryReport,
    },
}

/// Departure of a joined connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub identity: Identity,
    pub report: DeliveryReport,
}

/// The registry and broadcast core, driven by the transport.
pub struct Relay {
    registry: Arc<Registry>,
    renderer: Arc<dyn Renderer>,
    max_frame_bytes: usize,
}

impl Relay {
    pub fn new(registry: Arc<Registry>, renderer: Arc<dyn Renderer>, max_frame_bytes: usize) -> Self {
        Self {
            registry,
            renderer,
            max_frame_bytes,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Identities are only assigned on join, so there is nothing to do yet.
    pub fn on_connect(&self, conn: &Connection) {
        tracing::debug!(conn_id = %conn.id(), "Connection opened");
    }

    /// Decode and dispatch one inbound text frame.
    pub fn on_frame(&self, conn: &Connection, raw: &str) -> Result<Outcome, RelayError> {
        match decode_frame(raw, self.max_frame_bytes)? {
            InboundEvent::Join { name } => self.join(conn, &name),
            InboundEvent::Message { message } => self.message(conn, &message),
        }
    }

    /// Drop a closed connection and tell everyone else it left.
    pub fn on_disconnect(&self, conn_id: ConnectionId) -> Result<Departure, RelayError> {
        let identity = self.registry.unregister(conn_id)?;
        let payload = self.renderer.render(ChatEvent::Left(&identity));
        let report = broadcast_except(&self.registry, &payload, conn_id);

        tracing::info!(
            conn_id = %conn_id,
            member_id = identity.id,
            name = %identity.name,
            recipients = report.delivered,
            members = self.registry.len(),
            "Member left"
        );

        Ok(Departure { identity, report })
    }

    /// Join announcement, then roster, then the private welcome. The joining
    /// connection is already a member, so it sees all three in that order.
    fn join(&self, conn: &Connection, name: &str) -> Result<Outcome, RelayError> {
        let identity = self.registry.register(conn, name)?;

        let announced = broadcast_all(
            &self.registry,
            &self.renderer.render(ChatEvent::Joined(&identity)),
        );

        let roster: Vec<Identity> = self
            .registry
            .snapshot_members()
            .into_iter()
            .map(|m| m.identity)
            .collect();
        broadcast_all(&self.registry, &self.renderer.render(ChatEvent::Roster(&roster)));

        send_to(conn, &self.renderer.render(ChatEvent::Welcome(&identity)));

        tracing::info!(
            conn_id = %conn.id(),
            member_id = identity.id,
            name = %identity.name,
            members = roster.len(),
            "Member joined"
        );

        Ok(Outcome::Joined { identity, announced })
    }

    fn message(&self, conn: &Connection, message: &str) -> Result<Outcome, RelayError> {
        let sender = self
            .registry
            .identity_of(conn.id())
            .ok_or(RelayError::UnregisteredSender(conn.id()))?;

        let payload = self.renderer.render(ChatEvent::Message {
            sender: &sender,
            message,
        });
        let report = broadcast_all(&self.registry, &payload);

        Ok(Outcome::Message { sender, report })
    }
}
