//! Error taxonomy for the relay core.
//!
//! None of these are fatal: the connection actor logs them and keeps reading.

use thiserror::Error;

use crate::ws::registry::{ConnectionId, Identity};

#[derive(Debug, Error)]
pub enum RelayError {
    /// A connection sent `chat_new_join` while already holding an identity.
    #[error("connection {conn_id} already joined as {} ({})", .existing.name, .existing.id)]
    DuplicateRegistration {
        conn_id: ConnectionId,
        existing: Identity,
    },

    /// A `chat_message` arrived from a connection that never joined.
    #[error("connection {0} sent a chat message before joining")]
    UnregisteredSender(ConnectionId),

    /// The frame decoded but its `type` tag is not one we handle.
    #[error("unknown event type {0:?}")]
    UnknownEventType(String),

    /// The frame could not be decoded into an inbound event.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Unregister (or a repeated disconnect) for a connection not in the table.
    #[error("connection {0} is not registered")]
    NotFound(ConnectionId),

    /// The outbound queue of a connection is closed.
    #[error("failed to deliver to connection {0}")]
    DeliveryFailure(ConnectionId),
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::MalformedFrame(err.to_string())
    }
}
