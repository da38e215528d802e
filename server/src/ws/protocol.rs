//! Inbound frame decoding.
//!
//! Frames are JSON objects tagged by `type`. The page's htmx ws extension adds
//! a `HEADERS` object to every frame; unknown fields are ignored.

use serde::Deserialize;

use crate::error::RelayError;

pub const CHAT_NEW_JOIN: &str = "chat_new_join";
pub const CHAT_MESSAGE: &str = "chat_message";

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Join { name: String },
    Message { message: String },
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    name: Option<String>,
    message: Option<String>,
}

/// Decode a raw text frame into an `InboundEvent`.
///
/// Frames longer than `max_bytes`, non-JSON input, a missing `type`, or a
/// missing required field are `MalformedFrame`; an unrecognised `type` is
/// `UnknownEventType`.
pub fn decode_frame(raw: &str, max_bytes: usize) -> Result<InboundEvent, RelayError> {
    if raw.len() > max_bytes {
        return Err(RelayError::MalformedFrame(format!(
            "frame of {} bytes exceeds limit of {}",
            raw.len(),
            max_bytes
        )));
    }

    let frame: RawFrame = serde_json::from_str(raw)?;

    match frame.kind.as_str() {
        CHAT_NEW_JOIN => frame
            .name
            .map(|name| InboundEvent::Join { name })
            .ok_or_else(|| RelayError::MalformedFrame("chat_new_join without name".into())),
        CHAT_MESSAGE => frame
            .message
            .map(|message| InboundEvent::Message { message })
            .ok_or_else(|| RelayError::MalformedFrame("chat_message without message".into())),
        _ => Err(RelayError::UnknownEventType(frame.kind)),
    }
}
