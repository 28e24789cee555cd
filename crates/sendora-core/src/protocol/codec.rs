//! JSON-lines framing for the method channel.
//!
//! Each frame is one JSON object on its own line.  The functions here work on
//! a single line without the trailing `\n`; the transport adds and strips the
//! newline.

use thiserror::Error;

use super::messages::{ChannelEvent, MethodCall, MethodResponse};
use crate::domain::event::Event;

/// Error produced while decoding or encoding a frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The line was not a valid [`MethodCall`].
    #[error("malformed request: {0}")]
    MalformedRequest(#[source] serde_json::Error),

    /// A frame could not be serialized.
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ProtocolError {
    /// Stable code reported to the consumer.
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::MalformedRequest(_) => "MALFORMED_REQUEST",
            ProtocolError::Encode(_) => "ENCODE_FAILED",
        }
    }
}

/// Decodes one request line.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedRequest`] if the line is not a JSON
/// object with at least a string `method` field.
pub fn decode_call(line: &str) -> Result<MethodCall, ProtocolError> {
    serde_json::from_str(line.trim()).map_err(ProtocolError::MalformedRequest)
}

/// Encodes a response as a single line (no trailing newline).
pub fn encode_response(response: &MethodResponse) -> Result<String, ProtocolError> {
    serde_json::to_string(response).map_err(ProtocolError::Encode)
}

/// Encodes a domain event as a single line (no trailing newline).
pub fn encode_event(event: &Event) -> Result<String, ProtocolError> {
    serde_json::to_string(&ChannelEvent::from(event)).map_err(ProtocolError::Encode)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
