//! Protocol module: consumer method-channel messages and their JSON-lines codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_call, encode_event, encode_response, ProtocolError};
pub use messages::*;
