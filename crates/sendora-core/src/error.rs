//! Consumer-facing command errors.
//!
//! Only failures the caller can act on synchronously live here.  Radio
//! failures reported after a command was accepted become state transitions
//! (see [`crate::OperationFailed`]) and never surface through this type.

use thiserror::Error;

use crate::domain::address::AddressError;

/// Error returned to the consumer for a rejected command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The command carried a missing, empty or malformed peer address.
    #[error("invalid peer address: {0}")]
    InvalidAddress(String),

    /// The radio could not be enabled, so discovery was not started.
    #[error("radio unavailable: {0}")]
    RadioUnavailable(String),

    /// The method name is not part of the protocol.
    #[error("method not implemented: {0}")]
    NotImplemented(String),

    /// The coordinator has been torn down.
    #[error("coordinator is shutting down")]
    ShuttingDown,
}

impl CommandError {
    /// Stable error code sent over the method channel.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::InvalidAddress(_) => "INVALID_ADDRESS",
            CommandError::RadioUnavailable(_) => "RADIO_UNAVAILABLE",
            CommandError::NotImplemented(_) => "NOT_IMPLEMENTED",
            CommandError::ShuttingDown => "SHUTTING_DOWN",
        }
    }
}

impl From<AddressError> for CommandError {
    fn from(e: AddressError) -> Self {
        CommandError::InvalidAddress(e.to_string())
    }
}
