//! CommandDispatcher: turns method-channel calls into coordinator requests.
//!
//! The dispatcher owns no state of its own.  It decodes a [`MethodCall`],
//! forwards link commands to the [`CoordinatorHandle`] and answers
//! `generateNetworkDetails` locally, then wraps the outcome in a
//! [`MethodResponse`] with the caller's correlation id.

use sendora_core::credentials::{DEFAULT_PASSWORD_PREFIX, DEFAULT_SSID_PREFIX};
use sendora_core::protocol::messages::{MethodCall, MethodResponse, ReplyPayload};
use sendora_core::{Command, CommandError, NetworkDetails};
use tracing::debug;

use super::coordinator::CoordinatorHandle;

/// Prefixes used by `generateNetworkDetails`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPrefixes {
    pub ssid: String,
    pub password: String,
}

impl Default for CredentialPrefixes {
    fn default() -> Self {
        Self {
            ssid: DEFAULT_SSID_PREFIX.to_string(),
            password: DEFAULT_PASSWORD_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    coordinator: CoordinatorHandle,
    prefixes: CredentialPrefixes,
}

impl CommandDispatcher {
    pub fn new(coordinator: CoordinatorHandle, prefixes: CredentialPrefixes) -> Self {
        Self {
            coordinator,
            prefixes,
        }
    }

    /// Decodes and executes one call.  Always produces a response.
    pub async fn handle_call(&self, call: &MethodCall) -> MethodResponse {
        let result = match Command::from_call(call) {
            Ok(command) => self.dispatch(command).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            debug!("{} failed: {e}", call.method);
        }
        MethodResponse::from_result(call.id, result)
    }

    /// Executes a decoded command.
    pub async fn dispatch(&self, command: Command) -> Result<ReplyPayload, CommandError> {
        debug!("dispatching {}", command.method());
        let ack = match command {
            Command::StartDiscovery => self.coordinator.start_discovery().await?,
            Command::StopDiscovery => self.coordinator.stop_discovery().await?,
            Command::ConnectToPeer { address } => self.coordinator.connect(address).await?,
            Command::CheckConnectionStatus => {
                let state = self.coordinator.status().await?;
                return Ok(ReplyPayload::Text(state.status_line()));
            }
            Command::GenerateNetworkDetails => {
                return Ok(ReplyPayload::NetworkDetails(NetworkDetails::generate(
                    &self.prefixes.ssid,
                    &self.prefixes.password,
                )));
            }
        };
        Ok(ReplyPayload::Text(ack.message().to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
