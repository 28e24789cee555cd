//! Message types for the consumer-facing method channel.
//!
//! The consumer talks to Sendora through a request/response channel plus a
//! stream of unsolicited events, the same shape as a platform method channel:
//!
//! ```text
//! Consumer → Sendora:  MethodCall      {"id":1,"method":"connectToPeer","arguments":{"address":"aa:bb"}}
//! Sendora  → Consumer: MethodResponse  {"id":1,"success":true,"data":"Connecting to peer","error":null}
//! Sendora  → Consumer: ChannelEvent    {"event":"onConnected","arguments":"aa:bb"}
//! ```
//!
//! # Why separate wire types from domain types?
//!
//! The domain [`Event`] carries full [`Peer`] values (including the last-seen
//! timestamp), while the consumer only needs `{name, address}`.  The wire
//! types here are DTOs converted at the boundary with `From` impls, so the
//! JSON shape can stay stable while the domain evolves.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credentials::NetworkDetails;
use crate::domain::event::Event;
use crate::domain::peer::Peer;
use crate::error::CommandError;

pub const START_DISCOVERY: &str = "startDiscovery";
pub const STOP_DISCOVERY: &str = "stopDiscovery";
pub const CONNECT_TO_PEER: &str = "connectToPeer";
pub const CHECK_CONNECTION_STATUS: &str = "checkConnectionStatus";
pub const GENERATE_NETWORK_DETAILS: &str = "generateNetworkDetails";

// ── Consumer → Sendora ────────────────────────────────────────────────────────

/// A raw method invocation as received from the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    /// Correlation id echoed in the response.  Optional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub method: String,
    /// Method arguments; `null` when the method takes none.
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(id: Option<u64>, method: impl Into<String>, arguments: Value) -> Self {
        Self {
            id,
            method: method.into(),
            arguments,
        }
    }
}

/// A decoded consumer command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartDiscovery,
    StopDiscovery,
    /// Carries the raw address; validation belongs to the connection controller.
    ConnectToPeer { address: String },
    CheckConnectionStatus,
    GenerateNetworkDetails,
}

impl Command {
    /// Decodes a method call.
    ///
    /// # Errors
    ///
    /// - [`CommandError::NotImplemented`] for an unknown method name.
    /// - [`CommandError::InvalidAddress`] when `connectToPeer` has no string
    ///   `address` argument.
    pub fn from_call(call: &MethodCall) -> Result<Self, CommandError> {
        match call.method.as_str() {
            START_DISCOVERY => Ok(Command::StartDiscovery),
            STOP_DISCOVERY => Ok(Command::StopDiscovery),
            CONNECT_TO_PEER => {
                let address = call
                    .arguments
                    .get("address")
                    .and_then(Value::as_str)
                    .ok_or_else(|| CommandError::InvalidAddress("address is required".to_string()))?;
                Ok(Command::ConnectToPeer {
                    address: address.to_string(),
                })
            }
            CHECK_CONNECTION_STATUS => Ok(Command::CheckConnectionStatus),
            GENERATE_NETWORK_DETAILS => Ok(Command::GenerateNetworkDetails),
            other => Err(CommandError::NotImplemented(other.to_string())),
        }
    }

    /// Method name used on the wire.
    pub fn method(&self) -> &'static str {
        match self {
            Command::StartDiscovery => START_DISCOVERY,
            Command::StopDiscovery => STOP_DISCOVERY,
            Command::ConnectToPeer { .. } => CONNECT_TO_PEER,
            Command::CheckConnectionStatus => CHECK_CONNECTION_STATUS,
            Command::GenerateNetworkDetails => GENERATE_NETWORK_DETAILS,
        }
    }
}

// ── Sendora → Consumer ────────────────────────────────────────────────────────

/// Successful reply payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyPayload {
    /// Acknowledgment or status text.
    Text(String),
    NetworkDetails(NetworkDetails),
}

/// Error body of a failed reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl From<&CommandError> for ErrorBody {
    fn from(e: &CommandError) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

/// Response to one [`MethodCall`].
///
/// Every response has the same shape: `{ id, success, data, error }`, so the
/// consumer can branch on `success` without inspecting which fields exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodResponse {
    #[serde(default)]
    pub id: Option<u64>,
    pub success: bool,
    pub data: Option<ReplyPayload>,
    pub error: Option<ErrorBody>,
}

impl MethodResponse {
    pub fn ok(id: Option<u64>, data: ReplyPayload) -> Self {
        Self {
            id,
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(id: Option<u64>, error: ErrorBody) -> Self {
        Self {
            id,
            success: false,
            data: None,
            error: Some(error),
        }
    }

    pub fn from_result(id: Option<u64>, result: Result<ReplyPayload, CommandError>) -> Self {
        match result {
            Ok(data) => Self::ok(id, data),
            Err(e) => Self::err(id, ErrorBody::from(&e)),
        }
    }
}

/// Peer entry in `onPeersAvailable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerDto {
    pub name: String,
    pub address: String,
}

impl From<&Peer> for PeerDto {
    fn from(p: &Peer) -> Self {
        Self {
            name: p.display_name.clone(),
            address: p.address.to_string(),
        }
    }
}

/// Unsolicited event pushed to the consumer.
///
/// ```json
/// {"event":"onPeersAvailable","arguments":[{"name":"B","address":"aa:bb"}]}
/// {"event":"onConnected","arguments":"aa:bb"}
/// {"event":"onDisconnected"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "arguments")]
pub enum ChannelEvent {
    #[serde(rename = "onPeersAvailable")]
    PeersAvailable(Vec<PeerDto>),
    #[serde(rename = "onConnected")]
    Connected(String),
    #[serde(rename = "onDisconnected")]
    Disconnected,
    #[serde(rename = "onDiscoveryFailed", rename_all = "camelCase")]
    DiscoveryFailed { reason_code: i32 },
    #[serde(rename = "onConnectionFailed", rename_all = "camelCase")]
    ConnectionFailed { address: String, reason_code: i32 },
}

impl From<&Event> for ChannelEvent {
    fn from(event: &Event) -> Self {
        match event {
            Event::PeersAvailable { peers } => {
                ChannelEvent::PeersAvailable(peers.iter().map(PeerDto::from).collect())
            }
            Event::Connected { address } => ChannelEvent::Connected(address.clone()),
            Event::Disconnected => ChannelEvent::Disconnected,
            Event::DiscoveryFailed { reason_code } => ChannelEvent::DiscoveryFailed {
                reason_code: *reason_code,
            },
            Event::ConnectionFailed {
                address,
                reason_code,
            } => ChannelEvent::ConnectionFailed {
                address: address.clone(),
                reason_code: *reason_code,
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
