//! # sendora-core
//!
//! Shared library for Sendora containing the peer-to-peer link state machines
//! and the command/event protocol spoken with the consuming application.
//!
//! This crate has no async runtime, no radio bindings and no I/O.  Everything
//! here is plain data plus transition logic, so it can be exercised directly
//! from unit tests.
//!
//! # Architecture overview (for beginners)
//!
//! Sendora lets two nearby devices find each other over a peer-to-peer Wi-Fi
//! link and form a group.  The platform radio reports what it sees through
//! unordered asynchronous callbacks; the job of this workspace is to turn those
//! callbacks into one consistent view of "which peers exist" and "are we
//! connected".
//!
//! - **`domain`** – The three state objects owned by the coordinator:
//!   [`PeerRegistry`], [`ConnectionController`] and [`DiscoverySession`], plus
//!   the attempt tokens used to recognise stale radio callbacks.
//!
//! - **`protocol`** – The consumer-facing boundary: decoding method calls into
//!   [`Command`]s, encoding replies and events as JSON lines.
//!
//! - **`credentials`** – Formatting of the human-readable network details
//!   handed to the consumer by `generateNetworkDetails`.

pub mod credentials;
pub mod domain;
pub mod error;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `sendora_core::PeerRegistry` instead of `sendora_core::domain::peer::PeerRegistry`.
pub use credentials::NetworkDetails;
pub use domain::address::{AddressError, DeviceAddress};
pub use domain::attempt::{AttemptToken, OperationFailed, OperationOutcome, TokenCounter};
pub use domain::connection::{
    ConnectDecision, ConnectResultTransition, ConnectionController, ConnectionInfo,
    ConnectionState, GroupRole,
};
pub use domain::discovery::{DiscoverySession, DiscoveryState, DiscoveryTransition, StartDecision, StopDecision};
pub use domain::event::Event;
pub use domain::peer::{Peer, PeerRegistry, SnapshotDiff};
pub use error::CommandError;
pub use protocol::codec::{decode_call, encode_event, encode_response, ProtocolError};
pub use protocol::messages::Command;
