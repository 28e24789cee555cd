//! ConnectionController: connection state and the single in-flight attempt.
//!
//! # Two signal sources
//!
//! The radio reports on a connection through two independent channels:
//!
//! 1. The **connect result** for a specific request ("I accepted / rejected
//!    your request to connect to `aa:bb`").
//! 2. **Connection info** notifications, which describe the group the radio
//!    is actually part of right now.
//!
//! They can arrive in either order, and the radio can form or tear down a
//! group without any request from us.  Connection info is therefore
//! authoritative: it overrides whatever the connect result said.  Connect
//! results are only applied when their [`AttemptToken`] matches the attempt
//! in flight.
//!
//! ```text
//!                 connect(A)                 info{formed}
//! Disconnected ─────────────► Connecting{A} ─────────────► Connected
//!      ▲                        │      ▲                       │
//!      │      result(failure)   │      │ connect(B)            │
//!      │                        ▼      │ (supersedes A)        │
//!      │                      Failed ──┘                       │
//!      └────────────────── info{not formed} ◄──────────────────┘
//!                        (from any state)
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::address::{AddressError, DeviceAddress};
use super::attempt::{AttemptToken, OperationFailed, OperationOutcome, TokenCounter};

/// Which side of a formed group this device is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupRole {
    /// This device hosts the group.
    GroupOwner,
    /// This device joined a group hosted by the peer.
    Client,
}

/// Connection state as seen by the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    /// A connect request is in flight.
    Connecting { target: DeviceAddress },
    /// A group is formed.
    Connected {
        role: GroupRole,
        peer_address: String,
    },
    /// The radio rejected the most recent connect request.
    Failed {
        target: DeviceAddress,
        reason_code: i32,
    },
}

impl ConnectionState {
    /// Text returned by the `checkConnectionStatus` command.
    pub fn status_line(&self) -> String {
        match self {
            ConnectionState::Connected { peer_address, .. } => {
                format!("Connected to {peer_address}")
            }
            _ => "Not connected".to_string(),
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}

/// Ground-truth group information reported by the radio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub group_formed: bool,
    pub is_group_owner: bool,
    /// Address of the group owner, when the radio knows it.
    pub owner_address: Option<String>,
}

impl ConnectionInfo {
    /// Info describing "no group".
    pub fn not_formed() -> Self {
        Self {
            group_formed: false,
            is_group_owner: false,
            owner_address: None,
        }
    }

    /// Info describing a formed group.
    pub fn formed(is_group_owner: bool, owner_address: impl Into<String>) -> Self {
        Self {
            group_formed: true,
            is_group_owner,
            owner_address: Some(owner_address.into()),
        }
    }
}

/// What the coordinator must do after [`ConnectionController::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectDecision {
    /// Ask the radio to connect, tagging the request with `token`.
    Initiate {
        target: DeviceAddress,
        token: AttemptToken,
        /// The attempt this one replaces, if any.
        superseded: Option<DeviceAddress>,
    },
    /// Already connecting to this address; nothing to do.
    AlreadyConnecting { target: DeviceAddress },
    /// Already connected to this address; nothing to do.
    AlreadyConnected { peer_address: String },
}

/// Effect of a connect result callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectResultTransition {
    /// The token does not belong to the attempt in flight.
    Stale,
    /// The radio accepted the request; waiting on connection info.
    Accepted { target: DeviceAddress },
    /// The radio rejected the request; state is now `Failed`.
    Failed {
        target: DeviceAddress,
        failure: OperationFailed,
    },
}

/// Owns [`ConnectionState`] and the in-flight attempt token.
#[derive(Debug, Default)]
pub struct ConnectionController {
    state: ConnectionState,
    in_flight: Option<AttemptToken>,
    tokens: TokenCounter,
}

impl ConnectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a connection to `raw_address`.
    ///
    /// A request for a different address than the one currently being
    /// connected supersedes it: the old token stops being current and its
    /// result will be ignored when it arrives.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] for an empty or malformed address.  The state
    /// is left untouched.
    pub fn connect(&mut self, raw_address: &str) -> Result<ConnectDecision, AddressError> {
        let target = DeviceAddress::parse(raw_address)?;

        let superseded = match &self.state {
            ConnectionState::Connecting { target: current } if *current == target => {
                return Ok(ConnectDecision::AlreadyConnecting { target });
            }
            ConnectionState::Connected { peer_address, .. }
                if peer_address.eq_ignore_ascii_case(target.as_str()) =>
            {
                return Ok(ConnectDecision::AlreadyConnected {
                    peer_address: peer_address.clone(),
                });
            }
            ConnectionState::Connecting { target: current } => Some(current.clone()),
            _ => None,
        };

        let token = self.tokens.next();
        self.in_flight = Some(token);
        self.state = ConnectionState::Connecting {
            target: target.clone(),
        };

        Ok(ConnectDecision::Initiate {
            target,
            token,
            superseded,
        })
    }

    /// Applies the radio's result for a connect request.
    pub fn on_connect_result(
        &mut self,
        token: AttemptToken,
        outcome: OperationOutcome,
    ) -> ConnectResultTransition {
        if self.in_flight != Some(token) {
            debug!("discarding stale connect result {token}");
            return ConnectResultTransition::Stale;
        }
        let target = match &self.state {
            ConnectionState::Connecting { target } => target.clone(),
            other => {
                // in_flight is only Some while Connecting; treat anything else as stale.
                debug!("connect result {token} arrived in state {other:?}");
                return ConnectResultTransition::Stale;
            }
        };

        match outcome {
            Ok(()) => ConnectResultTransition::Accepted { target },
            Err(failure) => {
                self.in_flight = None;
                self.state = ConnectionState::Failed {
                    target: target.clone(),
                    reason_code: failure.reason_code,
                };
                ConnectResultTransition::Failed { target, failure }
            }
        }
    }

    /// Applies ground-truth connection info.
    ///
    /// Returns the new state when it differs from the previous one.
    pub fn on_connection_info(&mut self, info: &ConnectionInfo) -> Option<ConnectionState> {
        let retired = match &self.state {
            ConnectionState::Connecting { target } | ConnectionState::Failed { target, .. } => {
                Some(target.to_string())
            }
            _ => None,
        };
        self.in_flight = None;

        let next = if info.group_formed {
            let role = if info.is_group_owner {
                GroupRole::GroupOwner
            } else {
                GroupRole::Client
            };
            let peer_address = info
                .owner_address
                .clone()
                .or(retired)
                .unwrap_or_default();
            ConnectionState::Connected { role, peer_address }
        } else {
            ConnectionState::Disconnected
        };

        if next == self.state {
            return None;
        }
        self.state = next.clone();
        Some(next)
    }

    /// Read-only snapshot for status queries.
    pub fn status(&self) -> &ConnectionState {
        &self.state
    }

    /// Token of the attempt whose result is still awaited.
    pub fn in_flight(&self) -> Option<AttemptToken> {
        self.in_flight
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> DeviceAddress {
        DeviceAddress::parse(s).unwrap()
    }

    fn initiate(ctrl: &mut ConnectionController, address: &str) -> AttemptToken {
        match ctrl.connect(address).unwrap() {
            ConnectDecision::Initiate { token, .. } => token,
            other => panic!("expected Initiate, got {other:?}"),
        }
    }

    #[test]
    fn test_initial_state_is_disconnected() {
        let ctrl = ConnectionController::new();
        assert_eq!(ctrl.status(), &ConnectionState::Disconnected);
        assert_eq!(ctrl.in_flight(), None);
    }

    #[test]
    fn test_connect_empty_address_fails_without_transition() {
        // Arrange
        let mut ctrl = ConnectionController::new();

        // Act
        let result = ctrl.connect("");

        // Assert
        assert_eq!(result, Err(AddressError::Empty));
        assert_eq!(ctrl.status(), &ConnectionState::Disconnected);
        assert_eq!(ctrl.in_flight(), None);
    }

    #[test]
    fn test_connect_malformed_address_keeps_connecting_state() {
        let mut ctrl = ConnectionController::new();
        initiate(&mut ctrl, "aa:bb");

        assert!(ctrl.connect("not-an-address").is_err());

        assert_eq!(
            ctrl.status(),
            &ConnectionState::Connecting { target: addr("aa:bb") }
        );
    }

    #[test]
    fn test_connect_moves_to_connecting() {
        let mut ctrl = ConnectionController::new();

        let decision = ctrl.connect("aa:bb").unwrap();

        assert!(matches!(
            decision,
            ConnectDecision::Initiate { superseded: None, .. }
        ));
        assert_eq!(
            ctrl.status(),
            &ConnectionState::Connecting { target: addr("aa:bb") }
        );
    }

    #[test]
    fn test_connect_same_address_while_connecting_is_idempotent() {
        let mut ctrl = ConnectionController::new();
        let first = initiate(&mut ctrl, "aa:bb");

        let decision = ctrl.connect("AA:BB").unwrap();

        assert_eq!(
            decision,
            ConnectDecision::AlreadyConnecting { target: addr("aa:bb") }
        );
        assert_eq!(ctrl.in_flight(), Some(first));
    }

    #[test]
    fn test_connect_different_address_supersedes_prior_attempt() {
        // Arrange
        let mut ctrl = ConnectionController::new();
        let token_a = initiate(&mut ctrl, "aa:aa");

        // Act
        let decision = ctrl.connect("bb:bb").unwrap();

        // Assert
        let token_b = match decision {
            ConnectDecision::Initiate {
                token, superseded, ..
            } => {
                assert_eq!(superseded, Some(addr("aa:aa")));
                token
            }
            other => panic!("expected Initiate, got {other:?}"),
        };
        assert!(token_b > token_a);
        assert_eq!(
            ctrl.status(),
            &ConnectionState::Connecting { target: addr("bb:bb") }
        );
    }

    #[test]
    fn test_late_result_for_superseded_attempt_is_ignored() {
        // Arrange
        let mut ctrl = ConnectionController::new();
        let token_a = initiate(&mut ctrl, "aa:aa");
        initiate(&mut ctrl, "bb:bb");

        // Act: A's failure arrives after B was requested.
        let transition = ctrl.on_connect_result(token_a, Err(OperationFailed::new(2)));

        // Assert
        assert_eq!(transition, ConnectResultTransition::Stale);
        assert_eq!(
            ctrl.status(),
            &ConnectionState::Connecting { target: addr("bb:bb") }
        );
    }

    #[test]
    fn test_successful_result_keeps_connecting_pending_info() {
        let mut ctrl = ConnectionController::new();
        let token = initiate(&mut ctrl, "aa:bb");

        let transition = ctrl.on_connect_result(token, Ok(()));

        assert_eq!(
            transition,
            ConnectResultTransition::Accepted { target: addr("aa:bb") }
        );
        assert_eq!(
            ctrl.status(),
            &ConnectionState::Connecting { target: addr("aa:bb") }
        );
    }

    #[test]
    fn test_failed_result_moves_to_failed() {
        let mut ctrl = ConnectionController::new();
        let token = initiate(&mut ctrl, "aa:bb");

        let transition = ctrl.on_connect_result(token, Err(OperationFailed::new(2)));

        assert!(matches!(transition, ConnectResultTransition::Failed { .. }));
        assert_eq!(
            ctrl.status(),
            &ConnectionState::Failed {
                target: addr("aa:bb"),
                reason_code: 2
            }
        );
        assert_eq!(ctrl.in_flight(), None);
    }

    #[test]
    fn test_duplicate_result_after_failure_is_stale() {
        let mut ctrl = ConnectionController::new();
        let token = initiate(&mut ctrl, "aa:bb");
        ctrl.on_connect_result(token, Err(OperationFailed::new(0)));

        let transition = ctrl.on_connect_result(token, Ok(()));

        assert_eq!(transition, ConnectResultTransition::Stale);
    }

    #[test]
    fn test_group_formed_info_connects_from_connecting() {
        let mut ctrl = ConnectionController::new();
        initiate(&mut ctrl, "aa:bb");

        let changed = ctrl.on_connection_info(&ConnectionInfo::formed(false, "aa:bb"));

        assert_eq!(
            changed,
            Some(ConnectionState::Connected {
                role: GroupRole::Client,
                peer_address: "aa:bb".to_string()
            })
        );
        assert_eq!(ctrl.in_flight(), None);
    }

    #[test]
    fn test_group_formed_info_overrides_failed_state() {
        let mut ctrl = ConnectionController::new();
        let token = initiate(&mut ctrl, "aa:bb");
        ctrl.on_connect_result(token, Err(OperationFailed::new(2)));

        ctrl.on_connection_info(&ConnectionInfo::formed(true, "192.168.49.1"));

        assert_eq!(
            ctrl.status(),
            &ConnectionState::Connected {
                role: GroupRole::GroupOwner,
                peer_address: "192.168.49.1".to_string()
            }
        );
    }

    #[test]
    fn test_group_formed_without_owner_address_falls_back_to_target() {
        let mut ctrl = ConnectionController::new();
        initiate(&mut ctrl, "aa:bb");
        let info = ConnectionInfo {
            group_formed: true,
            is_group_owner: false,
            owner_address: None,
        };

        ctrl.on_connection_info(&info);

        assert_eq!(ctrl.status().status_line(), "Connected to aa:bb");
    }

    #[test]
    fn test_not_formed_info_forces_disconnected_from_every_state() {
        // Connecting
        let mut ctrl = ConnectionController::new();
        initiate(&mut ctrl, "aa:bb");
        ctrl.on_connection_info(&ConnectionInfo::not_formed());
        assert_eq!(ctrl.status(), &ConnectionState::Disconnected);
        assert_eq!(ctrl.in_flight(), None);

        // Connected
        ctrl.on_connection_info(&ConnectionInfo::formed(false, "aa:bb"));
        ctrl.on_connection_info(&ConnectionInfo::not_formed());
        assert_eq!(ctrl.status(), &ConnectionState::Disconnected);

        // Failed
        let token = initiate(&mut ctrl, "aa:bb");
        ctrl.on_connect_result(token, Err(OperationFailed::new(0)));
        ctrl.on_connection_info(&ConnectionInfo::not_formed());
        assert_eq!(ctrl.status(), &ConnectionState::Disconnected);

        // Disconnected
        assert_eq!(ctrl.on_connection_info(&ConnectionInfo::not_formed()), None);
        assert_eq!(ctrl.status(), &ConnectionState::Disconnected);
    }

    #[test]
    fn test_result_after_info_retired_attempt_is_stale() {
        let mut ctrl = ConnectionController::new();
        let token = initiate(&mut ctrl, "aa:bb");
        ctrl.on_connection_info(&ConnectionInfo::formed(false, "aa:bb"));

        let transition = ctrl.on_connect_result(token, Err(OperationFailed::new(0)));

        assert_eq!(transition, ConnectResultTransition::Stale);
        assert!(matches!(ctrl.status(), ConnectionState::Connected { .. }));
    }

    #[test]
    fn test_connect_to_current_peer_while_connected_is_noop() {
        let mut ctrl = ConnectionController::new();
        initiate(&mut ctrl, "aa:bb");
        ctrl.on_connection_info(&ConnectionInfo::formed(false, "aa:bb"));

        let decision = ctrl.connect("aa:bb").unwrap();

        assert_eq!(
            decision,
            ConnectDecision::AlreadyConnected {
                peer_address: "aa:bb".to_string()
            }
        );
        assert!(matches!(ctrl.status(), ConnectionState::Connected { .. }));
    }

    #[test]
    fn test_repeated_identical_info_reports_no_change() {
        let mut ctrl = ConnectionController::new();
        let info = ConnectionInfo::formed(false, "aa:bb");

        assert!(ctrl.on_connection_info(&info).is_some());
        assert!(ctrl.on_connection_info(&info).is_none());
    }

    #[test]
    fn test_status_line_texts() {
        assert_eq!(ConnectionState::Disconnected.status_line(), "Not connected");
        assert_eq!(
            ConnectionState::Connecting { target: addr("aa:bb") }.status_line(),
            "Not connected"
        );
        assert_eq!(
            ConnectionState::Connected {
                role: GroupRole::Client,
                peer_address: "aa:bb".to_string()
            }
            .status_line(),
            "Connected to aa:bb"
        );
    }
}
