//! Radio Subsystem port.
//!
//! The coordinator never talks to a radio driver directly.  It depends on the
//! [`RadioSubsystem`] trait, and drivers report back through the
//! [`RadioEventSink`] they receive when the coordinator subscribes.
//!
//! Every request is fire-and-request: trait methods return immediately and
//! the outcome arrives later as a [`RadioEvent`].  Requests that can fail are
//! tagged with an [`AttemptToken`] which the driver echoes in its
//! [`RadioEvent::OperationResult`], so the coordinator can tell a current
//! result from a stale one.
//!
//! # Dangling callbacks
//!
//! A driver may still hold a sink (or a clone of it, on a worker thread) after
//! the coordinator has torn down.  The sink shares an "active" flag with the
//! coordinator; once teardown clears it, every delivery is dropped.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sendora_core::{AttemptToken, ConnectionInfo, DeviceAddress, OperationOutcome, Peer};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::coordinator::CoordinatorMessage;

/// Error type for synchronous radio calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RadioError {
    /// The radio could not be switched on.
    #[error("radio could not be enabled: {0}")]
    EnableFailed(String),

    /// The driver refused the subscription.
    #[error("radio subscription rejected: {0}")]
    SubscribeFailed(String),
}

/// Which asynchronous request a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioOperation {
    Discover,
    StopDiscovery,
    Connect,
}

/// Notification reported by a radio driver.
#[derive(Debug, Clone, PartialEq)]
pub enum RadioEvent {
    /// The full set of currently visible peers.
    PeersChanged { snapshot: Vec<Peer> },
    /// Ground-truth group information.
    ConnectionInfo { info: ConnectionInfo },
    /// Result of a tagged request.
    OperationResult {
        op: RadioOperation,
        token: AttemptToken,
        outcome: OperationOutcome,
    },
}

/// Parameters of a connect request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub address: DeviceAddress,
    /// Preference for hosting the group, 0 (least) to 15 (most).
    pub group_owner_intent: u8,
}

/// The operations a radio driver offers the coordinator.
///
/// Implementations must not block: anything that takes time is answered
/// later through the subscribed [`RadioEventSink`].
pub trait RadioSubsystem: Send + Sync {
    /// Whether the radio is currently switched on.
    fn is_enabled(&self) -> bool;

    /// Switches the radio on.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError::EnableFailed`] if the radio stays off.
    fn enable(&self) -> Result<(), RadioError>;

    /// Switches the radio off.
    fn disable(&self);

    /// Starts peer discovery; answered with a `Discover` result.
    fn discover_peers(&self, token: AttemptToken);

    /// Stops peer discovery; answered with a `StopDiscovery` result.
    fn stop_peer_discovery(&self, token: AttemptToken);

    /// Starts group negotiation with a peer; answered with a `Connect` result.
    fn connect(&self, request: &ConnectRequest, token: AttemptToken);

    /// Asks for a [`RadioEvent::ConnectionInfo`] describing the current group.
    fn request_connection_info(&self);

    /// Registers `sink` for peer-list, connection-info and result callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError::SubscribeFailed`] if the driver cannot accept
    /// another subscriber.
    fn subscribe(&self, sink: RadioEventSink) -> Result<Subscription, RadioError>;
}

/// Delivery handle given to a radio driver.
///
/// Cloning is cheap; all clones share the coordinator's mailbox and its
/// active flag.
#[derive(Debug, Clone)]
pub struct RadioEventSink {
    mailbox: mpsc::UnboundedSender<CoordinatorMessage>,
    active: Arc<AtomicBool>,
}

impl RadioEventSink {
    pub fn new(mailbox: mpsc::UnboundedSender<CoordinatorMessage>, active: Arc<AtomicBool>) -> Self {
        Self { mailbox, active }
    }

    /// Queues `event` for the coordinator.
    ///
    /// Returns `false` when the event was dropped because the coordinator is
    /// no longer active.
    pub fn deliver(&self, event: RadioEvent) -> bool {
        if !self.active.load(Ordering::Acquire) {
            debug!("dropping radio callback after teardown: {event:?}");
            return false;
        }
        self.mailbox.send(CoordinatorMessage::Radio(event)).is_ok()
    }
}

/// Registration returned by [`RadioSubsystem::subscribe`].
///
/// Call [`Subscription::cancel`] exactly once at teardown.  A subscription
/// dropped without being cancelled still unregisters, with a warning.
pub struct Subscription {
    id: Uuid,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wraps the driver's unregister action.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Unregisters from the driver.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
            debug!("radio subscription {} cancelled", self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            warn!("radio subscription {} dropped without cancel", self.id);
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("cancelled", &self.cancel.is_none())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_sink_delivers_while_active() {
        // Arrange
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = RadioEventSink::new(tx, Arc::new(AtomicBool::new(true)));

        // Act
        let delivered = sink.deliver(RadioEvent::PeersChanged { snapshot: vec![] });

        // Assert
        assert!(delivered);
        assert!(matches!(
            rx.try_recv(),
            Ok(CoordinatorMessage::Radio(RadioEvent::PeersChanged { .. }))
        ));
    }

    #[test]
    fn test_sink_drops_after_active_flag_cleared() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));
        let sink = RadioEventSink::new(tx, Arc::clone(&active));

        active.store(false, Ordering::Release);
        let delivered = sink.deliver(RadioEvent::ConnectionInfo {
            info: ConnectionInfo::not_formed(),
        });

        assert!(!delivered);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_subscription_cancel_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        subscription.cancel();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_dropped_without_cancel_still_unregisters() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        {
            let _subscription = Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
