//! Notifications emitted by the coordinator to the consumer.

use super::peer::Peer;

/// A state-change notification, delivered in the order it was produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The visible peer list changed.  Ordered by address ascending.
    PeersAvailable { peers: Vec<Peer> },
    /// A group formed; `address` is the group owner's address.
    Connected { address: String },
    /// The connection state moved to Disconnected.
    Disconnected,
    /// The radio could not start discovery.
    DiscoveryFailed { reason_code: i32 },
    /// The radio rejected the current connect request.
    ConnectionFailed { address: String, reason_code: i32 },
}
