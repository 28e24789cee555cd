//! PeerRegistry: the current snapshot of discovered peers.
//!
//! The radio never reports incremental edits.  Each peer-list notification
//! carries the complete set of devices currently visible, so the registry
//! swaps its contents wholesale and reports what changed.
//!
//! # Ordering
//!
//! Peers are keyed by address in a `BTreeMap`, which gives ascending address
//! order for free.  Insertion order carries no meaning (every snapshot is a
//! full replacement) and the consumer gets a deterministic list.

use std::collections::BTreeMap;
use std::time::SystemTime;

use tracing::debug;

use super::address::DeviceAddress;

/// A discoverable remote device.
#[derive(Debug, Clone, PartialEq)]
pub struct Peer {
    /// Unique identity key.
    pub address: DeviceAddress,
    /// Name the device advertises.
    pub display_name: String,
    /// When the radio last reported this peer.
    pub last_seen_at: SystemTime,
}

impl Peer {
    /// Creates a peer stamped as seen now.
    pub fn new(address: DeviceAddress, display_name: impl Into<String>) -> Self {
        Self {
            address,
            display_name: display_name.into(),
            last_seen_at: SystemTime::now(),
        }
    }
}

/// Addresses affected by a snapshot replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Present now, absent before.
    pub added: Vec<DeviceAddress>,
    /// Present before, absent now.
    pub removed: Vec<DeviceAddress>,
    /// Present in both, but advertising a different display name.
    pub renamed: Vec<DeviceAddress>,
}

impl SnapshotDiff {
    /// `true` when the visible peer list (addresses and names) did not change.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.renamed.is_empty()
    }
}

/// Holds the most recent peer snapshot.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: BTreeMap<DeviceAddress, Peer>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole peer set with `snapshot`.
    ///
    /// Duplicate addresses inside one snapshot collapse to the last entry.
    /// Nothing from the previous snapshot survives unless it is present in
    /// the new one.
    pub fn replace_snapshot(&mut self, snapshot: impl IntoIterator<Item = Peer>) -> SnapshotDiff {
        let next: BTreeMap<DeviceAddress, Peer> = snapshot
            .into_iter()
            .map(|peer| (peer.address.clone(), peer))
            .collect();

        let mut diff = SnapshotDiff::default();
        for (address, peer) in &next {
            match self.peers.get(address) {
                None => diff.added.push(address.clone()),
                Some(prev) if prev.display_name != peer.display_name => {
                    diff.renamed.push(address.clone())
                }
                Some(_) => {}
            }
        }
        diff.removed = self
            .peers
            .keys()
            .filter(|address| !next.contains_key(*address))
            .cloned()
            .collect();

        self.peers = next;
        debug!(
            "peer snapshot replaced: {} peers (+{} -{} ~{})",
            self.peers.len(),
            diff.added.len(),
            diff.removed.len(),
            diff.renamed.len()
        );
        diff
    }

    /// Returns all peers ordered by address ascending.
    pub fn current_peers(&self) -> Vec<Peer> {
        self.peers.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
