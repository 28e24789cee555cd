//! EventBus: ordered, non-blocking delivery of [`Event`]s to one consumer.
//!
//! Backed by a tokio `broadcast` channel, which is a bounded ring buffer.
//! Publishing never waits.  The requested capacity is rounded up to the next
//! power of two (the ring buffer's real size, see [`EventBus::capacity`]).
//! When the consumer falls behind by more than that many events, the oldest
//! undelivered events are overwritten; the
//! receiver notices on its next read, logs a warning and adds the loss to
//! [`EventReceiver::dropped`].
//!
//! [`EventBus::new`] hands out exactly one receiver and the type is not
//! `Clone`, so there is a single consumer sink.

use sendora_core::Event;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

/// Default number of undelivered events kept before the oldest are dropped.
pub const DEFAULT_CAPACITY: usize = 64;

/// Publishing side, owned by the coordinator.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
    capacity: usize,
}

impl EventBus {
    /// Creates a bus for `capacity` undelivered events, rounded up to the next
    /// power of two (0 counts as 1).
    pub fn new(capacity: usize) -> (Self, EventReceiver) {
        let capacity = capacity.max(1).next_power_of_two();
        let (tx, rx) = broadcast::channel(capacity);
        (Self { tx, capacity }, EventReceiver { rx, dropped: 0 })
    }

    /// Undelivered events kept before the oldest is overwritten.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Publishes without blocking.
    pub fn publish(&self, event: Event) {
        if let Err(broadcast::error::SendError(event)) = self.tx.send(event) {
            debug!("no event consumer attached; discarding {event:?}");
        }
    }
}

/// The consumer side.
#[derive(Debug)]
pub struct EventReceiver {
    rx: broadcast::Receiver<Event>,
    dropped: u64,
}

impl EventReceiver {
    /// Waits for the next event.
    ///
    /// Returns `None` once the bus is gone and every buffered event has been
    /// read.  Cancel safe.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => self.record_lag(skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => self.record_lag(skipped),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Events discarded so far because this receiver lagged.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn record_lag(&mut self, skipped: u64) {
        self.dropped += skipped;
        warn!("event consumer lagged; dropped {skipped} oldest event(s)");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
