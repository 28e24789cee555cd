//! Attempt tokens and radio operation outcomes.
//!
//! # What is an attempt token? (for beginners)
//!
//! Every request handed to the radio (start discovery, stop discovery,
//! connect) is tagged with a monotonically increasing integer.  The radio
//! echoes the token back in its asynchronous result callback.  When the
//! result finally arrives, the state machine compares the echoed token with
//! the one it is currently waiting for:
//!
//! - **Match** – the result belongs to the request in flight; apply it.
//! - **Mismatch** – the request was superseded (the user connected to a
//!   different peer, or stopped discovery before it confirmed); discard it.
//!
//! This replaces "whichever callback fires last wins" with an explicit rule.
//!
//! # Why not an atomic counter?
//!
//! Tokens are only ever issued from inside the coordinator's serialized
//! execution, so a plain `u64` is enough.  Each state machine owns its own
//! [`TokenCounter`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies one radio request so its eventual result can be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttemptToken(pub u64);

impl fmt::Display for AttemptToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues strictly increasing [`AttemptToken`]s starting at 1.
///
/// # Examples
///
/// ```rust
/// use sendora_core::{AttemptToken, TokenCounter};
///
/// let mut counter = TokenCounter::new();
/// assert_eq!(counter.next(), AttemptToken(1));
/// assert_eq!(counter.next(), AttemptToken(2));
/// ```
#[derive(Debug, Default)]
pub struct TokenCounter {
    last: u64,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a token greater than every token issued before it.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> AttemptToken {
        // Saturating: 2^64 radio requests will not happen in one session, and
        // wrapping would break the ordering guarantee.
        self.last = self.last.saturating_add(1);
        AttemptToken(self.last)
    }
}

/// A failure reported by the radio for an accepted request.
///
/// The request itself was accepted by the coordinator, so this never reaches
/// the consumer as a command error; it becomes a state transition instead.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("radio operation failed: {} (reason code {reason_code})", describe_reason(.reason_code))]
pub struct OperationFailed {
    pub reason_code: i32,
}

impl OperationFailed {
    pub fn new(reason_code: i32) -> Self {
        Self { reason_code }
    }

    /// Human-readable label for the reason code.
    pub fn reason(&self) -> &'static str {
        describe_reason(&self.reason_code)
    }
}

/// Maps the platform's peer-to-peer failure codes to labels.
fn describe_reason(code: &i32) -> &'static str {
    match *code {
        0 => "internal error",
        1 => "peer-to-peer unsupported",
        2 => "framework busy",
        3 => "no service requests",
        _ => "unknown",
    }
}

/// Result of an asynchronous radio request.
pub type OperationOutcome = Result<(), OperationFailed>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_counter_starts_at_one() {
        let mut counter = TokenCounter::new();
        assert_eq!(counter.next(), AttemptToken(1));
    }

    #[test]
    fn test_token_counter_is_strictly_increasing() {
        let mut counter = TokenCounter::new();
        let mut prev = counter.next();
        for _ in 0..1_000 {
            let next = counter.next();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn test_operation_failed_labels_known_codes() {
        assert_eq!(OperationFailed::new(2).reason(), "framework busy");
        assert_eq!(OperationFailed::new(1).reason(), "peer-to-peer unsupported");
        assert_eq!(OperationFailed::new(42).reason(), "unknown");
    }

    #[test]
    fn test_operation_failed_display_includes_code() {
        let text = OperationFailed::new(2).to_string();
        assert!(text.contains("framework busy"), "got: {text}");
        assert!(text.contains('2'), "got: {text}");
    }

    #[test]
    fn test_token_display() {
        assert_eq!(AttemptToken(7).to_string(), "#7");
    }
}
