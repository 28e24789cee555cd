//! DiscoverySession: discovery on/off state and its transition guards.
//!
//! ```text
//!          start                 stop                 stop confirmed
//! Idle ───────────► Discovering ──────► Stopping ─────────────────────► Idle
//!  ▲                  │   ▲                │
//!  │ start failed     │   └── stop failed ─┘
//!  └──────────────────┘       start (re-issue)
//! ```
//!
//! `start` while Discovering and `stop` while Idle or Stopping are no-op
//! successes.  Both start and stop requests are tagged with an
//! [`AttemptToken`]; a result whose token is not the pending one is stale.

use tracing::debug;

use super::attempt::{AttemptToken, OperationFailed, OperationOutcome, TokenCounter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscoveryState {
    #[default]
    Idle,
    Discovering,
    Stopping,
}

/// Outcome of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDecision {
    AlreadyDiscovering,
    /// Ask the radio to discover peers, tagging the request with `token`.
    Begin { token: AttemptToken },
}

/// Outcome of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    AlreadyIdle,
    AlreadyStopping,
    /// Ask the radio to stop discovery, tagging the request with `token`.
    Begin { token: AttemptToken },
}

/// Effect of a discovery result callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryTransition {
    Stale,
    /// The radio confirmed discovery is running.
    Started,
    /// The radio could not start discovery; the session is Idle again.
    StartFailed(OperationFailed),
    /// The radio confirmed discovery stopped; the session is Idle.
    Stopped,
    /// The radio could not stop discovery; the session is Discovering again.
    StopFailed(OperationFailed),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Start(AttemptToken),
    Stop(AttemptToken),
}

#[derive(Debug, Default)]
pub struct DiscoverySession {
    state: DiscoveryState,
    pending: Option<Pending>,
    tokens: TokenCounter,
}

impl DiscoverySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DiscoveryState {
        self.state
    }

    /// Starts discovery unless it is already running.
    ///
    /// `ensure_radio` runs before any transition and only when discovery is
    /// not already running.  If it fails the session is unchanged and the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `ensure_radio`.
    pub fn begin_start<E>(
        &mut self,
        ensure_radio: impl FnOnce() -> Result<(), E>,
    ) -> Result<StartDecision, E> {
        if self.state == DiscoveryState::Discovering {
            return Ok(StartDecision::AlreadyDiscovering);
        }
        ensure_radio()?;

        let token = self.tokens.next();
        if let Some(Pending::Stop(stale)) = self.pending {
            debug!("discovery restarted while stop {stale} pending");
        }
        self.pending = Some(Pending::Start(token));
        self.state = DiscoveryState::Discovering;
        Ok(StartDecision::Begin { token })
    }

    /// Stops discovery if it is running.
    pub fn begin_stop(&mut self) -> StopDecision {
        match self.state {
            DiscoveryState::Idle => StopDecision::AlreadyIdle,
            DiscoveryState::Stopping => StopDecision::AlreadyStopping,
            DiscoveryState::Discovering => {
                let token = self.tokens.next();
                self.pending = Some(Pending::Stop(token));
                self.state = DiscoveryState::Stopping;
                StopDecision::Begin { token }
            }
        }
    }

    /// Applies the radio's result for a start request.
    pub fn on_start_result(
        &mut self,
        token: AttemptToken,
        outcome: OperationOutcome,
    ) -> DiscoveryTransition {
        if self.pending != Some(Pending::Start(token)) {
            debug!("discarding stale discovery start result {token}");
            return DiscoveryTransition::Stale;
        }
        self.pending = None;
        match outcome {
            Ok(()) => DiscoveryTransition::Started,
            Err(failure) => {
                self.state = DiscoveryState::Idle;
                DiscoveryTransition::StartFailed(failure)
            }
        }
    }

    /// Applies the radio's result for a stop request.
    pub fn on_stop_result(
        &mut self,
        token: AttemptToken,
        outcome: OperationOutcome,
    ) -> DiscoveryTransition {
        if self.pending != Some(Pending::Stop(token)) {
            debug!("discarding stale discovery stop result {token}");
            return DiscoveryTransition::Stale;
        }
        self.pending = None;
        match outcome {
            Ok(()) => {
                self.state = DiscoveryState::Idle;
                DiscoveryTransition::Stopped
            }
            Err(failure) => {
                self.state = DiscoveryState::Discovering;
                DiscoveryTransition::StopFailed(failure)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
