//! SimulatedRadio: an in-process stand-in for a peer-to-peer Wi-Fi radio.
//!
//! Two response modes:
//!
//! - [`ResponseMode::Manual`] records every request and answers none of
//!   them.  Tests push callbacks themselves with [`SimulatedRadio::inject`].
//! - [`ResponseMode::AutoRespond`] behaves like a cooperative radio:
//!   discovery succeeds and reports the configured peer list, connecting
//!   forms a group with the target as group owner, stopping discovery
//!   succeeds and connection-info queries report the current group.
//!
//! With a non-zero response delay, automatic callbacks are delivered from a
//! background thread after sleeping, the way a platform radio calls back on
//! its own thread.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use sendora_core::{AttemptToken, ConnectionInfo, DeviceAddress, Peer};
use tracing::{debug, info, warn};

use crate::application::radio::{
    ConnectRequest, RadioError, RadioEvent, RadioEventSink, RadioOperation, RadioSubsystem,
    Subscription,
};

/// How the simulator answers requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Record requests only.
    Manual,
    /// Answer every request as a cooperative radio would.
    #[default]
    AutoRespond,
}

/// Construction parameters.
#[derive(Debug, Clone)]
pub struct SimulatedRadioConfig {
    pub mode: ResponseMode,
    /// `(display name, address)` of every peer "in range".
    pub peers: Vec<(String, DeviceAddress)>,
    /// Delay before automatic callbacks.  Zero delivers inline.
    pub response_delay: Duration,
    /// Whether the radio starts switched on.
    pub enabled: bool,
    /// Make [`RadioSubsystem::enable`] fail.
    pub fail_enable: bool,
}

impl Default for SimulatedRadioConfig {
    fn default() -> Self {
        Self {
            mode: ResponseMode::AutoRespond,
            peers: Vec::new(),
            response_delay: Duration::ZERO,
            enabled: true,
            fail_enable: false,
        }
    }
}

/// A request received by the simulator, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioRequest {
    Enable,
    Disable,
    Discover(AttemptToken),
    StopDiscovery(AttemptToken),
    Connect {
        address: DeviceAddress,
        group_owner_intent: u8,
        token: AttemptToken,
    },
    ConnectionInfo,
}

#[derive(Debug)]
struct State {
    config: SimulatedRadioConfig,
    enabled: bool,
    group: ConnectionInfo,
    sink: Option<RadioEventSink>,
    requests: Vec<RadioRequest>,
    cancellations: usize,
}

/// Simulated Radio Subsystem.  Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct SimulatedRadio {
    state: Arc<Mutex<State>>,
}

impl SimulatedRadio {
    pub fn new(config: SimulatedRadioConfig) -> Self {
        let enabled = config.enabled;
        Self {
            state: Arc::new(Mutex::new(State {
                config,
                enabled,
                group: ConnectionInfo::not_formed(),
                sink: None,
                requests: Vec::new(),
                cancellations: 0,
            })),
        }
    }

    /// Pushes a callback to the subscriber immediately, in any mode.
    ///
    /// Returns `false` if there is no subscriber or it dropped the event.
    pub fn inject(&self, event: RadioEvent) -> bool {
        let sink = self.lock().sink.clone();
        match sink {
            Some(sink) => sink.deliver(event),
            None => {
                debug!("no radio subscriber; dropping injected {event:?}");
                false
            }
        }
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<RadioRequest> {
        self.lock().requests.clone()
    }

    /// Whether a subscription is currently registered.
    pub fn is_subscribed(&self) -> bool {
        self.lock().sink.is_some()
    }

    /// How many times a subscription has been cancelled.
    pub fn cancellations(&self) -> usize {
        self.lock().cancellations
    }

    pub fn set_fail_enable(&self, fail: bool) {
        self.lock().config.fail_enable = fail;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records `request` and, in auto mode, computes the callbacks to send.
    fn record(
        &self,
        request: RadioRequest,
        respond: impl FnOnce(&mut State) -> Vec<RadioEvent>,
    ) {
        let (events, sink, delay) = {
            let mut state = self.lock();
            state.requests.push(request);
            if state.config.mode == ResponseMode::Manual {
                return;
            }
            let events = respond(&mut *state);
            (events, state.sink.clone(), state.config.response_delay)
        };

        let Some(sink) = sink else {
            debug!("no radio subscriber; {} callback(s) dropped", events.len());
            return;
        };
        if delay.is_zero() {
            deliver_all(&sink, events);
        } else {
            thread::spawn(move || {
                thread::sleep(delay);
                deliver_all(&sink, events);
            });
        }
    }
}

fn deliver_all(sink: &RadioEventSink, events: Vec<RadioEvent>) {
    for event in events {
        if !sink.deliver(event) {
            debug!("simulated callback not delivered; subscriber gone");
            return;
        }
    }
}

fn ok_result(op: RadioOperation, token: AttemptToken) -> RadioEvent {
    RadioEvent::OperationResult {
        op,
        token,
        outcome: Ok(()),
    }
}

impl RadioSubsystem for SimulatedRadio {
    fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    fn enable(&self) -> Result<(), RadioError> {
        let mut state = self.lock();
        state.requests.push(RadioRequest::Enable);
        if state.config.fail_enable {
            warn!("simulated radio refused to enable");
            return Err(RadioError::EnableFailed("simulated enable failure".to_string()));
        }
        state.enabled = true;
        info!("simulated radio enabled");
        Ok(())
    }

    fn disable(&self) {
        let mut state = self.lock();
        state.requests.push(RadioRequest::Disable);
        state.enabled = false;
        state.group = ConnectionInfo::not_formed();
        info!("simulated radio disabled");
    }

    fn discover_peers(&self, token: AttemptToken) {
        self.record(RadioRequest::Discover(token), |state| {
            let snapshot = state
                .config
                .peers
                .iter()
                .map(|(name, address)| Peer::new(address.clone(), name.clone()))
                .collect();
            vec![
                ok_result(RadioOperation::Discover, token),
                RadioEvent::PeersChanged { snapshot },
            ]
        });
    }

    fn stop_peer_discovery(&self, token: AttemptToken) {
        self.record(RadioRequest::StopDiscovery(token), |_| {
            vec![ok_result(RadioOperation::StopDiscovery, token)]
        });
    }

    fn connect(&self, request: &ConnectRequest, token: AttemptToken) {
        let recorded = RadioRequest::Connect {
            address: request.address.clone(),
            group_owner_intent: request.group_owner_intent,
            token,
        };
        let target = request.address.to_string();
        self.record(recorded, |state| {
            state.group = ConnectionInfo::formed(false, target);
            vec![
                ok_result(RadioOperation::Connect, token),
                RadioEvent::ConnectionInfo {
                    info: state.group.clone(),
                },
            ]
        });
    }

    fn request_connection_info(&self) {
        self.record(RadioRequest::ConnectionInfo, |state| {
            vec![RadioEvent::ConnectionInfo {
                info: state.group.clone(),
            }]
        });
    }

    fn subscribe(&self, sink: RadioEventSink) -> Result<Subscription, RadioError> {
        let mut state = self.lock();
        if state.sink.is_some() {
            return Err(RadioError::SubscribeFailed(
                "simulated radio already has a subscriber".to_string(),
            ));
        }
        state.sink = Some(sink);
        drop(state);

        let radio = self.clone();
        Ok(Subscription::new(move || {
            let mut state = radio.lock();
            state.sink = None;
            state.cancellations += 1;
        }))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
