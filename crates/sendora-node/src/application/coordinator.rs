//! Coordinator: the single owner of peer, connection and discovery state.
//!
//! # Actor model (for beginners)
//!
//! The coordinator runs as one tokio task reading an unbounded mailbox.
//! Consumer commands (through [`CoordinatorHandle`]) and radio callbacks
//! (through [`RadioEventSink`]) are both turned into [`CoordinatorMessage`]s
//! and processed one at a time, to completion, in arrival order.  Because
//! only this task touches the state there are no locks, and a radio callback
//! can never observe a half-applied command.
//!
//! Commands carry a `oneshot` sender for their reply.  The coordinator never
//! waits on the radio: it issues the request, replies to the caller and
//! learns the outcome later from a callback, which it turns into an
//! [`Event`] on the [`EventBus`].
//!
//! # Teardown
//!
//! On [`CoordinatorHandle::shutdown`] (or once every sender is gone) the
//! coordinator:
//!
//! 1. clears the shared "active" flag so late radio callbacks are dropped,
//! 2. cancels the radio subscription,
//! 3. optionally switches the radio off,
//! 4. closes the mailbox and answers every queued command with
//!    [`CommandError::ShuttingDown`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sendora_core::{
    AttemptToken, CommandError, ConnectDecision, ConnectResultTransition, ConnectionController,
    ConnectionInfo, ConnectionState, DiscoverySession, DiscoveryState, DiscoveryTransition, Event,
    Peer, PeerRegistry, StartDecision, StopDecision,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::event_bus::EventBus;
use super::radio::{
    ConnectRequest, RadioError, RadioEvent, RadioEventSink, RadioOperation, RadioSubsystem,
    Subscription,
};

type CommandReply = oneshot::Sender<Result<CommandAck, CommandError>>;

/// Everything the coordinator task can be asked to process.
#[derive(Debug)]
pub enum CoordinatorMessage {
    StartDiscovery { reply: CommandReply },
    StopDiscovery { reply: CommandReply },
    Connect { address: String, reply: CommandReply },
    QueryStatus { reply: oneshot::Sender<ConnectionState> },
    Snapshot { reply: oneshot::Sender<CoordinatorSnapshot> },
    Shutdown { reply: oneshot::Sender<()> },
    /// A callback from the radio driver.
    Radio(RadioEvent),
}

/// Successful outcome of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAck {
    DiscoveryStarted,
    AlreadyDiscovering,
    DiscoveryStopped,
    AlreadyStopped,
    Connecting,
    AlreadyConnecting,
    AlreadyConnected,
}

impl CommandAck {
    /// Acknowledgment text sent to the consumer.
    ///
    /// No-op outcomes reuse the text of the operation they short-circuit,
    /// except for an existing connection.
    pub fn message(&self) -> &'static str {
        match self {
            CommandAck::DiscoveryStarted | CommandAck::AlreadyDiscovering => "Discovery started",
            CommandAck::DiscoveryStopped | CommandAck::AlreadyStopped => "Discovery stopped",
            CommandAck::Connecting | CommandAck::AlreadyConnecting => "Connecting to peer",
            CommandAck::AlreadyConnected => "Already connected",
        }
    }
}

/// Read-only view of the coordinator state.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorSnapshot {
    pub discovery: DiscoveryState,
    pub connection: ConnectionState,
    pub peers: Vec<Peer>,
    /// Connect attempt whose result is still awaited.
    pub connect_in_flight: Option<AttemptToken>,
}

/// Tunables passed in at spawn time.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorOptions {
    /// Group-owner intent sent with every connect request (0..=15).
    pub group_owner_intent: u8,
    /// Switch the radio off during teardown.
    pub disable_radio_on_shutdown: bool,
}

/// Cloneable client of the coordinator task.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<CoordinatorMessage>,
}

impl CoordinatorHandle {
    pub async fn start_discovery(&self) -> Result<CommandAck, CommandError> {
        self.request(|reply| CoordinatorMessage::StartDiscovery { reply })
            .await?
    }

    pub async fn stop_discovery(&self) -> Result<CommandAck, CommandError> {
        self.request(|reply| CoordinatorMessage::StopDiscovery { reply })
            .await?
    }

    /// Requests a connection to `address`.  Returns as soon as the request is
    /// issued; the outcome arrives as an [`Event`].
    pub async fn connect(&self, address: impl Into<String>) -> Result<CommandAck, CommandError> {
        let address = address.into();
        self.request(|reply| CoordinatorMessage::Connect { address, reply })
            .await?
    }

    pub async fn status(&self) -> Result<ConnectionState, CommandError> {
        self.request(|reply| CoordinatorMessage::QueryStatus { reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<CoordinatorSnapshot, CommandError> {
        self.request(|reply| CoordinatorMessage::Snapshot { reply })
            .await
    }

    /// Tears the coordinator down and waits until it has finished.
    ///
    /// Calling this on a coordinator that has already stopped is a no-op.
    pub async fn shutdown(&self) {
        if self
            .request(|reply| CoordinatorMessage::Shutdown { reply })
            .await
            .is_err()
        {
            debug!("coordinator already stopped");
        }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> CoordinatorMessage,
    ) -> Result<T, CommandError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| CommandError::ShuttingDown)?;
        response.await.map_err(|_| CommandError::ShuttingDown)
    }
}

/// The actor.  Constructed and started by [`Coordinator::spawn`].
pub struct Coordinator {
    radio: Arc<dyn RadioSubsystem>,
    options: CoordinatorOptions,
    registry: PeerRegistry,
    connection: ConnectionController,
    discovery: DiscoverySession,
    events: EventBus,
    active: Arc<AtomicBool>,
    subscription: Option<Subscription>,
    mailbox: mpsc::UnboundedReceiver<CoordinatorMessage>,
}

impl Coordinator {
    /// Subscribes to `radio`, asks it for the current group state and starts
    /// the coordinator task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the driver's [`RadioError`] if the subscription is refused.
    pub fn spawn(
        radio: Arc<dyn RadioSubsystem>,
        events: EventBus,
        options: CoordinatorOptions,
    ) -> Result<(CoordinatorHandle, JoinHandle<()>), RadioError> {
        let (tx, mailbox) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));

        let subscription = radio.subscribe(RadioEventSink::new(tx.clone(), Arc::clone(&active)))?;
        info!("subscribed to radio ({})", subscription.id());
        radio.request_connection_info();

        let coordinator = Coordinator {
            radio,
            options,
            registry: PeerRegistry::new(),
            connection: ConnectionController::new(),
            discovery: DiscoverySession::new(),
            events,
            active,
            subscription: Some(subscription),
            mailbox,
        };
        let task = tokio::spawn(coordinator.run());
        Ok((CoordinatorHandle { tx }, task))
    }

    async fn run(mut self) {
        while let Some(message) = self.mailbox.recv().await {
            if !self.handle(message) {
                return;
            }
        }
        // Every sender is gone, including the radio's sink.
        self.teardown();
    }

    /// Processes one message.  Returns `false` once the coordinator has shut
    /// down.
    fn handle(&mut self, message: CoordinatorMessage) -> bool {
        match message {
            CoordinatorMessage::StartDiscovery { reply } => respond(reply, self.start_discovery()),
            CoordinatorMessage::StopDiscovery { reply } => respond(reply, Ok(self.stop_discovery())),
            CoordinatorMessage::Connect { address, reply } => respond(reply, self.connect(&address)),
            CoordinatorMessage::QueryStatus { reply } => {
                respond(reply, self.connection.status().clone())
            }
            CoordinatorMessage::Snapshot { reply } => respond(reply, self.snapshot()),
            CoordinatorMessage::Radio(event) => self.on_radio_event(event),
            CoordinatorMessage::Shutdown { reply } => {
                self.teardown();
                respond(reply, ());
                return false;
            }
        }
        true
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    fn start_discovery(&mut self) -> Result<CommandAck, CommandError> {
        let radio = &self.radio;
        let decision = self.discovery.begin_start(|| {
            if radio.is_enabled() {
                return Ok(());
            }
            info!("radio is off; enabling before discovery");
            radio.enable()
        });

        match decision {
            Ok(StartDecision::AlreadyDiscovering) => {
                debug!("discovery already running");
                Ok(CommandAck::AlreadyDiscovering)
            }
            Ok(StartDecision::Begin { token }) => {
                info!("starting peer discovery {token}");
                self.radio.discover_peers(token);
                Ok(CommandAck::DiscoveryStarted)
            }
            Err(e) => {
                warn!("discovery not started: {e}");
                Err(CommandError::RadioUnavailable(e.to_string()))
            }
        }
    }

    fn stop_discovery(&mut self) -> CommandAck {
        match self.discovery.begin_stop() {
            StopDecision::AlreadyIdle | StopDecision::AlreadyStopping => {
                debug!("discovery not running; nothing to stop");
                CommandAck::AlreadyStopped
            }
            StopDecision::Begin { token } => {
                info!("stopping peer discovery {token}");
                self.radio.stop_peer_discovery(token);
                CommandAck::DiscoveryStopped
            }
        }
    }

    fn connect(&mut self, address: &str) -> Result<CommandAck, CommandError> {
        let decision = self.connection.connect(address).map_err(|e| {
            warn!("rejecting connect request: {e}");
            CommandError::from(e)
        })?;

        match decision {
            ConnectDecision::Initiate {
                target,
                token,
                superseded,
            } => {
                if let Some(previous) = superseded {
                    info!("connect to {target} supersedes pending attempt to {previous}");
                }
                info!("connecting to {target} {token}");
                let request = ConnectRequest {
                    address: target,
                    group_owner_intent: self.options.group_owner_intent,
                };
                self.radio.connect(&request, token);
                Ok(CommandAck::Connecting)
            }
            ConnectDecision::AlreadyConnecting { target } => {
                debug!("already connecting to {target}");
                Ok(CommandAck::AlreadyConnecting)
            }
            ConnectDecision::AlreadyConnected { peer_address } => {
                debug!("already connected to {peer_address}");
                Ok(CommandAck::AlreadyConnected)
            }
        }
    }

    fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot {
            discovery: self.discovery.state(),
            connection: self.connection.status().clone(),
            peers: self.registry.current_peers(),
            connect_in_flight: self.connection.in_flight(),
        }
    }

    // ── Radio callbacks ───────────────────────────────────────────────────────

    fn on_radio_event(&mut self, event: RadioEvent) {
        match event {
            RadioEvent::PeersChanged { snapshot } => self.on_peers_changed(snapshot),
            RadioEvent::ConnectionInfo { info } => self.on_connection_info(&info),
            RadioEvent::OperationResult { op, token, outcome } => match op {
                RadioOperation::Discover => {
                    let transition = self.discovery.on_start_result(token, outcome);
                    self.on_discovery_transition(transition, token);
                }
                RadioOperation::StopDiscovery => {
                    let transition = self.discovery.on_stop_result(token, outcome);
                    self.on_discovery_transition(transition, token);
                }
                RadioOperation::Connect => {
                    let transition = self.connection.on_connect_result(token, outcome);
                    self.on_connect_transition(transition);
                }
            },
        }
    }

    fn on_peers_changed(&mut self, snapshot: Vec<Peer>) {
        let diff = self.registry.replace_snapshot(snapshot);
        if diff.is_empty() {
            debug!("peer snapshot unchanged");
            return;
        }
        info!(
            "peers changed: {} visible (+{} -{} ~{})",
            self.registry.len(),
            diff.added.len(),
            diff.removed.len(),
            diff.renamed.len()
        );
        self.events.publish(Event::PeersAvailable {
            peers: self.registry.current_peers(),
        });
    }

    fn on_connection_info(&mut self, info: &ConnectionInfo) {
        match self.connection.on_connection_info(info) {
            Some(ConnectionState::Connected { role, peer_address }) => {
                info!("connected to {peer_address} as {role:?}");
                self.events.publish(Event::Connected {
                    address: peer_address,
                });
            }
            Some(ConnectionState::Disconnected) => {
                info!("disconnected");
                self.events.publish(Event::Disconnected);
            }
            Some(other) => debug!("connection info produced {other:?}"),
            None => debug!("connection info matches current state"),
        }
    }

    fn on_connect_transition(&mut self, transition: ConnectResultTransition) {
        match transition {
            ConnectResultTransition::Stale => {}
            ConnectResultTransition::Accepted { target } => {
                info!("radio accepted connect to {target}; waiting for group info");
            }
            ConnectResultTransition::Failed { target, failure } => {
                warn!("connect to {target} failed: {failure}");
                self.events.publish(Event::ConnectionFailed {
                    address: target.to_string(),
                    reason_code: failure.reason_code,
                });
            }
        }
    }

    fn on_discovery_transition(&mut self, transition: DiscoveryTransition, token: AttemptToken) {
        match transition {
            DiscoveryTransition::Stale => {}
            DiscoveryTransition::Started => info!("discovery running {token}"),
            DiscoveryTransition::Stopped => info!("discovery stopped {token}"),
            DiscoveryTransition::StartFailed(failure) => {
                warn!("discovery {token} failed to start: {failure}");
                self.events.publish(Event::DiscoveryFailed {
                    reason_code: failure.reason_code,
                });
            }
            DiscoveryTransition::StopFailed(failure) => {
                warn!("discovery {token} failed to stop: {failure}");
            }
        }
    }

    // ── Teardown ──────────────────────────────────────────────────────────────

    fn teardown(&mut self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        info!("coordinator shutting down");

        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        if self.options.disable_radio_on_shutdown {
            info!("disabling radio");
            self.radio.disable();
        }

        self.mailbox.close();
        let mut rejected = 0usize;
        while let Ok(message) = self.mailbox.try_recv() {
            match message {
                CoordinatorMessage::StartDiscovery { reply }
                | CoordinatorMessage::StopDiscovery { reply }
                | CoordinatorMessage::Connect { reply, .. } => {
                    respond(reply, Err(CommandError::ShuttingDown));
                    rejected += 1;
                }
                // Dropping the reply sender makes the handle report ShuttingDown.
                CoordinatorMessage::QueryStatus { .. } | CoordinatorMessage::Snapshot { .. } => {
                    rejected += 1;
                }
                CoordinatorMessage::Shutdown { reply } => respond(reply, ()),
                CoordinatorMessage::Radio(event) => {
                    debug!("dropping radio callback queued before teardown: {event:?}")
                }
            }
        }
        info!("coordinator stopped ({rejected} queued command(s) rejected)");
    }
}

fn respond<T>(reply: oneshot::Sender<T>, value: T) {
    if reply.send(value).is_err() {
        debug!("caller stopped waiting for a reply");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
