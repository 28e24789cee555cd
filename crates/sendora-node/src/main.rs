//! Sendora node entry point.
//!
//! Speaks the method-channel protocol as JSON lines on stdin/stdout, backed
//! by the simulated radio.  Logs go to stderr so stdout stays a clean
//! protocol stream.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config (file + CLI overrides)
//!  └─ SimulatedRadio
//!  └─ Coordinator::spawn   -- subscribes to the radio, owns all link state
//!  └─ channel::serve       -- stdin requests → dispatcher, events → stdout
//!  └─ shutdown on EOF or Ctrl-C
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sendora_node::application::coordinator::{Coordinator, CoordinatorOptions};
use sendora_node::application::dispatcher::{CommandDispatcher, CredentialPrefixes};
use sendora_node::application::event_bus::EventBus;
use sendora_node::infrastructure::channel;
use sendora_node::infrastructure::radio::{SimulatedRadio, SimulatedRadioConfig};
use sendora_node::infrastructure::storage::config::{load_config, AppConfig, PeerEntry};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Sendora peer-link node.
///
/// Reads method calls from stdin and writes responses and events to stdout,
/// one JSON object per line.
#[derive(Debug, Parser)]
#[command(
    name = "sendora-node",
    about = "Peer-to-peer link coordinator speaking JSON lines on stdin/stdout",
    version
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "SENDORA_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset (overrides the config file).
    #[arg(long, env = "SENDORA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Simulated peer in range, as `NAME=ADDRESS`.  Repeatable; replaces the
    /// peers listed in the config file.
    #[arg(long = "peer", value_name = "NAME=ADDRESS", value_parser = parse_peer_arg)]
    peers: Vec<PeerEntry>,

    /// Delay before the simulated radio answers, in milliseconds.
    #[arg(long, env = "SENDORA_RESPONSE_DELAY_MS")]
    response_delay_ms: Option<u64>,
}

impl Cli {
    /// Loads the config file and applies CLI overrides on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or the merged
    /// configuration is invalid.
    fn into_config(self) -> anyhow::Result<AppConfig> {
        let mut config = load_config(self.config.as_deref()).with_context(|| match &self.config {
            Some(path) => format!("failed to load config from {}", path.display()),
            None => "failed to build default config".to_string(),
        })?;

        if let Some(level) = self.log_level {
            config.node.log_level = level;
        }
        if !self.peers.is_empty() {
            config.radio.peers = self.peers;
        }
        if let Some(delay) = self.response_delay_ms {
            config.radio.response_delay_ms = delay;
        }
        config
            .validate()
            .context("invalid configuration after applying command-line overrides")?;
        Ok(config)
    }
}

fn parse_peer_arg(raw: &str) -> Result<PeerEntry, String> {
    let (name, address) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=ADDRESS, got {raw:?}"))?;
    if name.trim().is_empty() {
        return Err(format!("peer name is empty in {raw:?}"));
    }
    Ok(PeerEntry {
        name: name.trim().to_string(),
        address: address.trim().to_string(),
    })
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.into_config()?;

    // Structured logging to stderr.  `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.node.log_level)),
        )
        .init();

    info!("Sendora node starting");

    let radio = Arc::new(SimulatedRadio::new(SimulatedRadioConfig {
        peers: config.simulated_peers()?,
        response_delay: Duration::from_millis(config.radio.response_delay_ms),
        ..SimulatedRadioConfig::default()
    }));
    let (bus, mut events) = EventBus::new(config.events.buffer_capacity);
    info!("event buffer holds {} events", bus.capacity());
    let options = CoordinatorOptions {
        group_owner_intent: config.radio.group_owner_intent,
        disable_radio_on_shutdown: config.node.disable_radio_on_shutdown,
    };
    let (handle, coordinator_task) =
        Coordinator::spawn(radio, bus, options).context("failed to subscribe to the radio")?;

    let dispatcher = CommandDispatcher::new(
        handle.clone(),
        CredentialPrefixes {
            ssid: config.credentials.ssid_prefix.clone(),
            password: config.credentials.password_prefix.clone(),
        },
    );

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C signal: {e}");
            std::future::pending::<()>().await;
        }
    };

    info!("Sendora node ready; reading requests from stdin");

    let was_interrupted = tokio::select! {
        result = channel::serve(tokio::io::stdin(), tokio::io::stdout(), &dispatcher, &mut events) => {
            result.context("method channel failed")?;
            info!("stdin closed");
            false
        }
        _ = interrupted => {
            info!("shutdown signal received");
            true
        }
    };

    handle.shutdown().await;
    coordinator_task
        .await
        .context("coordinator task panicked")?;

    info!(
        "Sendora node stopped (interrupted: {was_interrupted}, events dropped: {})",
        events.dropped()
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
