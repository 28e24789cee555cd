//! TOML-based configuration for the node.
//!
//! Example file (every field is optional):
//!
//! ```toml
//! [node]
//! log_level = "info"
//! disable_radio_on_shutdown = false
//!
//! [events]
//! buffer_capacity = 64
//!
//! [radio]
//! group_owner_intent = 0
//! response_delay_ms = 0
//!
//! [[radio.peers]]
//! name = "Pixel"
//! address = "02:00:00:aa:bb:cc"
//!
//! [credentials]
//! ssid_prefix = "Sendora"
//! password_prefix = "Pass"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent, and whole sections default the
//! same way, so an empty file is a valid configuration.  Values are checked
//! by [`AppConfig::validate`] after parsing.

use std::path::{Path, PathBuf};

use sendora_core::credentials::{DEFAULT_PASSWORD_PREFIX, DEFAULT_SSID_PREFIX};
use sendora_core::{AddressError, DeviceAddress};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::event_bus::DEFAULT_CAPACITY;

/// Highest group-owner intent the radio accepts.
pub const MAX_GROUP_OWNER_INTENT: u8 = 15;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// A simulated peer has a malformed address.
    #[error("invalid address for simulated peer {name:?}: {source}")]
    PeerAddress {
        name: String,
        #[source]
        source: AddressError,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub radio: RadioConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// General node behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Switch the radio off when the node shuts down.
    #[serde(default)]
    pub disable_radio_on_shutdown: bool,
}

/// Event delivery to the consumer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventsConfig {
    /// Undelivered events kept before the oldest are dropped, rounded up to
    /// the next power of two.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

/// Radio request parameters and the simulated radio's environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RadioConfig {
    /// Group-owner intent sent with connect requests, 0..=15.
    #[serde(default)]
    pub group_owner_intent: u8,
    /// Delay before the simulated radio answers, in milliseconds.
    #[serde(default)]
    pub response_delay_ms: u64,
    /// Peers the simulated radio reports during discovery.
    #[serde(default)]
    pub peers: Vec<PeerEntry>,
}

/// One simulated peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerEntry {
    pub name: String,
    pub address: String,
}

/// Prefixes for `generateNetworkDetails`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialsConfig {
    #[serde(default = "default_ssid_prefix")]
    pub ssid_prefix: String,
    #[serde(default = "default_password_prefix")]
    pub password_prefix: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_buffer_capacity() -> usize {
    DEFAULT_CAPACITY
}
fn default_ssid_prefix() -> String {
    DEFAULT_SSID_PREFIX.to_string()
}
fn default_password_prefix() -> String {
    DEFAULT_PASSWORD_PREFIX.to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            disable_radio_on_shutdown: false,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            ssid_prefix: default_ssid_prefix(),
            password_prefix: default_password_prefix(),
        }
    }
}

impl AppConfig {
    /// Checks value ranges and simulated peer addresses.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] or [`ConfigError::PeerAddress`] for the
    /// first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.events.buffer_capacity == 0 {
            return Err(ConfigError::Invalid(
                "events.buffer_capacity must be at least 1".to_string(),
            ));
        }
        if self.radio.group_owner_intent > MAX_GROUP_OWNER_INTENT {
            return Err(ConfigError::Invalid(format!(
                "radio.group_owner_intent must be 0..={MAX_GROUP_OWNER_INTENT}, got {}",
                self.radio.group_owner_intent
            )));
        }
        self.simulated_peers().map(|_| ())
    }

    /// Parsed `(name, address)` pairs for the simulated radio.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PeerAddress`] for the first malformed address.
    pub fn simulated_peers(&self) -> Result<Vec<(String, DeviceAddress)>, ConfigError> {
        self.radio
            .peers
            .iter()
            .map(|entry| {
                DeviceAddress::parse(&entry.address)
                    .map(|address| (entry.name.clone(), address))
                    .map_err(|source| ConfigError::PeerAddress {
                        name: entry.name.clone(),
                        source,
                    })
            })
            .collect()
    }
}

/// Parses and validates TOML text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed TOML and the
/// [`AppConfig::validate`] errors for bad values.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Loads the configuration from `path`, or the defaults when no path is given.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, plus everything
/// [`parse_config`] returns.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
