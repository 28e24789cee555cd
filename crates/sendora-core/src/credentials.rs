//! Human-readable network details for `generateNetworkDetails`.
//!
//! This is pure formatting and plays no part in the link state machine.  The
//! suffix is the current Unix time in milliseconds modulo 10 000, shared by
//! the SSID and the password.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub const DEFAULT_SSID_PREFIX: &str = "Sendora";
pub const DEFAULT_PASSWORD_PREFIX: &str = "Pass";

/// SSID and password pair handed to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDetails {
    pub ssid: String,
    pub password: String,
}

impl NetworkDetails {
    /// Formats details for a given clock reading.
    ///
    /// ```rust
    /// use sendora_core::NetworkDetails;
    ///
    /// let details = NetworkDetails::at_millis("Sendora", "Pass", 1_700_000_012_345);
    /// assert_eq!(details.ssid, "Sendora_2345");
    /// assert_eq!(details.password, "Pass_2345");
    /// ```
    pub fn at_millis(ssid_prefix: &str, password_prefix: &str, unix_millis: u128) -> Self {
        let suffix = unix_millis % 10_000;
        Self {
            ssid: format!("{ssid_prefix}_{suffix}"),
            password: format!("{password_prefix}_{suffix}"),
        }
    }

    /// Formats details for the current time.
    pub fn generate(ssid_prefix: &str, password_prefix: &str) -> Self {
        Self::at_millis(ssid_prefix, password_prefix, current_unix_millis())
    }
}

fn current_unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
