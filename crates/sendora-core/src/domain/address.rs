//! Peer hardware addresses.
//!
//! Radios identify peers by a colon-separated hex address.  Full MAC addresses
//! have six octets (`02:00:00:aa:bb:cc`) but shortened forms such as `aa:bb`
//! show up in test rigs and simulators, so anything from one to six octets is
//! accepted.  The address is stored lower-cased so that `AA:BB` and `aa:bb`
//! refer to the same peer.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of octets in a device address.
pub const MAX_OCTETS: usize = 6;

/// Reasons an address string is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,
    #[error("address {0:?} has more than {MAX_OCTETS} octets")]
    TooLong(String),
    #[error("address {0:?} is not colon-separated hex octets")]
    Malformed(String),
}

/// A validated, lower-cased peer address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Parses and normalises an address.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] when the input is empty, carries surrounding
    /// whitespace, has more than six octets, or contains anything other than
    /// two-digit hex octets separated by `:`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sendora_core::DeviceAddress;
    ///
    /// let addr = DeviceAddress::parse("AA:bb").unwrap();
    /// assert_eq!(addr.as_str(), "aa:bb");
    /// assert!(DeviceAddress::parse("").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        if raw.is_empty() {
            return Err(AddressError::Empty);
        }

        let octets: Vec<&str> = raw.split(':').collect();
        if octets.len() > MAX_OCTETS {
            return Err(AddressError::TooLong(raw.to_string()));
        }
        let well_formed = octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
        if !well_formed {
            return Err(AddressError::Malformed(raw.to_string()));
        }

        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// Returns the normalised textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DeviceAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DeviceAddress> for String {
    fn from(addr: DeviceAddress) -> Self {
        addr.0
    }
}
