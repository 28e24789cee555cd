//! Storage infrastructure: the node configuration file.
//!
//! The `config` sub-module reads the TOML file, fills in defaults for
//! anything missing and validates the values before the node starts.

pub mod config;
