//! Infrastructure layer for the node.
//!
//! Contains the adapters around the application layer: a simulated radio
//! driver, the JSON-lines method channel and TOML configuration storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `sendora_core`, but MUST NOT be imported by the `application` layer.

pub mod channel;
pub mod radio;
pub mod storage;
