//! Domain entities for Sendora.
//!
//! Pure transition logic with no infrastructure dependencies.  Every type in
//! this module is owned by exactly one execution context (the coordinator in
//! `sendora-node`), so none of them use interior mutability or locks.
//!
//! # Sub-modules
//!
//! - **`address`** – Validation of peer hardware addresses.
//! - **`attempt`** – Monotonic attempt tokens and radio operation outcomes.
//! - **`peer`** – The [`peer::PeerRegistry`] snapshot store.
//! - **`connection`** – The [`connection::ConnectionController`] state machine.
//! - **`discovery`** – The [`discovery::DiscoverySession`] state machine.
//! - **`event`** – Notifications emitted to the consumer.

pub mod address;
pub mod attempt;
pub mod connection;
pub mod discovery;
pub mod event;
pub mod peer;
