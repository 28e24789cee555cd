//! Radio drivers implementing [`crate::application::radio::RadioSubsystem`].
//!
//! Only a simulated driver ships with the node.  A platform driver would sit
//! next to it and translate the same trait calls into real radio requests.

pub mod simulated;

pub use simulated::{RadioRequest, ResponseMode, SimulatedRadio, SimulatedRadioConfig};
