//! Network session management and resilience.
//!
//! Owns the connectivity lifecycle as a tick-driven state machine: link
//! observation, rate-limited session establishment, remote restart commands,
//! the firmware-update latch, and the hard-reset watchdog.

pub mod state;
pub mod supervisor;

pub use state::{ConnectionState, NetState};
pub use supervisor::NetworkSupervisor;
