//! Connection state owned by the services task.
//!
//! An explicit owned struct passed through the supervisor's loop rather than
//! ambient globals, so the state machine is testable in isolation from real
//! hardware.

use std::time::Instant;

/// Where the device sits in the connectivity lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Physical link is down.
    Disconnected,
    /// Link is up, no broker session yet.
    LinkUp,
    /// Publish/subscribe session is live.
    SessionEstablished,
}

#[derive(Debug)]
pub struct NetState {
    pub connection: ConnectionState,
    /// Last moment the link was observed up; the watchdog measures
    /// continuous downtime from here.
    pub last_link_online: Instant,
    /// Last session establishment attempt, for the reconnect rate limit.
    pub last_session_attempt: Option<Instant>,
    /// One-way latch set when a firmware update begins.
    pub update_in_progress: bool,
    /// A restart has been requested; never re-triggered.
    pub restart_requested: bool,
}

impl NetState {
    pub fn new(now: Instant) -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            last_link_online: now,
            last_session_attempt: None,
            update_in_progress: false,
            restart_requested: false,
        }
    }
}
