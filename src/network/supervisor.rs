//! Tick-driven network supervisor.
//!
//! Runs on the services task, independent of the capture loop, observing
//! only time and collaborator status, never frame data. Each tick:
//!
//! 1. drain the inbound event queue (remote commands, update lifecycle);
//! 2. observe the link: down means a watchdog check, up refreshes the online
//!    timestamp and, at most once per retry interval, attempts the session.
//!
//! The watchdog is the core liveness guarantee: a device that cannot
//! self-heal a stuck network stack within the timeout is hard-restarted
//! rather than left silently offline.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::NetworkSettings;
use crate::hardware::{DeviceControl, LinkLayer, LinkStatus, ServiceEvent, SessionClient, SessionOptions};

use super::state::{ConnectionState, NetState};

/// Retained payloads on the status topic.
const STATUS_ONLINE: &[u8] = b"1";
const STATUS_OFFLINE: &[u8] = b"0";
/// First payload byte of a remote restart command.
const RESTART_COMMAND: u8 = b'1';

pub struct NetworkSupervisor {
    link: Arc<dyn LinkLayer>,
    session: Arc<dyn SessionClient>,
    device: Arc<dyn DeviceControl>,
    events: mpsc::Receiver<ServiceEvent>,
    settings: NetworkSettings,
    state: NetState,
}

impl NetworkSupervisor {
    pub fn new(
        link: Arc<dyn LinkLayer>,
        session: Arc<dyn SessionClient>,
        device: Arc<dyn DeviceControl>,
        events: mpsc::Receiver<ServiceEvent>,
        settings: NetworkSettings,
        now: Instant,
    ) -> Self {
        Self {
            link,
            session,
            device,
            events,
            settings,
            state: NetState::new(now),
        }
    }

    pub fn state(&self) -> &NetState {
        &self.state
    }

    /// One-time startup: kick off the link. The link driver owns its own
    /// reconnection from here on.
    pub async fn start(&mut self) {
        if let Err(e) = self.link.connect().await {
            warn!(error = %e, "link connect failed at startup");
        }
    }

    /// Advance the state machine. `now` is injected so policy is testable
    /// against synthetic clocks.
    pub async fn tick(&mut self, now: Instant) {
        self.drain_events().await;
        if self.state.restart_requested {
            // device is going down; stop touching collaborators
            return;
        }

        match self.link.status().await {
            LinkStatus::Down => {
                self.state.connection = ConnectionState::Disconnected;
                let downtime = now.duration_since(self.state.last_link_online);
                if downtime >= self.settings.watchdog_timeout {
                    self.trigger_restart("link watchdog expired");
                }
            }
            LinkStatus::Up => {
                self.state.last_link_online = now;
                if self.session.is_connected() {
                    self.state.connection = ConnectionState::SessionEstablished;
                } else {
                    self.state.connection = ConnectionState::LinkUp;
                    if !self.state.update_in_progress && self.session_attempt_due(now) {
                        self.try_establish_session(now).await;
                    }
                }
            }
        }
    }

    fn session_attempt_due(&self, now: Instant) -> bool {
        match self.state.last_session_attempt {
            None => true,
            Some(last) => now.duration_since(last) >= self.settings.session_retry,
        }
    }

    async fn try_establish_session(&mut self, now: Instant) {
        self.state.last_session_attempt = Some(now);

        let options = SessionOptions {
            client_id: self.settings.client_id.clone(),
            username: self.settings.username.clone(),
            password: self.settings.password.clone(),
            last_will_topic: self.settings.status_topic(),
            last_will_payload: STATUS_OFFLINE.to_vec(),
            last_will_retained: true,
        };

        match self.session.connect(&options).await {
            Ok(true) => {
                self.state.connection = ConnectionState::SessionEstablished;
                self.announce().await;
                info!(client_id = %self.settings.client_id, "session established");
            }
            Ok(false) => debug!("session refused by broker"),
            Err(e) => warn!(error = %e, "session connect failed"),
        }
    }

    /// Retained presence: online marker, firmware version, and the
    /// restart-control subscription.
    async fn announce(&self) {
        if let Err(e) = self
            .session
            .publish(&self.settings.status_topic(), STATUS_ONLINE, true)
            .await
        {
            warn!(error = %e, "status publish failed");
        }
        if let Err(e) = self
            .session
            .publish(
                &self.settings.version_topic(),
                env!("CARGO_PKG_VERSION").as_bytes(),
                true,
            )
            .await
        {
            warn!(error = %e, "version publish failed");
        }
        if let Err(e) = self.session.subscribe(&self.settings.restart_topic()).await {
            warn!(error = %e, "restart-control subscribe failed");
        }
    }

    async fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                ServiceEvent::Message { topic, payload } => self.handle_message(&topic, &payload),
                ServiceEvent::UpdateStarted => {
                    if !self.state.update_in_progress {
                        info!("firmware update started, latching update mode");
                    }
                    // one-way latch; no transition back
                    self.state.update_in_progress = true;
                }
                ServiceEvent::UpdateEnded => {
                    self.trigger_restart("firmware update finished");
                }
                ServiceEvent::UpdateFailed(code) => {
                    warn!(code, "firmware update failed");
                    self.trigger_restart("firmware update failed");
                }
            }
        }
    }

    fn handle_message(&mut self, topic: &str, payload: &[u8]) {
        if topic == self.settings.restart_topic() {
            if payload.first() == Some(&RESTART_COMMAND) {
                self.trigger_restart("remote restart command");
            }
            return;
        }
        // unrecognized commands are silently dropped, never fatal
        debug!(topic, bytes = payload.len(), "ignoring message");
    }

    fn trigger_restart(&mut self, reason: &str) {
        if self.state.restart_requested {
            return;
        }
        self.state.restart_requested = true;
        warn!(reason, "restarting device");
        self.device.restart();
    }
}
