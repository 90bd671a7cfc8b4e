//! Device link manager
//!
//! Runs the cyclic Disconnected → Connecting → Connected machine for the
//! life of the process. Each cycle opens a transport session, writes the
//! time-sync handshake, subscribes to notifications, and then ingests
//! messages in arrival order until the link drops, at which point it cools
//! down and tries again. Retries are unbounded; no single link fault ever
//! propagates out of [`LinkManager::run`].

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};

use droplink_core::{
    decode_line, server_timestamp, DeviceMessage, DropSink, LinkState, TelemetryStore,
};

use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::protocol::time_sync_payload;
use crate::transport::{DeviceSession, DeviceTransport};

// ----------------------------------------------------------------------------
// Link Manager
// ----------------------------------------------------------------------------

/// Owns the device connection lifecycle and the ingest path into the store.
pub struct LinkManager {
    config: LinkConfig,
    transport: Arc<dyn DeviceTransport>,
    store: Arc<TelemetryStore>,
    sink: Arc<dyn DropSink>,
    state: LinkState,
}

impl LinkManager {
    pub fn new(
        config: LinkConfig,
        transport: Arc<dyn DeviceTransport>,
        store: Arc<TelemetryStore>,
        sink: Arc<dyn DropSink>,
    ) -> Self {
        Self {
            config,
            transport,
            store,
            sink,
            state: LinkState::Disconnected,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Drive the link for the life of the process. Never returns.
    pub async fn run(&mut self) {
        loop {
            self.state = LinkState::Connecting;
            info!(address = %self.config.address, "Trying to connect to device");

            match self.run_session().await {
                Ok(()) => info!("Device disconnected"),
                Err(e) => warn!("Connection error: {}", e),
            }

            self.state = LinkState::Disconnected;
            self.store.set_connected(false).await;
            tokio::time::sleep(self.config.retry_cooldown).await;
        }
    }

    /// One connect/handshake/subscribe/read cycle. Any fault here surfaces
    /// as an `Err` to the retry loop; a clean remote disconnect is `Ok`.
    async fn run_session(&mut self) -> Result<(), LinkError> {
        let mut session = self.transport.open().await?;
        let result = self.drive_session(session.as_mut()).await;
        session.close().await;
        result
    }

    async fn drive_session(
        &mut self,
        session: &mut dyn DeviceSession,
    ) -> Result<(), LinkError> {
        session
            .write(&time_sync_payload(chrono::Utc::now().timestamp()))
            .await?;
        debug!("Time synced to device");

        let mut notifications = session.subscribe().await?;

        // Only a successful subscription counts as connected.
        self.state = LinkState::Connected;
        self.store.set_connected(true).await;
        info!("Connected to device");

        let mut liveness = tokio::time::interval_at(
            tokio::time::Instant::now() + self.config.liveness_interval,
            self.config.liveness_interval,
        );
        liveness.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                notification = notifications.next() => {
                    match notification {
                        Some(payload) => self.ingest(&payload).await,
                        // Stream end means the transport lost the device.
                        None => return Ok(()),
                    }
                }
                _ = liveness.tick() => {
                    if !session.is_alive().await {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Decode one notification payload and apply it to the store, preserving
    /// arrival order. Malformed input degrades inside the decoder; the only
    /// fallible step is the drop-sink append, which is logged and dropped.
    async fn ingest(&self, payload: &[u8]) {
        let message = String::from_utf8_lossy(payload);
        let message = message.trim();
        self.store.record_raw(message).await;

        match decode_line(message) {
            DeviceMessage::Live(reading) => self.store.apply_live(reading).await,
            DeviceMessage::Peaks(updates) => {
                for update in updates {
                    self.store.apply_peak(update).await;
                }
            }
            DeviceMessage::Drop(report) => {
                let record = report.into_record(server_timestamp());
                if let Err(e) = self.sink.append(&record) {
                    warn!("Failed to persist drop record: {}", e);
                }
            }
            DeviceMessage::Unrecognized => {
                debug!(message = %message, "Unrecognized device message");
            }
        }
    }
}
