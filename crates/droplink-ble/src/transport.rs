//! Device transport seam and its btleplug implementation
//!
//! [`DeviceTransport`] is the boundary between the link manager's lifecycle
//! logic and the physical radio: `open` performs scan, connect, and service
//! discovery, and yields a [`DeviceSession`] for the handshake write, the
//! notification stream, and liveness checks. Production code uses
//! [`BleTransport`]; the link tests drive the same manager through a mock.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::{Stream, StreamExt};
use tokio::time::{timeout, Instant};
use tracing::{debug, info};

use crate::config::LinkConfig;
use crate::error::LinkError;

/// Stream of raw notification payloads from the device. Ends when the
/// transport-level connection is gone.
pub type NotificationStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// Poll cadence while waiting for the device to show up in scan results.
const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(500);

// ----------------------------------------------------------------------------
// Transport Traits
// ----------------------------------------------------------------------------

/// One open connection to the device.
#[async_trait]
pub trait DeviceSession: Send {
    /// Write one payload to the telemetry characteristic.
    async fn write(&mut self, payload: &[u8]) -> Result<(), LinkError>;

    /// Subscribe to device notifications.
    async fn subscribe(&mut self) -> Result<NotificationStream, LinkError>;

    /// Transport-level liveness check, polled periodically while connected.
    async fn is_alive(&self) -> bool;

    /// Tear down the connection. Best-effort; failures are ignored.
    async fn close(&mut self);
}

/// Factory for device sessions; each reconnect attempt opens a fresh one.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn open(&self) -> Result<Box<dyn DeviceSession>, LinkError>;
}

// ----------------------------------------------------------------------------
// BLE Implementation
// ----------------------------------------------------------------------------

/// btleplug-backed transport connecting to the configured device address.
pub struct BleTransport {
    config: LinkConfig,
}

impl BleTransport {
    pub fn new(config: LinkConfig) -> Self {
        Self { config }
    }

    /// Poll scan results until the configured address appears or the scan
    /// window closes.
    async fn locate_peripheral(&self, adapter: &Adapter) -> Result<Peripheral, LinkError> {
        let deadline = Instant::now() + self.config.scan_timeout;
        loop {
            for peripheral in adapter.peripherals().await? {
                let address = peripheral.address().to_string();
                if address.eq_ignore_ascii_case(&self.config.address) {
                    debug!(address = %address, "Device found in scan results");
                    return Ok(peripheral);
                }
            }
            if Instant::now() >= deadline {
                return Err(LinkError::DeviceNotFound {
                    address: self.config.address.clone(),
                });
            }
            tokio::time::sleep(SCAN_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl DeviceTransport for BleTransport {
    async fn open(&self) -> Result<Box<dyn DeviceSession>, LinkError> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(LinkError::AdapterNotAvailable)?;

        adapter.start_scan(ScanFilter::default()).await?;
        let located = self.locate_peripheral(&adapter).await;
        if let Err(e) = adapter.stop_scan().await {
            debug!("Failed to stop BLE scan: {}", e);
        }
        let peripheral = located?;

        match timeout(self.config.connect_timeout, peripheral.connect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(LinkError::ConnectionFailed(e.to_string())),
            Err(_) => return Err(LinkError::ConnectionTimeout),
        }
        info!(address = %self.config.address, "Connected to device");

        peripheral.discover_services().await?;
        let characteristic = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == self.config.characteristic)
            .ok_or(LinkError::CharacteristicNotFound {
                uuid: self.config.characteristic,
            })?;

        Ok(Box::new(BleSession {
            peripheral,
            characteristic,
        }))
    }
}

struct BleSession {
    peripheral: Peripheral,
    characteristic: Characteristic,
}

#[async_trait]
impl DeviceSession for BleSession {
    async fn write(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        self.peripheral
            .write(&self.characteristic, payload, WriteType::WithResponse)
            .await
            .map_err(|e| LinkError::WriteFailed(e.to_string()))
    }

    async fn subscribe(&mut self) -> Result<NotificationStream, LinkError> {
        self.peripheral
            .subscribe(&self.characteristic)
            .await
            .map_err(|e| LinkError::SubscriptionFailed(e.to_string()))?;

        let notifications = self
            .peripheral
            .notifications()
            .await
            .map_err(|e| LinkError::NotificationStreamFailed(e.to_string()))?;

        let uuid = self.characteristic.uuid;
        Ok(Box::pin(notifications.filter_map(move |notification| {
            futures::future::ready((notification.uuid == uuid).then_some(notification.value))
        })))
    }

    async fn is_alive(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    async fn close(&mut self) {
        if let Err(e) = self.peripheral.disconnect().await {
            debug!("Failed to disconnect cleanly: {}", e);
        }
    }
}
