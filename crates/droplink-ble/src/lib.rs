//! Bluetooth Low Energy device link for Droplink
//!
//! This crate owns the connection to the one sensor device: it scans for the
//! configured address, connects, performs the time-sync handshake, subscribes
//! to the telemetry characteristic, and feeds every notification through the
//! decoder into the state store, reconnecting forever across link drops.
//!
//! ## Architecture
//!
//! - [`config`] - Link configuration and timing parameters
//! - [`error`] - Error types specific to the device link
//! - [`protocol`] - Characteristic UUID and handshake payload
//! - [`transport`] - The `DeviceTransport` seam and its btleplug implementation
//! - [`link`] - The reconnect state machine and ingest loop
//!
//! The transport seam exists so the link manager's lifecycle logic can be
//! exercised against an in-process mock; production code wires in
//! [`BleTransport`].

mod config;
mod error;
mod link;
mod protocol;
mod transport;

// Public API exports
pub use config::LinkConfig;
pub use error::LinkError;
pub use link::LinkManager;
pub use protocol::{time_sync_payload, TELEMETRY_CHARACTERISTIC_UUID};
pub use transport::{BleTransport, DeviceSession, DeviceTransport, NotificationStream};
