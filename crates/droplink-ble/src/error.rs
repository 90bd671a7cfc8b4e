//! Error types for the device link

use thiserror::Error;
use uuid::Uuid;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors raised while connecting to or reading from the device. Every one of
/// these is caught at the reconnect loop boundary and answered with a
/// cooldown and a new attempt; none are fatal to the process.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("BLE adapter not available")]
    AdapterNotAvailable,

    #[error("device {address} not found during scan")]
    DeviceNotFound { address: String },

    #[error("connection timeout")]
    ConnectionTimeout,

    #[error("failed to connect: {0}")]
    ConnectionFailed(String),

    #[error("characteristic {uuid} not found on device")]
    CharacteristicNotFound { uuid: Uuid },

    #[error("handshake write failed: {0}")]
    WriteFailed(String),

    #[error("failed to subscribe to notifications: {0}")]
    SubscriptionFailed(String),

    #[error("failed to get notifications stream: {0}")]
    NotificationStreamFailed(String),

    #[error("BLE error: {0}")]
    Ble(#[from] btleplug::Error),
}
