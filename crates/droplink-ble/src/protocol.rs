//! Link-level protocol constants and the handshake payload

use uuid::Uuid;

// ----------------------------------------------------------------------------
// Characteristic UUID
// ----------------------------------------------------------------------------

/// Telemetry characteristic: the device notifies message lines on it and
/// accepts the time-sync write.
pub const TELEMETRY_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0xabcd1234_1234_1234_1234_1234567890ab);

// ----------------------------------------------------------------------------
// Handshake
// ----------------------------------------------------------------------------

/// The one handshake message written after connecting: current wall-clock
/// time as unix epoch seconds, so the device can stamp its peak reports.
pub fn time_sync_payload(epoch_seconds: i64) -> Vec<u8> {
    format!("TIME={}", epoch_seconds).into_bytes()
}
