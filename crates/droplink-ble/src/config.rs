//! Device link configuration

use std::time::Duration;

use uuid::Uuid;

use crate::protocol::TELEMETRY_CHARACTERISTIC_UUID;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for the BLE device link.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Bluetooth address of the sensor device.
    pub address: String,
    /// Characteristic used for notifications and the time-sync write.
    pub characteristic: Uuid,
    /// Maximum time to wait for the device to appear during a scan.
    pub scan_timeout: Duration,
    /// Maximum time to wait for a transport-level connect.
    pub connect_timeout: Duration,
    /// Interval of the liveness poll while connected.
    pub liveness_interval: Duration,
    /// Cooldown between reconnect attempts after a disconnection.
    pub retry_cooldown: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            address: "DC:1E:D5:63:35:92".to_string(),
            characteristic: TELEMETRY_CHARACTERISTIC_UUID,
            scan_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            liveness_interval: Duration::from_secs(1),
            retry_cooldown: Duration::from_secs(2),
        }
    }
}

impl LinkConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the device address.
    pub fn with_address(mut self, address: String) -> Self {
        self.address = address;
        self
    }

    /// Set the telemetry characteristic.
    pub fn with_characteristic(mut self, characteristic: Uuid) -> Self {
        self.characteristic = characteristic;
        self
    }

    /// Set the scan timeout.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the liveness poll interval.
    pub fn with_liveness_interval(mut self, interval: Duration) -> Self {
        self.liveness_interval = interval;
        self
    }

    /// Set the reconnect cooldown.
    pub fn with_retry_cooldown(mut self, cooldown: Duration) -> Self {
        self.retry_cooldown = cooldown;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployment_constants() {
        let config = LinkConfig::default();
        assert_eq!(config.address, "DC:1E:D5:63:35:92");
        assert_eq!(config.liveness_interval, Duration::from_secs(1));
        assert_eq!(config.retry_cooldown, Duration::from_secs(2));
    }

    #[test]
    fn test_builder_overrides() {
        let config = LinkConfig::new()
            .with_address("AA:BB:CC:DD:EE:FF".to_string())
            .with_retry_cooldown(Duration::from_millis(100));
        assert_eq!(config.address, "AA:BB:CC:DD:EE:FF");
        assert_eq!(config.retry_cooldown, Duration::from_millis(100));
    }

    #[test]
    fn test_toml_roundtrip_preserves_durations() {
        let config = LinkConfig::new().with_retry_cooldown(Duration::from_millis(2500));
        let rendered = toml::to_string(&config).unwrap();
        let parsed: LinkConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.retry_cooldown, Duration::from_millis(2500));
        assert_eq!(parsed.characteristic, config.characteristic);
    }
}
