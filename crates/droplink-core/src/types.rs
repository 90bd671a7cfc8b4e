//! Telemetry data model
//!
//! Fixed-shape records for everything the device reports. The field set of
//! each record is closed and known ahead of time, so these are plain structs
//! and enums rather than open-ended maps.

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Timestamp Helpers
// ----------------------------------------------------------------------------

/// Format used for server-assigned timestamps on log entries and drop rows.
pub const SERVER_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Server-assigned wall-clock timestamp for log entries and drop rows.
pub fn server_timestamp() -> String {
    chrono::Local::now().format(SERVER_TS_FORMAT).to_string()
}

/// UTC timestamp with millisecond precision, attached to live frames.
pub fn live_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

// ----------------------------------------------------------------------------
// Live Readings
// ----------------------------------------------------------------------------

/// Most recent full sensor snapshot reported by the device.
///
/// Replaced atomically as a whole record whenever a complete `LIVE` message
/// decodes; readers never observe a partially updated reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LiveReading {
    /// Temperature in degrees Celsius.
    pub temp: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
    /// Roll angle in degrees.
    pub roll: f64,
    /// Pitch angle in degrees.
    pub pitch: f64,
    /// Yaw angle in degrees.
    pub yaw: f64,
    /// Acceleration magnitude in g.
    pub g: f64,
    /// Light level percentage.
    pub ldr: f64,
    /// Flex sensor percentage.
    pub flex: f64,
}

/// A live reading as observers and REST clients see it: the reading plus a
/// server timestamp generated at emission time and the link connectivity flag.
///
/// Never stored; built fresh from the current reading on every emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveFrame {
    #[serde(flatten)]
    pub reading: LiveReading,
    pub timestamp: String,
    pub connected: bool,
}

// ----------------------------------------------------------------------------
// Peak Metrics
// ----------------------------------------------------------------------------

/// The closed set of metrics the device reports running peaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeakMetric {
    G,
    Height,
    Temperature,
    Humidity,
    Light,
    Flex,
}

impl PeakMetric {
    /// All peak metrics, in the device's reporting order.
    pub const ALL: [PeakMetric; 6] = [
        PeakMetric::G,
        PeakMetric::Height,
        PeakMetric::Temperature,
        PeakMetric::Humidity,
        PeakMetric::Light,
        PeakMetric::Flex,
    ];

    /// Map a wire key from a `PEAKS` message to its metric.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "G" => Some(PeakMetric::G),
            "HGT" => Some(PeakMetric::Height),
            "TEMP" => Some(PeakMetric::Temperature),
            "HUM" => Some(PeakMetric::Humidity),
            "LDR" => Some(PeakMetric::Light),
            "FLEX" => Some(PeakMetric::Flex),
            _ => None,
        }
    }

    /// Wire key for this metric.
    pub fn key(&self) -> &'static str {
        match self {
            PeakMetric::G => "G",
            PeakMetric::Height => "HGT",
            PeakMetric::Temperature => "TEMP",
            PeakMetric::Humidity => "HUM",
            PeakMetric::Light => "LDR",
            PeakMetric::Flex => "FLEX",
        }
    }

    /// Display label used in peak events.
    pub fn label(&self) -> &'static str {
        match self {
            PeakMetric::G => "G-Force",
            PeakMetric::Height => "Height",
            PeakMetric::Temperature => "Temperature",
            PeakMetric::Humidity => "Humidity",
            PeakMetric::Light => "LDR",
            PeakMetric::Flex => "FLEX",
        }
    }
}

/// One decoded `KEY=value[@ts]` token from a `PEAKS` message.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakUpdate {
    pub metric: PeakMetric,
    pub value: f64,
    /// Device-reported timestamp string, empty when the token carried none.
    pub device_ts: String,
}

/// Current peak for one metric. A value of 0.0 is the uninitialized sentinel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PeakRecord {
    pub value: f64,
    /// Device-reported timestamp of the peak observation.
    pub device_ts: String,
}

/// Immutable record of an accepted new peak, appended to the bounded
/// peak-event log and pushed to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakEvent {
    /// Display label of the metric, e.g. `G-Force`.
    pub parameter: String,
    pub value: f64,
    /// Server timestamp at acceptance time.
    pub timestamp: String,
    pub date: String,
    pub time: String,
}

impl PeakEvent {
    /// Build an event for `metric`/`value` stamped with the current server time.
    pub fn now(metric: PeakMetric, value: f64) -> Self {
        let now = chrono::Local::now();
        PeakEvent {
            parameter: metric.label().to_string(),
            value,
            timestamp: now.format(SERVER_TS_FORMAT).to_string(),
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M:%S").to_string(),
        }
    }
}

// ----------------------------------------------------------------------------
// Raw Message Log
// ----------------------------------------------------------------------------

/// One raw device message, kept for diagnostics and replay by observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    /// Server timestamp at arrival time.
    pub timestamp: String,
    /// Original message text, verbatim.
    pub data: String,
}

// ----------------------------------------------------------------------------
// Drop Records
// ----------------------------------------------------------------------------

/// Decoded payload of a `DROP` message, before a server arrival time is
/// assigned. Fields are opaque text; they are persisted verbatim.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DropReport {
    pub device_time: String,
    pub intensity: String,
    pub peak_g: String,
    pub height: String,
    pub ldr: String,
    pub flex: String,
}

impl DropReport {
    /// Attach the server arrival time, producing the record the sink persists.
    pub fn into_record(self, pc_time: String) -> DropRecord {
        DropRecord {
            pc_time,
            device_time: self.device_time,
            intensity: self.intensity,
            peak_g: self.peak_g,
            height: self.height,
            ldr: self.ldr,
            flex: self.flex,
        }
    }
}

/// A drop event as persisted by the durable sink: written once, append-only,
/// never mutated or read back by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropRecord {
    pub pc_time: String,
    pub device_time: String,
    pub intensity: String,
    pub peak_g: String,
    pub height: String,
    pub ldr: String,
    pub flex: String,
}

// ----------------------------------------------------------------------------
// Link State
// ----------------------------------------------------------------------------

/// Connectivity to the one device. Owned by the link manager; the store only
/// carries its connected/not-connected projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

impl LinkState {
    /// Whether this state counts as connected for observer-facing flags.
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_metric_key_roundtrip() {
        for metric in PeakMetric::ALL {
            assert_eq!(PeakMetric::from_key(metric.key()), Some(metric));
        }
        assert_eq!(PeakMetric::from_key("XYZ"), None);
    }

    #[test]
    fn test_live_frame_flattens_reading_fields() {
        let frame = LiveFrame {
            reading: LiveReading {
                temp: 21.5,
                ..Default::default()
            },
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            connected: true,
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["temp"], 21.5);
        assert_eq!(json["connected"], true);
        assert!(json.get("reading").is_none());
    }

    #[test]
    fn test_drop_report_into_record_preserves_fields() {
        let report = DropReport {
            device_time: "100".to_string(),
            intensity: "5".to_string(),
            peak_g: "3.0".to_string(),
            height: "1.2".to_string(),
            ldr: "55".to_string(),
            flex: "8".to_string(),
        };
        let record = report.into_record("2026-01-01 12:00:00".to_string());
        assert_eq!(record.pc_time, "2026-01-01 12:00:00");
        assert_eq!(record.device_time, "100");
        assert_eq!(record.flex, "8");
    }
}
