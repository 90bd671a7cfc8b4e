//! Device protocol decoder
//!
//! The device speaks a line-oriented text protocol: a leading tag token
//! followed by comma-separated `KEY=VALUE` tokens.
//!
//! ```text
//! LIVE,T=21.5,H=40,R=0,P=0,Y=0,G=1.02,L=60,F=10
//! PEAKS,G=2.5@12:00:01,HGT=1.8@12:00:01
//! DROP,TIME=100,INT=5,PG=3.0,H=1.2,L=55,F=8
//! ```
//!
//! Decoding is a pure function with no I/O and never fails: a malformed
//! token degrades to that token's default (`LIVE` fields fall back to 0,
//! `PEAKS` tokens are skipped, `DROP` fields fall back to empty), and an
//! unknown tag classifies as [`DeviceMessage::Unrecognized`]. The link
//! manager's read loop relies on this totality.

use crate::types::{DropReport, LiveReading, PeakMetric, PeakUpdate};

// ----------------------------------------------------------------------------
// Decoded Messages
// ----------------------------------------------------------------------------

/// One device message, classified by its leading tag.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceMessage {
    /// Complete live snapshot; replaces the stored reading as a whole.
    Live(LiveReading),
    /// Zero or more peak observations, one per well-formed token.
    Peaks(Vec<PeakUpdate>),
    /// A discrete drop event destined for the durable sink.
    Drop(DropReport),
    /// Anything the decoder cannot classify; logged raw and discarded.
    Unrecognized,
}

/// Decode one line of device output.
pub fn decode_line(line: &str) -> DeviceMessage {
    let message = line.trim();
    if message.starts_with("LIVE") {
        DeviceMessage::Live(decode_live(message))
    } else if message.starts_with("PEAKS") {
        DeviceMessage::Peaks(decode_peaks(message))
    } else if message.starts_with("DROP") {
        DeviceMessage::Drop(decode_drop(message))
    } else {
        DeviceMessage::Unrecognized
    }
}

// ----------------------------------------------------------------------------
// Per-Tag Decoders
// ----------------------------------------------------------------------------

/// `KEY=VALUE` tokens after the leading tag. Tokens without `=` are skipped;
/// only the first `=` splits, so values may contain further `=` characters.
fn kv_tokens(message: &str) -> impl Iterator<Item = (&str, &str)> {
    message.split(',').skip(1).filter_map(|token| token.split_once('='))
}

fn decode_live(message: &str) -> LiveReading {
    let mut reading = LiveReading::default();
    for (key, value) in kv_tokens(message) {
        // Missing keys keep the 0 default; unparseable values fall back to it.
        let value = value.trim().parse::<f64>().unwrap_or(0.0);
        match key {
            "T" => reading.temp = value,
            "H" => reading.humidity = value,
            "R" => reading.roll = value,
            "P" => reading.pitch = value,
            "Y" => reading.yaw = value,
            "G" => reading.g = value,
            "L" => reading.ldr = value,
            "F" => reading.flex = value,
            _ => {}
        }
    }
    reading
}

fn decode_peaks(message: &str) -> Vec<PeakUpdate> {
    let mut updates = Vec::new();
    for (key, value) in kv_tokens(message) {
        let Some(metric) = PeakMetric::from_key(key) else {
            continue;
        };
        // Split off the optional @timestamp suffix before numeric parsing.
        let (number, device_ts) = match value.split_once('@') {
            Some((number, ts)) => (number, ts.trim()),
            None => (value, ""),
        };
        // A token with an unparseable value is dropped, not fatal.
        if let Ok(value) = number.trim().parse::<f64>() {
            updates.push(PeakUpdate {
                metric,
                value,
                device_ts: device_ts.to_string(),
            });
        }
    }
    updates
}

fn decode_drop(message: &str) -> DropReport {
    let mut report = DropReport::default();
    for (key, value) in kv_tokens(message) {
        match key {
            "TIME" => report.device_time = value.to_string(),
            "INT" => report.intensity = value.to_string(),
            "PG" => report.peak_g = value.to_string(),
            "H" => report.height = value.to_string(),
            "L" => report.ldr = value.to_string(),
            "F" => report.flex = value.to_string(),
            _ => {}
        }
    }
    report
}
