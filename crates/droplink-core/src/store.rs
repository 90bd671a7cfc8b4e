//! Telemetry state store
//!
//! Authoritative in-memory state: the latest live reading, the per-metric
//! peak table, and the two bounded event logs. One store instance is
//! constructed at process start and shared by handle with the link manager
//! (writer), the observer surface, and the query surface (readers).
//!
//! A single `RwLock` guards the whole mutable state, so every mutation and
//! every snapshot is one atomic step. Broadcaster events are published while
//! the write guard is still held; publishing is a non-blocking channel send,
//! and doing it under the guard keeps observer event order identical to
//! state order.

use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;

use crate::broadcast::{EventBus, TelemetryEvent};
use crate::types::{
    live_timestamp, server_timestamp, LiveFrame, LiveReading, PeakEvent, PeakMetric, PeakRecord,
    PeakUpdate, RawEntry,
};

/// Capacity of the bounded peak-event log.
pub const PEAK_EVENT_CAPACITY: usize = 1000;

/// Capacity of the bounded raw-message log.
pub const RAW_LOG_CAPACITY: usize = 1000;

/// Most recent entries of each log pushed to an observer on attach.
pub const ATTACH_BATCH_LIMIT: usize = 100;

// ----------------------------------------------------------------------------
// Store
// ----------------------------------------------------------------------------

struct StoreInner {
    live: LiveReading,
    peaks: HashMap<PeakMetric, PeakRecord>,
    peak_events: VecDeque<PeakEvent>,
    raw_log: VecDeque<RawEntry>,
    connected: bool,
}

/// Thread-safe telemetry state store.
pub struct TelemetryStore {
    inner: RwLock<StoreInner>,
    bus: EventBus,
    peak_capacity: usize,
    raw_capacity: usize,
}

/// Consistent point-in-time view for observer-connect handshakes.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub connected: bool,
    pub live: LiveFrame,
    /// Most recent peak events, newest first, capped to the attach limit.
    pub peak_events: Vec<PeakEvent>,
    /// Most recent raw entries in stored order, capped to the attach limit.
    pub raw_entries: Vec<RawEntry>,
}

impl TelemetryStore {
    /// Create a store with the default log capacities.
    pub fn new(bus: EventBus) -> Self {
        Self::with_capacities(bus, PEAK_EVENT_CAPACITY, RAW_LOG_CAPACITY)
    }

    /// Create a store with explicit log capacities.
    pub fn with_capacities(bus: EventBus, peak_capacity: usize, raw_capacity: usize) -> Self {
        let peaks = PeakMetric::ALL
            .into_iter()
            .map(|metric| (metric, PeakRecord::default()))
            .collect();
        TelemetryStore {
            inner: RwLock::new(StoreInner {
                live: LiveReading::default(),
                peaks,
                peak_events: VecDeque::new(),
                raw_log: VecDeque::new(),
                connected: false,
            }),
            bus,
            peak_capacity,
            raw_capacity,
        }
    }

    /// The bus this store publishes on.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Append a raw device message to the bounded raw log. Called for every
    /// inbound message before type-specific dispatch.
    pub async fn record_raw(&self, message: &str) {
        let entry = RawEntry {
            timestamp: server_timestamp(),
            data: message.to_string(),
        };
        let mut inner = self.inner.write().await;
        if inner.raw_log.len() >= self.raw_capacity {
            inner.raw_log.pop_front();
        }
        inner.raw_log.push_back(entry.clone());
        self.bus.publish(TelemetryEvent::Raw(entry));
    }

    /// Replace the live reading as a whole record and emit a live frame.
    pub async fn apply_live(&self, reading: LiveReading) {
        let mut inner = self.inner.write().await;
        inner.live = reading;
        let frame = LiveFrame {
            reading,
            timestamp: live_timestamp(),
            connected: inner.connected,
        };
        self.bus.publish(TelemetryEvent::Live(frame));
    }

    /// Apply one peak observation under the running-maximum rule.
    ///
    /// A new value is accepted when it is strictly greater than the stored
    /// peak, or when the stored peak is still the 0.0 sentinel. The sentinel
    /// arm means a first observation of exactly 0 is accepted (and keeps
    /// being accepted until a nonzero peak lands); downstream consumers rely
    /// on getting an event for the very first sample.
    ///
    /// Returns whether the observation was accepted.
    pub async fn apply_peak(&self, update: PeakUpdate) -> bool {
        let mut inner = self.inner.write().await;
        let accepted = {
            let record = inner.peaks.entry(update.metric).or_default();
            let accepted = update.value > record.value || record.value == 0.0;
            if accepted {
                record.value = update.value;
                record.device_ts = update.device_ts.clone();
            }
            accepted
        };
        if !accepted {
            return false;
        }

        let event = PeakEvent::now(update.metric, update.value);
        if inner.peak_events.len() >= self.peak_capacity {
            inner.peak_events.pop_front();
        }
        inner.peak_events.push_back(event.clone());
        self.bus.publish(TelemetryEvent::Peak(event));
        true
    }

    /// Update the connectivity flag and notify observers.
    pub async fn set_connected(&self, connected: bool) {
        let mut inner = self.inner.write().await;
        inner.connected = connected;
        self.bus.publish(TelemetryEvent::Status { connected });
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Current connectivity flag.
    pub async fn connected(&self) -> bool {
        self.inner.read().await.connected
    }

    /// Current live reading as an observer-facing frame with a fresh
    /// server timestamp.
    pub async fn live_frame(&self) -> LiveFrame {
        let inner = self.inner.read().await;
        LiveFrame {
            reading: inner.live,
            timestamp: live_timestamp(),
            connected: inner.connected,
        }
    }

    /// Current peak record for one metric.
    pub async fn peak(&self, metric: PeakMetric) -> PeakRecord {
        let inner = self.inner.read().await;
        inner.peaks.get(&metric).cloned().unwrap_or_default()
    }

    /// The full bounded peak-event log, newest first.
    pub async fn peak_events(&self) -> Vec<PeakEvent> {
        let inner = self.inner.read().await;
        inner.peak_events.iter().rev().cloned().collect()
    }

    /// The full bounded raw log in stored (oldest-first) order.
    pub async fn raw_entries(&self) -> Vec<RawEntry> {
        let inner = self.inner.read().await;
        inner.raw_log.iter().cloned().collect()
    }

    /// Consistent point-in-time view for an observer-connect handshake,
    /// with both logs capped to `limit` entries.
    pub async fn snapshot(&self, limit: usize) -> StoreSnapshot {
        let inner = self.inner.read().await;
        let raw_skip = inner.raw_log.len().saturating_sub(limit);
        StoreSnapshot {
            connected: inner.connected,
            live: LiveFrame {
                reading: inner.live,
                timestamp: live_timestamp(),
                connected: inner.connected,
            },
            peak_events: inner.peak_events.iter().rev().take(limit).cloned().collect(),
            raw_entries: inner.raw_log.iter().skip(raw_skip).cloned().collect(),
        }
    }
}
