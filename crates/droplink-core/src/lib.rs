//! Droplink Core
//!
//! Foundational types and logic for the Droplink sensor bridge: the device
//! protocol decoder, the in-memory telemetry store with its bounded event
//! logs, the observer event bus, and the durable drop-sink seam.
//!
//! Everything in this crate is transport-agnostic. The BLE link lives in
//! `droplink-ble` and the REST/WebSocket surface in `droplink-server`; both
//! depend on this crate and nothing here depends on them.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod broadcast;
pub mod protocol;
pub mod sink;
pub mod store;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use broadcast::{EventBus, TelemetryEvent};
pub use protocol::{decode_line, DeviceMessage};
pub use sink::{DropSink, SinkError};
pub use store::{
    StoreSnapshot, TelemetryStore, ATTACH_BATCH_LIMIT, PEAK_EVENT_CAPACITY, RAW_LOG_CAPACITY,
};
pub use types::{
    live_timestamp, server_timestamp, DropRecord, DropReport, LinkState, LiveFrame, LiveReading,
    PeakEvent, PeakMetric, PeakRecord, PeakUpdate, RawEntry,
};
