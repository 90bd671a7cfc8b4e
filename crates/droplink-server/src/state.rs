//! Shared state for the HTTP surface

use std::sync::Arc;

use droplink_core::{EventBus, TelemetryStore};

use crate::droplog::CsvDropLog;

/// State handed to every REST handler and observer connection. Handlers only
/// ever read the store; all mutation flows in from the device link.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TelemetryStore>,
    pub bus: EventBus,
    pub drop_log: Arc<CsvDropLog>,
}
