//! Observer event bus
//!
//! Fan-out of state-store mutations to observers over a
//! `tokio::sync::broadcast` channel. Publishing never blocks and never
//! fails: with no observers attached the event is simply dropped, and a
//! slow observer lags on its own receiver without delaying the producer or
//! the other observers.

use tokio::sync::broadcast;

use crate::types::{LiveFrame, PeakEvent, RawEntry};

/// Capacity of the broadcast channel backing the bus. A receiver further
/// behind than this loses its backlog (delivery is at-least-once,
/// best-effort).
pub const DEFAULT_BUS_CAPACITY: usize = 256;

// ----------------------------------------------------------------------------
// Events
// ----------------------------------------------------------------------------

/// One state-store mutation as observers see it.
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    /// Device connectivity changed.
    Status { connected: bool },
    /// The live reading was replaced.
    Live(LiveFrame),
    /// A new peak was accepted and appended to the peak-event log.
    Peak(PeakEvent),
    /// A raw message was appended to the raw log.
    Raw(RawEntry),
}

// ----------------------------------------------------------------------------
// Event Bus
// ----------------------------------------------------------------------------

/// Cloneable handle to the broadcast channel shared by the store (producer)
/// and every observer connection (consumers).
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TelemetryEvent>,
}

impl EventBus {
    /// Create a bus with the given channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        EventBus { tx }
    }

    /// Publish an event to all currently attached observers.
    pub fn publish(&self, event: TelemetryEvent) {
        // send only errors when there are no receivers, which is fine.
        let _ = self.tx.send(event);
    }

    /// Attach a new observer.
    pub fn subscribe(&self) -> broadcast::Receiver<TelemetryEvent> {
        self.tx.subscribe()
    }

    /// Number of currently attached observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }
}
