//! WebSocket observer surface
//!
//! Each observer gets the attach handshake (connectivity, the current live
//! frame, then capped batches of recent peak events and raw entries) and
//! after that a live stream of incremental frames. A per-client bounded
//! queue decouples every observer from the shared broadcast receiver, so a
//! slow or dead client lags and drops its own events without touching the
//! producer or the other observers.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use droplink_core::{
    LiveFrame, PeakEvent, RawEntry, StoreSnapshot, TelemetryEvent, ATTACH_BATCH_LIMIT,
};

use crate::state::AppState;

/// Per-client outgoing queue depth. When an observer falls this far behind,
/// its broadcast receiver starts lagging and sheds events for that client.
const OUTGOING_QUEUE_DEPTH: usize = 64;

// ----------------------------------------------------------------------------
// Wire Frames
// ----------------------------------------------------------------------------

/// One frame on the observer wire, tagged by event name.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ObserverFrame {
    Status { connected: bool },
    Live(LiveFrame),
    PeakEvent(PeakEvent),
    RawData(RawEntry),
    PeakEventsBatch(Vec<PeakEvent>),
    RawDataBatch(Vec<RawEntry>),
}

impl From<TelemetryEvent> for ObserverFrame {
    fn from(event: TelemetryEvent) -> Self {
        match event {
            TelemetryEvent::Status { connected } => ObserverFrame::Status { connected },
            TelemetryEvent::Live(frame) => ObserverFrame::Live(frame),
            TelemetryEvent::Peak(event) => ObserverFrame::PeakEvent(event),
            TelemetryEvent::Raw(entry) => ObserverFrame::RawData(entry),
        }
    }
}

/// Frames pushed on attach, in handshake order. Empty batches are skipped.
pub fn attach_frames(snapshot: StoreSnapshot) -> Vec<ObserverFrame> {
    let mut frames = vec![
        ObserverFrame::Status {
            connected: snapshot.connected,
        },
        ObserverFrame::Live(snapshot.live),
    ];
    if !snapshot.peak_events.is_empty() {
        frames.push(ObserverFrame::PeakEventsBatch(snapshot.peak_events));
    }
    if !snapshot.raw_entries.is_empty() {
        frames.push(ObserverFrame::RawDataBatch(snapshot.raw_entries));
    }
    frames
}

// ----------------------------------------------------------------------------
// Connection Handling
// ----------------------------------------------------------------------------

/// WebSocket upgrade handler for `/ws`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before snapshotting so nothing published in between is
    // missed; an event may then arrive both in the snapshot and live
    // (delivery is at-least-once).
    let events = state.bus.subscribe();
    let snapshot = state.store.snapshot(ATTACH_BATCH_LIMIT).await;
    for frame in attach_frames(snapshot) {
        if send_frame(&mut sender, &frame).await.is_err() {
            return;
        }
    }
    debug!("Observer attached");

    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<Message>(OUTGOING_QUEUE_DEPTH);

    // Outgoing writer task: the only task touching the socket sink.
    let outgoing_task = tokio::spawn(async move {
        while let Some(message) = outgoing_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    // Broadcast forwarding task: bus events → this client's queue.
    let forward_task = tokio::spawn(forward_events(events, outgoing_tx));

    // Inbound traffic is ignored; this loop only detects the close.
    while let Some(Ok(message)) = receiver.next().await {
        if matches!(message, Message::Close(_)) {
            break;
        }
    }

    outgoing_task.abort();
    forward_task.abort();
    debug!("Observer detached");
}

async fn forward_events(
    mut events: broadcast::Receiver<TelemetryEvent>,
    outgoing_tx: mpsc::Sender<Message>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let frame = ObserverFrame::from(event);
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to encode observer frame: {}", e);
                        continue;
                    }
                };
                if outgoing_tx.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                // This observer fell behind; it loses `missed` events, the
                // producer and other observers are unaffected.
                warn!(missed, "Observer lagged, events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn send_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    frame: &ObserverFrame,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(frame).map_err(axum::Error::new)?;
    sender.send(Message::Text(json.into())).await
}
