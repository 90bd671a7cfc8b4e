//! Link manager lifecycle tests against a scripted in-process transport.
//!
//! These exercise the reconnect machine end-to-end (handshake, subscribe,
//! ingest, disconnect, cooldown, retry) without any radio, by scripting
//! what each `open` attempt does.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use droplink_core::{
    DropRecord, DropSink, EventBus, PeakMetric, SinkError, TelemetryEvent, TelemetryStore,
};

use droplink_ble::{
    DeviceSession, DeviceTransport, LinkConfig, LinkError, LinkManager, NotificationStream,
};

// ----------------------------------------------------------------------------
// Scripted Transport
// ----------------------------------------------------------------------------

enum SessionScript {
    /// This open attempt fails at the transport level.
    Fail,
    /// This open attempt succeeds and the session yields these lines. With
    /// `hold_open` the stream then stays pending; otherwise it ends,
    /// simulating a mid-session device loss.
    Lines {
        lines: Vec<&'static str>,
        hold_open: bool,
    },
}

struct ScriptedTransport {
    script: Mutex<VecDeque<SessionScript>>,
    opens: AtomicUsize,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ScriptedTransport {
    fn new(script: Vec<SessionScript>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            opens: AtomicUsize::new(0),
            writes: Arc::new(Mutex::new(Vec::new())),
        })
    }

    fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceTransport for ScriptedTransport {
    async fn open(&self) -> Result<Box<dyn DeviceSession>, LinkError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front();
        match step {
            // An exhausted script keeps failing, which just parks the
            // manager in its cooldown loop.
            None | Some(SessionScript::Fail) => {
                Err(LinkError::ConnectionFailed("scripted failure".to_string()))
            }
            Some(SessionScript::Lines { lines, hold_open }) => {
                let (tx, rx) = mpsc::unbounded_channel();
                for line in lines {
                    tx.send(line.as_bytes().to_vec()).unwrap();
                }
                Ok(Box::new(ScriptedSession {
                    rx: Some(rx),
                    _hold: hold_open.then_some(tx),
                    writes: self.writes.clone(),
                }))
            }
        }
    }
}

struct ScriptedSession {
    rx: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
    _hold: Option<mpsc::UnboundedSender<Vec<u8>>>,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

#[async_trait]
impl DeviceSession for ScriptedSession {
    async fn write(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        self.writes.lock().unwrap().push(payload.to_vec());
        Ok(())
    }

    async fn subscribe(&mut self) -> Result<NotificationStream, LinkError> {
        let rx = self.rx.take().expect("subscribed twice");
        Ok(Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|payload| (payload, rx))
        })))
    }

    async fn is_alive(&self) -> bool {
        true
    }

    async fn close(&mut self) {}
}

// ----------------------------------------------------------------------------
// Test Utilities
// ----------------------------------------------------------------------------

struct CollectingSink {
    records: Mutex<Vec<DropRecord>>,
}

impl CollectingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
        })
    }
}

impl DropSink for CollectingSink {
    fn append(&self, record: &DropRecord) -> Result<(), SinkError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

fn test_config() -> LinkConfig {
    LinkConfig::new()
        .with_retry_cooldown(Duration::from_millis(5))
        .with_liveness_interval(Duration::from_millis(50))
}

fn spawn_manager(
    transport: Arc<ScriptedTransport>,
    store: Arc<TelemetryStore>,
    sink: Arc<dyn DropSink>,
) -> tokio::task::JoinHandle<()> {
    let mut manager = LinkManager::new(test_config(), transport, store, sink);
    tokio::spawn(async move { manager.run().await })
}

async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if condition().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

// ----------------------------------------------------------------------------
// Lifecycle Tests
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_reconnects_until_a_transient_failure_clears() {
    let transport = ScriptedTransport::new(vec![
        SessionScript::Fail,
        SessionScript::Fail,
        SessionScript::Fail,
        SessionScript::Lines {
            lines: vec!["LIVE,T=21.5,H=40,R=0,P=0,Y=0,G=1.02,L=60,F=10"],
            hold_open: true,
        },
    ]);
    let store = Arc::new(TelemetryStore::new(EventBus::default()));
    let handle = spawn_manager(transport.clone(), store.clone(), CollectingSink::new());

    // Three failed attempts must not stop the manager from reaching
    // Connected on the fourth.
    wait_until(|| {
        let store = store.clone();
        async move { store.connected().await }
    })
    .await;
    assert_eq!(transport.opens(), 4);

    wait_until(|| {
        let store = store.clone();
        async move { store.live_frame().await.reading.temp == 21.5 }
    })
    .await;

    // The handshake was written before the subscription on the session
    // that succeeded.
    let writes = transport.writes.lock().unwrap().clone();
    assert_eq!(writes.len(), 1);
    assert!(writes[0].starts_with(b"TIME="));

    handle.abort();
}

#[tokio::test]
async fn test_session_loss_emits_status_change_and_recovers() {
    let transport = ScriptedTransport::new(vec![
        SessionScript::Lines {
            lines: vec!["LIVE,T=1"],
            hold_open: false,
        },
        SessionScript::Lines {
            lines: vec![],
            hold_open: true,
        },
    ]);
    let bus = EventBus::default();
    let mut events = bus.subscribe();
    let store = Arc::new(TelemetryStore::new(bus));
    let handle = spawn_manager(transport.clone(), store.clone(), CollectingSink::new());

    // Connectivity must go up, down when the stream ends, and up again on
    // the next session, in that order.
    let mut statuses = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while statuses != [true, false, true] {
            if let TelemetryEvent::Status { connected } = events.recv().await.unwrap() {
                statuses.push(connected);
            }
        }
    })
    .await
    .expect("status sequence not observed");

    assert_eq!(transport.opens(), 2);
    handle.abort();
}

#[tokio::test]
async fn test_drop_message_reaches_the_sink_once() {
    let transport = ScriptedTransport::new(vec![SessionScript::Lines {
        lines: vec!["DROP,TIME=100,INT=5,PG=3.0,H=1.2,L=55,F=8"],
        hold_open: true,
    }]);
    let store = Arc::new(TelemetryStore::new(EventBus::default()));
    let sink = CollectingSink::new();
    let handle = spawn_manager(transport, store.clone(), sink.clone());

    wait_until(|| {
        let sink = sink.clone();
        async move { !sink.records.lock().unwrap().is_empty() }
    })
    .await;

    let records = sink.records.lock().unwrap().clone();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].device_time, "100");
    assert_eq!(records[0].intensity, "5");
    assert_eq!(records[0].peak_g, "3.0");
    assert!(!records[0].pc_time.is_empty());

    // A drop mutates neither live nor peak state.
    assert_eq!(store.live_frame().await.reading.temp, 0.0);
    assert_eq!(store.peak(PeakMetric::G).await.value, 0.0);
    assert_eq!(store.raw_entries().await.len(), 1);

    handle.abort();
}

#[tokio::test]
async fn test_messages_are_ingested_in_arrival_order() {
    let transport = ScriptedTransport::new(vec![SessionScript::Lines {
        lines: vec![
            "PEAKS,G=2.5@12:00:01",
            "PEAKS,G=2.0@12:00:05",
            "PEAKS,G=3.0@12:00:09",
        ],
        hold_open: true,
    }]);
    let store = Arc::new(TelemetryStore::new(EventBus::default()));
    let handle = spawn_manager(transport, store.clone(), CollectingSink::new());

    wait_until(|| {
        let store = store.clone();
        async move { store.raw_entries().await.len() == 3 }
    })
    .await;

    // In-order ingestion: the 2.0 observation was rejected between the two
    // accepted peaks.
    let record = store.peak(PeakMetric::G).await;
    assert_eq!(record.value, 3.0);
    assert_eq!(record.device_ts, "12:00:09");
    let events = store.peak_events().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].value, 3.0);
    assert_eq!(events[1].value, 2.5);

    handle.abort();
}
