//! Capture runtime.
//!
//! An explicit instance object — no global singleton. Commands are submitted
//! to one background task over an mpsc channel and processed strictly in
//! submission order, so all buffer mutations happen on a single task and a
//! flush always runs to exhaustion before the next one can start. Observers
//! hold [`Subscription`] handles that unregister on drop.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use telemetry_core::{EventKind, TelemetryEvent};

use crate::buffer::EventBuffer;
use crate::collector::{ClientEnvironment, EventCollector};
use crate::config::CaptureConfig;
use crate::privacy::{PrivacyConfig, PrivacyFilter};
use crate::storage::{BufferStore, OPT_OUT_KEY};
use crate::transmitter::{BatchTransport, HttpTransport, Transmitter};

type ObserverFn = Box<dyn Fn(&TelemetryEvent) + Send + Sync>;

/// Observer registry shared between the tracker handle and subscriptions.
#[derive(Default)]
struct ObserverRegistry {
    next_id: AtomicU64,
    observers: Mutex<HashMap<u64, ObserverFn>>,
}

impl ObserverRegistry {
    fn register(&self, observer: ObserverFn) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers.lock().insert(id, observer);
        id
    }

    fn unregister(&self, id: u64) {
        self.observers.lock().remove(&id);
    }

    fn notify(&self, event: &TelemetryEvent) {
        for observer in self.observers.lock().values() {
            observer(event);
        }
    }
}

/// Handle returned by [`Tracker::subscribe`]; dropping it unregisters the
/// observer, so cleanup happens on every exit path.
pub struct Subscription {
    id: u64,
    registry: Weak<ObserverRegistry>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
    }
}

enum Command {
    Collect {
        kind: EventKind,
        data: Value,
    },
    Flush {
        ack: oneshot::Sender<bool>,
    },
    ResetSession,
    SetOptOut(bool),
    Shutdown {
        ack: oneshot::Sender<()>,
    },
}

/// Client-side capture pipeline: collector -> buffer -> transmitter, driven
/// by a single background task with a periodic flush timer.
pub struct Tracker {
    tx: mpsc::UnboundedSender<Command>,
    handle: Mutex<Option<JoinHandle<()>>>,
    observers: Arc<ObserverRegistry>,
}

impl Tracker {
    /// Creates a tracker with an explicit transport and optional durable
    /// store. Must be called within a tokio runtime.
    pub fn new(
        config: CaptureConfig,
        environment: ClientEnvironment,
        store: Option<Arc<dyn BufferStore>>,
        transport: Arc<dyn BatchTransport>,
    ) -> Self {
        let filter = PrivacyFilter::new(PrivacyConfig {
            strict: config.strict_privacy,
            ..PrivacyConfig::default()
        });
        let collector = EventCollector::new(environment, filter);

        let buffer_store = if config.persist_buffer { store.clone() } else { None };
        let buffer = EventBuffer::new(
            config.max_batch_size,
            config.max_storage_bytes,
            buffer_store,
        );

        let transmitter = Transmitter::new(transport, &config);
        let observers = Arc::new(ObserverRegistry::default());

        let opted_out = store
            .as_ref()
            .and_then(|s| s.get(OPT_OUT_KEY).ok().flatten())
            .map(|v| v == "true")
            .unwrap_or(false);

        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Worker {
            rx,
            collector,
            buffer,
            transmitter,
            store,
            observers: observers.clone(),
            opted_out,
            flush_interval: Duration::from_millis(config.flush_interval_ms),
        };
        let handle = tokio::spawn(worker.run());

        Self {
            tx,
            handle: Mutex::new(Some(handle)),
            observers,
        }
    }

    /// Convenience constructor wiring the HTTP transport from the config.
    pub fn with_http(
        config: CaptureConfig,
        environment: ClientEnvironment,
        store: Option<Arc<dyn BufferStore>>,
    ) -> telemetry_core::Result<Self> {
        let transport = Arc::new(HttpTransport::new(
            config.endpoint.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )?);
        Ok(Self::new(config, environment, store, transport))
    }

    /// Submits an interaction for collection. Non-blocking; the event is
    /// enriched, filtered, and buffered on the background task.
    pub fn track(&self, kind: EventKind, data: Value) {
        let _ = self.tx.send(Command::Collect { kind, data });
    }

    /// Forces a flush and waits for its outcome. Commands are processed in
    /// submission order, so all previously tracked events are included.
    pub async fn flush(&self) -> bool {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush { ack }).is_err() {
            return false;
        }
        done.await.unwrap_or(false)
    }

    /// Starts a fresh session: new session id, sequence counter reset.
    pub fn reset_session(&self) {
        let _ = self.tx.send(Command::ResetSession);
    }

    /// Sets and persists the opt-out flag. While opted out, tracked events
    /// are dropped at the door.
    pub fn set_opt_out(&self, opted_out: bool) {
        let _ = self.tx.send(Command::SetOptOut(opted_out));
    }

    /// Registers an observer called for every successfully collected event.
    pub fn subscribe(
        &self,
        observer: impl Fn(&TelemetryEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.observers.register(Box::new(observer));
        Subscription {
            id,
            registry: Arc::downgrade(&self.observers),
        }
    }

    /// Flushes remaining events and stops the background task.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Shutdown { ack }).is_ok() {
            let _ = done.await;
        }
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

struct Worker {
    rx: mpsc::UnboundedReceiver<Command>,
    collector: EventCollector,
    buffer: EventBuffer,
    transmitter: Transmitter,
    store: Option<Arc<dyn BufferStore>>,
    observers: Arc<ObserverRegistry>,
    opted_out: bool,
    flush_interval: Duration,
}

impl Worker {
    async fn run(mut self) {
        let start = tokio::time::Instant::now() + self.flush_interval;
        let mut ticker = tokio::time::interval_at(start, self.flush_interval);

        loop {
            tokio::select! {
                command = self.rx.recv() => {
                    match command {
                        Some(Command::Collect { kind, data }) => self.collect(kind, data).await,
                        Some(Command::Flush { ack }) => {
                            let delivered = self.flush().await;
                            let _ = ack.send(delivered);
                        }
                        Some(Command::ResetSession) => self.collector.reset_session(),
                        Some(Command::SetOptOut(opted_out)) => self.set_opt_out(opted_out),
                        Some(Command::Shutdown { ack }) => {
                            self.flush().await;
                            let _ = ack.send(());
                            return;
                        }
                        None => {
                            // All handles dropped: final best-effort flush.
                            self.flush().await;
                            return;
                        }
                    }
                }
                _ = ticker.tick() => {
                    self.flush().await;
                }
            }
        }
    }

    async fn collect(&mut self, kind: EventKind, data: Value) {
        if self.opted_out {
            return;
        }
        if let Some(event) = self.collector.collect(kind, data) {
            self.observers.notify(&event);
            if self.buffer.add(event) {
                self.flush().await;
            }
        }
    }

    async fn flush(&mut self) -> bool {
        let events = self.buffer.begin_flush();
        if events.is_empty() {
            return true;
        }

        let delivered = self.transmitter.send(&events).await;
        if delivered {
            debug!(count = events.len(), "flush delivered");
            self.buffer.finish_flush();
        } else {
            debug!(count = events.len(), "flush failed, re-queueing");
            self.buffer.restore(events);
        }
        delivered
    }

    fn set_opt_out(&mut self, opted_out: bool) {
        self.opted_out = opted_out;
        if let Some(store) = &self.store {
            let value = if opted_out { "true" } else { "false" };
            if let Err(e) = store.put(OPT_OUT_KEY, value) {
                warn!(error = %e, "failed to persist opt-out flag");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use telemetry_core::{Error, EventBatch, Result};

    #[derive(Default)]
    struct RecordingTransport {
        batches: Mutex<Vec<EventBatch>>,
        fail: Mutex<bool>,
    }

    #[async_trait]
    impl BatchTransport for RecordingTransport {
        async fn deliver(&self, batch: &EventBatch) -> Result<()> {
            if *self.fail.lock() {
                return Err(Error::transport("injected failure"));
            }
            self.batches.lock().push(batch.clone());
            Ok(())
        }
    }

    fn config() -> CaptureConfig {
        CaptureConfig {
            max_batch_size: 50,
            flush_interval_ms: 3_600_000,
            retry_delay_ms: 1,
            ..CaptureConfig::default()
        }
    }

    #[tokio::test]
    async fn size_threshold_flushes_automatically() {
        let transport = Arc::new(RecordingTransport::default());
        let tracker = Tracker::new(
            CaptureConfig {
                max_batch_size: 2,
                ..config()
            },
            ClientEnvironment::default(),
            None,
            transport.clone(),
        );

        tracker.track(EventKind::SessionStart, json!({}));
        tracker.track(EventKind::ActionClick, json!({ "target": "a.nav" }));
        tracker.track(EventKind::ActionClick, json!({ "target": "a.nav" }));
        // Barrier: all prior commands have been processed after this ack.
        tracker.flush().await;

        let batches = transport.batches.lock().clone();
        assert_eq!(batches.len(), 2);
        // Exactly one automatic flush after the 2nd event, one forced with the rest.
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1].len(), 1);
        tracker.shutdown().await;
    }

    #[tokio::test]
    async fn failed_flush_requeues_then_delivers_in_order() {
        let transport = Arc::new(RecordingTransport::default());
        let tracker = Tracker::new(
            CaptureConfig {
                max_retries: 0,
                ..config()
            },
            ClientEnvironment::default(),
            None,
            transport.clone(),
        );

        *transport.fail.lock() = true;
        tracker.track(EventKind::SessionStart, json!({}));
        tracker.track(EventKind::ActionClick, json!({}));
        assert!(!tracker.flush().await);

        *transport.fail.lock() = false;
        tracker.track(EventKind::SessionEnd, json!({}));
        assert!(tracker.flush().await);

        let batches = transport.batches.lock().clone();
        assert_eq!(batches.len(), 1);
        let seqs: Vec<u64> = batches[0].events.iter().map(|e| e.sequence_number).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        tracker.shutdown().await;
    }

    #[tokio::test]
    async fn opt_out_drops_events_and_persists_flag() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport::default());
        let tracker = Tracker::new(
            config(),
            ClientEnvironment::default(),
            Some(store.clone()),
            transport.clone(),
        );

        tracker.set_opt_out(true);
        tracker.track(EventKind::SessionStart, json!({}));
        tracker.flush().await;

        assert!(transport.batches.lock().is_empty());
        assert_eq!(store.get(OPT_OUT_KEY).unwrap().as_deref(), Some("true"));
        tracker.shutdown().await;
    }

    #[tokio::test]
    async fn subscription_drop_unregisters_observer() {
        let transport = Arc::new(RecordingTransport::default());
        let tracker = Tracker::new(
            config(),
            ClientEnvironment::default(),
            None,
            transport.clone(),
        );

        let seen = Arc::new(Mutex::new(0usize));
        let seen_clone = seen.clone();
        let subscription = tracker.subscribe(move |_| {
            *seen_clone.lock() += 1;
        });

        tracker.track(EventKind::SessionStart, json!({}));
        tracker.flush().await;
        assert_eq!(*seen.lock(), 1);

        drop(subscription);
        tracker.track(EventKind::ActionClick, json!({}));
        tracker.flush().await;
        assert_eq!(*seen.lock(), 1);
        tracker.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_flushes_remaining_events() {
        let transport = Arc::new(RecordingTransport::default());
        let tracker = Tracker::new(
            config(),
            ClientEnvironment::default(),
            None,
            transport.clone(),
        );

        tracker.track(EventKind::SessionStart, json!({}));
        tracker.shutdown().await;

        let batches = transport.batches.lock().clone();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
    }
}
