//! FIFO event buffer with durable snapshotting.
//!
//! The buffer owns queueing and failure recovery; delivery itself is the
//! transmitter's job. State machine: `Idle -> Accumulating` on first add,
//! `Accumulating -> Flushing` when a trigger fires, `Flushing -> Idle` on
//! success, `Flushing -> Accumulating` on failure (events re-prepended in
//! original order).

use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

use telemetry_core::TelemetryEvent;

use crate::storage::{BufferStore, BUFFER_STORAGE_KEY};

/// Buffer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Idle,
    Accumulating,
    Flushing,
}

/// FIFO queue of enriched events with snapshot-after-add persistence.
pub struct EventBuffer {
    queue: VecDeque<TelemetryEvent>,
    state: BufferState,
    store: Option<Arc<dyn BufferStore>>,
    max_batch_size: usize,
    max_storage_bytes: usize,
}

impl EventBuffer {
    /// Creates a buffer, reloading any previously persisted queue so a
    /// restart never silently drops buffered-but-unsent events.
    pub fn new(
        max_batch_size: usize,
        max_storage_bytes: usize,
        store: Option<Arc<dyn BufferStore>>,
    ) -> Self {
        let mut buffer = Self {
            queue: VecDeque::new(),
            state: BufferState::Idle,
            store,
            max_batch_size,
            max_storage_bytes,
        };
        buffer.reload();
        buffer
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    /// Appends an event and snapshots the queue. Returns `true` when the
    /// size threshold is reached and the caller should flush.
    pub fn add(&mut self, event: TelemetryEvent) -> bool {
        self.queue.push_back(event);
        if self.state == BufferState::Idle {
            self.state = BufferState::Accumulating;
        }
        self.persist();
        self.queue.len() >= self.max_batch_size
    }

    /// Takes the whole queue for a flush attempt. Empty queue is a no-op
    /// and the state is unchanged.
    pub fn begin_flush(&mut self) -> Vec<TelemetryEvent> {
        if self.queue.is_empty() {
            return Vec::new();
        }
        self.state = BufferState::Flushing;
        self.queue.drain(..).collect()
    }

    /// Marks a flush as delivered.
    pub fn finish_flush(&mut self) {
        self.state = if self.queue.is_empty() {
            BufferState::Idle
        } else {
            BufferState::Accumulating
        };
        self.persist();
    }

    /// Restores undelivered events to the head of the queue, preserving
    /// their original relative order ahead of anything newer.
    pub fn restore(&mut self, events: Vec<TelemetryEvent>) {
        for event in events.into_iter().rev() {
            self.queue.push_front(event);
        }
        self.state = BufferState::Accumulating;
        self.persist();
    }

    /// Serializes the queue to the store. When the snapshot exceeds the byte
    /// cap the oldest half is discarded and serialization retried: an
    /// explicit lossy degradation, never silent corruption. Store failures
    /// are logged and the buffer continues in-memory-only for this cycle.
    fn persist(&mut self) {
        let Some(store) = self.store.clone() else {
            return;
        };

        loop {
            let snapshot: Vec<&TelemetryEvent> = self.queue.iter().collect();
            let serialized = match serde_json::to_string(&snapshot) {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, "failed to serialize buffer snapshot");
                    return;
                }
            };

            if serialized.len() > self.max_storage_bytes && !self.queue.is_empty() {
                let evicted = (self.queue.len() / 2).max(1);
                self.queue.drain(..evicted);
                warn!(
                    evicted = evicted,
                    remaining = self.queue.len(),
                    cap_bytes = self.max_storage_bytes,
                    "buffer snapshot over storage cap, evicted oldest half"
                );
                continue;
            }

            if let Err(e) = store.put(BUFFER_STORAGE_KEY, &serialized) {
                warn!(error = %e, "buffer snapshot write failed, continuing in memory");
            }
            return;
        }
    }

    fn reload(&mut self) {
        let Some(store) = self.store.clone() else {
            return;
        };

        match store.get(BUFFER_STORAGE_KEY) {
            Ok(Some(serialized)) => match serde_json::from_str::<Vec<TelemetryEvent>>(&serialized)
            {
                Ok(events) if !events.is_empty() => {
                    debug!(count = events.len(), "reloaded persisted buffer");
                    self.queue = events.into();
                    self.state = BufferState::Accumulating;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "discarding unreadable buffer snapshot");
                    let _ = store.remove(BUFFER_STORAGE_KEY);
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "failed to read persisted buffer");
            }
        }
    }
}
