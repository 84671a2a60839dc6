//! Session reconstruction from arriving event batches.
//!
//! Batch arrival order is NOT guaranteed: batches may be delayed, duplicated
//! by client retries, or interleaved across tabs sharing one session id.
//! Ingestion appends to per-session accumulators with event-id dedup; the
//! materialized view is re-sorted by sequence number on every read, so
//! reconstruction is correct regardless of arrival order.

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use telemetry::metrics;
use telemetry_core::{
    EventBatch, EventCategory, EventKind, EventPayload, SessionSummary, TelemetryEvent,
};

/// Result of ingesting one batch.
#[derive(Debug, Clone, Copy)]
pub struct IngestStats {
    /// Events present in the batch
    pub received: usize,
    /// Events newly added (not previously seen)
    pub processed: usize,
}

#[derive(Default)]
struct SessionAccumulator {
    events: Vec<TelemetryEvent>,
    seen: HashSet<Uuid>,
    last_ingest_at: Option<DateTime<Utc>>,
    timed_out: bool,
}

/// Accumulates batches into per-session ordered timelines.
///
/// Concurrency: an outer read/write lock over the session map with a
/// per-session mutex region, so batches for the same session id arriving
/// from concurrent requests serialize per session while distinct sessions
/// proceed fully in parallel. Reads are copy-on-read snapshots.
#[derive(Default)]
pub struct SessionReconstructor {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionAccumulator>>>>,
}

impl SessionReconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a batch's events to their session accumulators.
    ///
    /// Duplicated events (client retries) are ignored by event id; a retried
    /// batch never double-counts. O(1) amortized per event.
    pub fn ingest(&self, batch: &EventBatch) -> IngestStats {
        let received = batch.events.len();
        let mut processed = 0;
        let now = Utc::now();

        for event in &batch.events {
            let accumulator = self.accumulator_for(&event.session_id);
            let mut acc = accumulator.lock();
            acc.last_ingest_at = Some(now);
            if acc.seen.insert(event.event_id) {
                acc.events.push(event.clone());
                processed += 1;
            } else {
                metrics().events_duplicate.inc();
            }
        }

        debug!(
            batch_id = %batch.batch_id,
            received = received,
            processed = processed,
            "batch ingested"
        );

        IngestStats {
            received,
            processed,
        }
    }

    /// Materializes a copy-on-read snapshot of a session, sorted by
    /// sequence number. Returns `None` for unknown sessions.
    pub fn session(&self, session_id: &str) -> Option<ReconstructedSession> {
        let accumulator = {
            let sessions = self.sessions.read();
            sessions.get(session_id).cloned()
        }?;

        let (mut events, timed_out) = {
            let acc = accumulator.lock();
            (acc.events.clone(), acc.timed_out)
        };
        events.sort_by_key(|e| e.sequence_number);

        Some(ReconstructedSession {
            session_id: session_id.to_string(),
            events,
            timed_out,
        })
    }

    /// Returns ids of all tracked sessions.
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Total distinct events across all sessions.
    pub fn event_count(&self) -> usize {
        let sessions = self.sessions.read();
        sessions.values().map(|acc| acc.lock().seen.len()).sum()
    }

    /// Marks sessions with no ingest activity for `idle` as timed out.
    /// Returns the number newly marked.
    pub fn mark_timed_out(&self, idle: Duration) -> usize {
        let cutoff = Utc::now() - idle;
        let sessions = self.sessions.read();
        let mut marked = 0;
        for accumulator in sessions.values() {
            let mut acc = accumulator.lock();
            if !acc.timed_out
                && acc.last_ingest_at.map(|at| at < cutoff).unwrap_or(false)
            {
                acc.timed_out = true;
                marked += 1;
            }
        }
        marked
    }

    /// Evicts sessions with no ingest activity past the horizon.
    /// Returns the number evicted.
    pub fn evict_idle(&self, horizon: Duration) -> usize {
        let cutoff = Utc::now() - horizon;
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, accumulator| {
            let acc = accumulator.lock();
            acc.last_ingest_at.map(|at| at >= cutoff).unwrap_or(true)
        });
        before - sessions.len()
    }

    fn accumulator_for(&self, session_id: &str) -> Arc<Mutex<SessionAccumulator>> {
        {
            let sessions = self.sessions.read();
            if let Some(existing) = sessions.get(session_id) {
                return existing.clone();
            }
        }
        self.sessions
            .write()
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }
}

/// A consistent snapshot of one session's ordered, deduplicated timeline.
///
/// Derived metrics are computed on read, not eagerly maintained. Unless
/// [`has_ended`](Self::has_ended) or [`timed_out`](Self::timed_out) holds,
/// this is a snapshot of a possibly still-open session.
#[derive(Debug, Clone)]
pub struct ReconstructedSession {
    pub session_id: String,
    /// Deduplicated by event id, sorted by sequence number
    pub events: Vec<TelemetryEvent>,
    /// Set by the retention worker once the idle timeout elapses
    pub timed_out: bool,
}

impl ReconstructedSession {
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.events.first().map(|e| e.timestamp)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.events.last().map(|e| e.timestamp)
    }

    /// Last timestamp minus first, in milliseconds.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.start_time(), self.end_time()) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }

    /// Whether a session.end event has been observed.
    pub fn has_ended(&self) -> bool {
        self.events
            .iter()
            .any(|e| e.kind() == EventKind::SessionEnd)
    }

    pub fn events_of_kind(&self, kind: EventKind) -> impl Iterator<Item = &TelemetryEvent> {
        self.events.iter().filter(move |e| e.kind() == kind)
    }

    /// Count of view transitions.
    pub fn page_views(&self) -> usize {
        self.events_of_kind(EventKind::ViewTransition).count()
    }

    /// Count of interaction-category events.
    pub fn interactions(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.category() == EventCategory::Interaction)
            .count()
    }

    /// Count of friction-indicator events.
    pub fn friction_events(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.category() == EventCategory::Friction)
            .count()
    }

    /// Ordered list of view.transition targets.
    pub fn navigation_path(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match &e.payload {
                EventPayload::ViewTransition(data) => Some(data.to.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            start_time: self.start_time().unwrap_or_else(Utc::now),
            end_time: self.end_time(),
            duration_ms: self.duration_ms(),
            event_count: self.events.len(),
            page_views: self.page_views(),
            interactions: self.interactions(),
            friction_events: self.friction_events(),
            has_ended: self.has_ended(),
        }
    }
}
