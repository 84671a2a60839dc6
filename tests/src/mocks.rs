//! Mock implementations for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use capture::BatchTransport;
use insight::SessionReconstructor;
use telemetry_core::{Error, EventBatch, Result, TelemetryEvent};

/// Mock transport that captures batches in memory.
///
/// Implements the same `BatchTransport` trait as the real HTTP transport, so
/// client-side tests exercise every production code path except the network.
#[derive(Default)]
pub struct MockTransport {
    batches: Mutex<Vec<EventBatch>>,
    failures_remaining: Mutex<u32>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the first `n` delivery attempts, then succeeds.
    pub fn with_failures(n: u32) -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            failures_remaining: Mutex::new(n),
        }
    }

    /// All captured batches.
    pub fn captured_batches(&self) -> Vec<EventBatch> {
        self.batches.lock().clone()
    }

    /// All captured events, flattened in delivery order.
    pub fn captured_events(&self) -> Vec<TelemetryEvent> {
        self.batches
            .lock()
            .iter()
            .flat_map(|b| b.events.clone())
            .collect()
    }
}

#[async_trait]
impl BatchTransport for MockTransport {
    async fn deliver(&self, batch: &EventBatch) -> Result<()> {
        {
            let mut failures = self.failures_remaining.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(Error::transport("mock transport failure"));
            }
        }
        self.batches.lock().push(batch.clone());
        Ok(())
    }
}

/// Transport that delivers straight into a session reconstructor, standing in
/// for the server side of the pipe. Scripted failures simulate an unreachable
/// backend.
pub struct IngestTransport {
    reconstructor: Arc<SessionReconstructor>,
    failures_remaining: Mutex<u32>,
}

impl IngestTransport {
    pub fn new(reconstructor: Arc<SessionReconstructor>) -> Self {
        Self::with_failures(reconstructor, 0)
    }

    pub fn with_failures(reconstructor: Arc<SessionReconstructor>, n: u32) -> Self {
        Self {
            reconstructor,
            failures_remaining: Mutex::new(n),
        }
    }
}

#[async_trait]
impl BatchTransport for IngestTransport {
    async fn deliver(&self, batch: &EventBatch) -> Result<()> {
        {
            let mut failures = self.failures_remaining.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(Error::transport("backend unreachable"));
            }
        }
        self.reconstructor.ingest(batch);
        Ok(())
    }
}
