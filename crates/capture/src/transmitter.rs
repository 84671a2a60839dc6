//! Batch delivery with bounded retries and exponential backoff.
//!
//! The transmitter performs no persistence of its own: failure handling is
//! entirely the buffer's responsibility, keeping the two cleanly separated.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use telemetry_core::{Error, EventBatch, Result, TelemetryEvent};

use crate::config::CaptureConfig;

/// Delivery seam: the HTTP transport in production, a mock in tests.
#[async_trait]
pub trait BatchTransport: Send + Sync {
    async fn deliver(&self, batch: &EventBatch) -> Result<()>;
}

/// HTTP transport posting batches to the ingestion endpoint.
///
/// The per-attempt timeout is enforced by the client: a timed-out request is
/// aborted, but already-scheduled retry sleeps proceed independently.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl BatchTransport for HttpTransport {
    async fn deliver(&self, batch: &EventBatch) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(batch)
            .send()
            .await
            .map_err(|e| Error::transport(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::transport(format!(
                "server returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Wraps events into a batch envelope and delivers it with retries.
pub struct Transmitter {
    transport: Arc<dyn BatchTransport>,
    max_retries: u32,
    retry_delay_ms: u64,
    backoff_multiplier: f64,
}

impl Transmitter {
    pub fn new(transport: Arc<dyn BatchTransport>, config: &CaptureConfig) -> Self {
        Self {
            transport,
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
            backoff_multiplier: config.backoff_multiplier,
        }
    }

    /// Attempts delivery; `false` only after all attempts are exhausted.
    /// The caller re-queues on failure.
    pub async fn send(&self, events: &[TelemetryEvent]) -> bool {
        if events.is_empty() {
            return true;
        }

        // Retries reuse the same envelope, so the batch ID is stable across
        // attempts and the server can spot duplicated deliveries.
        let batch = EventBatch::new(events.to_vec());

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay_ms =
                    self.retry_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32 - 1);
                tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
            }

            match self.transport.deliver(&batch).await {
                Ok(()) => {
                    debug!(
                        batch_id = %batch.batch_id,
                        events = batch.len(),
                        attempt = attempt + 1,
                        "batch delivered"
                    );
                    return true;
                }
                Err(e) => {
                    warn!(
                        batch_id = %batch.batch_id,
                        attempt = attempt + 1,
                        error = %e,
                        "batch delivery failed"
                    );
                }
            }
        }

        false
    }
}
