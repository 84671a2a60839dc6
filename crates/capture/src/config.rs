//! Capture SDK configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the capture pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Batch ingestion endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Queue size that triggers an automatic flush
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Periodic flush interval in milliseconds
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// Additional delivery attempts after the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base retry delay in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Exponential backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Per-attempt request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Snapshot the buffer to durable storage after every add
    #[serde(default = "default_persist_buffer")]
    pub persist_buffer: bool,
    /// Serialized-buffer byte cap; exceeding it evicts the oldest half
    #[serde(default = "default_max_storage_bytes")]
    pub max_storage_bytes: usize,
    /// Drop user agent and whole URL query strings
    #[serde(default)]
    pub strict_privacy: bool,
}

fn default_endpoint() -> String {
    "http://localhost:8080/events/batch".to_string()
}

fn default_max_batch_size() -> usize {
    50
}

fn default_flush_interval_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_persist_buffer() -> bool {
    true
}

fn default_max_storage_bytes() -> usize {
    256 * 1024
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            max_batch_size: default_max_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            request_timeout_ms: default_request_timeout_ms(),
            persist_buffer: default_persist_buffer(),
            max_storage_bytes: default_max_storage_bytes(),
            strict_privacy: false,
        }
    }
}
