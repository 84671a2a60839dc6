//! Background session retention.
//!
//! Reads never enforce the reconstruction timeout; this worker applies it in
//! the background, marking idle sessions timed out and evicting sessions
//! past the retention horizon.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::info;

use crate::reconstructor::SessionReconstructor;

/// Retention worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Sessions with no ingest activity for this long are marked timed out
    #[serde(default = "default_session_idle_timeout_ms")]
    pub session_idle_timeout_ms: u64,
    /// Sessions with no ingest activity for this long are evicted
    #[serde(default = "default_eviction_horizon_ms")]
    pub eviction_horizon_ms: u64,
    /// Sweep interval
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

fn default_session_idle_timeout_ms() -> u64 {
    30 * 60 * 1000
}

fn default_eviction_horizon_ms() -> u64 {
    24 * 60 * 60 * 1000
}

fn default_sweep_interval_ms() -> u64 {
    60 * 1000
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            session_idle_timeout_ms: default_session_idle_timeout_ms(),
            eviction_horizon_ms: default_eviction_horizon_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

/// Periodic retention sweeper over the session store.
pub struct RetentionWorker {
    config: RetentionConfig,
    reconstructor: Arc<SessionReconstructor>,
}

impl RetentionWorker {
    pub fn new(config: RetentionConfig, reconstructor: Arc<SessionReconstructor>) -> Self {
        Self {
            config,
            reconstructor,
        }
    }

    /// Starts the sweep loop.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_millis(self.config.sweep_interval_ms));
            loop {
                ticker.tick().await;
                self.sweep();
            }
        })
    }

    fn sweep(&self) {
        let idle = chrono::Duration::milliseconds(self.config.session_idle_timeout_ms as i64);
        let horizon = chrono::Duration::milliseconds(self.config.eviction_horizon_ms as i64);

        let timed_out = self.reconstructor.mark_timed_out(idle);
        let evicted = self.reconstructor.evict_idle(horizon);

        if timed_out > 0 || evicted > 0 {
            info!(
                timed_out = timed_out,
                evicted = evicted,
                sessions = self.reconstructor.session_count(),
                "retention sweep"
            );
        }
    }
}
