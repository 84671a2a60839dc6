//! Event batch envelope, the unit of transmission and server-side validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::event::{TelemetryEvent, SCHEMA_VERSION};

/// A batch of events sent from the client in one request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventBatch {
    #[validate(length(min = 1, max = 16))]
    pub schema_version: String,
    /// Unique per flush; retried deliveries reuse the same ID
    pub batch_id: Uuid,
    /// Batch creation time
    pub timestamp: DateTime<Utc>,
    /// Ordered events, FIFO from the buffer
    #[validate(length(min = 1, max = 1000))]
    pub events: Vec<TelemetryEvent>,
}

impl EventBatch {
    /// Creates a new batch envelope around a flush's events.
    pub fn new(events: Vec<TelemetryEvent>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            batch_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            events,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
