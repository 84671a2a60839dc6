//! Batch ingestion endpoint.

use axum::{body::Bytes, extract::State, Json};
use std::time::Instant;
use tracing::{debug, info, warn};

use telemetry::metrics;
use telemetry_core::limits::MAX_BATCH_EVENTS;
use telemetry_core::schema::{validate_batch_size, validate_event};
use telemetry_core::EventBatch;

use crate::response::{ApiError, BatchIngestResponse, IngestTotals, StatsResponse};
use crate::state::AppState;

/// POST /events/batch - primary ingestion endpoint.
///
/// Validates the batch envelope, drops invalid events (logged and counted,
/// never fatal for the rest of the batch), and feeds the survivors to the
/// session reconstructor. Duplicated deliveries are tolerated by design.
pub async fn ingest_batch_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<BatchIngestResponse>, ApiError> {
    let start = Instant::now();

    metrics().batches_received.inc();

    // Check payload size before parsing
    validate_batch_size(&body).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let batch: EventBatch = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "failed to parse event batch");
        ApiError::bad_request(format!("invalid batch: {}", e))
    })?;

    let received = batch.events.len();
    metrics().events_received.inc_by(received as u64);

    if received == 0 {
        return Err(ApiError::bad_request("batch contains no events"));
    }
    if received > MAX_BATCH_EVENTS {
        return Err(ApiError::validation(vec![format!(
            "batch has {} events, exceeds {} limit",
            received, MAX_BATCH_EVENTS
        )]));
    }

    debug!(
        batch_id = %batch.batch_id,
        events = received,
        payload_size = body.len(),
        "received event batch"
    );

    // Per-event validation: drop invalid events, keep the rest.
    let mut valid = Vec::with_capacity(received);
    let mut rejected = 0usize;
    for event in batch.events {
        match validate_event(&event) {
            Ok(()) => valid.push(event),
            Err(e) => {
                rejected += 1;
                warn!(event_id = %event.event_id, error = %e, "dropping invalid event");
            }
        }
    }

    if rejected > 0 {
        metrics().events_failed_validation.inc_by(rejected as u64);
    }
    metrics().events_validated.inc_by(valid.len() as u64);

    let sanitized = EventBatch {
        schema_version: batch.schema_version,
        batch_id: batch.batch_id,
        timestamp: batch.timestamp,
        events: valid,
    };

    let processed = if sanitized.events.is_empty() {
        0
    } else {
        state.reconstructor.ingest(&sanitized).processed
    };

    let sessions = state.reconstructor.session_count();
    let events = state.reconstructor.event_count();
    metrics().active_sessions.set(sessions as u64);

    let latency_ms = start.elapsed().as_millis() as u64;
    metrics().ingest_latency_ms.observe(latency_ms);

    info!(
        batch_id = %sanitized.batch_id,
        received = received,
        processed = processed,
        rejected = rejected,
        latency_ms = latency_ms,
        "batch processed"
    );

    Ok(Json(BatchIngestResponse {
        received,
        processed,
        stats: IngestTotals { sessions, events },
    }))
}

/// GET /events/stats - ingestion totals and a metrics snapshot.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        sessions: state.reconstructor.session_count(),
        events: state.reconstructor.event_count(),
        metrics: metrics().snapshot(),
    })
}
