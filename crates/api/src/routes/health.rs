//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};

use crate::response::HealthResponse;
use crate::state::AppState;

/// GET /health - service status plus store totals.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: state.reconstructor.session_count(),
        events: state.reconstructor.event_count(),
    })
}

/// GET /health/ready - readiness probe. The pipeline has no external
/// dependencies to wait on, so ready once serving.
pub async fn ready_handler() -> StatusCode {
    StatusCode::OK
}

/// GET /health/live - liveness probe.
pub async fn live_handler() -> StatusCode {
    StatusCode::OK
}
