//! Insight endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use telemetry::metrics;
use telemetry_core::InsightSummary;

use crate::response::ApiError;
use crate::state::AppState;

/// GET /insights/{session_id} - friction patterns, metrics, and intent
/// hypotheses for one session.
///
/// Unknown sessions are a 404. Hypotheses are empty when the inference
/// collaborator is disabled or unavailable; that is a degraded-but-valid
/// response, not an error.
pub async fn session_insights_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<InsightSummary>, ApiError> {
    let session = state
        .reconstructor
        .session(&session_id)
        .ok_or_else(|| ApiError::not_found(format!("session not found: {}", session_id)))?;

    if session.events.is_empty() {
        return Err(ApiError::not_found(format!(
            "session not found: {}",
            session_id
        )));
    }

    let cache_key = (session_id.clone(), session.events.len());
    if let Some(cached) = state.insight_cache.get(&cache_key).await {
        metrics().insight_cache_hits.inc();
        debug!(session_id = %session_id, "insight cache hit");
        return Ok(Json(cached));
    }

    let start = Instant::now();
    let insights = state.generator.generate(&session).await;
    metrics()
        .classify_latency_ms
        .observe(start.elapsed().as_millis() as u64);

    state.insight_cache.insert(cache_key, insights.clone()).await;
    metrics().insights_served.inc();

    Ok(Json(insights))
}

/// One row in the all-sessions insight listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInsightRow {
    pub session_id: String,
    pub duration_ms: Option<i64>,
    pub events: usize,
    pub friction_patterns: usize,
    pub max_severity: f64,
    pub has_ended: bool,
}

/// Response for GET /insights.
#[derive(Debug, Serialize, Deserialize)]
pub struct InsightListResponse {
    pub total_sessions: usize,
    pub sessions: Vec<SessionInsightRow>,
}

/// Sessions listed per request; analysis over every session would be
/// unbounded work on one call.
const MAX_LISTED_SESSIONS: usize = 10;

/// GET /insights - summary rows across tracked sessions.
pub async fn list_insights_handler(State(state): State<AppState>) -> Json<InsightListResponse> {
    let mut session_ids = state.reconstructor.session_ids();
    session_ids.sort();
    let total_sessions = session_ids.len();

    let mut sessions = Vec::new();
    for session_id in session_ids.into_iter().take(MAX_LISTED_SESSIONS) {
        let Some(session) = state.reconstructor.session(&session_id) else {
            continue;
        };
        let insights = state.generator.generate(&session).await;
        sessions.push(SessionInsightRow {
            session_id,
            duration_ms: session.duration_ms(),
            events: session.events.len(),
            friction_patterns: insights.friction_patterns.len(),
            max_severity: insights
                .friction_patterns
                .iter()
                .map(|p| p.severity)
                .fold(0.0, f64::max),
            has_ended: session.has_ended(),
        });
    }

    Json(InsightListResponse {
        total_sessions,
        sessions,
    })
}
