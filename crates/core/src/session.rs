//! Server-derived session and insight types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Friction pattern classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    PerformanceDegradation,
    AffordanceConfusion,
    CognitiveOverload,
    ExpectationMismatch,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerformanceDegradation => "performance_degradation",
            Self::AffordanceConfusion => "affordance_confusion",
            Self::CognitiveOverload => "cognitive_overload",
            Self::ExpectationMismatch => "expectation_mismatch",
        }
    }
}

/// A scored, evidenced friction classification for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrictionPattern {
    pub pattern_type: PatternType,
    /// Normalized strength of the signal, 0.0 - 1.0
    pub severity: f64,
    /// Number of contributing events
    pub instance_count: u32,
    /// Human-readable justifications drawn from the contributing events
    pub evidence: Vec<String>,
}

/// Summary metrics for a reconstructed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub event_count: usize,
    pub page_views: usize,
    pub interactions: usize,
    pub friction_events: usize,
    /// Whether a session.end event has been observed
    pub has_ended: bool,
}

/// A free-text user intent hypothesis from the external inference collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentHypothesis {
    pub hypothesis: String,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub supporting_evidence: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Full insight response for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightSummary {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    /// Empty when the inference collaborator is disabled or unavailable
    pub intent_hypotheses: Vec<IntentHypothesis>,
    pub friction_patterns: Vec<FrictionPattern>,
    pub recommendations: Vec<String>,
    pub confidence_score: f64,
    pub metrics: SessionSummary,
}
