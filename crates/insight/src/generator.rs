//! Insight assembly: friction patterns, recommendations, confidence.

use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

use telemetry_core::{FrictionPattern, InsightSummary, IntentHypothesis, PatternType};

use crate::classifier::FrictionClassifier;
use crate::inferrer::IntentInferrer;
use crate::reconstructor::ReconstructedSession;

/// Combines classifier output, intent hypotheses, and recommendations into
/// one insight response.
pub struct InsightGenerator {
    classifier: FrictionClassifier,
    inferrer: Arc<dyn IntentInferrer>,
}

impl InsightGenerator {
    pub fn new(classifier: FrictionClassifier, inferrer: Arc<dyn IntentInferrer>) -> Self {
        Self {
            classifier,
            inferrer,
        }
    }

    /// Generates insights for a session. Inferrer failure degrades to empty
    /// hypotheses; friction patterns and metrics are always present.
    pub async fn generate(&self, session: &ReconstructedSession) -> InsightSummary {
        let friction_patterns = self.classifier.classify(session);

        let intent_hypotheses = match self.inferrer.infer(session, &friction_patterns).await {
            Ok(hypotheses) => hypotheses,
            Err(e) => {
                warn!(
                    session_id = %session.session_id,
                    error = %e,
                    "intent inference unavailable, returning friction-only insights"
                );
                Vec::new()
            }
        };

        let recommendations = recommendations_for(&friction_patterns);
        let confidence_score = confidence_score(&intent_hypotheses, &friction_patterns);

        InsightSummary {
            session_id: session.session_id.clone(),
            timestamp: session.end_time().unwrap_or_else(Utc::now),
            intent_hypotheses,
            friction_patterns,
            recommendations,
            confidence_score,
            metrics: session.summary(),
        }
    }
}

/// Deterministic recommendation mapping from detected pattern types.
fn recommendations_for(patterns: &[FrictionPattern]) -> Vec<String> {
    let mut recommendations = Vec::new();

    for pattern in patterns {
        match pattern.pattern_type {
            PatternType::PerformanceDegradation => {
                if pattern.severity > 0.7 {
                    recommendations.push(
                        "Critical: optimize page load performance and reduce interaction latency"
                            .to_string(),
                    );
                } else {
                    recommendations.push(
                        "Monitor and improve performance metrics for a smoother experience"
                            .to_string(),
                    );
                }
            }
            PatternType::AffordanceConfusion => {
                recommendations.push(
                    "Improve visual feedback for interactive elements: loading states, hover effects, click acknowledgment"
                        .to_string(),
                );
            }
            PatternType::CognitiveOverload => {
                recommendations.push(
                    "Simplify forms and reduce cognitive load: progressive disclosure, clearer labels, inline validation"
                        .to_string(),
                );
            }
            PatternType::ExpectationMismatch => {
                recommendations.push(
                    "Align UI behavior with user expectations: clearer error messages, better navigation cues"
                        .to_string(),
                );
            }
        }
    }

    let total_instances: u32 = patterns.iter().map(|p| p.instance_count).sum();
    if patterns.is_empty() {
        recommendations.push("Session appears smooth with no major friction detected".to_string());
    } else if total_instances >= 5 {
        recommendations.push(
            "High friction detected across multiple areas, prioritize UX improvements".to_string(),
        );
    }

    recommendations
}

/// Confidence blends the best hypothesis (70%) with friction detection
/// certainty (30%), rounded to two decimals.
fn confidence_score(hypotheses: &[IntentHypothesis], patterns: &[FrictionPattern]) -> f64 {
    let intent_confidence = hypotheses
        .iter()
        .map(|h| h.confidence)
        .fold(0.0f64, f64::max);

    let total_instances: u32 = patterns.iter().map(|p| p.instance_count).sum();
    let friction_factor = (f64::from(total_instances) / 10.0).min(1.0);

    let confidence = intent_confidence * 0.7 + friction_factor * 0.3;
    (confidence * 100.0).round() / 100.0
}
