//! Deterministic friction classification over reconstructed sessions.
//!
//! Four independent detectors, each yielding zero or one pattern with
//! severity in [0,1], an instance count, and evidence strings drawn directly
//! from the contributing events. Identical input produces identical output;
//! the downstream intent-inference collaborator is the non-deterministic
//! part and lives behind a separate seam.

use serde::{Deserialize, Serialize};

use telemetry_core::{EventKind, EventPayload, FrictionPattern, PatternType};

use crate::reconstructor::ReconstructedSession;

/// Page loads slower than this are a degradation signal (ms).
const SLOW_LOAD_MS: f64 = 3000.0;

/// Loads are scored against this ceiling: severity = load_time / 10s.
const LOAD_SEVERITY_SCALE_MS: f64 = 10_000.0;

/// Latencies are scored against this ceiling: severity = latency / 5s.
const LATENCY_SEVERITY_SCALE_MS: f64 = 5_000.0;

/// A reversal after less time on page than this reads as confusion (ms).
const QUICK_REVERSAL_MS: f64 = 2000.0;

/// Reversal count at which unmet expectations are inferred.
const REVERSAL_MISMATCH_COUNT: usize = 3;

/// Classifier thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Interaction latency above this is a degradation signal (ms)
    #[serde(default = "default_latency_threshold_ms")]
    pub latency_threshold_ms: f64,
    /// Gap between consecutive events above this counts as an idle gap (ms)
    #[serde(default = "default_idle_gap_ms")]
    pub idle_gap_ms: i64,
}

fn default_latency_threshold_ms() -> f64 {
    1000.0
}

fn default_idle_gap_ms() -> i64 {
    60_000
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            latency_threshold_ms: default_latency_threshold_ms(),
            idle_gap_ms: default_idle_gap_ms(),
        }
    }
}

/// Evaluates deterministic rules over a reconstructed session.
#[derive(Debug, Clone, Default)]
pub struct FrictionClassifier {
    config: ClassifierConfig,
}

impl FrictionClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Pure and total over any well-formed session; an empty session yields
    /// an empty list. Equally severe patterns are all reported; the caller
    /// may rank by severity.
    pub fn classify(&self, session: &ReconstructedSession) -> Vec<FrictionPattern> {
        [
            self.detect_performance_degradation(session),
            self.detect_affordance_confusion(session),
            self.detect_cognitive_overload(session),
            self.detect_expectation_mismatch(session),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Slow page loads and over-threshold interaction latencies. Severity
    /// sums the per-event overrun ratios, capped at 1.0.
    fn detect_performance_degradation(
        &self,
        session: &ReconstructedSession,
    ) -> Option<FrictionPattern> {
        let mut severity = 0.0;
        let mut instances = 0u32;
        let mut evidence = Vec::new();

        for event in &session.events {
            match &event.payload {
                EventPayload::PerformanceLoad(data) if data.load_time > SLOW_LOAD_MS => {
                    severity += (data.load_time / LOAD_SEVERITY_SCALE_MS).min(1.0);
                    instances += 1;
                    evidence.push(format!("Slow page load detected: {}ms", data.load_time));
                }
                EventPayload::PerformanceLatency(data)
                    if data.latency > self.config.latency_threshold_ms =>
                {
                    severity += (data.latency / LATENCY_SEVERITY_SCALE_MS).min(1.0);
                    instances += 1;
                    evidence.push(format!(
                        "High latency for {}: {}ms",
                        data.operation, data.latency
                    ));
                }
                _ => {}
            }
        }

        build_pattern(
            PatternType::PerformanceDegradation,
            severity,
            instances,
            evidence,
        )
    }

    /// Rapid-click bursts and navigation reversals. Click bursts weigh
    /// click-count/10 each; reversals weigh 0.2, or 0.35 when the user
    /// bailed out in under two seconds.
    fn detect_affordance_confusion(
        &self,
        session: &ReconstructedSession,
    ) -> Option<FrictionPattern> {
        let mut severity = 0.0;
        let mut instances = 0u32;
        let mut evidence = Vec::new();

        for event in &session.events {
            match &event.payload {
                EventPayload::FrictionRapidClick(data) => {
                    severity += (f64::from(data.click_count) / 10.0).min(1.0);
                    instances += 1;
                    evidence.push(format!(
                        "Rapid clicking on '{}' ({} clicks) suggests unclear affordance or missing feedback",
                        data.target, data.click_count
                    ));
                }
                EventPayload::FrictionNavigationReversal(data) => {
                    instances += 1;
                    if data.time_on_page < QUICK_REVERSAL_MS {
                        severity += 0.35;
                        evidence.push(
                            "Quick navigation reversal suggests user didn't find expected content"
                                .to_string(),
                        );
                    } else {
                        severity += 0.2;
                        evidence.push(format!(
                            "Navigation reversal after {}ms on page",
                            data.time_on_page
                        ));
                    }
                }
                _ => {}
            }
        }

        build_pattern(
            PatternType::AffordanceConfusion,
            severity,
            instances,
            evidence,
        )
    }

    /// Form abandonment and long idle gaps. Severity is the worst
    /// abandonment (fraction of fields left incomplete) plus 0.1 per idle
    /// gap, capped at 1.0.
    fn detect_cognitive_overload(&self, session: &ReconstructedSession) -> Option<FrictionPattern> {
        let mut worst_abandonment = 0.0f64;
        let mut instances = 0u32;
        let mut evidence = Vec::new();

        for event in &session.events {
            if let EventPayload::FrictionFormAbandonment(data) = &event.payload {
                let total = data.total_fields.max(1);
                let completion = f64::from(data.fields_completed.min(total)) / f64::from(total);
                worst_abandonment = worst_abandonment.max(1.0 - completion);
                instances += 1;
                evidence.push(format!(
                    "Form abandoned after completing {}/{} fields",
                    data.fields_completed, data.total_fields
                ));
            }
        }

        let mut idle_bump = 0.0;
        for pair in session.events.windows(2) {
            let gap_ms = (pair[1].timestamp - pair[0].timestamp).num_milliseconds();
            if gap_ms > self.config.idle_gap_ms {
                idle_bump += 0.1;
                instances += 1;
                evidence.push(format!(
                    "Idle gap of {}s between '{}' and '{}'",
                    gap_ms / 1000,
                    pair[0].kind().as_str(),
                    pair[1].kind().as_str()
                ));
            }
        }

        build_pattern(
            PatternType::CognitiveOverload,
            worst_abandonment + idle_bump,
            instances,
            evidence,
        )
    }

    /// Errors combined with repeated navigation reversals. With errors
    /// present, severity blends error count and the reversal-to-navigation
    /// ratio; three or more reversals alone still signal a mismatch.
    fn detect_expectation_mismatch(
        &self,
        session: &ReconstructedSession,
    ) -> Option<FrictionPattern> {
        let mut error_count = 0u32;
        let mut evidence = Vec::new();

        for event in &session.events {
            if let EventPayload::FrictionError(data) = &event.payload {
                error_count += 1;
                evidence.push(format!("Error encountered: {}", data.error_type));
            }
        }

        let reversals = session
            .events_of_kind(EventKind::FrictionNavigationReversal)
            .count();
        let navigations = session
            .events
            .iter()
            .filter(|e| e.category() == telemetry_core::EventCategory::Navigation)
            .count();

        let repeated_reversals = reversals >= REVERSAL_MISMATCH_COUNT;
        if repeated_reversals {
            evidence.push(format!(
                "Multiple navigation reversals ({}) suggest unmet expectations",
                reversals
            ));
        }

        if error_count == 0 && !repeated_reversals {
            return None;
        }

        let severity = if error_count > 0 {
            let ratio = (reversals as f64 / navigations.max(1) as f64).min(1.0);
            (0.5 + 0.1 * f64::from(error_count - 1) + 0.4 * ratio).min(1.0)
        } else {
            0.6
        };

        let instances = error_count + if repeated_reversals { reversals as u32 } else { 0 };

        build_pattern(PatternType::ExpectationMismatch, severity, instances, evidence)
    }
}

fn build_pattern(
    pattern_type: PatternType,
    severity: f64,
    instances: u32,
    evidence: Vec<String>,
) -> Option<FrictionPattern> {
    if instances == 0 || severity <= 0.0 {
        return None;
    }
    Some(FrictionPattern {
        pattern_type,
        severity: severity.min(1.0),
        instance_count: instances,
        evidence,
    })
}
