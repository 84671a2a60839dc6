//! Application state shared across handlers.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use insight::{
    ClassifierConfig, DisabledInferrer, FrictionClassifier, InsightGenerator, IntentInferrer,
    SessionReconstructor,
};
use telemetry_core::InsightSummary;

/// Cache TTL for generated insights.
const INSIGHT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Maximum cached insight entries.
const INSIGHT_CACHE_MAX_CAPACITY: u64 = 10_000;

/// Shared application state.
///
/// Insights are cached keyed by `(session_id, event_count)`: a newly ingested
/// batch changes the session's event count and naturally misses the cache, so
/// no explicit invalidation is needed. Classification is deterministic, which
/// makes cached entries safe to serve.
#[derive(Clone)]
pub struct AppState {
    pub reconstructor: Arc<SessionReconstructor>,
    pub generator: Arc<InsightGenerator>,
    pub insight_cache: Cache<(String, usize), InsightSummary>,
}

impl AppState {
    /// Creates state with the default (disabled) intent inferrer.
    pub fn new(classifier_config: ClassifierConfig) -> Self {
        Self::with_inferrer(classifier_config, Arc::new(DisabledInferrer))
    }

    /// Creates state with an explicit intent-inference collaborator.
    pub fn with_inferrer(
        classifier_config: ClassifierConfig,
        inferrer: Arc<dyn IntentInferrer>,
    ) -> Self {
        let reconstructor = Arc::new(SessionReconstructor::new());
        let generator = Arc::new(InsightGenerator::new(
            FrictionClassifier::new(classifier_config),
            inferrer,
        ));

        Self {
            reconstructor,
            generator,
            insight_cache: Cache::builder()
                .max_capacity(INSIGHT_CACHE_MAX_CAPACITY)
                .time_to_live(INSIGHT_CACHE_TTL)
                .build(),
        }
    }
}
