//! Seam for the external intent-inference collaborator.
//!
//! The collaborator receives a fully reconstructed session and returns
//! free-text hypotheses; its internals (prompting, model behavior) are not
//! part of this pipeline. When it is unavailable the pipeline still returns
//! friction patterns and metrics with empty hypotheses.

use async_trait::async_trait;

use telemetry_core::{FrictionPattern, IntentHypothesis, Result};

use crate::reconstructor::ReconstructedSession;

/// Produces user intent hypotheses for a reconstructed session.
#[async_trait]
pub trait IntentInferrer: Send + Sync {
    async fn infer(
        &self,
        session: &ReconstructedSession,
        patterns: &[FrictionPattern],
    ) -> Result<Vec<IntentHypothesis>>;
}

/// Default inferrer: intent inference disabled, no hypotheses.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledInferrer;

#[async_trait]
impl IntentInferrer for DisabledInferrer {
    async fn infer(
        &self,
        _session: &ReconstructedSession,
        _patterns: &[FrictionPattern],
    ) -> Result<Vec<IntentHypothesis>> {
        Ok(Vec::new())
    }
}
