//! Server-side analysis: session reconstruction, friction classification,
//! and insight generation.

pub mod classifier;
pub mod generator;
pub mod inferrer;
pub mod reconstructor;
pub mod retention;

pub use classifier::{ClassifierConfig, FrictionClassifier};
pub use generator::InsightGenerator;
pub use inferrer::{DisabledInferrer, IntentInferrer};
pub use reconstructor::{IngestStats, ReconstructedSession, SessionReconstructor};
pub use retention::{RetentionConfig, RetentionWorker};
