//! Internal metrics and tracing for the telemetry pipeline.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::*;
pub use tracing_setup::*;
