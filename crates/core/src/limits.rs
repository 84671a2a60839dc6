//! Size and age limits for the telemetry pipeline.
//!
//! Limits bound memory use on the ingest path: a batch is fully buffered
//! before parsing, so the batch byte cap is the working-set cap per request.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so field limits are duplicated there. Keep both in sync when modifying.

// === Batch limits ===

/// Maximum batch payload size in bytes (1MB).
pub const MAX_BATCH_SIZE_BYTES: usize = 1024 * 1024;

/// Maximum events per batch.
pub const MAX_BATCH_EVENTS: usize = 1000;

/// Maximum single serialized event size in bytes (32KB).
pub const MAX_EVENT_SIZE_BYTES: usize = 32 * 1024;

// === String field limits (chars) ===

/// Page/entry URL max length.
pub const MAX_URL_LEN: usize = 2048;

/// Page title max length.
pub const MAX_PAGE_TITLE_LEN: usize = 500;

/// User agent string max length.
/// Browser UAs: 100-300 typical, 500+ with extensions.
pub const MAX_USER_AGENT_LEN: usize = 512;

/// CSS selector / event target max length.
pub const MAX_TARGET_LEN: usize = 1000;

/// Error type / operation name max length.
pub const MAX_NAME_LEN: usize = 128;

/// Error message max length.
pub const MAX_MESSAGE_LEN: usize = 1000;

// === Timestamp bounds ===

/// Maximum allowed clock skew for future timestamps (seconds).
pub const MAX_FUTURE_SKEW_SECS: i64 = 5;

/// Maximum age for stale events (hours).
pub const MAX_EVENT_AGE_HOURS: i64 = 24;
