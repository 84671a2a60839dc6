//! Schema validation for events and batches.

use chrono::{Duration, Utc};
use validator::Validate;

use crate::batch::EventBatch;
use crate::error::{Error, Result};
use crate::event::{EventPayload, TelemetryEvent};
use crate::limits::{
    MAX_BATCH_SIZE_BYTES, MAX_EVENT_AGE_HOURS, MAX_EVENT_SIZE_BYTES, MAX_FUTURE_SKEW_SECS,
};

/// Validates raw batch size BEFORE deserialization.
///
/// Call this first to prevent allocation spikes from oversized payloads.
pub fn validate_batch_size(raw_bytes: &[u8]) -> Result<()> {
    if raw_bytes.len() > MAX_BATCH_SIZE_BYTES {
        return Err(Error::validation(format!(
            "batch {}KB exceeds {}KB limit",
            raw_bytes.len() / 1024,
            MAX_BATCH_SIZE_BYTES / 1024
        )));
    }
    Ok(())
}

/// Validates a single serialized event size.
pub fn validate_event_size(raw_bytes: &[u8]) -> Result<()> {
    if raw_bytes.len() > MAX_EVENT_SIZE_BYTES {
        return Err(Error::validation(format!(
            "event {}KB exceeds {}KB limit",
            raw_bytes.len() / 1024,
            MAX_EVENT_SIZE_BYTES / 1024
        )));
    }
    Ok(())
}

/// Validates an event against its schema.
pub fn validate_event(event: &TelemetryEvent) -> Result<()> {
    // Run validator derive validations (envelope + context)
    event
        .validate()
        .map_err(|e| Error::validation(format!("{}", e)))?;

    // Cross-field: reject events claiming to be from the future (allow clock skew)
    let now = Utc::now();
    let max_future = Duration::seconds(MAX_FUTURE_SKEW_SECS);
    if event.timestamp > now + max_future {
        return Err(Error::validation(
            "timestamp cannot be more than 5s in the future",
        ));
    }

    // Cross-field: reject stale events older than configured max age
    let max_age = Duration::hours(MAX_EVENT_AGE_HOURS);
    if now - event.timestamp > max_age {
        return Err(Error::validation(
            "timestamp cannot be more than 24h in the past",
        ));
    }

    // Validate payload-specific rules
    match &event.payload {
        EventPayload::SessionStart(data) => validate_data("session.start", data),
        EventPayload::SessionResume(data) => validate_data("session.resume", data),
        EventPayload::SessionPause(data) => validate_data("session.pause", data),
        EventPayload::SessionEnd(data) => validate_data("session.end", data),
        EventPayload::ViewTransition(data) => validate_data("view.transition", data),
        EventPayload::NavigationBack(data) => validate_data("navigation.back", data),
        EventPayload::NavigationForward(data) => validate_data("navigation.forward", data),
        EventPayload::ActionClick(data) => validate_data("action.click", data),
        EventPayload::ActionSubmit(data) => validate_data("action.submit", data),
        EventPayload::ActionFocus(data) => validate_data("action.focus", data),
        EventPayload::ActionInput(data) => validate_data("action.input", data),
        EventPayload::ActionScroll(data) => validate_data("action.scroll", data),
        EventPayload::PerformanceLoad(data) => validate_data("performance.load", data),
        EventPayload::PerformanceLatency(data) => validate_data("performance.latency", data),
        EventPayload::FrictionRapidClick(data) => validate_data("friction.rapid_click", data),
        EventPayload::FrictionNavigationReversal(data) => {
            validate_data("friction.navigation_reversal", data)
        }
        EventPayload::FrictionError(data) => validate_data("friction.error", data),
        EventPayload::FrictionFormAbandonment(data) => {
            validate_data("friction.form_abandonment", data)
        }
    }
}

fn validate_data<T: Validate>(kind: &str, data: &T) -> Result<()> {
    data.validate()
        .map_err(|e| Error::validation(format!("{}: {}", kind, e)))
}

/// Validates a batch of events.
///
/// Batch-level failures are fatal; per-event failures are collected and
/// returned so callers can drop invalid events without rejecting the batch.
pub fn validate_batch(batch: &EventBatch) -> Result<Vec<Error>> {
    batch
        .validate()
        .map_err(|e| Error::validation(format!("batch: {}", e)))?;

    let mut errors = Vec::new();

    for (i, event) in batch.events.iter().enumerate() {
        if let Err(e) = validate_event(event) {
            errors.push(Error::validation(format!("event[{}]: {}", i, e)));
        }
    }

    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn context() -> EventContext {
        EventContext {
            url: Some("https://example.com/".into()),
            page_title: Some("Home".into()),
            viewport: Viewport {
                width: 1280,
                height: 800,
            },
            device: DeviceInfo {
                device_type: DeviceType::Desktop,
                touch_enabled: false,
            },
            user_agent: Some("Mozilla/5.0".into()),
        }
    }

    fn event(payload: EventPayload) -> TelemetryEvent {
        TelemetryEvent {
            schema_version: SCHEMA_VERSION.to_string(),
            event_id: Uuid::new_v4(),
            session_id: "sess-1".into(),
            timestamp: Utc::now(),
            sequence_number: 0,
            context: context(),
            payload,
        }
    }

    #[test]
    fn valid_load_event_passes() {
        let e = event(EventPayload::PerformanceLoad(PerformanceLoadData {
            load_time: 250.0,
            url: None,
        }));
        assert!(validate_event(&e).is_ok());
    }

    #[test]
    fn future_timestamp_rejected() {
        let mut e = event(EventPayload::SessionStart(SessionStartData::default()));
        e.timestamp = Utc::now() + Duration::seconds(60);
        assert!(validate_event(&e).is_err());
    }

    #[test]
    fn stale_timestamp_rejected() {
        let mut e = event(EventPayload::SessionStart(SessionStartData::default()));
        e.timestamp = Utc::now() - Duration::hours(48);
        assert!(validate_event(&e).is_err());
    }

    #[test]
    fn batch_collects_per_event_errors() {
        let good = event(EventPayload::SessionStart(SessionStartData::default()));
        let mut bad = event(EventPayload::SessionEnd(SessionEndData::default()));
        bad.timestamp = Utc::now() - Duration::hours(48);

        let batch = EventBatch::new(vec![good, bad]);
        let errors = validate_batch(&batch).unwrap();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn empty_batch_rejected() {
        let batch = EventBatch::new(Vec::new());
        assert!(validate_batch(&batch).is_err());
    }
}
