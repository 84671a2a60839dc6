//! Test fixtures and event generators.

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use telemetry_core::{EventBatch, TelemetryEvent};

/// Generate a valid wire-format event JSON with unique IDs.
pub fn event_json(session_id: &str, seq: u64, kind: &str, data: Value) -> Value {
    json!({
        "schemaVersion": "1.0.0",
        "eventId": Uuid::new_v4().to_string(),
        "sessionId": session_id,
        "timestamp": Utc::now(),
        "sequenceNumber": seq,
        "context": {
            "url": "https://example.com/test",
            "pageTitle": "Test Page",
            "viewport": { "width": 1280, "height": 800 },
            "device": { "type": "desktop", "touchEnabled": false },
            "userAgent": "Mozilla/5.0 (Test)"
        },
        "type": kind,
        "data": data
    })
}

/// Generate a wire-format batch payload around the given events.
pub fn batch_json(events: Vec<Value>) -> Value {
    json!({
        "schemaVersion": "1.0.0",
        "batchId": Uuid::new_v4().to_string(),
        "timestamp": Utc::now(),
        "events": events
    })
}

/// Parse a wire-format event JSON into a typed event.
pub fn event(session_id: &str, seq: u64, kind: &str, data: Value) -> TelemetryEvent {
    serde_json::from_value(event_json(session_id, seq, kind, data)).unwrap()
}

/// Build a typed batch around the given events.
pub fn batch(events: Vec<TelemetryEvent>) -> EventBatch {
    EventBatch::new(events)
}

/// A short session with one slow page load and a clean end.
pub fn slow_load_session_events(session_id: &str) -> Vec<Value> {
    vec![
        event_json(session_id, 0, "session.start", json!({})),
        event_json(session_id, 1, "view.transition", json!({ "to": "/pricing" })),
        event_json(session_id, 2, "performance.load", json!({ "loadTime": 5000.0 })),
        event_json(session_id, 3, "session.end", json!({})),
    ]
}
