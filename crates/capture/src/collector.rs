//! Event collection and enrichment.
//!
//! The collector stamps raw interactions into schema-compliant events:
//! envelope fields, context snapshot, privacy pass, then validation. A
//! malformed event is dropped, never raised — per-event loss must not crash
//! the host application.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use telemetry_core::schema::validate_event;
use telemetry_core::{DeviceType, EventKind, TelemetryEvent, SCHEMA_VERSION};

use crate::privacy::PrivacyFilter;

/// Snapshot of the host environment, provided and updated by the host
/// application (e.g. on navigation).
#[derive(Debug, Clone)]
pub struct ClientEnvironment {
    pub url: String,
    pub page_title: Option<String>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub touch_enabled: bool,
    pub user_agent: Option<String>,
}

impl Default for ClientEnvironment {
    fn default() -> Self {
        Self {
            url: "about:blank".to_string(),
            page_title: None,
            viewport_width: 1280,
            viewport_height: 720,
            touch_enabled: false,
            user_agent: None,
        }
    }
}

/// Stamps and enriches raw interactions into telemetry events.
pub struct EventCollector {
    session_id: String,
    sequence: u64,
    session_started_at: DateTime<Utc>,
    environment: ClientEnvironment,
    filter: PrivacyFilter,
}

impl EventCollector {
    pub fn new(environment: ClientEnvironment, filter: PrivacyFilter) -> Self {
        Self {
            session_id: new_session_id(),
            sequence: 0,
            session_started_at: Utc::now(),
            environment,
            filter,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn session_started_at(&self) -> DateTime<Utc> {
        self.session_started_at
    }

    /// Replaces the environment snapshot. Events already collected keep the
    /// context they were enriched with.
    pub fn set_environment(&mut self, environment: ClientEnvironment) {
        self.environment = environment;
    }

    /// Builds, filters, and validates one event.
    ///
    /// Returns `None` when the result fails structural validation; the event
    /// is silently dropped.
    pub fn collect(&mut self, kind: EventKind, raw_data: Value) -> Option<TelemetryEvent> {
        let envelope = json!({
            "schemaVersion": SCHEMA_VERSION,
            "eventId": Uuid::new_v4(),
            "sessionId": self.session_id,
            "timestamp": Utc::now(),
            "sequenceNumber": self.sequence,
            "context": self.capture_context(),
            "type": kind.as_str(),
            "data": raw_data,
        });

        let filtered = self.filter.filter_value(&envelope);

        let event = match serde_json::from_value::<TelemetryEvent>(filtered) {
            Ok(event) => event,
            Err(e) => {
                debug!(kind = kind.as_str(), error = %e, "dropping malformed event");
                return None;
            }
        };

        if let Err(e) = validate_event(&event) {
            debug!(kind = kind.as_str(), error = %e, "dropping invalid event");
            return None;
        }

        self.sequence += 1;
        Some(event)
    }

    /// Regenerates the session id and resets the sequence counter. Used when
    /// a session explicitly ends and a new one begins.
    pub fn reset_session(&mut self) {
        self.session_id = new_session_id();
        self.sequence = 0;
        self.session_started_at = Utc::now();
    }

    fn capture_context(&self) -> Value {
        let device_type = DeviceType::from_viewport_width(self.environment.viewport_width);
        let user_agent = if self.filter.is_strict() {
            None
        } else {
            self.environment.user_agent.clone()
        };

        json!({
            "url": self.filter.sanitize_url(&self.environment.url),
            "pageTitle": self.environment.page_title,
            "viewport": {
                "width": self.environment.viewport_width,
                "height": self.environment.viewport_height,
            },
            "device": {
                "type": device_type,
                "touchEnabled": self.environment.touch_enabled,
            },
            "userAgent": user_agent,
        })
    }
}

fn new_session_id() -> String {
    format!("sess-{}", Uuid::new_v4())
}
