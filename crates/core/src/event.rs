//! Telemetry event definitions.
//!
//! Events are serialized in camelCase to match the SDK wire format, with the
//! payload adjacently tagged as `type` / `data`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Wire schema version stamped on every event and batch.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Event categories, derived from the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Session,
    Navigation,
    Interaction,
    Performance,
    Friction,
}

/// All supported event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "session.start")]
    SessionStart,
    #[serde(rename = "session.resume")]
    SessionResume,
    #[serde(rename = "session.pause")]
    SessionPause,
    #[serde(rename = "session.end")]
    SessionEnd,
    #[serde(rename = "view.transition")]
    ViewTransition,
    #[serde(rename = "navigation.back")]
    NavigationBack,
    #[serde(rename = "navigation.forward")]
    NavigationForward,
    #[serde(rename = "action.click")]
    ActionClick,
    #[serde(rename = "action.submit")]
    ActionSubmit,
    #[serde(rename = "action.focus")]
    ActionFocus,
    #[serde(rename = "action.input")]
    ActionInput,
    #[serde(rename = "action.scroll")]
    ActionScroll,
    #[serde(rename = "performance.load")]
    PerformanceLoad,
    #[serde(rename = "performance.latency")]
    PerformanceLatency,
    #[serde(rename = "friction.rapid_click")]
    FrictionRapidClick,
    #[serde(rename = "friction.navigation_reversal")]
    FrictionNavigationReversal,
    #[serde(rename = "friction.error")]
    FrictionError,
    #[serde(rename = "friction.form_abandonment")]
    FrictionFormAbandonment,
}

impl EventKind {
    /// Returns the wire string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStart => "session.start",
            Self::SessionResume => "session.resume",
            Self::SessionPause => "session.pause",
            Self::SessionEnd => "session.end",
            Self::ViewTransition => "view.transition",
            Self::NavigationBack => "navigation.back",
            Self::NavigationForward => "navigation.forward",
            Self::ActionClick => "action.click",
            Self::ActionSubmit => "action.submit",
            Self::ActionFocus => "action.focus",
            Self::ActionInput => "action.input",
            Self::ActionScroll => "action.scroll",
            Self::PerformanceLoad => "performance.load",
            Self::PerformanceLatency => "performance.latency",
            Self::FrictionRapidClick => "friction.rapid_click",
            Self::FrictionNavigationReversal => "friction.navigation_reversal",
            Self::FrictionError => "friction.error",
            Self::FrictionFormAbandonment => "friction.form_abandonment",
        }
    }

    /// Returns the category this kind belongs to.
    pub fn category(&self) -> EventCategory {
        match self {
            Self::SessionStart | Self::SessionResume | Self::SessionPause | Self::SessionEnd => {
                EventCategory::Session
            }
            Self::ViewTransition | Self::NavigationBack | Self::NavigationForward => {
                EventCategory::Navigation
            }
            Self::ActionClick
            | Self::ActionSubmit
            | Self::ActionFocus
            | Self::ActionInput
            | Self::ActionScroll => EventCategory::Interaction,
            Self::PerformanceLoad | Self::PerformanceLatency => EventCategory::Performance,
            Self::FrictionRapidClick
            | Self::FrictionNavigationReversal
            | Self::FrictionError
            | Self::FrictionFormAbandonment => EventCategory::Friction,
        }
    }
}

/// Device classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceType {
    /// Presentation heuristic: classify by viewport width breakpoints.
    pub fn from_viewport_width(width: u32) -> Self {
        if width < 768 {
            Self::Mobile
        } else if width < 1024 {
            Self::Tablet
        } else {
            Self::Desktop
        }
    }
}

/// Device descriptor captured at enrichment time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub touch_enabled: bool,
}

/// Viewport dimensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Context captured when an event is enriched; immutable once attached.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    /// Sanitized page URL
    #[validate(length(max = 2048))]
    pub url: Option<String>,
    #[validate(length(max = 500))]
    pub page_title: Option<String>,
    pub viewport: Viewport,
    pub device: DeviceInfo,
    /// Omitted entirely under strict privacy
    #[validate(length(max = 512))]
    pub user_agent: Option<String>,
}

/// Scroll direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Session start event data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStartData {
    #[validate(length(max = 2048))]
    pub referrer: Option<String>,
    #[validate(length(max = 2048))]
    pub entry_url: Option<String>,
}

/// Session resume event data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionResumeData {
    /// Time spent paused before resuming (ms)
    #[validate(range(min = 0.0))]
    pub idle_ms: Option<f64>,
}

/// Session pause event data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionPauseData {
    #[validate(length(max = 128))]
    pub reason: Option<String>,
}

/// Session end event data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionEndData {
    #[validate(length(max = 128))]
    pub reason: Option<String>,
    #[validate(range(min = 0.0))]
    pub duration_ms: Option<f64>,
}

/// View transition event data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewTransitionData {
    #[validate(length(max = 2048))]
    pub from: Option<String>,
    /// Transition target; the ordered list of targets forms the navigation path
    #[validate(length(min = 1, max = 2048))]
    pub to: String,
    #[validate(length(max = 64))]
    pub trigger: Option<String>,
}

/// Browser history navigation data (back/forward).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationData {
    #[validate(length(max = 2048))]
    pub url: Option<String>,
}

/// Click event data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ClickData {
    /// Sanitized CSS selector of the click target
    #[validate(length(max = 1000))]
    pub target: Option<String>,
    /// Element text content (truncated)
    #[validate(length(max = 200))]
    pub text: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

/// Form submit event data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitData {
    #[validate(length(max = 128))]
    pub form_id: Option<String>,
    pub field_count: Option<u32>,
}

/// Focus event data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct FocusData {
    #[validate(length(max = 1000))]
    pub target: Option<String>,
}

/// Input event data. Only the value length is captured, never the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct InputData {
    #[validate(length(max = 1000))]
    pub target: Option<String>,
    pub value_length: Option<u32>,
}

/// Scroll event data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrollData {
    /// Scroll depth as percentage (0-100)
    #[validate(range(min = 0.0, max = 100.0))]
    pub depth_percent: Option<f64>,
    pub direction: Option<ScrollDirection>,
}

/// Page load performance data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceLoadData {
    /// Page load time (ms)
    #[validate(range(min = 0.0, max = 300000.0))]
    pub load_time: f64,
    #[validate(length(max = 2048))]
    pub url: Option<String>,
}

/// Interaction latency performance data.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceLatencyData {
    /// Observed latency (ms)
    #[validate(range(min = 0.0, max = 300000.0))]
    pub latency: f64,
    #[validate(length(max = 128))]
    pub operation: String,
}

impl Default for PerformanceLatencyData {
    fn default() -> Self {
        Self {
            latency: 0.0,
            operation: "unknown".to_string(),
        }
    }
}

/// Rapid click burst data.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct RapidClickData {
    /// Number of clicks in the burst
    pub click_count: u32,
    /// Sanitized selector of the burst target
    #[validate(length(max = 1000))]
    pub target: String,
    /// Burst detection window (ms)
    #[validate(range(min = 0.0))]
    pub window_ms: Option<f64>,
}

impl Default for RapidClickData {
    fn default() -> Self {
        Self {
            click_count: 0,
            target: "unknown".to_string(),
            window_ms: None,
        }
    }
}

/// Navigation reversal data (forward then quickly back).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationReversalData {
    #[validate(length(max = 2048))]
    pub from: Option<String>,
    #[validate(length(max = 2048))]
    pub to: Option<String>,
    /// Time spent on the abandoned page (ms)
    #[validate(range(min = 0.0))]
    pub time_on_page: f64,
}

/// Client-observed error data.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct FrictionErrorData {
    #[validate(length(max = 128))]
    pub error_type: String,
    #[validate(length(max = 1000))]
    pub message: Option<String>,
    #[validate(length(max = 1000))]
    pub target: Option<String>,
}

impl Default for FrictionErrorData {
    fn default() -> Self {
        Self {
            error_type: "unknown".to_string(),
            message: None,
            target: None,
        }
    }
}

/// Form abandonment data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct FormAbandonmentData {
    #[validate(length(max = 128))]
    pub form_id: Option<String>,
    pub fields_completed: u32,
    pub total_fields: u32,
}

/// Event payload variants, adjacently tagged on the wire as `type` / `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventPayload {
    #[serde(rename = "session.start")]
    SessionStart(SessionStartData),
    #[serde(rename = "session.resume")]
    SessionResume(SessionResumeData),
    #[serde(rename = "session.pause")]
    SessionPause(SessionPauseData),
    #[serde(rename = "session.end")]
    SessionEnd(SessionEndData),
    #[serde(rename = "view.transition")]
    ViewTransition(ViewTransitionData),
    #[serde(rename = "navigation.back")]
    NavigationBack(NavigationData),
    #[serde(rename = "navigation.forward")]
    NavigationForward(NavigationData),
    #[serde(rename = "action.click")]
    ActionClick(ClickData),
    #[serde(rename = "action.submit")]
    ActionSubmit(SubmitData),
    #[serde(rename = "action.focus")]
    ActionFocus(FocusData),
    #[serde(rename = "action.input")]
    ActionInput(InputData),
    #[serde(rename = "action.scroll")]
    ActionScroll(ScrollData),
    #[serde(rename = "performance.load")]
    PerformanceLoad(PerformanceLoadData),
    #[serde(rename = "performance.latency")]
    PerformanceLatency(PerformanceLatencyData),
    #[serde(rename = "friction.rapid_click")]
    FrictionRapidClick(RapidClickData),
    #[serde(rename = "friction.navigation_reversal")]
    FrictionNavigationReversal(NavigationReversalData),
    #[serde(rename = "friction.error")]
    FrictionError(FrictionErrorData),
    #[serde(rename = "friction.form_abandonment")]
    FrictionFormAbandonment(FormAbandonmentData),
}

impl EventPayload {
    /// Returns the kind of this payload.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::SessionStart(_) => EventKind::SessionStart,
            Self::SessionResume(_) => EventKind::SessionResume,
            Self::SessionPause(_) => EventKind::SessionPause,
            Self::SessionEnd(_) => EventKind::SessionEnd,
            Self::ViewTransition(_) => EventKind::ViewTransition,
            Self::NavigationBack(_) => EventKind::NavigationBack,
            Self::NavigationForward(_) => EventKind::NavigationForward,
            Self::ActionClick(_) => EventKind::ActionClick,
            Self::ActionSubmit(_) => EventKind::ActionSubmit,
            Self::ActionFocus(_) => EventKind::ActionFocus,
            Self::ActionInput(_) => EventKind::ActionInput,
            Self::ActionScroll(_) => EventKind::ActionScroll,
            Self::PerformanceLoad(_) => EventKind::PerformanceLoad,
            Self::PerformanceLatency(_) => EventKind::PerformanceLatency,
            Self::FrictionRapidClick(_) => EventKind::FrictionRapidClick,
            Self::FrictionNavigationReversal(_) => EventKind::FrictionNavigationReversal,
            Self::FrictionError(_) => EventKind::FrictionError,
            Self::FrictionFormAbandonment(_) => EventKind::FrictionFormAbandonment,
        }
    }
}

/// A single telemetry event.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    /// Wire schema version
    #[validate(length(min = 1, max = 16))]
    pub schema_version: String,
    /// Globally unique event ID
    pub event_id: Uuid,
    /// Session this event belongs to
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    /// Client timestamp
    pub timestamp: DateTime<Utc>,
    /// Collector-assigned, strictly increasing within a session
    pub sequence_number: u64,
    /// Context captured at enrichment time
    #[validate(nested)]
    pub context: EventContext,
    /// Typed payload, tagged `type` / `data` on the wire
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl TelemetryEvent {
    /// Returns the event kind.
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Returns the event category.
    pub fn category(&self) -> EventCategory {
        self.kind().category()
    }
}
