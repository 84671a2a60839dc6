//! Client-side capture SDK.
//!
//! Pipeline: host interaction -> [`EventCollector`] -> [`PrivacyFilter`] ->
//! [`EventBuffer`] -> [`Transmitter`] -> server. The [`Tracker`] ties the
//! pieces together behind a single-threaded command loop.

pub mod buffer;
pub mod collector;
pub mod config;
pub mod privacy;
pub mod storage;
pub mod tracker;
pub mod transmitter;

pub use buffer::{BufferState, EventBuffer};
pub use collector::{ClientEnvironment, EventCollector};
pub use config::CaptureConfig;
pub use privacy::{PrivacyConfig, PrivacyFilter};
pub use storage::{BufferStore, FileStore, MemoryStore, BUFFER_STORAGE_KEY, OPT_OUT_KEY};
pub use tracker::{Subscription, Tracker};
pub use transmitter::{BatchTransport, HttpTransport, Transmitter};
