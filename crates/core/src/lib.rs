//! Core types, schemas, and validation for the intent telemetry pipeline.

pub mod batch;
pub mod error;
pub mod event;
pub mod limits;
pub mod schema;
pub mod session;

pub use batch::*;
pub use error::{Error, Result};
pub use event::*;
pub use session::*;
