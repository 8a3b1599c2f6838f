//! Shared utilities for signalk-trigger
//!
//! This crate provides:
//! - ID types (TriggerId, EntityId, NotificationId)
//! - Time utilities (monotonic instants, wall-clock timestamps)
//! - Error types
//! - Per-key debouncing
//! - Default configuration path

mod debounce;
mod error;
mod ids;
mod paths;
mod time;

pub use debounce::*;
pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
