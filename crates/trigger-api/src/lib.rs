//! Shared types for signalk-trigger
//!
//! This crate defines the types exchanged between the engine and its host:
//! - Signal K deltas (update batches)
//! - Trigger and variable-mapping specifications
//! - Notifications emitted on transitions
//! - Provider status

mod delta;
mod events;
mod types;

pub use delta::*;
pub use events::*;
pub use types::*;

/// Current notification envelope version
pub const API_VERSION: u32 = 1;
