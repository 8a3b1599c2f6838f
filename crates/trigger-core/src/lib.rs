//! Trigger evaluation engine for signalk-trigger
//!
//! This crate is the heart of signalk-trigger, containing:
//! - Static identifier extraction from compiled conditions
//! - Resolution of variable names to data-model paths and evaluation contexts
//! - Per-trigger edge detection (RISING, FALLING, BOTH, ALWAYS)
//! - Matching of delta paths against trigger dependencies
//! - Startup silence and per-(event, transition) debouncing
//!
//! Time is passed in as `MonotonicInstant` so behaviour is deterministic
//! under test.

mod edge;
mod engine;
mod events;
mod extract;
mod matcher;
mod resolver;
mod suppression;
mod trigger;

pub use edge::*;
pub use engine::*;
pub use events::*;
pub use extract::*;
pub use matcher::*;
pub use resolver::*;
pub use suppression::*;
pub use trigger::*;
