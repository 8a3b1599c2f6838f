//! Host collaborator interfaces for signalk-trigger
//!
//! The engine reads entity snapshots from the host's data model and hands
//! notifications and status changes back to it. This crate defines those
//! seams plus in-process implementations:
//! - `MemoryDataModel`: Signal K full model built from deltas
//! - `JsonLinesSink`: one notification envelope per line
//! - `LogStatusReporter`: status changes as log events
//! - `RecordingSink` / `RecordingStatus`: recorders for tests

mod memory;
mod mock;
mod sink;
mod traits;

pub use memory::*;
pub use mock::*;
pub use sink::*;
pub use traits::*;
