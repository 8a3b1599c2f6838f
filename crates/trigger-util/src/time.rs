//! Time utilities for signalk-trigger
//!
//! Suppression windows are measured in monotonic time so they are immune to
//! wall-clock changes. Wall-clock time is only used to stamp notifications.

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// Get the current local time.
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Convert a configured number of seconds into a Duration.
///
/// Returns `None` for negative, NaN or infinite values.
pub fn duration_from_secs(secs: f64) -> Option<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

/// Represents a point in monotonic time for suppression windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    /// Duration since `earlier`, or zero if `earlier` is later than `self`
    pub fn duration_since(&self, earlier: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }

    pub fn checked_add(&self, duration: Duration) -> Option<MonotonicInstant> {
        self.0.checked_add(duration).map(MonotonicInstant)
    }

    /// Returns duration until `self`, or zero if `self` is in the past
    pub fn saturating_duration_until(&self, from: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(from.0)
    }
}

impl std::ops::Add<Duration> for MonotonicInstant {
    type Output = MonotonicInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        MonotonicInstant(self.0 + rhs)
    }
}
