//! Startup silence and debouncing

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use trigger_api::TransitionType;
use trigger_util::{Debouncer, MonotonicInstant};

/// Why a notification was not emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionReason {
    /// Still inside the quiet period after configure
    StartupSilence,
    /// Same event and transition emitted within the debounce window
    Debounced,
}

impl fmt::Display for SuppressionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StartupSilence => "startup silence",
            Self::Debounced => "debounced",
        })
    }
}

/// Quiet period after configuration.
///
/// Starts silenced and is released either by a timer holding a
/// [`StartupRelease`] or lazily by the first check past the deadline. Once
/// released it never silences again.
#[derive(Debug, Clone)]
pub struct StartupGate {
    silenced: Arc<AtomicBool>,
    /// `None` when the deadline is beyond what the clock can represent
    deadline: Option<MonotonicInstant>,
}

impl StartupGate {
    /// A zero duration yields a gate that never silences
    pub fn new(duration: Duration, now: MonotonicInstant) -> Self {
        Self {
            silenced: Arc::new(AtomicBool::new(!duration.is_zero())),
            deadline: now.checked_add(duration),
        }
    }

    pub fn is_silenced(&self, now: MonotonicInstant) -> bool {
        if !self.silenced.load(Ordering::Acquire) {
            return false;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.silenced.store(false, Ordering::Release);
                false
            }
            _ => true,
        }
    }

    pub fn release(&self) {
        self.silenced.store(false, Ordering::Release);
    }

    /// Handle for a timer task to release this gate
    pub fn release_handle(&self) -> StartupRelease {
        StartupRelease(Arc::clone(&self.silenced))
    }

    /// Time left until the deadline (zero once released)
    pub fn remaining(&self, now: MonotonicInstant) -> Duration {
        if self.is_silenced(now) {
            self.deadline
                .map(|deadline| deadline.saturating_duration_until(now))
                .unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }
}

/// Sendable handle that releases a [`StartupGate`]
#[derive(Debug, Clone)]
pub struct StartupRelease(Arc<AtomicBool>);

impl StartupRelease {
    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Startup gate plus per-(event, transition) debounce
#[derive(Debug)]
pub struct SuppressionGate {
    startup: StartupGate,
    debounce: Debouncer<(String, TransitionType)>,
}

impl SuppressionGate {
    pub fn new(startup_silence: Duration, debounce: Duration, now: MonotonicInstant) -> Self {
        Self {
            startup: StartupGate::new(startup_silence, now),
            debounce: Debouncer::new(debounce),
        }
    }

    /// Gate with no suppression at all
    pub fn open(now: MonotonicInstant) -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, now)
    }

    pub fn startup(&self) -> &StartupGate {
        &self.startup
    }

    /// Decide whether a notification may go out. Startup silence is checked
    /// first and does not touch debounce records.
    pub fn check(
        &mut self,
        event: &str,
        transition: TransitionType,
        now: MonotonicInstant,
    ) -> Result<(), SuppressionReason> {
        if self.startup.is_silenced(now) {
            return Err(SuppressionReason::StartupSilence);
        }
        if !self.debounce.check(&(event.to_string(), transition), now) {
            return Err(SuppressionReason::Debounced);
        }
        Ok(())
    }

    /// Drop debounce records whose window has passed
    pub fn cleanup(&mut self, now: MonotonicInstant) {
        self.debounce.cleanup(now);
    }

    pub fn debounce_records(&self) -> usize {
        self.debounce.len()
    }
}
