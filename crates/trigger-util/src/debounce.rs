//! Per-key debouncing

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use crate::MonotonicInstant;

/// Allows at most one occurrence per key within a sliding window.
///
/// Each key stores only the instant of its last allowed occurrence. Expired
/// entries are purged when the same key is checked again, or in bulk by
/// [`Debouncer::cleanup`].
#[derive(Debug)]
pub struct Debouncer<K> {
    window: Duration,
    last_allowed: HashMap<K, MonotonicInstant>,
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    /// Create a debouncer. A zero window allows everything.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_allowed: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check whether an occurrence of `key` at `now` should be let through.
    ///
    /// Returns `true` if allowed (and records `now` for the key), `false` if
    /// the previous allowed occurrence is still inside the window. A
    /// suppressed check leaves the existing record untouched.
    pub fn check(&mut self, key: &K, now: MonotonicInstant) -> bool {
        if let Some(last) = self.last_allowed.get(key) {
            if now.duration_since(*last) < self.window {
                return false;
            }
            self.last_allowed.remove(key);
        }

        self.last_allowed.insert(key.clone(), now);
        true
    }

    /// Instant of the last allowed occurrence for `key`, if still recorded
    pub fn last_allowed(&self, key: &K) -> Option<MonotonicInstant> {
        self.last_allowed.get(key).copied()
    }

    /// Drop every record whose window has elapsed
    pub fn cleanup(&mut self, now: MonotonicInstant) {
        let window = self.window;
        self.last_allowed
            .retain(|_, last| now.duration_since(*last) < window);
    }

    pub fn clear(&mut self) {
        self.last_allowed.clear();
    }

    pub fn len(&self) -> usize {
        self.last_allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_allowed.is_empty()
    }
}
