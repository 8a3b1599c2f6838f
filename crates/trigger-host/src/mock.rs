//! Recording collaborators for tests

use std::sync::{Arc, Mutex, MutexGuard};

use trigger_api::{Notification, ProviderStatus};
use trigger_util::TriggerId;

use crate::{HostResult, NotificationSink, StatusReporter};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sink that keeps every notification in memory.
///
/// Clones share the same buffer, so a test can hand one clone to the code
/// under test and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    emitted: Arc<Mutex<Vec<(TriggerId, Notification)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> Vec<(TriggerId, Notification)> {
        lock(&self.emitted).clone()
    }

    /// Event names in emission order
    pub fn events(&self) -> Vec<String> {
        lock(&self.emitted)
            .iter()
            .map(|(_, n)| n.event.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.emitted).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.emitted).is_empty()
    }

    pub fn clear(&self) {
        lock(&self.emitted).clear();
    }
}

impl NotificationSink for RecordingSink {
    fn emit(&mut self, trigger_id: &TriggerId, notification: &Notification) -> HostResult<()> {
        lock(&self.emitted).push((trigger_id.clone(), notification.clone()));
        Ok(())
    }
}

/// Status reporter that keeps the full history
#[derive(Debug, Clone, Default)]
pub struct RecordingStatus {
    history: Arc<Mutex<Vec<ProviderStatus>>>,
}

impl RecordingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<ProviderStatus> {
        lock(&self.history).clone()
    }

    pub fn latest(&self) -> Option<ProviderStatus> {
        lock(&self.history).last().copied()
    }
}

impl StatusReporter for RecordingStatus {
    fn set_status(&mut self, status: ProviderStatus) {
        lock(&self.history).push(status);
    }
}
