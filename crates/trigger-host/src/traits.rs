//! Collaborator traits

use std::borrow::Cow;

use thiserror::Error;
use trigger_api::{Notification, ProviderStatus};
use trigger_util::{EntityId, TriggerId};

/// Errors from host-side delivery
#[derive(Debug, Error)]
pub enum HostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type HostResult<T> = Result<T, HostError>;

/// Read access to the host's data model
pub trait SnapshotReader {
    /// Full object tree for one entity, or `None` if nothing is known about it.
    /// In-process models hand out a borrow; remote ones an owned copy.
    fn entity_snapshot(&self, entity: &EntityId) -> Option<Cow<'_, serde_json::Value>>;
}

/// Destination for notifications (the host's event bus)
pub trait NotificationSink: Send {
    fn emit(&mut self, trigger_id: &TriggerId, notification: &Notification) -> HostResult<()>;
}

/// Coarse status display
pub trait StatusReporter: Send {
    fn set_status(&mut self, status: ProviderStatus);
}
