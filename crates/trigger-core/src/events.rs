//! Core events emitted by the engine

use trigger_api::{Notification, TransitionType};
use trigger_util::TriggerId;

use crate::SuppressionReason;

/// Outcome of handling one update batch, for the host to dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// Transition passed every gate; emit on the event bus
    Fired {
        trigger_id: TriggerId,
        notification: Notification,
    },

    /// Transition detected but held back
    Suppressed {
        trigger_id: TriggerId,
        event: String,
        transition: TransitionType,
        reason: SuppressionReason,
    },

    /// Condition could not be evaluated; the trigger keeps its previous result
    EvaluationFailed {
        trigger_id: TriggerId,
        message: String,
    },

    /// Batch was malformed and not evaluated
    BatchSkipped { reason: String },
}

impl CoreEvent {
    pub fn trigger_id(&self) -> Option<&TriggerId> {
        match self {
            Self::Fired { trigger_id, .. }
            | Self::Suppressed { trigger_id, .. }
            | Self::EvaluationFailed { trigger_id, .. } => Some(trigger_id),
            Self::BatchSkipped { .. } => None,
        }
    }

    /// The notification, if this event should be emitted
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            Self::Fired { notification, .. } => Some(notification),
            _ => None,
        }
    }
}
