//! Notifications emitted by the engine

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use trigger_util::{NotificationId, TriggerId};

use crate::{TransitionType, UpdateBatch, API_VERSION};

/// Payload handed to the host's event bus: `{event, type, value}`.
///
/// `value` is the update batch that caused the notification, unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub event: String,
    #[serde(rename = "type")]
    pub transition: TransitionType,
    pub value: UpdateBatch,
}

/// Notification envelope written by the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub api_version: u32,
    pub id: NotificationId,
    pub timestamp: DateTime<Local>,
    pub trigger_id: TriggerId,
    pub notification: Notification,
}

impl NotificationEvent {
    pub fn new(trigger_id: TriggerId, notification: Notification) -> Self {
        Self {
            api_version: API_VERSION,
            id: NotificationId::new(),
            timestamp: trigger_util::now(),
            trigger_id,
            notification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathValue;
    use serde_json::json;

    #[test]
    fn notification_wire_shape() {
        let batch = UpdateBatch::new(
            "vessels.self",
            vec![PathValue::new("navigation.speedOverGround", json!(7.2))],
        );
        let notification = Notification {
            event: "overspeed".into(),
            transition: TransitionType::Rising,
            value: batch,
        };

        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["event"], "overspeed");
        assert_eq!(json["type"], "RISING");
        assert_eq!(json["value"]["context"], "vessels.self");
        assert_eq!(
            json["value"]["updates"][0]["values"][0]["path"],
            "navigation.speedOverGround"
        );
    }

    #[test]
    fn envelope_carries_version() {
        let notification = Notification {
            event: "e".into(),
            transition: TransitionType::NoChange,
            value: UpdateBatch::default(),
        };
        let event = NotificationEvent::new(TriggerId::new("t"), notification);
        assert_eq!(event.api_version, API_VERSION);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["notification"]["type"], "NO_CHANGE");
        assert_eq!(json["trigger_id"], "t");
    }
}
