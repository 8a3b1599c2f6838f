//! Signal K delta messages (update batches)

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Map;
use trigger_util::{EntityId, TriggerError};

/// One atomic change notification for a tracked entity.
///
/// Mirrors the Signal K delta format:
/// `{"context": "vessels.self", "updates": [{"values": [{"path": .., "value": ..}]}]}`.
/// A missing context means the `self` vessel. Fields not modelled here
/// (`requestId`, `updates[].source`, `updates[].meta`, ..) are kept in `extra`
/// so a batch serializes back to what was received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateBatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default)]
    pub updates: Vec<Update>,

    #[serde(flatten)]
    pub extra: Map<String, serde_json::Value>,
}

/// A group of values sharing one source and timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    #[serde(rename = "$source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub values: Vec<PathValue>,

    #[serde(flatten)]
    pub extra: Map<String, serde_json::Value>,
}

/// A changed path and its new value.
///
/// Both fields are optional on the wire so that malformed deltas can be
/// reported instead of failing to parse. A JSON `null` value is present
/// (`Some(Value::Null)`); only a missing key is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<serde_json::Value>,

    #[serde(flatten)]
    pub extra: Map<String, serde_json::Value>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl PathValue {
    pub fn new(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            path: Some(path.into()),
            value: Some(value),
            extra: Map::new(),
        }
    }
}

impl UpdateBatch {
    /// Batch with a single update for `context`
    pub fn new(context: impl Into<String>, values: Vec<PathValue>) -> Self {
        Self {
            context: Some(context.into()),
            updates: vec![Update {
                source: None,
                timestamp: None,
                values,
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }

    /// Entity this batch refers to; `self` when no context is given
    pub fn entity(&self) -> Option<EntityId> {
        match &self.context {
            Some(context) => EntityId::from_context(context),
            None => Some(EntityId::self_entity()),
        }
    }

    /// Check that every value carries a path and a value, and that the
    /// context names an entity.
    pub fn validate(&self) -> Result<(), TriggerError> {
        if self.entity().is_none() {
            return Err(TriggerError::malformed(format!(
                "invalid context {:?}",
                self.context.as_deref().unwrap_or_default()
            )));
        }

        if self.updates.is_empty() {
            return Err(TriggerError::malformed("delta has no updates"));
        }

        for (u, update) in self.updates.iter().enumerate() {
            for (v, entry) in update.values.iter().enumerate() {
                let Some(path) = &entry.path else {
                    return Err(TriggerError::malformed(format!(
                        "updates[{}].values[{}] has no path",
                        u, v
                    )));
                };
                let Some(value) = &entry.value else {
                    return Err(TriggerError::malformed(format!(
                        "updates[{}].values[{}] ({}) has no value",
                        u, v, path
                    )));
                };
                if path.is_empty() && !value.is_object() {
                    return Err(TriggerError::malformed(format!(
                        "updates[{}].values[{}] has an empty path but a non-object value",
                        u, v
                    )));
                }
            }
        }

        Ok(())
    }

    /// Iterate over `(path, value)` pairs across all updates, skipping
    /// incomplete entries.
    pub fn values(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.updates
            .iter()
            .flat_map(|u| u.values.iter())
            .filter_map(|pv| match (&pv.path, &pv.value) {
                (Some(path), Some(value)) => Some((path.as_str(), value)),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_signalk_delta() {
        let delta: UpdateBatch = serde_json::from_value(json!({
            "context": "vessels.urn:mrn:imo:mmsi:230000000",
            "updates": [{
                "$source": "n2k.115",
                "timestamp": "2024-05-01T10:00:00.000Z",
                "values": [
                    {"path": "navigation.speedOverGround", "value": 3.85},
                    {"path": "", "value": {"name": "Aurora"}}
                ]
            }]
        }))
        .unwrap();

        assert_eq!(delta.entity(), Some(EntityId::new("urn:mrn:imo:mmsi:230000000")));
        assert_eq!(delta.updates[0].source.as_deref(), Some("n2k.115"));
        assert!(delta.validate().is_ok());
        assert_eq!(delta.values().count(), 2);
    }

    #[test]
    fn unmodelled_fields_survive_round_trip() {
        let raw = json!({
            "context": "vessels.self",
            "requestId": "abc",
            "updates": [{
                "source": {"label": "n2k", "src": "3"},
                "$source": "n2k.3",
                "timestamp": "2024-05-01T10:00:00.000Z",
                "meta": [{"path": "navigation.speedOverGround", "value": {"units": "m/s"}}],
                "values": [{"path": "navigation.speedOverGround", "value": 7.0, "quality": 1}]
            }]
        });
        let delta: UpdateBatch = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(delta.extra["requestId"], json!("abc"));
        assert_eq!(delta.updates[0].source.as_deref(), Some("n2k.3"));
        assert!(delta.updates[0].extra.contains_key("meta"));
        assert_eq!(serde_json::to_value(&delta).unwrap(), raw);
    }

    #[test]
    fn missing_context_is_self() {
        let delta: UpdateBatch = serde_json::from_value(json!({
            "updates": [{"values": [{"path": "a", "value": 1}]}]
        }))
        .unwrap();
        assert_eq!(delta.entity(), Some(EntityId::self_entity()));
    }

    #[test]
    fn null_value_is_present() {
        let delta: UpdateBatch = serde_json::from_value(json!({
            "updates": [{"values": [{"path": "notifications.mob", "value": null}]}]
        }))
        .unwrap();
        assert_eq!(delta.updates[0].values[0].value, Some(serde_json::Value::Null));
        assert!(delta.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let no_value: UpdateBatch = serde_json::from_value(json!({
            "updates": [{"values": [{"path": "a"}]}]
        }))
        .unwrap();
        assert!(matches!(
            no_value.validate(),
            Err(TriggerError::MalformedUpdateBatch(_))
        ));

        let no_path: UpdateBatch = serde_json::from_value(json!({
            "updates": [{"values": [{"value": 1}]}]
        }))
        .unwrap();
        assert!(no_path.validate().is_err());

        let no_updates = UpdateBatch::default();
        assert!(no_updates.validate().is_err());

        let scalar_root = UpdateBatch::new("vessels.self", vec![PathValue::new("", json!(3))]);
        assert!(scalar_root.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_context() {
        let delta = UpdateBatch::new("vessels", vec![PathValue::new("a", json!(1))]);
        assert!(delta.validate().is_err());
    }
}
