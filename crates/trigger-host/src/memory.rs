//! In-memory Signal K data model

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use trigger_api::UpdateBatch;
use trigger_util::{EntityId, TriggerError};

use crate::SnapshotReader;

/// Per-entity object trees built by applying deltas.
///
/// A leaf written through a non-empty path has the full-model shape
/// `{"value": .., "timestamp": .., "$source": ..}`. Values delivered with an
/// empty path are merged into the entity root as-is.
#[derive(Debug, Default)]
pub struct MemoryDataModel {
    entities: HashMap<EntityId, Value>,
    self_id: Option<EntityId>,
}

impl MemoryDataModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `self_id` and `self` as the same entity
    pub fn with_self_id(mut self, self_id: EntityId) -> Self {
        self.self_id = Some(self_id);
        self
    }

    pub fn self_id(&self) -> Option<&EntityId> {
        self.self_id.as_ref()
    }

    fn canonical(&self, entity: &EntityId) -> EntityId {
        if entity.same_entity(&EntityId::self_entity(), self.self_id.as_ref()) {
            EntityId::self_entity()
        } else {
            entity.clone()
        }
    }

    /// Apply one delta. Returns the number of values written.
    pub fn apply(&mut self, batch: &UpdateBatch) -> Result<usize, TriggerError> {
        batch.validate()?;
        let entity = batch
            .entity()
            .ok_or_else(|| TriggerError::malformed("delta has no entity"))?;
        let entity = self.canonical(&entity);
        let root = self
            .entities
            .entry(entity)
            .or_insert_with(|| Value::Object(Map::new()));

        let mut written = 0;
        for update in &batch.updates {
            let timestamp = update
                .timestamp
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

            for entry in &update.values {
                let (Some(path), Some(value)) = (&entry.path, &entry.value) else {
                    continue;
                };

                if path.is_empty() {
                    if let (Value::Object(target), Value::Object(fields)) = (&mut *root, value) {
                        for (key, field) in fields {
                            target.insert(key.clone(), field.clone());
                        }
                    }
                } else {
                    let leaf = descend(root, path);
                    let mut fields = match leaf.take() {
                        Value::Object(existing) => existing,
                        _ => Map::new(),
                    };
                    fields.insert("value".into(), value.clone());
                    fields.insert("timestamp".into(), Value::String(timestamp.clone()));
                    if let Some(source) = &update.source {
                        fields.insert("$source".into(), Value::String(source.clone()));
                    }
                    *leaf = Value::Object(fields);
                }
                written += 1;
            }
        }

        Ok(written)
    }

    /// Current value at `path` (the `.value` of a leaf, or a raw subtree)
    pub fn get(&self, entity: &EntityId, path: &str) -> Option<&Value> {
        let mut current = self.entities.get(&self.canonical(entity))?;
        for key in path.split('.').filter(|k| !k.is_empty()) {
            current = current.get(key)?;
        }
        Some(current.get("value").unwrap_or(current))
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

/// Walk `path` from `root`, replacing non-objects with empty objects on the way
fn descend<'a>(root: &'a mut Value, path: &str) -> &'a mut Value {
    let mut current = root;
    for key in path.split('.') {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map.entry(key).or_insert(Value::Null),
            other => other,
        };
    }
    current
}

impl SnapshotReader for MemoryDataModel {
    fn entity_snapshot(&self, entity: &EntityId) -> Option<Cow<'_, Value>> {
        self.entities.get(&self.canonical(entity)).map(Cow::Borrowed)
    }
}
