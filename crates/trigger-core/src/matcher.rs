//! Matching delta paths against trigger dependencies

use std::collections::HashSet;

use trigger_api::UpdateBatch;
use trigger_util::EntityId;

/// Entity and paths touched by one update batch
#[derive(Debug, Clone)]
pub struct TouchedPaths {
    entity: EntityId,
    paths: HashSet<String>,
}

impl TouchedPaths {
    /// Collect touched paths. An empty path contributes one path per key of
    /// its object value. Returns `None` if the batch names no entity.
    pub fn from_batch(batch: &UpdateBatch) -> Option<Self> {
        let entity = batch.entity()?;
        let mut paths = HashSet::new();
        for (path, value) in batch.values() {
            if path.is_empty() {
                if let Some(fields) = value.as_object() {
                    paths.extend(fields.keys().cloned());
                }
            } else {
                paths.insert(path.to_string());
            }
        }
        Some(Self { entity, paths })
    }

    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Whether any dependency was touched (exact string match)
    pub fn touches(&self, dependencies: &[String]) -> bool {
        dependencies.iter().any(|d| self.paths.contains(d))
    }

    /// Whether the batch is about `entity`, treating `self` as an alias of `self_id`
    pub fn applies_to(&self, entity: &EntityId, self_id: Option<&EntityId>) -> bool {
        self.entity.same_entity(entity, self_id)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
