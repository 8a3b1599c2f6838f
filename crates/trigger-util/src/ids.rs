//! Strongly-typed identifiers for signalk-trigger

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Root segment of every tracked-entity context (`vessels.<id>`)
pub const ENTITY_NAMESPACE: &str = "vessels";

/// Alias for the vessel the server runs on
pub const SELF_ENTITY: &str = "self";

/// Stable identifier for a configured trigger
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerId(String);

impl TriggerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier for an unnamed trigger, derived from its position in the config
    pub fn from_index(index: usize) -> Self {
        Self(format!("trigger-{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TriggerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A tracked entity in the data model, e.g. `self` or `urn:mrn:imo:mmsi:230000000`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The `self` vessel
    pub fn self_entity() -> Self {
        Self(SELF_ENTITY.to_string())
    }

    /// Parse a delta context such as `vessels.self`.
    ///
    /// A bare id without the namespace is accepted as-is. Returns `None` for
    /// an empty id or the bare namespace.
    pub fn from_context(context: &str) -> Option<Self> {
        let context = context.trim();
        let id = context
            .strip_prefix(ENTITY_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(context);

        if id.is_empty() || id == ENTITY_NAMESPACE {
            return None;
        }
        Some(Self(id.to_string()))
    }

    pub fn is_self(&self) -> bool {
        self.0 == SELF_ENTITY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full delta context for this entity
    pub fn context(&self) -> String {
        format!("{}.{}", ENTITY_NAMESPACE, self.0)
    }

    /// Whether two ids name the same entity, treating `self` as an alias of `self_id`
    pub fn same_entity(&self, other: &EntityId, self_id: Option<&EntityId>) -> bool {
        if self == other {
            return true;
        }
        match self_id {
            Some(real) => {
                (self.is_self() && other == real) || (other.is_self() && self == real)
            }
            None => false,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for an emitted notification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
