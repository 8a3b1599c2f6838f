//! Variable resolution and evaluation contexts

use std::collections::{BTreeMap, HashMap};

use trigger_api::VariableMapping;
use trigger_expr::Value;
use trigger_host::SnapshotReader;
use trigger_util::{ENTITY_NAMESPACE, EntityId};

/// A name resolved to a concrete data-model location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Entity named by a `vessels.<id>` prefix, if there was one
    pub entity: Option<EntityId>,
    /// Path inside the entity, without a trailing `.value`
    pub path: String,
}

/// Maps logical variable names to data-model paths
#[derive(Debug, Clone, Default)]
pub struct ContextResolver {
    mappings: Vec<VariableMapping>,
}

impl ContextResolver {
    pub fn new(mappings: Vec<VariableMapping>) -> Self {
        Self { mappings }
    }

    pub fn mappings(&self) -> &[VariableMapping] {
        &self.mappings
    }

    /// Translate `name` through the mapping: an exact match, or a match on its
    /// leading segment with the remainder appended. Unmapped names pass through.
    pub fn translate(&self, name: &str) -> String {
        if let Some(mapping) = self.mappings.iter().find(|m| m.name == name) {
            return mapping.path.clone();
        }
        if let Some((head, rest)) = name.split_once('.') {
            if let Some(mapping) = self.mappings.iter().find(|m| m.name == head) {
                return format!("{}.{}", mapping.path, rest);
            }
        }
        name.to_string()
    }

    /// Concrete dependency path for an identifier read by a condition
    pub fn resolve_path(&self, name: &str) -> ResolvedPath {
        let translated = self.translate(name);
        let (entity, path) = split_entity(&translated);
        let path = path.strip_suffix(".value").unwrap_or(path);
        let path = if path == "value" { "" } else { path };
        ResolvedPath {
            entity,
            path: path.to_string(),
        }
    }

    /// Evaluation context for `entity`: its snapshot, with every mapped name
    /// bound to the current value at its path (`undefined` when absent).
    pub fn build_context(&self, entity: &EntityId, snapshots: &dyn SnapshotReader) -> Value {
        let read = |id: &EntityId| -> Value {
            snapshots
                .entity_snapshot(id)
                .map(|snapshot| Value::from(snapshot.as_ref()))
                .unwrap_or_default()
        };

        let base = read(entity);
        let mut others: HashMap<EntityId, Value> = HashMap::new();
        let bound: Vec<(String, Value)> = self
            .mappings
            .iter()
            .map(|mapping| {
                let (source_entity, path) = split_entity(&mapping.path);
                let value = match source_entity {
                    Some(other) if &other != entity => {
                        others.entry(other).or_insert_with_key(read).pointer(path).clone()
                    }
                    _ => base.pointer(path).clone(),
                };
                (mapping.name.clone(), value)
            })
            .collect();

        let mut root = match base {
            Value::Object(map) => map,
            _ => BTreeMap::new(),
        };
        root.extend(bound);
        Value::Object(root)
    }
}

/// Split a leading `vessels.<id>` off `path`
fn split_entity(path: &str) -> (Option<EntityId>, &str) {
    let Some(rest) = path
        .strip_prefix(ENTITY_NAMESPACE)
        .and_then(|rest| rest.strip_prefix('.'))
    else {
        return (None, path);
    };
    match rest.split_once('.') {
        Some((id, inner)) if !id.is_empty() => (Some(EntityId::new(id)), inner),
        None if !rest.is_empty() => (Some(EntityId::new(rest)), ""),
        _ => (None, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trigger_api::{PathValue, UpdateBatch};
    use trigger_host::MemoryDataModel;

    fn resolver() -> ContextResolver {
        ContextResolver::new(vec![
            VariableMapping::new("speed", "vessels.self.navigation.speedOverGround.value"),
            VariableMapping::new("nav", "navigation"),
            VariableMapping::new("other", "vessels.buddy.navigation.speedOverGround.value"),
        ])
    }

    #[test]
    fn test_translate() {
        let resolver = resolver();
        assert_eq!(
            resolver.translate("speed"),
            "vessels.self.navigation.speedOverGround.value"
        );
        assert_eq!(
            resolver.translate("nav.courseOverGroundTrue.value"),
            "navigation.courseOverGroundTrue.value"
        );
        assert_eq!(resolver.translate("unmapped.path"), "unmapped.path");
    }

    #[test]
    fn test_resolve_path_strips_namespace_and_value() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve_path("speed"),
            ResolvedPath {
                entity: Some(EntityId::self_entity()),
                path: "navigation.speedOverGround".into(),
            }
        );
        assert_eq!(
            resolver.resolve_path("navigation.speedOverGround.value"),
            ResolvedPath {
                entity: None,
                path: "navigation.speedOverGround".into(),
            }
        );
        assert_eq!(
            resolver.resolve_path("other").entity,
            Some(EntityId::new("buddy"))
        );
    }

    #[test]
    fn test_resolve_path_keeps_inner_value_segments() {
        let resolver = ContextResolver::default();
        assert_eq!(
            resolver.resolve_path("environment.value.depth").path,
            "environment.value.depth"
        );
        assert_eq!(resolver.resolve_path("value").path, "");
    }

    #[test]
    fn test_split_entity() {
        assert_eq!(
            split_entity("vessels.self.a.b"),
            (Some(EntityId::self_entity()), "a.b")
        );
        assert_eq!(split_entity("vessels.self"), (Some(EntityId::self_entity()), ""));
        assert_eq!(split_entity("vesselsx.a"), (None, "vesselsx.a"));
        assert_eq!(split_entity("a.b"), (None, "a.b"));
    }

    #[test]
    fn test_build_context() {
        let mut model = MemoryDataModel::new();
        model
            .apply(&UpdateBatch::new(
                "vessels.self",
                vec![PathValue::new("navigation.speedOverGround", json!(6.5))],
            ))
            .unwrap();
        model
            .apply(&UpdateBatch::new(
                "vessels.buddy",
                vec![PathValue::new("navigation.speedOverGround", json!(1.5))],
            ))
            .unwrap();

        let context = resolver().build_context(&EntityId::self_entity(), &model);

        assert_eq!(context.get("speed"), &Value::Number(6.5));
        assert_eq!(context.get("other"), &Value::Number(1.5));
        assert_eq!(
            context.pointer("navigation.speedOverGround.value"),
            &Value::Number(6.5)
        );
        assert_eq!(
            context.get("nav").pointer("speedOverGround.value"),
            &Value::Number(6.5)
        );
    }

    #[test]
    fn test_build_context_binds_several_paths_of_one_entity() {
        let mut model = MemoryDataModel::new();
        model
            .apply(&UpdateBatch::new(
                "vessels.buddy",
                vec![
                    PathValue::new("navigation.speedOverGround", json!(1.5)),
                    PathValue::new("navigation.courseOverGroundTrue", json!(0.7)),
                ],
            ))
            .unwrap();
        model
            .apply(&UpdateBatch::new(
                "vessels.self",
                vec![PathValue::new("name", json!("Aurora"))],
            ))
            .unwrap();

        let resolver = ContextResolver::new(vec![
            VariableMapping::new("sog", "vessels.buddy.navigation.speedOverGround.value"),
            VariableMapping::new("cog", "vessels.buddy.navigation.courseOverGroundTrue.value"),
            VariableMapping::new("name", "vessels.self.name.value"),
        ]);
        let context = resolver.build_context(&EntityId::self_entity(), &model);

        assert_eq!(context.get("sog"), &Value::Number(1.5));
        assert_eq!(context.get("cog"), &Value::Number(0.7));
        // A mapped name shadows the snapshot key it shares
        assert_eq!(context.get("name"), &Value::String("Aurora".into()));
        assert_eq!(context.pointer("navigation"), &Value::Undefined);
    }

    #[test]
    fn test_build_context_missing_values_are_undefined() {
        let model = MemoryDataModel::new();
        let context = resolver().build_context(&EntityId::self_entity(), &model);
        assert_eq!(context.get("speed"), &Value::Undefined);
        assert_eq!(context.get("other"), &Value::Undefined);
    }
}
