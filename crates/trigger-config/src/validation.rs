//! Configuration validation

use crate::schema::{RawConfig, RawEngineConfig};
use std::collections::HashSet;
use thiserror::Error;
use trigger_util::EntityId;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Variable '{name}': {message}")]
    VariableError { name: String, message: String },

    #[error("Duplicate variable name: {0}")]
    DuplicateVariable(String),

    #[error("Invalid {field}: {value} (must be a finite, non-negative number of seconds)")]
    InvalidDuration { field: &'static str, value: f64 },

    #[error("Engine config error: {0}")]
    EngineError(String),
}

/// Words the expression language reserves; a variable with one of these names
/// could never be referenced.
const RESERVED_WORDS: &[&str] = &["true", "false", "null", "undefined", "in"];

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = validate_engine(&config.engine);

    let mut seen_names = HashSet::new();
    for variable in &config.variables {
        if !variable.name.is_empty() && !seen_names.insert(&variable.name) {
            errors.push(ValidationError::DuplicateVariable(variable.name.clone()));
        }
    }

    for variable in &config.variables {
        if let Err(message) = validate_variable_name(&variable.name) {
            errors.push(ValidationError::VariableError {
                name: variable.name.clone(),
                message,
            });
        }
        if let Err(message) = validate_path(&variable.path) {
            errors.push(ValidationError::VariableError {
                name: variable.name.clone(),
                message,
            });
        }
    }

    errors
}

fn validate_engine(engine: &RawEngineConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("startup_silence_seconds", engine.startup_silence_seconds),
        ("debounce_seconds", engine.debounce_seconds),
    ] {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                errors.push(ValidationError::InvalidDuration { field, value });
            }
        }
    }

    if let Some(self_id) = &engine.self_id {
        if self_id.trim().is_empty() {
            errors.push(ValidationError::EngineError("self_id cannot be empty".into()));
        } else if EntityId::from_context(self_id).is_none() {
            errors.push(ValidationError::EngineError(format!(
                "self_id '{}' does not name a vessel",
                self_id
            )));
        }
    }

    errors
}

/// A variable name must be a plain identifier in the expression language
pub fn validate_variable_name(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err("name cannot be empty".into());
    };
    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return Err(format!("name must start with a letter, '_' or '$', not '{}'", first));
    }
    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '$')) {
        return Err(format!("name cannot contain '{}'", bad));
    }
    if RESERVED_WORDS.contains(&name) {
        return Err(format!("'{}' is a reserved word", name));
    }
    Ok(())
}

/// A data-model path: non-empty, dot-separated, no empty segments
pub fn validate_path(path: &str) -> Result<(), String> {
    if path.trim().is_empty() {
        return Err("path cannot be empty".into());
    }
    if path.split('.').any(|segment| segment.trim().is_empty()) {
        return Err(format!("path '{}' has an empty segment", path));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trigger_api::VariableMapping;

    fn config_with(variables: Vec<VariableMapping>, engine: RawEngineConfig) -> RawConfig {
        RawConfig {
            config_version: 1,
            engine,
            variables,
            triggers: vec![],
        }
    }

    #[test]
    fn test_variable_names() {
        assert!(validate_variable_name("speed").is_ok());
        assert!(validate_variable_name("_depth2").is_ok());
        assert!(validate_variable_name("$x").is_ok());
        assert!(validate_variable_name("").is_err());
        assert!(validate_variable_name("2fast").is_err());
        assert!(validate_variable_name("nav.speed").is_err());
        assert!(validate_variable_name("in").is_err());
    }

    #[test]
    fn test_paths() {
        assert!(validate_path("navigation.speedOverGround.value").is_ok());
        assert!(validate_path("").is_err());
        assert!(validate_path("navigation..value").is_err());
        assert!(validate_path(".navigation").is_err());
    }

    #[test]
    fn test_duplicate_variable_detection() {
        let config = config_with(
            vec![
                VariableMapping::new("speed", "navigation.speedOverGround.value"),
                VariableMapping::new("speed", "navigation.speedThroughWater.value"),
            ],
            RawEngineConfig::default(),
        );

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ValidationError::DuplicateVariable(name) if name == "speed"));
    }

    #[test]
    fn test_durations() {
        let config = config_with(
            vec![],
            RawEngineConfig {
                startup_silence_seconds: Some(f64::NAN),
                debounce_seconds: Some(-0.5),
                self_id: None,
            },
        );

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::InvalidDuration { .. })));
    }

    #[test]
    fn test_self_id() {
        let empty = config_with(
            vec![],
            RawEngineConfig {
                self_id: Some("  ".into()),
                ..Default::default()
            },
        );
        assert_eq!(validate_config(&empty).len(), 1);

        let bare_namespace = config_with(
            vec![],
            RawEngineConfig {
                self_id: Some("vessels".into()),
                ..Default::default()
            },
        );
        assert_eq!(validate_config(&bare_namespace).len(), 1);

        let ok = config_with(
            vec![],
            RawEngineConfig {
                self_id: Some("urn:mrn:imo:mmsi:230000000".into()),
                ..Default::default()
            },
        );
        assert!(validate_config(&ok).is_empty());
    }
}
