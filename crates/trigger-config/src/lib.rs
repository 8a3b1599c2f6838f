//! Configuration parsing and validation for signalk-trigger
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Engine settings (startup silence, debounce window, self id)
//! - Variable mappings from logical names to data-model paths
//! - Trigger definitions
//!
//! Global problems fail the load. Problems confined to one trigger are left
//! for the engine to report so the remaining triggers still load.

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<TriggerSettings> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Loading configuration");
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<TriggerSettings> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(TriggerSettings::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn parse_minimal_config() {
        let config = r#"
            config_version = 1

            [[triggers]]
            condition = "navigation.speedOverGround.value > 5"
            event = "overspeed"
        "#;

        let settings = parse_config(config).unwrap();
        assert_eq!(settings.triggers.len(), 1);
        assert!(settings.variables.is_empty());
        assert_eq!(settings.startup_silence, Duration::ZERO);
        assert_eq!(settings.debounce, Duration::ZERO);
        assert_eq!(settings.self_id, None);
    }

    #[test]
    fn parse_full_config() {
        let config = r#"
            config_version = 1

            [engine]
            startup_silence_seconds = 10.0
            debounce_seconds = 2.5
            self_id = "vessels.urn:mrn:imo:mmsi:230000000"

            [[variables]]
            name = "speed"
            path = "vessels.self.navigation.speedOverGround.value"

            [[triggers]]
            name = "overspeed"
            condition = "speed > 5"
            event = "overspeed"
            trigger_type = "BOTH"
            context = "self"
        "#;

        let settings = parse_config(config).unwrap();
        assert_eq!(settings.startup_silence, Duration::from_secs(10));
        assert_eq!(settings.debounce, Duration::from_millis(2500));
        assert_eq!(
            settings.self_id.as_ref().map(|id| id.as_str()),
            Some("urn:mrn:imo:mmsi:230000000")
        );
        assert_eq!(settings.variables[0].name, "speed");
        assert_eq!(settings.triggers[0].name.as_deref(), Some("overspeed"));
        assert_eq!(settings.triggers[0].trigger_type.as_deref(), Some("BOTH"));
    }

    #[test]
    fn incomplete_trigger_is_not_fatal() {
        let config = r#"
            config_version = 1

            [[triggers]]
            condition = "x > 1"

            [[triggers]]
            condition = "y > 1"
            event = "y-high"
            trigger_type = "SIDEWAYS"
        "#;

        let settings = parse_config(config).unwrap();
        assert_eq!(settings.triggers.len(), 2);
        assert_eq!(settings.triggers[0].event, None);
    }

    #[test]
    fn reject_wrong_version() {
        let config = r#"
            config_version = 99
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_toml() {
        let result = parse_config("config_version = ");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn reject_global_problems() {
        let config = r#"
            config_version = 1

            [engine]
            debounce_seconds = -1.0

            [[variables]]
            name = "speed"
            path = "navigation.speedOverGround.value"

            [[variables]]
            name = "speed"
            path = "navigation.speedThroughWater.value"
        "#;

        match parse_config(config) {
            Err(ConfigError::ValidationFailed { errors }) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "config_version = 1\n\n[[triggers]]\ncondition = \"a\"\nevent = \"e\""
        )
        .unwrap();

        let settings = load_config(file.path()).unwrap();
        assert_eq!(settings.triggers.len(), 1);
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }
}
