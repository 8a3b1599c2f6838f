//! Trigger specification types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which transitions of a condition a trigger reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerMode {
    /// false -> true only
    #[default]
    Rising,
    /// true -> false only
    Falling,
    /// Both edges
    Both,
    /// Both edges, plus every dependency change while the condition holds
    Always,
}

impl TriggerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rising => "RISING",
            Self::Falling => "FALLING",
            Self::Both => "BOTH",
            Self::Always => "ALWAYS",
        }
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown trigger type '{0}' (expected RISING, FALLING, BOTH or ALWAYS)")]
pub struct ParseTriggerModeError(pub String);

impl FromStr for TriggerMode {
    type Err = ParseTriggerModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RISING" => Ok(Self::Rising),
            "FALLING" => Ok(Self::Falling),
            "BOTH" => Ok(Self::Both),
            "ALWAYS" => Ok(Self::Always),
            _ => Err(ParseTriggerModeError(s.to_string())),
        }
    }
}

/// Kind of transition carried by a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionType {
    Rising,
    Falling,
    /// Condition still holds and one of its inputs changed
    NoChange,
}

impl TransitionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rising => "RISING",
            Self::Falling => "FALLING",
            Self::NoChange => "NO_CHANGE",
        }
    }
}

impl fmt::Display for TransitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse status reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Running,
    NoTriggersSet,
    Stopped,
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "Running",
            Self::NoTriggersSet => "No triggers set",
            Self::Stopped => "Stopped",
        })
    }
}

/// Binds a logical variable name used in conditions to a data-model path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableMapping {
    pub name: String,
    pub path: String,
}

impl VariableMapping {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// A trigger as configured, before compilation.
///
/// Required fields are optional here so that an incomplete trigger can be
/// reported on its own without rejecting the whole configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSpec {
    /// Stable name; defaults to `trigger-<index>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Boolean condition in the expression language
    #[serde(default)]
    pub condition: Option<String>,

    /// Event name to emit
    #[serde(default)]
    pub event: Option<String>,

    /// RISING, FALLING, BOTH or ALWAYS (default RISING)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_type: Option<String>,

    /// Entity that unqualified paths refer to (default `self`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl TriggerSpec {
    pub fn new(condition: impl Into<String>, event: impl Into<String>, mode: TriggerMode) -> Self {
        Self {
            name: None,
            condition: Some(condition.into()),
            event: Some(event.into()),
            trigger_type: Some(mode.as_str().to_string()),
            context: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_mode_parsing() {
        assert_eq!("rising".parse::<TriggerMode>().unwrap(), TriggerMode::Rising);
        assert_eq!(" BOTH ".parse::<TriggerMode>().unwrap(), TriggerMode::Both);
        assert_eq!("Always".parse::<TriggerMode>().unwrap(), TriggerMode::Always);
        assert!("sometimes".parse::<TriggerMode>().is_err());
    }

    #[test]
    fn transition_type_serialization() {
        assert_eq!(
            serde_json::to_string(&TransitionType::NoChange).unwrap(),
            "\"NO_CHANGE\""
        );
        assert_eq!(
            serde_json::to_string(&TransitionType::Rising).unwrap(),
            "\"RISING\""
        );
    }

    #[test]
    fn provider_status_display() {
        assert_eq!(ProviderStatus::Running.to_string(), "Running");
        assert_eq!(ProviderStatus::NoTriggersSet.to_string(), "No triggers set");
        assert_eq!(ProviderStatus::Stopped.to_string(), "Stopped");
    }

    #[test]
    fn trigger_spec_builder() {
        let spec = TriggerSpec::new("speed > 5", "overspeed", TriggerMode::Both)
            .with_name("fast")
            .with_context("self");
        assert_eq!(spec.trigger_type.as_deref(), Some("BOTH"));
        assert_eq!(spec.name.as_deref(), Some("fast"));
        assert_eq!(spec.context.as_deref(), Some("self"));
    }
}
