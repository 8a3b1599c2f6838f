//! Error types for signalk-trigger

use thiserror::Error;

use crate::TriggerId;

/// Core error type for trigger configuration and evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriggerError {
    #[error("Invalid trigger '{trigger}': {message}")]
    InvalidTriggerSpec { trigger: TriggerId, message: String },

    #[error("Trigger '{trigger}': cannot compile '{condition}': {message}")]
    ExpressionCompileError {
        trigger: TriggerId,
        condition: String,
        message: String,
    },

    #[error("Unsupported expression node: {kind}")]
    UnsupportedExpressionNode { kind: String },

    #[error("Expression has no syntax tree")]
    InvalidExpressionHandle,

    #[error("Malformed update batch: {0}")]
    MalformedUpdateBatch(String),

    #[error("Trigger '{trigger}': evaluation failed: {message}")]
    EvaluationFailed { trigger: TriggerId, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TriggerError {
    pub fn invalid_spec(trigger: &TriggerId, msg: impl Into<String>) -> Self {
        Self::InvalidTriggerSpec {
            trigger: trigger.clone(),
            message: msg.into(),
        }
    }

    pub fn compile(
        trigger: &TriggerId,
        condition: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::ExpressionCompileError {
            trigger: trigger.clone(),
            condition: condition.into(),
            message: msg.into(),
        }
    }

    pub fn unsupported_node(kind: impl Into<String>) -> Self {
        Self::UnsupportedExpressionNode { kind: kind.into() }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedUpdateBatch(msg.into())
    }

    pub fn evaluation(trigger: &TriggerId, msg: impl Into<String>) -> Self {
        Self::EvaluationFailed {
            trigger: trigger.clone(),
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error only affects configuration of a single trigger
    pub fn is_per_trigger(&self) -> bool {
        matches!(
            self,
            Self::InvalidTriggerSpec { .. }
                | Self::ExpressionCompileError { .. }
                | Self::UnsupportedExpressionNode { .. }
                | Self::EvaluationFailed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TriggerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_trigger() {
        let id = TriggerId::new("overspeed");
        let err = TriggerError::invalid_spec(&id, "missing event");
        assert_eq!(err.to_string(), "Invalid trigger 'overspeed': missing event");

        let err = TriggerError::unsupported_node("FunctionCall");
        assert_eq!(err.to_string(), "Unsupported expression node: FunctionCall");
    }

    #[test]
    fn per_trigger_classification() {
        let id = TriggerId::new("t");
        assert!(TriggerError::compile(&id, "x >", "unexpected end").is_per_trigger());
        assert!(!TriggerError::malformed("no values").is_per_trigger());
        assert!(!TriggerError::InvalidExpressionHandle.is_per_trigger());
    }
}
