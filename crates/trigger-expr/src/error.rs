//! Compile and evaluation errors

use thiserror::Error;

/// Condition text could not be compiled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct CompileError {
    pub message: String,
    /// Byte offset into the source
    pub offset: usize,
}

impl CompileError {
    pub(crate) fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// A compiled expression failed against a particular context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("cannot apply '{op}' to {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("cannot apply '{op}' to {operand}")]
    InvalidOperand {
        op: &'static str,
        operand: &'static str,
    },

    #[error("unknown transform '{0}'")]
    UnknownTransform(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{name}: {message}")]
    CallFailed { name: String, message: String },
}
