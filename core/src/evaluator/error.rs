//! Soft evaluation errors.
//!
//! Evaluation never panics on data-shape problems. A failing node returns an
//! [`EvalError`] carrying a human-readable message; ancestors pass it up
//! unchanged unless they deliberately absorb it (the logical connectives).

use serde_json::Value;
use thiserror::Error;

use crate::memory::MemoryError;

/// A human-readable evaluation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EvalError {
    message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<MemoryError> for EvalError {
    fn from(err: MemoryError) -> Self {
        EvalError::new(err.to_string())
    }
}

impl From<String> for EvalError {
    fn from(message: String) -> Self {
        EvalError::new(message)
    }
}

impl From<&str> for EvalError {
    fn from(message: &str) -> Self {
        EvalError::new(message)
    }
}

/// The outcome of evaluating one node.
///
/// "No value" is `Ok(Value::Null)`, which is not an error.
pub type EvalResult = Result<Value, EvalError>;
