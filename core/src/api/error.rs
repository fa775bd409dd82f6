//! Public error types for the engine API.
//!
//! Internal errors are converted to these types at the API boundary.

use std::fmt;

use crate::evaluator::EvalError;
use crate::parser::{ParseError, Span};

/// Error type for all engine operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Parse-time failures: syntax, unknown functions, arity and type checks.
    ///
    /// Contains one or more diagnostics with source locations.
    Compilation {
        diagnostics: Vec<Diagnostic>,
        source: String,
    },

    /// Soft errors raised while evaluating (e.g., division by zero).
    Runtime(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Compilation { diagnostics, .. } => match diagnostics.as_slice() {
                [only] => write!(f, "{}", only),
                _ => {
                    let error_count = diagnostics
                        .iter()
                        .filter(|d| d.severity == Severity::Error)
                        .count();
                    write!(f, "Compilation failed with {} error(s)", error_count)
                }
            },
            Error::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level (error, warning, info).
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the primary issue.
    pub span: Span,

    /// Suggestions for fixing the issue.
    pub help: Vec<String>,

    /// Optional error code (e.g., "P001") for documentation lookup.
    pub code: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }
        for help_msg in &self.help {
            write!(f, "\nhelp: {}", help_msg)?;
        }
        Ok(())
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - compilation cannot succeed.
    Error,
    /// Warning - suspicious code that might be wrong.
    Warning,
    /// Info - informational message.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

// ============================================================================
// Conversion from internal errors
// ============================================================================

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Compilation {
            diagnostics: vec![err.to_diagnostic()],
            source: err.source,
        }
    }
}

impl From<EvalError> for Error {
    fn from(err: EvalError) -> Self {
        Error::Runtime(err.message().to_string())
    }
}
