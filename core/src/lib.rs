//! An embeddable expression language evaluated against host state.
//!
//! Source text is tokenized ([`lexer`]), parsed into an immutable
//! [`Expression`] tree with every call resolved against the builtin
//! [`FunctionTable`] and validated ([`parser`]), then evaluated against a
//! [`Memory`] ([`evaluator`]). Evaluation yields a value or a soft
//! [`EvalError`]; parse failures are fatal [`ParseError`]s.
//!
//! ```
//! use adaptive_expressions_core::{Options, SimpleObjectMemory, parse};
//! use serde_json::json;
//!
//! let expression = parse("where(scores, s => s > 2)").unwrap();
//! let mut memory = SimpleObjectMemory::new(json!({"scores": [1, 2, 3, 4]}));
//! let value = expression.try_evaluate(&mut memory, &Options::default()).unwrap();
//! assert_eq!(value, json!([3, 4]));
//! ```

use std::sync::Arc;

pub mod api;
pub mod cache;
pub mod evaluator;
pub mod expression;
pub mod lexer;
pub mod memory;
pub mod parser;
pub mod stdlib;
pub mod types;
pub mod value;

pub use cache::ParseCache;
pub use evaluator::{EvalError, EvalResult, Options};
pub use expression::{Expression, ExpressionEvaluator};
pub use memory::{Memory, MemoryError, SimpleObjectMemory, StackedMemory};
pub use parser::{ParseError, ParseErrorKind, Span};
pub use stdlib::FunctionTable;
pub use types::{ReturnType, ValidationError};

/// Parse `source` through the process-wide cache.
///
/// Identical source text yields the same shared tree.
pub fn parse(source: &str) -> Result<Arc<Expression>, ParseError> {
    ParseCache::global().get_or_parse(source)
}

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_sort_by_key() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
