//! Tree-walking evaluation.
//!
//! Every node evaluates to an [`EvalResult`]: a value, or a soft
//! [`EvalError`] whose message is meant for the person who wrote the
//! expression. Children are evaluated left to right and the first error wins,
//! except inside the logical connectives and the condition of `if`, where a
//! failing child simply counts as `false`.
//!
//! ## Example
//!
//! ```
//! use adaptive_expressions_core::{evaluator::Options, memory::SimpleObjectMemory, parse};
//! use serde_json::json;
//!
//! let expression = parse("user.name == 'Bob' && count(items) > 1").unwrap();
//! let mut memory = SimpleObjectMemory::new(json!({
//!     "user": {"name": "Bob"},
//!     "items": [1, 2, 3],
//! }));
//! let value = expression.try_evaluate(&mut memory, &Options::default()).unwrap();
//! assert_eq!(value, json!(true));
//! ```

mod error;
mod options;

#[cfg(test)]
mod eval_test;

pub use error::{EvalError, EvalResult};
pub use options::{NullSubstitution, Options};

use serde_json::Value;

use crate::value::Num;

/// Truthiness used by `if`, `!`, `&&`, `||` and `where`.
///
/// `null`, `false`, zero, the empty string and empty collections are false;
/// everything else is true.
pub fn is_logic_true(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(_) => Num::from_value(value).is_some_and(|n| n.as_f64() != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
