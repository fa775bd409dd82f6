//! Regular-expression matching.

use ::regex::Regex;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde_json::Value;

use super::apply::{apply_with_error, text_or_empty, verify_string, verify_string_or_null};
use crate::evaluator::{EvalError, EvalResult, Options};
use crate::expression::{Expression, ExpressionEvaluator};
use crate::memory::Memory;
use crate::types::{ReturnType, ValidationError, validate};

/// Compiled patterns, keyed by source text.
static PATTERNS: Lazy<DashMap<String, Regex>> = Lazy::new(DashMap::new);

pub(super) static EVALUATORS: &[ExpressionEvaluator] = &[ExpressionEvaluator::new(
    "isMatch",
    evaluate_is_match,
    ReturnType::BOOLEAN,
    validate_is_match,
)];

/// `isMatch(text, pattern)`; a constant pattern is compiled at parse time.
fn validate_is_match(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(expression, &[], &[ReturnType::STRING, ReturnType::STRING])?;
    if let Some(Value::String(pattern)) = expression.children()[1].as_constant() {
        compiled(pattern).map_err(|err| ValidationError::invalid(expression, err.message()))?;
    }
    Ok(())
}

fn compiled(pattern: &str) -> Result<Regex, EvalError> {
    if let Some(regex) = PATTERNS.get(pattern) {
        return Ok(regex.clone());
    }
    let regex = Regex::new(pattern)
        .map_err(|err| EvalError::new(format!("'{}' is not a valid regular expression: {}", pattern, err)))?;
    PATTERNS.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

fn verify_arguments(value: &Value, child: &Expression, index: usize) -> Result<(), EvalError> {
    if index == 0 {
        verify_string_or_null(value, child, index)
    } else {
        verify_string(value, child, index)
    }
}

fn evaluate_is_match(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_arguments), |args| {
        let regex = compiled(text_or_empty(&args[1]))?;
        Ok(Value::Bool(regex.is_match(text_or_empty(&args[0]))))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiled_patterns_are_cached() {
        let first = compiled("^ab+c$").unwrap();
        assert!(first.is_match("abbbc"));
        assert!(PATTERNS.contains_key("^ab+c$"));
        assert!(compiled("^ab+c$").unwrap().is_match("abc"));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let err = compiled("(unclosed").unwrap_err();
        assert!(err.message().contains("not a valid regular expression"));
    }
}
