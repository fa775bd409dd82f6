//! Equality and ordering operators.

use core::cmp::Ordering;

use serde_json::Value;

use super::apply::{apply, apply_with_error, verify_number_or_string};
use crate::evaluator::{EvalError, EvalResult, Options};
use crate::expression::{Expression, ExpressionEvaluator};
use crate::memory::Memory;
use crate::types::{ReturnType, ValidationError, validate};
use crate::value::{compare, values_equal};

pub(super) static EVALUATORS: &[ExpressionEvaluator] = &[
    ExpressionEvaluator::new("==", evaluate_equal, ReturnType::BOOLEAN, validate::binary)
        .with_aliases(&["equals"]),
    ExpressionEvaluator::new("!=", evaluate_not_equal, ReturnType::BOOLEAN, validate::binary)
        .with_aliases(&["notEquals"]),
    ExpressionEvaluator::new("<", evaluate_less, ReturnType::BOOLEAN, validate_ordering)
        .with_aliases(&["less"]),
    ExpressionEvaluator::new("<=", evaluate_less_or_equal, ReturnType::BOOLEAN, validate_ordering)
        .with_aliases(&["lessOrEquals"]),
    ExpressionEvaluator::new(">", evaluate_greater, ReturnType::BOOLEAN, validate_ordering)
        .with_aliases(&["greater"]),
    ExpressionEvaluator::new(
        ">=",
        evaluate_greater_or_equal,
        ReturnType::BOOLEAN,
        validate_ordering,
    )
    .with_aliases(&["greaterOrEquals"]),
    ExpressionEvaluator::new("exists", evaluate_exists, ReturnType::BOOLEAN, validate::unary),
];

fn validate_ordering(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity_and_any_type(
        expression,
        2,
        Some(2),
        ReturnType::NUMBER | ReturnType::STRING,
    )
}

fn evaluate_equal(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, None, |args| {
        Value::Bool(values_equal(&args[0], &args[1]))
    })
}

fn evaluate_not_equal(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, None, |args| {
        Value::Bool(!values_equal(&args[0], &args[1]))
    })
}

/// Compare the two children and test the ordering with `accept`.
fn ordering(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    accept: fn(Ordering) -> bool,
) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_number_or_string), |args| {
        match compare(&args[0], &args[1]) {
            Some(order) => Ok(Value::Bool(accept(order))),
            None => Err(EvalError::new(format!(
                "{} and {} must be both numbers or both strings in {}.",
                args[0], args[1], expression
            ))),
        }
    })
}

fn evaluate_less(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    ordering(expression, memory, options, Ordering::is_lt)
}

fn evaluate_less_or_equal(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    ordering(expression, memory, options, Ordering::is_le)
}

fn evaluate_greater(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    ordering(expression, memory, options, Ordering::is_gt)
}

fn evaluate_greater_or_equal(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> EvalResult {
    ordering(expression, memory, options, Ordering::is_ge)
}

fn evaluate_exists(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, None, |args| Value::Bool(!args[0].is_null()))
}
