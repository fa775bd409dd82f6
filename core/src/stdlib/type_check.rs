//! Runtime type predicates.

use serde_json::Value;

use super::apply::apply;
use super::datetime::parse_timestamp;
use crate::evaluator::{EvalResult, Options};
use crate::expression::{Expression, ExpressionEvaluator};
use crate::memory::Memory;
use crate::types::{ReturnType, validate};
use crate::value::Num;

pub(super) static EVALUATORS: &[ExpressionEvaluator] = &[
    ExpressionEvaluator::new("isBoolean", evaluate_is_boolean, ReturnType::BOOLEAN, validate::unary),
    ExpressionEvaluator::new("isString", evaluate_is_string, ReturnType::BOOLEAN, validate::unary),
    ExpressionEvaluator::new("isInteger", evaluate_is_integer, ReturnType::BOOLEAN, validate::unary),
    ExpressionEvaluator::new("isFloat", evaluate_is_float, ReturnType::BOOLEAN, validate::unary),
    ExpressionEvaluator::new("isArray", evaluate_is_array, ReturnType::BOOLEAN, validate::unary),
    ExpressionEvaluator::new("isObject", evaluate_is_object, ReturnType::BOOLEAN, validate::unary),
    ExpressionEvaluator::new("isDateTime", evaluate_is_date_time, ReturnType::BOOLEAN, validate::unary),
];

fn predicate(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    test: fn(&Value) -> bool,
) -> EvalResult {
    apply(expression, memory, options, None, |args| Value::Bool(test(&args[0])))
}

fn evaluate_is_boolean(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    predicate(expression, memory, options, Value::is_boolean)
}

fn evaluate_is_string(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    predicate(expression, memory, options, Value::is_string)
}

fn evaluate_is_integer(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    predicate(expression, memory, options, |value| {
        matches!(Num::from_value(value), Some(Num::Int(_)))
    })
}

fn evaluate_is_float(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    predicate(expression, memory, options, |value| {
        matches!(Num::from_value(value), Some(Num::Float(_)))
    })
}

fn evaluate_is_array(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    predicate(expression, memory, options, Value::is_array)
}

fn evaluate_is_object(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    predicate(expression, memory, options, Value::is_object)
}

/// Strings holding a parseable timestamp.
fn evaluate_is_date_time(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    predicate(expression, memory, options, |value| {
        value.as_str().and_then(parse_timestamp).is_some()
    })
}
