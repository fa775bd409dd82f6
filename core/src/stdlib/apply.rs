//! Evaluation adapters shared by the builtins.
//!
//! Most builtins are "evaluate every child, check the arguments, run a pure
//! function". The adapters here do the first two steps so each builtin only
//! supplies the last one.

use serde_json::Value;

use crate::evaluator::{EvalError, EvalResult, Options};
use crate::expression::Expression;
use crate::memory::Memory;
use crate::value::{Num, is_number};

/// Checks the evaluated argument at `index`.
pub(crate) type VerifyFn = fn(&Value, &Expression, usize) -> Result<(), EvalError>;

/// Evaluate every child left to right, stopping at the first error.
pub(crate) fn evaluate_children(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    verify: Option<VerifyFn>,
) -> Result<Vec<Value>, EvalError> {
    let children = expression.children();
    let mut args = Vec::with_capacity(children.len());
    for (index, child) in children.iter().enumerate() {
        let value = child.try_evaluate(memory, options)?;
        if let Some(verify) = verify {
            verify(&value, child, index)?;
        }
        args.push(value);
    }
    Ok(args)
}

/// Evaluate the children and apply an infallible function.
pub(crate) fn apply(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    verify: Option<VerifyFn>,
    function: impl FnOnce(Vec<Value>) -> Value,
) -> EvalResult {
    let args = evaluate_children(expression, memory, options, verify)?;
    Ok(function(args))
}

/// Evaluate the children and apply a function that may fail softly.
pub(crate) fn apply_with_error(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    verify: Option<VerifyFn>,
    function: impl FnOnce(Vec<Value>) -> EvalResult,
) -> EvalResult {
    let args = evaluate_children(expression, memory, options, verify)?;
    function(args)
}

/// Evaluate the children and reduce them pairwise from the left.
pub(crate) fn apply_sequence(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    verify: Option<VerifyFn>,
    function: impl Fn(Value, Value) -> EvalResult,
) -> EvalResult {
    let args = evaluate_children(expression, memory, options, verify)?;
    let mut args = args.into_iter();
    let first = args.next().unwrap_or(Value::Null);
    args.try_fold(first, function)
}

// ============================================================================
// Argument verifiers
// ============================================================================

pub(crate) fn verify_number(value: &Value, child: &Expression, _: usize) -> Result<(), EvalError> {
    if is_number(value) {
        Ok(())
    } else {
        Err(EvalError::new(format!("{} is not a number.", child)))
    }
}

pub(crate) fn verify_integer(value: &Value, child: &Expression, _: usize) -> Result<(), EvalError> {
    if matches!(Num::from_value(value), Some(Num::Int(_))) {
        Ok(())
    } else {
        Err(EvalError::new(format!("{} is not an integer.", child)))
    }
}

pub(crate) fn verify_string(value: &Value, child: &Expression, _: usize) -> Result<(), EvalError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(EvalError::new(format!("{} is not a string.", child)))
    }
}

pub(crate) fn verify_string_or_null(
    value: &Value,
    child: &Expression,
    _: usize,
) -> Result<(), EvalError> {
    if value.is_string() || value.is_null() {
        Ok(())
    } else {
        Err(EvalError::new(format!("{} is neither a string nor a null object.", child)))
    }
}

pub(crate) fn verify_number_or_string(
    value: &Value,
    child: &Expression,
    _: usize,
) -> Result<(), EvalError> {
    if is_number(value) || value.is_string() {
        Ok(())
    } else {
        Err(EvalError::new(format!("{} is not string or number.", child)))
    }
}

pub(crate) fn verify_number_or_string_or_null(
    value: &Value,
    child: &Expression,
    _: usize,
) -> Result<(), EvalError> {
    if is_number(value) || value.is_string() || value.is_null() {
        Ok(())
    } else {
        Err(EvalError::new(format!("{} is neither a number nor string", child)))
    }
}

pub(crate) fn verify_list(value: &Value, child: &Expression, _: usize) -> Result<(), EvalError> {
    if value.is_array() {
        Ok(())
    } else {
        Err(EvalError::new(format!("{} is not a list or array.", child)))
    }
}

pub(crate) fn verify_numeric_list(
    value: &Value,
    child: &Expression,
    _: usize,
) -> Result<(), EvalError> {
    match value {
        Value::Array(items) if items.iter().all(is_number) => Ok(()),
        _ => Err(EvalError::new(format!("{} is not a list of numbers.", child))),
    }
}

pub(crate) fn verify_container(
    value: &Value,
    child: &Expression,
    _: usize,
) -> Result<(), EvalError> {
    if value.is_string() || value.is_array() || value.is_object() {
        Ok(())
    } else {
        Err(EvalError::new(format!("{} must be a string, list or object.", child)))
    }
}

pub(crate) fn verify_not_null(value: &Value, child: &Expression, _: usize) -> Result<(), EvalError> {
    if value.is_null() {
        Err(EvalError::new(format!("{} is null.", child)))
    } else {
        Ok(())
    }
}

// ============================================================================
// Argument accessors
// ============================================================================

/// String argument, treating `null` as the empty string.
pub(crate) fn text_or_empty(value: &Value) -> &str {
    value.as_str().unwrap_or("")
}

/// Integer argument with a message naming the builtin on failure.
pub(crate) fn integer_arg(value: &Value, function: &str, what: &str) -> Result<i64, EvalError> {
    crate::value::as_integer(value)
        .ok_or_else(|| EvalError::new(format!("{} expects an integer {}, got {}.", function, what, value)))
}
