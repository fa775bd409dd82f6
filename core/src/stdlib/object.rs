//! Object construction and manipulation.
//!
//! `addProperty`, `removeProperty` and `setProperty` return the updated
//! object. When their first argument is a memory path the update is also
//! written back to that path, so the host's state sees it.

use serde_json::{Map, Value};

use super::accessor::try_accumulate_path;
use super::apply::apply_with_error;
use crate::evaluator::{EvalError, EvalResult, Options};
use crate::expression::{Expression, ExpressionEvaluator};
use crate::memory::{Memory, MemoryError};
use crate::types::{ReturnType, ValidationError, validate};

pub(super) static EVALUATORS: &[ExpressionEvaluator] = &[
    ExpressionEvaluator::new("addProperty", evaluate_add_property, ReturnType::OBJECT, validate_three),
    ExpressionEvaluator::new(
        "removeProperty",
        evaluate_remove_property,
        ReturnType::OBJECT,
        validate_remove,
    ),
    ExpressionEvaluator::new("setProperty", evaluate_set_property, ReturnType::OBJECT, validate_three),
    ExpressionEvaluator::new("merge", evaluate_merge, ReturnType::OBJECT, validate_merge),
];

fn validate_three(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(
        expression,
        &[],
        &[ReturnType::OBJECT, ReturnType::STRING, ReturnType::OBJECT],
    )
}

fn validate_remove(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(expression, &[], &[ReturnType::OBJECT, ReturnType::STRING])
}

fn validate_merge(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity_and_any_type(expression, 1, None, ReturnType::OBJECT)
}

/// Split the evaluated arguments into the target object and the key.
fn object_and_key(args: &mut Vec<Value>, expression: &Expression) -> Result<(Map<String, Value>, String), EvalError> {
    let children = expression.children();
    let key = match &args[1] {
        Value::String(key) => key.clone(),
        other => {
            return Err(EvalError::new(format!("{} is not a string: {}.", children[1], other)));
        }
    };
    match std::mem::take(&mut args[0]) {
        Value::Object(map) => Ok((map, key)),
        Value::Null => Ok((Map::new(), key)),
        other => Err(EvalError::new(format!("{} is not an object: {}.", children[0], other))),
    }
}

/// Store an updated object back at the path its first argument came from.
fn write_back(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    updated: &Value,
) -> Result<(), EvalError> {
    let target = &expression.children()[0];
    if target.as_constant().is_some() {
        return Ok(());
    }
    let (path, left) = match try_accumulate_path(target, memory, options) {
        Ok(found) => found,
        Err(_) => return Ok(()),
    };
    if left.is_some() || path.is_empty() {
        return Ok(());
    }
    match memory.set_value(&path, updated.clone()) {
        Ok(()) => Ok(()),
        Err(MemoryError::ReadOnly) => {
            tracing::debug!(path = %path, "memory is read-only, update not written back");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn update_object(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    update: fn(&mut Map<String, Value>, String, Vec<Value>, &Expression) -> Result<(), EvalError>,
) -> EvalResult {
    let updated = apply_with_error(expression, memory, options, None, |mut args| {
        let (mut object, key) = object_and_key(&mut args, expression)?;
        update(&mut object, key, args, expression)?;
        Ok(Value::Object(object))
    })?;
    write_back(expression, memory, options, &updated)?;
    Ok(updated)
}

fn evaluate_add_property(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    update_object(expression, memory, options, |object, key, mut args, expression| {
        if object.contains_key(&key) {
            return Err(EvalError::new(format!(
                "{} already has a property named {}.",
                expression.children()[0],
                key
            )));
        }
        object.insert(key, args.swap_remove(2));
        Ok(())
    })
}

fn evaluate_set_property(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    update_object(expression, memory, options, |object, key, mut args, _| {
        object.insert(key, args.swap_remove(2));
        Ok(())
    })
}

fn evaluate_remove_property(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> EvalResult {
    update_object(expression, memory, options, |object, key, _, _| {
        object.shift_remove(&key);
        Ok(())
    })
}

/// Shallow merge, later objects winning.
fn evaluate_merge(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        let mut merged = Map::new();
        for (arg, child) in args.into_iter().zip(expression.children()) {
            match arg {
                Value::Object(map) => merged.extend(map),
                Value::Null => {}
                other => {
                    return Err(EvalError::new(format!("{} is not an object: {}.", child, other)));
                }
            }
        }
        Ok(Value::Object(merged))
    })
}
