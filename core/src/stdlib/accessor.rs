//! Property and index access.

use serde_json::Value;

use super::apply::verify_string;
use crate::evaluator::{EvalError, EvalResult, Options};
use crate::expression::{ACCESSOR, ELEMENT, Expression, ExpressionEvaluator};
use crate::memory::{Memory, SimpleObjectMemory, path};
use crate::types::{ReturnType, ValidationError, validate};
use crate::value::{as_integer, property};

pub(super) static EVALUATORS: &[ExpressionEvaluator] = &[
    ExpressionEvaluator::new(ACCESSOR, evaluate_accessor, ReturnType::OBJECT, validate_accessor),
    ExpressionEvaluator::new(ELEMENT, evaluate_element, ReturnType::OBJECT, validate::binary),
    ExpressionEvaluator::new(
        "getProperty",
        evaluate_get_property,
        ReturnType::OBJECT,
        validate_get_property,
    ),
    ExpressionEvaluator::new(
        "setPathToValue",
        evaluate_set_path_to_value,
        ReturnType::OBJECT,
        validate::binary,
    ),
];

/// Walk a chain of `Accessor`/`Element` nodes down to its root.
///
/// Returns the rendered path and, when the chain does not bottom out in a bare
/// name, the expression the path applies to. Element indexes are evaluated on
/// the way.
pub(crate) fn try_accumulate_path<'e>(
    expression: &'e Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> Result<(String, Option<&'e Expression>), EvalError> {
    let mut segments = Vec::new();
    let mut current = Some(expression);

    while let Some(node) = current {
        match (node.expr_type(), node.children()) {
            (ACCESSOR, [Expression::Constant(Value::String(name)), rest @ ..]) => {
                segments.push(name.clone());
                current = rest.first();
            }
            (ELEMENT, [instance, index]) => {
                let segment = match index.try_evaluate(memory, options)? {
                    Value::String(s) => s,
                    value => match as_integer(&value) {
                        Some(i) => i.to_string(),
                        None => {
                            return Err(EvalError::new(format!(
                                "{} doesn't return an int or string",
                                index
                            )));
                        }
                    },
                };
                segments.push(segment);
                current = Some(instance);
            }
            _ => break,
        }
    }

    segments.reverse();
    Ok((path::render(&segments), current))
}

fn validate_accessor(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity(expression, 1, Some(2))?;
    match expression.children().first() {
        Some(Expression::Constant(Value::String(_))) => Ok(()),
        _ => Err(ValidationError::invalid(
            expression,
            format!("{} must have a string as first argument.", expression),
        )),
    }
}

fn substitute_null(path: &str, value: Option<Value>, options: &Options) -> Value {
    match value {
        Some(value) => value,
        None => options
            .null_substitution()
            .and_then(|substitute| substitute(path))
            .unwrap_or(Value::Null),
    }
}

fn evaluate_accessor(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let (path, left) = try_accumulate_path(expression, memory, options)?;
    let value = match left {
        None => memory.get_value(&path),
        Some(left) => {
            let instance = left.try_evaluate(memory, options)?;
            SimpleObjectMemory::new(instance).get_value(&path)
        }
    };
    Ok(substitute_null(&path, value, options))
}

fn evaluate_element(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let [instance_expr, index_expr] = expression.children() else {
        return Err(EvalError::new(format!("{} should have 2 arguments.", expression)));
    };
    let instance = instance_expr.try_evaluate(memory, options)?;
    let index = index_expr.try_evaluate(memory, options)?;

    match (&instance, &index) {
        (Value::Null, _) => Ok(Value::Null),
        (_, Value::String(name)) => match &instance {
            Value::Object(map) => Ok(property(map, name).cloned().unwrap_or(Value::Null)),
            _ => Ok(Value::Null),
        },
        (_, _) => {
            let Some(i) = as_integer(&index) else {
                return Err(EvalError::new(format!(
                    "Could not coerce {} to an int or string",
                    index_expr
                )));
            };
            let Value::Array(items) = &instance else {
                return Err(EvalError::new(format!("{} is not a collection.", instance_expr)));
            };
            usize::try_from(i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| EvalError::new(format!("{} index out of range", i)))
        }
    }
}

fn validate_get_property(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity(expression, 1, Some(2))?;
    match expression.children() {
        [name] | [_, name] => validate::child_type(expression, name, ReturnType::STRING),
        _ => Ok(()),
    }
}

fn evaluate_get_property(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> EvalResult {
    let children = expression.children();
    let first = children[0].try_evaluate(memory, options)?;

    if children.len() == 1 {
        verify_string(&first, &children[0], 0)?;
        let name = first.as_str().unwrap_or_default();
        return Ok(substitute_null(name, memory.get_value(name), options));
    }

    let name = children[1].try_evaluate(memory, options)?;
    verify_string(&name, &children[1], 1)?;
    let name = name.as_str().unwrap_or_default();
    let value = SimpleObjectMemory::new(first).get_value(name);
    Ok(substitute_null(name, value, options))
}

fn evaluate_set_path_to_value(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> EvalResult {
    let children = expression.children();
    let (path, left) = try_accumulate_path(&children[0], memory, options)?;
    if left.is_some() || path.is_empty() {
        return Err(EvalError::new(format!("{} is not a valid path to set value", children[0])));
    }

    let value = children[1].try_evaluate(memory, options)?;
    memory.set_value(&path, value.clone())?;
    Ok(value)
}
