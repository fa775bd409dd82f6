//! Iteration combinators.
//!
//! `foreach(collection, item, body)` and its siblings bind each element to
//! `item` in a fresh scope pushed on a [`StackedMemory`] above the caller's
//! memory, so the binding shadows outer names without writing to them.
//! `collection, item => body` parses to the same three children.
//!
//! Iterating an object visits `{key, value}` pairs in insertion order.
//! `where` keeps an element only when its body evaluates truthy without error.

use core::cmp::Ordering;

use serde_json::{Map, Value};

use crate::evaluator::{EvalError, EvalResult, Options, is_logic_true};
use crate::expression::{Expression, ExpressionEvaluator};
use crate::memory::{Memory, SimpleObjectMemory, StackedMemory};
use crate::types::{ReturnType, ValidationError, validate};
use crate::value::compare;

pub(super) static EVALUATORS: &[ExpressionEvaluator] = &[
    ExpressionEvaluator::new("foreach", evaluate_foreach, ReturnType::ARRAY, validate_lambda),
    ExpressionEvaluator::new("select", evaluate_foreach, ReturnType::ARRAY, validate_lambda),
    ExpressionEvaluator::new(
        "where",
        evaluate_where,
        ReturnType::ARRAY.union(ReturnType::OBJECT),
        validate_lambda,
    ),
    ExpressionEvaluator::new("any", evaluate_any, ReturnType::BOOLEAN, validate_lambda),
    ExpressionEvaluator::new("all", evaluate_all, ReturnType::BOOLEAN, validate_lambda),
    ExpressionEvaluator::new("sortBy", evaluate_sort_by, ReturnType::ARRAY, validate_sort),
    ExpressionEvaluator::new(
        "sortByDescending",
        evaluate_sort_by_descending,
        ReturnType::ARRAY,
        validate_sort,
    ),
];

// ============================================================================
// Validators
// ============================================================================

fn validate_identifier(expression: &Expression, child: &Expression) -> Result<(), ValidationError> {
    if child.accessor_name().is_some() {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            expression,
            format!("Second parameter of {} is not an identifier: {}.", expression, child),
        ))
    }
}

fn validate_lambda(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity(expression, 3, Some(3))?;
    let children = expression.children();
    validate::child_type(expression, &children[0], ReturnType::ARRAY)?;
    validate_identifier(expression, &children[1])
}

fn validate_sort(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity(expression, 1, Some(3))?;
    let children = expression.children();
    validate::child_type(expression, &children[0], ReturnType::ARRAY)?;
    match children {
        [_, key] => validate::child_type(expression, key, ReturnType::STRING),
        [_, item, _] => validate_identifier(expression, item),
        _ => Ok(()),
    }
}

// ============================================================================
// Iteration
// ============================================================================

/// Where the iterated elements came from.
enum Source {
    List,
    Object,
    Null,
}

fn pair(key: &str, value: &Value) -> Value {
    let mut entry = Map::new();
    entry.insert("key".to_string(), Value::String(key.to_string()));
    entry.insert("value".to_string(), value.clone());
    Value::Object(entry)
}

fn elements(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> Result<(Vec<Value>, Source), EvalError> {
    let collection = &expression.children()[0];
    match collection.try_evaluate(memory, options)? {
        Value::Array(items) => Ok((items, Source::List)),
        Value::Object(map) => Ok((
            map.iter().map(|(key, value)| pair(key, value)).collect(),
            Source::Object,
        )),
        Value::Null => Ok((Vec::new(), Source::Null)),
        _ => Err(EvalError::new(format!(
            "{} is not a collection or structure object to run {}.",
            collection,
            expression.expr_type()
        ))),
    }
}

/// Evaluate `body` once per element with the element bound to `name`.
fn map_elements(
    name: &str,
    body: &Expression,
    items: &[Value],
    memory: &mut dyn Memory,
    options: &Options,
) -> Result<Vec<Value>, EvalError> {
    let mut stack = StackedMemory::wrap(memory);
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let mut scope = Map::new();
        scope.insert(name.to_string(), item.clone());
        stack.push(SimpleObjectMemory::new(Value::Object(scope)));
        let result = body.try_evaluate(&mut stack, options);
        stack.pop();
        results.push(result?);
    }
    Ok(results)
}

fn lambda_parts(expression: &Expression) -> Result<(&str, &Expression), EvalError> {
    match expression.children() {
        [_, item, body] => match item.accessor_name() {
            Some(name) => Ok((name, body)),
            None => Err(EvalError::new(format!("{} is not an identifier.", item))),
        },
        _ => Err(EvalError::new(format!("{} should have 3 arguments.", expression))),
    }
}

fn evaluate_foreach(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let (name, body) = lambda_parts(expression)?;
    let (items, _) = elements(expression, memory, options)?;
    map_elements(name, body, &items, memory, options).map(Value::Array)
}

fn evaluate_where(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let (name, body) = lambda_parts(expression)?;
    let (items, source) = elements(expression, memory, options)?;
    if let Source::Null = source {
        return Err(EvalError::new(format!(
            "{} is not a collection or structure object to run where.",
            expression.children()[0]
        )));
    }

    let options = options.without_null_substitution();
    let mut stack = StackedMemory::wrap(memory);
    let mut kept = Vec::new();
    for item in items {
        let mut scope = Map::new();
        scope.insert(name.to_string(), item.clone());
        stack.push(SimpleObjectMemory::new(Value::Object(scope)));
        let verdict = body.try_evaluate(&mut stack, &options);
        stack.pop();
        if verdict.is_ok_and(|verdict| is_logic_true(&verdict)) {
            kept.push(item);
        }
    }

    match source {
        Source::Object => {
            let mut object = Map::new();
            for entry in kept {
                if let (Some(Value::String(key)), Some(value)) = (entry.get("key"), entry.get("value")) {
                    object.insert(key.clone(), value.clone());
                }
            }
            Ok(Value::Object(object))
        }
        Source::List | Source::Null => Ok(Value::Array(kept)),
    }
}

fn evaluate_any(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let (name, body) = lambda_parts(expression)?;
    let (items, _) = elements(expression, memory, options)?;
    let verdicts = map_elements(name, body, &items, memory, options)?;
    Ok(Value::Bool(verdicts.iter().any(is_logic_true)))
}

fn evaluate_all(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let (name, body) = lambda_parts(expression)?;
    let (items, _) = elements(expression, memory, options)?;
    let verdicts = map_elements(name, body, &items, memory, options)?;
    Ok(Value::Bool(verdicts.iter().all(is_logic_true)))
}

// ============================================================================
// Sorting
// ============================================================================

fn sort_keys(
    expression: &Expression,
    items: &[Value],
    memory: &mut dyn Memory,
    options: &Options,
) -> Result<Vec<Value>, EvalError> {
    match expression.children() {
        [_] => Ok(items.to_vec()),
        [_, key] => {
            let key = key.try_evaluate(memory, options)?;
            let Value::String(path) = key else {
                return Err(EvalError::new(format!(
                    "{} is not a string.",
                    expression.children()[1]
                )));
            };
            Ok(items
                .iter()
                .map(|item| {
                    SimpleObjectMemory::new(item.clone())
                        .get_value(&path)
                        .unwrap_or(Value::Null)
                })
                .collect())
        }
        _ => {
            let (name, body) = lambda_parts(expression)?;
            map_elements(name, body, items, memory, options)
        }
    }
}

/// `null` sorts first; other mixed kinds cannot be ordered.
fn sort_order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        _ => compare(left, right),
    }
}

fn sort(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    descending: bool,
) -> EvalResult {
    let collection = &expression.children()[0];
    let items = match collection.try_evaluate(memory, options)? {
        Value::Array(items) => items,
        _ => {
            return Err(EvalError::new(format!("{} is not an array.", collection)));
        }
    };
    let keys = sort_keys(expression, &items, memory, options)?;

    let mut keyed: Vec<(Value, Value)> = keys.into_iter().zip(items).collect();
    let mut failure = None;
    keyed.sort_by(|(a, _), (b, _)| {
        let order = sort_order(a, b).unwrap_or_else(|| {
            failure.get_or_insert_with(|| {
                EvalError::new(format!("{} and {} cannot be compared.", a, b))
            });
            Ordering::Equal
        });
        if descending { order.reverse() } else { order }
    });
    if let Some(err) = failure {
        return Err(err);
    }
    Ok(Value::Array(keyed.into_iter().map(|(_, item)| item).collect()))
}

fn evaluate_sort_by(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    sort(expression, memory, options, false)
}

fn evaluate_sort_by_descending(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> EvalResult {
    sort(expression, memory, options, true)
}
