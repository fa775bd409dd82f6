//! Collection builtins over arrays, strings and objects.

use serde_json::{Map, Value};

use super::apply::{apply, apply_with_error, integer_arg, verify_integer, verify_list, verify_string};
use crate::evaluator::{EvalError, EvalResult, Options};
use crate::expression::{Expression, ExpressionEvaluator};
use crate::memory::Memory;
use crate::types::{ReturnType, ValidationError, validate};
use crate::value::{to_text, values_equal};

/// Default depth for `flatten` when none is given.
const DEFAULT_FLATTEN_DEPTH: i64 = 100;

pub(super) static EVALUATORS: &[ExpressionEvaluator] = &[
    ExpressionEvaluator::new("count", evaluate_count, ReturnType::NUMBER, validate::unary),
    ExpressionEvaluator::new("contains", evaluate_contains, ReturnType::BOOLEAN, validate::binary),
    ExpressionEvaluator::new("empty", evaluate_empty, ReturnType::BOOLEAN, validate::unary),
    ExpressionEvaluator::new("join", evaluate_join, ReturnType::STRING, validate_join),
    ExpressionEvaluator::new("first", evaluate_first, ReturnType::OBJECT, validate::unary),
    ExpressionEvaluator::new("last", evaluate_last, ReturnType::OBJECT, validate::unary),
    ExpressionEvaluator::new("union", evaluate_union, ReturnType::ARRAY, validate_lists),
    ExpressionEvaluator::new("intersection", evaluate_intersection, ReturnType::ARRAY, validate_lists),
    ExpressionEvaluator::new("skip", evaluate_skip, ReturnType::ARRAY, validate_skip),
    ExpressionEvaluator::new(
        "take",
        evaluate_take,
        ReturnType::ARRAY.union(ReturnType::STRING),
        validate_take,
    ),
    ExpressionEvaluator::new("subArray", evaluate_sub_array, ReturnType::ARRAY, validate_sub_array),
    ExpressionEvaluator::new(
        "indicesAndValues",
        evaluate_indices_and_values,
        ReturnType::ARRAY,
        validate::unary,
    ),
    ExpressionEvaluator::new("flatten", evaluate_flatten, ReturnType::ARRAY, validate_flatten),
    ExpressionEvaluator::new("unique", evaluate_unique, ReturnType::ARRAY, validate_unique),
    ExpressionEvaluator::new("createArray", evaluate_create_array, ReturnType::ARRAY, validate::any_arity),
];

// ============================================================================
// Validators
// ============================================================================

fn validate_join(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(
        expression,
        &[ReturnType::STRING],
        &[ReturnType::ARRAY, ReturnType::STRING],
    )
}

fn validate_lists(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity_and_any_type(expression, 1, None, ReturnType::ARRAY)
}

fn validate_skip(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(expression, &[], &[ReturnType::ARRAY, ReturnType::NUMBER])
}

fn validate_take(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(
        expression,
        &[],
        &[ReturnType::ARRAY | ReturnType::STRING, ReturnType::NUMBER],
    )
}

fn validate_sub_array(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(
        expression,
        &[ReturnType::NUMBER],
        &[ReturnType::ARRAY, ReturnType::NUMBER],
    )
}

fn validate_flatten(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(expression, &[ReturnType::NUMBER], &[ReturnType::ARRAY])
}

fn validate_unique(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity_and_any_type(expression, 1, Some(1), ReturnType::ARRAY)
}

// ============================================================================
// Inspection
// ============================================================================

fn evaluate_count(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| match &args[0] {
        Value::String(s) => Ok(Value::from(s.chars().count())),
        Value::Array(items) => Ok(Value::from(items.len())),
        Value::Object(map) => Ok(Value::from(map.len())),
        _ => Err(EvalError::new(format!(
            "{} must be a string, list or object.",
            expression.children()[0]
        ))),
    })
}

fn evaluate_contains(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, None, |args| {
        let found = match (&args[0], &args[1]) {
            (Value::String(text), Value::String(part)) => text.contains(part.as_str()),
            (Value::String(text), other) => text.contains(&to_text(other)),
            (Value::Array(items), needle) => items.iter().any(|item| values_equal(item, needle)),
            (Value::Object(map), Value::String(key)) => map.contains_key(key),
            _ => false,
        };
        Value::Bool(found)
    })
}

/// `null`, `""`, `[]` and `{}` are empty; every other value is not.
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn evaluate_empty(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, None, |args| Value::Bool(is_empty(&args[0])))
}

fn verify_join_argument(value: &Value, child: &Expression, index: usize) -> Result<(), EvalError> {
    if index == 0 {
        verify_list(value, child, index)
    } else {
        verify_string(value, child, index)
    }
}

fn evaluate_join(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_join_argument), |args| {
        let items: Vec<String> = args[0]
            .as_array()
            .map(|items| items.iter().map(to_text).collect())
            .unwrap_or_default();
        let separator = args[1].as_str().unwrap_or_default();
        let joined = match (args.get(2).and_then(Value::as_str), items.split_last()) {
            (Some(last_separator), Some((last, rest))) if !rest.is_empty() => {
                format!("{}{}{}", rest.join(separator), last_separator, last)
            }
            _ => items.join(separator),
        };
        Value::String(joined)
    })
}

fn evaluate_first(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, None, |args| match &args[0] {
        Value::String(s) => s.chars().next().map_or(Value::Null, |c| Value::String(c.to_string())),
        Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    })
}

fn evaluate_last(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, None, |args| match &args[0] {
        Value::String(s) => s.chars().last().map_or(Value::Null, |c| Value::String(c.to_string())),
        Value::Array(items) => items.last().cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    })
}

// ============================================================================
// Set operations
// ============================================================================

/// Keep the first occurrence of every item, in order.
pub(crate) fn dedup(items: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut result: Vec<Value> = Vec::new();
    for item in items {
        if !result.iter().any(|seen| values_equal(seen, &item)) {
            result.push(item);
        }
    }
    result
}

fn lists(args: Vec<Value>) -> Vec<Vec<Value>> {
    args.into_iter()
        .map(|arg| match arg {
            Value::Array(items) => items,
            _ => Vec::new(),
        })
        .collect()
}

fn evaluate_union(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_list), |args| {
        Value::Array(dedup(lists(args).into_iter().flatten()))
    })
}

fn evaluate_intersection(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_list), |args| {
        let mut lists = lists(args).into_iter();
        let first = lists.next().unwrap_or_default();
        let others: Vec<Vec<Value>> = lists.collect();
        let common = first.into_iter().filter(|item| {
            others
                .iter()
                .all(|list| list.iter().any(|other| values_equal(item, other)))
        });
        Value::Array(dedup(common))
    })
}

fn evaluate_unique(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_list), |args| {
        Value::Array(dedup(lists(args).into_iter().flatten()))
    })
}

// ============================================================================
// Slicing
// ============================================================================

fn clamp_count(n: i64, len: usize) -> usize {
    usize::try_from(n.max(0)).map_or(len, |n| n.min(len))
}

fn verify_slice_argument(value: &Value, child: &Expression, index: usize) -> Result<(), EvalError> {
    if index == 0 {
        verify_list(value, child, index)
    } else {
        verify_integer(value, child, index)
    }
}

fn evaluate_skip(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_slice_argument), |args| {
        let items = args[0].as_array().cloned().unwrap_or_default();
        let n = clamp_count(integer_arg(&args[1], "skip", "count")?, items.len());
        Ok(Value::Array(items.into_iter().skip(n).collect()))
    })
}

fn evaluate_take(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let children = expression.children();
    let source = children[0].try_evaluate(memory, options)?;
    let count = children[1].try_evaluate(memory, options)?;
    verify_integer(&count, &children[1], 1)?;
    let count = integer_arg(&count, "take", "count")?;

    let in_range = |len: usize, shown: &dyn std::fmt::Display| {
        usize::try_from(count).ok().filter(|n| *n < len).ok_or_else(|| {
            EvalError::new(format!(
                "{}={} which is out of range for {}.",
                children[1], count, shown
            ))
        })
    };

    match &source {
        Value::String(s) => {
            let n = in_range(s.chars().count(), s)?;
            Ok(Value::String(s.chars().take(n).collect()))
        }
        Value::Array(items) => {
            let n = in_range(items.len(), &source)?;
            Ok(Value::Array(items[..n].to_vec()))
        }
        _ => Err(EvalError::new(format!("{} is not a string or list.", children[0]))),
    }
}

fn evaluate_sub_array(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_slice_argument), |args| {
        let items = args[0].as_array().cloned().unwrap_or_default();
        let children = expression.children();

        let start = integer_arg(&args[1], "subArray", "start")?;
        let Some(start) = usize::try_from(start).ok().filter(|s| *s <= items.len()) else {
            return Err(EvalError::new(format!(
                "{}={} which is out of range for {}.",
                children[1], start, args[0]
            )));
        };

        let end = match args.get(2) {
            Some(end) => {
                let end = integer_arg(end, "subArray", "end")?;
                match usize::try_from(end).ok().filter(|e| *e >= start && *e <= items.len()) {
                    Some(end) => end,
                    None => {
                        return Err(EvalError::new(format!(
                            "{}={} which is out of range for {}.",
                            children[2], end, args[0]
                        )));
                    }
                }
            }
            None => items.len(),
        };
        Ok(Value::Array(items[start..end].to_vec()))
    })
}

// ============================================================================
// Restructuring
// ============================================================================

fn index_entry(index: Value, value: Value) -> Value {
    let mut entry = Map::new();
    entry.insert("index".to_string(), index);
    entry.insert("value".to_string(), value);
    Value::Object(entry)
}

fn evaluate_indices_and_values(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| match &args[0] {
        Value::Array(items) => Ok(Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| index_entry(Value::from(i), item.clone()))
                .collect(),
        )),
        Value::Object(map) => Ok(Value::Array(
            map.iter()
                .map(|(key, item)| index_entry(Value::String(key.clone()), item.clone()))
                .collect(),
        )),
        _ => Err(EvalError::new(format!("{} is not array or object.", expression.children()[0]))),
    })
}

fn flatten_into(items: Vec<Value>, depth: i64, out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::Array(inner) if depth > 0 => flatten_into(inner, depth - 1, out),
            other => out.push(other),
        }
    }
}

fn evaluate_flatten(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |mut args| {
        let depth = match args.get(1) {
            Some(depth) => integer_arg(depth, "flatten", "depth")?,
            None => DEFAULT_FLATTEN_DEPTH,
        };
        let Value::Array(items) = args.swap_remove(0) else {
            return Err(EvalError::new(format!("{} is not a list.", expression.children()[0])));
        };
        let mut out = Vec::new();
        flatten_into(items, depth, &mut out);
        Ok(Value::Array(out))
    })
}

fn evaluate_create_array(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, None, Value::Array)
}
