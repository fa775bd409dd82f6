//! Text builtins.
//!
//! Unless noted otherwise, a `null` string argument behaves like `""`.

use regex::RegexBuilder;
use serde_json::Value;

use super::apply::{
    apply, apply_with_error, integer_arg, text_or_empty, verify_integer, verify_number,
    verify_string, verify_string_or_null,
};
use crate::evaluator::{EvalError, EvalResult, Options};
use crate::expression::{Expression, ExpressionEvaluator};
use crate::memory::Memory;
use crate::types::{ReturnType, ValidationError, validate};
use crate::value::{Num, to_text, values_equal};

pub(super) static EVALUATORS: &[ExpressionEvaluator] = &[
    ExpressionEvaluator::new(
        "concat",
        evaluate_concat,
        ReturnType::STRING.union(ReturnType::ARRAY),
        validate::at_least_one,
    )
    .with_aliases(&["&"]),
    ExpressionEvaluator::new("length", evaluate_length, ReturnType::NUMBER, validate::unary_string),
    ExpressionEvaluator::new("replace", evaluate_replace, ReturnType::STRING, validate_replace),
    ExpressionEvaluator::new(
        "replaceIgnoreCase",
        evaluate_replace_ignore_case,
        ReturnType::STRING,
        validate_replace,
    ),
    ExpressionEvaluator::new("split", evaluate_split, ReturnType::ARRAY, validate_split),
    ExpressionEvaluator::new("substring", evaluate_substring, ReturnType::STRING, validate_substring),
    ExpressionEvaluator::new("toLower", evaluate_to_lower, ReturnType::STRING, validate::unary_string),
    ExpressionEvaluator::new("toUpper", evaluate_to_upper, ReturnType::STRING, validate::unary_string),
    ExpressionEvaluator::new("trim", evaluate_trim, ReturnType::STRING, validate::unary_string),
    ExpressionEvaluator::new("startsWith", evaluate_starts_with, ReturnType::BOOLEAN, validate_two_strings),
    ExpressionEvaluator::new("endsWith", evaluate_ends_with, ReturnType::BOOLEAN, validate_two_strings),
    ExpressionEvaluator::new("countWord", evaluate_count_word, ReturnType::NUMBER, validate::unary_string),
    ExpressionEvaluator::new("addOrdinal", evaluate_add_ordinal, ReturnType::STRING, validate::unary_number),
    ExpressionEvaluator::new("newGuid", evaluate_new_guid, ReturnType::STRING, validate::no_children),
    ExpressionEvaluator::new("indexOf", evaluate_index_of, ReturnType::NUMBER, validate::binary),
    ExpressionEvaluator::new("lastIndexOf", evaluate_last_index_of, ReturnType::NUMBER, validate::binary),
    ExpressionEvaluator::new("EOL", evaluate_eol, ReturnType::STRING, validate::no_children),
    ExpressionEvaluator::new(
        "sentenceCase",
        evaluate_sentence_case,
        ReturnType::STRING,
        validate::unary_string,
    ),
    ExpressionEvaluator::new("titleCase", evaluate_title_case, ReturnType::STRING, validate::unary_string),
    ExpressionEvaluator::new(
        "reverse",
        evaluate_reverse,
        ReturnType::STRING.union(ReturnType::ARRAY),
        validate::unary,
    ),
    ExpressionEvaluator::new(
        "formatNumber",
        evaluate_format_number,
        ReturnType::STRING,
        validate_format_number,
    ),
];

// ============================================================================
// Validators
// ============================================================================

fn validate_replace(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity_and_any_type(expression, 3, Some(3), ReturnType::STRING)
}

fn validate_split(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(expression, &[ReturnType::STRING], &[ReturnType::STRING])
}

fn validate_substring(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(
        expression,
        &[ReturnType::NUMBER],
        &[ReturnType::STRING, ReturnType::NUMBER],
    )
}

fn validate_two_strings(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity_and_any_type(expression, 2, Some(2), ReturnType::STRING)
}

fn validate_format_number(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(
        expression,
        &[ReturnType::STRING],
        &[ReturnType::NUMBER, ReturnType::NUMBER],
    )
}

// ============================================================================
// Basic text functions
// ============================================================================

/// Arrays concatenate into an array; anything else concatenates as text.
fn concat_values(args: Vec<Value>) -> Value {
    if args.iter().all(Value::is_array) {
        let items = args
            .into_iter()
            .flat_map(|arg| match arg {
                Value::Array(items) => items,
                _ => Vec::new(),
            })
            .collect();
        return Value::Array(items);
    }
    Value::String(args.iter().map(to_text).collect())
}

fn evaluate_concat(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, None, concat_values)
}

fn evaluate_length(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_string_or_null), |args| {
        Value::from(text_or_empty(&args[0]).chars().count())
    })
}

fn old_value(value: &Value, expression: &Expression) -> Result<String, EvalError> {
    match value.as_str() {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(EvalError::new(format!("{} needs a non-empty string to replace.", expression))),
    }
}

fn evaluate_replace(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_string_or_null), |args| {
        let old = old_value(&args[1], expression)?;
        let text = text_or_empty(&args[0]);
        Ok(Value::String(text.replace(&old, text_or_empty(&args[2]))))
    })
}

fn evaluate_replace_ignore_case(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_string_or_null), |args| {
        let old = old_value(&args[1], expression)?;
        let pattern = RegexBuilder::new(&regex::escape(&old))
            .case_insensitive(true)
            .build()
            .map_err(|err| EvalError::new(err.to_string()))?;
        let replacement = text_or_empty(&args[2]);
        let replaced = pattern.replace_all(text_or_empty(&args[0]), regex::NoExpand(replacement));
        Ok(Value::String(replaced.into_owned()))
    })
}

fn split_text(text: &str, separator: &str) -> Vec<Value> {
    if separator.is_empty() {
        return text.chars().map(|c| Value::String(c.to_string())).collect();
    }
    text.split(separator).map(Value::from).collect()
}

fn evaluate_split(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_string_or_null), |args| {
        let separator = args.get(1).map(text_or_empty).unwrap_or_default();
        Value::Array(split_text(text_or_empty(&args[0]), separator))
    })
}

fn evaluate_substring(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let children = expression.children();
    let text = children[0].try_evaluate(memory, options)?;
    verify_string_or_null(&text, &children[0], 0)?;
    let Value::String(text) = text else {
        return Ok(Value::String(String::new()));
    };
    let chars: Vec<char> = text.chars().collect();

    let start = children[1].try_evaluate(memory, options)?;
    verify_integer(&start, &children[1], 1)?;
    let start = integer_arg(&start, "substring", "start")?;
    let Some(start) = usize::try_from(start).ok().filter(|s| *s <= chars.len()) else {
        return Err(EvalError::new(format!(
            "{}={} which is out of range for {}.",
            children[1], start, text
        )));
    };

    let length = match children.get(2) {
        None => chars.len() - start,
        Some(child) => {
            let length = child.try_evaluate(memory, options)?;
            verify_integer(&length, child, 2)?;
            let length = integer_arg(&length, "substring", "length")?;
            match usize::try_from(length).ok().filter(|l| start + l <= chars.len()) {
                Some(length) => length,
                None => {
                    return Err(EvalError::new(format!(
                        "{}={} which is out of range for {}.",
                        child, length, text
                    )));
                }
            }
        }
    };
    Ok(Value::String(chars[start..start + length].iter().collect()))
}

fn evaluate_to_lower(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_string_or_null), |args| {
        Value::String(text_or_empty(&args[0]).to_lowercase())
    })
}

fn evaluate_to_upper(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_string_or_null), |args| {
        Value::String(text_or_empty(&args[0]).to_uppercase())
    })
}

fn evaluate_trim(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_string_or_null), |args| {
        Value::String(text_or_empty(&args[0]).trim().to_string())
    })
}

fn evaluate_starts_with(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_string_or_null), |args| {
        Value::Bool(text_or_empty(&args[0]).starts_with(text_or_empty(&args[1])))
    })
}

fn evaluate_ends_with(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_string_or_null), |args| {
        Value::Bool(text_or_empty(&args[0]).ends_with(text_or_empty(&args[1])))
    })
}

fn evaluate_count_word(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_string_or_null), |args| {
        Value::from(text_or_empty(&args[0]).split_whitespace().count())
    })
}

fn ordinal(n: i64) -> String {
    if n <= 0 {
        return n.to_string();
    }
    let suffix = match (n % 100, n % 10) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

fn evaluate_add_ordinal(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_integer), |args| {
        match Num::from_value(&args[0]) {
            Some(Num::Int(n)) => Value::String(ordinal(n)),
            _ => Value::Null,
        }
    })
}

fn evaluate_new_guid(_: &Expression, _: &mut dyn Memory, _: &Options) -> EvalResult {
    Ok(Value::String(uuid::Uuid::new_v4().to_string()))
}

fn evaluate_eol(_: &Expression, _: &mut dyn Memory, _: &Options) -> EvalResult {
    let eol = if cfg!(windows) { "\r\n" } else { "\n" };
    Ok(Value::String(eol.to_string()))
}

// ============================================================================
// Searching
// ============================================================================

fn find_position(args: &[Value], expression: &Expression, last: bool) -> EvalResult {
    let position = match &args[0] {
        Value::Null | Value::String(_) => {
            if !matches!(args[1], Value::Null | Value::String(_)) {
                return Err(EvalError::new(format!(
                    "{} should be a string.",
                    expression.children()[1]
                )));
            }
            let haystack = text_or_empty(&args[0]);
            let needle = text_or_empty(&args[1]);
            let byte_index = if last {
                haystack.rfind(needle)
            } else {
                haystack.find(needle)
            };
            byte_index.map(|i| haystack[..i].chars().count())
        }
        Value::Array(items) => {
            if last {
                items.iter().rposition(|item| values_equal(item, &args[1]))
            } else {
                items.iter().position(|item| values_equal(item, &args[1]))
            }
        }
        _ => {
            return Err(EvalError::new(format!("{} works only on string or list.", expression)));
        }
    };
    Ok(position.map_or(Value::from(-1), Value::from))
}

fn evaluate_index_of(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        find_position(&args, expression, false)
    })
}

fn evaluate_last_index_of(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        find_position(&args, expression, true)
    })
}

// ============================================================================
// Casing
// ============================================================================

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

fn evaluate_sentence_case(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_string_or_null), |args| {
        Value::String(capitalize(text_or_empty(&args[0])))
    })
}

fn evaluate_title_case(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, Some(verify_string_or_null), |args| {
        let words: Vec<String> = text_or_empty(&args[0]).split(' ').map(capitalize).collect();
        Value::String(words.join(" "))
    })
}

fn evaluate_reverse(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| match &args[0] {
        Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
        Value::Array(items) => Ok(Value::Array(items.iter().rev().cloned().collect())),
        other => Err(EvalError::new(format!(
            "{} is not a string or list.",
            Value::to_string(other)
        ))),
    })
}

// ============================================================================
// Number formatting
// ============================================================================

/// Group and decimal separators for a locale tag.
fn separators(locale: &str) -> (&'static str, char) {
    let language = locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match language.as_str() {
        "fr" => ("\u{a0}", ','),
        "de" | "es" | "it" | "nl" | "pt" | "da" | "tr" | "id" => (".", ','),
        "sv" | "nb" | "fi" | "pl" | "cs" | "ru" => ("\u{a0}", ','),
        _ => (",", '.'),
    }
}

pub(crate) fn format_number(number: f64, precision: usize, locale: &str) -> String {
    let fixed = format!("{:.*}", precision, number.abs());
    let (integer, fraction) = match fixed.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (fixed.as_str(), None),
    };
    let (group, decimal) = separators(locale);

    let digits: Vec<char> = integer.chars().collect();
    let mut result = String::new();
    if number.is_sign_negative() && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        result.push('-');
    }
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push_str(group);
        }
        result.push(*digit);
    }
    if let Some(fraction) = fraction {
        result.push(decimal);
        result.push_str(fraction);
    }
    result
}

fn evaluate_format_number(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let children = expression.children();
    let mut args = Vec::with_capacity(children.len());
    for (index, child) in children.iter().enumerate() {
        let value = child.try_evaluate(memory, options)?;
        match index {
            0 => verify_number(&value, child, index)?,
            1 => verify_integer(&value, child, index)?,
            _ => verify_string(&value, child, index)?,
        }
        args.push(value);
    }

    let number = Num::from_value(&args[0]).map(Num::as_f64).unwrap_or_default();
    let precision = integer_arg(&args[1], "formatNumber", "precision")?;
    let Ok(precision) = usize::try_from(precision) else {
        return Err(EvalError::new(format!("{} must be a non-negative integer.", children[1])));
    };
    let locale = args
        .get(2)
        .and_then(Value::as_str)
        .or(options.locale())
        .unwrap_or("en-US");
    Ok(Value::String(format_number(number, precision, locale)))
}
