//! Arithmetic operators and numeric functions.
//!
//! Integer operands give integer results when the result is exact; anything
//! else is computed in `f64`.

use rand::Rng;
use serde_json::Value;

use super::apply::{
    apply_sequence, apply_with_error, evaluate_children, integer_arg, verify_number,
    verify_number_or_string_or_null, verify_numeric_list,
};
use crate::evaluator::{EvalError, EvalResult, Options};
use crate::expression::{Expression, ExpressionEvaluator};
use crate::memory::Memory;
use crate::types::{ReturnType, ValidationError, validate};
use crate::value::{Num, float, integral_or_float, to_text, type_name};

pub(super) static EVALUATORS: &[ExpressionEvaluator] = &[
    ExpressionEvaluator::new(
        "+",
        evaluate_add,
        ReturnType::STRING.union(ReturnType::NUMBER),
        validate_add,
    )
    .with_aliases(&["add"]),
    ExpressionEvaluator::new("-", evaluate_subtract, ReturnType::NUMBER, validate::two_or_more_numbers)
        .with_aliases(&["sub"]),
    ExpressionEvaluator::new("*", evaluate_multiply, ReturnType::NUMBER, validate::two_or_more_numbers)
        .with_aliases(&["mul"]),
    ExpressionEvaluator::new("/", evaluate_divide, ReturnType::NUMBER, validate::two_or_more_numbers)
        .with_aliases(&["div"]),
    ExpressionEvaluator::new("%", evaluate_mod, ReturnType::NUMBER, validate::binary_number)
        .with_aliases(&["mod"]),
    ExpressionEvaluator::new("^", evaluate_power, ReturnType::NUMBER, validate::two_or_more_numbers)
        .with_aliases(&["exp"]),
    ExpressionEvaluator::new("min", evaluate_min, ReturnType::NUMBER, validate_extremum),
    ExpressionEvaluator::new("max", evaluate_max, ReturnType::NUMBER, validate_extremum),
    ExpressionEvaluator::new("average", evaluate_average, ReturnType::NUMBER, validate_numeric_list),
    ExpressionEvaluator::new("sum", evaluate_sum, ReturnType::NUMBER, validate_numeric_list),
    ExpressionEvaluator::new("range", evaluate_range, ReturnType::ARRAY, validate::binary_number),
    ExpressionEvaluator::new("floor", evaluate_floor, ReturnType::NUMBER, validate::unary_number),
    ExpressionEvaluator::new("ceiling", evaluate_ceiling, ReturnType::NUMBER, validate::unary_number),
    ExpressionEvaluator::new("round", evaluate_round, ReturnType::NUMBER, validate_round),
    ExpressionEvaluator::new("abs", evaluate_abs, ReturnType::NUMBER, validate::unary_number),
    ExpressionEvaluator::new("sqrt", evaluate_sqrt, ReturnType::NUMBER, validate::unary_number),
    ExpressionEvaluator::new("rand", evaluate_rand, ReturnType::NUMBER, validate::binary_number),
];

// ============================================================================
// Validators
// ============================================================================

fn validate_add(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity_and_any_type(
        expression,
        2,
        None,
        ReturnType::STRING | ReturnType::NUMBER,
    )
}

fn validate_extremum(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity_and_any_type(
        expression,
        1,
        None,
        ReturnType::NUMBER | ReturnType::ARRAY,
    )
}

fn validate_numeric_list(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity_and_any_type(expression, 1, Some(1), ReturnType::ARRAY)
}

fn validate_round(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(expression, &[ReturnType::NUMBER], &[ReturnType::NUMBER])
}

// ============================================================================
// Binary arithmetic
// ============================================================================

fn numbers(left: &Value, right: &Value) -> Result<(Num, Num), EvalError> {
    match (Num::from_value(left), Num::from_value(right)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(EvalError::new(format!(
            "Arithmetic cannot be applied to operands of type '{}' and '{}'.",
            type_name(left),
            type_name(right)
        ))),
    }
}

/// Apply `int_op` when both sides are integers and it succeeds, `float_op` otherwise.
fn arithmetic(
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> EvalResult {
    let (a, b) = numbers(left, right)?;
    if let (Num::Int(x), Num::Int(y)) = (a, b) {
        if let Some(result) = int_op(x, y) {
            return Ok(Value::from(result));
        }
    }
    float(float_op(a.as_f64(), b.as_f64()))
}

fn add_pair(left: Value, right: Value) -> EvalResult {
    if left.is_string() || right.is_string() {
        return Ok(Value::String(to_text(&left) + &to_text(&right)));
    }
    if left.is_null() || right.is_null() {
        return Err(EvalError::new(format!(
            "Operator '+' or add cannot be applied to operands of type '{}' and {}.",
            type_name(&left),
            type_name(&right)
        )));
    }
    arithmetic(&left, &right, i64::checked_add, |a, b| a + b)
}

fn evaluate_add(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_sequence(
        expression,
        memory,
        options,
        Some(verify_number_or_string_or_null),
        add_pair,
    )
}

fn evaluate_subtract(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_sequence(expression, memory, options, Some(verify_number), |a, b| {
        arithmetic(&a, &b, i64::checked_sub, |x, y| x - y)
    })
}

fn evaluate_multiply(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_sequence(expression, memory, options, Some(verify_number), |a, b| {
        arithmetic(&a, &b, i64::checked_mul, |x, y| x * y)
    })
}

fn verify_divisor(value: &Value, child: &Expression, index: usize) -> Result<(), EvalError> {
    verify_number(value, child, index)?;
    if index > 0 && Num::from_value(value).is_some_and(|n| n.as_f64() == 0.0) {
        return Err(EvalError::new("Cannot divide by 0."));
    }
    Ok(())
}

fn exact_division(x: i64, y: i64) -> Option<i64> {
    if y != 0 && x.checked_rem(y)? == 0 {
        x.checked_div(y)
    } else {
        None
    }
}

fn evaluate_divide(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_sequence(expression, memory, options, Some(verify_divisor), |a, b| {
        arithmetic(&a, &b, exact_division, |x, y| x / y)
    })
}

fn evaluate_mod(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_number), |args| {
        let (_, divisor) = numbers(&args[0], &args[1])?;
        if divisor.as_f64() == 0.0 {
            return Err(EvalError::new("Cannot mod by 0."));
        }
        arithmetic(&args[0], &args[1], i64::checked_rem, |x, y| x % y)
    })
}

fn checked_power(base: i64, exponent: i64) -> Option<i64> {
    let exponent = u32::try_from(exponent).ok()?;
    base.checked_pow(exponent)
}

fn evaluate_power(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_sequence(expression, memory, options, Some(verify_number), |a, b| {
        arithmetic(&a, &b, checked_power, f64::powf)
    })
}

// ============================================================================
// Aggregates
// ============================================================================

/// Flatten `min`/`max` arguments: either numbers or lists of numbers.
fn numeric_arguments(args: &[Value], function: &str) -> Result<Vec<Num>, EvalError> {
    let mut result = Vec::new();
    for arg in args {
        match arg {
            Value::Array(items) => {
                for item in items {
                    result.push(Num::from_value(item).ok_or_else(|| {
                        EvalError::new(format!("{} is not a number in {}.", item, function))
                    })?);
                }
            }
            _ => result.push(Num::from_value(arg).ok_or_else(|| {
                EvalError::new(format!("{} is not a number in {}.", arg, function))
            })?),
        }
    }
    if result.is_empty() {
        return Err(EvalError::new(format!("{} needs at least one number.", function)));
    }
    Ok(result)
}

fn extremum(args: Vec<Value>, function: &str, prefer_right: fn(f64, f64) -> bool) -> EvalResult {
    let values = numeric_arguments(&args, function)?;
    let mut best = values[0];
    for candidate in values.into_iter().skip(1) {
        if prefer_right(best.as_f64(), candidate.as_f64()) {
            best = candidate;
        }
    }
    best.into_value()
}

fn evaluate_min(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        extremum(args, "min", |best, candidate| candidate < best)
    })
}

fn evaluate_max(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        extremum(args, "max", |best, candidate| candidate > best)
    })
}

fn sum_of(items: &[Value]) -> EvalResult {
    let mut total = Num::Int(0);
    for item in items {
        let Some(n) = Num::from_value(item) else {
            return Err(EvalError::new(format!("{} is not a number.", item)));
        };
        total = match (total, n) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_add(b)
                .map(Num::Int)
                .unwrap_or(Num::Float(a as f64 + b as f64)),
            (a, b) => Num::Float(a.as_f64() + b.as_f64()),
        };
    }
    total.into_value()
}

fn evaluate_sum(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_numeric_list), |args| {
        sum_of(args[0].as_array().map(Vec::as_slice).unwrap_or_default())
    })
}

fn evaluate_average(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_numeric_list), |args| {
        let items = args[0].as_array().map(Vec::as_slice).unwrap_or_default();
        if items.is_empty() {
            return Err(EvalError::new(format!("{} is empty.", expression.children()[0])));
        }
        let total: f64 = items.iter().filter_map(crate::value::as_f64).sum();
        float(total / items.len() as f64)
    })
}

fn evaluate_range(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_number), |args| {
        let start = integer_arg(&args[0], "range", "start")?;
        let count = integer_arg(&args[1], "range", "count")?;
        if count <= 0 {
            return Err(EvalError::new(format!(
                "The second parameter {} should be more than zero.",
                count
            )));
        }
        Ok(Value::Array((start..start.saturating_add(count)).map(Value::from).collect()))
    })
}

// ============================================================================
// Rounding and unary functions
// ============================================================================

fn unary_number(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    function: fn(Num) -> EvalResult,
) -> EvalResult {
    let args = evaluate_children(expression, memory, options, Some(verify_number))?;
    match Num::from_value(&args[0]) {
        Some(n) => function(n),
        None => Err(EvalError::new(format!("{} is not a number.", expression.children()[0]))),
    }
}

fn evaluate_floor(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    unary_number(expression, memory, options, |n| match n {
        Num::Int(i) => Ok(Value::from(i)),
        Num::Float(f) => integral_or_float(f.floor()),
    })
}

fn evaluate_ceiling(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    unary_number(expression, memory, options, |n| match n {
        Num::Int(i) => Ok(Value::from(i)),
        Num::Float(f) => integral_or_float(f.ceil()),
    })
}

fn evaluate_abs(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    unary_number(expression, memory, options, |n| match n {
        Num::Int(i) => i
            .checked_abs()
            .map(Value::from)
            .ok_or_else(|| EvalError::new(format!("abs({}) overflows.", i))),
        Num::Float(f) => float(f.abs()),
    })
}

fn evaluate_sqrt(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    unary_number(expression, memory, options, |n| {
        let x = n.as_f64();
        if x < 0.0 {
            return Err(EvalError::new(format!("Cannot take the square root of {}.", x)));
        }
        float(x.sqrt())
    })
}

/// Round to `digits` decimals using the exact decimal expansion of `x`.
fn round_to(x: f64, digits: usize) -> EvalResult {
    let text = format!("{:.*}", digits, x);
    let rounded: f64 = text
        .parse()
        .map_err(|_| EvalError::new(format!("Cannot round {}.", x)))?;
    if digits == 0 {
        integral_or_float(rounded)
    } else {
        float(rounded)
    }
}

fn evaluate_round(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_number), |args| {
        let digits = match args.get(1) {
            Some(digits) => integer_arg(digits, "round", "precision")?,
            None => 0,
        };
        if !(0..=15).contains(&digits) {
            return Err(EvalError::new(
                "The second parameter must be an integer between 0 and 15.",
            ));
        }
        match Num::from_value(&args[0]) {
            Some(Num::Int(i)) => Ok(Value::from(i)),
            Some(Num::Float(f)) => round_to(f, digits as usize),
            None => Err(EvalError::new(format!("{} is not a number.", args[0]))),
        }
    })
}

fn evaluate_rand(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_number), |args| {
        let min = integer_arg(&args[0], "rand", "minimum")?;
        let max = integer_arg(&args[1], "rand", "maximum")?;
        if min >= max {
            return Err(EvalError::new(format!("{} should be less than {}.", min, max)));
        }
        Ok(Value::from(rand::thread_rng().gen_range(min..max)))
    })
}
