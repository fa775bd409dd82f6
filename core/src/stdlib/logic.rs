//! Logical connectives and conditionals.
//!
//! Conditions are evaluated with null substitution turned off, and a condition
//! that fails to evaluate counts as `false` rather than failing the whole
//! expression.

use serde_json::Value;

use super::apply::apply;
use crate::evaluator::{EvalResult, Options, is_logic_true};
use crate::expression::{Expression, ExpressionEvaluator};
use crate::memory::Memory;
use crate::types::{ReturnType, ValidationError, validate};

pub(super) static EVALUATORS: &[ExpressionEvaluator] = &[
    ExpressionEvaluator::new("&&", evaluate_and, ReturnType::BOOLEAN, validate_connective)
        .with_aliases(&["and"]),
    ExpressionEvaluator::new("||", evaluate_or, ReturnType::BOOLEAN, validate_connective)
        .with_aliases(&["or"]),
    ExpressionEvaluator::new("!", evaluate_not, ReturnType::BOOLEAN, validate::unary)
        .with_aliases(&["not"]),
    ExpressionEvaluator::new("if", evaluate_if, ReturnType::OBJECT, validate_if),
    ExpressionEvaluator::new("coalesce", evaluate_coalesce, ReturnType::OBJECT, validate::at_least_one),
];

fn validate_connective(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity(expression, 2, None)
}

fn validate_if(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity(expression, 3, Some(3))
}

/// Evaluate a condition; failures count as false.
fn condition(child: &Expression, memory: &mut dyn Memory, options: &Options) -> bool {
    match child.try_evaluate(memory, &options.without_null_substitution()) {
        Ok(value) => is_logic_true(&value),
        Err(err) => {
            tracing::trace!(condition = %child, error = %err, "condition failed, treated as false");
            false
        }
    }
}

fn evaluate_and(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let all = expression
        .children()
        .iter()
        .all(|child| condition(child, memory, options));
    Ok(Value::Bool(all))
}

fn evaluate_or(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let any = expression
        .children()
        .iter()
        .any(|child| condition(child, memory, options));
    Ok(Value::Bool(any))
}

fn evaluate_not(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    Ok(Value::Bool(!condition(&expression.children()[0], memory, options)))
}

fn evaluate_if(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let [test, then, otherwise] = expression.children() else {
        return Ok(Value::Null);
    };
    if condition(test, memory, options) {
        then.try_evaluate(memory, options)
    } else {
        otherwise.try_evaluate(memory, options)
    }
}

fn evaluate_coalesce(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, None, |args| {
        args.into_iter().find(|arg| !arg.is_null()).unwrap_or(Value::Null)
    })
}
