//! Parse-time validators for call nodes.
//!
//! Each builtin names one of these (or a small wrapper around them) as its
//! validator. They check the number of children and that every child's
//! advertised [`ReturnType`] intersects what the builtin expects.

use thiserror::Error;

use super::ReturnType;
use crate::expression::Expression;

/// A call node rejected by its builtin's validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{expression} should have {expected} arguments.")]
    Arity {
        function: String,
        expression: String,
        expected: String,
    },

    #[error("{child} is not a {expected} expression in {expression}.")]
    Type {
        function: String,
        expression: String,
        child: String,
        expected: ReturnType,
    },

    #[error("{message}")]
    Invalid { function: String, message: String },
}

impl ValidationError {
    pub fn invalid(expression: &Expression, message: impl Into<String>) -> Self {
        ValidationError::Invalid {
            function: expression.expr_type().to_string(),
            message: message.into(),
        }
    }

    /// The builtin whose validator failed.
    pub fn function(&self) -> &str {
        match self {
            ValidationError::Arity { function, .. }
            | ValidationError::Type { function, .. }
            | ValidationError::Invalid { function, .. } => function,
        }
    }
}

fn describe_bounds(min: usize, max: Option<usize>) -> String {
    match max {
        Some(max) if max == min => format!("{}", min),
        Some(max) => format!("between {} and {}", min, max),
        None => format!("at least {}", min),
    }
}

/// Check the number of children. `max = None` means unbounded.
pub fn arity(expression: &Expression, min: usize, max: Option<usize>) -> Result<(), ValidationError> {
    let count = expression.children().len();
    if count < min || max.is_some_and(|max| count > max) {
        return Err(ValidationError::Arity {
            function: expression.expr_type().to_string(),
            expression: expression.to_string(),
            expected: describe_bounds(min, max),
        });
    }
    Ok(())
}

/// Check one child against an expected type.
pub fn child_type(
    expression: &Expression,
    child: &Expression,
    expected: ReturnType,
) -> Result<(), ValidationError> {
    if child.return_type().satisfies(expected) {
        Ok(())
    } else {
        Err(ValidationError::Type {
            function: expression.expr_type().to_string(),
            expression: expression.to_string(),
            child: child.to_string(),
            expected,
        })
    }
}

/// Arity bounds plus one expected type shared by every child.
pub fn arity_and_any_type(
    expression: &Expression,
    min: usize,
    max: Option<usize>,
    expected: ReturnType,
) -> Result<(), ValidationError> {
    arity(expression, min, max)?;
    expression
        .children()
        .iter()
        .try_for_each(|child| child_type(expression, child, expected))
}

/// Positional types: every `expected` child is required, `optional` ones may follow.
pub fn order(
    expression: &Expression,
    optional: &[ReturnType],
    expected: &[ReturnType],
) -> Result<(), ValidationError> {
    arity(expression, expected.len(), Some(expected.len() + optional.len()))?;
    expected
        .iter()
        .chain(optional)
        .zip(expression.children())
        .try_for_each(|(ty, child)| child_type(expression, child, *ty))
}

pub fn no_children(expression: &Expression) -> Result<(), ValidationError> {
    arity(expression, 0, Some(0))
}

pub fn unary(expression: &Expression) -> Result<(), ValidationError> {
    arity(expression, 1, Some(1))
}

pub fn unary_number(expression: &Expression) -> Result<(), ValidationError> {
    arity_and_any_type(expression, 1, Some(1), ReturnType::NUMBER)
}

pub fn unary_string(expression: &Expression) -> Result<(), ValidationError> {
    arity_and_any_type(expression, 1, Some(1), ReturnType::STRING)
}

pub fn unary_boolean(expression: &Expression) -> Result<(), ValidationError> {
    arity_and_any_type(expression, 1, Some(1), ReturnType::BOOLEAN)
}

pub fn binary(expression: &Expression) -> Result<(), ValidationError> {
    arity(expression, 2, Some(2))
}

pub fn binary_number(expression: &Expression) -> Result<(), ValidationError> {
    arity_and_any_type(expression, 2, Some(2), ReturnType::NUMBER)
}

pub fn two_or_more_numbers(expression: &Expression) -> Result<(), ValidationError> {
    arity_and_any_type(expression, 2, None, ReturnType::NUMBER)
}

pub fn at_least_one(expression: &Expression) -> Result<(), ValidationError> {
    arity(expression, 1, None)
}

pub fn at_least_one_number(expression: &Expression) -> Result<(), ValidationError> {
    arity_and_any_type(expression, 1, None, ReturnType::NUMBER)
}

pub fn any_arity(_expression: &Expression) -> Result<(), ValidationError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call(name: &str, children: Vec<Expression>) -> Expression {
        let evaluator = crate::stdlib::FunctionTable::global()
            .lookup(name)
            .expect("builtin exists");
        Expression::call(evaluator, children)
    }

    #[test]
    fn test_arity_message_names_the_call() {
        let expression = call("substring", vec![]);
        let err = arity(&expression, 2, Some(3)).unwrap_err();
        assert_eq!(err.function(), "substring");
        assert_eq!(
            err.to_string(),
            "substring() should have between 2 and 3 arguments."
        );
    }

    #[test]
    fn test_object_children_pass_type_checks() {
        let accessor = call("Accessor", vec![Expression::constant("x")]);
        let expression = call("sqrt", vec![accessor]);
        assert!(unary_number(&expression).is_ok());
    }

    #[test]
    fn test_type_mismatch_names_the_child() {
        let expression = call("sqrt", vec![Expression::constant("nine")]);
        let err = unary_number(&expression).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'nine' is not a NUMBER expression in sqrt('nine')."
        );
    }

    #[test]
    fn test_order_checks_optional_children() {
        let ok = call(
            "substring",
            vec![Expression::constant("hello"), Expression::constant(1)],
        );
        assert!(order(&ok, &[ReturnType::NUMBER], &[ReturnType::STRING, ReturnType::NUMBER]).is_ok());

        let bad = call(
            "substring",
            vec![
                Expression::constant("hello"),
                Expression::constant(1),
                Expression::constant("x"),
            ],
        );
        assert!(order(&bad, &[ReturnType::NUMBER], &[ReturnType::STRING, ReturnType::NUMBER]).is_err());
    }
}
