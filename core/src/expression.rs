//! The immutable expression tree.
//!
//! A tree is built once by the parser and never changes afterwards, so it can
//! be shared freely between threads and evaluations. Every call node carries
//! the builtin it was resolved to at parse time; evaluation calls straight
//! through that function pointer without looking names up again.

use core::fmt;

use serde_json::Value;

use crate::evaluator::{EvalResult, Options};
use crate::memory::Memory;
use crate::types::{ReturnType, ValidationError};
use crate::value::Num;

/// Name of the property-access builtin.
pub const ACCESSOR: &str = "Accessor";
/// Name of the index-access builtin.
pub const ELEMENT: &str = "Element";
/// Expression type reported by constants.
pub const CONSTANT: &str = "Constant";

/// Evaluates a call node whose children are available through the node.
pub type EvaluateFn = fn(&Expression, &mut dyn Memory, &Options) -> EvalResult;

/// Checks a freshly built call node.
pub type ValidateFn = fn(&Expression) -> Result<(), ValidationError>;

/// A registered builtin: how to evaluate it, what it returns, how to check it.
pub struct ExpressionEvaluator {
    name: &'static str,
    aliases: &'static [&'static str],
    evaluate: EvaluateFn,
    return_type: ReturnType,
    validate: ValidateFn,
}

impl ExpressionEvaluator {
    pub const fn new(
        name: &'static str,
        evaluate: EvaluateFn,
        return_type: ReturnType,
        validate: ValidateFn,
    ) -> Self {
        Self {
            name,
            aliases: &[],
            evaluate,
            return_type,
            validate,
        }
    }

    pub const fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    pub fn return_type(&self) -> ReturnType {
        self.return_type
    }

    pub fn validate(&self, expression: &Expression) -> Result<(), ValidationError> {
        (self.validate)(expression)
    }
}

impl fmt::Debug for ExpressionEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionEvaluator")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// One node of an expression tree.
#[derive(Clone)]
pub enum Expression {
    /// A literal value.
    Constant(Value),
    /// A builtin applied to ordered children.
    Call {
        evaluator: &'static ExpressionEvaluator,
        children: Vec<Expression>,
    },
}

impl Expression {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Constant(value.into())
    }

    /// Build a call node without validating it.
    pub fn call(evaluator: &'static ExpressionEvaluator, children: Vec<Expression>) -> Self {
        Expression::Call {
            evaluator,
            children,
        }
    }

    /// Build a call node and run the builtin's validator on it.
    pub fn validated(
        evaluator: &'static ExpressionEvaluator,
        children: Vec<Expression>,
    ) -> Result<Self, ValidationError> {
        let expression = Expression::call(evaluator, children);
        evaluator.validate(&expression)?;
        Ok(expression)
    }

    /// The builtin name, or `"Constant"` for literals.
    pub fn expr_type(&self) -> &'static str {
        match self {
            Expression::Constant(_) => CONSTANT,
            Expression::Call { evaluator, .. } => evaluator.name(),
        }
    }

    pub fn children(&self) -> &[Expression] {
        match self {
            Expression::Constant(_) => &[],
            Expression::Call { children, .. } => children,
        }
    }

    pub fn return_type(&self) -> ReturnType {
        match self {
            Expression::Constant(value) => ReturnType::of_value(value),
            Expression::Call { evaluator, .. } => evaluator.return_type(),
        }
    }

    pub fn as_constant(&self) -> Option<&Value> {
        match self {
            Expression::Constant(value) => Some(value),
            Expression::Call { .. } => None,
        }
    }

    /// The bound name of a bare `Accessor(name)` node.
    pub fn accessor_name(&self) -> Option<&str> {
        match self.children() {
            [Expression::Constant(Value::String(name))] if self.expr_type() == ACCESSOR => {
                Some(name)
            }
            _ => None,
        }
    }

    /// Evaluate against `memory`.
    ///
    /// A path that resolves to nothing yields `Ok(Value::Null)`.
    pub fn try_evaluate(&self, memory: &mut dyn Memory, options: &Options) -> EvalResult {
        match self {
            Expression::Constant(value) => Ok(value.clone()),
            Expression::Call { evaluator, .. } => (evaluator.evaluate)(self, memory, options),
        }
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expression::Constant(a), Expression::Constant(b)) => a == b,
            (
                Expression::Call {
                    evaluator: a,
                    children: left,
                },
                Expression::Call {
                    evaluator: b,
                    children: right,
                },
            ) => a.name() == b.name() && left == right,
            _ => false,
        }
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Expression::Call {
                evaluator,
                children,
            } => f
                .debug_struct("Call")
                .field("function", &evaluator.name())
                .field("children", children)
                .finish(),
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

const INFIX_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "^", "==", "!=", "<", "<=", ">", ">=", "&&", "||",
];

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(value) => write_literal(f, value),
            Expression::Call { .. } => {
                let name = self.expr_type();
                let children = self.children();
                match (name, children) {
                    (ACCESSOR, [Expression::Constant(Value::String(property))]) => {
                        write!(f, "{}", property)
                    }
                    (ACCESSOR, [Expression::Constant(Value::String(property)), instance]) => {
                        write!(f, "{}.{}", instance, property)
                    }
                    (ELEMENT, [instance, index]) => write!(f, "{}[{}]", instance, index),
                    ("!", [operand]) => write!(f, "!({})", operand),
                    (op, [_, _, ..]) if INFIX_OPERATORS.contains(&op) => {
                        write!(f, "(")?;
                        for (i, child) in children.iter().enumerate() {
                            if i > 0 {
                                write!(f, " {} ", op)?;
                            }
                            write!(f, "{}", child)?;
                        }
                        write!(f, ")")
                    }
                    _ => {
                        write!(f, "{}(", name)?;
                        write_list(f, children)?;
                        write!(f, ")")
                    }
                }
            }
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Render a value as source text that parses back to an equal value.
pub fn render_literal(value: &Value) -> String {
    struct Literal<'a>(&'a Value);
    impl fmt::Display for Literal<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write_literal(f, self.0)
        }
    }
    Literal(value).to_string()
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => write!(f, "null"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Number(_) => match Num::from_value(value) {
            Some(Num::Float(x)) if x.fract() == 0.0 => write!(f, "{:.1}", x),
            Some(Num::Float(x)) => write!(f, "{}", x),
            Some(Num::Int(i)) => write!(f, "{}", i),
            None => write!(f, "{}", value),
        },
        Value::String(s) => write_quoted(f, s),
        Value::Array(items) => {
            write!(f, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_literal(f, item)?;
            }
            write!(f, "]")
        }
        Value::Object(map) => {
            write!(f, "{{")?;
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_quoted(f, key)?;
                write!(f, ": ")?;
                write_literal(f, item)?;
            }
            write!(f, "}}")
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "'")?;
    for c in s.chars() {
        match c {
            '\'' => write!(f, "\\'")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "'")
}
