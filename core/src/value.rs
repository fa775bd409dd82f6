//! Helpers over the dynamic runtime value.
//!
//! Values are plain `serde_json::Value`s (insertion-ordered objects). Integers
//! and floats are kept apart: `3` stays an `i64`, `3.0` stays an `f64`.

use core::cmp::Ordering;

use serde_json::{Map, Number, Value};

use crate::evaluator::EvalError;

/// Absolute tolerance used when comparing numbers for equality.
pub const EQUALITY_TOLERANCE: f64 = 1e-8;

/// Numeric view of a value, keeping integers exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub fn from_value(value: &Value) -> Option<Num> {
        let Value::Number(n) = value else {
            return None;
        };
        if let Some(i) = n.as_i64() {
            Some(Num::Int(i))
        } else {
            n.as_f64().map(Num::Float)
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    /// Integer view, accepting floats with no fractional part.
    pub fn as_integer(self) -> Option<i64> {
        match self {
            Num::Int(i) => Some(i),
            Num::Float(f) if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 => {
                Some(f as i64)
            }
            Num::Float(_) => None,
        }
    }

    pub fn into_value(self) -> Result<Value, EvalError> {
        match self {
            Num::Int(i) => Ok(Value::from(i)),
            Num::Float(f) => float(f),
        }
    }
}

/// Build a float value, rejecting NaN and infinities.
pub fn float(value: f64) -> Result<Value, EvalError> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| EvalError::new(format!("{} is not a finite number.", value)))
}

/// Build a number value, collapsing integral floats to integers.
pub fn integral_or_float(value: f64) -> Result<Value, EvalError> {
    match Num::Float(value).as_integer() {
        Some(i) => Ok(Value::from(i)),
        None => float(value),
    }
}

pub fn is_number(value: &Value) -> bool {
    matches!(value, Value::Number(_))
}

pub fn is_integer(value: &Value) -> bool {
    matches!(Num::from_value(value), Some(Num::Int(_)))
}

pub fn as_f64(value: &Value) -> Option<f64> {
    Num::from_value(value).map(Num::as_f64)
}

/// Integer argument, accepting integral floats.
pub fn as_integer(value: &Value) -> Option<i64> {
    Num::from_value(value).and_then(Num::as_integer)
}

/// Short type description used in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null object",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Text form used by string concatenation, `join` and `string()`.
///
/// Strings are inserted as-is, `null` becomes the empty string, integral
/// floats lose their fractional part and containers are serialized as JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(_) => number_text(value),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn number_text(value: &Value) -> String {
    match Num::from_value(value) {
        Some(Num::Int(i)) => i.to_string(),
        Some(Num::Float(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(Num::Float(f)) => f.to_string(),
        None => value.to_string(),
    }
}

/// Structural equality with numeric tolerance.
///
/// Two empty arrays or two empty objects are always equal.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => match (Num::from_value(left), Num::from_value(right)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
            (Some(a), Some(b)) => (a.as_f64() - b.as_f64()).abs() < EQUALITY_TOLERANCE,
            _ => false,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => left == right,
    }
}

/// Ordering between two numbers or two strings; anything else is unordered.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => {
            match (Num::from_value(left)?, Num::from_value(right)?) {
                (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
                (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
            }
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Case-sensitive property lookup with a case-insensitive fallback.
pub fn property<'v>(object: &'v Map<String, Value>, name: &str) -> Option<&'v Value> {
    object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

/// Mutable counterpart of [`property`].
pub fn property_mut<'v>(object: &'v mut Map<String, Value>, name: &str) -> Option<&'v mut Value> {
    let key = if object.contains_key(name) {
        name.to_string()
    } else {
        object
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned()?
    };
    object.get_mut(&key)
}
