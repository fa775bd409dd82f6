//! Conversions between value kinds and encodings.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use super::apply::{apply, apply_with_error, verify_string};
use crate::evaluator::{EvalError, EvalResult, Options, is_logic_true};
use crate::expression::{Expression, ExpressionEvaluator};
use crate::memory::Memory;
use crate::types::{ReturnType, validate};
use crate::value::{Num, float, to_text};

pub(super) static EVALUATORS: &[ExpressionEvaluator] = &[
    ExpressionEvaluator::new("int", evaluate_int, ReturnType::NUMBER, validate::unary),
    ExpressionEvaluator::new("float", evaluate_float, ReturnType::NUMBER, validate::unary),
    ExpressionEvaluator::new("string", evaluate_string, ReturnType::STRING, validate::unary),
    ExpressionEvaluator::new("bool", evaluate_bool, ReturnType::BOOLEAN, validate::unary),
    ExpressionEvaluator::new("json", evaluate_json, ReturnType::OBJECT, validate::unary),
    ExpressionEvaluator::new("jsonStringify", evaluate_json_stringify, ReturnType::STRING, validate::unary),
    ExpressionEvaluator::new("base64", evaluate_base64, ReturnType::STRING, validate::unary),
    ExpressionEvaluator::new(
        "base64ToString",
        evaluate_base64_to_string,
        ReturnType::STRING,
        validate::unary_string,
    ),
    ExpressionEvaluator::new("uriComponent", evaluate_uri_component, ReturnType::STRING, validate::unary_string),
    ExpressionEvaluator::new(
        "uriComponentToString",
        evaluate_uri_component_to_string,
        ReturnType::STRING,
        validate::unary_string,
    ),
];

// ============================================================================
// Scalar conversions
// ============================================================================

fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(_) => match Num::from_value(value)? {
            Num::Int(i) => Some(i),
            Num::Float(f) if f.is_finite() && f.abs() < 9.2e18 => Some(f.trunc() as i64),
            Num::Float(_) => None,
        },
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i64))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn evaluate_int(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        to_integer(&args[0])
            .map(Value::from)
            .ok_or_else(|| EvalError::new(format!("parameter {} is not a valid number string.", args[0])))
    })
}

fn evaluate_float(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        let parsed = match &args[0] {
            Value::Number(_) => Num::from_value(&args[0]).map(Num::as_f64),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(f) => float(f),
            None => Err(EvalError::new(format!(
                "parameter {} is not a valid number string.",
                args[0]
            ))),
        }
    })
}

fn evaluate_string(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, None, |args| Value::String(to_text(&args[0])))
}

fn evaluate_bool(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, None, |args| Value::Bool(is_logic_true(&args[0])))
}

// ============================================================================
// JSON
// ============================================================================

fn evaluate_json(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |mut args| match args.swap_remove(0) {
        Value::String(text) => serde_json::from_str(text.trim())
            .map_err(|err| EvalError::new(format!("{} is not valid JSON: {}", text, err))),
        other => Ok(other),
    })
}

fn evaluate_json_stringify(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        serde_json::to_string(&args[0])
            .map(Value::String)
            .map_err(|err| EvalError::new(err.to_string()))
    })
}

// ============================================================================
// Encodings
// ============================================================================

fn evaluate_base64(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, None, |args| {
        Value::String(STANDARD.encode(to_text(&args[0])))
    })
}

fn evaluate_base64_to_string(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_string), |args| {
        let encoded = args[0].as_str().unwrap_or_default();
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|err| EvalError::new(format!("{} is not valid base64: {}", encoded, err)))?;
        String::from_utf8(bytes)
            .map(Value::String)
            .map_err(|_| EvalError::new(format!("{} does not decode to UTF-8 text.", encoded)))
    })
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~')
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub(crate) fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        if is_unreserved(byte) {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

pub(crate) fn percent_decode(text: &str) -> Result<String, EvalError> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = text
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| EvalError::new(format!("{} has an invalid escape at {}.", text, i)))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| EvalError::new(format!("{} does not decode to UTF-8 text.", text)))
}

fn evaluate_uri_component(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply(expression, memory, options, None, |args| {
        Value::String(percent_encode(&to_text(&args[0])))
    })
}

fn evaluate_uri_component_to_string(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_string), |args| {
        percent_decode(args[0].as_str().unwrap_or_default()).map(Value::String)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_int_conversions() {
        assert_eq!(to_integer(&json!("10")), Some(10));
        assert_eq!(to_integer(&json!(10.7)), Some(10));
        assert_eq!(to_integer(&json!("2.0")), Some(2));
        assert_eq!(to_integer(&json!("abc")), None);
        assert_eq!(to_integer(&Value::Null), None);
    }

    #[test]
    fn test_percent_encoding() {
        assert_eq!(percent_encode("http://contoso.com"), "http%3A%2F%2Fcontoso.com");
        assert_eq!(percent_encode("a b~"), "a%20b~");
        assert_eq!(percent_decode("http%3A%2F%2Fcontoso.com").unwrap(), "http://contoso.com");
        assert_eq!(percent_decode("%E2%82%AC").unwrap(), "\u{20ac}");
        assert!(percent_decode("%G1").is_err());
        assert!(percent_decode("%2").is_err());
    }
}
