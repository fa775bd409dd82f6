//! Absolute URI component extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::apply::{apply_with_error, verify_string};
use crate::evaluator::{EvalError, EvalResult, Options};
use crate::expression::{Expression, ExpressionEvaluator};
use crate::memory::Memory;
use crate::types::{ReturnType, validate};

static URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?:[^@/?#]*@)?(?P<host>\[[^\]]*\]|[^:/?#]*)(?::(?P<port>\d+))?(?P<path>[^?#]*)(?P<query>\?[^#]*)?(?:#.*)?$",
    )
    .expect("URI pattern is valid")
});

pub(super) static EVALUATORS: &[ExpressionEvaluator] = &[
    ExpressionEvaluator::new("uriHost", evaluate_uri_host, ReturnType::STRING, validate::unary_string),
    ExpressionEvaluator::new("uriPath", evaluate_uri_path, ReturnType::STRING, validate::unary_string),
    ExpressionEvaluator::new(
        "uriPathAndQuery",
        evaluate_uri_path_and_query,
        ReturnType::STRING,
        validate::unary_string,
    ),
    ExpressionEvaluator::new("uriPort", evaluate_uri_port, ReturnType::NUMBER, validate::unary_string),
    ExpressionEvaluator::new("uriQuery", evaluate_uri_query, ReturnType::STRING, validate::unary_string),
    ExpressionEvaluator::new("uriScheme", evaluate_uri_scheme, ReturnType::STRING, validate::unary_string),
];

/// The parts of an absolute URI the builtins expose.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Uri {
    scheme: String,
    host: String,
    port: Option<u16>,
    path: String,
    query: String,
}

impl Uri {
    fn parse(text: &str) -> Option<Uri> {
        let captures = URI.captures(text.trim())?;
        let text_of = |name: &str| captures.name(name).map_or("", |m| m.as_str());
        let host = text_of("host");
        if host.is_empty() {
            return None;
        }
        let port = match captures.name("port") {
            Some(port) => Some(port.as_str().parse().ok()?),
            None => None,
        };
        let path = match text_of("path") {
            "" => "/",
            path => path,
        };
        Some(Uri {
            scheme: text_of("scheme").to_ascii_lowercase(),
            host: host.to_string(),
            port,
            path: path.to_string(),
            query: text_of("query").to_string(),
        })
    }

    /// Explicit port, else the scheme's well-known port, else -1.
    fn effective_port(&self) -> i64 {
        match (self.port, self.scheme.as_str()) {
            (Some(port), _) => i64::from(port),
            (None, "http" | "ws") => 80,
            (None, "https" | "wss") => 443,
            (None, "ftp") => 21,
            (None, _) => -1,
        }
    }
}

fn with_uri(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    extract: fn(Uri) -> Value,
) -> EvalResult {
    apply_with_error(expression, memory, options, Some(verify_string), |args| {
        let text = args[0].as_str().unwrap_or_default();
        Uri::parse(text)
            .map(extract)
            .ok_or_else(|| EvalError::new(format!("{} is not a valid absolute URI.", text)))
    })
}

fn evaluate_uri_host(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    with_uri(expression, memory, options, |uri| Value::String(uri.host))
}

fn evaluate_uri_path(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    with_uri(expression, memory, options, |uri| Value::String(uri.path))
}

fn evaluate_uri_path_and_query(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> EvalResult {
    with_uri(expression, memory, options, |uri| Value::String(uri.path + &uri.query))
}

fn evaluate_uri_port(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    with_uri(expression, memory, options, |uri| Value::from(uri.effective_port()))
}

fn evaluate_uri_query(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    with_uri(expression, memory, options, |uri| Value::String(uri.query))
}

fn evaluate_uri_scheme(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    with_uri(expression, memory, options, |uri| Value::String(uri.scheme))
}
