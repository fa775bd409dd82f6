use thiserror::Error;

use crate::api::{Diagnostic, Severity};
use crate::parser::{Rule, Span};
use crate::types::ValidationError;

/// Parser error with context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub source: String,
    pub span: Span,
}

/// Specific kinds of parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("Expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Unterminated string starting with {delimiter}")]
    UnterminatedString { delimiter: char },

    #[error("Unterminated interpolation, '${{' has no matching '}}'")]
    UnterminatedInterpolation,

    #[error("Invalid escape sequence '{text}'")]
    InvalidEscape { text: String },

    #[error("Invalid number literal '{text}'")]
    InvalidNumber { text: String },

    #[error("{name} does not have an evaluator, it's not a built-in function or a custom function.")]
    UnknownFunction { name: String },

    #[error("{message}")]
    Arity { function: String, message: String },

    #[error("{message}")]
    Type { function: String, message: String },

    #[error("Expression nesting depth {depth} exceeds maximum of {max_depth} levels")]
    MaxDepthExceeded { depth: usize, max_depth: usize },

    #[error("{message}")]
    Other { message: String },
}

impl From<ValidationError> for ParseErrorKind {
    fn from(err: ValidationError) -> Self {
        let function = err.function().to_string();
        let message = err.to_string();
        match err {
            ValidationError::Arity { .. } => ParseErrorKind::Arity { function, message },
            ValidationError::Type { .. } | ValidationError::Invalid { .. } => {
                ParseErrorKind::Type { function, message }
            }
        }
    }
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, source: String, span: Span) -> Self {
        Self { kind, source, span }
    }

    /// 1-based line and column where the error starts.
    pub fn line_col(&self) -> (usize, usize) {
        self.span.line_col(&self.source)
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (code, help) = match &self.kind {
            ParseErrorKind::UnexpectedToken { .. } => ("P001", vec![]),
            ParseErrorKind::UnterminatedString { delimiter } => (
                "P002",
                vec![format!("Add the missing closing {}", delimiter)],
            ),
            ParseErrorKind::UnterminatedInterpolation => {
                ("P003", vec!["Close the interpolation with '}'".to_string()])
            }
            ParseErrorKind::InvalidEscape { .. } => (
                "P004",
                vec!["A backslash must be followed by the character it escapes".to_string()],
            ),
            ParseErrorKind::InvalidNumber { .. } => {
                ("P005", vec!["Check the number format".to_string()])
            }
            ParseErrorKind::UnknownFunction { .. } => ("P006", vec![]),
            ParseErrorKind::Arity { .. } => ("P007", vec![]),
            ParseErrorKind::Type { .. } => ("P008", vec![]),
            ParseErrorKind::MaxDepthExceeded { .. } => (
                "P009",
                vec!["Reduce nesting or simplify the expression".to_string()],
            ),
            ParseErrorKind::Other { .. } => ("P999", vec![]),
        };

        Diagnostic {
            severity: Severity::Error,
            message: self.message(),
            span: self.span.clone(),
            help,
            code: Some(code.to_string()),
        }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (line, column) = self.line_col();
        write!(f, "{} at line {}, column {}", self.kind, line, column)
    }
}

impl std::error::Error for ParseError {}

/// Convert Pest error to human-readable ParseError
pub fn convert_pest_error(err: pest::error::Error<Rule>, source: &str) -> ParseError {
    use pest::error::ErrorVariant;

    let span = match err.location {
        pest::error::InputLocation::Pos(pos) => Span(pos..pos),
        pest::error::InputLocation::Span((start, end)) => Span(start..end),
    };

    let kind = match err.variant {
        ErrorVariant::ParsingError {
            positives,
            negatives,
        } => {
            let expected = format_expected_rules(&positives);
            let found = match negatives.first() {
                Some(rule) => describe_rule(*rule).to_string(),
                None => describe_found(source, span.0.start),
            };
            ParseErrorKind::UnexpectedToken { expected, found }
        }
        ErrorVariant::CustomError { message } => ParseErrorKind::Other { message },
    };

    ParseError::new(kind, source.to_string(), span)
}

/// What sits at `pos`: the next word or character, or the end of input.
fn describe_found(source: &str, pos: usize) -> String {
    let rest = source.get(pos..).unwrap_or("").trim_start();
    match rest.chars().next() {
        None => "end of input".to_string(),
        Some(c) if c.is_alphanumeric() => {
            let word: String = rest
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            format!("'{}'", word)
        }
        Some(c) => format!("'{}'", c),
    }
}

fn describe_rule(rule: Rule) -> &'static str {
    match rule {
        Rule::identifier => "identifier",
        Rule::number => "number",
        Rule::string => "string",
        Rule::template => "template string",
        Rule::EOI => "end of input",
        Rule::grouped => "parenthesized expression",
        Rule::array => "array literal",
        Rule::object => "object literal",
        Rule::lambda => "lambda argument",
        Rule::neg | Rule::pos | Rule::not => "unary operator",
        Rule::member_op | Rule::index_op | Rule::call_op => "accessor",
        _ => "operator",
    }
}

/// Format expected rules in a human-readable way
fn format_expected_rules(rules: &[Rule]) -> String {
    let mut concepts: Vec<&str> = Vec::new();

    for rule in rules {
        let concept = match rule {
            Rule::number | Rule::string | Rule::template | Rule::array | Rule::object => "literal",
            Rule::identifier => "identifier",
            Rule::EOI => "end of input",
            Rule::or
            | Rule::and
            | Rule::eq
            | Rule::ne
            | Rule::lt
            | Rule::le
            | Rule::gt
            | Rule::ge
            | Rule::concat
            | Rule::add
            | Rule::sub
            | Rule::mul
            | Rule::div
            | Rule::modulo
            | Rule::pow => "operator",
            _ => "expression",
        };
        if !concepts.contains(&concept) {
            concepts.push(concept);
        }
    }

    match concepts.split_last() {
        None => "something else".to_string(),
        Some((only, [])) => only.to_string(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}
