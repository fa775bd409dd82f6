use lazy_static::lazy_static;
use pest::Parser;
use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;
use serde_json::{Map, Number, Value};

use super::error::{ParseError, ParseErrorKind, convert_pest_error};
use super::syntax::Span;
use crate::expression::{ACCESSOR, ELEMENT, Expression};
use crate::lexer;
use crate::stdlib::FunctionTable;

/// Nesting allowed when no explicit limit is given.
pub const DEFAULT_MAX_DEPTH: usize = 128;

lazy_static! {
    // Note: precedence is defined lowest to highest.
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        // (lowest precedence)
        .op(Op::infix(Rule::or, Assoc::Left))            // `||`
        .op(Op::infix(Rule::and, Assoc::Left))           // `&&`
        .op(
            Op::infix(Rule::lt, Assoc::Left) |
            Op::infix(Rule::le, Assoc::Left) |
            Op::infix(Rule::gt, Assoc::Left) |
            Op::infix(Rule::ge, Assoc::Left)
        )                                               // `<`, `<=`, `>`, `>=`
        .op(Op::infix(Rule::concat, Assoc::Left))        // `&`
        .op(
            Op::infix(Rule::eq, Assoc::Left) |
            Op::infix(Rule::ne, Assoc::Left)
        )                                               // `==`, `!=`
        .op(
            Op::infix(Rule::add, Assoc::Left) |
            Op::infix(Rule::sub, Assoc::Left)
        )                                               // `+`, `-`
        .op(
            Op::infix(Rule::mul, Assoc::Left) |
            Op::infix(Rule::div, Assoc::Left) |
            Op::infix(Rule::modulo, Assoc::Left)
        )                                               // `*`, `/`, `%`
        .op(Op::infix(Rule::pow, Assoc::Right))          // `^` (right-assoc)
        .op(
            Op::prefix(Rule::neg) |
            Op::prefix(Rule::pos) |
            Op::prefix(Rule::not)
        )                                               // `-`, `+`, `!`

        // Postfix operators.
        .op(
            Op::postfix(Rule::member_op) |
            Op::postfix(Rule::index_op) |
            Op::postfix(Rule::call_op)
        )                                               // `.`, `[]`, `()`
        // (highest precedence)
        ;
}

#[derive(Parser)]
#[grammar = "parser/expression.pest"]
pub struct ExpressionParser;

/// Parse `source` into a validated expression tree.
pub fn parse(source: &str) -> Result<Expression, ParseError> {
    parse_with_max_depth(source, DEFAULT_MAX_DEPTH)
}

/// Parse with an explicit nesting limit.
pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<Expression, ParseError> {
    lexer::check(source, max_depth)?;

    let mut pairs = ExpressionParser::parse(Rule::main, source)
        .map_err(|err| convert_pest_error(err, source))?;
    let builder = Builder {
        source,
        functions: FunctionTable::global(),
    };
    let main = pairs.next().ok_or_else(|| builder.other("missing expected pair in rule", Span::at(0)))?;
    let result = match main.into_inner().find(|pair| pair.as_rule() == Rule::expression) {
        Some(expression) => builder.build(expression),
        None => Ok(Expression::constant("")),
    };
    if let Err(err) = &result {
        tracing::debug!(source, error = %err, "parse failed");
    }
    result
}

struct Builder<'s> {
    source: &'s str,
    functions: &'static FunctionTable,
}

impl Builder<'_> {
    fn error(&self, kind: ParseErrorKind, span: Span) -> ParseError {
        ParseError::new(kind, self.source.to_string(), span)
    }

    fn other(&self, message: &str, span: Span) -> ParseError {
        self.error(
            ParseErrorKind::Other {
                message: message.to_string(),
            },
            span,
        )
    }

    /// Resolve `name` and build a validated call node.
    fn call(&self, name: &str, children: Vec<Expression>, span: Span) -> Result<Expression, ParseError> {
        let evaluator = self.functions.lookup(name).ok_or_else(|| {
            self.error(
                ParseErrorKind::UnknownFunction {
                    name: name.to_string(),
                },
                span.clone(),
            )
        })?;
        Expression::validated(evaluator, children).map_err(|err| self.error(err.into(), span))
    }

    fn accessor(&self, name: &str, span: Span) -> Result<Expression, ParseError> {
        self.call(ACCESSOR, vec![Expression::constant(name)], span)
    }

    fn inner<'i>(&self, pair: Pair<'i, Rule>) -> Result<Pair<'i, Rule>, ParseError> {
        let span = Span::from(pair.as_span());
        pair.into_inner()
            .next()
            .ok_or_else(|| self.other("missing expected pair in rule", span))
    }

    fn build(&self, pair: Pair<Rule>) -> Result<Expression, ParseError> {
        let span = Span::from(pair.as_span());
        match pair.as_rule() {
            Rule::expression => PRATT_PARSER
                .map_primary(|primary| self.build(primary))
                .map_prefix(|op, rhs| {
                    let span = Span::from(op.as_span());
                    match op.as_rule() {
                        Rule::neg => self.call("-", vec![Expression::constant(0), rhs?], span),
                        Rule::pos => self.call("+", vec![Expression::constant(0), rhs?], span),
                        Rule::not => self.call("!", vec![rhs?], span),
                        rule => Err(self.other(&format!("Unknown prefix operator: {:?}", rule), span)),
                    }
                })
                .map_infix(|lhs, op, rhs| {
                    let span = Span::from(op.as_span());
                    let name = match op.as_rule() {
                        Rule::or => "||",
                        Rule::and => "&&",
                        Rule::eq => "==",
                        Rule::ne => "!=",
                        Rule::lt => "<",
                        Rule::le => "<=",
                        Rule::gt => ">",
                        Rule::ge => ">=",
                        Rule::concat => "&",
                        Rule::add => "+",
                        Rule::sub => "-",
                        Rule::mul => "*",
                        Rule::div => "/",
                        Rule::modulo => "%",
                        Rule::pow => "^",
                        rule => {
                            return Err(self.other(&format!("Unknown binary operator: {:?}", rule), span));
                        }
                    };
                    self.call(name, vec![lhs?, rhs?], span)
                })
                .map_postfix(|lhs, op| self.postfix(lhs?, op))
                .parse(pair.into_inner()),

            Rule::grouped => self.build(self.inner(pair)?),

            Rule::number => self.number(pair.as_str(), span),

            Rule::string => {
                let text = pair.as_str();
                Ok(Expression::constant(unescape(&text[1..text.len() - 1])))
            }

            Rule::identifier => {
                let name = pair.as_str();
                match name.to_ascii_lowercase().as_str() {
                    "true" => Ok(Expression::constant(true)),
                    "false" => Ok(Expression::constant(false)),
                    "null" | "none" => Ok(Expression::Constant(Value::Null)),
                    _ => self.accessor(name, span),
                }
            }

            Rule::array => {
                let items = pair
                    .into_inner()
                    .map(|item| self.build(item))
                    .collect::<Result<_, _>>()?;
                self.call("createArray", items, span)
            }

            Rule::object => {
                let mut object = Expression::Constant(Value::Object(Map::new()));
                for entry in pair.into_inner() {
                    let entry_span = Span::from(entry.as_span());
                    let mut parts = entry.into_inner();
                    let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                        return Err(self.other("missing object key or value", entry_span));
                    };
                    let key = match key.as_rule() {
                        Rule::string => {
                            let text = key.as_str();
                            unescape(&text[1..text.len() - 1])
                        }
                        _ => key.as_str().to_string(),
                    };
                    object = self.call(
                        "setProperty",
                        vec![object, Expression::constant(key), self.build(value)?],
                        entry_span,
                    )?;
                }
                Ok(object)
            }

            Rule::template => self.template(pair, span),

            rule => Err(self.other(&format!("Unhandled rule: {:?}", rule), span)),
        }
    }

    fn postfix(&self, lhs: Expression, op: Pair<Rule>) -> Result<Expression, ParseError> {
        let span = Span::from(op.as_span());
        match op.as_rule() {
            Rule::member_op => {
                let property = self.inner(op)?;
                self.call(
                    ACCESSOR,
                    vec![Expression::constant(property.as_str()), lhs],
                    span,
                )
            }
            Rule::index_op => {
                let index = self.build(self.inner(op)?)?;
                self.call(ELEMENT, vec![lhs, index], span)
            }
            Rule::call_op => {
                let Some(mut name) = callee_name(&lhs) else {
                    return Err(self.error(
                        ParseErrorKind::Other {
                            message: format!("{} is not a function name and cannot be called.", lhs),
                        },
                        span,
                    ));
                };
                let mut args = Vec::new();
                for arg in op.into_inner() {
                    match arg.as_rule() {
                        Rule::bang => name.push('!'),
                        Rule::lambda => {
                            let arg_span = Span::from(arg.as_span());
                            let mut parts = arg.into_inner();
                            let (Some(variable), Some(body)) = (parts.next(), parts.next()) else {
                                return Err(self.other("missing lambda variable or body", arg_span));
                            };
                            args.push(self.accessor(variable.as_str(), Span::from(variable.as_span()))?);
                            args.push(self.build(body)?);
                        }
                        _ => args.push(self.build(arg)?),
                    }
                }
                self.call(&name, args, span)
            }
            rule => Err(self.other(&format!("Unknown postfix operator: {:?}", rule), span)),
        }
    }

    fn number(&self, text: &str, span: Span) -> Result<Expression, ParseError> {
        let invalid = || {
            self.error(
                ParseErrorKind::InvalidNumber {
                    text: text.to_string(),
                },
                span.clone(),
            )
        };
        if !text.contains('.') {
            if let Ok(value) = text.parse::<i64>() {
                return Ok(Expression::constant(value));
            }
        }
        let value = text.parse::<f64>().map_err(|_| invalid())?;
        Number::from_f64(value)
            .map(|n| Expression::Constant(Value::Number(n)))
            .ok_or_else(invalid)
    }

    /// A template becomes `concat` over its text runs and interpolations.
    fn template(&self, pair: Pair<Rule>, span: Span) -> Result<Expression, ParseError> {
        let mut parts = Vec::new();
        let mut text = String::new();
        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::template_text => text.push_str(part.as_str()),
                Rule::template_escape => text.push_str(&unescape(part.as_str())),
                _ => {
                    if !text.is_empty() {
                        parts.push(Expression::constant(std::mem::take(&mut text)));
                    }
                    parts.push(self.build(self.inner(part)?)?);
                }
            }
        }
        if !text.is_empty() || parts.is_empty() {
            parts.push(Expression::constant(text));
        }
        if matches!(parts.as_slice(), [Expression::Constant(Value::String(_))]) {
            return Ok(parts.swap_remove(0));
        }
        self.call("concat", parts, span)
    }
}

/// The dotted name of a pure identifier chain like `a.b.c`.
fn callee_name(expression: &Expression) -> Option<String> {
    match (expression.expr_type(), expression.children()) {
        (ACCESSOR, [Expression::Constant(Value::String(name))]) => Some(name.clone()),
        (ACCESSOR, [Expression::Constant(Value::String(name)), instance]) => {
            let prefix = callee_name(instance)?;
            Some(format!("{}.{}", prefix, name))
        }
        _ => None,
    }
}

/// Resolve backslash escapes. Unknown escapes are kept as written.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(c @ ('\\' | '\'' | '"' | '`' | '$')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
