//! Tokenizer for expression source text.
//!
//! The lexer runs in two modes. In expression mode it produces operators,
//! literals and punctuation. A backtick switches to template mode, where the
//! text between `${` and its matching `}` is tokenized again in expression
//! mode. Modes nest to any depth, so a template may hold an expression that
//! holds another template.
//!
//! [`crate::parser::parse`] runs the lexer before the grammar so that lexical
//! problems (an unterminated string, a dangling escape) are reported at the
//! exact position where they start. The token stream is also what
//! `--tokens` prints in the CLI.

use core::fmt;

use logos::Logos;

use crate::parser::{ParseError, ParseErrorKind, Span};

/// Failures raised inside a logos callback.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LexError {
    #[default]
    UnexpectedCharacter,
    UnterminatedString,
    InvalidEscape,
}

// ===== Expression mode =====

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r\n\f\x{a0}]+")]
enum ExpressionToken {
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("!")]
    Bang,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    #[token("<>")]
    NotEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("&")]
    Ampersand,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("=>")]
    Arrow,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("`")]
    Backtick,
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,
    #[regex(r"([a-zA-Z_#$]|@@?)[a-zA-Z0-9_\-]*")]
    Identifier,
    #[token("'", quoted)]
    #[token("\"", quoted)]
    String,
}

/// Consume a quoted string after its opening quote.
fn quoted(lex: &mut logos::Lexer<'_, ExpressionToken>) -> Result<(), LexError> {
    let quote = lex.slice().as_bytes()[0];
    let rest = lex.remainder().as_bytes();
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            b'\\' if i + 1 == rest.len() => {
                lex.bump(rest.len());
                return Err(LexError::InvalidEscape);
            }
            b'\\' => i += 2,
            c if c == quote => {
                lex.bump(i + 1);
                return Ok(());
            }
            _ => i += 1,
        }
    }
    lex.bump(rest.len());
    Err(LexError::UnterminatedString)
}

// ===== Template mode =====

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexError)]
enum TemplateToken {
    #[token("`")]
    End,
    #[token("${")]
    InterpolationStart,
    #[token("\\", escaped)]
    Escape,
    #[regex(r"[^`$\\]+")]
    #[token("$")]
    Text,
}

/// Consume the character after a backslash.
fn escaped(lex: &mut logos::Lexer<'_, TemplateToken>) -> Result<(), LexError> {
    match lex.remainder().chars().next() {
        Some(c) => {
            lex.bump(c.len_utf8());
            Ok(())
        }
        None => Err(LexError::InvalidEscape),
    }
}

// ===== Public tokens =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Bang,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Ampersand,
    AndAnd,
    OrOr,
    Arrow,
    Dot,
    Comma,
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Number,
    Identifier,
    String,
    /// Opening backtick of a template.
    TemplateStart,
    /// Literal text inside a template.
    TemplateText,
    /// A backslash escape inside a template.
    TemplateEscape,
    /// `${`
    InterpolationStart,
    /// The `}` closing an interpolation.
    InterpolationEnd,
    /// Closing backtick of a template.
    TemplateEnd,
}

impl TokenKind {
    fn from_expression(token: ExpressionToken) -> Self {
        match token {
            ExpressionToken::Plus => TokenKind::Plus,
            ExpressionToken::Minus => TokenKind::Minus,
            ExpressionToken::Star => TokenKind::Star,
            ExpressionToken::Slash => TokenKind::Slash,
            ExpressionToken::Percent => TokenKind::Percent,
            ExpressionToken::Caret => TokenKind::Caret,
            ExpressionToken::Bang => TokenKind::Bang,
            ExpressionToken::EqualEqual => TokenKind::EqualEqual,
            ExpressionToken::NotEqual => TokenKind::NotEqual,
            ExpressionToken::Less => TokenKind::Less,
            ExpressionToken::LessEqual => TokenKind::LessEqual,
            ExpressionToken::Greater => TokenKind::Greater,
            ExpressionToken::GreaterEqual => TokenKind::GreaterEqual,
            ExpressionToken::Ampersand => TokenKind::Ampersand,
            ExpressionToken::AndAnd => TokenKind::AndAnd,
            ExpressionToken::OrOr => TokenKind::OrOr,
            ExpressionToken::Arrow => TokenKind::Arrow,
            ExpressionToken::Dot => TokenKind::Dot,
            ExpressionToken::Comma => TokenKind::Comma,
            ExpressionToken::Colon => TokenKind::Colon,
            ExpressionToken::LParen => TokenKind::LParen,
            ExpressionToken::RParen => TokenKind::RParen,
            ExpressionToken::LBracket => TokenKind::LBracket,
            ExpressionToken::RBracket => TokenKind::RBracket,
            ExpressionToken::LBrace => TokenKind::LBrace,
            ExpressionToken::RBrace => TokenKind::RBrace,
            ExpressionToken::Backtick => TokenKind::TemplateStart,
            ExpressionToken::Number => TokenKind::Number,
            ExpressionToken::Identifier => TokenKind::Identifier,
            ExpressionToken::String => TokenKind::String,
        }
    }

    fn from_template(token: TemplateToken) -> Self {
        match token {
            TemplateToken::End => TokenKind::TemplateEnd,
            TemplateToken::InterpolationStart => TokenKind::InterpolationStart,
            TemplateToken::Escape => TokenKind::TemplateEscape,
            TemplateToken::Text => TokenKind::TemplateText,
        }
    }

    /// Tokens that open a nesting level.
    fn opens(self) -> bool {
        matches!(
            self,
            TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::TemplateStart
                | TokenKind::InterpolationStart
        )
    }

    fn closes(self) -> bool {
        matches!(
            self,
            TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::TemplateEnd
                | TokenKind::InterpolationEnd
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Number => "number",
            TokenKind::Identifier => "identifier",
            TokenKind::String => "string",
            TokenKind::TemplateStart => "template start",
            TokenKind::TemplateText => "template text",
            TokenKind::TemplateEscape => "template escape",
            TokenKind::InterpolationStart => "'${'",
            TokenKind::InterpolationEnd => "interpolation end",
            TokenKind::TemplateEnd => "template end",
            other => return write!(f, "{:?}", other),
        };
        f.write_str(name)
    }
}

/// One token with its text and location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// `braces` counts `{` opened in this mode, so the `}` closing an
    /// interpolation can be told apart from one closing an object literal.
    Expression { braces: usize },
    /// `start` is the offset of the opening backtick.
    Template { start: usize },
}

/// A lazy token stream over one source string.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    modes: Vec<Mode>,
    interpolations: Vec<usize>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            modes: vec![Mode::Expression { braces: 0 }],
            interpolations: Vec::new(),
            finished: false,
        }
    }

    fn error(&mut self, kind: ParseErrorKind, span: Span) -> Option<Result<Token<'a>, ParseError>> {
        self.finished = true;
        Some(Err(ParseError::new(kind, self.source.to_string(), span)))
    }

    fn lex_error(&mut self, err: LexError, span: Span) -> Option<Result<Token<'a>, ParseError>> {
        let text = span.str_of(self.source).to_string();
        let kind = match err {
            LexError::UnexpectedCharacter => ParseErrorKind::UnexpectedToken {
                expected: "a token".to_string(),
                found: format!("'{}'", text),
            },
            LexError::UnterminatedString => ParseErrorKind::UnterminatedString {
                delimiter: text.chars().next().unwrap_or('\''),
            },
            LexError::InvalidEscape => ParseErrorKind::InvalidEscape { text },
        };
        self.error(kind, span)
    }

    fn emit(&mut self, kind: TokenKind, range: logos::Span) -> Option<Result<Token<'a>, ParseError>> {
        let span = Span::new(self.pos + range.start, self.pos + range.end);
        self.pos = span.0.end;
        Some(Ok(Token {
            kind,
            text: span.str_of(self.source),
            span,
        }))
    }

    fn next_in_expression(&mut self, braces: usize) -> Option<Result<Token<'a>, ParseError>> {
        let mut lexer = ExpressionToken::lexer(&self.source[self.pos..]);
        let Some(result) = lexer.next() else {
            self.finished = true;
            return match self.interpolations.pop() {
                Some(start) => self.error(
                    ParseErrorKind::UnterminatedInterpolation,
                    Span::new(start, self.source.len()),
                ),
                None => None,
            };
        };
        let range = lexer.span();
        let token = match result {
            Ok(token) => token,
            Err(err) => {
                let span = Span::new(self.pos + range.start, self.pos + range.end);
                return self.lex_error(err, span);
            }
        };

        let kind = match token {
            ExpressionToken::Backtick => {
                self.modes.push(Mode::Template {
                    start: self.pos + range.start,
                });
                TokenKind::TemplateStart
            }
            ExpressionToken::LBrace => {
                self.set_braces(braces + 1);
                TokenKind::LBrace
            }
            ExpressionToken::RBrace if braces == 0 && self.modes.len() > 1 => {
                self.modes.pop();
                self.interpolations.pop();
                TokenKind::InterpolationEnd
            }
            ExpressionToken::RBrace => {
                self.set_braces(braces.saturating_sub(1));
                TokenKind::RBrace
            }
            other => TokenKind::from_expression(other),
        };
        self.emit(kind, range)
    }

    fn next_in_template(&mut self, start: usize) -> Option<Result<Token<'a>, ParseError>> {
        let mut lexer = TemplateToken::lexer(&self.source[self.pos..]);
        let Some(result) = lexer.next() else {
            return self.error(
                ParseErrorKind::UnterminatedString { delimiter: '`' },
                Span::new(start, self.source.len()),
            );
        };
        let range = lexer.span();
        let token = match result {
            Ok(token) => token,
            Err(err) => {
                let span = Span::new(self.pos + range.start, self.pos + range.end);
                return self.lex_error(err, span);
            }
        };

        match token {
            TemplateToken::End => {
                self.modes.pop();
            }
            TemplateToken::InterpolationStart => {
                self.modes.push(Mode::Expression { braces: 0 });
                self.interpolations.push(self.pos + range.start);
            }
            TemplateToken::Escape | TemplateToken::Text => {}
        }
        self.emit(TokenKind::from_template(token), range)
    }

    fn set_braces(&mut self, count: usize) {
        if let Some(Mode::Expression { braces }) = self.modes.last_mut() {
            *braces = count;
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.modes.last().copied() {
            Some(Mode::Expression { braces }) => self.next_in_expression(braces),
            Some(Mode::Template { start }) => self.next_in_template(start),
            None => {
                self.finished = true;
                None
            }
        }
    }
}

/// Tokenize the whole source, failing on the first lexical error.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, ParseError> {
    Lexer::new(source).collect()
}

/// Check a source for lexical errors and nesting deeper than `max_depth`.
///
/// Depth counts open parentheses, brackets, braces, templates and
/// interpolations.
pub fn check(source: &str, max_depth: usize) -> Result<(), ParseError> {
    let mut depth = 0usize;
    for token in Lexer::new(source) {
        let token = token?;
        if token.kind.opens() {
            depth += 1;
            if depth > max_depth {
                tracing::debug!(depth, max_depth, "expression nesting too deep");
                return Err(ParseError::new(
                    ParseErrorKind::MaxDepthExceeded { depth, max_depth },
                    source.to_string(),
                    token.span,
                ));
            }
        } else if token.kind.closes() {
            depth = depth.saturating_sub(1);
        }
    }
    Ok(())
}
