use adaptive_expressions_core::FunctionTable;
use adaptive_expressions_core::lexer::{Lexer, TokenKind};
use nu_ansi_term::{Color, Style};
use reedline::StyledText;

#[derive(Debug, Clone, Copy)]
enum Class {
    Plain,
    Operator,
    Constant,
    Number,
    String,
    Function,
    Variable,
    Punctuation,
}

impl Class {
    fn color(self) -> Color {
        match self {
            Class::Plain => Color::White,
            Class::Operator => Color::White,
            Class::Constant => Color::Cyan,
            Class::Number => Color::Cyan,
            Class::String => Color::Green,
            Class::Function => Color::Blue,
            Class::Variable => Color::Red,
            Class::Punctuation => Color::DarkGray,
        }
    }
}

fn classify(kind: TokenKind, text: &str, next: Option<TokenKind>) -> Class {
    match kind {
        TokenKind::Number => Class::Number,
        TokenKind::String
        | TokenKind::TemplateStart
        | TokenKind::TemplateText
        | TokenKind::TemplateEscape
        | TokenKind::TemplateEnd => Class::String,
        TokenKind::InterpolationStart | TokenKind::InterpolationEnd => Class::Punctuation,
        TokenKind::Identifier => match text.to_ascii_lowercase().as_str() {
            "true" | "false" | "null" => Class::Constant,
            _ if next == Some(TokenKind::LParen) && FunctionTable::global().contains(text) => {
                Class::Function
            }
            _ => Class::Variable,
        },
        TokenKind::LParen
        | TokenKind::RParen
        | TokenKind::LBracket
        | TokenKind::RBracket
        | TokenKind::LBrace
        | TokenKind::RBrace
        | TokenKind::Comma
        | TokenKind::Colon
        | TokenKind::Dot => Class::Punctuation,
        _ => Class::Operator,
    }
}

/// Colors REPL input by token.
pub struct Highlighter;

impl reedline::Highlighter for Highlighter {
    fn highlight(&self, line: &str, _: usize) -> StyledText {
        let mut output = StyledText::new();
        let tokens: Vec<_> = Lexer::new(line).map_while(Result::ok).collect();

        let mut curr_end = 0;
        for (i, token) in tokens.iter().enumerate() {
            if token.span.0.start > curr_end {
                let gap = &line[curr_end..token.span.0.start];
                output.push((Style::new().fg(Class::Plain.color()), gap.to_string()));
            }
            let next = tokens.get(i + 1).map(|token| token.kind);
            let class = classify(token.kind, token.text, next);
            output.push((Style::new().fg(class.color()), token.text.to_string()));
            curr_end = token.span.0.end;
        }

        // Whatever failed to lex is shown as is.
        if let Some(rest) = line.get(curr_end..).filter(|rest| !rest.is_empty()) {
            output.push((Style::new().fg(Class::Plain.color()), rest.to_string()));
        }
        output
    }
}
