use adaptive_expressions_core::ParseErrorKind;
use adaptive_expressions_core::lexer::{Lexer, TokenKind};
use reedline::{ValidationResult, Validator};

/// Keeps the REPL reading lines while brackets, strings or templates are open.
pub struct InputValidator;

impl Validator for InputValidator {
    fn validate(&self, line: &str) -> ValidationResult {
        match calculate_depth(line) {
            Some(0) => ValidationResult::Complete,
            Some(_) | None => ValidationResult::Incomplete,
        }
    }
}

/// Open nesting levels at the end of `buffer`.
///
/// `None` means the buffer ends inside a string or template. Any other lexical
/// error counts as complete so the parser gets to report it.
pub fn calculate_depth(buffer: &str) -> Option<usize> {
    let mut depth: isize = 0;

    for token in Lexer::new(buffer) {
        match token {
            Ok(token) => match token.kind {
                TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::TemplateStart
                | TokenKind::InterpolationStart => depth += 1,
                TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::TemplateEnd
                | TokenKind::InterpolationEnd => depth -= 1,
                _ => {}
            },
            Err(err) => {
                return match err.kind {
                    ParseErrorKind::UnterminatedString { .. }
                    | ParseErrorKind::UnterminatedInterpolation => None,
                    _ => Some(0),
                };
            }
        }
    }

    Some(depth.max(0) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_input_is_complete() {
        assert_eq!(calculate_depth("concat(a, [1, 2])"), Some(0));
        assert_eq!(calculate_depth("`${a}`"), Some(0));
    }

    #[test]
    fn test_open_brackets_are_counted() {
        assert_eq!(calculate_depth("foreach(items, x => {"), Some(2));
        assert_eq!(calculate_depth("a)"), Some(0));
    }

    #[test]
    fn test_unterminated_text_is_incomplete() {
        assert_eq!(calculate_depth("'abc"), None);
        assert_eq!(calculate_depth("`abc ${x"), None);
    }

    #[test]
    fn test_other_errors_are_left_to_the_parser() {
        assert_eq!(calculate_depth("1 ~ 2"), Some(0));
    }
}
