// Source locations shared by the lexer, the parser and diagnostics.

use core::ops::Range;

/// A byte range into the source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span(pub Range<usize>);

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self(start..end)
    }

    pub fn at(pos: usize) -> Self {
        Self(pos..pos)
    }

    pub fn combine(a: &Span, b: &Span) -> Span {
        Span::new(a.0.start, b.0.end)
    }

    pub fn str_of<'a>(&self, source: &'a str) -> &'a str {
        &source[self.0.start..self.0.end]
    }

    /// 1-based line and column (in characters) of the span's start.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let start = self.0.start.min(source.len());
        let before = source.get(..start).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        (line, column)
    }
}

impl From<pest::Span<'_>> for Span {
    fn from(s: pest::Span<'_>) -> Self {
        Self(s.start()..s.end())
    }
}

impl From<logos::Span> for Span {
    fn from(range: logos::Span) -> Self {
        Self(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let source = "a +\n  b\n";
        assert_eq!(Span::at(0).line_col(source), (1, 1));
        assert_eq!(Span::at(2).line_col(source), (1, 3));
        assert_eq!(Span::at(6).line_col(source), (2, 3));
        assert_eq!(Span::at(100).line_col(source), (3, 1));
    }

    #[test]
    fn test_line_col_counts_characters() {
        let source = "'é' + x";
        assert_eq!(Span::at(source.find('+').unwrap()).line_col(source), (1, 5));
    }
}
