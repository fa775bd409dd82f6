//! Error rendering using ariadne
//!
//! Compilation errors are drawn against their source with the failing span
//! underlined. Runtime errors have no location and print as a single line.

use crate::{Diagnostic, Error, Severity};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;
use std::ops::Range;

const SOURCE_ID: &str = "<expression>";

/// Render an error with formatting to stderr
///
/// # Example
/// ```no_run
/// use adaptive_expressions::{Engine, EngineOptions, render_error};
///
/// let engine = Engine::new(EngineOptions::default());
/// if let Err(e) = engine.compile("1 + ") {
///     render_error(&e);
/// }
/// ```
pub fn render_error(error: &Error) {
    render_error_to_writer(error, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
pub fn render_error_to(error: &Error, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, writer, true)
}

/// Render an error to a String (useful for logs and UIs)
pub fn render_error_to_string(error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
pub fn render_error_to_string_no_color(error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    error: &Error,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    match error {
        Error::Compilation {
            diagnostics,
            source,
        } => render_diagnostics(source, diagnostics, writer, use_color),
        Error::Runtime(msg) => writeln!(writer, "Runtime error: {}", msg),
    }
}

/// Convert a byte span to the character span ariadne expects.
///
/// Empty spans are widened to one character when the source allows it.
fn label_span(source: &str, span: &Range<usize>) -> Range<usize> {
    let chars_before = |byte: usize| source.char_indices().take_while(|(i, _)| *i < byte).count();
    let char_count = source.chars().count();
    let start = chars_before(span.start);
    let end = chars_before(span.end);
    if end > start {
        start..end
    } else {
        start..(start + 1).min(char_count)
    }
}

fn render_diagnostics(
    source: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    for diag in diagnostics {
        let mut colors = ColorGenerator::new();
        colors.next(); // Skip the first color.

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };

        let span = label_span(source, &diag.span.0);
        let mut report = Report::build(kind, (SOURCE_ID, span.clone()))
            .with_message(&diag.message)
            .with_config(ariadne::Config::default().with_color(use_color));

        if let Some(code) = &diag.code {
            report = report.with_code(code);
        }

        report = report.with_label(
            Label::new((SOURCE_ID, span))
                .with_message(&diag.message)
                .with_color(colors.next()),
        );

        for help_msg in &diag.help {
            report = report.with_help(help_msg);
        }

        report.finish().write((SOURCE_ID, Source::from(source)), &mut *writer)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Engine, EngineOptions, SimpleObjectMemory};

    #[test]
    fn test_render_parse_error() {
        let engine = Engine::new(EngineOptions::default());
        let source = "1 + * 2";
        let err = engine.compile(source).unwrap_err();

        let output = render_error_to_string_no_color(&err);
        assert!(output.contains("Error"), "{output}");
        assert!(output.contains("1 + * 2"), "{output}");
        assert!(output.contains("P001"), "{output}");
    }

    #[test]
    fn test_render_unknown_function() {
        let engine = Engine::new(EngineOptions::default());
        let err = engine.compile("shout('hi')").unwrap_err();

        let output = render_error_to_string_no_color(&err);
        assert!(output.contains("shout does not have an evaluator"), "{output}");
        assert!(output.lines().count() > 1);
    }

    #[test]
    fn test_render_error_at_end_of_input() {
        let engine = Engine::new(EngineOptions::default());
        let err = engine.compile("concat('a'").unwrap_err();

        let output = render_error_to_string_no_color(&err);
        assert!(!output.is_empty());
    }

    #[test]
    fn test_render_runtime_error() {
        let engine = Engine::new(EngineOptions::default());
        let mut memory = SimpleObjectMemory::default();
        let err = engine.evaluate("1 / 0", &mut memory).unwrap_err();

        assert_eq!(
            render_error_to_string_no_color(&err),
            "Runtime error: Cannot divide by 0.\n"
        );
    }

    #[test]
    fn test_label_span_handles_multibyte_and_empty_spans() {
        assert_eq!(label_span("é + x", &(3..4)), 2..3);
        assert_eq!(label_span("abc", &(3..3)), 3..3);
        assert_eq!(label_span("abc", &(1..1)), 1..2);
        assert_eq!(label_span("", &(0..0)), 0..0);
    }
}
