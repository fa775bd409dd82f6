//! Memory path grammar.
//!
//! A path is a chain of segments written either as dotted names or in
//! brackets: `user.name`, `items[0]`, `bag['a key']`, `[a][b]`. Quotes around a
//! bracketed segment are stripped. Whether a segment indexes a list or names a
//! property is decided during resolution, not here.

use super::MemoryError;

/// Split `path` into its segments.
pub fn parse(path: &str) -> Result<Vec<String>, MemoryError> {
    let invalid = || MemoryError::InvalidPath(path.to_string());
    let mut segments = Vec::new();
    let mut chars = path.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            '.' => {
                chars.next();
                if matches!(chars.peek(), None | Some((_, '.'))) {
                    return Err(invalid());
                }
            }
            '[' => {
                chars.next();
                let quote = match chars.peek() {
                    Some(&(_, q @ ('\'' | '"'))) => {
                        chars.next();
                        Some(q)
                    }
                    _ => None,
                };
                let mut segment = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    match quote {
                        Some(q) if c == q => {
                            closed = true;
                            break;
                        }
                        None if c == ']' => {
                            closed = true;
                            break;
                        }
                        _ => segment.push(c),
                    }
                }
                if !closed {
                    return Err(invalid());
                }
                if quote.is_some() && chars.next().map(|(_, c)| c) != Some(']') {
                    return Err(invalid());
                }
                segments.push(segment);
            }
            ']' => return Err(invalid()),
            _ => {
                let mut end = path.len();
                while let Some(&(i, c)) = chars.peek() {
                    if c == '.' || c == '[' || c == ']' {
                        end = i;
                        break;
                    }
                    chars.next();
                }
                segments.push(path[start..end].to_string());
            }
        }
    }

    Ok(segments)
}

/// Render segments back into a path that [`parse`] accepts.
pub fn render<S: AsRef<str>>(segments: &[S]) -> String {
    let mut path = String::new();
    for segment in segments {
        let segment = segment.as_ref();
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            path.push('[');
            path.push_str(segment);
            path.push(']');
        } else if is_plain_name(segment) {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(segment);
        } else if segment.contains('\'') {
            path.push_str("[\"");
            path.push_str(segment);
            path.push_str("\"]");
        } else {
            path.push_str("['");
            path.push_str(segment);
            path.push_str("']");
        }
    }
    path
}

fn is_plain_name(segment: &str) -> bool {
    !segment.is_empty()
        && !segment
            .chars()
            .any(|c| matches!(c, '.' | '[' | ']' | '\'' | '"') || c.is_whitespace())
}

/// A segment used as a list index.
pub fn as_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_dotted_and_bracketed() {
        assert_eq!(parse("user.name").unwrap(), vec!["user", "name"]);
        assert_eq!(parse("items[0]").unwrap(), vec!["items", "0"]);
        assert_eq!(parse("[a][b]").unwrap(), vec!["a", "b"]);
        assert_eq!(
            parse("bag['a key'].x[\"y\"]").unwrap(),
            vec!["bag", "a key", "x", "y"]
        );
    }

    #[test]
    fn test_parse_keeps_special_characters_in_names() {
        assert_eq!(parse("$index").unwrap(), vec!["$index"]);
        assert_eq!(parse("a:b").unwrap(), vec!["a:b"]);
        assert_eq!(parse("bag['a.b']").unwrap(), vec!["bag", "a.b"]);
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        assert!(parse("items[0").is_err());
        assert!(parse("a..b").is_err());
        assert!(parse("a.").is_err());
        assert!(parse("a]").is_err());
    }

    #[test]
    fn test_empty_path_has_no_segments() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_render_round_trips() {
        let segments = ["user", "0", "a key", "it's"];
        let rendered = render(&segments);
        assert_eq!(rendered, "user[0]['a key'][\"it's\"]");
        assert_eq!(parse(&rendered).unwrap(), segments);
    }
}
