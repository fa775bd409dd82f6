//! Date format strings.
//!
//! Two syntaxes are accepted. A format containing `%` is a strftime string and
//! goes to chrono after validation. Anything else uses custom specifiers made
//! of letter runs (`yyyy`, `MM`, `dd`, `HH`, `fff`, ...), quoted literals,
//! backslash escapes and single-letter standard formats (`o`, `D`, `s`, ...).

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::evaluator::EvalError;

/// Output used when a builtin receives no format.
pub const DEFAULT_FORMAT: &str = "yyyy-MM-ddTHH:mm:ss.fffZ";

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Render `timestamp` with either format syntax.
pub fn format(timestamp: &DateTime<Utc>, pattern: &str) -> Result<String, EvalError> {
    if pattern.contains('%') {
        validate_strftime(pattern)?;
        return Ok(timestamp.format(pattern).to_string());
    }
    let pattern = expand_standard(pattern);
    render(timestamp, pattern)
}

/// Reject strftime strings chrono cannot render.
pub fn validate_strftime(pattern: &str) -> Result<(), EvalError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(EvalError::new(format!("'{}' is not a valid datetime format.", pattern)));
    }
    Ok(())
}

/// Replace a single-letter standard format by its custom-specifier equivalent.
fn expand_standard(pattern: &str) -> &str {
    match pattern {
        "d" => "M/d/yyyy",
        "D" => "dddd, MMMM d, yyyy",
        "o" | "O" => "yyyy-MM-ddTHH:mm:ss.fffffffK",
        "r" | "R" => "ddd, dd MMM yyyy HH':'mm':'ss 'GMT'",
        "s" => "yyyy-MM-ddTHH:mm:ss",
        "t" => "h:mm tt",
        "T" => "h:mm:ss tt",
        "u" => "yyyy-MM-dd HH:mm:ss'Z'",
        other => other,
    }
}

fn invalid(pattern: &str) -> EvalError {
    EvalError::new(format!("'{}' is not a valid datetime format.", pattern))
}

fn render(timestamp: &DateTime<Utc>, pattern: &str) -> Result<String, EvalError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&q| q == c)
                    .ok_or_else(|| invalid(pattern))?;
                out.extend(&chars[i + 1..i + 1 + close]);
                i += close + 2;
            }
            '\\' => {
                let escaped = chars.get(i + 1).ok_or_else(|| invalid(pattern))?;
                out.push(*escaped);
                i += 2;
            }
            _ if is_specifier(c) => {
                let run = chars[i..].iter().take_while(|&&x| x == c).count();
                specifier(timestamp, c, run, &mut out);
                i += run;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    Ok(out)
}

fn is_specifier(c: char) -> bool {
    matches!(
        c,
        'd' | 'f' | 'F' | 'g' | 'h' | 'H' | 'K' | 'm' | 'M' | 's' | 't' | 'y' | 'z'
    )
}

fn fraction_digits(timestamp: &DateTime<Utc>, count: usize) -> String {
    let nanos = timestamp.nanosecond() % 1_000_000_000;
    let digits = format!("{:09}", nanos);
    digits[..count.min(9)].to_string()
}

/// Append the rendering of `count` repetitions of specifier `c`.
fn specifier(timestamp: &DateTime<Utc>, c: char, count: usize, out: &mut String) {
    let hour12 = match timestamp.hour() % 12 {
        0 => 12,
        h => h,
    };
    let rendered = match (c, count) {
        ('d', 1) => timestamp.day().to_string(),
        ('d', 2) => format!("{:02}", timestamp.day()),
        ('d', 3) => WEEKDAYS[timestamp.weekday().num_days_from_sunday() as usize][..3].to_string(),
        ('d', _) => WEEKDAYS[timestamp.weekday().num_days_from_sunday() as usize].to_string(),
        ('f', n) => fraction_digits(timestamp, n.min(7)),
        ('F', n) => fraction_digits(timestamp, n.min(7)).trim_end_matches('0').to_string(),
        ('g', _) => "A.D.".to_string(),
        ('h', 1) => hour12.to_string(),
        ('h', _) => format!("{:02}", hour12),
        ('H', 1) => timestamp.hour().to_string(),
        ('H', _) => format!("{:02}", timestamp.hour()),
        ('K', _) => "Z".to_string(),
        ('m', 1) => timestamp.minute().to_string(),
        ('m', _) => format!("{:02}", timestamp.minute()),
        ('M', 1) => timestamp.month().to_string(),
        ('M', 2) => format!("{:02}", timestamp.month()),
        ('M', 3) => MONTHS[timestamp.month0() as usize][..3].to_string(),
        ('M', _) => MONTHS[timestamp.month0() as usize].to_string(),
        ('s', 1) => timestamp.second().to_string(),
        ('s', _) => format!("{:02}", timestamp.second()),
        ('t', 1) => (if timestamp.hour() < 12 { "A" } else { "P" }).to_string(),
        ('t', _) => (if timestamp.hour() < 12 { "AM" } else { "PM" }).to_string(),
        ('y', 1) => (timestamp.year() % 100).to_string(),
        ('y', 2) => format!("{:02}", timestamp.year() % 100),
        ('y', n) => format!("{:0width$}", timestamp.year(), width = n.max(3)),
        ('z', 1) => "+0".to_string(),
        ('z', 2) => "+00".to_string(),
        ('z', _) => "+00:00".to_string(),
        (other, n) => other.to_string().repeat(n),
    };
    out.push_str(&rendered);
}
