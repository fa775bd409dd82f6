//! Date and time builtins.
//!
//! Timestamps travel as strings. Every builtin parses its input into a UTC
//! instant, works on that, and renders the result with the optional format
//! argument (see [`format`]), defaulting to `yyyy-MM-ddTHH:mm:ss.fffZ`.
//! Ticks count 100-nanosecond intervals since 0001-01-01T00:00:00Z.

mod format;

use chrono::{
    DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc,
};
use serde_json::Value;

use self::format::DEFAULT_FORMAT;
use super::apply::{apply_with_error, integer_arg};
use crate::evaluator::{EvalError, EvalResult, Options};
use crate::expression::{Expression, ExpressionEvaluator};
use crate::memory::Memory;
use crate::types::{ReturnType, ValidationError, validate};
use crate::value::{Num, float};

/// Ticks at 1970-01-01T00:00:00Z.
pub(crate) const EPOCH_TICKS: i64 = 621_355_968_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;
const TICKS_PER_MINUTE: f64 = 6e8;
const TICKS_PER_HOUR: f64 = 3.6e10;
const TICKS_PER_DAY: f64 = 8.64e11;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

pub(super) static EVALUATORS: &[ExpressionEvaluator] = &[
    ExpressionEvaluator::new("addDays", evaluate_add_days, ReturnType::STRING, validate_add_unit),
    ExpressionEvaluator::new("addHours", evaluate_add_hours, ReturnType::STRING, validate_add_unit),
    ExpressionEvaluator::new("addMinutes", evaluate_add_minutes, ReturnType::STRING, validate_add_unit),
    ExpressionEvaluator::new("addSeconds", evaluate_add_seconds, ReturnType::STRING, validate_add_unit),
    ExpressionEvaluator::new("addToTime", evaluate_add_to_time, ReturnType::STRING, validate_shift),
    ExpressionEvaluator::new(
        "subtractFromTime",
        evaluate_subtract_from_time,
        ReturnType::STRING,
        validate_shift,
    ),
    ExpressionEvaluator::new("dayOfMonth", evaluate_day_of_month, ReturnType::NUMBER, validate::unary_string),
    ExpressionEvaluator::new("dayOfWeek", evaluate_day_of_week, ReturnType::NUMBER, validate::unary_string),
    ExpressionEvaluator::new("dayOfYear", evaluate_day_of_year, ReturnType::NUMBER, validate::unary_string),
    ExpressionEvaluator::new("month", evaluate_month, ReturnType::NUMBER, validate::unary_string),
    ExpressionEvaluator::new("year", evaluate_year, ReturnType::NUMBER, validate::unary_string),
    ExpressionEvaluator::new("date", evaluate_date, ReturnType::STRING, validate::unary_string),
    ExpressionEvaluator::new("utcNow", evaluate_utc_now, ReturnType::STRING, validate_utc_now),
    ExpressionEvaluator::new(
        "formatDateTime",
        evaluate_format_date_time,
        ReturnType::STRING,
        validate_timestamp_and_format,
    ),
    ExpressionEvaluator::new("formatEpoch", evaluate_format_epoch, ReturnType::STRING, validate_number_and_format),
    ExpressionEvaluator::new("formatTicks", evaluate_format_ticks, ReturnType::STRING, validate_number_and_format),
    ExpressionEvaluator::new("dateReadBack", evaluate_date_read_back, ReturnType::STRING, validate_read_back),
    ExpressionEvaluator::new("getTimeOfDay", evaluate_time_of_day, ReturnType::STRING, validate::unary_string),
    ExpressionEvaluator::new("getPastTime", evaluate_past_time, ReturnType::STRING, validate_relative),
    ExpressionEvaluator::new("getFutureTime", evaluate_future_time, ReturnType::STRING, validate_relative),
    ExpressionEvaluator::new(
        "startOfDay",
        evaluate_start_of_day,
        ReturnType::STRING,
        validate_timestamp_and_format,
    ),
    ExpressionEvaluator::new(
        "startOfHour",
        evaluate_start_of_hour,
        ReturnType::STRING,
        validate_timestamp_and_format,
    ),
    ExpressionEvaluator::new(
        "startOfMonth",
        evaluate_start_of_month,
        ReturnType::STRING,
        validate_timestamp_and_format,
    ),
    ExpressionEvaluator::new("ticks", evaluate_ticks, ReturnType::NUMBER, validate::unary_string),
    ExpressionEvaluator::new("ticksToDays", evaluate_ticks_to_days, ReturnType::NUMBER, validate::unary_number),
    ExpressionEvaluator::new("ticksToHours", evaluate_ticks_to_hours, ReturnType::NUMBER, validate::unary_number),
    ExpressionEvaluator::new(
        "ticksToMinutes",
        evaluate_ticks_to_minutes,
        ReturnType::NUMBER,
        validate::unary_number,
    ),
    ExpressionEvaluator::new("dateTimeDiff", evaluate_date_time_diff, ReturnType::NUMBER, validate_diff),
];

// ============================================================================
// Validators
// ============================================================================

fn validate_add_unit(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(
        expression,
        &[ReturnType::STRING],
        &[ReturnType::STRING, ReturnType::NUMBER],
    )
}

fn validate_shift(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(
        expression,
        &[ReturnType::STRING],
        &[ReturnType::STRING, ReturnType::NUMBER, ReturnType::STRING],
    )
}

fn validate_utc_now(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(expression, &[ReturnType::STRING], &[])
}

fn validate_timestamp_and_format(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(expression, &[ReturnType::STRING], &[ReturnType::STRING])
}

fn validate_number_and_format(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(expression, &[ReturnType::STRING], &[ReturnType::NUMBER])
}

fn validate_read_back(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(
        expression,
        &[ReturnType::STRING],
        &[ReturnType::STRING, ReturnType::STRING],
    )
}

fn validate_relative(expression: &Expression) -> Result<(), ValidationError> {
    validate::order(
        expression,
        &[ReturnType::STRING],
        &[ReturnType::NUMBER, ReturnType::STRING],
    )
}

fn validate_diff(expression: &Expression) -> Result<(), ValidationError> {
    validate::arity_and_any_type(expression, 2, Some(2), ReturnType::STRING)
}

// ============================================================================
// Parsing and rendering
// ============================================================================

/// Parse an RFC 3339 timestamp or a common date/time form, assumed UTC.
pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NAIVE_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .map(|naive| naive.and_utc())
}

fn timestamp_arg(value: &Value, child: &Expression) -> Result<DateTime<Utc>, EvalError> {
    value
        .as_str()
        .and_then(parse_timestamp)
        .ok_or_else(|| EvalError::new(format!("{} is not a valid timestamp: {}.", child, value)))
}

/// The optional format argument at `index`.
fn format_arg<'a>(args: &'a [Value], index: usize) -> Result<&'a str, EvalError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(DEFAULT_FORMAT),
        Some(Value::String(fmt)) => Ok(fmt),
        Some(other) => Err(EvalError::new(format!("{} is not a valid format string.", other))),
    }
}

fn render(timestamp: &DateTime<Utc>, args: &[Value], format_index: usize) -> EvalResult {
    let pattern = format_arg(args, format_index)?;
    format::format(timestamp, pattern).map(Value::String)
}

pub(crate) fn ticks_of(timestamp: &DateTime<Utc>) -> Result<i64, EvalError> {
    timestamp
        .timestamp()
        .checked_mul(TICKS_PER_SECOND)
        .and_then(|t| t.checked_add(i64::from(timestamp.timestamp_subsec_nanos() / 100)))
        .and_then(|t| t.checked_add(EPOCH_TICKS))
        .ok_or_else(|| EvalError::new(format!("{} is out of the ticks range.", timestamp)))
}

fn from_ticks(ticks: i64) -> Result<DateTime<Utc>, EvalError> {
    let invalid = || EvalError::new(format!("{} is not a valid ticks value.", ticks));
    let unix = ticks.checked_sub(EPOCH_TICKS).ok_or_else(invalid)?;
    let seconds = unix.div_euclid(TICKS_PER_SECOND);
    let nanos = (unix.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(seconds, nanos).ok_or_else(invalid)
}

// ============================================================================
// Interval arithmetic
// ============================================================================

/// Granularities accepted by `addToTime` and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    pub(crate) fn parse(name: &str) -> Result<TimeUnit, EvalError> {
        match name.to_ascii_lowercase().as_str() {
            "second" => Ok(TimeUnit::Second),
            "minute" => Ok(TimeUnit::Minute),
            "hour" => Ok(TimeUnit::Hour),
            "day" => Ok(TimeUnit::Day),
            "week" => Ok(TimeUnit::Week),
            "month" => Ok(TimeUnit::Month),
            "year" => Ok(TimeUnit::Year),
            _ => Err(EvalError::new(format!("{} is not a valid time unit.", name))),
        }
    }
}

/// Move `timestamp` by `amount` units; calendar units clamp to the month end.
pub(crate) fn shift(
    timestamp: DateTime<Utc>,
    amount: i64,
    unit: TimeUnit,
) -> Result<DateTime<Utc>, EvalError> {
    let overflow = || EvalError::new(format!("Adding {} {:?}(s) overflows the date range.", amount, unit));
    let delta = match unit {
        TimeUnit::Second => TimeDelta::try_seconds(amount),
        TimeUnit::Minute => TimeDelta::try_minutes(amount),
        TimeUnit::Hour => TimeDelta::try_hours(amount),
        TimeUnit::Day => TimeDelta::try_days(amount),
        TimeUnit::Week => TimeDelta::try_weeks(amount),
        TimeUnit::Month | TimeUnit::Year => {
            let months = if unit == TimeUnit::Year {
                amount.checked_mul(12)
            } else {
                Some(amount)
            };
            let months = months.ok_or_else(overflow)?;
            let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| overflow())?;
            let shifted = if months >= 0 {
                timestamp.checked_add_months(Months::new(magnitude))
            } else {
                timestamp.checked_sub_months(Months::new(magnitude))
            };
            return shifted.ok_or_else(overflow);
        }
    };
    delta
        .and_then(|delta| timestamp.checked_add_signed(delta))
        .ok_or_else(overflow)
}

fn add_unit(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    unit: TimeUnit,
) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        let timestamp = timestamp_arg(&args[0], &expression.children()[0])?;
        let amount = integer_arg(&args[1], expression.expr_type(), "amount")?;
        render(&shift(timestamp, amount, unit)?, &args, 2)
    })
}

fn evaluate_add_days(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    add_unit(expression, memory, options, TimeUnit::Day)
}

fn evaluate_add_hours(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    add_unit(expression, memory, options, TimeUnit::Hour)
}

fn evaluate_add_minutes(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    add_unit(expression, memory, options, TimeUnit::Minute)
}

fn evaluate_add_seconds(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    add_unit(expression, memory, options, TimeUnit::Second)
}

fn shift_by_unit(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    sign: i64,
) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        let timestamp = timestamp_arg(&args[0], &expression.children()[0])?;
        let amount = integer_arg(&args[1], expression.expr_type(), "interval")?;
        let unit = TimeUnit::parse(args[2].as_str().unwrap_or_default())?;
        render(&shift(timestamp, sign * amount, unit)?, &args, 3)
    })
}

fn evaluate_add_to_time(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    shift_by_unit(expression, memory, options, 1)
}

fn evaluate_subtract_from_time(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> EvalResult {
    shift_by_unit(expression, memory, options, -1)
}

fn relative_to_now(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    sign: i64,
) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        let amount = integer_arg(&args[0], expression.expr_type(), "interval")?;
        let unit = TimeUnit::parse(args[1].as_str().unwrap_or_default())?;
        render(&shift(Utc::now(), sign * amount, unit)?, &args, 2)
    })
}

fn evaluate_past_time(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    relative_to_now(expression, memory, options, -1)
}

fn evaluate_future_time(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    relative_to_now(expression, memory, options, 1)
}

// ============================================================================
// Components
// ============================================================================

fn component(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    extract: fn(&DateTime<Utc>) -> Value,
) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        let timestamp = timestamp_arg(&args[0], &expression.children()[0])?;
        Ok(extract(&timestamp))
    })
}

fn evaluate_day_of_month(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    component(expression, memory, options, |ts| Value::from(ts.day()))
}

fn evaluate_day_of_week(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    component(expression, memory, options, |ts| {
        Value::from(ts.weekday().num_days_from_sunday())
    })
}

fn evaluate_day_of_year(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    component(expression, memory, options, |ts| Value::from(ts.ordinal()))
}

fn evaluate_month(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    component(expression, memory, options, |ts| Value::from(ts.month()))
}

fn evaluate_year(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    component(expression, memory, options, |ts| Value::from(ts.year()))
}

fn evaluate_date(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    component(expression, memory, options, |ts| {
        Value::String(format!("{}/{}/{}", ts.month(), ts.day(), ts.year()))
    })
}

/// Coarse part of the day; exactly 22:00 still counts as evening.
fn time_of_day(timestamp: &DateTime<Utc>) -> &'static str {
    match (timestamp.hour(), timestamp.minute()) {
        (0, 0) => "midnight",
        (h, _) if h < 12 => "morning",
        (12, 0) => "noon",
        (h, _) if h < 18 => "afternoon",
        (h, _) if h < 22 => "evening",
        (22, 0) => "evening",
        _ => "night",
    }
}

fn evaluate_time_of_day(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    component(expression, memory, options, |ts| Value::from(time_of_day(ts)))
}

// ============================================================================
// Formatting
// ============================================================================

fn evaluate_utc_now(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| render(&Utc::now(), &args, 0))
}

fn evaluate_format_date_time(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        let timestamp = timestamp_arg(&args[0], &expression.children()[0])?;
        render(&timestamp, &args, 1)
    })
}

fn from_epoch(seconds: Num) -> Option<DateTime<Utc>> {
    match seconds {
        Num::Int(secs) => DateTime::from_timestamp(secs, 0),
        Num::Float(secs) => {
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9).round() as u32;
            DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
        }
    }
}

fn evaluate_format_epoch(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        let timestamp = Num::from_value(&args[0])
            .and_then(from_epoch)
            .ok_or_else(|| {
                EvalError::new(format!("formatEpoch expects a number of seconds, got {}.", args[0]))
            })?;
        render(&timestamp, &args, 1)
    })
}

fn evaluate_format_ticks(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        let ticks = integer_arg(&args[0], "formatTicks", "ticks")?;
        render(&from_ticks(ticks)?, &args, 1)
    })
}

fn read_back(base: &DateTime<Utc>, target: &DateTime<Utc>, pattern: &str) -> Result<String, EvalError> {
    let days = (target.date_naive() - base.date_naive()).num_days();
    let phrase = match days {
        0 => "today",
        1 => "tomorrow",
        -1 => "yesterday",
        2 => "the day after tomorrow",
        -2 => "the day before yesterday",
        _ => return format::format(target, pattern),
    };
    Ok(phrase.to_string())
}

fn evaluate_date_read_back(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        let children = expression.children();
        let base = timestamp_arg(&args[0], &children[0])?;
        let target = timestamp_arg(&args[1], &children[1])?;
        let pattern = match args.get(2) {
            Some(Value::String(pattern)) => pattern.as_str(),
            _ => "D",
        };
        read_back(&base, &target, pattern).map(Value::String)
    })
}

fn start_of(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    truncate: fn(&DateTime<Utc>) -> Option<DateTime<Utc>>,
) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        let timestamp = timestamp_arg(&args[0], &expression.children()[0])?;
        let start = truncate(&timestamp)
            .ok_or_else(|| EvalError::new(format!("Cannot truncate {}.", timestamp)))?;
        render(&start, &args, 1)
    })
}

fn evaluate_start_of_day(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    start_of(expression, memory, options, |ts| {
        Some(ts.date_naive().and_time(NaiveTime::MIN).and_utc())
    })
}

fn evaluate_start_of_hour(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    start_of(expression, memory, options, |ts| {
        ts.with_minute(0)?.with_second(0)?.with_nanosecond(0)
    })
}

fn evaluate_start_of_month(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    start_of(expression, memory, options, |ts| {
        Some(ts.date_naive().with_day(1)?.and_time(NaiveTime::MIN).and_utc())
    })
}

// ============================================================================
// Ticks
// ============================================================================

fn evaluate_ticks(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        let timestamp = timestamp_arg(&args[0], &expression.children()[0])?;
        ticks_of(&timestamp).map(Value::from)
    })
}

fn ticks_ratio(
    expression: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    per_unit: f64,
) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        let ticks = integer_arg(&args[0], expression.expr_type(), "ticks")?;
        float(ticks as f64 / per_unit)
    })
}

fn evaluate_ticks_to_days(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    ticks_ratio(expression, memory, options, TICKS_PER_DAY)
}

fn evaluate_ticks_to_hours(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    ticks_ratio(expression, memory, options, TICKS_PER_HOUR)
}

fn evaluate_ticks_to_minutes(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    ticks_ratio(expression, memory, options, TICKS_PER_MINUTE)
}

fn evaluate_date_time_diff(expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    apply_with_error(expression, memory, options, None, |args| {
        let children = expression.children();
        let left = ticks_of(&timestamp_arg(&args[0], &children[0])?)?;
        let right = ticks_of(&timestamp_arg(&args[1], &children[1])?)?;
        left.checked_sub(right)
            .map(Value::from)
            .ok_or_else(|| EvalError::new("dateTimeDiff overflows."))
    })
}
