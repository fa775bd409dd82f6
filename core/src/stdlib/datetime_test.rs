//! Tests for the date and time builtins

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use crate::evaluator::Options;
use crate::memory::SimpleObjectMemory;
use crate::parse;

const TIMESTAMP: &str = "2018-03-15T13:00:00.000Z";

fn run(source: &str) -> Result<Value, String> {
    let memory = json!({
        "timestamp": TIMESTAMP,
        "later": "2018-03-17T13:00:00.000Z",
        "earlier": "2018-03-14T09:30:00Z",
        "notADate": "someday",
    });
    let expression = parse(source).map_err(|err| err.to_string())?;
    expression
        .try_evaluate(&mut SimpleObjectMemory::new(memory), &Options::default())
        .map_err(|err| err.message().to_string())
}

fn ok(source: &str) -> Value {
    run(source).unwrap_or_else(|err| panic!("{source}: {err}"))
}

#[test]
fn test_add_units() {
    assert_eq!(ok("addDays(timestamp, 1)"), json!("2018-03-16T13:00:00.000Z"));
    assert_eq!(ok("addDays(timestamp, -20)"), json!("2018-02-23T13:00:00.000Z"));
    assert_eq!(ok("addHours(timestamp, 12)"), json!("2018-03-16T01:00:00.000Z"));
    assert_eq!(ok("addMinutes(timestamp, 30)"), json!("2018-03-15T13:30:00.000Z"));
    assert_eq!(ok("addSeconds(timestamp, -1)"), json!("2018-03-15T12:59:59.000Z"));
    assert_eq!(ok("addDays(timestamp, 1, 'MM-dd-yy')"), json!("03-16-18"));
}

#[test]
fn test_add_and_subtract_by_unit_name() {
    assert_eq!(ok("addToTime(timestamp, 1, 'Week')"), json!("2018-03-22T13:00:00.000Z"));
    assert_eq!(ok("addToTime(timestamp, 1, 'month')"), json!("2018-04-15T13:00:00.000Z"));
    assert_eq!(ok("subtractFromTime(timestamp, 1, 'Year')"), json!("2017-03-15T13:00:00.000Z"));
    assert_eq!(
        ok("subtractFromTime(timestamp, 2, 'Hour', 'HH:mm')"),
        json!("11:00")
    );
    assert_eq!(
        run("addToTime(timestamp, 1, 'fortnight')"),
        Err("fortnight is not a valid time unit.".to_string())
    );
}

#[test]
fn test_components() {
    assert_eq!(ok("dayOfMonth(timestamp)"), json!(15));
    assert_eq!(ok("dayOfWeek(timestamp)"), json!(4));
    assert_eq!(ok("dayOfYear(timestamp)"), json!(74));
    assert_eq!(ok("month(timestamp)"), json!(3));
    assert_eq!(ok("year(timestamp)"), json!(2018));
    assert_eq!(ok("date(timestamp)"), json!("3/15/2018"));
    assert_eq!(ok("getTimeOfDay(timestamp)"), json!("afternoon"));
    assert_eq!(ok("getTimeOfDay(earlier)"), json!("morning"));
}

#[test]
fn test_invalid_timestamp() {
    assert_eq!(
        run("dayOfMonth(notADate)"),
        Err("notADate is not a valid timestamp: \"someday\".".to_string())
    );
}

#[test]
fn test_format_date_time() {
    assert_eq!(ok("formatDateTime(timestamp)"), json!(TIMESTAMP));
    assert_eq!(ok("formatDateTime('2018-03-15')"), json!("2018-03-15T00:00:00.000Z"));
    assert_eq!(ok("formatDateTime(timestamp, 'D')"), json!("Thursday, March 15, 2018"));
    assert_eq!(ok("formatDateTime(timestamp, 'hh:mm tt')"), json!("01:00 PM"));
    assert_eq!(ok("formatDateTime(timestamp, '%Y/%m/%d')"), json!("2018/03/15"));
}

#[test]
fn test_format_epoch_and_ticks() {
    assert_eq!(ok("formatEpoch(1521118800)"), json!(TIMESTAMP));
    assert_eq!(ok("formatEpoch(1521118800.5, 's')"), json!("2018-03-15T13:00:00"));
    assert_eq!(ok("formatTicks(636567156000000000)"), json!(TIMESTAMP));
}

#[test]
fn test_format_ticks_out_of_range() {
    assert_eq!(
        run("formatTicks(-9223372036854775000)"),
        Err("-9223372036854775000 is not a valid ticks value.".to_string())
    );
}

#[test]
fn test_ticks() {
    assert_eq!(ok("ticks(timestamp)"), json!(636_567_156_000_000_000_i64));
    assert_eq!(ok("ticksToDays(864000000000)"), json!(1.0));
    assert_eq!(ok("ticksToHours(18000000000)"), json!(0.5));
    assert_eq!(ok("ticksToMinutes(1200000000)"), json!(2.0));
    assert_eq!(ok("dateTimeDiff(later, timestamp)"), json!(1_728_000_000_000_i64));
    assert_eq!(ok("dateTimeDiff(timestamp, later)"), json!(-1_728_000_000_000_i64));
}

#[test]
fn test_start_of() {
    assert_eq!(ok("startOfDay(timestamp)"), json!("2018-03-15T00:00:00.000Z"));
    assert_eq!(ok("startOfHour('2018-03-15T13:45:10Z')"), json!(TIMESTAMP));
    assert_eq!(ok("startOfMonth(timestamp, 'yyyy-MM-dd')"), json!("2018-03-01"));
}

#[test]
fn test_date_read_back() {
    assert_eq!(ok("dateReadBack(timestamp, timestamp)"), json!("today"));
    assert_eq!(ok("dateReadBack(timestamp, addDays(timestamp, 1))"), json!("tomorrow"));
    assert_eq!(ok("dateReadBack(timestamp, earlier)"), json!("yesterday"));
    assert_eq!(ok("dateReadBack(timestamp, later)"), json!("the day after tomorrow"));
    assert_eq!(
        ok("dateReadBack(timestamp, addDays(timestamp, 10))"),
        json!("Sunday, March 25, 2018")
    );
    assert_eq!(
        ok("dateReadBack(timestamp, addDays(timestamp, 10), 'yyyy-MM-dd')"),
        json!("2018-03-25")
    );
}

#[test]
fn test_relative_to_now() {
    let now = ok("utcNow()");
    let past = ok("getPastTime(1, 'Day')");
    let future = ok("getFutureTime(1, 'Day')");
    assert!(past.as_str() < now.as_str());
    assert!(future.as_str() > now.as_str());
    assert_eq!(ok("dateReadBack(utcNow(), getFutureTime(1, 'Day'))"), json!("tomorrow"));
}

#[test]
fn test_utc_now_format() {
    let year = ok("utcNow('yyyy')");
    assert_eq!(year.as_str().map(str::len), Some(4));
}

#[test]
fn test_bad_format_is_an_error() {
    assert_eq!(
        run("formatDateTime(timestamp, '%Q')"),
        Err("'%Q' is not a valid datetime format.".to_string())
    );
}
