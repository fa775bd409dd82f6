mod cases;

use adaptive_expressions::{Options, SimpleObjectMemory};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use cases::{ENGINE, compile, default_memory};

test_case!(
    if_true_branch,
    input: "if(flag, 'yes', 'no')",
    display: "if(flag, 'yes', 'no')",
    value: Ok(json!("yes")),
);

test_case!(
    if_false_branch,
    input: "if(one > two, 'yes', 'no')",
    value: Ok(json!("no")),
);

test_case!(
    if_condition_uses_truthiness,
    input: "if(items, count(items), 0)",
    value: Ok(json!(3)),
);

test_case!(
    if_missing_condition_is_false,
    input: "if(bag.nope, 1, 2)",
    value: Ok(json!(2)),
);

test_case!(
    if_failing_condition_is_false,
    input: "if(1 / 0 == 1, 'then', 'else')",
    value: Ok(json!("else")),
);

test_case!(
    if_skips_untaken_branch,
    input: "if(flag, 'safe', 1 / 0)",
    value: Ok(json!("safe")),
);

test_case!(
    if_taken_branch_error_propagates,
    input: "if(flag, 1 / 0, 'safe')",
    value: Err("Cannot divide by 0."),
);

test_case!(
    nested_if,
    input: "if(one == 1, if(two == 1, 'a', 'b'), 'c')",
    value: Ok(json!("b")),
);

test_case!(
    if_needs_three_arguments,
    input: "if(flag, 1)",
    parse_error: "P007",
    message: "if(flag, 1) should have 3 arguments.",
);

test_case!(
    coalesce_first_non_null,
    input: "coalesce(nullObj, bag.nope, 'fallback', 'later')",
    value: Ok(json!("fallback")),
);

test_case!(
    coalesce_keeps_falsy_values,
    input: "coalesce(nullObj, 0, 1)",
    value: Ok(json!(0)),
);

test_case!(
    coalesce_all_null,
    input: "coalesce(nullObj, bag.nope)",
    value: Ok(Value::Null),
);

test_case!(
    coalesce_needs_an_argument,
    input: "coalesce()",
    parse_error: "P007",
);

fn run_with_substitution(source: &str) -> Value {
    let options = Options::new().with_null_substitution(|path| Some(json!(format!("<{path}>"))));
    let mut memory = SimpleObjectMemory::new(default_memory());
    ENGINE
        .run(&compile(source), &mut memory, &options)
        .unwrap_or_else(|err| panic!("{source}: {err}"))
}

#[test]
fn null_substitution_replaces_missing_paths() {
    assert_eq!(run_with_substitution("bag.nope"), json!("<bag.nope>"));
    assert_eq!(
        run_with_substitution("`hi ${user.name}`"),
        json!("hi <user.name>")
    );
}

#[test]
fn null_substitution_applies_to_explicit_nulls() {
    assert_eq!(run_with_substitution("nullObj"), json!("<nullObj>"));
}

#[test]
fn null_substitution_leaves_present_values() {
    assert_eq!(run_with_substitution("bag.three"), json!(3));
}

#[test]
fn null_substitution_is_off_in_conditions() {
    assert_eq!(run_with_substitution("if(bag.nope, 'set', 'unset')"), json!("unset"));
    assert_eq!(run_with_substitution("bag.nope || false"), json!(false));
    assert_eq!(run_with_substitution("!bag.nope"), json!(true));
}

#[test]
fn null_substitution_in_branches() {
    assert_eq!(run_with_substitution("if(flag, bag.nope, 'x')"), json!("<bag.nope>"));
}

#[test]
fn null_substitution_in_get_property() {
    assert_eq!(run_with_substitution("getProperty(bag, 'set.nope')"), json!("<set.nope>"));
    assert_eq!(run_with_substitution("getProperty(bag, 'three')"), json!(3));
}

#[test]
fn null_substitution_declined() {
    let options = Options::new().with_null_substitution(|_| None);
    let mut memory = SimpleObjectMemory::new(default_memory());
    let value = ENGINE.run(&compile("bag.nope"), &mut memory, &options).unwrap();
    assert_eq!(value, Value::Null);
}
