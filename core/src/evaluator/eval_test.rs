//! End-to-end evaluation tests: parse, then evaluate against a memory.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use super::{EvalError, Options, is_logic_true};
use crate::memory::{Memory, SimpleObjectMemory, StackedMemory};
use crate::parse;

fn state() -> Value {
    json!({
        "user": {"name": "Bob", "age": 31, "tags": ["admin", "ops"]},
        "items": [1, 2, 3],
        "scores": {"math": 90, "art": 70},
        "x": 3,
        "flag": false,
        "nothing": null,
    })
}

fn eval_with(source: &str, value: Value, options: &Options) -> Result<Value, EvalError> {
    let expression = parse(source).unwrap_or_else(|err| panic!("{source}: {err}"));
    expression.try_evaluate(&mut SimpleObjectMemory::new(value), options)
}

fn eval(source: &str) -> Result<Value, EvalError> {
    eval_with(source, state(), &Options::default())
}

fn eval_ok(source: &str) -> Value {
    eval(source).unwrap_or_else(|err| panic!("{source}: {err}"))
}

fn eval_err(source: &str) -> String {
    match eval(source) {
        Ok(value) => panic!("{source}: expected an error, got {value}"),
        Err(err) => err.message().to_string(),
    }
}

// ===== Literals and arithmetic =====

#[test]
fn test_literals() {
    assert_eq!(eval_ok("42"), json!(42));
    assert_eq!(eval_ok("1.5"), json!(1.5));
    assert_eq!(eval_ok("'hi'"), json!("hi"));
    assert_eq!(eval_ok("true"), json!(true));
    assert_eq!(eval_ok("null"), Value::Null);
    assert_eq!(eval_ok("[1, 'a', [2]]"), json!([1, "a", [2]]));
    assert_eq!(eval_ok("{a: 1, 'b c': [x]}"), json!({"a": 1, "b c": [3]}));
    assert_eq!(eval_ok(""), json!(""));
}

#[test]
fn test_integer_results_stay_integers() {
    assert_eq!(eval_ok("1 + 2 * 3"), json!(7));
    assert_eq!(eval_ok("10 / 2"), json!(5));
    assert_eq!(eval_ok("2 ^ 10"), json!(1024));
    assert_eq!(eval_ok("7 % 4"), json!(3));
    assert_eq!(eval_ok("-x + 1"), json!(-2));
}

#[test]
fn test_inexact_results_are_floats() {
    assert_eq!(eval_ok("7 / 2"), json!(3.5));
    assert_eq!(eval_ok("0.5 + 1"), json!(1.5));
    assert_eq!(eval_ok("2 ^ -1"), json!(0.5));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval_ok("'a' + 1"), json!("a1"));
    assert_eq!(eval_ok("'a' & nothing & 'b'"), json!("ab"));
    assert_eq!(eval_ok("user.name + ' is ' + user.age"), json!("Bob is 31"));
}

// ===== Errors =====

#[test]
fn test_divide_by_zero() {
    assert_eq!(eval_err("1 / 0"), "Cannot divide by 0.");
    assert_eq!(eval_err("1 % 0"), "Cannot mod by 0.");
}

#[test]
fn test_first_error_wins() {
    assert_eq!(eval_err("(1 / 0) + (1 % 0)"), "Cannot divide by 0.");
    assert_eq!(eval_err("concat(1 / 0, missing - 1)"), "Cannot divide by 0.");
}

#[test]
fn test_missing_operand_is_reported_by_name() {
    assert_eq!(eval_err("missing - 1"), "missing is not a number.");
}

#[test]
fn test_error_inside_nested_call_propagates() {
    let message = eval_err("toUpper(string(1 / 0))");
    assert_eq!(message, "Cannot divide by 0.");
}

// ===== Access =====

#[test]
fn test_property_access() {
    assert_eq!(eval_ok("user.name"), json!("Bob"));
    assert_eq!(eval_ok("user.tags[1]"), json!("ops"));
    assert_eq!(eval_ok("user['age']"), json!(31));
    assert_eq!(eval_ok("scores['ma' + 'th']"), json!(90));
}

#[test]
fn test_missing_paths_are_null() {
    assert_eq!(eval_ok("user.missing"), Value::Null);
    assert_eq!(eval_ok("missing.deeper.still"), Value::Null);
    assert_eq!(eval_ok("nothing[0]"), Value::Null);
}

#[test]
fn test_index_errors() {
    assert_eq!(eval_err("items[5]"), "5 index out of range");
    assert_eq!(eval_err("x[0]"), "x is not a collection.");
}

#[test]
fn test_access_on_computed_value() {
    assert_eq!(eval_ok("createArray(4, 5, 6)[2]"), json!(6));
    assert_eq!(eval_ok("json('{\"a\": {\"b\": 7}}').a.b"), json!(7));
}

// ===== Logic =====

#[test]
fn test_truthiness() {
    for falsy in [json!(null), json!(false), json!(0), json!(""), json!([]), json!({})] {
        assert!(!is_logic_true(&falsy), "{falsy} should be false");
    }
    for truthy in [json!(true), json!(1), json!(-0.5), json!("0"), json!([0]), json!({"a": 0})] {
        assert!(is_logic_true(&truthy), "{truthy} should be true");
    }
}

#[test]
fn test_connectives_swallow_errors() {
    assert_eq!(eval_ok("(1 / 0) || true"), json!(true));
    assert_eq!(eval_ok("(1 / 0) && true"), json!(false));
    assert_eq!(eval_ok("!(1 / 0)"), json!(true));
}

#[test]
fn test_connectives_short_circuit() {
    let mut memory = SimpleObjectMemory::new(json!({}));
    let expression = parse("false && setProperty(state, 'hit', true).hit").unwrap();
    assert_eq!(
        expression.try_evaluate(&mut memory, &Options::default()).unwrap(),
        json!(false)
    );
    assert_eq!(memory.get_value("state"), None);
}

#[test]
fn test_if_branches() {
    assert_eq!(eval_ok("if(x > 2, 'big', 'small')"), json!("big"));
    assert_eq!(eval_ok("if(flag, 'yes', 'no')"), json!("no"));
    assert_eq!(eval_ok("if(1 / 0, 'yes', 'no')"), json!("no"));
    assert_eq!(eval_ok("if(true, 1, 1 / 0)"), json!(1));
    assert_eq!(eval_err("if(false, 1, 1 / 0)"), "Cannot divide by 0.");
}

#[test]
fn test_coalesce() {
    assert_eq!(eval_ok("coalesce(nothing, missing, 'found', 'later')"), json!("found"));
    assert_eq!(eval_ok("coalesce(nothing)"), Value::Null);
}

// ===== Null substitution =====

#[test]
fn test_null_substitution_replaces_missing_paths() {
    let options = Options::new().with_null_substitution(|path| Some(json!(format!("<{path}>"))));
    assert_eq!(
        eval_with("'hi ' + user.nickname", state(), &options).unwrap(),
        json!("hi <user.nickname>")
    );
    assert_eq!(
        eval_with("user.name", state(), &options).unwrap(),
        json!("Bob")
    );
}

#[test]
fn test_null_substitution_is_off_in_conditions() {
    let options = Options::new().with_null_substitution(|_| Some(json!(true)));
    assert_eq!(
        eval_with("if(user.admin, 'admin', 'guest')", state(), &options).unwrap(),
        json!("guest")
    );
    assert_eq!(
        eval_with("user.admin", state(), &options).unwrap(),
        json!(true)
    );
}

#[test]
fn test_null_substitution_may_decline() {
    let options = Options::new().with_null_substitution(|path| {
        (path == "known").then(|| json!("substituted"))
    });
    assert_eq!(eval_with("known", json!({}), &options).unwrap(), json!("substituted"));
    assert_eq!(eval_with("unknown", json!({}), &options).unwrap(), Value::Null);
}

// ===== Iteration and scoping =====

#[test]
fn test_foreach_binds_each_element() {
    assert_eq!(eval_ok("foreach(items, i, i * 10)"), json!([10, 20, 30]));
    assert_eq!(eval_ok("select(items, i => i + x)"), json!([4, 5, 6]));
}

#[test]
fn test_where_filters_lists_and_objects() {
    assert_eq!(eval_ok("where(items, i => i > 1)"), json!([2, 3]));
    assert_eq!(
        eval_ok("where(scores, s => s.value > 80)"),
        json!({"math": 90})
    );
}

#[test]
fn test_lambda_variable_shadows_outer_name() {
    assert_eq!(eval_ok("foreach(items, x, x)"), json!([1, 2, 3]));
    assert_eq!(eval_ok("x"), json!(3));
}

#[test]
fn test_lambda_sees_outer_names() {
    assert_eq!(
        eval_ok("foreach(user.tags, t, concat(user.name, ':', t))"),
        json!(["Bob:admin", "Bob:ops"])
    );
}

#[test]
fn test_nested_lambdas() {
    assert_eq!(
        eval_ok("foreach(items, a, where(items, b => b < a))"),
        json!([[], [1], [1, 2]])
    );
}

#[test]
fn test_any_all() {
    assert_eq!(eval_ok("any(items, i => i == 2)"), json!(true));
    assert_eq!(eval_ok("all(items, i => i > 1)"), json!(false));
    assert_eq!(eval_ok("all(createArray(), i => false)"), json!(true));
}

#[test]
fn test_error_in_lambda_body_propagates() {
    assert_eq!(eval_err("foreach(items, i, i / 0)"), "Cannot divide by 0.");
}

#[test]
fn test_evaluation_through_stacked_memory() {
    let mut stack = StackedMemory::wrap(SimpleObjectMemory::new(state()));
    stack.push(SimpleObjectMemory::new(json!({"x": 100, "turn": {"count": 2}})));

    let expression = parse("x + turn.count + count(items)").unwrap();
    assert_eq!(
        expression.try_evaluate(&mut stack, &Options::default()).unwrap(),
        json!(105)
    );
}

// ===== Writes =====

#[test]
fn test_set_path_to_value_writes_memory() {
    let mut memory = SimpleObjectMemory::new(json!({"user": {}}));
    let expression = parse("setPathToValue(user.visits, 1 + 1)").unwrap();
    assert_eq!(
        expression.try_evaluate(&mut memory, &Options::default()).unwrap(),
        json!(2)
    );
    assert_eq!(memory.value(), &json!({"user": {"visits": 2}}));
}

#[test]
fn test_set_property_writes_back_to_its_path() {
    let mut memory = SimpleObjectMemory::new(json!({"user": {"name": "Bob"}}));
    let expression = parse("setProperty(user, 'age', 40)").unwrap();
    assert_eq!(
        expression.try_evaluate(&mut memory, &Options::default()).unwrap(),
        json!({"name": "Bob", "age": 40})
    );
    assert_eq!(memory.value(), &json!({"user": {"name": "Bob", "age": 40}}));
}

#[test]
fn test_wrapped_host_value_sees_writes() {
    let mut host = json!({"counter": 1});
    {
        let mut memory = SimpleObjectMemory::wrap(&mut host);
        parse("setPathToValue(counter, counter + 1)")
            .unwrap()
            .try_evaluate(&mut memory, &Options::default())
            .unwrap();
    }
    assert_eq!(host, json!({"counter": 2}));
}

// ===== Determinism =====

#[test]
fn test_same_tree_same_memory_same_result() {
    let expression = parse("join(foreach(items, i, i * x), '-')").unwrap();
    let first = expression
        .try_evaluate(&mut SimpleObjectMemory::new(state()), &Options::default())
        .unwrap();
    let second = expression
        .try_evaluate(&mut SimpleObjectMemory::new(state()), &Options::default())
        .unwrap();
    assert_eq!(first, json!("3-6-9"));
    assert_eq!(first, second);
}
