mod cases;

use std::collections::BTreeMap;

use adaptive_expressions::{Memory, MemoryError, SimpleObjectMemory, StackedMemory};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use cases::ENGINE;

fn eval(source: &str, memory: &mut dyn Memory) -> Result<Value, String> {
    ENGINE.evaluate(source, memory).map_err(|err| err.to_string())
}

#[test]
fn set_path_to_value_writes_into_host_value() {
    let mut host = json!({"user": {"name": "Ada"}, "items": [1, 2]});
    {
        let mut memory = SimpleObjectMemory::wrap(&mut host);
        assert_eq!(eval("setPathToValue(user.visits, 3)", &mut memory), Ok(json!(3)));
        assert_eq!(eval("setPathToValue(items[2], 'x')", &mut memory), Ok(json!("x")));
        assert_eq!(eval("setPathToValue(user['nick name'], 'A')", &mut memory), Ok(json!("A")));
    }
    assert_eq!(
        host,
        json!({"user": {"name": "Ada", "visits": 3, "nick name": "A"}, "items": [1, 2, "x"]})
    );
}

#[test]
fn set_path_to_value_with_computed_index() {
    let mut memory = SimpleObjectMemory::new(json!({"slots": [0, 0, 0], "i": 1}));
    eval("setPathToValue(slots[i + 1], 9)", &mut memory).unwrap();
    assert_eq!(memory.get_value("slots"), Some(json!([0, 0, 9])));
}

#[test]
fn set_path_to_value_reports_missing_parent() {
    let mut memory = SimpleObjectMemory::new(json!({}));
    assert_eq!(
        eval("setPathToValue(a.b.c, 1)", &mut memory),
        Err("Runtime error: no value exists at 'a' to write into".to_string())
    );
}

#[test]
fn object_builtins_write_back_to_their_path() {
    let mut host = json!({"profile": {"name": "Ada"}});
    {
        let mut memory = SimpleObjectMemory::wrap(&mut host);
        eval("addProperty(profile, 'lang', 'en')", &mut memory).unwrap();
        eval("setProperty(profile, 'name', 'Grace')", &mut memory).unwrap();
        eval("removeProperty(profile, 'lang')", &mut memory).unwrap();
    }
    assert_eq!(host, json!({"profile": {"name": "Grace"}}));
}

#[test]
fn updates_are_visible_to_later_evaluations() {
    let mut memory = SimpleObjectMemory::new(json!({"count": 1}));
    eval("setPathToValue(count, count + 1)", &mut memory).unwrap();
    eval("setPathToValue(count, count * 10)", &mut memory).unwrap();
    assert_eq!(eval("count", &mut memory), Ok(json!(20)));
}

#[test]
fn version_tracks_changes() {
    let mut memory = SimpleObjectMemory::new(json!({"n": 1}));
    let before = memory.version();
    assert_eq!(eval("n + 1", &mut memory), Ok(json!(2)));
    assert_eq!(memory.version(), before);

    eval("setPathToValue(n, 5)", &mut memory).unwrap();
    assert_ne!(memory.version(), before);
}

#[test]
fn stacked_memory_shadows_and_falls_through() {
    let mut stack = StackedMemory::wrap(SimpleObjectMemory::new(json!({"x": 1, "y": 2})));
    stack.push(SimpleObjectMemory::new(json!({"x": 10})));
    assert_eq!(eval("x + y", &mut stack), Ok(json!(12)));
    assert_eq!(eval("`${x}/${y}/${z}`", &mut stack), Ok(json!("10/2/")));
}

#[test]
fn stacked_memory_rejects_writes() {
    let mut stack = StackedMemory::wrap(SimpleObjectMemory::new(json!({"x": 1})));
    assert_eq!(
        eval("setPathToValue(x, 2)", &mut stack),
        Err("Runtime error: memory is read-only".to_string())
    );
    assert_eq!(stack.set_value("x", json!(2)), Err(MemoryError::ReadOnly));
}

#[test]
fn writes_inside_lambdas_are_not_allowed() {
    let mut memory = SimpleObjectMemory::new(json!({"nums": [1, 2], "total": 0}));
    assert_eq!(
        eval("foreach(nums, n => setPathToValue(total, n))", &mut memory),
        Err("Runtime error: memory is read-only".to_string())
    );
    assert_eq!(memory.get_value("total"), Some(json!(0)));
}

/// A flat key/value store with no nesting.
#[derive(Default)]
struct FlatMemory {
    entries: BTreeMap<String, Value>,
    writes: usize,
}

impl Memory for FlatMemory {
    fn get_value(&self, path: &str) -> Option<Value> {
        self.entries.get(path).cloned()
    }

    fn set_value(&mut self, path: &str, value: Value) -> Result<(), MemoryError> {
        self.entries.insert(path.to_string(), value);
        self.writes += 1;
        Ok(())
    }

    fn version(&self) -> String {
        self.writes.to_string()
    }
}

#[test]
fn host_defined_memory() {
    let mut memory = FlatMemory::default();
    memory.entries.insert("greeting".to_string(), json!("hi"));
    memory.entries.insert("user.name".to_string(), json!("Ada"));

    assert_eq!(eval("`${greeting}, ${user.name}`", &mut memory), Ok(json!("hi, Ada")));
    assert_eq!(eval("setPathToValue(user.seen, true)", &mut memory), Ok(json!(true)));
    assert_eq!(memory.entries.get("user.seen"), Some(&json!(true)));
    assert_eq!(memory.version(), "1");
}
