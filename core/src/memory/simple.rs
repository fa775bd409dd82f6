use serde_json::{Map, Value};

use super::{Memory, MemoryError, path};
use crate::value::{property, property_mut};

enum Backing<'a> {
    Owned(Value),
    Borrowed(&'a mut Value),
}

/// A memory over a single JSON value.
///
/// Reads resolve each path segment left to right: integer segments index
/// lists, everything else is a property lookup that falls back to a
/// case-insensitive match. Anything that cannot be resolved reads as `None`.
///
/// Writes go straight into the wrapped value; with [`SimpleObjectMemory::wrap`]
/// that is the host's own structure.
pub struct SimpleObjectMemory<'a> {
    backing: Backing<'a>,
}

impl SimpleObjectMemory<'static> {
    /// Take ownership of `value`.
    pub fn new(value: Value) -> Self {
        Self {
            backing: Backing::Owned(value),
        }
    }
}

impl<'a> SimpleObjectMemory<'a> {
    /// Borrow a host value; writes are visible to the host afterwards.
    pub fn wrap(value: &'a mut Value) -> Self {
        Self {
            backing: Backing::Borrowed(value),
        }
    }

    pub fn value(&self) -> &Value {
        match &self.backing {
            Backing::Owned(v) => v,
            Backing::Borrowed(v) => v,
        }
    }

    fn value_mut(&mut self) -> &mut Value {
        match &mut self.backing {
            Backing::Owned(v) => v,
            Backing::Borrowed(v) => v,
        }
    }

    /// Give back the wrapped value (a clone when borrowed).
    pub fn into_value(self) -> Value {
        match self.backing {
            Backing::Owned(v) => v,
            Backing::Borrowed(v) => v.clone(),
        }
    }
}

impl Default for SimpleObjectMemory<'static> {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

impl From<Value> for SimpleObjectMemory<'static> {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Resolve already-parsed segments against `root`.
pub(crate) fn resolve<'v, S: AsRef<str>>(root: &'v Value, segments: &[S]) -> Option<&'v Value> {
    let mut current = root;
    for segment in segments {
        let segment = segment.as_ref();
        current = match current {
            Value::Array(items) => items.get(path::as_index(segment)?)?,
            Value::Object(map) => property(map, segment)?,
            _ => return None,
        };
    }
    Some(current)
}

impl Memory for SimpleObjectMemory<'_> {
    fn get_value(&self, path: &str) -> Option<Value> {
        let segments = path::parse(path).ok()?;
        if segments.is_empty() || self.value().is_null() {
            return None;
        }
        match resolve(self.value(), &segments)? {
            Value::Null => None,
            value => Some(value.clone()),
        }
    }

    fn set_value(&mut self, path: &str, value: Value) -> Result<(), MemoryError> {
        let segments = path::parse(path)?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(MemoryError::InvalidPath(path.to_string()));
        };

        let mut current = self.value_mut();
        for (i, segment) in parents.iter().enumerate() {
            let missing = || MemoryError::MissingParent(path::render(&segments[..=i]));
            current = match current {
                Value::Array(items) => path::as_index(segment)
                    .and_then(|index| items.get_mut(index))
                    .ok_or_else(missing)?,
                Value::Object(map) => property_mut(map, segment).ok_or_else(missing)?,
                _ => return Err(missing()),
            };
        }

        match current {
            Value::Array(items) => {
                let index = path::as_index(last).ok_or_else(|| MemoryError::NotAnObject(last.clone()))?;
                let len = items.len();
                if index > len {
                    return Err(MemoryError::IndexOutOfRange { index, len });
                }
                if index == len {
                    items.push(value);
                } else {
                    items[index] = value;
                }
            }
            Value::Object(map) => {
                if path::as_index(last).is_some() && !map.contains_key(last.as_str()) {
                    return Err(MemoryError::NotAList(path::render(parents)));
                }
                match property_mut(map, last) {
                    Some(slot) => *slot = value,
                    None => {
                        map.insert(last.clone(), value);
                    }
                }
            }
            _ => return Err(MemoryError::NotAnObject(last.clone())),
        }
        Ok(())
    }

    fn version(&self) -> String {
        self.value().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn memory() -> SimpleObjectMemory<'static> {
        SimpleObjectMemory::new(json!({
            "user": {"name": "Bob", "Nickname": "Bobby"},
            "items": ["zero", "one", "two"],
            "bag": {"a key": 1},
            "nothing": null,
        }))
    }

    #[test]
    fn test_get_nested_values() {
        let memory = memory();
        assert_eq!(memory.get_value("user.name"), Some(json!("Bob")));
        assert_eq!(memory.get_value("items[1]"), Some(json!("one")));
        assert_eq!(memory.get_value("bag['a key']"), Some(json!(1)));
    }

    #[test]
    fn test_property_lookup_ignores_case_as_fallback() {
        assert_eq!(memory().get_value("USER.nickname"), Some(json!("Bobby")));
    }

    #[test]
    fn test_missing_values_read_as_none() {
        let memory = memory();
        assert_eq!(memory.get_value("user.missing"), None);
        assert_eq!(memory.get_value("items[7]"), None);
        assert_eq!(memory.get_value("user.name.first"), None);
        assert_eq!(memory.get_value("nothing"), None);
        assert_eq!(memory.get_value(""), None);
    }

    #[test]
    fn test_set_writes_through_to_host_value() {
        let mut host = json!({"path": {"array": [1]}});
        {
            let mut memory = SimpleObjectMemory::wrap(&mut host);
            memory.set_value("path.simple", json!(3)).unwrap();
            memory.set_value("path.array[0]", json!(7)).unwrap();
            memory.set_value("path.array[1]", json!(9)).unwrap();
        }
        assert_eq!(host, json!({"path": {"array": [7, 9], "simple": 3}}));
    }

    #[test]
    fn test_set_past_the_end_of_a_list_fails() {
        let mut memory = memory();
        assert_eq!(
            memory.set_value("items[5]", json!("five")),
            Err(MemoryError::IndexOutOfRange { index: 5, len: 3 })
        );
    }

    #[test]
    fn test_set_under_missing_parent_fails() {
        let mut memory = memory();
        assert!(matches!(
            memory.set_value("ghost.name", json!(1)),
            Err(MemoryError::MissingParent(_))
        ));
    }

    #[test]
    fn test_version_changes_after_write() {
        let mut memory = memory();
        let before = memory.version();
        memory.set_value("user.name", json!("Alice")).unwrap();
        assert_ne!(before, memory.version());
    }
}
