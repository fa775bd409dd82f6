//! Coarse static types used for parse-time validation.
//!
//! Every node advertises a [`ReturnType`]; validators compare a child's flags
//! against the set a builtin expects. Nothing here coerces values at runtime.

pub mod validate;

use core::fmt;

use bitflags::bitflags;
use serde_json::Value;

pub use validate::ValidationError;

bitflags! {
    /// The kinds of value a node may produce.
    ///
    /// A node can advertise several flags. `OBJECT` means "only known at
    /// runtime" and is compatible with every expectation.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct ReturnType: u8 {
        const BOOLEAN = 1;
        const NUMBER = 1 << 1;
        const OBJECT = 1 << 2;
        const STRING = 1 << 3;
        const ARRAY = 1 << 4;
    }
}

impl ReturnType {
    /// The flags a constant of this value advertises.
    ///
    /// `null` advertises every flag so it passes any check.
    pub fn of_value(value: &Value) -> ReturnType {
        match value {
            Value::Null => ReturnType::all(),
            Value::Bool(_) => ReturnType::BOOLEAN,
            Value::Number(_) => ReturnType::NUMBER,
            Value::String(_) => ReturnType::STRING,
            Value::Array(_) => ReturnType::ARRAY,
            Value::Object(_) => ReturnType::OBJECT,
        }
    }

    /// Whether a child advertising `self` may be passed where `expected` is required.
    pub fn satisfies(self, expected: ReturnType) -> bool {
        self.contains(ReturnType::OBJECT) || self.intersects(expected)
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        if names.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}
