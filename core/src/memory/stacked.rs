use serde_json::Value;

use super::{Memory, MemoryError};

/// A read-only stack of memories.
///
/// Lookups search from the most recently pushed scope down to the first one
/// and return the first hit, so inner scopes shadow outer ones. Writes are
/// always rejected: pushed scopes exist only to bind iteration variables
/// without touching outer state.
pub struct StackedMemory<'a> {
    scopes: Vec<Box<dyn Memory + 'a>>,
}

impl<'a> StackedMemory<'a> {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Create a stack whose bottom scope is `memory`.
    pub fn wrap<M: Memory + 'a>(memory: M) -> Self {
        let mut stack = Self::new();
        stack.push(memory);
        stack
    }

    /// Push a scope on top of the stack.
    pub fn push<M: Memory + 'a>(&mut self, memory: M) {
        self.scopes.push(Box::new(memory));
    }

    /// Pop the topmost scope, if any.
    pub fn pop(&mut self) -> Option<Box<dyn Memory + 'a>> {
        self.scopes.pop()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl Default for StackedMemory<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory for StackedMemory<'_> {
    fn get_value(&self, path: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get_value(path))
    }

    fn set_value(&mut self, _path: &str, _value: Value) -> Result<(), MemoryError> {
        Err(MemoryError::ReadOnly)
    }

    fn version(&self) -> String {
        self.scopes.iter().map(|scope| scope.version()).collect()
    }
}
