//! Path-based access to host state.
//!
//! Expressions read and write state through the [`Memory`] trait. Paths are
//! chains such as `user.name`, `items[0]` or `bag['a key']`; see
//! [`path::parse`] for the grammar.
//!
//! Two implementations ship with the engine:
//! - [`SimpleObjectMemory`]: one JSON value, owned or borrowed from the host.
//! - [`StackedMemory`]: read-only layering of scopes, used to bind iteration
//!   variables over the ambient memory.

pub mod path;
mod simple;
mod stacked;

use serde_json::Value;
use thiserror::Error;

pub use simple::SimpleObjectMemory;
pub use stacked::StackedMemory;

/// Host state as seen by an expression.
pub trait Memory {
    /// Resolve `path`, returning `None` when nothing is stored there.
    fn get_value(&self, path: &str) -> Option<Value>;

    /// Store `value` at `path`.
    fn set_value(&mut self, path: &str, value: Value) -> Result<(), MemoryError>;

    /// A stamp that changes whenever the contents change.
    fn version(&self) -> String;
}

impl<M: Memory + ?Sized> Memory for &mut M {
    fn get_value(&self, path: &str) -> Option<Value> {
        (**self).get_value(path)
    }

    fn set_value(&mut self, path: &str, value: Value) -> Result<(), MemoryError> {
        (**self).set_value(path, value)
    }

    fn version(&self) -> String {
        (**self).version()
    }
}

impl<M: Memory + ?Sized> Memory for Box<M> {
    fn get_value(&self, path: &str) -> Option<Value> {
        (**self).get_value(path)
    }

    fn set_value(&mut self, path: &str, value: Value) -> Result<(), MemoryError> {
        (**self).set_value(path, value)
    }

    fn version(&self) -> String {
        (**self).version()
    }
}

/// Failure to write into a memory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("'{0}' is not a valid memory path")]
    InvalidPath(String),

    #[error("index {index} is out of range for a list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot set an index on a non-list value at '{0}'")]
    NotAList(String),

    #[error("cannot set property '{0}' on a non-object value")]
    NotAnObject(String),

    #[error("no value exists at '{0}' to write into")]
    MissingParent(String),

    #[error("memory is read-only")]
    ReadOnly,
}
