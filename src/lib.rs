//! Adaptive expressions: a small, embeddable expression language
//!
//! # Overview
//!
//! Expressions are short strings evaluated against host-supplied JSON state.
//! Common use cases include:
//!
//! - Conditions in dialog and workflow definitions
//! - Templated responses built from runtime data
//! - Data lookups and light transformations
//! - Business rules kept outside the host program
//!
//! # Quick Start
//!
//! ```
//! use adaptive_expressions::{Engine, EngineOptions, SimpleObjectMemory};
//! use serde_json::json;
//!
//! let engine = Engine::new(EngineOptions::default());
//! let mut memory = SimpleObjectMemory::new(json!({
//!     "user": {"name": "Ada", "visits": 3},
//! }));
//!
//! let greeting = engine
//!     .evaluate("`Hi ${user.name}, visit #${user.visits + 1}`", &mut memory)
//!     .unwrap();
//! assert_eq!(greeting, json!("Hi Ada, visit #4"));
//! ```
//!
//! # Errors
//!
//! Parse failures are fatal and carry a [`Diagnostic`] with a source span;
//! [`render_error`] prints them with the offending source underlined.
//! Evaluation failures are soft: they come back as [`Error::Runtime`] and the
//! host decides what to do with them.

mod error_renderer;

pub use adaptive_expressions_core::api::{Diagnostic, Engine, EngineOptions, Error, Severity};
pub use adaptive_expressions_core::{
    EvalError, Expression, Memory, MemoryError, Options, ParseCache, ParseError, ParseErrorKind,
    ReturnType, SimpleObjectMemory, Span, StackedMemory, parse,
};
pub use adaptive_expressions_core::{evaluator, memory, stdlib};

pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
