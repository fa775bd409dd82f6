//! Host-facing API.
//!
//! [`Engine`] bundles parsing (with an optional per-engine cache), the nesting
//! limit and a default locale. Errors cross this boundary as [`Error`]:
//! parse failures become [`Diagnostic`]s, evaluation failures become
//! [`Error::Runtime`].
//!
//! # Example
//!
//! ```
//! use adaptive_expressions_core::api::{Engine, EngineOptions};
//! use adaptive_expressions_core::memory::SimpleObjectMemory;
//! use serde_json::json;
//!
//! let engine = Engine::new(EngineOptions::default());
//! let mut memory = SimpleObjectMemory::new(json!({"name": "Ada"}));
//! let value = engine.evaluate("`Hello ${name}`", &mut memory).unwrap();
//! assert_eq!(value, json!("Hello Ada"));
//! ```

pub mod engine;
pub mod error;
pub mod options;

pub use engine::Engine;
pub use error::{Diagnostic, Error, Severity};
pub use options::EngineOptions;
