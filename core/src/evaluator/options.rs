//! Per-evaluation options.

use core::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Produces a replacement for a path that resolved to no value.
pub type NullSubstitution = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// Context threaded through every node of one evaluation.
///
/// # Example
///
/// ```
/// use adaptive_expressions_core::evaluator::Options;
/// use serde_json::json;
///
/// let options = Options::new()
///     .with_locale("fr-FR")
///     .with_null_substitution(|path| Some(json!(format!("{path} is missing"))));
/// assert_eq!(options.locale(), Some("fr-FR"));
/// ```
#[derive(Clone, Default)]
pub struct Options {
    locale: Option<Arc<str>>,
    null_substitution: Option<NullSubstitution>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locale used by locale-aware builtins such as `formatNumber`.
    pub fn with_locale(mut self, locale: impl AsRef<str>) -> Self {
        self.locale = Some(Arc::from(locale.as_ref()));
        self
    }

    /// Replace values of paths that resolve to nothing.
    pub fn with_null_substitution<F>(mut self, substitution: F) -> Self
    where
        F: Fn(&str) -> Option<Value> + Send + Sync + 'static,
    {
        self.null_substitution = Some(Arc::new(substitution));
        self
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn null_substitution(&self) -> Option<&NullSubstitution> {
        self.null_substitution.as_ref()
    }

    /// A copy with null substitution turned off, used around boolean conditions.
    pub fn without_null_substitution(&self) -> Options {
        Options {
            locale: self.locale.clone(),
            null_substitution: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("locale", &self.locale)
            .field("null_substitution", &self.null_substitution.is_some())
            .finish()
    }
}
