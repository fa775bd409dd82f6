//! Configuration options for the engine.

use crate::evaluator::Options;
use crate::parser::DEFAULT_MAX_DEPTH;

/// Configuration options for the [`Engine`](super::Engine).
///
/// # Example
///
/// ```
/// use adaptive_expressions_core::api::EngineOptions;
///
/// let options = EngineOptions {
///     max_depth: 32,
///     ..EngineOptions::default()
/// };
/// assert!(options.cache_parses);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum nesting of parentheses, brackets, braces and templates.
    ///
    /// Default: 128
    pub max_depth: usize,

    /// Keep parsed trees keyed by their source text.
    ///
    /// Default: true
    pub cache_parses: bool,

    /// Locale handed to every evaluation (e.g. `"en-US"`).
    ///
    /// Default: None
    pub default_locale: Option<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            cache_parses: true,
            default_locale: None,
        }
    }
}

impl EngineOptions {
    /// Evaluation options derived from these settings.
    pub fn evaluation_options(&self) -> Options {
        match &self.default_locale {
            Some(locale) => Options::new().with_locale(locale),
            None => Options::new(),
        }
    }
}
