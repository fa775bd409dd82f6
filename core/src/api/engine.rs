//! The expression engine.

use std::sync::Arc;

use serde_json::Value;

use super::{EngineOptions, Error};
use crate::cache::ParseCache;
use crate::evaluator::Options;
use crate::expression::Expression;
use crate::memory::Memory;
use crate::parser;

/// Parses and evaluates expressions with one set of options.
///
/// Each engine owns its parse cache, sized by nothing but the number of
/// distinct sources it sees. Engines are `Send + Sync` and meant to be
/// shared.
#[derive(Debug)]
pub struct Engine {
    options: EngineOptions,
    cache: ParseCache,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        let cache = ParseCache::with_max_depth(options.max_depth);
        Self { options, cache }
    }

    /// Access the engine options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Parse `source`, reusing a cached tree when caching is on.
    pub fn compile(&self, source: &str) -> Result<Arc<Expression>, Error> {
        if self.options.cache_parses {
            Ok(self.cache.get_or_parse(source)?)
        } else {
            Ok(Arc::new(parser::parse_with_max_depth(
                source,
                self.options.max_depth,
            )?))
        }
    }

    /// Parse and evaluate `source` against `memory`.
    pub fn evaluate(&self, source: &str, memory: &mut dyn Memory) -> Result<Value, Error> {
        let expression = self.compile(source)?;
        self.run(&expression, memory, &self.options.evaluation_options())
    }

    /// Evaluate an already-parsed expression with explicit options.
    pub fn run(
        &self,
        expression: &Expression,
        memory: &mut dyn Memory,
        options: &Options,
    ) -> Result<Value, Error> {
        expression.try_evaluate(memory, options).map_err(|err| {
            tracing::debug!(expression = %expression, error = %err, "evaluation failed");
            Error::from(err)
        })
    }

    /// Number of parsed trees held by this engine.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
