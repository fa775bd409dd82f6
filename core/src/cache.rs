//! Memoized parsing keyed by exact source text.
//!
//! Expression trees are immutable, so a parsed tree is stored once behind an
//! [`Arc`] and handed out to every caller asking for the same text. Racing
//! parses of an uncached string may both do the work; the first insert wins
//! and every caller gets that tree back. Failed parses are never stored.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::expression::Expression;
use crate::parser::{self, DEFAULT_MAX_DEPTH, ParseError};

static GLOBAL: Lazy<ParseCache> = Lazy::new(ParseCache::default);

#[derive(Debug)]
pub struct ParseCache {
    entries: DashMap<String, Arc<Expression>>,
    max_depth: usize,
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }
}

impl ParseCache {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_depth,
        }
    }

    /// The process-wide cache used by [`crate::parse`].
    pub fn global() -> &'static ParseCache {
        &GLOBAL
    }

    /// Return the cached tree for `source`, parsing it on a miss.
    pub fn get_or_parse(&self, source: &str) -> Result<Arc<Expression>, ParseError> {
        if let Some(hit) = self.entries.get(source) {
            tracing::trace!(source, "parse cache hit");
            return Ok(Arc::clone(hit.value()));
        }

        tracing::trace!(source, "parse cache miss");
        let expression = parser::parse_with_max_depth(source, self.max_depth)?;
        let entry = self
            .entries
            .entry(source.to_string())
            .or_insert_with(|| Arc::new(expression));
        Ok(Arc::clone(entry.value()))
    }

    pub fn contains(&self, source: &str) -> bool {
        self.entries.contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_hits_return_the_same_tree() {
        let cache = ParseCache::default();
        let first = cache.get_or_parse("1 + 2").unwrap();
        let second = cache.get_or_parse("1 + 2").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache = ParseCache::default();
        assert!(cache.get_or_parse("1 +").is_err());
        assert!(cache.get_or_parse("nope(1)").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_parses_converge() {
        let cache = Arc::new(ParseCache::default());
        let source = "concat('a', user.name, `${count(items)}`)";
        let trees: Vec<Arc<Expression>> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get_or_parse(source).unwrap())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        let canonical = cache.get_or_parse(source).unwrap();
        for tree in &trees {
            assert!(Arc::ptr_eq(tree, &canonical));
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_depth_limit_applies() {
        let cache = ParseCache::with_max_depth(1);
        assert!(cache.get_or_parse("(1)").is_ok());
        assert!(cache.get_or_parse("((1))").is_err());
    }
}
