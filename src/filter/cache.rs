use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use super::{Expression, FilterSyntaxError};

/// LRU cache of parsed filter expressions, keyed by expression text.
///
/// Only successful parses are cached; a broken expression is re-parsed
/// (and re-reported) on every use.
pub struct ExpressionCache {
    cache: Mutex<LruCache<String, Arc<Expression>>>,
}

impl ExpressionCache {
    /// Create a cache holding at most `capacity` expressions (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Parsed form of `expression`, parsing and caching it on a miss.
    pub fn get_or_parse(&self, expression: &str) -> Result<Arc<Expression>, FilterSyntaxError> {
        if let Some(parsed) = self.lock().get(expression) {
            return Ok(Arc::clone(parsed));
        }

        let parsed = Arc::new(Expression::parse(expression)?);
        self.lock().put(expression.to_string(), Arc::clone(&parsed));
        Ok(parsed)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, Arc<Expression>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
