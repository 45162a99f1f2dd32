//! Thread-safe processor caching.
//!
//! A config memoizes compiled processors keyed by the request and the cache
//! ID of the context it was compiled against. Any mutation of the config
//! clears the cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::error::OcioResult;
use crate::processor::Processor;

/// Memo of compiled processors.
#[derive(Debug, Default)]
pub(crate) struct ProcessorCache {
    cache: RwLock<HashMap<String, Arc<Processor>>>,
}

impl ProcessorCache {
    /// Create empty cache.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the processor stored under `key`, compiling it on a miss.
    ///
    /// Failed compilations are not cached.
    pub(crate) fn get_or_try_insert(
        &self,
        key: String,
        compile: impl FnOnce() -> OcioResult<Processor>,
    ) -> OcioResult<Arc<Processor>> {
        if let Some(cached) = self.cache.read().get(&key) {
            trace!(key = %key, "processor cache hit");
            return Ok(Arc::clone(cached));
        }

        let processor = Arc::new(compile()?);
        // Another thread may have compiled the same key meanwhile; keep the first.
        let mut cache = self.cache.write();
        Ok(Arc::clone(cache.entry(key).or_insert(processor)))
    }

    /// Clear all cached processors.
    pub(crate) fn clear(&self) {
        self.cache.write().clear();
    }

    /// Number of cached processors.
    pub(crate) fn len(&self) -> usize {
        self.cache.read().len()
    }
}
