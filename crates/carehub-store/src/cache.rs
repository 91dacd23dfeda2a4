//! TTL cache for catalog reads using moka
//!
//! Catalog rows change rarely; list and detail reads are cached by a string
//! key (table plus query) and expire after a fixed time-to-live.

use moka::future::Cache;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to load
    pub misses: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// String-keyed cache with capacity and time-based expiry
#[derive(Debug, Clone)]
pub struct TtlCache<V: Clone + Send + Sync + 'static> {
    inner: Cache<String, V>,
    counters: Arc<Counters>,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    /// Create cache with max capacity and time-to-live
    #[must_use]
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            counters: Arc::default(),
        }
    }

    /// Get a cached value
    pub async fn get(&self, key: &str) -> Option<V> {
        let found = self.inner.get(key).await;
        let counter = if found.is_some() {
            &self.counters.hits
        } else {
            &self.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Insert a value
    #[inline]
    pub async fn insert(&self, key: impl Into<String>, value: V) {
        self.inner.insert(key.into(), value).await;
    }

    /// Return the cached value or load, cache and return it
    ///
    /// Failed loads are not cached.
    ///
    /// # Errors
    /// Propagates the loader's error.
    pub async fn get_or_try_insert_with<E, F, Fut>(&self, key: &str, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(cached) = self.get(key).await {
            tracing::trace!(key, "cache hit");
            return Ok(cached);
        }

        let value = load().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Invalidate one entry
    #[inline]
    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
        }
    }
}
