//! Fragment resolution caching.
//!
//! [`ResolutionCache`] is an LRU map from a fragment to its resolution result
//! (including "no match"), used by [`RouteTable`](crate::RouteTable) so that a
//! reconciliation which re-splits the same address does not re-run route
//! matching for every fragment. It is gated behind the `cache` feature and
//! uses the [`lru`] crate internally.
//!
//! # Examples
//!
//! ```
//! use stacked_navigator::cache::ResolutionCache;
//! use stacked_navigator::Location;
//!
//! let mut cache = ResolutionCache::new();
//! cache.insert("/inbox".to_string(), Some(Location::new("/inbox")));
//!
//! assert!(cache.get("/inbox").is_some());
//! assert_eq!(cache.stats().hits, 1);
//! ```

use crate::page::Location;
use crate::{debug_log, trace_log};
use lru::LruCache;
use std::num::NonZeroUsize;

/// Counters tracking cache hit/miss rates and invalidations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: usize,
    /// Lookups that had to resolve.
    pub misses: usize,
    /// Number of full invalidations (via [`ResolutionCache::clear`]).
    pub invalidations: usize,
}

impl CacheStats {
    /// Return the hit rate as a value in `0.0..=1.0`.
    ///
    /// Returns `0.0` if no lookups have been performed.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of fragment resolutions. Default capacity is 256 entries.
#[derive(Debug)]
pub struct ResolutionCache {
    entries: LruCache<String, Option<Location>>,
    stats: CacheStats,
}

impl ResolutionCache {
    const DEFAULT_CAPACITY: usize = 256;

    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a cache with a custom capacity. A capacity of zero is raised
    /// to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(cap),
            stats: CacheStats::default(),
        }
    }

    /// Look up a fragment. The outer `None` is a cache miss, the inner one a
    /// cached "no route matched".
    pub fn get(&mut self, path: &str) -> Option<Option<Location>> {
        if let Some(entry) = self.entries.get(path) {
            self.stats.hits += 1;
            trace_log!("Resolution cache hit for '{}'", path);
            Some(entry.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Resolution cache miss for '{}'", path);
            None
        }
    }

    /// Store the resolution result for a fragment.
    pub fn insert(&mut self, path: String, location: Option<Location>) {
        self.entries.push(path, location);
    }

    /// Drop every entry and count an invalidation.
    pub fn clear(&mut self) {
        let len = self.entries.len();
        self.entries.clear();
        self.stats.invalidations += 1;
        debug_log!(
            "Resolution cache cleared: {} entries removed ({} invalidations, hit rate {:.1}%)",
            len,
            self.stats.invalidations,
            self.stats.hit_rate() * 100.0
        );
    }

    /// Return a reference to the current cache statistics.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_then_hit() {
        let mut cache = ResolutionCache::new();
        assert!(cache.get("/inbox").is_none());
        cache.insert("/inbox".to_string(), None);
        assert_eq!(cache.get("/inbox").map(|l| l.is_none()), Some(true));
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 1);
        assert!((cache.stats().hit_rate() - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_eviction() {
        let mut cache = ResolutionCache::with_capacity(2);
        cache.insert("/a".to_string(), Some(Location::new("/a")));
        cache.insert("/b".to_string(), Some(Location::new("/b")));
        cache.get("/a");
        cache.insert("/c".to_string(), Some(Location::new("/c")));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("/b").is_none());
        assert!(cache.get("/a").is_some());
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        assert_eq!(ResolutionCache::with_capacity(0).capacity(), 1);
    }

    #[test]
    fn test_clear() {
        let mut cache = ResolutionCache::new();
        cache.insert("/".to_string(), None);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().invalidations, 1);
    }
}
