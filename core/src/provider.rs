//! Candidate provider trait and an LRU-cached wrapper.
//!
//! A provider turns bg text into ranked candidates. It runs off the store's
//! context (on the runtime's blocking pool), so implementations must be
//! `Send + Sync`. Errors are allowed but never fatal: the interpreter treats
//! any `Err` as "no candidates".

use crate::candidate::Candidate;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// Source of conversion/suggestion candidates.
pub trait CandidateProvider: Send + Sync + 'static {
    /// Return at most `limit` candidates for `text`, best first.
    fn suggest(&self, text: &str, limit: usize) -> anyhow::Result<Vec<Candidate>>;
}

impl<P: CandidateProvider + ?Sized> CandidateProvider for Arc<P> {
    fn suggest(&self, text: &str, limit: usize) -> anyhow::Result<Vec<Candidate>> {
        (**self).suggest(text, limit)
    }
}

impl<P: CandidateProvider + ?Sized> CandidateProvider for Box<P> {
    fn suggest(&self, text: &str, limit: usize) -> anyhow::Result<Vec<Candidate>> {
        (**self).suggest(text, limit)
    }
}

/// Provider that never returns anything. Useful for hosts that only want
/// preedit editing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCandidates;

impl CandidateProvider for NoCandidates {
    fn suggest(&self, _text: &str, _limit: usize) -> anyhow::Result<Vec<Candidate>> {
        Ok(Vec::new())
    }
}

/// Cache statistics of a [`CachedProvider`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub len: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheInner {
    entries: lru::LruCache<(String, usize), Vec<Candidate>>,
    hits: usize,
    misses: usize,
}

/// LRU cache in front of another provider, keyed by `(text, limit)`.
///
/// Failed lookups are not cached so a transient provider error does not pin
/// an empty result.
pub struct CachedProvider<P> {
    inner: P,
    cache: Mutex<CacheInner>,
}

impl<P: CandidateProvider> CachedProvider<P> {
    pub fn new(inner: P, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(CacheInner {
                entries: lru::LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn cache_stats(&self) -> CacheStats {
        let cache = self.lock();
        CacheStats {
            hits: cache.hits,
            misses: cache.misses,
            len: cache.entries.len(),
            capacity: cache.entries.cap().get(),
        }
    }

    /// Drop every cached entry and reset the counters.
    pub fn clear_cache(&self) {
        let mut cache = self.lock();
        cache.entries.clear();
        cache.hits = 0;
        cache.misses = 0;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        // A panic while holding the lock leaves the cache consistent, so keep
        // using it.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<P: CandidateProvider> CandidateProvider for CachedProvider<P> {
    fn suggest(&self, text: &str, limit: usize) -> anyhow::Result<Vec<Candidate>> {
        let key = (text.to_string(), limit);
        {
            let mut cache = self.lock();
            if let Some(hit) = cache.entries.get(&key).cloned() {
                cache.hits += 1;
                return Ok(hit);
            }
            cache.misses += 1;
        }

        // The lock is not held across the lookup; concurrent misses for the
        // same key both reach the inner provider.
        let candidates = self.inner.suggest(text, limit)?;
        self.lock().entries.put(key, candidates.clone());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CandidateProvider for Counting {
        fn suggest(&self, text: &str, limit: usize) -> anyhow::Result<Vec<Candidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("backend unavailable");
            }
            Ok(vec![Candidate::new(text); limit.min(2)])
        }
    }

    #[test]
    fn test_cache_hits_and_misses() {
        let provider = CachedProvider::new(
            Counting {
                calls: AtomicUsize::new(0),
                fail: false,
            },
            4,
        );
        provider.suggest("かな", 8).unwrap();
        provider.suggest("かな", 8).unwrap();
        provider.suggest("かな", 1).unwrap();

        let stats = provider.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.len, 2);
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cache_eviction() {
        let provider = CachedProvider::new(
            Counting {
                calls: AtomicUsize::new(0),
                fail: false,
            },
            2,
        );
        for text in ["a", "b", "c"] {
            provider.suggest(text, 8).unwrap();
        }
        assert_eq!(provider.cache_stats().len, 2);
        provider.suggest("a", 8).unwrap();
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let provider = CachedProvider::new(
            Counting {
                calls: AtomicUsize::new(0),
                fail: true,
            },
            4,
        );
        assert!(provider.suggest("a", 8).is_err());
        assert!(provider.suggest("a", 8).is_err());
        assert_eq!(provider.cache_stats().len, 0);
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clear_cache() {
        let provider = CachedProvider::new(NoCandidates, 0);
        provider.suggest("a", 8).unwrap();
        assert_eq!(provider.cache_stats().capacity, 1);
        provider.clear_cache();
        assert_eq!(provider.cache_stats(), CacheStats {
            hits: 0,
            misses: 0,
            len: 0,
            capacity: 1,
        });
    }
}
