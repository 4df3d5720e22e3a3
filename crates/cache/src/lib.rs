//! # Skilldex Cache
//!
//! Capacity-bounded LRU key/value store used to memoize ranked result
//! lists per `(category, query)` tuple. A thin, typed wrapper over the
//! `lru` crate: construction validates capacity once, after which no
//! operation can fail.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity must be at least 1; raised at construction time only.
    #[error("invalid cache capacity: {0} (must be >= 1)")]
    InvalidCapacity(usize),
}

/// LRU cache with a fixed capacity decided at construction.
///
/// `get` refreshes recency; `put` inserts or refreshes and evicts the
/// least-recently-used entry when full. Eviction order is deterministic
/// and the cache never grows past its capacity.
#[derive(Debug)]
pub struct CacheLayer<K: Hash + Eq, V> {
    inner: LruCache<K, V>,
}

impl<K: Hash + Eq, V> CacheLayer<K, V> {
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or(CacheError::InvalidCapacity(capacity))?;
        Ok(Self {
            inner: LruCache::new(capacity),
        })
    }

    /// Look up a key, marking it most-recently-used on hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    /// Insert or refresh a key. Returns the value evicted to make room,
    /// if any (the previous value on refresh, the LRU entry on overflow).
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        match self.inner.push(key, value) {
            Some((_, evicted)) => {
                log::trace!("cache at capacity {}, evicted one entry", self.capacity());
                Some(evicted)
            }
            None => None,
        }
    }

    /// Remove one key. Other entries keep their recency order.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.inner.pop(key)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    /// Remove every key matching the predicate, leaving the rest in place.
    /// Used for targeted invalidation (e.g. one dynamic category changed)
    /// instead of a wholesale clear. O(n) over cached keys.
    pub fn invalidate_where(&mut self, mut predicate: impl FnMut(&K) -> bool) -> usize
    where
        K: Clone,
    {
        let doomed: Vec<K> = self
            .inner
            .iter()
            .filter(|(k, _)| predicate(k))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            self.inner.pop(key);
        }
        if !doomed.is_empty() {
            log::debug!("invalidated {} cache entries", doomed.len());
        }
        doomed.len()
    }
}
