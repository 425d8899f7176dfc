//! In-process LRU cache with per-entry TTL, the first cache tier.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;

/// One cached value plus its insertion time and TTL.
#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> Entry<T> {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// Count-bound LRU with lazy TTL expiry: an expired entry is treated as a
/// miss on access and evicted at that point, rather than swept proactively.
pub struct L1Cache<T> {
    inner: LruCache<String, Entry<T>>,
    default_ttl: Duration,
}

impl<T: Clone> L1Cache<T> {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self { inner: LruCache::new(capacity), default_ttl }
    }

    pub fn get(&mut self, key: &str) -> Option<T> {
        let expired = self.inner.peek(key).is_some_and(Entry::is_expired);
        if expired {
            self.inner.pop(key);
            return None;
        }
        self.inner.get(key).map(|e| e.value.clone())
    }

    pub fn put(&mut self, key: String, value: T) {
        self.put_with_ttl(key, value, self.default_ttl);
    }

    pub fn put_with_ttl(&mut self, key: String, value: T, ttl: Duration) {
        self.inner.put(key, Entry { value, inserted_at: Instant::now(), ttl });
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
