//! Retrieval cache: LRU + TTL over query fingerprints. Fingerprinting uses a
//! `DefaultHasher` over a canonical sorted-key representation rather than an
//! external hash crate.

use crate::config::RetrievalConfig;
use crate::fragment::RetrievalResult;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::Instant;
use tracing::warn;

#[derive(Clone)]
struct Entry {
    results: Vec<RetrievalResult>,
    inserted_at: Instant,
}

/// Hit/miss/eviction counters.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

struct Inner {
    entries: HashMap<String, Entry>,
    order: VecDeque<String>,
    stats: CacheStats,
}

/// Bounded LRU cache of retrieval results keyed by a fingerprint of
/// (query, filters, k). `clean_expired`/selective `invalidate` both simply
/// drop the whole cache and log a warning rather than doing partial
/// invalidation.
pub struct RetrievalCache {
    inner: Mutex<Inner>,
    config: RetrievalConfig,
}

impl RetrievalCache {
    pub fn new(config: RetrievalConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                stats: CacheStats::default(),
            }),
            config,
        }
    }

    /// Fingerprint a query against its filters and k, using a canonical
    /// sorted-key JSON representation so filter key order never changes the
    /// key.
    pub fn fingerprint(query: &str, filters: &[(String, String)], k: usize) -> String {
        let mut sorted_filters = filters.to_vec();
        sorted_filters.sort_by(|a, b| a.0.cmp(&b.0));

        let mut hasher = DefaultHasher::new();
        query.hash(&mut hasher);
        k.hash(&mut hasher);
        for (key, value) in &sorted_filters {
            key.hash(&mut hasher);
            value.hash(&mut hasher);
        }
        format!("{:x}", hasher.finish())
    }

    pub fn get(&self, key: &str) -> Option<Vec<RetrievalResult>> {
        if !self.config.cache_enabled {
            return None;
        }
        let mut inner = self.inner.lock().expect("cache mutex poisoned");

        let expired = match inner.entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed().as_secs() > self.config.cache_ttl_secs,
            None => {
                inner.stats.misses += 1;
                return None;
            }
        };

        if expired {
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
            inner.stats.evictions += 1;
            inner.stats.misses += 1;
            return None;
        }

        inner.order.retain(|k| k != key);
        inner.order.push_back(key.to_string());
        inner.stats.hits += 1;
        inner.entries.get(key).map(|e| e.results.clone())
    }

    pub fn put(&self, key: String, results: Vec<RetrievalResult>) {
        if !self.config.cache_enabled {
            return;
        }
        let mut inner = self.inner.lock().expect("cache mutex poisoned");

        if inner.entries.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        } else if inner.entries.len() >= self.config.cache_size {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
                inner.stats.evictions += 1;
            }
        }

        inner.entries.insert(
            key.clone(),
            Entry {
                results,
                inserted_at: Instant::now(),
            },
        );
        inner.order.push_back(key);
        inner.stats.size = inner.entries.len();
    }

    /// Full cache clear. Selective invalidation by query/filters is not
    /// implemented.
    pub fn invalidate(&self) {
        warn!("invalidate() clears the entire retrieval cache; selective invalidation is not implemented");
        self.clear();
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.entries.clear();
        inner.order.clear();
        inner.stats.size = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache mutex poisoned");
        let mut stats = inner.stats.clone();
        stats.size = inner.entries.len();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;

    fn result(id: &str) -> RetrievalResult {
        RetrievalResult {
            fragment: Fragment::new(id, "d1", "text"),
            score: 1.0,
            rank: 0,
        }
    }

    fn config(size: usize, ttl_secs: u64) -> RetrievalConfig {
        let mut c = RetrievalConfig::default();
        c.cache_size = size;
        c.cache_ttl_secs = ttl_secs;
        c
    }

    #[test]
    fn fingerprint_is_stable_under_filter_permutation() {
        let a = RetrievalCache::fingerprint("q", &[("b".into(), "2".into()), ("a".into(), "1".into())], 5);
        let b = RetrievalCache::fingerprint("q", &[("a".into(), "1".into()), ("b".into(), "2".into())], 5);
        assert_eq!(a, b);
    }

    #[test]
    fn hit_then_miss_are_counted() {
        let cache = RetrievalCache::new(config(10, 3600));
        let key = RetrievalCache::fingerprint("q", &[], 5);
        cache.put(key.clone(), vec![result("d1_chunk_0")]);
        assert!(cache.get(&key).is_some());
        assert!(cache.get("missing").is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn evicts_oldest_entry_when_over_capacity() {
        let cache = RetrievalCache::new(config(2, 3600));
        cache.put("a".into(), vec![result("x")]);
        cache.put("b".into(), vec![result("y")]);
        cache.put("c".into(), vec![result("z")]);

        assert!(cache.get("a").is_none());
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.stats().size, 2);
    }

    #[test]
    fn expired_entry_counts_as_an_eviction_and_miss() {
        let cache = RetrievalCache::new(config(10, 0));
        cache.put("a".into(), vec![result("x")]);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(cache.get("a").is_none());
        let stats = cache.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.misses, 1);
    }
}
