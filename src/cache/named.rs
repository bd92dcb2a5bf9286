//! Named Cache Module
//!
//! One isolated store owned by the registry, guarded by its own mutex.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};

use crate::cache::stats::hit_rate;
use crate::cache::{CacheStats, CacheStore};
use crate::config::CacheConfig;

/// An isolated key/value store identified by name.
///
/// Every read-check-write sequence on the store (foreground reads and writes,
/// sweeps, evictions) runs inside one hold of `store`. Only the registry and
/// its background tasks get at the lock.
#[derive(Debug)]
pub struct NamedCache<V> {
    name: String,
    config: CacheConfig,
    created_at: DateTime<Utc>,
    store: Mutex<CacheStore<V>>,
}

impl<V: Clone> NamedCache<V> {
    pub fn new(name: impl Into<String>, config: CacheConfig) -> Self {
        Self {
            name: name.into(),
            config,
            created_at: Utc::now(),
            store: Mutex::new(CacheStore::new(config)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current number of entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    /// Returns true if `key` holds an unexpired entry, without counting a read.
    pub fn contains(&self, key: &str) -> bool {
        self.store.lock().contains(key)
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let store = self.store.lock();
        CacheStats {
            name: self.name.clone(),
            size: store.len(),
            max_size: self.config.max_size(),
            hits: store.hits(),
            misses: store.misses(),
            hit_rate: hit_rate(store.hits(), store.misses()),
            evictions: store.evictions(),
            expirations: store.expirations(),
            ttl_millis: self.config.ttl_millis(),
            created_at: self.created_at,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, CacheStore<V>> {
        self.store.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cache_is_empty() {
        let cache: NamedCache<String> =
            NamedCache::new("permissions", CacheConfig::for_name("permissions"));

        assert_eq!(cache.name(), "permissions");
        assert!(cache.is_empty());

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.max_size, 200);
        assert_eq!(stats.ttl_millis, 300_000);
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.created_at, cache.created_at());
    }

    #[test]
    fn test_stats_follow_store() {
        let cache = NamedCache::new("userData", CacheConfig::for_name("userData"));

        cache.lock().set("u1".to_string(), 1u32, None);
        cache.lock().get("u1");
        cache.lock().get("u2");
        cache.lock().get("u2");

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert!((stats.hit_rate - 1.0 / 3.0).abs() < f64::EPSILON);
        assert!(cache.contains("u1"));
    }
}
