//! Cache Statistics Module
//!
//! Per-cache and registry-wide statistics records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Point-in-time statistics of one named cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Cache name
    pub name: String,
    /// Current number of entries
    pub size: usize,
    /// Capacity ceiling
    pub max_size: usize,
    /// Reads served from the cache
    pub hits: u64,
    /// Reads that found nothing usable
    pub misses: u64,
    /// hits / (hits + misses), 0.0 before the first read
    pub hit_rate: f64,
    /// Entries removed by capacity or memory-pressure eviction
    pub evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expirations: u64,
    /// Configured TTL in milliseconds
    pub ttl_millis: u64,
    /// When the cache was created
    pub created_at: DateTime<Utc>,
}

// == Registry Stats ==
/// Statistics of every cache plus aggregated totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryStats {
    /// Per-cache statistics keyed by name
    pub caches: BTreeMap<String, CacheStats>,
    pub cache_count: usize,
    pub total_size: usize,
    pub total_hits: u64,
    pub total_misses: u64,
    /// total_hits / (total_hits + total_misses)
    pub global_hit_rate: f64,
}

impl RegistryStats {
    /// Aggregates per-cache statistics.
    pub fn from_caches(caches: impl IntoIterator<Item = CacheStats>) -> Self {
        let caches: BTreeMap<String, CacheStats> = caches
            .into_iter()
            .map(|stats| (stats.name.clone(), stats))
            .collect();

        let total_size = caches.values().map(|s| s.size).sum();
        let total_hits = caches.values().map(|s| s.hits).sum();
        let total_misses = caches.values().map(|s| s.misses).sum();

        Self {
            cache_count: caches.len(),
            caches,
            total_size,
            total_hits,
            total_misses,
            global_hit_rate: hit_rate(total_hits, total_misses),
        }
    }
}

// == Stats Report ==
/// Answer to a stats query: one cache, or the whole registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatsReport {
    Cache(CacheStats),
    Registry(RegistryStats),
}

// == Hit Rate ==
/// Calculates the cache hit rate.
///
/// Returns hits / (hits + misses), or 0.0 if no requests have been made.
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
