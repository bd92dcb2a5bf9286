//! Cache Store Module
//!
//! Storage engine of one named cache: HashMap entries, write-order tracking,
//! TTL expiry and the oldest-first eviction passes.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{CacheEntry, WriteOrder};
use crate::config::CacheConfig;

// == Eviction Tuning ==
/// Share of `max_size` evicted by the insert-time capacity guard.
pub const CAPACITY_GUARD_PERCENT: usize = 10;

/// Occupancy above which the global maintenance pass trims a cache.
pub const HIGH_OCCUPANCY_PERCENT: usize = 80;

/// Share of current entries trimmed from a high-occupancy cache.
pub const HIGH_OCCUPANCY_EVICT_PERCENT: usize = 20;

/// Occupancy a cache is shrunk to under memory pressure.
pub const PRESSURE_TARGET_PERCENT: usize = 50;

// == Cache Store ==
/// Storage for a single named cache.
///
/// Eviction is strictly oldest-write-first. Hit counts are tracked per entry
/// but never influence which entries go.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Keys from oldest to newest write
    order: WriteOrder,
    /// TTL and capacity policy
    config: CacheConfig,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            order: WriteOrder::new(),
            config,
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    // == Set ==
    /// Stores a value under `key`, replacing any previous entry.
    ///
    /// When occupancy is at or above `max_size`, the oldest
    /// `ceil(max_size * 10%)` entries are evicted before the insert.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL override (uses the configured TTL if None)
    ///
    /// # Returns
    /// The number of entries evicted by the capacity guard.
    pub fn set(&mut self, key: String, value: V, ttl: Option<Duration>) -> usize {
        let entry = CacheEntry::new(value, ttl.unwrap_or(self.config.ttl()));

        let evicted = if self.entries.len() >= self.config.max_size() {
            self.evict_oldest(percent_ceil(self.config.max_size(), CAPACITY_GUARD_PERCENT))
        } else {
            0
        };

        self.order.record_write(&key);
        self.entries.insert(key, entry);

        evicted
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Every call counts as exactly one hit or one miss. An expired entry is
    /// removed on the spot and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = Instant::now();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.misses += 1;
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.expirations += 1;
            self.misses += 1;
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.record_hit();
        self.hits += 1;
        Some(entry.value.clone())
    }

    // == Remove ==
    /// Removes an entry by key. Returns false if the key was not present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.remove_entry(key)
    }

    // == Clear ==
    /// Drops every entry, keeping the counters. Returns the number removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.order.clear();
        removed
    }

    // == Sweep Expired ==
    /// Removes all entries expired at `now`.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let removed = before - self.entries.len();
        if removed > 0 {
            let entries = &self.entries;
            self.order.retain(|key| entries.contains_key(key));
            self.expirations += removed as u64;
        }
        removed
    }

    // == Evict Oldest ==
    /// Evicts up to `count` entries with the oldest write time.
    ///
    /// Returns the number of entries evicted.
    pub fn evict_oldest(&mut self, count: usize) -> usize {
        let mut evicted = 0;
        while evicted < count {
            let Some(key) = self.order.pop_oldest() else {
                break;
            };
            if self.entries.remove(&key).is_some() {
                evicted += 1;
            }
        }
        self.evictions += evicted as u64;
        evicted
    }

    // == Trim High Occupancy ==
    /// Evicts the oldest 20% of entries when occupancy exceeds 80% of `max_size`.
    pub fn trim_high_occupancy(&mut self) -> usize {
        let len = self.entries.len();
        if len * 100 > self.config.max_size() * HIGH_OCCUPANCY_PERCENT {
            self.evict_oldest(percent_ceil(len, HIGH_OCCUPANCY_EVICT_PERCENT))
        } else {
            0
        }
    }

    // == Shrink Under Pressure ==
    /// Evicts the oldest entries until occupancy is down to 50% of `max_size`.
    ///
    /// Caches already at or below that mark are left alone.
    pub fn shrink_to_pressure_target(&mut self) -> usize {
        let target = self.config.max_size() * PRESSURE_TARGET_PERCENT / 100;
        let len = self.entries.len();
        if len > target {
            self.evict_oldest(len - target)
        } else {
            0
        }
    }

    /// Returns true if `key` holds an unexpired entry, without counting a read.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Returns the hit count of the entry under `key`, without counting a read.
    pub fn entry_hits(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.hit_count)
    }

    /// Keys from oldest to newest write.
    pub fn keys_oldest_first(&self) -> Vec<String> {
        self.order.iter().map(str::to_string).collect()
    }

    // == Accessors ==
    pub fn config(&self) -> CacheConfig {
        self.config
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn expirations(&self) -> u64 {
        self.expirations
    }

    /// Returns the current number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.remove(key);
            true
        } else {
            false
        }
    }
}

/// `ceil(n * percent / 100)` in integer arithmetic.
fn percent_ceil(n: usize, percent: usize) -> usize {
    (n * percent).div_ceil(100)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn store(ttl_secs: u64, max_size: usize) -> CacheStore<String> {
        CacheStore::new(CacheConfig::new(Duration::from_secs(ttl_secs), max_size).unwrap())
    }

    fn fill(store: &mut CacheStore<String>, count: usize) {
        for i in 0..count {
            store.set(format!("key{}", i), format!("value{}", i), None);
        }
    }

    #[test]
    fn test_store_new() {
        let store = store(300, 100);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = store(300, 100);

        store.set("key1".to_string(), "value1".to_string(), None);
        let value = store.get("key1");

        assert_eq!(value.as_deref(), Some("value1"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.entry_hits("key1"), Some(1));
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = store(300, 100);

        assert!(store.get("nonexistent").is_none());
        assert_eq!(store.misses(), 1);
        assert_eq!(store.hits(), 0);
    }

    #[test]
    fn test_store_remove() {
        let mut store = store(300, 100);

        store.set("key1".to_string(), "value1".to_string(), None);
        assert!(store.remove("key1"));
        assert!(!store.remove("key1"));

        assert!(store.is_empty());
        assert!(store.get("key1").is_none());
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = store(300, 100);

        store.set("key1".to_string(), "value1".to_string(), None);
        store.set("key1".to_string(), "value2".to_string(), None);

        assert_eq!(store.get("key1").as_deref(), Some("value2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_overwrite_refreshes_write_order() {
        let mut store = store(300, 100);
        fill(&mut store, 3);

        store.set("key0".to_string(), "fresh".to_string(), None);

        assert_eq!(store.keys_oldest_first(), vec!["key1", "key2", "key0"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_ttl_expiration() {
        let mut store = store(300, 100);

        store.set("key1".to_string(), "value1".to_string(), Some(Duration::from_secs(1)));
        assert!(store.get("key1").is_some());

        tokio::time::advance(Duration::from_millis(1100)).await;

        // Lazy expiry removes the entry on read
        assert!(store.get("key1").is_none());
        assert_eq!(store.len(), 0);
        assert_eq!(store.expirations(), 1);
        assert_eq!(store.hits(), 1);
        assert_eq!(store.misses(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_default_ttl_applies() {
        let mut store = store(5, 100);
        store.set("key1".to_string(), "value1".to_string(), None);

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(store.contains("key1"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!store.contains("key1"));
    }

    #[test]
    fn test_capacity_guard_evicts_ten_percent() {
        let mut store = store(300, 100);
        fill(&mut store, 100);
        assert_eq!(store.len(), 100);

        let evicted = store.set("new".to_string(), "value".to_string(), None);

        assert_eq!(evicted, 10);
        assert_eq!(store.len(), 91);
        for i in 0..10 {
            assert!(!store.contains(&format!("key{}", i)));
        }
        assert!(store.contains("key10"));
        assert_eq!(store.evictions(), 10);
    }

    #[test]
    fn test_capacity_guard_rounds_up() {
        let mut store = store(300, 5);
        fill(&mut store, 5);

        // ceil(5 * 0.1) = 1
        assert_eq!(store.set("new".to_string(), "value".to_string(), None), 1);
        assert_eq!(store.len(), 5);
        assert!(!store.contains("key0"));
    }

    #[test]
    fn test_capacity_guard_runs_on_overwrite_at_capacity() {
        let mut store = store(300, 10);
        fill(&mut store, 10);

        let evicted = store.set("key5".to_string(), "again".to_string(), None);

        assert_eq!(evicted, 1);
        assert!(!store.contains("key0"));
        assert_eq!(store.len(), 9);
        assert_eq!(store.keys_oldest_first().last().map(String::as_str), Some("key5"));
    }

    #[test]
    fn test_huge_ttl_at_capacity_is_stored() {
        let mut store = store(300, 10);
        fill(&mut store, 10);

        let evicted = store.set("big".to_string(), "forever".to_string(), Some(Duration::MAX));

        assert_eq!(evicted, 1);
        assert_eq!(store.len(), 10);
        assert_eq!(store.get("big").as_deref(), Some("forever"));
    }

    #[test]
    fn test_hits_do_not_protect_from_eviction() {
        let mut store = store(300, 3);
        fill(&mut store, 3);

        for _ in 0..5 {
            store.get("key0");
        }
        store.set("key3".to_string(), "value3".to_string(), None);

        assert!(!store.contains("key0"));
        assert!(store.contains("key1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_expired() {
        let mut store = store(300, 100);

        store.set("key1".to_string(), "value1".to_string(), Some(Duration::from_secs(1)));
        store.set("key2".to_string(), "value2".to_string(), Some(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_millis(1100)).await;

        let removed = store.sweep_expired(Instant::now());
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.keys_oldest_first(), vec!["key2"]);
        assert!(store.get("key2").is_some());
    }

    #[test]
    fn test_trim_high_occupancy() {
        let mut store = store(300, 100);
        fill(&mut store, 80);

        // Exactly 80% is not above the threshold
        assert_eq!(store.trim_high_occupancy(), 0);

        store.set("key80".to_string(), "value".to_string(), None);
        let evicted = store.trim_high_occupancy();

        // ceil(81 * 0.2) = 17
        assert_eq!(evicted, 17);
        assert_eq!(store.len(), 64);
        assert!(!store.contains("key16"));
        assert!(store.contains("key17"));
    }

    #[test]
    fn test_shrink_to_pressure_target() {
        let mut store = store(300, 200);
        fill(&mut store, 180);

        assert_eq!(store.shrink_to_pressure_target(), 80);
        assert_eq!(store.len(), 100);
        assert!(!store.contains("key79"));
        assert!(store.contains("key80"));
        assert!(store.contains("key179"));

        // Already at target
        assert_eq!(store.shrink_to_pressure_target(), 0);
    }

    #[test]
    fn test_clear_keeps_counters() {
        let mut store = store(300, 100);
        fill(&mut store, 3);
        store.get("key0");

        assert_eq!(store.clear(), 3);
        assert!(store.is_empty());
        assert_eq!(store.hits(), 1);
        assert!(store.keys_oldest_first().is_empty());
    }

    #[test]
    fn test_percent_ceil() {
        assert_eq!(percent_ceil(100, 10), 10);
        assert_eq!(percent_ceil(300, 10), 30);
        assert_eq!(percent_ceil(5, 10), 1);
        assert_eq!(percent_ceil(81, 20), 17);
        assert_eq!(percent_ceil(0, 20), 0);
    }
}
