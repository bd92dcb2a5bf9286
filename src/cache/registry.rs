//! Cache Registry Module
//!
//! Owns every named cache, creates them lazily by name and exposes the
//! read/write/invalidate/stats surface used by the rest of the application.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, NamedCache, RegistryStats, StatsReport};
use crate::config::RegistryConfig;
use crate::tasks::{
    check_memory_pressure, relieve_memory_pressure, run_global_maintenance, spawn_cache_sweeper,
    spawn_global_maintenance, spawn_memory_monitor, sweep_interval, MaintenanceReport,
    MemoryProbe, PressureCheck, SystemMemoryProbe, TaskSet,
};

/// Named caches of a registry, shared with its background tasks.
pub type CacheMap<V> = RwLock<HashMap<String, Arc<NamedCache<V>>>>;

/// Clones the current set of caches out of the map so passes can lock each
/// cache without holding the map lock.
pub fn snapshot<V>(caches: &CacheMap<V>) -> Vec<Arc<NamedCache<V>>> {
    caches.read().values().cloned().collect()
}

// == Cache Registry ==
/// Process-wide registry of named caches.
///
/// Construct one at the composition root and share it by reference
/// (typically behind an `Arc`). Background maintenance runs on the tokio
/// runtime current at construction; without one the registry still works but
/// nothing is swept in the background.
///
/// Concurrent `get_or_set` misses on the same key are not coalesced: each
/// caller runs its own producer and the last write wins.
///
/// ## Example
///
/// ```rust,ignore
/// let registry = Arc::new(CacheRegistry::new(RegistryConfig::from_env()));
///
/// let perms = registry
///     .get_or_set("permissions", "u1", || fetch_permissions("u1"), None)
///     .await?;
///
/// registry.invalidate("permissions", Some("u1"));
/// ```
pub struct CacheRegistry<V = serde_json::Value> {
    caches: Arc<CacheMap<V>>,
    config: RegistryConfig,
    probe: Arc<dyn MemoryProbe>,
    runtime: Option<Handle>,
    tasks: Mutex<TaskSet>,
}

impl<V> CacheRegistry<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a registry sampling host memory through [`SystemMemoryProbe`].
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_probe(config, Arc::new(SystemMemoryProbe::new()))
    }

    /// Creates a registry with a custom memory probe.
    pub fn with_probe(config: RegistryConfig, probe: Arc<dyn MemoryProbe>) -> Self {
        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            warn!("No tokio runtime available; background cache maintenance disabled");
        }

        let registry = Self {
            caches: Arc::new(RwLock::new(HashMap::new())),
            config,
            probe,
            runtime,
            tasks: Mutex::new(TaskSet::default()),
        };

        registry.start_maintenance();
        info!("Cache registry initialized");
        registry
    }

    // == Cache Resolution ==
    /// Returns the cache for `name`, creating it with its profile on first use.
    ///
    /// Creating a cache also starts its sweeper. Idempotent per name.
    pub fn get_or_create_cache(&self, name: &str) -> Arc<NamedCache<V>> {
        if let Some(cache) = self.caches.read().get(name) {
            return Arc::clone(cache);
        }

        let mut caches = self.caches.write();
        // Another caller may have created it between the two locks
        if let Some(cache) = caches.get(name) {
            return Arc::clone(cache);
        }

        let config = self.config.profile_for(name);
        let cache = Arc::new(NamedCache::new(name, config));
        caches.insert(name.to_string(), Arc::clone(&cache));

        // Still under the map lock so `destroy` cannot slip in between
        if let Some(runtime) = &self.runtime {
            let interval = sweep_interval(config.ttl(), self.config.sweep_interval_cap);
            let handle = spawn_cache_sweeper(runtime, Arc::clone(&cache), interval);
            self.tasks.lock().add_sweeper(name, handle);
        }

        info!(
            "Created cache '{}' (ttl={}ms, max_size={})",
            name,
            config.ttl_millis(),
            config.max_size()
        );
        cache
    }

    /// Returns true if a cache named `name` currently exists.
    pub fn contains(&self, name: &str) -> bool {
        self.caches.read().contains_key(name)
    }

    /// Names of all existing caches, sorted.
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort();
        names
    }

    // == Set ==
    /// Stores `value` under `key` and returns it.
    ///
    /// The entry expires after `ttl`, or after the cache's configured TTL when
    /// None. A full cache first evicts its oldest 10%.
    pub fn set(
        &self,
        cache_name: &str,
        key: impl Into<String>,
        value: V,
        ttl: Option<Duration>,
    ) -> V {
        let cache = self.get_or_create_cache(cache_name);
        let evicted = cache.lock().set(key.into(), value.clone(), ttl);

        if evicted > 0 {
            debug!(
                "Capacity guard evicted {} entries from '{}'",
                evicted, cache_name
            );
        }
        value
    }

    // == Get ==
    /// Returns the live value under `key`, or None on a miss.
    ///
    /// Expired entries found here are removed immediately.
    pub fn get(&self, cache_name: &str, key: &str) -> Option<V> {
        self.get_or_create_cache(cache_name).lock().get(key)
    }

    // == Get Or Set ==
    /// Read-through lookup.
    ///
    /// Returns the cached value on a hit. On a miss, awaits `compute` and
    /// stores its output. A failing `compute` hands its error straight back
    /// and nothing is cached. The cache lock is not held while `compute` runs,
    /// so overlapping misses on one key each run their own `compute`.
    pub async fn get_or_set<F, Fut, E>(
        &self,
        cache_name: &str,
        key: &str,
        compute: F,
        ttl: Option<Duration>,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(cache_name, key) {
            return Ok(value);
        }

        let value = compute().await?;
        Ok(self.set(cache_name, key, value, ttl))
    }

    // == Invalidate ==
    /// Removes `key` from the cache, or clears the whole cache when `key` is None.
    ///
    /// Unknown caches and keys are ignored.
    pub fn invalidate(&self, cache_name: &str, key: Option<&str>) {
        let Some(cache) = self.caches.read().get(cache_name).cloned() else {
            return;
        };

        match key {
            Some(key) => {
                if cache.lock().remove(key) {
                    debug!("Invalidated '{}' in cache '{}'", key, cache_name);
                }
            }
            None => {
                let removed = cache.lock().clear();
                debug!("Cleared {} entries from cache '{}'", removed, cache_name);
            }
        }
    }

    // == Stats ==
    /// Stats of one cache, or of the whole registry when `cache_name` is None.
    pub fn get_stats(&self, cache_name: Option<&str>) -> StatsReport {
        match cache_name {
            Some(name) => StatsReport::Cache(self.cache_stats(name)),
            None => StatsReport::Registry(self.registry_stats()),
        }
    }

    /// Stats of one cache. An unknown name is created and reports zeros.
    pub fn cache_stats(&self, cache_name: &str) -> CacheStats {
        self.get_or_create_cache(cache_name).stats()
    }

    /// Stats of one cache without creating it.
    ///
    /// A cache that does not exist yet but has a configured profile reports
    /// zeros. Any other missing name gives None.
    pub fn peek_stats(&self, cache_name: &str) -> Option<CacheStats> {
        let existing = self.caches.read().get(cache_name).cloned();
        if let Some(cache) = existing {
            return Some(cache.stats());
        }

        let config = self.config.profiles.get(cache_name).copied()?;
        Some(NamedCache::<V>::new(cache_name, config).stats())
    }

    /// Stats of every cache plus aggregated totals.
    pub fn registry_stats(&self) -> RegistryStats {
        RegistryStats::from_caches(snapshot(&self.caches).iter().map(|cache| cache.stats()))
    }

    // == Maintenance ==
    /// Starts the global maintenance and memory monitor tasks.
    ///
    /// Called by the constructors; call again to re-arm them after
    /// [`destroy`](Self::destroy). No-op while they are running or when no
    /// runtime is available.
    pub fn start_maintenance(&self) {
        let Some(runtime) = &self.runtime else {
            return;
        };

        let mut tasks = self.tasks.lock();
        if tasks.maintenance_running() {
            return;
        }

        let global = spawn_global_maintenance(
            runtime,
            Arc::clone(&self.caches),
            self.config.global_sweep_interval,
        );
        let memory = spawn_memory_monitor(
            runtime,
            Arc::clone(&self.caches),
            Arc::clone(&self.probe),
            self.config.memory_check_interval,
            self.config.memory_high_water,
        );
        tasks.set_maintenance(global, memory);
    }

    /// Runs one global maintenance pass now.
    pub fn run_global_maintenance(&self) -> MaintenanceReport {
        run_global_maintenance(&snapshot(&self.caches))
    }

    /// Runs the memory pressure pass now, regardless of memory usage.
    ///
    /// Returns the number of entries evicted.
    pub fn run_memory_pressure_pass(&self) -> usize {
        let evicted = relieve_memory_pressure(&snapshot(&self.caches));
        if evicted > 0 {
            warn!("Memory pressure pass evicted {} cache entries", evicted);
        }
        evicted
    }

    /// Samples the memory probe and runs the pressure pass if usage is high.
    pub fn check_memory_pressure(&self) -> PressureCheck {
        check_memory_pressure(
            &snapshot(&self.caches),
            self.probe.as_ref(),
            self.config.memory_high_water,
        )
    }

    /// Number of background tasks still running.
    pub fn active_tasks(&self) -> usize {
        self.tasks.lock().active()
    }

    // == Destroy ==
    /// Stops every background task and drops all caches.
    ///
    /// The registry stays usable: later calls recreate caches on demand, each
    /// with a fresh sweeper. Global maintenance stays off until
    /// [`start_maintenance`](Self::start_maintenance). Producers already
    /// running inside `get_or_set` are not cancelled.
    pub fn destroy(&self) {
        let mut caches = self.caches.write();
        let stopped = self.tasks.lock().abort_all();

        for cache in caches.values() {
            cache.lock().clear();
        }
        let dropped = caches.len();
        caches.clear();

        info!(
            "Cache registry destroyed: stopped {} tasks, dropped {} caches",
            stopped, dropped
        );
    }
}

impl<V> Drop for CacheRegistry<V> {
    fn drop(&mut self) {
        self.tasks.lock().abort_all();
    }
}

impl<V> std::fmt::Debug for CacheRegistry<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let caches = self.caches.read();
        f.debug_struct("CacheRegistry")
            .field("cache_count", &caches.len())
            .field("cache_names", &caches.keys().collect::<Vec<_>>())
            .field("background", &self.runtime.is_some())
            .finish()
    }
}
