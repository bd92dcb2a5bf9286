//! TTL Cleanup Tasks
//!
//! Background tasks that periodically remove expired cache entries and keep
//! cache occupancy below its ceiling.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::{snapshot, CacheMap, NamedCache};

/// Sweep interval of a cache: its TTL, capped at `cap`.
pub fn sweep_interval(ttl: Duration, cap: Duration) -> Duration {
    ttl.min(cap)
}

/// Spawns the sweeper of one named cache.
///
/// The task runs in an infinite loop, sleeping for `interval` between runs
/// and removing every expired entry under the cache lock.
///
/// # Returns
/// A JoinHandle for the spawned task, aborted when the registry is destroyed.
pub fn spawn_cache_sweeper<V>(
    runtime: &Handle,
    cache: Arc<NamedCache<V>>,
    interval: Duration,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    runtime.spawn(async move {
        debug!(
            "Starting sweeper for cache '{}' with interval of {}ms",
            cache.name(),
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.lock().sweep_expired(Instant::now());

            if removed > 0 {
                info!(
                    "TTL cleanup: removed {} expired entries from '{}'",
                    removed,
                    cache.name()
                );
            } else {
                debug!("TTL cleanup: no expired entries in '{}'", cache.name());
            }
        }
    })
}

// == Global Maintenance ==
/// Outcome of one cross-cache maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Entries removed because their TTL elapsed
    pub expired: usize,
    /// Entries evicted from high-occupancy caches
    pub evicted: usize,
}

/// Sweeps every cache, then trims the oldest 20% of any cache above 80% occupancy.
pub fn run_global_maintenance<V: Clone>(caches: &[Arc<NamedCache<V>>]) -> MaintenanceReport {
    let now = Instant::now();
    let mut report = MaintenanceReport::default();

    for cache in caches {
        let mut store = cache.lock();
        report.expired += store.sweep_expired(now);

        let evicted = store.trim_high_occupancy();
        if evicted > 0 {
            debug!(
                "Global maintenance: evicted {} oldest entries from '{}'",
                evicted,
                cache.name()
            );
        }
        report.evicted += evicted;
    }

    report
}

/// Spawns the global maintenance task over every cache of a registry.
pub fn spawn_global_maintenance<V>(
    runtime: &Handle,
    caches: Arc<CacheMap<V>>,
    interval: Duration,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    runtime.spawn(async move {
        info!(
            "Starting global cache maintenance with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let report = run_global_maintenance(&snapshot(&caches));

            if report.expired > 0 || report.evicted > 0 {
                info!(
                    "Global maintenance: removed {} expired and evicted {} entries",
                    report.expired, report.evicted
                );
            } else {
                debug!("Global maintenance: nothing to remove");
            }
        }
    })
}
