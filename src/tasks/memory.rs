//! Memory Pressure Monitor
//!
//! Samples host memory and sheds cache entries registry-wide when usage
//! crosses the high-water mark.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{snapshot, CacheMap, NamedCache};

// == Memory Stats ==
/// One memory sample: bytes in use and the limit they count against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    pub used_bytes: u64,
    pub limit_bytes: u64,
}

impl MemoryStats {
    /// `used / limit`, or None when the limit is unknown.
    pub fn used_ratio(&self) -> Option<f64> {
        if self.limit_bytes == 0 {
            None
        } else {
            Some(self.used_bytes as f64 / self.limit_bytes as f64)
        }
    }
}

// == Memory Probe ==
/// Source of memory samples.
///
/// Returning None means the host offers no introspection; the monitor then
/// does nothing.
pub trait MemoryProbe: Send + Sync {
    fn sample(&self) -> Option<MemoryStats>;
}

/// Probe for hosts without memory introspection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMemoryProbe;

impl MemoryProbe for NoMemoryProbe {
    fn sample(&self) -> Option<MemoryStats> {
        None
    }
}

/// Probe backed by the operating system.
///
/// Reports the resident memory of this process against its cgroup memory
/// limit, or against total host memory outside a cgroup. Other processes on
/// the host do not count towards the ratio. Without the `system-memory`
/// feature it never yields a sample.
pub struct SystemMemoryProbe {
    #[cfg(feature = "system-memory")]
    system: parking_lot::Mutex<sysinfo::System>,
}

impl SystemMemoryProbe {
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "system-memory")]
            system: parking_lot::Mutex::new(sysinfo::System::new()),
        }
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SystemMemoryProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemMemoryProbe")
            .field("enabled", &cfg!(feature = "system-memory"))
            .finish()
    }
}

impl MemoryProbe for SystemMemoryProbe {
    #[cfg(feature = "system-memory")]
    fn sample(&self) -> Option<MemoryStats> {
        use sysinfo::{ProcessRefreshKind, ProcessesToUpdate};

        let pid = sysinfo::get_current_pid().ok()?;
        let mut system = self.system.lock();
        system.refresh_memory();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::new().with_memory(),
        );

        let used_bytes = system.process(pid)?.memory();
        let limit_bytes = match system.cgroup_limits() {
            Some(limits) if limits.total_memory > 0 => limits.total_memory,
            _ => system.total_memory(),
        };

        (limit_bytes > 0).then_some(MemoryStats {
            used_bytes,
            limit_bytes,
        })
    }

    #[cfg(not(feature = "system-memory"))]
    fn sample(&self) -> Option<MemoryStats> {
        None
    }
}

// == Pressure Pass ==
/// Shrinks every cache above 50% occupancy down to exactly 50% of its ceiling,
/// keeping the most recently written entries.
///
/// Returns the total number of entries evicted.
pub fn relieve_memory_pressure<V: Clone>(caches: &[Arc<NamedCache<V>>]) -> usize {
    caches
        .iter()
        .map(|cache| {
            let evicted = cache.lock().shrink_to_pressure_target();
            if evicted > 0 {
                debug!(
                    "Memory pressure: evicted {} entries from '{}'",
                    evicted,
                    cache.name()
                );
            }
            evicted
        })
        .sum()
}

/// Result of one memory check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressureCheck {
    /// The probe gave no sample
    Unavailable,
    /// Usage at or below the high-water mark
    Normal { used_ratio: f64 },
    /// Usage above the mark; the pressure pass ran
    Relieved { used_ratio: f64, evicted: usize },
}

/// Samples `probe` and runs the pressure pass when usage exceeds `high_water`.
pub fn check_memory_pressure<V: Clone>(
    caches: &[Arc<NamedCache<V>>],
    probe: &dyn MemoryProbe,
    high_water: f64,
) -> PressureCheck {
    let Some(used_ratio) = probe.sample().and_then(|stats| stats.used_ratio()) else {
        return PressureCheck::Unavailable;
    };

    if used_ratio > high_water {
        let evicted = relieve_memory_pressure(caches);
        PressureCheck::Relieved {
            used_ratio,
            evicted,
        }
    } else {
        PressureCheck::Normal { used_ratio }
    }
}

/// Spawns the memory monitor over every cache of a registry.
pub fn spawn_memory_monitor<V>(
    runtime: &Handle,
    caches: Arc<CacheMap<V>>,
    probe: Arc<dyn MemoryProbe>,
    interval: Duration,
    high_water: f64,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    runtime.spawn(async move {
        info!(
            "Starting memory pressure monitor with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match check_memory_pressure(&snapshot(&caches), probe.as_ref(), high_water) {
                PressureCheck::Relieved {
                    used_ratio,
                    evicted,
                } => warn!(
                    "Memory usage at {:.1}%: evicted {} cache entries",
                    used_ratio * 100.0,
                    evicted
                ),
                PressureCheck::Normal { used_ratio } => {
                    debug!("Memory usage at {:.1}%", used_ratio * 100.0)
                }
                PressureCheck::Unavailable => debug!("Memory usage unavailable"),
            }
        }
    })
}
