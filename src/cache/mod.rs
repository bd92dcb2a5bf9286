//! Cache Module
//!
//! Named in-memory caches with TTL expiry and oldest-first eviction, owned by
//! a registry that creates them lazily by name.

mod entry;
mod named;
mod order;
mod registry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use named::NamedCache;
pub use order::WriteOrder;
pub use registry::{snapshot, CacheMap, CacheRegistry};
pub use stats::{hit_rate, CacheStats, RegistryStats, StatsReport};
pub use store::{
    CacheStore, CAPACITY_GUARD_PERCENT, HIGH_OCCUPANCY_EVICT_PERCENT, HIGH_OCCUPANCY_PERCENT,
    PRESSURE_TARGET_PERCENT,
};
