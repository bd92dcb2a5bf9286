//! Cache Registry - Process-wide named in-memory caches
//!
//! Provides independently configured caches with TTL expiry, FIFO capacity
//! eviction, background sweeping and memory-pressure shedding.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheRegistry, CacheStats, NamedCache, RegistryStats, StatsReport};
pub use config::{CacheConfig, KnownCache, RegistryConfig};
pub use error::{CacheError, Result};
pub use tasks::{MemoryProbe, MemoryStats, NoMemoryProbe, PressureCheck, SystemMemoryProbe};
