//! Configuration Module
//!
//! Per-cache profiles and the registry-wide settings loaded from environment variables.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use tracing::warn;

use crate::error::{CacheError, Result};

// == Cache Config ==
/// Policy applied to one named cache: entry lifetime and capacity ceiling.
///
/// Only built through [`CacheConfig::new`] or the known profiles, so the TTL
/// and capacity are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    ttl: Duration,
    max_size: usize,
}

impl CacheConfig {
    /// Profile used for any cache name without a tuned entry.
    pub const DEFAULT: CacheConfig = CacheConfig {
        ttl: Duration::from_millis(300_000),
        max_size: 1000,
    };

    /// Creates a validated config.
    ///
    /// Rejects a zero TTL and a zero capacity.
    pub fn new(ttl: Duration, max_size: usize) -> Result<Self> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidConfig(
                "ttl must be greater than zero".to_string(),
            ));
        }
        if max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be at least 1".to_string(),
            ));
        }
        Ok(Self { ttl, max_size })
    }

    /// Shorthand for `new` with the TTL in milliseconds.
    pub fn from_millis(ttl_millis: u64, max_size: usize) -> Result<Self> {
        Self::new(Duration::from_millis(ttl_millis), max_size)
    }

    /// Returns the tuned profile for a known cache name, or the default profile.
    pub fn for_name(name: &str) -> Self {
        KnownCache::from_name(name)
            .map(KnownCache::config)
            .unwrap_or(Self::DEFAULT)
    }

    /// Default time-to-live for entries stored without an override.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Capacity ceiling enforced by the eviction passes.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// TTL in whole milliseconds, as reported by stats.
    pub fn ttl_millis(&self) -> u64 {
        self.ttl.as_millis() as u64
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// == Known Caches ==
/// Cache names used across the application, each with a tuned profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownCache {
    UserContext,
    Verification,
    Permissions,
    UserData,
    ModuleAccess,
}

impl KnownCache {
    pub const ALL: [KnownCache; 5] = [
        KnownCache::UserContext,
        KnownCache::Verification,
        KnownCache::Permissions,
        KnownCache::UserData,
        KnownCache::ModuleAccess,
    ];

    /// The registry name of this cache.
    pub fn name(self) -> &'static str {
        match self {
            KnownCache::UserContext => "userContext",
            KnownCache::Verification => "verification",
            KnownCache::Permissions => "permissions",
            KnownCache::UserData => "userData",
            KnownCache::ModuleAccess => "moduleAccess",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|known| known.name() == name)
    }

    /// The tuned profile for this cache.
    pub fn config(self) -> CacheConfig {
        let (ttl_millis, max_size) = match self {
            KnownCache::UserContext => (600_000, 100),
            KnownCache::Verification => (30_000, 500),
            KnownCache::Permissions => (300_000, 200),
            KnownCache::UserData => (900_000, 100),
            KnownCache::ModuleAccess => (120_000, 300),
        };
        CacheConfig {
            ttl: Duration::from_millis(ttl_millis),
            max_size,
        }
    }
}

// == Registry Config ==
/// Registry-wide configuration.
///
/// Holds the profile table, the fallback profile and the timing of the
/// background maintenance tasks.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Profiles keyed by cache name, seeded from [`KnownCache`]
    pub profiles: HashMap<String, CacheConfig>,
    /// Profile for names missing from `profiles`
    pub default_profile: CacheConfig,
    /// Upper bound on the per-cache sweep interval
    pub sweep_interval_cap: Duration,
    /// Interval of the cross-cache maintenance pass
    pub global_sweep_interval: Duration,
    /// Interval of the memory pressure check
    pub memory_check_interval: Duration,
    /// Used/limit ratio above which the pressure pass runs
    pub memory_high_water: f64,
    /// HTTP port of the admin surface (binary only)
    pub server_port: u16,
}

impl RegistryConfig {
    /// Creates a new RegistryConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL_MS` - TTL of the fallback profile (default: 300000)
    /// - `CACHE_DEFAULT_MAX_SIZE` - Capacity of the fallback profile (default: 1000)
    /// - `CACHE_SWEEP_INTERVAL_CAP_MS` - Cap on per-cache sweep interval (default: 60000)
    /// - `CACHE_GLOBAL_SWEEP_INTERVAL_MS` - Global maintenance interval (default: 300000)
    /// - `CACHE_MEMORY_CHECK_INTERVAL_MS` - Memory check interval (default: 30000)
    /// - `CACHE_MEMORY_HIGH_WATER` - Pressure threshold ratio (default: 0.8)
    /// - `SERVER_PORT` - Admin HTTP port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let default_profile = CacheConfig::new(
            env_millis("CACHE_DEFAULT_TTL_MS").unwrap_or(defaults.default_profile.ttl),
            env_parse("CACHE_DEFAULT_MAX_SIZE").unwrap_or(defaults.default_profile.max_size),
        )
        .unwrap_or_else(|err| {
            warn!("Ignoring default cache profile from environment: {}", err);
            defaults.default_profile
        });

        let memory_high_water = env_parse::<f64>("CACHE_MEMORY_HIGH_WATER")
            .filter(|ratio| *ratio > 0.0 && *ratio <= 1.0)
            .unwrap_or(defaults.memory_high_water);

        Self {
            profiles: defaults.profiles,
            default_profile,
            sweep_interval_cap: env_millis("CACHE_SWEEP_INTERVAL_CAP_MS")
                .unwrap_or(defaults.sweep_interval_cap),
            global_sweep_interval: env_millis("CACHE_GLOBAL_SWEEP_INTERVAL_MS")
                .unwrap_or(defaults.global_sweep_interval),
            memory_check_interval: env_millis("CACHE_MEMORY_CHECK_INTERVAL_MS")
                .unwrap_or(defaults.memory_check_interval),
            memory_high_water,
            server_port: env_parse("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Adds or replaces the profile for `name` (builder pattern).
    #[must_use]
    pub fn with_profile(mut self, name: impl Into<String>, config: CacheConfig) -> Self {
        self.profiles.insert(name.into(), config);
        self
    }

    /// Resolves the profile for a cache name, falling back to the default profile.
    pub fn profile_for(&self, name: &str) -> CacheConfig {
        self.profiles
            .get(name)
            .copied()
            .unwrap_or(self.default_profile)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            profiles: KnownCache::ALL
                .into_iter()
                .map(|known| (known.name().to_string(), known.config()))
                .collect(),
            default_profile: CacheConfig::DEFAULT,
            sweep_interval_cap: Duration::from_millis(60_000),
            global_sweep_interval: Duration::from_millis(300_000),
            memory_check_interval: Duration::from_millis(30_000),
            memory_high_water: 0.8,
            server_port: 3000,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

// Zero intervals would spin the background loops.
fn env_millis(key: &str) -> Option<Duration> {
    env_parse::<u64>(key)
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}
