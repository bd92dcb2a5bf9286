//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

/// Lifetime used when `stored_at + ttl` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

// == Cache Entry ==
/// A single stored value plus its timing metadata.
///
/// Timestamps use the tokio clock so a paused test runtime can move them.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value, opaque to the cache
    pub value: V,
    /// When the value was written
    pub stored_at: Instant,
    /// `stored_at + ttl`
    pub expires_at: Instant,
    /// Number of successful reads served from this entry
    pub hit_count: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry that expires `ttl` from now.
    pub fn new(value: V, ttl: Duration) -> Self {
        Self::stored_at(value, Instant::now(), ttl)
    }

    /// Creates an entry with an explicit write time.
    ///
    /// A TTL too large to represent is clamped so the entry effectively never
    /// expires.
    pub fn stored_at(value: V, stored_at: Instant, ttl: Duration) -> Self {
        let expires_at = stored_at
            .checked_add(ttl)
            .unwrap_or_else(|| stored_at + FAR_FUTURE);
        Self {
            value,
            stored_at,
            expires_at,
            hit_count: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now` reaches `expires_at`, so a zero TTL is
    /// never served.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Checks if the entry has expired against the current clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Records a read served from this entry.
    pub fn record_hit(&mut self) {
        self.hit_count += 1;
    }
}
