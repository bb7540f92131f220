//! Time-windowed cache of place search results
//!
//! Entries are keyed by the exact search coordinate and radius. Freshness is
//! judged by the caller against a TTL; stores only keep the newest entry per
//! key and remove old ones when `purge_expired` is called.

pub mod memory;
pub mod persistent;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Coordinate, Place};

pub use memory::MemoryPlaceCache;
pub use persistent::PersistentPlaceCache;

/// How long a search result may be served from cache
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Cache key for a place search.
///
/// Coordinates are kept as their exact IEEE-754 bit patterns, so two searches
/// share a key only when both coordinates compare equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq)]
pub struct CacheKey {
    pub lat_bits: u64,
    pub lng_bits: u64,
    pub radius: u32,
}

fn exact_bits(value: f64) -> u64 {
    // -0.0 == 0.0, so both map to the same key
    if value == 0.0 { 0.0_f64.to_bits() } else { value.to_bits() }
}

impl CacheKey {
    #[must_use]
    pub fn new(coordinate: &Coordinate, radius: u32) -> Self {
        Self {
            lat_bits: exact_bits(coordinate.latitude),
            lng_bits: exact_bits(coordinate.longitude),
            radius,
        }
    }

    /// Key used by byte-oriented stores
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("places:{:016x}:{:016x}:{}", self.lat_bits, self.lng_bits, self.radius)
    }
}

/// One cached search result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub coordinate: Coordinate,
    pub radius: u32,
    pub places: Vec<Place>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry stamped with the current time
    #[must_use]
    pub fn new(coordinate: Coordinate, radius: u32, places: Vec<Place>) -> Self {
        Self::with_timestamp(coordinate, radius, places, Utc::now())
    }

    #[must_use]
    pub fn with_timestamp(
        coordinate: Coordinate,
        radius: u32,
        places: Vec<Place>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            coordinate,
            radius,
            places,
            created_at,
        }
    }

    #[must_use]
    pub fn key(&self) -> CacheKey {
        CacheKey::new(&self.coordinate, self.radius)
    }

    /// True while `now - created_at < ttl`
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(self.created_at) < ttl,
            // A TTL too large for chrono never expires.
            Err(_) => true,
        }
    }
}

/// Creation time before which entries are expired, `None` if out of range
#[must_use]
pub fn expiry_cutoff(now: DateTime<Utc>, ttl: Duration) -> Option<DateTime<Utc>> {
    let ttl = chrono::Duration::from_std(ttl).ok()?;
    now.checked_sub_signed(ttl)
}

/// Storage backend for cached search results
#[async_trait]
pub trait PlaceCache: Send + Sync {
    /// Latest entry for the exact key, fresh or not
    async fn lookup(&self, coordinate: Coordinate, radius: u32) -> Result<Option<CacheEntry>>;

    /// Insert or replace the entry for its key. An entry older than the one
    /// already stored is ignored.
    async fn store(&self, entry: CacheEntry) -> Result<()>;

    /// Delete entries created before `before`, returning how many were removed
    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<usize>;
}
