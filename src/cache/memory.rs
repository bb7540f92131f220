use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::{CacheEntry, CacheKey, PlaceCache};
use crate::models::Coordinate;

/// Process-local cache backed by a hash map
#[derive(Debug, Default)]
pub struct MemoryPlaceCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryPlaceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl PlaceCache for MemoryPlaceCache {
    async fn lookup(&self, coordinate: Coordinate, radius: u32) -> Result<Option<CacheEntry>> {
        let key = CacheKey::new(&coordinate, radius);
        Ok(self.entries.read().await.get(&key).cloned())
    }

    async fn store(&self, entry: CacheEntry) -> Result<()> {
        let key = entry.key();
        let mut entries = self.entries.write().await;

        match entries.get(&key) {
            Some(existing) if existing.created_at > entry.created_at => {
                debug!("Ignoring older cache write for {:?}", key);
            }
            _ => {
                entries.insert(key, entry);
            }
        }
        Ok(())
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let initial = entries.len();
        entries.retain(|_, entry| entry.created_at >= before);
        Ok(initial - entries.len())
    }
}
