use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fjall::Keyspace;
use std::path::Path;
use tokio::sync::Mutex;
use tokio::task;

use super::{CacheEntry, CacheKey, PlaceCache};
use crate::models::Coordinate;

/// On-disk cache backed by a fjall keyspace.
///
/// Entries are postcard-encoded. All store access runs on the blocking pool.
pub struct PersistentPlaceCache {
    store: Keyspace,
    // Serializes read-compare-write in `store` so the newest entry wins.
    write_lock: Mutex<()>,
}

fn get_from_store(store: &Keyspace, key: &[u8]) -> Result<Option<CacheEntry>> {
    match store.get(key)? {
        Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
        None => Ok(None),
    }
}

impl PersistentPlaceCache {
    /// Open (or create) the cache database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("places", fjall::KeyspaceCreateOptions::default)?;
        Ok(PersistentPlaceCache {
            store: items,
            write_lock: Mutex::new(()),
        })
    }
}

#[async_trait]
impl PlaceCache for PersistentPlaceCache {
    #[tracing::instrument(name = "query_place_cache", level = "debug", skip(self))]
    async fn lookup(&self, coordinate: Coordinate, radius: u32) -> Result<Option<CacheEntry>> {
        let store = self.store.clone();
        let key = CacheKey::new(&coordinate, radius).storage_key();

        let entry = task::spawn_blocking(move || get_from_store(&store, key.as_bytes())).await??;
        if entry.is_some() {
            tracing::debug!("Key found");
        } else {
            tracing::debug!("Key not found");
        }
        Ok(entry)
    }

    #[tracing::instrument(name = "put_place_cache", level = "debug", skip(self, entry), fields(radius = entry.radius, places = entry.places.len()))]
    async fn store(&self, entry: CacheEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let store = self.store.clone();
        let key = entry.key().storage_key();

        task::spawn_blocking(move || -> Result<()> {
            if let Some(existing) = get_from_store(&store, key.as_bytes())? {
                if existing.created_at > entry.created_at {
                    tracing::debug!("Stored entry is newer, keeping it");
                    return Ok(());
                }
            }
            let bytes = postcard::to_stdvec(&entry)?;
            store.insert(key.as_bytes(), bytes)?;
            Ok(())
        })
        .await??;
        Ok(())
    }

    #[tracing::instrument(name = "purge_place_cache", level = "debug", skip(self))]
    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let store = self.store.clone();

        task::spawn_blocking(move || -> Result<usize> {
            let mut expired = Vec::new();
            for guard in store.iter() {
                let (key, value) = guard.into_inner()?;
                match postcard::from_bytes::<CacheEntry>(&value) {
                    Ok(entry) if entry.created_at >= before => {}
                    Ok(_) => expired.push(key),
                    Err(e) => {
                        tracing::warn!("Dropping undecodable cache entry: {}", e);
                        expired.push(key);
                    }
                }
            }

            let removed = expired.len();
            for key in expired {
                store.remove(key)?;
            }
            Ok(removed)
        })
        .await?
    }
}
