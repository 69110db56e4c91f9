//! Process-local store.

use super::CacheStore;
use crate::codec::SerializedValue;
use crate::error::CacheResult;
use crate::key::{CacheKey, CacheName};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Entry count at which a write first sweeps expired entries.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug)]
struct MemoryEntry {
    value: SerializedValue,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// `HashMap`-backed store with lazy per-entry expiry.
///
/// Expired entries are dropped when they are next read, and swept on write
/// once the map reaches a size that doubles after every sweep.
#[derive(Debug)]
pub struct InMemoryCacheStore {
    name: CacheName,
    default_ttl: Option<Duration>,
    entries: RwLock<HashMap<CacheKey, MemoryEntry>>,
    prune_at: AtomicUsize,
}

impl InMemoryCacheStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(name: CacheName, default_ttl: Option<Duration>) -> Self {
        Self {
            name,
            default_ttl,
            entries: RwLock::new(HashMap::new()),
            prune_at: AtomicUsize::new(PRUNE_THRESHOLD),
        }
    }

    /// Returns the number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    fn name(&self) -> &CacheName {
        &self.name
    }

    async fn get(&self, key: &CacheKey) -> CacheResult<Option<SerializedValue>> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write();
        // re-check: a concurrent put may have refreshed the entry
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
            debug!("Expired key '{}' in cache '{}'", key, self.name);
            return Ok(None);
        }
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn put(
        &self,
        key: &CacheKey,
        value: SerializedValue,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let expires_at = ttl
            .or(self.default_ttl)
            .and_then(|ttl| Instant::now().checked_add(ttl));
        let mut entries = self.entries.write();
        if entries.len() >= self.prune_at.load(Ordering::Relaxed) {
            let before = entries.len();
            let now = Instant::now();
            entries.retain(|_, entry| !entry.is_expired(now));
            self.prune_at
                .store((entries.len() * 2).max(PRUNE_THRESHOLD), Ordering::Relaxed);
            debug!(
                "Pruned {} expired entries from cache '{}'",
                before - entries.len(),
                self.name
            );
        }
        entries.insert(key.clone(), MemoryEntry { value, expires_at });
        Ok(())
    }

    async fn evict(&self, key: &CacheKey) -> CacheResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        self.entries.write().clear();
        Ok(())
    }
}
