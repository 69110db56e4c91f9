//! Backend-independent cache store contract.

mod memory;
mod redis;

pub use memory::InMemoryCacheStore;
pub use redis::RedisCacheStore;

use crate::codec::SerializedValue;
use crate::error::CacheResult;
use crate::key::{CacheKey, CacheName};
use async_trait::async_trait;
use std::time::Duration;

/// Get/put/evict/clear over one logical cache.
///
/// Implementations are safe for concurrent use and are the synchronization
/// boundary for their entries. All operations are idempotent: evicting a
/// missing key or clearing an empty store succeeds. `put` overwrites
/// unconditionally.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// The logical cache this store serves.
    fn name(&self) -> &CacheName;

    /// Returns the stored blob, or `None` if absent or expired.
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<SerializedValue>>;

    /// Stores a blob. `ttl = None` applies the store's default TTL.
    async fn put(
        &self,
        key: &CacheKey,
        value: SerializedValue,
        ttl: Option<Duration>,
    ) -> CacheResult<()>;

    /// Removes one entry.
    async fn evict(&self, key: &CacheKey) -> CacheResult<()>;

    /// Removes every entry of this cache.
    async fn clear(&self) -> CacheResult<()>;
}
