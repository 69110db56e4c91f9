//! Redis-backed store.

use super::CacheStore;
use crate::codec::SerializedValue;
use crate::error::CacheResult;
use crate::key::{CacheKey, CacheName};
use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Pool};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Keys fetched per `SCAN` round trip during `clear`.
const SCAN_BATCH: usize = 200;

/// Store writing `{prefix}{cache}::{key}` entries to Redis.
///
/// Shares one connection pool with every other Redis store of the process.
pub struct RedisCacheStore {
    name: CacheName,
    pool: Arc<Pool>,
    key_prefix: String,
    default_ttl: Option<Duration>,
}

impl RedisCacheStore {
    /// Creates a store for `name` on a shared pool.
    #[must_use]
    pub fn new(
        name: CacheName,
        pool: Arc<Pool>,
        key_prefix: impl Into<String>,
        default_ttl: Option<Duration>,
    ) -> Self {
        Self {
            name,
            pool,
            key_prefix: key_prefix.into(),
            default_ttl,
        }
    }

    /// Returns the backend key for a cache key.
    #[must_use]
    pub fn entry_key(&self, key: &CacheKey) -> String {
        format!("{}{}::{}", self.key_prefix, self.name, key)
    }

    fn scan_pattern(&self) -> String {
        format!("{}::*", escape_glob(&format!("{}{}", self.key_prefix, self.name)))
    }

    async fn get_conn(&self) -> CacheResult<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    fn name(&self) -> &CacheName {
        &self.name
    }

    async fn get(&self, key: &CacheKey) -> CacheResult<Option<SerializedValue>> {
        let entry_key = self.entry_key(key);
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(&entry_key).await?;

        match &value {
            Some(_) => debug!("Redis hit for key '{}'", entry_key),
            None => debug!("Redis miss for key '{}'", entry_key),
        }

        Ok(value.map(SerializedValue::new))
    }

    async fn put(
        &self,
        key: &CacheKey,
        value: SerializedValue,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let entry_key = self.entry_key(key);
        let mut conn = self.get_conn().await?;

        match ttl.or(self.default_ttl) {
            Some(ttl) => {
                let ttl_ms = ttl_millis(ttl);
                conn.pset_ex::<_, _, ()>(&entry_key, value.into_string(), ttl_ms)
                    .await?;
                debug!("Stored key '{}' with TTL {}ms", entry_key, ttl_ms);
            }
            None => {
                conn.set::<_, _, ()>(&entry_key, value.into_string()).await?;
                debug!("Stored key '{}' without expiry", entry_key);
            }
        }
        Ok(())
    }

    async fn evict(&self, key: &CacheKey) -> CacheResult<()> {
        let entry_key = self.entry_key(key);
        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn.del(&entry_key).await?;
        debug!("Evicted key '{}': {}", entry_key, deleted > 0);
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        let pattern = self.scan_pattern();
        let mut conn = self.get_conn().await?;
        let mut cursor: u64 = 0;
        let mut deleted: i64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = deadpool_redis::redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let removed: i64 = conn.del(&keys).await?;
                deleted += removed;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!("Cleared cache '{}': {} keys deleted", self.name, deleted);
        Ok(())
    }
}

/// `PSETEX` rejects a zero expiry, so sub-millisecond TTLs round up.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Escapes Redis glob metacharacters so the cache name matches literally.
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use deadpool_redis::{Config, Runtime};

    fn store(prefix: &str, name: &str) -> RedisCacheStore {
        // pool creation is lazy; no server is contacted
        let pool = Config::from_url("redis://127.0.0.1:6379")
            .create_pool(Some(Runtime::Tokio1))
            .unwrap();
        RedisCacheStore::new(CacheName::new(name).unwrap(), Arc::new(pool), prefix, None)
    }

    #[tokio::test]
    async fn test_entry_key_layout() {
        let store = store("meridian:", "emp");
        assert_eq!(store.entry_key(&CacheKey::from("1")), "meridian:emp::1");
        assert_eq!(store.scan_pattern(), "meridian:emp::*");
    }

    #[test]
    fn test_ttl_keeps_millisecond_precision() {
        assert_eq!(ttl_millis(Duration::from_millis(250)), 250);
        assert_eq!(ttl_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(ttl_millis(Duration::from_secs(60)), 60_000);
        assert_eq!(ttl_millis(Duration::from_micros(10)), 1);
    }

    #[tokio::test]
    async fn test_scan_pattern_escapes_glob() {
        let store = store("app[1]:", "emp*");
        assert_eq!(store.scan_pattern(), "app\\[1\\]:emp\\*::*");
    }
}
