//! Process-wide registry of cache stores.

use crate::error::{CacheError, CacheResult};
use crate::key::CacheName;
use crate::metrics::CacheMetrics;
use crate::store::{CacheStore, InMemoryCacheStore, RedisCacheStore};
use deadpool_redis::{Config as RedisPoolConfig, Pool, PoolConfig, Runtime};
use meridian_config::{CacheConfig, RedisConfig};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Settings shared by every store a manager creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// TTL applied when a write does not carry one.
    pub default_ttl: Option<Duration>,
    /// Prefix of every backend key.
    pub key_prefix: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for StoreSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            default_ttl: config.default_ttl(),
            key_prefix: config.key_prefix.clone(),
        }
    }
}

/// Builds the store for a cache name.
///
/// `create` runs while the manager holds its registry lock, so it must not
/// perform I/O; backend connections are established lazily by the store.
pub trait StoreFactory: Send + Sync {
    /// Backend name for logs.
    fn backend(&self) -> &'static str;

    /// Creates the store for `name`.
    fn create(
        &self,
        name: &CacheName,
        settings: &StoreSettings,
    ) -> CacheResult<Arc<dyn CacheStore>>;

    /// Releases shared backend resources.
    fn shutdown(&self) {}
}

/// Creates [`RedisCacheStore`]s over one shared connection pool.
pub struct RedisStoreFactory {
    pool: Arc<Pool>,
}

impl RedisStoreFactory {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool }
    }

    /// Builds the pool from configuration. No connection is opened yet.
    pub fn from_config(config: &RedisConfig) -> CacheResult<Self> {
        let mut pool_config = RedisPoolConfig::from_url(&config.url);
        pool_config.pool = Some(PoolConfig::new(config.pool_size));
        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::Unavailable(format!("Failed to create Redis pool: {}", e)))?;
        info!("Redis pool configured (max size {})", config.pool_size);
        Ok(Self::new(Arc::new(pool)))
    }
}

impl StoreFactory for RedisStoreFactory {
    fn backend(&self) -> &'static str {
        "redis"
    }

    fn create(
        &self,
        name: &CacheName,
        settings: &StoreSettings,
    ) -> CacheResult<Arc<dyn CacheStore>> {
        Ok(Arc::new(RedisCacheStore::new(
            name.clone(),
            Arc::clone(&self.pool),
            settings.key_prefix.clone(),
            settings.default_ttl,
        )))
    }

    fn shutdown(&self) {
        self.pool.close();
    }
}

/// Creates [`InMemoryCacheStore`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryStoreFactory;

impl StoreFactory for MemoryStoreFactory {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn create(
        &self,
        name: &CacheName,
        settings: &StoreSettings,
    ) -> CacheResult<Arc<dyn CacheStore>> {
        Ok(Arc::new(InMemoryCacheStore::new(name.clone(), settings.default_ttl)))
    }
}

/// Maps cache names to stores, creating each at most once.
///
/// Registry creation is the only serialization point of the cache layer;
/// lookups of existing stores take a shared lock.
pub struct CacheManager {
    factory: Arc<dyn StoreFactory>,
    settings: StoreSettings,
    stores: RwLock<HashMap<CacheName, Arc<dyn CacheStore>>>,
    closed: AtomicBool,
}

impl CacheManager {
    /// Creates a manager.
    #[must_use]
    pub fn new(factory: Arc<dyn StoreFactory>, settings: StoreSettings) -> Self {
        Self {
            factory,
            settings,
            stores: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Creates the process-wide manager from configuration.
    #[must_use]
    pub fn init(config: &CacheConfig, factory: Arc<dyn StoreFactory>) -> Arc<Self> {
        crate::metrics::register_metrics();
        let manager = Self::new(factory, StoreSettings::from(config));
        info!(
            "Cache manager initialized (backend: {}, default TTL: {:?}, prefix: '{}')",
            manager.factory.backend(),
            manager.settings.default_ttl,
            manager.settings.key_prefix
        );
        Arc::new(manager)
    }

    /// Returns the store for `name`, creating it on first use.
    ///
    /// Concurrent first requests for one name create exactly one store.
    pub fn get_or_create_store(&self, name: &CacheName) -> CacheResult<Arc<dyn CacheStore>> {
        if let Some(store) = self.stores.read().get(name) {
            return Ok(Arc::clone(store));
        }

        let mut stores = self.stores.write();
        if let Some(store) = stores.get(name) {
            return Ok(Arc::clone(store));
        }
        if self.is_closed() {
            return Err(CacheError::Unavailable("cache manager is shut down".to_string()));
        }

        let store = self.factory.create(name, &self.settings)?;
        stores.insert(name.clone(), Arc::clone(&store));
        CacheMetrics::stores(stores.len());
        debug!("Created {} store for cache '{}'", self.factory.backend(), name);
        Ok(store)
    }

    /// Returns the store for `name` without creating it.
    #[must_use]
    pub fn get_store_if_exists(&self, name: &str) -> Option<Arc<dyn CacheStore>> {
        let name = CacheName::new(name).ok()?;
        self.stores.read().get(&name).cloned()
    }

    /// Returns the names of every created store, sorted.
    #[must_use]
    pub fn cache_names(&self) -> Vec<CacheName> {
        let mut names: Vec<_> = self.stores.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the backend name.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.factory.backend()
    }

    /// Returns true once [`shutdown`](Self::shutdown) ran.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Drops every store and releases backend resources.
    ///
    /// Later store requests fail with [`CacheError::Unavailable`].
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let dropped = {
            let mut stores = self.stores.write();
            let count = stores.len();
            stores.clear();
            count
        };
        CacheMetrics::stores(0);
        self.factory.shutdown();
        info!("Cache manager shut down ({} stores released)", dropped);
    }
}
