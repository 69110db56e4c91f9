//! Shared fixtures for caching engine tests.

#![allow(dead_code)]

use async_trait::async_trait;
use meridian_cache::{
    CacheError, CacheKey, CacheManager, CacheName, CacheResult, CacheStore, CachingEngine,
    InMemoryCacheStore, JsonCodec, SerializedValue, StoreFactory, StoreSettings, TypeRegistry,
};
use meridian_core::{Department, Employee, MeridianError, MeridianResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory store that counts every call and can be switched offline.
pub struct CountingStore {
    inner: InMemoryCacheStore,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
    pub evicts: AtomicUsize,
    pub clears: AtomicUsize,
    offline: AtomicBool,
}

impl CountingStore {
    fn new(name: CacheName, default_ttl: Option<Duration>) -> Self {
        Self {
            inner: InMemoryCacheStore::new(name, default_ttl),
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            evicts: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Reads an entry without touching the counters.
    pub async fn peek(&self, key: &str) -> Option<SerializedValue> {
        self.inner.get(&CacheKey::from(key)).await.ok().flatten()
    }

    /// Writes an entry without touching the counters.
    pub async fn seed(&self, key: &str, raw: &str) {
        self.inner
            .put(&CacheKey::from(key), SerializedValue::new(raw), None)
            .await
            .unwrap();
    }

    /// Removes an entry without touching the counters.
    pub async fn drop_entry(&self, key: &str) {
        self.inner.evict(&CacheKey::from(key)).await.unwrap();
    }

    fn check_online(&self) -> CacheResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for CountingStore {
    fn name(&self) -> &CacheName {
        self.inner.name()
    }

    async fn get(&self, key: &CacheKey) -> CacheResult<Option<SerializedValue>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.inner.get(key).await
    }

    async fn put(
        &self,
        key: &CacheKey,
        value: SerializedValue,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.inner.put(key, value, ttl).await
    }

    async fn evict(&self, key: &CacheKey) -> CacheResult<()> {
        self.evicts.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.inner.evict(key).await
    }

    async fn clear(&self) -> CacheResult<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.inner.clear().await
    }
}

/// Factory handing out [`CountingStore`]s and keeping them for inspection.
#[derive(Default)]
pub struct CountingFactory {
    stores: Mutex<HashMap<String, Arc<CountingStore>>>,
}

impl CountingFactory {
    pub fn store(&self, name: &str) -> Option<Arc<CountingStore>> {
        self.stores.lock().get(name).cloned()
    }
}

impl StoreFactory for CountingFactory {
    fn backend(&self) -> &'static str {
        "counting"
    }

    fn create(
        &self,
        name: &CacheName,
        settings: &StoreSettings,
    ) -> CacheResult<Arc<dyn CacheStore>> {
        let store = Arc::new(CountingStore::new(name.clone(), settings.default_ttl));
        self.stores
            .lock()
            .insert(name.as_str().to_string(), Arc::clone(&store));
        Ok(store)
    }
}

pub fn codec() -> JsonCodec {
    let mut registry = TypeRegistry::with_std_types();
    registry.register::<Employee>().unwrap();
    registry.register::<Department>().unwrap();
    JsonCodec::new(registry)
}

pub struct Harness {
    pub engine: CachingEngine,
    pub factory: Arc<CountingFactory>,
}

impl Harness {
    pub fn new() -> Self {
        let factory = Arc::new(CountingFactory::default());
        let manager = Arc::new(CacheManager::new(factory.clone(), StoreSettings::default()));
        let engine = CachingEngine::new(manager, Arc::new(codec()));
        Self { engine, factory }
    }

    pub fn fail_closed(mut self) -> Self {
        self.engine = self.engine.with_fail_open(false);
        self
    }

    /// Returns the store for `name`, creating it if needed.
    pub fn store(&self, name: &str) -> Arc<CountingStore> {
        self.engine
            .manager()
            .get_or_create_store(&CacheName::new(name).unwrap())
            .unwrap();
        self.factory.store(name).unwrap()
    }
}

/// Authoritative employee table that counts lookups.
#[derive(Default)]
pub struct Authority {
    rows: Mutex<HashMap<i32, Employee>>,
    pub fetches: AtomicUsize,
    pub persists: AtomicUsize,
}

impl Authority {
    pub fn with(employees: impl IntoIterator<Item = Employee>) -> Arc<Self> {
        let authority = Self::default();
        {
            let mut rows = authority.rows.lock();
            for employee in employees {
                rows.insert(employee.id, employee);
            }
        }
        Arc::new(authority)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub async fn fetch(&self, id: i32) -> MeridianResult<Employee> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.rows
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| MeridianError::not_found("Employee", id))
    }

    pub async fn fetch_by_last_name(&self, last_name: &str) -> MeridianResult<Employee> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.rows
            .lock()
            .values()
            .find(|e| e.last_name == last_name)
            .cloned()
            .ok_or_else(|| MeridianError::not_found("Employee", last_name))
    }

    pub async fn persist(&self, employee: Employee) -> MeridianResult<Employee> {
        self.persists.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().insert(employee.id, employee.clone());
        Ok(employee)
    }

    pub async fn remove(&self, id: i32) -> MeridianResult<()> {
        self.rows
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| MeridianError::not_found("Employee", id))
    }
}

pub fn employee(id: i32, last_name: &str) -> Employee {
    Employee::new(
        id,
        last_name,
        format!("{}@example.com", last_name.to_lowercase()),
        1,
        1,
    )
}
