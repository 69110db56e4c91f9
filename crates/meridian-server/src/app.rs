//! Application wiring.

use meridian_cache::{
    CacheManager, CachingEngine, JsonCodec, MemoryStoreFactory, RedisStoreFactory, StoreFactory,
    TypeRegistry,
};
use meridian_config::{AppConfig, CacheBackend, CacheConfig};
use meridian_core::MeridianResult;
use meridian_repository::{
    DatabasePool, DepartmentRepository, EmployeeRepository, MySqlDepartmentRepository,
    MySqlEmployeeRepository,
};
use meridian_rest::AppState;
use meridian_service::{register_domain_types, DeptServiceImpl, EmployeeServiceImpl};
use std::sync::Arc;
use tracing::info;

/// Selects the store factory for `cache.backend`.
pub fn store_factory(config: &AppConfig) -> MeridianResult<Arc<dyn StoreFactory>> {
    let factory: Arc<dyn StoreFactory> = match config.cache.backend {
        CacheBackend::Redis => Arc::new(RedisStoreFactory::from_config(&config.redis)?),
        CacheBackend::Memory => Arc::new(MemoryStoreFactory),
    };
    Ok(factory)
}

/// Builds the cache manager and the engine every service shares.
pub fn build_engine(
    config: &CacheConfig,
    factory: Arc<dyn StoreFactory>,
) -> MeridianResult<CachingEngine> {
    let mut registry = TypeRegistry::with_std_types();
    register_domain_types(&mut registry)?;
    info!("Cacheable types: {:?}", registry.tags());

    let manager = CacheManager::init(config, factory);
    let codec = Arc::new(JsonCodec::new(registry));
    Ok(CachingEngine::from_config(config, manager, codec))
}

/// Builds the services over MySQL repositories.
pub fn build_state(engine: CachingEngine, pool: Arc<DatabasePool>) -> MeridianResult<AppState> {
    let employee_repository: Arc<dyn EmployeeRepository> =
        Arc::new(MySqlEmployeeRepository::new(Arc::clone(&pool)));
    let department_repository: Arc<dyn DepartmentRepository> =
        Arc::new(MySqlDepartmentRepository::new(pool));

    let cache_manager = Arc::clone(engine.manager());
    let employee_service = EmployeeServiceImpl::new(employee_repository, engine.clone())?;
    let dept_service = DeptServiceImpl::new(department_repository, engine)?;

    Ok(AppState::new(
        Arc::new(employee_service),
        Arc::new(dept_service),
        cache_manager,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::mysql::MySqlPoolOptions;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.cache.backend = CacheBackend::Memory;
        config
    }

    #[test]
    fn test_store_factory_follows_backend() {
        let factory = store_factory(&memory_config()).unwrap();
        assert_eq!(factory.backend(), "memory");
    }

    #[tokio::test]
    async fn test_redis_factory_is_lazy() {
        // no server is contacted until a store is used
        let factory = store_factory(&AppConfig::default()).unwrap();
        assert_eq!(factory.backend(), "redis");
    }

    #[test]
    fn test_build_engine_uses_selected_backend() {
        let config = memory_config();
        let engine = build_engine(&config.cache, store_factory(&config).unwrap()).unwrap();
        assert_eq!(engine.manager().backend(), "memory");
        assert!(engine.manager().cache_names().is_empty());
    }

    #[tokio::test]
    async fn test_build_state_shares_manager() {
        let config = memory_config();
        let engine = build_engine(&config.cache, store_factory(&config).unwrap()).unwrap();
        let manager = Arc::clone(engine.manager());
        let pool = MySqlPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();

        let state = build_state(engine, Arc::new(DatabasePool::with_pool(pool))).unwrap();

        assert!(Arc::ptr_eq(&state.cache_manager, &manager));
    }
}
