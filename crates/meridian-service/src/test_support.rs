//! Repository doubles and an in-memory engine for service tests.

use crate::caching::register_domain_types;
use async_trait::async_trait;
use meridian_cache::{CacheManager, CachingEngine, JsonCodec, MemoryStoreFactory, TypeRegistry};
use meridian_config::CacheConfig;
use meridian_core::{Department, Employee, MeridianResult};
use meridian_repository::{DepartmentRepository, EmployeeRepository};
use mockall::mock;
use std::sync::Arc;

mock! {
    pub EmployeeRepo {}

    #[async_trait]
    impl EmployeeRepository for EmployeeRepo {
        async fn find_by_id(&self, id: i32) -> MeridianResult<Option<Employee>>;
        async fn find_by_last_name(&self, last_name: &str) -> MeridianResult<Option<Employee>>;
        async fn update(&self, employee: &Employee) -> MeridianResult<Option<Employee>>;
        async fn delete(&self, id: i32) -> MeridianResult<bool>;
    }
}

mock! {
    pub DepartmentRepo {}

    #[async_trait]
    impl DepartmentRepository for DepartmentRepo {
        async fn find_by_id(&self, id: i32) -> MeridianResult<Option<Department>>;
    }
}

/// Engine over fresh in-memory stores.
pub fn engine() -> CachingEngine {
    let mut registry = TypeRegistry::with_std_types();
    register_domain_types(&mut registry).unwrap();
    let manager = CacheManager::init(&CacheConfig::default(), Arc::new(MemoryStoreFactory));
    CachingEngine::new(manager, Arc::new(JsonCodec::new(registry)))
}
