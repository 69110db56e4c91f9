//! Cache-aware department service implementation.

use crate::caching::DEPT_CACHE;
use crate::dept_service::DeptService;
use async_trait::async_trait;
use meridian_cache::{
    CachedOperation, CachingEngine, InvocationArgs, OperationSignature, ReadThrough,
};
use meridian_core::{Department, MeridianError, MeridianResult};
use meridian_repository::DepartmentRepository;
use std::sync::Arc;
use tracing::debug;

/// Department service backed by a [`DepartmentRepository`].
pub struct DeptServiceImpl<R: DepartmentRepository + ?Sized> {
    repository: Arc<R>,
    engine: CachingEngine,
    get_dept_by_id: CachedOperation,
}

impl<R: DepartmentRepository + ?Sized> DeptServiceImpl<R> {
    /// Creates the service and registers its caching policy.
    pub fn new(repository: Arc<R>, engine: CachingEngine) -> MeridianResult<Self> {
        let get_dept_by_id = CachedOperation::register(
            OperationSignature::new("getDeptById", ["id"]),
            ReadThrough::new([DEPT_CACHE]),
        )?;
        Ok(Self {
            repository,
            engine,
            get_dept_by_id,
        })
    }
}

#[async_trait]
impl<R: DepartmentRepository + ?Sized + 'static> DeptService for DeptServiceImpl<R> {
    async fn get_dept_by_id(&self, id: i32) -> MeridianResult<Department> {
        debug!("Getting department: {}", id);

        let args = InvocationArgs::new().with(&id)?;
        self.engine
            .with_caching(&self.get_dept_by_id, args, move || async move {
                self.repository
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| MeridianError::not_found("Department", id))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{engine, MockDepartmentRepo};
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_get_dept_by_id_cached() {
        let mut repo = MockDepartmentRepo::new();
        repo.expect_find_by_id()
            .with(eq(3))
            .times(1)
            .returning(|id| Ok(Some(Department::new(id, "Finance"))));
        let service = DeptServiceImpl::new(Arc::new(repo), engine()).unwrap();

        let first = service.get_dept_by_id(3).await.unwrap();
        let second = service.get_dept_by_id(3).await.unwrap();
        assert_eq!(first, Department::new(3, "Finance"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_get_dept_by_id_not_found() {
        let mut repo = MockDepartmentRepo::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        let service = DeptServiceImpl::new(Arc::new(repo), engine()).unwrap();

        let err = service.get_dept_by_id(9).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
