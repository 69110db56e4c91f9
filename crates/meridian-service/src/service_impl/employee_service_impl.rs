//! Cache-aware employee service implementation.

use crate::caching::EMP_CACHE;
use crate::employee_service::EmployeeService;
use async_trait::async_trait;
use meridian_cache::{
    CachedOperation, CachingEngine, Composite, Invalidate, InvocationArgs, OperationSignature,
    ReadThrough, WriteThrough,
};
use meridian_core::{Employee, MeridianError, MeridianResult, ValidateExt};
use meridian_repository::EmployeeRepository;
use std::sync::Arc;
use tracing::{debug, info};

/// Registered policies of the employee operations.
struct EmployeeOperations {
    get_emp: CachedOperation,
    update_emp: CachedOperation,
    delete_emp: CachedOperation,
    get_emp_by_last_name: CachedOperation,
}

impl EmployeeOperations {
    fn register() -> MeridianResult<Self> {
        Ok(Self {
            get_emp: CachedOperation::register(
                OperationSignature::new("getEmp", ["id"]),
                ReadThrough::new([EMP_CACHE]),
            )?,
            update_emp: CachedOperation::register(
                OperationSignature::new("updateEmp", ["employee"]),
                WriteThrough::new(EMP_CACHE).key("#result.id"),
            )?,
            delete_emp: CachedOperation::register(
                OperationSignature::new("deleteEmp", ["id"]),
                Invalidate::new(EMP_CACHE).key("#id"),
            )?,
            get_emp_by_last_name: CachedOperation::register(
                OperationSignature::new("getEmpByLastName", ["lastName"]),
                Composite::new()
                    .read_through(ReadThrough::new([EMP_CACHE]).key("#lastName"))
                    .write_through(WriteThrough::new(EMP_CACHE).key("#result.id"))
                    .write_through(WriteThrough::new(EMP_CACHE).key("#result.email")),
            )?,
        })
    }
}

/// Employee service backed by an [`EmployeeRepository`].
pub struct EmployeeServiceImpl<R: EmployeeRepository + ?Sized> {
    repository: Arc<R>,
    engine: CachingEngine,
    operations: EmployeeOperations,
}

impl<R: EmployeeRepository + ?Sized> EmployeeServiceImpl<R> {
    /// Creates the service and registers its caching policies.
    ///
    /// # Errors
    ///
    /// Returns [`MeridianError::Configuration`] if a policy is rejected.
    pub fn new(repository: Arc<R>, engine: CachingEngine) -> MeridianResult<Self> {
        let operations = EmployeeOperations::register()?;
        info!("Employee service ready (cache '{}')", EMP_CACHE);
        Ok(Self {
            repository,
            engine,
            operations,
        })
    }
}

#[async_trait]
impl<R: EmployeeRepository + ?Sized + 'static> EmployeeService for EmployeeServiceImpl<R> {
    async fn get_emp(&self, id: i32) -> MeridianResult<Employee> {
        debug!("Getting employee: {}", id);

        let args = InvocationArgs::new().with(&id)?;
        self.engine
            .with_caching(&self.operations.get_emp, args, move || async move {
                self.repository
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| MeridianError::not_found("Employee", id))
            })
            .await
    }

    async fn update_emp(&self, employee: Employee) -> MeridianResult<Employee> {
        debug!("Updating employee: {}", employee.id);

        employee.validate_request()?;

        let args = InvocationArgs::new().with(&employee)?;
        let updated = self
            .engine
            .with_caching(&self.operations.update_emp, args, move || async move {
                self.repository
                    .update(&employee)
                    .await?
                    .ok_or_else(|| MeridianError::not_found("Employee", employee.id))
            })
            .await?;

        info!("Employee updated: {}", updated.id);
        Ok(updated)
    }

    async fn delete_emp(&self, id: i32) -> MeridianResult<()> {
        debug!("Deleting employee: {}", id);

        let args = InvocationArgs::new().with(&id)?;
        self.engine
            .with_caching(&self.operations.delete_emp, args, move || async move {
                if self.repository.delete(id).await? {
                    Ok(true)
                } else {
                    Err(MeridianError::not_found("Employee", id))
                }
            })
            .await?;

        info!("Employee deleted: {}", id);
        Ok(())
    }

    async fn get_emp_by_last_name(&self, last_name: &str) -> MeridianResult<Employee> {
        debug!("Getting employee by last name: {}", last_name);

        let args = InvocationArgs::new().with(last_name)?;
        let operation = &self.operations.get_emp_by_last_name;
        self.engine
            .with_caching(operation, args, move || async move {
                self.repository
                    .find_by_last_name(last_name)
                    .await?
                    .ok_or_else(|| MeridianError::not_found("Employee", last_name))
            })
            .await
    }
}
