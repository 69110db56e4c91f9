//! MySQL employee repository implementation.

use crate::{traits::EmployeeRepository, DatabasePool};
use async_trait::async_trait;
use meridian_core::{Employee, MeridianResult};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

/// MySQL employee repository implementation.
#[derive(Clone)]
pub struct MySqlEmployeeRepository {
    pool: Arc<DatabasePool>,
}

impl MySqlEmployeeRepository {
    /// Creates a new MySQL employee repository.
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }
}

/// Database row representation of an employee.
#[derive(Debug, FromRow)]
struct EmployeeRow {
    id: i32,
    last_name: String,
    email: String,
    gender: i32,
    d_id: i32,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Self {
            id: row.id,
            last_name: row.last_name,
            email: row.email,
            gender: row.gender,
            d_id: row.d_id,
        }
    }
}

#[async_trait]
impl EmployeeRepository for MySqlEmployeeRepository {
    async fn find_by_id(&self, id: i32) -> MeridianResult<Option<Employee>> {
        debug!("Finding employee by id: {}", id);

        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, last_name, email, gender, d_id FROM employee WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Employee::from))
    }

    async fn find_by_last_name(&self, last_name: &str) -> MeridianResult<Option<Employee>> {
        debug!("Finding employee by last name: {}", last_name);

        let row = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, last_name, email, gender, d_id
            FROM employee
            WHERE last_name = ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(last_name)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Employee::from))
    }

    async fn update(&self, employee: &Employee) -> MeridianResult<Option<Employee>> {
        debug!("Updating employee: {}", employee.id);

        let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM employee WHERE id = ?")
            .bind(employee.id)
            .fetch_optional(self.pool.inner())
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        // MySQL reports unchanged rows as unaffected, so existence is checked above
        sqlx::query(
            r#"
            UPDATE employee
            SET last_name = ?, email = ?, gender = ?, d_id = ?
            WHERE id = ?
            "#,
        )
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(employee.gender)
        .bind(employee.d_id)
        .bind(employee.id)
        .execute(self.pool.inner())
        .await?;

        Ok(Some(employee.clone()))
    }

    async fn delete(&self, id: i32) -> MeridianResult<bool> {
        debug!("Deleting employee: {}", id);

        let result = sqlx::query("DELETE FROM employee WHERE id = ?")
            .bind(id)
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
