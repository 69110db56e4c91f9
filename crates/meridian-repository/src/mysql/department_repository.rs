//! MySQL department repository implementation.

use crate::{traits::DepartmentRepository, DatabasePool};
use async_trait::async_trait;
use meridian_core::{Department, MeridianResult};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

/// MySQL department repository implementation.
#[derive(Clone)]
pub struct MySqlDepartmentRepository {
    pool: Arc<DatabasePool>,
}

impl MySqlDepartmentRepository {
    /// Creates a new MySQL department repository.
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DepartmentRow {
    id: i32,
    department_name: String,
}

impl From<DepartmentRow> for Department {
    fn from(row: DepartmentRow) -> Self {
        Self::new(row.id, row.department_name)
    }
}

#[async_trait]
impl DepartmentRepository for MySqlDepartmentRepository {
    async fn find_by_id(&self, id: i32) -> MeridianResult<Option<Department>> {
        debug!("Finding department by id: {}", id);

        let row = sqlx::query_as::<_, DepartmentRow>(
            "SELECT id, department_name FROM department WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Department::from))
    }
}
