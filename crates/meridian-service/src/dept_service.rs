//! Department service trait definition.

use async_trait::async_trait;
use meridian_core::{Department, MeridianResult};

/// Department service trait.
#[async_trait]
pub trait DeptService: Send + Sync {
    /// Gets a department by ID; served from the `dept` cache when present.
    async fn get_dept_by_id(&self, id: i32) -> MeridianResult<Department>;
}
