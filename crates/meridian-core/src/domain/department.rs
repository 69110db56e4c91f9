//! Department entity.

use crate::TypeTagged;
use serde::{Deserialize, Serialize};

/// A department row as served by the authoritative store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i32,
    pub department_name: String,
}

impl Department {
    /// Creates a new department.
    #[must_use]
    pub fn new(id: i32, department_name: impl Into<String>) -> Self {
        Self {
            id,
            department_name: department_name.into(),
        }
    }
}

impl TypeTagged for Department {
    const TYPE_TAG: &'static str = "meridian.domain.Department";
}
