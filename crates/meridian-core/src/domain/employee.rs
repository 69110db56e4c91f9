//! Employee entity.

use crate::validation::rules;
use crate::TypeTagged;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// An employee row as served by the authoritative store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Primary key.
    pub id: i32,

    /// Family name; also used as a secondary cache index.
    #[validate(length(min = 1, max = 255), custom(function = "rules::not_blank"))]
    pub last_name: String,

    /// Contact email; also used as a secondary cache index.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    /// Gender code (`0` or `1`).
    #[validate(custom(function = "rules::gender_code"))]
    pub gender: i32,

    /// Owning department id.
    pub d_id: i32,
}

impl Employee {
    /// Creates a new employee.
    #[must_use]
    pub fn new(
        id: i32,
        last_name: impl Into<String>,
        email: impl Into<String>,
        gender: i32,
        d_id: i32,
    ) -> Self {
        Self {
            id,
            last_name: last_name.into(),
            email: email.into(),
            gender,
            d_id,
        }
    }
}

impl TypeTagged for Employee {
    const TYPE_TAG: &'static str = "meridian.domain.Employee";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidateExt;

    #[test]
    fn test_serializes_camel_case() {
        let employee = Employee::new(1, "Zhang", "zhang@example.com", 1, 2);
        let json = serde_json::to_value(&employee).unwrap();
        assert_eq!(json["lastName"], "Zhang");
        assert_eq!(json["dId"], 2);
    }

    #[test]
    fn test_validation() {
        assert!(Employee::new(1, "Zhang", "zhang@example.com", 1, 2)
            .validate_request()
            .is_ok());
        assert!(Employee::new(1, "  ", "zhang@example.com", 1, 2)
            .validate_request()
            .is_err());
        assert!(Employee::new(1, "Zhang", "not-an-email", 1, 2)
            .validate_request()
            .is_err());
        assert!(Employee::new(1, "Zhang", "zhang@example.com", 5, 2)
            .validate_request()
            .is_err());
    }

    #[test]
    fn test_entity_id() {
        let employee = Employee::new(42, "Li", "li@example.com", 0, 1);
        assert_eq!(*employee.id(), 42);
    }
}
