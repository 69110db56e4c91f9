//! Validation utilities.

use crate::{FieldError, MeridianError};
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `MeridianError` on failure.
    fn validate_request(&self) -> Result<(), MeridianError> {
        self.validate().map_err(validation_errors_to_meridian_error)
    }
}

impl<T: Validate> ValidateExt for T {}

/// Flattens `validator::ValidationErrors` into field errors.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: (*field).to_string(),
                message: error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), |m| m.to_string()),
                code: error.code.to_string(),
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

/// Converts `validator::ValidationErrors` to `MeridianError`.
#[must_use]
pub fn validation_errors_to_meridian_error(errors: ValidationErrors) -> MeridianError {
    let message = field_errors(&errors)
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    MeridianError::Validation(message)
}

/// Common validation functions.
pub mod rules {
    use validator::ValidationError;

    /// Validates that a string is not blank (not empty after trimming).
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("not_blank"));
        }
        Ok(())
    }

    /// Validates the gender code stored by the employee table (0 or 1).
    pub fn gender_code(value: impl std::borrow::Borrow<i32>) -> Result<(), ValidationError> {
        let value: &i32 = value.borrow();
        if *value == 0 || *value == 1 {
            Ok(())
        } else {
            Err(ValidationError::new("gender_code"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(rules::not_blank("hello").is_ok());
        assert!(rules::not_blank("   ").is_err());
        assert!(rules::not_blank("").is_err());
    }

    #[test]
    fn test_gender_code() {
        assert!(rules::gender_code(&0).is_ok());
        assert!(rules::gender_code(&1).is_ok());
        assert!(rules::gender_code(&2).is_err());
    }
}
