//! Cache-layer error types.

use meridian_core::MeridianError;
use thiserror::Error;

/// Result type for cache-layer operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors.
///
/// None of these reach a caller of a cached operation at request time
/// except `Unavailable` when fail-open degradation is switched off.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Backend unreachable, timed out, or shut down.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// Decoded blob names a type that is not registered.
    #[error("Unknown type tag: {0}")]
    UnknownType(String),

    /// Key, condition or unless template that cannot be compiled for its context.
    #[error("Invalid expression `{expression}`: {message}")]
    KeyExpression { expression: String, message: String },

    /// Policy declaration that is structurally invalid (e.g. empty cache name).
    #[error("Invalid cache policy: {0}")]
    InvalidPolicy(String),

    /// Payload could not be converted to or from its wire form.
    #[error("Codec error: {0}")]
    Codec(String),
}

impl CacheError {
    /// Creates an expression error for `expression`.
    #[must_use]
    pub fn expression(expression: &str, message: impl Into<String>) -> Self {
        Self::KeyExpression {
            expression: expression.to_string(),
            message: message.into(),
        }
    }

    /// Returns true if a read hitting this error should be treated as a miss
    /// regardless of the fail-open setting.
    #[must_use]
    pub const fn is_decode_failure(&self) -> bool {
        matches!(self, Self::UnknownType(_) | Self::Codec(_))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::Unavailable(format!("Failed to get Redis connection: {}", err))
    }
}

impl From<deadpool_redis::redis::RedisError> for CacheError {
    fn from(err: deadpool_redis::redis::RedisError) -> Self {
        Self::Unavailable(format!("Redis command failed: {}", err))
    }
}

impl From<CacheError> for MeridianError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::KeyExpression { .. } | CacheError::InvalidPolicy(_) => {
                Self::Configuration(err.to_string())
            }
            CacheError::Unavailable(message) => Self::CacheUnavailable(message),
            CacheError::UnknownType(_) | CacheError::Codec(_) => Self::Cache(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_error_maps_to_configuration() {
        let err: MeridianError = CacheError::expression("#result.id", "not allowed").into();
        assert!(matches!(err, MeridianError::Configuration(_)));
        assert!(err.to_string().contains("#result.id"));
    }

    #[test]
    fn test_unavailable_maps_to_cache_unavailable() {
        let err: MeridianError = CacheError::Unavailable("down".to_string()).into();
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_decode_failures() {
        assert!(CacheError::UnknownType("x".to_string()).is_decode_failure());
        assert!(CacheError::Codec("x".to_string()).is_decode_failure());
        assert!(!CacheError::Unavailable("x".to_string()).is_decode_failure());
    }
}
