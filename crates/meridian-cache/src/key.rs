//! Cache names and keys.

use crate::error::{CacheError, CacheResult};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Key used when an operation without arguments has no key template.
pub const EMPTY_KEY: &str = "SimpleKey []";

const COMPOSITE_KEY_PREFIX: &str = "SimpleKey ";

/// A non-empty logical cache partition name, e.g. `emp`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheName(Arc<str>);

impl CacheName {
    /// Creates a cache name, rejecting blank names.
    pub fn new(name: impl AsRef<str>) -> CacheResult<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(CacheError::InvalidPolicy(
                "cache name must not be empty".to_string(),
            ));
        }
        Ok(Self(Arc::from(name)))
    }

    /// Returns the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An opaque key within one cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Creates a key from its rendered form.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The constant key of zero-argument operations.
    #[must_use]
    pub fn empty() -> Self {
        Self(EMPTY_KEY.to_string())
    }

    /// Renders a single value: strings verbatim, everything else as compact JSON.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self(render(value))
    }

    /// Builds the key used when a policy declares no key template.
    ///
    /// One non-null argument renders as itself; several (or a lone `null`)
    /// become `SimpleKey [a,b,..]` in argument order; none yield [`EMPTY_KEY`].
    #[must_use]
    pub fn from_args(args: &[Value]) -> Self {
        match args {
            [] => Self::empty(),
            [single] if !single.is_null() => Self::from_value(single),
            many => Self(format!("{}{}", COMPOSITE_KEY_PREFIX, Value::from(many.to_vec()))),
        }
    }

    /// Returns the rendered key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
