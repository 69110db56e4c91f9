//! Operation signatures and invocation arguments.

use crate::error::{CacheError, CacheResult};
use serde::Serialize;
use serde_json::Value;

/// Name and ordered parameter names of a cached operation.
///
/// Key templates are validated against this when a policy is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSignature {
    name: String,
    params: Vec<String>,
}

impl OperationSignature {
    /// Creates a signature.
    pub fn new<I, S>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parameter names in declaration order.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Returns the position of a named parameter.
    #[must_use]
    pub fn position(&self, param: &str) -> Option<usize> {
        self.params.iter().position(|p| p == param)
    }
}

/// The arguments of one invocation, as JSON values in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationArgs {
    values: Vec<Value>,
}

impl InvocationArgs {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument.
    pub fn with<T: Serialize + ?Sized>(mut self, value: &T) -> CacheResult<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| CacheError::Codec(format!("argument {}: {}", self.values.len(), e)))?;
        self.values.push(value);
        Ok(self)
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the arguments.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }
}

impl From<Vec<Value>> for InvocationArgs {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signature_positions() {
        let signature = OperationSignature::new("get_emp_by_last_name", ["lastName"]);
        assert_eq!(signature.arity(), 1);
        assert_eq!(signature.position("lastName"), Some(0));
        assert_eq!(signature.position("id"), None);
    }

    #[test]
    fn test_args_builder() {
        let args = InvocationArgs::new().with(&1).unwrap().with("Zhang").unwrap();
        assert_eq!(args.as_slice(), &[json!(1), json!("Zhang")]);
        assert_eq!(args.len(), 2);
    }
}
