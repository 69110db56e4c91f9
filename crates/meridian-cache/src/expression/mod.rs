//! Key and predicate templates.
//!
//! A small fixed grammar, compiled once per policy against the operation's
//! [`OperationSignature`]:
//!
//! | form | meaning |
//! |---|---|
//! | `#arg[N]`, `#aN`, `#pN`, `#root.args[N]` | N-th argument |
//! | `#name` | argument by parameter name |
//! | `#result` | the operation's return value (post-invocation only) |
//! | `#root.methodName` | the operation name |
//! | `.field`, `[N]` | field / element access, `null` when absent |
//! | `'text'`, `1`, `1.5`, `true`, `false`, `null` | literals |
//! | `+` | numeric add, otherwise string concatenation |
//! | `== != > >= < <=`, `eq ne gt ge lt le` | comparison |
//! | `and &&`, `or \|\|`, `not !`, `( )` | logic |

mod eval;
mod lexer;
mod parser;

use crate::error::{CacheError, CacheResult};
use crate::invocation::OperationSignature;
use crate::key::CacheKey;
use serde_json::Value;
use std::fmt;

/// When, relative to the wrapped operation, a template is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before the operation runs; `#result` is not available.
    BeforeInvocation,
    /// After the operation returned successfully.
    AfterInvocation,
}

/// Values a template can read during one invocation.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    method_name: &'a str,
    args: &'a [Value],
    result: Option<&'a Value>,
}

impl<'a> EvaluationContext<'a> {
    /// Creates a pre-invocation context.
    #[must_use]
    pub const fn new(method_name: &'a str, args: &'a [Value]) -> Self {
        Self {
            method_name,
            args,
            result: None,
        }
    }

    /// Returns true if `#result` is readable.
    #[must_use]
    pub const fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// Returns a copy of this context that can read `result`.
    #[must_use]
    pub const fn with_result(self, result: &'a Value) -> Self {
        Self {
            result: Some(result),
            ..self
        }
    }
}

/// A compiled template.
#[derive(Clone)]
pub struct Expression {
    source: String,
    root: parser::Node,
    reads_result: bool,
}

impl Expression {
    /// Parses and validates `source` for an operation and evaluation phase.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::KeyExpression`] on a syntax error, an unknown
    /// parameter name, an out-of-range argument index, or `#result` in a
    /// [`Phase::BeforeInvocation`] template.
    pub fn compile(
        source: &str,
        signature: &OperationSignature,
        phase: Phase,
    ) -> CacheResult<Self> {
        let tokens = lexer::tokenize(source).map_err(|e| CacheError::expression(source, e))?;
        let mut root = parser::parse(tokens).map_err(|e| CacheError::expression(source, e))?;
        parser::resolve(&mut root, signature).map_err(|e| CacheError::expression(source, e))?;

        let reads_result = parser::references_result(&root);
        if reads_result && phase == Phase::BeforeInvocation {
            return Err(CacheError::expression(
                source,
                format!(
                    "'#result' is not available before '{}' runs",
                    signature.name()
                ),
            ));
        }

        Ok(Self {
            source: source.to_string(),
            root,
            reads_result,
        })
    }

    /// Returns the template text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns true if the template reads `#result`.
    #[must_use]
    pub const fn references_result(&self) -> bool {
        self.reads_result
    }

    /// Evaluates to a JSON value; absent references yield `null`.
    #[must_use]
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Value {
        eval::evaluate(&self.root, ctx)
    }

    /// Evaluates and renders the value as a cache key.
    ///
    /// Returns `None` when the template evaluates to `null`; such a key
    /// would collide with the string argument `"null"`.
    #[must_use]
    pub fn evaluate_key(&self, ctx: &EvaluationContext<'_>) -> Option<CacheKey> {
        match self.evaluate(ctx) {
            Value::Null => None,
            value => Some(CacheKey::from_value(&value)),
        }
    }

    /// Evaluates as a predicate.
    #[must_use]
    pub fn evaluate_predicate(&self, ctx: &EvaluationContext<'_>) -> bool {
        eval::truthy(&self.evaluate(ctx))
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expression").field(&self.source).finish()
    }
}
