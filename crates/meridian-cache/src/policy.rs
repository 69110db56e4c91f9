//! Declarative caching policies.
//!
//! A policy is a plain value built next to the operation it describes and
//! compiled once by [`CachedOperation::register`](crate::CachedOperation::register).

use crate::error::{CacheError, CacheResult};
use crate::expression::{EvaluationContext, Expression, Phase};
use crate::invocation::OperationSignature;
use crate::key::{CacheKey, CacheName};
use std::time::Duration;

/// Serve from cache when possible, fill on miss.
#[derive(Debug, Clone, Default)]
pub struct ReadThrough {
    cache_names: Vec<String>,
    key: Option<String>,
    condition: Option<String>,
    unless: Option<String>,
    ttl: Option<Duration>,
}

impl ReadThrough {
    /// Reads from and fills every named cache.
    pub fn new<I, S>(cache_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cache_names: cache_names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Key template; without one the default argument key is used.
    #[must_use]
    pub fn key(mut self, template: impl Into<String>) -> Self {
        self.key = Some(template.into());
        self
    }

    /// Pre-invocation predicate; when false the cache is bypassed entirely.
    #[must_use]
    pub fn condition(mut self, template: impl Into<String>) -> Self {
        self.condition = Some(template.into());
        self
    }

    /// Post-invocation predicate on `#result`; when true the result is not stored.
    #[must_use]
    pub fn unless(mut self, template: impl Into<String>) -> Self {
        self.unless = Some(template.into());
        self
    }

    /// TTL for entries this policy writes.
    #[must_use]
    pub const fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Always run the operation, then store its result.
#[derive(Debug, Clone, Default)]
pub struct WriteThrough {
    cache_name: String,
    key: Option<String>,
    condition: Option<String>,
    unless: Option<String>,
    ttl: Option<Duration>,
}

impl WriteThrough {
    /// Writes into `cache_name`.
    pub fn new(cache_name: impl Into<String>) -> Self {
        Self {
            cache_name: cache_name.into(),
            ..Self::default()
        }
    }

    /// Key template; may read `#result`.
    #[must_use]
    pub fn key(mut self, template: impl Into<String>) -> Self {
        self.key = Some(template.into());
        self
    }

    /// Pre-invocation predicate; when false nothing is written.
    #[must_use]
    pub fn condition(mut self, template: impl Into<String>) -> Self {
        self.condition = Some(template.into());
        self
    }

    /// Post-invocation predicate; when true nothing is written.
    #[must_use]
    pub fn unless(mut self, template: impl Into<String>) -> Self {
        self.unless = Some(template.into());
        self
    }

    /// TTL for the written entry.
    #[must_use]
    pub const fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Evict one key or the whole cache around the operation.
#[derive(Debug, Clone, Default)]
pub struct Invalidate {
    cache_name: String,
    key: Option<String>,
    condition: Option<String>,
    all_entries: bool,
    before_invocation: bool,
}

impl Invalidate {
    /// Evicts from `cache_name` after the operation succeeds.
    pub fn new(cache_name: impl Into<String>) -> Self {
        Self {
            cache_name: cache_name.into(),
            ..Self::default()
        }
    }

    /// Key template; may read `#result` unless evicting before invocation.
    #[must_use]
    pub fn key(mut self, template: impl Into<String>) -> Self {
        self.key = Some(template.into());
        self
    }

    /// Pre-invocation predicate; when false nothing is evicted.
    #[must_use]
    pub fn condition(mut self, template: impl Into<String>) -> Self {
        self.condition = Some(template.into());
        self
    }

    /// Clear the whole cache instead of one key.
    #[must_use]
    pub const fn all_entries(mut self) -> Self {
        self.all_entries = true;
        self
    }

    /// Evict before the operation runs, whether or not it then succeeds.
    #[must_use]
    pub const fn before_invocation(mut self) -> Self {
        self.before_invocation = true;
        self
    }
}

/// Several policies on one operation.
///
/// Read-throughs gate whether the operation runs; when it runs, every
/// write-through is applied to its result. Invalidations run before or after
/// per their own setting.
#[derive(Debug, Clone, Default)]
pub struct Composite {
    read_through: Vec<ReadThrough>,
    write_through: Vec<WriteThrough>,
    invalidate: Vec<Invalidate>,
}

impl Composite {
    /// Creates an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a read-through.
    #[must_use]
    pub fn read_through(mut self, policy: ReadThrough) -> Self {
        self.read_through.push(policy);
        self
    }

    /// Adds a write-through.
    #[must_use]
    pub fn write_through(mut self, policy: WriteThrough) -> Self {
        self.write_through.push(policy);
        self
    }

    /// Adds an invalidation.
    #[must_use]
    pub fn invalidate(mut self, policy: Invalidate) -> Self {
        self.invalidate.push(policy);
        self
    }
}

/// The policy attached to one operation.
#[derive(Debug, Clone)]
pub enum CachePolicy {
    ReadThrough(ReadThrough),
    WriteThrough(WriteThrough),
    Invalidate(Invalidate),
    Composite(Composite),
}

impl From<ReadThrough> for CachePolicy {
    fn from(policy: ReadThrough) -> Self {
        Self::ReadThrough(policy)
    }
}

impl From<WriteThrough> for CachePolicy {
    fn from(policy: WriteThrough) -> Self {
        Self::WriteThrough(policy)
    }
}

impl From<Invalidate> for CachePolicy {
    fn from(policy: Invalidate) -> Self {
        Self::Invalidate(policy)
    }
}

impl From<Composite> for CachePolicy {
    fn from(policy: Composite) -> Self {
        Self::Composite(policy)
    }
}

// ---------------------------------------------------------------------------
// Compiled form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) enum KeyTemplate {
    Default,
    Expression(Expression),
}

impl KeyTemplate {
    fn compile(
        template: Option<&str>,
        signature: &OperationSignature,
        phase: Phase,
    ) -> CacheResult<Self> {
        match template {
            None => Ok(Self::Default),
            Some(source) => Expression::compile(source, signature, phase).map(Self::Expression),
        }
    }

    /// Returns `None` when a template evaluates to `null`.
    pub(crate) fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        args: &[serde_json::Value],
    ) -> Option<CacheKey> {
        match self {
            Self::Default => Some(CacheKey::from_args(args)),
            Self::Expression(expression) => expression.evaluate_key(ctx),
        }
    }

    pub(crate) const fn references_result(&self) -> bool {
        match self {
            Self::Default => false,
            Self::Expression(expression) => expression.references_result(),
        }
    }
}

/// True if an optional template reads `#result`.
pub(crate) fn references_result(template: Option<&Expression>) -> bool {
    template.is_some_and(Expression::references_result)
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledRead {
    pub(crate) cache_names: Vec<CacheName>,
    pub(crate) key: KeyTemplate,
    pub(crate) condition: Option<Expression>,
    pub(crate) unless: Option<Expression>,
    pub(crate) ttl: Option<Duration>,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledWrite {
    pub(crate) cache_name: CacheName,
    pub(crate) key: KeyTemplate,
    pub(crate) condition: Option<Expression>,
    pub(crate) unless: Option<Expression>,
    pub(crate) ttl: Option<Duration>,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledInvalidate {
    pub(crate) cache_name: CacheName,
    pub(crate) key: KeyTemplate,
    pub(crate) condition: Option<Expression>,
    pub(crate) all_entries: bool,
    pub(crate) before_invocation: bool,
}

/// Every policy normalized to one shape.
#[derive(Debug, Clone, Default)]
pub(crate) struct CompiledPolicy {
    pub(crate) reads: Vec<CompiledRead>,
    pub(crate) writes: Vec<CompiledWrite>,
    pub(crate) invalidations: Vec<CompiledInvalidate>,
}

fn compile_optional(
    template: Option<&str>,
    signature: &OperationSignature,
    phase: Phase,
) -> CacheResult<Option<Expression>> {
    template
        .map(|source| Expression::compile(source, signature, phase))
        .transpose()
}

impl ReadThrough {
    fn compile(&self, signature: &OperationSignature) -> CacheResult<CompiledRead> {
        if self.cache_names.is_empty() {
            return Err(CacheError::InvalidPolicy(format!(
                "read-through on '{}' names no cache",
                signature.name()
            )));
        }
        Ok(CompiledRead {
            cache_names: self
                .cache_names
                .iter()
                .map(CacheName::new)
                .collect::<CacheResult<_>>()?,
            key: KeyTemplate::compile(self.key.as_deref(), signature, Phase::BeforeInvocation)?,
            condition: compile_optional(
                self.condition.as_deref(),
                signature,
                Phase::BeforeInvocation,
            )?,
            unless: compile_optional(
                self.unless.as_deref(),
                signature,
                Phase::AfterInvocation,
            )?,
            ttl: self.ttl,
        })
    }
}

impl WriteThrough {
    fn compile(&self, signature: &OperationSignature) -> CacheResult<CompiledWrite> {
        Ok(CompiledWrite {
            cache_name: CacheName::new(&self.cache_name)?,
            key: KeyTemplate::compile(self.key.as_deref(), signature, Phase::AfterInvocation)?,
            condition: compile_optional(
                self.condition.as_deref(),
                signature,
                Phase::BeforeInvocation,
            )?,
            unless: compile_optional(
                self.unless.as_deref(),
                signature,
                Phase::AfterInvocation,
            )?,
            ttl: self.ttl,
        })
    }
}

impl Invalidate {
    fn compile(&self, signature: &OperationSignature) -> CacheResult<CompiledInvalidate> {
        let key_phase = if self.before_invocation {
            Phase::BeforeInvocation
        } else {
            Phase::AfterInvocation
        };
        if self.all_entries && self.key.is_some() {
            return Err(CacheError::InvalidPolicy(format!(
                "invalidation of '{}' on '{}' sets both a key and all_entries",
                self.cache_name,
                signature.name()
            )));
        }
        Ok(CompiledInvalidate {
            cache_name: CacheName::new(&self.cache_name)?,
            key: KeyTemplate::compile(self.key.as_deref(), signature, key_phase)?,
            condition: compile_optional(
                self.condition.as_deref(),
                signature,
                Phase::BeforeInvocation,
            )?,
            all_entries: self.all_entries,
            before_invocation: self.before_invocation,
        })
    }
}

impl CachePolicy {
    pub(crate) fn compile(&self, signature: &OperationSignature) -> CacheResult<CompiledPolicy> {
        let mut compiled = CompiledPolicy::default();
        match self {
            Self::ReadThrough(read) => compiled.reads.push(read.compile(signature)?),
            Self::WriteThrough(write) => compiled.writes.push(write.compile(signature)?),
            Self::Invalidate(invalidate) => {
                compiled.invalidations.push(invalidate.compile(signature)?);
            }
            Self::Composite(composite) => {
                if composite.read_through.is_empty()
                    && composite.write_through.is_empty()
                    && composite.invalidate.is_empty()
                {
                    return Err(CacheError::InvalidPolicy(format!(
                        "composite policy on '{}' is empty",
                        signature.name()
                    )));
                }
                for read in &composite.read_through {
                    compiled.reads.push(read.compile(signature)?);
                }
                for write in &composite.write_through {
                    compiled.writes.push(write.compile(signature)?);
                }
                for invalidate in &composite.invalidate {
                    compiled.invalidations.push(invalidate.compile(signature)?);
                }
            }
        }
        Ok(compiled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_id() -> OperationSignature {
        OperationSignature::new("get_emp", ["id"])
    }

    #[test]
    fn test_read_through_rejects_result_key() {
        let policy = CachePolicy::from(ReadThrough::new(["emp"]).key("#result.id"));
        assert!(matches!(
            policy.compile(&by_id()),
            Err(CacheError::KeyExpression { .. })
        ));
    }

    #[test]
    fn test_read_through_condition_is_pre_invocation() {
        let policy = CachePolicy::from(ReadThrough::new(["emp"]).condition("#result != null"));
        assert!(policy.compile(&by_id()).is_err());
    }

    #[test]
    fn test_read_through_unless_may_read_result() {
        let policy = CachePolicy::from(ReadThrough::new(["emp"]).unless("#result == null"));
        let compiled = policy.compile(&by_id()).unwrap();
        assert_eq!(compiled.reads.len(), 1);
        assert!(compiled.reads[0].unless.is_some());
    }

    #[test]
    fn test_write_through_key_may_read_result() {
        let signature = OperationSignature::new("update_emp", ["employee"]);
        let policy = CachePolicy::from(WriteThrough::new("emp").key("#result.id"));
        assert!(policy.compile(&signature).is_ok());
    }

    #[test]
    fn test_invalidate_key_phase_follows_timing() {
        let after = CachePolicy::from(Invalidate::new("emp").key("#result.id"));
        assert!(after.compile(&by_id()).is_ok());

        let before = CachePolicy::from(
            Invalidate::new("emp")
                .key("#result.id")
                .before_invocation(),
        );
        assert!(before.compile(&by_id()).is_err());
    }

    #[test]
    fn test_rejects_empty_cache_names() {
        assert!(CachePolicy::from(ReadThrough::new(Vec::<String>::new()))
            .compile(&by_id())
            .is_err());
        assert!(CachePolicy::from(ReadThrough::new([""]))
            .compile(&by_id())
            .is_err());
        assert!(CachePolicy::from(WriteThrough::new(" ")).compile(&by_id()).is_err());
        assert!(CachePolicy::from(Composite::new()).compile(&by_id()).is_err());
    }

    #[test]
    fn test_rejects_key_with_all_entries() {
        let policy = CachePolicy::from(Invalidate::new("emp").key("#id").all_entries());
        assert!(matches!(
            policy.compile(&by_id()),
            Err(CacheError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_composite_normalizes() {
        let signature = OperationSignature::new("get_emp_by_last_name", ["lastName"]);
        let policy = CachePolicy::from(
            Composite::new()
                .read_through(ReadThrough::new(["emp"]).key("#lastName"))
                .write_through(WriteThrough::new("emp").key("#result.id"))
                .write_through(WriteThrough::new("emp").key("#result.email")),
        );
        let compiled = policy.compile(&signature).unwrap();
        assert_eq!(compiled.reads.len(), 1);
        assert_eq!(compiled.writes.len(), 2);
        assert!(compiled.invalidations.is_empty());
    }

    #[test]
    fn test_composite_validates_every_entry() {
        let signature = OperationSignature::new("get_emp_by_last_name", ["lastName"]);
        let policy = CachePolicy::from(
            Composite::new()
                .read_through(ReadThrough::new(["emp"]).key("#lastName"))
                .write_through(WriteThrough::new("emp").key("#result.id"))
                .write_through(WriteThrough::new("emp").key("#email")),
        );
        assert!(policy.compile(&signature).is_err());
    }
}
