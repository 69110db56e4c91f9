//! Executes compiled policies around async operations.

use crate::codec::{CacheValue, SerializedValue, ValueCodec};
use crate::error::{CacheError, CacheResult};
use crate::expression::{EvaluationContext, Expression};
use crate::invocation::{InvocationArgs, OperationSignature};
use crate::key::{CacheKey, CacheName};
use crate::manager::CacheManager;
use crate::metrics::CacheMetrics;
use crate::policy::{
    references_result, CachePolicy, CompiledInvalidate, CompiledPolicy, CompiledRead,
};
use meridian_config::CacheConfig;
use meridian_core::{MeridianError, MeridianResult, TypeTagged};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// An operation signature bound to its validated policy.
#[derive(Debug, Clone)]
pub struct CachedOperation {
    signature: OperationSignature,
    policy: CompiledPolicy,
}

impl CachedOperation {
    /// Validates `policy` against `signature` and compiles every template.
    ///
    /// # Errors
    ///
    /// [`CacheError::KeyExpression`] for a template that does not parse or
    /// does not fit its evaluation phase, [`CacheError::InvalidPolicy`] for a
    /// structurally invalid declaration.
    pub fn register(
        signature: OperationSignature,
        policy: impl Into<CachePolicy>,
    ) -> CacheResult<Self> {
        let policy = policy.into().compile(&signature)?;
        debug!(
            "Registered caching policy for '{}' ({} read, {} write, {} invalidate)",
            signature.name(),
            policy.reads.len(),
            policy.writes.len(),
            policy.invalidations.len()
        );
        Ok(Self { signature, policy })
    }

    /// Returns the operation signature.
    #[must_use]
    pub fn signature(&self) -> &OperationSignature {
        &self.signature
    }

    fn has_post_actions(&self) -> bool {
        !self.policy.writes.is_empty()
            || self
                .policy
                .invalidations
                .iter()
                .any(|invalidate| !invalidate.before_invocation)
    }
}

/// Runs operations under their caching policies.
///
/// Cache-layer failures never change what the caller gets back: reads that
/// fail degrade to a miss (unless fail-open is disabled), writes and
/// evictions that fail are logged and dropped. Errors of the wrapped
/// operation are returned unchanged.
#[derive(Clone)]
pub struct CachingEngine {
    manager: Arc<CacheManager>,
    codec: Arc<dyn ValueCodec>,
    fail_open: bool,
}

impl CachingEngine {
    /// Creates a fail-open engine.
    #[must_use]
    pub fn new(manager: Arc<CacheManager>, codec: Arc<dyn ValueCodec>) -> Self {
        Self {
            manager,
            codec,
            fail_open: true,
        }
    }

    /// Creates an engine honoring `cache.fail_open`.
    #[must_use]
    pub fn from_config(
        config: &CacheConfig,
        manager: Arc<CacheManager>,
        codec: Arc<dyn ValueCodec>,
    ) -> Self {
        Self::new(manager, codec).with_fail_open(config.fail_open)
    }

    /// Sets whether store read failures degrade to a miss.
    #[must_use]
    pub const fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    /// Returns the cache manager.
    #[must_use]
    pub fn manager(&self) -> &Arc<CacheManager> {
        &self.manager
    }

    /// Runs `operation` under the policy of `op`.
    ///
    /// 1. Invalidations marked `before_invocation` run.
    /// 2. Each read-through whose condition holds is looked up in its caches;
    ///    the first hit is returned and `operation` is never called.
    /// 3. On a miss `operation` runs. Its error is returned as is.
    /// 4. The result is stored by every read-through whose `unless` is false
    ///    and every write-through whose condition holds and `unless` is false;
    ///    then the remaining invalidations run.
    ///
    /// A key template that evaluates to `null` skips its entry. When the
    /// result has no JSON form, every step that reads `#result` is skipped.
    pub async fn with_caching<T, F, Fut>(
        &self,
        op: &CachedOperation,
        args: InvocationArgs,
        operation: F,
    ) -> MeridianResult<T>
    where
        T: TypeTagged + Serialize + Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = MeridianResult<T>>,
    {
        let signature = &op.signature;
        let args = args.as_slice();
        if args.len() != signature.arity() {
            return Err(MeridianError::internal(format!(
                "'{}' expects {} argument(s), got {}",
                signature.name(),
                signature.arity(),
                args.len()
            )));
        }
        let ctx = EvaluationContext::new(signature.name(), args);

        for invalidate in op.policy.invalidations.iter().filter(|i| i.before_invocation) {
            self.invalidate(invalidate, &ctx, args, signature.name()).await;
        }

        let mut fills: Vec<(&CompiledRead, CacheKey)> = Vec::new();
        for read in &op.policy.reads {
            if !holds(read.condition.as_ref(), &ctx) {
                debug!("Condition false for '{}'; cache bypassed", signature.name());
                continue;
            }
            let Some(key) = read.key.evaluate(&ctx, args) else {
                for cache in &read.cache_names {
                    null_key(cache, signature.name());
                }
                continue;
            };
            for cache in &read.cache_names {
                if let Some(hit) = self.lookup::<T>(cache, &key).await? {
                    return Ok(hit);
                }
            }
            fills.push((read, key));
        }

        let result = operation().await?;

        if fills.is_empty() && !op.has_post_actions() {
            return Ok(result);
        }

        // without a JSON form, templates reading #result are skipped
        let result_json = match serde_json::to_value(&result) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!("Result of '{}' is not representable as JSON: {}", signature.name(), e);
                None
            }
        };
        let post_ctx = result_json.as_ref().map_or(ctx, |json| ctx.with_result(json));
        let blob = self.codec.encode(&CacheValue::new(result.clone()));

        for (read, key) in &fills {
            if !post_ctx.has_result() && references_result(read.unless.as_ref()) {
                skipped_without_result(&read.cache_names, signature.name());
                continue;
            }
            if vetoes(read.unless.as_ref(), &post_ctx) {
                debug!("Unless true for '{}'; result not cached", signature.name());
                continue;
            }
            for cache in &read.cache_names {
                self.store_entry(cache, key, &blob, read.ttl).await;
            }
        }

        for write in &op.policy.writes {
            if !holds(write.condition.as_ref(), &ctx) {
                continue;
            }
            let needs_result =
                write.key.references_result() || references_result(write.unless.as_ref());
            if needs_result && !post_ctx.has_result() {
                skipped_without_result(std::slice::from_ref(&write.cache_name), signature.name());
                continue;
            }
            if vetoes(write.unless.as_ref(), &post_ctx) {
                continue;
            }
            let Some(key) = write.key.evaluate(&post_ctx, args) else {
                null_key(&write.cache_name, signature.name());
                continue;
            };
            self.store_entry(&write.cache_name, &key, &blob, write.ttl).await;
        }

        for invalidate in op.policy.invalidations.iter().filter(|i| !i.before_invocation) {
            let needs_result = !invalidate.all_entries && invalidate.key.references_result();
            if needs_result && !post_ctx.has_result() {
                skipped_without_result(
                    std::slice::from_ref(&invalidate.cache_name),
                    signature.name(),
                );
                continue;
            }
            self.invalidate(invalidate, &post_ctx, args, signature.name()).await;
        }

        Ok(result)
    }

    async fn lookup<T>(&self, cache: &CacheName, key: &CacheKey) -> MeridianResult<Option<T>>
    where
        T: TypeTagged + Clone + 'static,
    {
        let store = match self.manager.get_or_create_store(cache) {
            Ok(store) => store,
            Err(e) => return self.read_failure(cache, e),
        };

        let blob = match store.get(key).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                CacheMetrics::miss(cache.as_str());
                debug!("Cache miss: {}::{}", cache, key);
                return Ok(None);
            }
            Err(e) => return self.read_failure(cache, e),
        };

        let value = match self.codec.decode(&blob) {
            Ok(value) => value,
            Err(e) if !e.is_decode_failure() => return self.read_failure(cache, e),
            Err(e) => {
                CacheMetrics::error(cache.as_str(), "decode");
                CacheMetrics::miss(cache.as_str());
                warn!("Undecodable entry {}::{} treated as miss: {}", cache, key, e);
                return Ok(None);
            }
        };

        match value.downcast_ref::<T>() {
            Some(hit) => {
                CacheMetrics::hit(cache.as_str());
                debug!("Cache hit: {}::{}", cache, key);
                Ok(Some(hit.clone()))
            }
            None => {
                CacheMetrics::error(cache.as_str(), "decode");
                CacheMetrics::miss(cache.as_str());
                warn!(
                    "Entry {}::{} holds a {}, expected {}; treated as miss",
                    cache,
                    key,
                    value.type_tag(),
                    T::TYPE_TAG
                );
                Ok(None)
            }
        }
    }

    fn read_failure<T>(&self, cache: &CacheName, err: CacheError) -> MeridianResult<Option<T>> {
        CacheMetrics::error(cache.as_str(), "get");
        if !self.fail_open {
            return Err(err.into());
        }
        CacheMetrics::miss(cache.as_str());
        warn!("Cache '{}' read failed, treated as miss: {}", cache, err);
        Ok(None)
    }

    async fn store_entry(
        &self,
        cache: &CacheName,
        key: &CacheKey,
        blob: &CacheResult<SerializedValue>,
        ttl: Option<Duration>,
    ) {
        let blob = match blob {
            Ok(blob) => blob.clone(),
            Err(e) => {
                CacheMetrics::error(cache.as_str(), "encode");
                warn!("Not caching {}::{}: {}", cache, key, e);
                return;
            }
        };

        let outcome = match self.manager.get_or_create_store(cache) {
            Ok(store) => store.put(key, blob, ttl).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => {
                CacheMetrics::put(cache.as_str());
                debug!("Cached {}::{}", cache, key);
            }
            Err(e) => {
                CacheMetrics::error(cache.as_str(), "put");
                warn!("Failed to cache {}::{}: {}", cache, key, e);
            }
        }
    }

    async fn invalidate(
        &self,
        invalidate: &CompiledInvalidate,
        ctx: &EvaluationContext<'_>,
        args: &[Value],
        operation: &str,
    ) {
        if !holds(invalidate.condition.as_ref(), ctx) {
            return;
        }
        let cache = &invalidate.cache_name;
        let store = match self.manager.get_or_create_store(cache) {
            Ok(store) => store,
            Err(e) => {
                CacheMetrics::error(cache.as_str(), "evict");
                warn!("Failed to invalidate cache '{}': {}", cache, e);
                return;
            }
        };

        let (op, outcome) = if invalidate.all_entries {
            ("clear", store.clear().await)
        } else {
            let Some(key) = invalidate.key.evaluate(ctx, args) else {
                null_key(cache, operation);
                return;
            };
            debug!("Evicting {}::{}", cache, key);
            ("evict", store.evict(&key).await)
        };
        match outcome {
            Ok(()) => CacheMetrics::eviction(cache.as_str()),
            Err(e) => {
                CacheMetrics::error(cache.as_str(), op);
                warn!("Failed to {} cache '{}': {}", op, cache, e);
            }
        }
    }
}

fn null_key(cache: &CacheName, operation: &str) {
    CacheMetrics::error(cache.as_str(), "key");
    warn!("Key for cache '{}' on '{}' evaluated to null; entry skipped", cache, operation);
}

fn skipped_without_result(caches: &[CacheName], operation: &str) {
    for cache in caches {
        CacheMetrics::error(cache.as_str(), "encode");
        warn!("Skipped cache '{}' on '{}': '#result' is unavailable", cache, operation);
    }
}

/// An absent condition holds.
fn holds(condition: Option<&Expression>, ctx: &EvaluationContext<'_>) -> bool {
    condition.map_or(true, |expression| expression.evaluate_predicate(ctx))
}

/// An absent `unless` never vetoes.
fn vetoes(unless: Option<&Expression>, ctx: &EvaluationContext<'_>) -> bool {
    unless.is_some_and(|expression| expression.evaluate_predicate(ctx))
}
