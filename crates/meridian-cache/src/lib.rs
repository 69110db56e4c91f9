//! # Meridian Cache
//!
//! Declarative caching policies for arbitrary async operations.
//!
//! ```text
//! caller ─▶ CachingEngine::with_caching(op, args, body)
//!             │  Expression (keys, condition, unless)
//!             ▼
//!           CacheManager ─▶ CacheStore (Redis | in-memory)
//!             │                 ▲
//!             └── ValueCodec ───┘  type-tagged JSON
//! ```
//!
//! Policies are plain values ([`ReadThrough`], [`WriteThrough`],
//! [`Invalidate`], [`Composite`]) compiled against an
//! [`OperationSignature`] once, at registration. Malformed templates are
//! rejected there and never at request time.

pub mod codec;
pub mod engine;
pub mod error;
pub mod expression;
pub mod invocation;
pub mod key;
pub mod manager;
pub mod metrics;
pub mod policy;
pub mod store;

pub use codec::{CacheValue, JsonCodec, SerializedValue, TypeRegistry, ValueCodec};
pub use engine::{CachedOperation, CachingEngine};
pub use error::{CacheError, CacheResult};
pub use expression::{EvaluationContext, Expression, Phase};
pub use invocation::{InvocationArgs, OperationSignature};
pub use key::{CacheKey, CacheName};
pub use manager::{CacheManager, MemoryStoreFactory, RedisStoreFactory, StoreFactory, StoreSettings};
pub use policy::{CachePolicy, Composite, Invalidate, ReadThrough, WriteThrough};
pub use store::{CacheStore, InMemoryCacheStore, RedisCacheStore};
