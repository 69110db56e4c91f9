//! Type-preserving JSON codec.
//!
//! Every stored blob carries the concrete type tag of the value next to its
//! payload:
//!
//! ```json
//! {"@type": "meridian.domain.Employee", "@payload": {"id": 1, "lastName": "A"}}
//! ```
//!
//! The array form `["meridian.domain.Employee", {...}]` is accepted on read.
//! Tags are resolved through a [`TypeRegistry`] populated at startup, so the
//! set of types that can come back out of a store is explicit and auditable.

use crate::error::{CacheError, CacheResult};
use meridian_core::TypeTagged;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Field holding the type tag in the object wire form.
pub const TYPE_FIELD: &str = "@type";

/// Field holding the payload in the object wire form.
pub const PAYLOAD_FIELD: &str = "@payload";

/// A self-describing blob as it sits in a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerializedValue(String);

impl SerializedValue {
    /// Wraps raw wire text.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the wire text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value and returns the wire text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SerializedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SerializedValue {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// A decoded value of some registered concrete type.
///
/// Cloning is cheap; the value itself is shared.
#[derive(Clone)]
pub struct CacheValue {
    type_tag: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl CacheValue {
    /// Wraps a value, recording its concrete type tag.
    pub fn new<T>(value: T) -> Self
    where
        T: TypeTagged + Send + Sync + 'static,
    {
        Self {
            type_tag: T::TYPE_TAG,
            value: Arc::new(value),
        }
    }

    /// Returns the concrete type tag.
    #[must_use]
    pub const fn type_tag(&self) -> &'static str {
        self.type_tag
    }

    /// Returns the value if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns true if the value is a `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self.value.as_ref()
    }
}

impl fmt::Debug for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheValue")
            .field("type_tag", &self.type_tag)
            .finish_non_exhaustive()
    }
}

type EncodeFn = fn(&(dyn Any + Send + Sync)) -> CacheResult<Value>;
type DecodeFn = fn(Value) -> CacheResult<CacheValue>;

#[derive(Clone, Copy)]
struct TypeEntry {
    type_id: TypeId,
    encode: EncodeFn,
    decode: DecodeFn,
}

fn encode_erased<T>(value: &(dyn Any + Send + Sync)) -> CacheResult<Value>
where
    T: TypeTagged + Serialize + 'static,
{
    let value = value.downcast_ref::<T>().ok_or_else(|| {
        CacheError::Codec(format!("value is not a {}", T::TYPE_TAG))
    })?;
    Ok(serde_json::to_value(value)?)
}

fn decode_erased<T>(payload: Value) -> CacheResult<CacheValue>
where
    T: TypeTagged + DeserializeOwned + Send + Sync + 'static,
{
    let value: T = serde_json::from_value(payload)?;
    Ok(CacheValue::new(value))
}

/// Maps type tags to the encode/decode functions of their concrete types.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    entries: HashMap<&'static str, TypeEntry>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the scalar types every process needs.
    #[must_use]
    pub fn with_std_types() -> Self {
        let mut registry = Self::new();
        registry.insert::<String>();
        registry.insert::<i32>();
        registry.insert::<i64>();
        registry.insert::<bool>();
        registry
    }

    /// Registers `T` under its type tag.
    ///
    /// Registering the same type twice is a no-op. Registering a different
    /// type under an existing tag is rejected.
    pub fn register<T>(&mut self) -> CacheResult<()>
    where
        T: TypeTagged + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        if let Some(existing) = self.entries.get(T::TYPE_TAG) {
            if existing.type_id == TypeId::of::<T>() {
                return Ok(());
            }
            return Err(CacheError::Codec(format!(
                "type tag '{}' is already registered for a different type",
                T::TYPE_TAG
            )));
        }
        self.insert::<T>();
        debug!("Registered cache type '{}'", T::TYPE_TAG);
        Ok(())
    }

    fn insert<T>(&mut self)
    where
        T: TypeTagged + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.entries.insert(
            T::TYPE_TAG,
            TypeEntry {
                type_id: TypeId::of::<T>(),
                encode: encode_erased::<T>,
                decode: decode_erased::<T>,
            },
        );
    }

    /// Returns true if `tag` is registered.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Returns the registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.entries.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    fn entry(&self, tag: &str) -> CacheResult<&TypeEntry> {
        self.entries
            .get(tag)
            .ok_or_else(|| CacheError::UnknownType(tag.to_string()))
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

/// Converts values to and from their stored form.
pub trait ValueCodec: Send + Sync {
    /// Encodes a value together with its concrete type tag.
    fn encode(&self, value: &CacheValue) -> CacheResult<SerializedValue>;

    /// Decodes a blob back into a value of the type its tag names.
    ///
    /// Fails with [`CacheError::UnknownType`] when the tag is not registered.
    fn decode(&self, blob: &SerializedValue) -> CacheResult<CacheValue>;
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "@type")]
    type_tag: String,
    #[serde(rename = "@payload")]
    payload: Value,
}

/// JSON codec writing the `{"@type", "@payload"}` envelope.
#[derive(Debug, Clone)]
pub struct JsonCodec {
    registry: Arc<TypeRegistry>,
}

impl JsonCodec {
    /// Creates a codec over a populated registry.
    #[must_use]
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Returns the registry backing this codec.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn split_envelope(raw: Value) -> CacheResult<(String, Value)> {
        match raw {
            Value::Object(_) => {
                let envelope: Envelope = serde_json::from_value(raw)?;
                Ok((envelope.type_tag, envelope.payload))
            }
            Value::Array(mut items) if items.len() == 2 => {
                let payload = items.pop().unwrap_or(Value::Null);
                match items.pop() {
                    Some(Value::String(tag)) => Ok((tag, payload)),
                    _ => Err(CacheError::Codec(
                        "array form must start with a type tag".to_string(),
                    )),
                }
            }
            _ => Err(CacheError::Codec(format!(
                "expected a type-tagged document with '{}' and '{}'",
                TYPE_FIELD, PAYLOAD_FIELD
            ))),
        }
    }
}

impl ValueCodec for JsonCodec {
    fn encode(&self, value: &CacheValue) -> CacheResult<SerializedValue> {
        let entry = self.registry.entry(value.type_tag())?;
        let payload = (entry.encode)(value.as_any())?;
        let envelope = Envelope {
            type_tag: value.type_tag().to_string(),
            payload,
        };
        Ok(SerializedValue(serde_json::to_string(&envelope)?))
    }

    fn decode(&self, blob: &SerializedValue) -> CacheResult<CacheValue> {
        let raw: Value = serde_json::from_str(blob.as_str())?;
        let (tag, payload) = Self::split_envelope(raw)?;
        let entry = self.registry.entry(&tag)?;
        (entry.decode)(payload)
    }
}
