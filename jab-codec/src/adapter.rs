//! Adapter contracts, registrations and their classification
//!
//! Adapters replace the engine's default handling of one type. Each one is
//! registered explicitly with a target type and a locality:
//!
//! - **Exact**: applies only when the type being handled is the target itself
//! - **Hierarchical**: applies to the target and every subtype of it
//!
//! Lookup order for a type `T`: an exact adapter registered for `T`, then the
//! hierarchical adapter registered for the nearest ancestor of `T` (`T` itself
//! included). When several hierarchical adapters share a target, the most
//! recently registered one wins.

use crate::de::DeserializationContext;
use crate::ser::SerializationContext;
use ahash::AHashMap;
use jab_model::{BindError, Result, Schema, TypeRef, TypeToken, Value};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Custom serializer for a type
pub trait JsonSerializer: Send + Sync {
    /// Produce the JSON for `value`
    ///
    /// Use [`SerializationContext::serialize`] for nested values and
    /// [`SerializationContext::serialize_default`] to fall back to the
    /// engine's own handling of `value`.
    fn serialize(&self, value: &Value, ctx: &SerializationContext<'_>) -> Result<JsonValue>;
}

/// Custom deserializer for a type
pub trait JsonDeserializer: Send + Sync {
    /// Build a value of `declared` (or one of its subtypes) from `json`
    ///
    /// Never called for JSON `null`, which always binds to [`Value::Null`].
    fn deserialize(
        &self,
        json: &JsonValue,
        declared: &TypeRef,
        ctx: &DeserializationContext<'_>,
    ) -> Result<Value>;
}

impl<F> JsonSerializer for F
where
    F: Fn(&Value, &SerializationContext<'_>) -> Result<JsonValue> + Send + Sync,
{
    fn serialize(&self, value: &Value, ctx: &SerializationContext<'_>) -> Result<JsonValue> {
        self(value, ctx)
    }
}

impl<F> JsonDeserializer for F
where
    F: Fn(&JsonValue, &TypeRef, &DeserializationContext<'_>) -> Result<Value> + Send + Sync,
{
    fn deserialize(
        &self,
        json: &JsonValue,
        declared: &TypeRef,
        ctx: &DeserializationContext<'_>,
    ) -> Result<Value> {
        self(json, declared, ctx)
    }
}

/// Whether an adapter serializes or deserializes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Value → JSON
    Serializer,
    /// JSON → value
    Deserializer,
}

impl Direction {
    /// Lower-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Serializer => "serializer",
            Direction::Deserializer => "deserializer",
        }
    }
}

/// Which types an adapter applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locality {
    /// Only the literal target type
    Exact,
    /// The target type and all of its subtypes
    Hierarchical,
}

impl Locality {
    /// Lower-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Locality::Exact => "exact",
            Locality::Hierarchical => "hierarchical",
        }
    }
}

/// A serializer or a deserializer
#[derive(Clone)]
pub enum Adapter {
    /// Value → JSON
    Serializer(Arc<dyn JsonSerializer>),
    /// JSON → value
    Deserializer(Arc<dyn JsonDeserializer>),
}

impl Adapter {
    /// Wrap a serializer
    pub fn serializer<S: JsonSerializer + 'static>(serializer: S) -> Self {
        Adapter::Serializer(Arc::new(serializer))
    }

    /// Wrap a deserializer
    pub fn deserializer<D: JsonDeserializer + 'static>(deserializer: D) -> Self {
        Adapter::Deserializer(Arc::new(deserializer))
    }

    /// Wrap a serializer closure
    pub fn serializer_fn<F>(f: F) -> Self
    where
        F: Fn(&Value, &SerializationContext<'_>) -> Result<JsonValue> + Send + Sync + 'static,
    {
        Adapter::Serializer(Arc::new(f))
    }

    /// Wrap a deserializer closure
    pub fn deserializer_fn<F>(f: F) -> Self
    where
        F: Fn(&JsonValue, &TypeRef, &DeserializationContext<'_>) -> Result<Value>
            + Send
            + Sync
            + 'static,
    {
        Adapter::Deserializer(Arc::new(f))
    }

    /// Direction of this adapter
    pub fn direction(&self) -> Direction {
        match self {
            Adapter::Serializer(_) => Direction::Serializer,
            Adapter::Deserializer(_) => Direction::Deserializer,
        }
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Adapter({})", self.direction().as_str())
    }
}

/// Adapter registration as supplied by the caller
#[derive(Debug, Clone)]
pub enum AdapterRegistration {
    /// Applies to the literal type only
    Exact(TypeToken, Adapter),
    /// Applies to the type and all of its subtypes
    Hierarchical(TypeToken, Adapter),
}

impl AdapterRegistration {
    /// Exact registration
    pub fn exact(target: impl Into<TypeToken>, adapter: Adapter) -> Self {
        AdapterRegistration::Exact(target.into(), adapter)
    }

    /// Hierarchical registration
    pub fn hierarchical(target: impl Into<TypeToken>, adapter: Adapter) -> Self {
        AdapterRegistration::Hierarchical(target.into(), adapter)
    }

    /// Declared target type
    pub fn target(&self) -> &TypeToken {
        match self {
            AdapterRegistration::Exact(target, _) | AdapterRegistration::Hierarchical(target, _) => {
                target
            }
        }
    }

    /// Declared locality
    pub fn locality(&self) -> Locality {
        match self {
            AdapterRegistration::Exact(..) => Locality::Exact,
            AdapterRegistration::Hierarchical(..) => Locality::Hierarchical,
        }
    }
}

/// Registration resolved against a schema
#[derive(Debug, Clone)]
pub struct ClassifiedAdapter {
    /// Target type, as stored in the schema
    pub target: TypeToken,
    /// Exact or hierarchical
    pub locality: Locality,
    /// The adapter itself
    pub adapter: Adapter,
}

/// Resolve a registration's target type and locality
///
/// # Errors
///
/// Returns [`BindError::UnresolvedAdapterTarget`] when the target is not a
/// class or enum declared in `schema`.
pub fn classify(schema: &Schema, registration: AdapterRegistration) -> Result<ClassifiedAdapter> {
    let locality = registration.locality();
    let (target, adapter) = match registration {
        AdapterRegistration::Exact(target, adapter)
        | AdapterRegistration::Hierarchical(target, adapter) => (target, adapter),
    };

    let target = schema
        .token(target.as_str())
        .cloned()
        .ok_or_else(|| BindError::UnresolvedAdapterTarget {
            target: target.to_string(),
        })?;

    Ok(ClassifiedAdapter {
        target,
        locality,
        adapter,
    })
}

/// Adapters of one direction, indexed for lookup
pub(crate) struct AdapterTable<A: ?Sized> {
    exact: AHashMap<TypeToken, Arc<A>>,
    /// Registration order; later entries shadow earlier ones for the same target
    hierarchical: Vec<(TypeToken, Arc<A>)>,
}

impl<A: ?Sized> AdapterTable<A> {
    pub(crate) fn new() -> Self {
        Self {
            exact: AHashMap::new(),
            hierarchical: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, target: TypeToken, locality: Locality, adapter: Arc<A>) {
        match locality {
            Locality::Exact => {
                self.exact.insert(target, adapter);
            }
            Locality::Hierarchical => self.hierarchical.push((target, adapter)),
        }
    }

    /// Adapter for `ty`: exact match first, then nearest hierarchical ancestor
    pub(crate) fn lookup(&self, schema: &Schema, ty: &str) -> Option<&Arc<A>> {
        if let Some(adapter) = self.exact.get(ty) {
            return Some(adapter);
        }
        if self.hierarchical.is_empty() {
            return None;
        }
        schema.ancestors(ty).into_iter().find_map(|ancestor| {
            self.hierarchical
                .iter()
                .rev()
                .find(|(target, _)| target == ancestor)
                .map(|(_, adapter)| adapter)
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.exact.len() + self.hierarchical.len()
    }
}
