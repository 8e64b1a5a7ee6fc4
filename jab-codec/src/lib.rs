//! JAB Codec - Schema-driven JSON (de)serialization engine
//!
//! This crate provides the engine that binds JSON to the dynamic value model
//! and back:
//!
//! - Adapter contracts, registrations and their classification
//! - The engine builder and the immutable engine
//! - Field exclusion strategies and per-call serialization rules
//! - The built-in lazy-proxy unwrap adapter

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod adapters;
pub mod builder;
pub mod de;
pub mod engine;
pub mod exclusion;
pub mod ser;

// Re-export commonly used types
pub use jab_model::{
    BindError, ErrorKind, Instance, LazyValue, Limits, Result, Schema, TypeRef, TypeToken,
    Unwrappable, Value,
};

// Re-export our own types
pub use adapter::{
    classify, Adapter, AdapterRegistration, ClassifiedAdapter, Direction, JsonDeserializer,
    JsonSerializer, Locality,
};
pub use adapters::LazyProxyUnwrapper;
pub use builder::{EngineBuilder, EngineOptions};
pub use de::DeserializationContext;
pub use engine::Engine;
pub use exclusion::{
    resolve_path, ExclusionStrategy, Exclusions, FieldAttributes, FieldPath, Serializee,
};
pub use ser::SerializationContext;
