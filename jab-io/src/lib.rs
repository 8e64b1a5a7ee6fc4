//! JAB I/O - Request-body binding and JSON output
//!
//! This crate connects the engine to byte streams:
//!
//! - Binding a JSON request body to the arguments of a method
//! - Parameter-name and locale collaborators
//! - A fluent API for serializing values with field rules

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod arguments;
pub mod serialization;

// Re-export commonly used types
pub use jab_codec::{
    Adapter, AdapterRegistration, Engine, EngineBuilder, EngineOptions, ExclusionStrategy,
    Serializee,
};
pub use jab_model::{BindError, ErrorKind, Instance, Limits, Result, Schema, TypeRef, Value};

// Re-export our own types
pub use arguments::{
    ArgumentDeserializer, DeclaredParameterNames, FixedLocale, Locale, Localization, Parameter,
    ParameterNameProvider, ResourceMethod, StaticParameterNames, CONTENT_TYPES,
};
pub use serialization::{JsonSerialization, Serializer};

use std::io::Read;

/// Bind `reader`'s payload to `method` with the signature's own parameter names
pub fn bind_arguments<R: Read>(
    engine: std::sync::Arc<Engine>,
    reader: R,
    method: &ResourceMethod,
) -> Result<Vec<Option<Value>>> {
    ArgumentDeserializer::with_declared_names(engine).deserialize(reader, method)
}

/// Serialize a whole value graph to JSON text with the engine's own rules
pub fn to_json(engine: &Engine, value: &Value) -> Result<String> {
    engine.serialize_value(value)
}
