//! Fluent JSON serialization
//!
//! ```text
//! JsonSerialization::new(&engine)
//!     .from(order)
//!     .include("customer.address")?
//!     .exclude("delivery")?
//!     .serialize(&mut response)?;
//! ```
//!
//! Paths are dotted field names resolved against the class of the root value
//! (the element class for lists).

use jab_codec::{Engine, Serializee};
use jab_model::{Result, Value};
use std::io::Write;

/// Entry point for serializing values through an [`Engine`]
#[derive(Debug, Clone, Copy)]
pub struct JsonSerialization<'e> {
    engine: &'e Engine,
}

impl<'e> JsonSerialization<'e> {
    /// Serialization over `engine`
    pub fn new(engine: &'e Engine) -> Self {
        Self { engine }
    }

    /// Start serializing `value`
    pub fn from(&self, value: impl Into<Value>) -> Serializer<'e> {
        Serializer {
            engine: self.engine,
            serializee: Serializee::new(value),
        }
    }

    /// Start serializing `value`, wrapped under `alias` when root wrapping is on
    pub fn from_with_alias(&self, value: impl Into<Value>, alias: impl Into<String>) -> Serializer<'e> {
        Serializer {
            engine: self.engine,
            serializee: Serializee::new(value).with_alias(alias),
        }
    }
}

/// Serialization in progress; collects field rules until written
#[derive(Debug)]
pub struct Serializer<'e> {
    engine: &'e Engine,
    serializee: Serializee,
}

impl<'e> Serializer<'e> {
    /// Always write the field at `path` (and every field leading to it)
    ///
    /// # Errors
    ///
    /// [`jab_model::BindError::InvalidPath`] if a segment names no field.
    pub fn include(mut self, path: &str) -> Result<Self> {
        self.serializee = self.serializee.include_path(self.engine.schema(), path)?;
        Ok(self)
    }

    /// Leave out the field at `path` unless it is also included
    ///
    /// # Errors
    ///
    /// [`jab_model::BindError::InvalidPath`] if a segment names no field.
    pub fn exclude(mut self, path: &str) -> Result<Self> {
        self.serializee = self.serializee.exclude_path(self.engine.schema(), path)?;
        Ok(self)
    }

    /// Write every field not explicitly excluded, not just primitive ones
    pub fn recursive(mut self) -> Self {
        self.serializee = self.serializee.recursive(true);
        self
    }

    /// Rules collected so far
    pub fn serializee(&self) -> &Serializee {
        &self.serializee
    }

    /// Write the JSON into `writer`
    pub fn serialize<W: Write>(self, writer: W) -> Result<()> {
        self.engine.write(&self.serializee, writer)
    }

    /// JSON text
    pub fn into_string(self) -> Result<String> {
        self.engine.serialize(&self.serializee)
    }
}
