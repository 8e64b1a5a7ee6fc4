//! JAB Model - Core type and value model for JSON Argument Binding
//!
//! This crate provides the building blocks shared by the codec and I/O layers,
//! with no I/O dependencies. It includes:
//!
//! - Type tokens and declared type references
//! - The schema (classes, single inheritance, enums, primitive classification)
//! - Dynamic values and class instances
//! - The lazy-proxy capability
//! - Error types
//! - Walk limits

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod lazy;
pub mod limits;
pub mod schema;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use error::{BindError, ErrorKind, Result};
pub use lazy::{LazyValue, Unwrappable};
pub use limits::Limits;
pub use schema::{ClassDef, EnumDef, FieldDef, Schema, SchemaBuilder};
pub use types::{PrimitiveKind, TypeRef, TypeToken, LAZY_PROXY};
pub use value::{Instance, Value};
