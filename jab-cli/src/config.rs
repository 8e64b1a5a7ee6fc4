//! Schema file loading
//!
//! A schema file is TOML:
//!
//! ```toml
//! [engine]
//! pretty_print = true
//! root_wrapping = false
//! serialize_nulls = false
//! max_depth = 64
//!
//! [[class]]
//! name = "Order"
//! fields = [
//!     { name = "id", type = "long" },
//!     { name = "products", type = "list<Product>" },
//! ]
//!
//! [[enum]]
//! name = "Status"
//! variants = ["OPEN", "CLOSED"]
//!
//! [[method]]
//! resource = "OrderController"
//! name = "add"
//! params = [{ name = "order", type = "Order" }]
//! ```

use jab_codec::EngineOptions;
use jab_io::ResourceMethod;
use jab_model::{BindError, ClassDef, EnumDef, Limits, Schema, TypeRef};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a schema file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not valid TOML for the expected layout
    #[error("invalid schema file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A type string does not parse
    #[error("invalid type '{ty}' for {owner}: {source}")]
    Type {
        /// Where the type appears
        owner: String,
        /// Type string as written
        ty: String,
        /// Parse failure
        source: BindError,
    },

    /// Schema or engine configuration rejected
    #[error(transparent)]
    Bind(#[from] BindError),

    /// No `[[method]]` entry with this qualified name
    #[error("unknown method '{0}' (expected Resource.method)")]
    UnknownMethod(String),
}

/// Result alias for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    #[serde(default)]
    pub pretty_print: bool,
    #[serde(default)]
    pub root_wrapping: bool,
    pub root_alias: Option<String>,
    #[serde(default)]
    pub serialize_nulls: bool,
    pub max_depth: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassEntry {
    pub name: String,
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumEntry {
    pub name: String,
    pub variants: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodEntry {
    pub resource: String,
    pub name: String,
    #[serde(default)]
    pub params: Vec<FieldEntry>,
}

/// Parsed schema file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default, rename = "class")]
    pub classes: Vec<ClassEntry>,
    #[serde(default, rename = "enum")]
    pub enums: Vec<EnumEntry>,
    #[serde(default, rename = "method")]
    pub methods: Vec<MethodEntry>,
}

fn parse_type(owner: &str, ty: &str) -> Result<TypeRef> {
    ty.parse::<TypeRef>().map_err(|source| ConfigError::Type {
        owner: owner.to_string(),
        ty: ty.to_string(),
        source,
    })
}

impl SchemaFile {
    /// Read and parse `path`
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse TOML text
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Build the declared schema
    pub fn schema(&self) -> Result<Schema> {
        let mut builder = Schema::builder();
        for entry in &self.classes {
            let mut class = ClassDef::new(&entry.name);
            if let Some(parent) = &entry.extends {
                class = class.extends(parent);
            }
            for field in &entry.fields {
                let owner = format!("{}.{}", entry.name, field.name);
                class = class.field(field.name.clone(), parse_type(&owner, &field.ty)?);
            }
            builder = builder.class(class);
        }
        for entry in &self.enums {
            builder = builder.enumeration(EnumDef::new(&entry.name, entry.variants.iter()));
        }
        Ok(builder.build()?)
    }

    /// Engine options from the `[engine]` section
    pub fn engine_options(&self) -> EngineOptions {
        let section = &self.engine;
        EngineOptions {
            pretty_print: section.pretty_print,
            root_wrapping: section.root_wrapping,
            root_alias: section.root_alias.clone(),
            serialize_nulls: section.serialize_nulls,
            limits: Limits {
                max_depth: section.max_depth.unwrap_or(Limits::default().max_depth),
            },
        }
    }

    /// Declared methods
    pub fn methods(&self) -> Result<Vec<ResourceMethod>> {
        self.methods
            .iter()
            .map(|entry| {
                let mut method = ResourceMethod::new(&entry.resource, &entry.name);
                for param in &entry.params {
                    let owner = format!("{}.{}({})", entry.resource, entry.name, param.name);
                    method = method.named_param(param.name.clone(), parse_type(&owner, &param.ty)?);
                }
                Ok(method)
            })
            .collect()
    }

    /// Method by `Resource.method` name
    pub fn method(&self, qualified: &str) -> Result<ResourceMethod> {
        self.methods()?
            .into_iter()
            .find(|m| m.qualified_name() == qualified)
            .ok_or_else(|| ConfigError::UnknownMethod(qualified.to_string()))
    }
}
