//! Dynamic values bound to and from JSON

use crate::lazy::Unwrappable;
use crate::types::TypeToken;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Runtime value of a field, parameter or list element
#[derive(Clone)]
pub enum Value {
    /// Absent / null
    Null,
    /// Boolean
    Bool(bool),
    /// Single character
    Char(char),
    /// Any integer kind
    Int(i64),
    /// Any floating-point kind
    Float(f64),
    /// String
    Str(String),
    /// Calendar date
    Date(NaiveDate),
    /// Instant in time
    DateTime(DateTime<Utc>),
    /// Enum constant
    Enum {
        /// Enum type
        ty: TypeToken,
        /// Variant name
        variant: String,
    },
    /// Ordered collection
    List(Vec<Value>),
    /// String-keyed map (used for `any`-typed JSON objects)
    Map(BTreeMap<String, Value>),
    /// Instance of a schema class
    Object(Instance),
    /// Lazy stand-in for a value that is resolved on demand
    Lazy(Arc<dyn Unwrappable>),
}

impl Value {
    /// Whether this is [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Instance, if this is an object
    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Integer payload
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float payload (integers widen)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// List elements
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Runtime type of a class instance, enum constant or lazy proxy
    pub fn runtime_type(&self) -> Option<TypeToken> {
        match self {
            Value::Object(instance) => Some(instance.class.clone()),
            Value::Enum { ty, .. } => Some(ty.clone()),
            Value::Lazy(proxy) => Some(proxy.proxy_type()),
            _ => None,
        }
    }

    /// Short description of the variant, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Enum { .. } => "enum",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Lazy(_) => "lazy proxy",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (
                Value::Enum { ty: t1, variant: v1 },
                Value::Enum { ty: t2, variant: v2 },
            ) => t1 == t2 && v1 == v2,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            // Proxies are only equal to themselves
            (Value::Lazy(a), Value::Lazy(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::Char(v) => write!(f, "Char({:?})", v),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::Float(v) => write!(f, "Float({})", v),
            Value::Str(v) => write!(f, "Str({:?})", v),
            Value::Date(v) => write!(f, "Date({})", v),
            Value::DateTime(v) => write!(f, "DateTime({})", v.to_rfc3339()),
            Value::Enum { ty, variant } => write!(f, "Enum({}::{})", ty, variant),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(map) => f.debug_map().entries(map).finish(),
            Value::Object(instance) => instance.fmt(f),
            Value::Lazy(proxy) => write!(f, "Lazy({})", proxy.proxy_type()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Value::Object(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Instance of a schema class
///
/// Fields that were never set read as [`Value::Null`].
#[derive(Clone, PartialEq)]
pub struct Instance {
    class: TypeToken,
    fields: BTreeMap<String, Value>,
}

impl Instance {
    /// Create an empty instance of `class`
    pub fn new(class: impl Into<TypeToken>) -> Self {
        Self {
            class: class.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Runtime class
    pub fn class(&self) -> &TypeToken {
        &self.class
    }

    /// Assign a field
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Field value, `Null` if unset
    pub fn get(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }

    /// Whether `field` was explicitly assigned
    pub fn is_set(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Assigned fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.class.as_str());
        for (name, value) in &self.fields {
            s.field(name, value);
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_defaults_to_null() {
        let dog = Instance::new("Dog").with("name", "Brutus");
        assert_eq!(dog.get("name").as_str(), Some("Brutus"));
        assert!(dog.get("age").is_null());
        assert!(!dog.is_set("age"));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(Some(7i64)), Value::Int(7));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_equality_is_structural_for_objects() {
        let a = Instance::new("Group").with("id", 1i64);
        let b = Instance::new("Group").with("id", 1i64);
        let c = Instance::new("Product").with("id", 1i64);
        assert_eq!(Value::from(a.clone()), Value::from(b));
        assert_ne!(Value::from(a), Value::from(c));
    }

    #[test]
    fn test_runtime_type() {
        let v = Value::Enum {
            ty: TypeToken::new("Size"),
            variant: "SMALL".into(),
        };
        assert_eq!(v.runtime_type().unwrap().as_str(), "Size");
        assert_eq!(Value::Int(1).runtime_type(), None);
    }
}
