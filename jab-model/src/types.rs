//! Type tokens and declared type references

use crate::error::BindError;
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Name of the built-in lazy-proxy base type
pub const LAZY_PROXY: &str = "LazyProxy";

/// Name of a class or enum declared in a [`Schema`](crate::Schema)
///
/// Tokens are compared by name and are cheap to clone.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeToken(Arc<str>);

impl TypeToken {
    /// Create a token from a type name
    pub fn new(name: impl AsRef<str>) -> Self {
        TypeToken(Arc::from(name.as_ref()))
    }

    /// Token of the built-in lazy-proxy base type
    pub fn lazy_proxy() -> Self {
        TypeToken::new(LAZY_PROXY)
    }

    /// Type name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name with the first character lower-cased (`Order` → `order`)
    pub fn lower_camel(&self) -> String {
        let simple = self.0.rsplit(['.', '$']).next().unwrap_or(&self.0);
        let mut chars = simple.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeToken({})", self.0)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TypeToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeToken {
    fn from(name: &str) -> Self {
        TypeToken::new(name)
    }
}

impl From<String> for TypeToken {
    fn from(name: String) -> Self {
        TypeToken(Arc::from(name))
    }
}

/// Built-in scalar kinds
///
/// Every kind here belongs to the primitive classification: fields declared
/// with one of them survive a non-recursive serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `true` / `false`
    Bool,
    /// Single character
    Char,
    /// 8-bit signed integer
    Byte,
    /// 16-bit signed integer
    Short,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// UTF-8 string
    String,
    /// Calendar date (`YYYY-MM-DD`)
    Date,
    /// Instant in time (RFC 3339)
    DateTime,
}

impl PrimitiveKind {
    /// Canonical name used in type strings
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::String => "string",
            PrimitiveKind::Date => "date",
            PrimitiveKind::DateTime => "datetime",
        }
    }

    /// Look up a kind by name (canonical names plus common aliases)
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" | "boolean" => PrimitiveKind::Bool,
            "char" | "character" => PrimitiveKind::Char,
            "byte" => PrimitiveKind::Byte,
            "short" => PrimitiveKind::Short,
            "int" | "integer" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            "string" => PrimitiveKind::String,
            "date" => PrimitiveKind::Date,
            "datetime" | "timestamp" | "calendar" => PrimitiveKind::DateTime,
            _ => return None,
        };
        Some(kind)
    }

    /// Inclusive range for integer kinds
    pub fn integer_range(&self) -> Option<(i64, i64)> {
        match self {
            PrimitiveKind::Byte => Some((i8::MIN as i64, i8::MAX as i64)),
            PrimitiveKind::Short => Some((i16::MIN as i64, i16::MAX as i64)),
            PrimitiveKind::Int => Some((i32::MIN as i64, i32::MAX as i64)),
            PrimitiveKind::Long => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

/// Declared type of a field or method parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Built-in scalar
    Primitive(PrimitiveKind),
    /// Class or enum declared in the schema
    Named(TypeToken),
    /// Ordered collection of the element type
    List(Box<TypeRef>),
    /// Untyped value; JSON is kept in its natural shape
    Any,
}

impl TypeRef {
    #[allow(missing_docs)]
    pub const BOOL: TypeRef = TypeRef::Primitive(PrimitiveKind::Bool);
    #[allow(missing_docs)]
    pub const CHAR: TypeRef = TypeRef::Primitive(PrimitiveKind::Char);
    #[allow(missing_docs)]
    pub const BYTE: TypeRef = TypeRef::Primitive(PrimitiveKind::Byte);
    #[allow(missing_docs)]
    pub const SHORT: TypeRef = TypeRef::Primitive(PrimitiveKind::Short);
    #[allow(missing_docs)]
    pub const INT: TypeRef = TypeRef::Primitive(PrimitiveKind::Int);
    #[allow(missing_docs)]
    pub const LONG: TypeRef = TypeRef::Primitive(PrimitiveKind::Long);
    #[allow(missing_docs)]
    pub const FLOAT: TypeRef = TypeRef::Primitive(PrimitiveKind::Float);
    #[allow(missing_docs)]
    pub const DOUBLE: TypeRef = TypeRef::Primitive(PrimitiveKind::Double);
    #[allow(missing_docs)]
    pub const STRING: TypeRef = TypeRef::Primitive(PrimitiveKind::String);
    #[allow(missing_docs)]
    pub const DATE: TypeRef = TypeRef::Primitive(PrimitiveKind::Date);
    #[allow(missing_docs)]
    pub const DATETIME: TypeRef = TypeRef::Primitive(PrimitiveKind::DateTime);

    /// Reference to a named class or enum
    pub fn named(name: impl AsRef<str>) -> Self {
        TypeRef::Named(TypeToken::new(name))
    }

    /// List of `element`
    pub fn list(element: TypeRef) -> Self {
        TypeRef::List(Box::new(element))
    }

    /// Named token, if any
    pub fn token(&self) -> Option<&TypeToken> {
        match self {
            TypeRef::Named(token) => Some(token),
            _ => None,
        }
    }

    /// Innermost non-list type (`list<list<Product>>` → `Product`)
    pub fn element(&self) -> &TypeRef {
        match self {
            TypeRef::List(inner) => inner.element(),
            other => other,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(kind) => f.write_str(kind.name()),
            TypeRef::Named(token) => write!(f, "{}", token),
            TypeRef::List(inner) => write!(f, "list<{}>", inner),
            TypeRef::Any => f.write_str("any"),
        }
    }
}

impl FromStr for TypeRef {
    type Err = BindError;

    /// Parse `long`, `Order`, `list<Product>`, `Product[]` or `any`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(BindError::InvalidSchema("empty type name".to_string()));
        }

        if let Some(inner) = s
            .strip_prefix("list<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return Ok(TypeRef::list(inner.parse()?));
        }
        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(TypeRef::list(inner.parse()?));
        }
        if s == "any" || s == "object" {
            return Ok(TypeRef::Any);
        }
        if let Some(kind) = PrimitiveKind::from_name(s) {
            return Ok(TypeRef::Primitive(kind));
        }

        let valid = s
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && s
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '$'));
        if !valid {
            return Err(BindError::InvalidSchema(format!(
                "'{}' is not a valid type name",
                s
            )));
        }
        Ok(TypeRef::named(s))
    }
}
