//! Field exclusion
//!
//! Every field of every object visited during a walk is offered to the active
//! [`ExclusionStrategy`] values; a field is skipped when any of them says so.
//! [`Exclusions`] is the strategy derived from a per-call [`Serializee`]:
//!
//! 1. a matching include path keeps the field, whatever else applies
//! 2. otherwise a matching exclude path drops it
//! 3. otherwise a non-recursive walk keeps only primitive-typed fields
//!
//! A path matches a field when the path's owner is exactly the class that
//! declares the field (never a subtype of it) and the path is the field name or
//! ends with `.` + field name.

use jab_model::{BindError, Result, Schema, TypeRef, TypeToken, Value};
use smallvec::SmallVec;

/// What a strategy gets to see about a candidate field
#[derive(Debug, Clone, Copy)]
pub struct FieldAttributes<'a> {
    /// Field name
    pub name: &'a str,
    /// Class that declares the field
    pub declaring_class: &'a TypeToken,
    /// Declared type of the field
    pub declared_type: &'a TypeRef,
    /// Whether the declared type belongs to the primitive classification
    pub primitive: bool,
}

/// Policy deciding which fields and classes are left out of a walk
pub trait ExclusionStrategy: Send + Sync {
    /// Whether to leave this field out
    fn should_skip_field(&self, field: &FieldAttributes<'_>) -> bool;

    /// Whether to treat every value of `class` as absent
    fn should_skip_class(&self, _class: &TypeToken) -> bool {
        false
    }
}

/// Dotted field path scoped to the class declaring its leaf field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    /// Class declaring the leaf field
    pub owner: TypeToken,
    /// Dotted path (`"street"`, `"customer.address.street"`)
    pub path: String,
}

impl FieldPath {
    /// Create a path record
    pub fn new(owner: impl Into<TypeToken>, path: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            path: path.into(),
        }
    }

    /// Whether this path designates `field` as declared on `declaring_class`
    pub fn matches(&self, declaring_class: &TypeToken, field: &str) -> bool {
        if self.owner != *declaring_class {
            return false;
        }
        if self.path == field {
            return true;
        }
        self.path
            .strip_suffix(field)
            .is_some_and(|head| head.ends_with('.'))
    }

    /// Leaf segment of the path
    pub fn leaf(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

/// Per-call description of what to serialize and under which field policy
#[derive(Debug, Clone)]
pub struct Serializee {
    target: Value,
    includes: Vec<FieldPath>,
    excludes: Vec<FieldPath>,
    recursive: bool,
    alias: Option<String>,
}

impl Serializee {
    /// Describe `target` with no includes, no excludes and a shallow walk
    pub fn new(target: impl Into<Value>) -> Self {
        Self {
            target: target.into(),
            includes: Vec::new(),
            excludes: Vec::new(),
            recursive: false,
            alias: None,
        }
    }

    /// Value being serialized
    pub fn target(&self) -> &Value {
        &self.target
    }

    /// Include paths
    pub fn includes(&self) -> &[FieldPath] {
        &self.includes
    }

    /// Exclude paths
    pub fn excludes(&self) -> &[FieldPath] {
        &self.excludes
    }

    /// Whether non-primitive fields are walked by default
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Root alias override
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Always keep `path` on `owner`
    pub fn include(mut self, owner: impl Into<TypeToken>, path: impl Into<String>) -> Self {
        self.includes.push(FieldPath::new(owner, path));
        self
    }

    /// Drop `path` on `owner` unless it is also included
    pub fn exclude(mut self, owner: impl Into<TypeToken>, path: impl Into<String>) -> Self {
        self.excludes.push(FieldPath::new(owner, path));
        self
    }

    /// Walk non-primitive fields by default
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Name used when the output is wrapped in a root key
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Include a dotted path resolved from the target's type
    ///
    /// Every prefix of the path is included too, so `customer.address`
    /// keeps both the `customer` field and its `address` field.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::InvalidPath`] if the target has no class type or a
    /// segment does not name a field.
    pub fn include_path(mut self, schema: &Schema, dotted: &str) -> Result<Self> {
        let root = self.root_type()?;
        let resolved = resolve_path(schema, &root, dotted)?;
        self.includes.extend(resolved);
        Ok(self)
    }

    /// Exclude a dotted path resolved from the target's type
    ///
    /// # Errors
    ///
    /// Same as [`Serializee::include_path`].
    pub fn exclude_path(mut self, schema: &Schema, dotted: &str) -> Result<Self> {
        let root = self.root_type()?;
        let mut resolved = resolve_path(schema, &root, dotted)?;
        if let Some(leaf) = resolved.pop() {
            self.excludes.push(leaf);
        }
        Ok(self)
    }

    /// Class that dotted paths are resolved from
    ///
    /// The target's own class, the class of the first object in a list target,
    /// or the class of a lazy target's real value.
    pub fn root_type(&self) -> Result<TypeToken> {
        root_type_of(&self.target)?.ok_or_else(|| BindError::InvalidPath {
            path: String::new(),
            root: self.target.type_name().to_string(),
            reason: "target has no class type to resolve paths from".to_string(),
        })
    }
}

fn root_type_of(value: &Value) -> Result<Option<TypeToken>> {
    match value {
        Value::Object(instance) => Ok(Some(instance.class().clone())),
        Value::List(items) => {
            for item in items {
                if let Some(ty) = root_type_of(item)? {
                    return Ok(Some(ty));
                }
            }
            Ok(None)
        }
        Value::Lazy(proxy) => root_type_of(&proxy.resolve_real()?),
        _ => Ok(None),
    }
}

/// Resolve `dotted` from `root`, one [`FieldPath`] per prefix, leaf last
///
/// List-typed fields are stepped through to their element type.
pub fn resolve_path(schema: &Schema, root: &TypeToken, dotted: &str) -> Result<Vec<FieldPath>> {
    let invalid = |reason: String| BindError::InvalidPath {
        path: dotted.to_string(),
        root: root.to_string(),
        reason,
    };

    if dotted.is_empty() || dotted.split('.').any(str::is_empty) {
        return Err(invalid("empty path segment".to_string()));
    }

    let mut resolved = Vec::new();
    let mut current = root.clone();
    let mut consumed = 0;
    let segments: SmallVec<[&str; 4]> = dotted.split('.').collect();

    for (idx, segment) in segments.iter().enumerate() {
        let (declaring, field) = schema
            .field(current.as_str(), segment)
            .ok_or_else(|| invalid(format!("'{}' has no field '{}'", current, segment)))?;

        consumed += segment.len() + usize::from(idx > 0);
        resolved.push(FieldPath::new(declaring.clone(), &dotted[..consumed]));

        if idx + 1 < segments.len() {
            current = match field.ty.element() {
                TypeRef::Named(next) if schema.class(next.as_str()).is_some() => next.clone(),
                other => {
                    return Err(invalid(format!(
                        "'{}' has type {} and cannot be walked into",
                        segment, other
                    )))
                }
            };
        }
    }

    Ok(resolved)
}

/// Field policy of one [`Serializee`]
#[derive(Debug, Clone, Copy)]
pub struct Exclusions<'a> {
    serializee: &'a Serializee,
}

impl<'a> Exclusions<'a> {
    /// Strategy over `serializee`
    pub fn new(serializee: &'a Serializee) -> Self {
        Self { serializee }
    }
}

impl ExclusionStrategy for Exclusions<'_> {
    fn should_skip_field(&self, field: &FieldAttributes<'_>) -> bool {
        let matches = |path: &FieldPath| path.matches(field.declaring_class, field.name);

        if self.serializee.includes.iter().any(matches) {
            return false;
        }
        if self.serializee.excludes.iter().any(matches) {
            return true;
        }
        !self.serializee.recursive && !field.primitive
    }
}

/// All strategies active for one walk
#[derive(Default)]
pub(crate) struct StrategySet<'a> {
    strategies: Vec<&'a dyn ExclusionStrategy>,
}

impl<'a> StrategySet<'a> {
    pub(crate) fn push(&mut self, strategy: &'a dyn ExclusionStrategy) {
        self.strategies.push(strategy);
    }

    pub(crate) fn skip_field(&self, field: &FieldAttributes<'_>) -> bool {
        self.strategies.iter().any(|s| s.should_skip_field(field))
    }

    pub(crate) fn skip_class(&self, class: &TypeToken) -> bool {
        self.strategies.iter().any(|s| s.should_skip_class(class))
    }
}
