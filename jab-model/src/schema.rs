//! Immutable type model: classes with single inheritance, fields and enums
//!
//! A [`Schema`] is the explicit stand-in for runtime reflection. It answers the
//! questions the codec needs while walking a graph:
//!
//! - which fields an instance of a class carries, and which class declares each
//! - the ancestor chain of a type (for hierarchical adapter lookup)
//! - whether a declared type belongs to the primitive classification

use crate::error::{BindError, Result};
use crate::types::{TypeRef, TypeToken, LAZY_PROXY};
use ahash::{AHashMap, AHashSet};
use smallvec::SmallVec;

/// Field declared on a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name (also the JSON key)
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
}

/// Class definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    /// Class name
    pub name: TypeToken,
    /// Direct supertype, if any
    pub parent: Option<TypeToken>,
    /// Fields declared directly on this class, in declaration order
    pub fields: Vec<FieldDef>,
}

impl ClassDef {
    /// Start a class definition
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: TypeToken::new(name),
            parent: None,
            fields: Vec::new(),
        }
    }

    /// Set the direct supertype
    pub fn extends(mut self, parent: impl AsRef<str>) -> Self {
        self.parent = Some(TypeToken::new(parent));
        self
    }

    /// Declare a field
    pub fn field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty,
        });
        self
    }
}

/// Enum definition; values serialize as their variant name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    /// Enum name
    pub name: TypeToken,
    /// Variant names in declaration order
    pub variants: Vec<String>,
}

impl EnumDef {
    /// Define an enum with the given variants
    pub fn new<I, S>(name: impl AsRef<str>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: TypeToken::new(name),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `variant` is declared
    pub fn has_variant(&self, variant: &str) -> bool {
        self.variants.iter().any(|v| v == variant)
    }
}

/// Builder for [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    classes: Vec<ClassDef>,
    enums: Vec<EnumDef>,
}

impl SchemaBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class definition
    pub fn class(mut self, class: ClassDef) -> Self {
        self.classes.push(class);
        self
    }

    /// Add an enum definition
    pub fn enumeration(mut self, def: EnumDef) -> Self {
        self.enums.push(def);
        self
    }

    /// Validate definitions and freeze them into a [`Schema`]
    ///
    /// # Errors
    ///
    /// Returns [`BindError::InvalidSchema`] for duplicate or reserved names,
    /// unknown parents or field types, inheritance cycles, fields redeclared
    /// along an inheritance chain, and empty or duplicated enum variants.
    pub fn build(self) -> Result<Schema> {
        let mut order = Vec::with_capacity(self.classes.len() + 1);
        let mut classes: AHashMap<TypeToken, ClassDef> = AHashMap::new();
        let mut enums: AHashMap<TypeToken, EnumDef> = AHashMap::new();

        let proxy = ClassDef::new(LAZY_PROXY);
        order.push(proxy.name.clone());
        classes.insert(proxy.name.clone(), proxy);

        for class in self.classes {
            if class.name.as_str() == LAZY_PROXY {
                return Err(BindError::InvalidSchema(format!(
                    "'{}' is reserved for the built-in lazy-proxy base type",
                    LAZY_PROXY
                )));
            }
            if classes.contains_key(&class.name) {
                return Err(BindError::InvalidSchema(format!(
                    "class '{}' declared twice",
                    class.name
                )));
            }
            order.push(class.name.clone());
            classes.insert(class.name.clone(), class);
        }

        for def in self.enums {
            if classes.contains_key(&def.name) || enums.contains_key(&def.name) {
                return Err(BindError::InvalidSchema(format!(
                    "type '{}' declared twice",
                    def.name
                )));
            }
            if def.variants.is_empty() {
                return Err(BindError::InvalidSchema(format!(
                    "enum '{}' has no variants",
                    def.name
                )));
            }
            let mut seen = AHashSet::new();
            for variant in &def.variants {
                if !seen.insert(variant.as_str()) {
                    return Err(BindError::InvalidSchema(format!(
                        "enum '{}' declares variant '{}' twice",
                        def.name, variant
                    )));
                }
            }
            enums.insert(def.name.clone(), def);
        }

        let schema = Schema {
            classes,
            enums,
            order,
        };
        schema.validate()?;
        Ok(schema)
    }
}

/// Immutable set of class and enum definitions
#[derive(Debug, Clone)]
pub struct Schema {
    classes: AHashMap<TypeToken, ClassDef>,
    enums: AHashMap<TypeToken, EnumDef>,
    order: Vec<TypeToken>,
}

impl Schema {
    /// Start building a schema
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    fn validate(&self) -> Result<()> {
        for class in self.classes.values() {
            if let Some(parent) = &class.parent {
                if self.enums.contains_key(parent) {
                    return Err(BindError::InvalidSchema(format!(
                        "class '{}' cannot extend enum '{}'",
                        class.name, parent
                    )));
                }
                if !self.classes.contains_key(parent) {
                    return Err(BindError::InvalidSchema(format!(
                        "class '{}' extends unknown type '{}'",
                        class.name, parent
                    )));
                }
            }

            // Walk up; a chain longer than the class count must loop.
            let mut steps = 0;
            let mut cursor = class.parent.as_ref();
            while let Some(parent) = cursor {
                steps += 1;
                if steps > self.classes.len() {
                    return Err(BindError::InvalidSchema(format!(
                        "inheritance cycle through '{}'",
                        class.name
                    )));
                }
                cursor = self.classes.get(parent).and_then(|c| c.parent.as_ref());
            }

            for field in &class.fields {
                if let TypeRef::Named(token) = field.ty.element() {
                    if !self.contains(token.as_str()) {
                        return Err(BindError::InvalidSchema(format!(
                            "field '{}.{}' has unknown type '{}'",
                            class.name, field.name, token
                        )));
                    }
                }
            }
        }

        for class in self.classes.values() {
            let mut seen = AHashSet::new();
            for (declaring, field) in self.fields_of(class.name.as_str()) {
                if !seen.insert(field.name.as_str()) {
                    return Err(BindError::InvalidSchema(format!(
                        "field '{}' is declared more than once in the hierarchy of '{}' (again on '{}')",
                        field.name, class.name, declaring
                    )));
                }
            }
        }

        Ok(())
    }

    /// Whether `name` is a declared class or enum
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name) || self.enums.contains_key(name)
    }

    /// Class definition by name
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    /// Enum definition by name
    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name)
    }

    /// Whether `name` is a declared enum
    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }


    /// Stored token for a declared class or enum
    pub fn token(&self, name: &str) -> Option<&TypeToken> {
        if let Some((token, _)) = self.classes.get_key_value(name) {
            return Some(token);
        }
        self.enums.get_key_value(name).map(|(token, _)| token)
    }

    /// Classes in declaration order, starting with the built-in `LazyProxy`
    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> + '_ {
        self.order.iter().filter_map(|name| self.classes.get(name))
    }

    /// Enum definitions (unordered)
    pub fn enums(&self) -> impl Iterator<Item = &EnumDef> + '_ {
        self.enums.values()
    }

    /// `ty` followed by its supertypes, nearest first
    ///
    /// Enums yield just themselves; undeclared names yield nothing.
    pub fn ancestors(&self, ty: &str) -> SmallVec<[&TypeToken; 4]> {
        let mut chain = SmallVec::new();
        if let Some((token, _)) = self.enums.get_key_value(ty) {
            chain.push(token);
            return chain;
        }
        let mut cursor = self.classes.get(ty);
        while let Some(class) = cursor {
            if chain.len() > self.classes.len() {
                break;
            }
            chain.push(&class.name);
            cursor = class.parent.as_ref().and_then(|p| self.classes.get(p));
        }
        chain
    }

    /// Whether `sub` is `sup` or one of its subtypes
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        self.ancestors(sub).iter().any(|t| t.as_str() == sup)
    }

    /// Every field an instance of `class` carries, paired with its declaring class
    ///
    /// Fields declared on `class` come first, then inherited ones walking up.
    pub fn fields_of(&self, class: &str) -> Vec<(&TypeToken, &FieldDef)> {
        let mut fields = Vec::new();
        for token in self.ancestors(class) {
            if let Some(def) = self.classes.get(token) {
                fields.extend(def.fields.iter().map(|f| (&def.name, f)));
            }
        }
        fields
    }

    /// Look up a field (declared or inherited) by name
    pub fn field(&self, class: &str, name: &str) -> Option<(&TypeToken, &FieldDef)> {
        self.ancestors(class).into_iter().find_map(|token| {
            self.classes
                .get(token)
                .and_then(|def| def.fields.iter().find(|f| f.name == name))
                .map(|f| (token, f))
        })
    }

    /// Primitive classification of a declared type
    ///
    /// True for built-in scalars and declared enums; classes, lists and `any`
    /// are not primitive.
    pub fn is_primitive(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Primitive(_) => true,
            TypeRef::Named(token) => self.is_enum(token.as_str()),
            TypeRef::List(_) | TypeRef::Any => false,
        }
    }
}
