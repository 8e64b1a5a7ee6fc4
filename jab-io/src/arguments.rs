//! Binding request bodies to method arguments
//!
//! The payload is a single JSON object whose top-level keys are parameter
//! names. Each declared parameter is looked up by name (never by position) and
//! bound to its declared type; parameters the payload does not mention come
//! back as `None`.

use ahash::AHashMap;
use jab_codec::de::json_type_name;
use jab_codec::Engine;
use jab_model::{BindError, Result, TypeRef, Value};
use serde_json::Value as JsonValue;
use std::fmt;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, warn};

/// Content types this deserializer accepts
pub const CONTENT_TYPES: [&str; 2] = ["application/json", "json"];

/// Language and optional country of a request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    language: String,
    country: Option<String>,
}

impl Locale {
    /// Language-only locale
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            country: None,
        }
    }

    /// Language and country (`Locale::with_country("pt", "BR")`)
    pub fn with_country(language: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            country: Some(country.into()),
        }
    }

    /// Language code
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Country code, if any
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{}_{}", self.language, country),
            None => f.write_str(&self.language),
        }
    }
}

/// Source of the current request's locale
pub trait Localization: Send + Sync {
    /// Locale of the request being handled
    fn locale(&self) -> Locale;
}

/// [`Localization`] that always answers the same locale
#[derive(Debug, Clone, Default)]
pub struct FixedLocale(pub Locale);

impl Localization for FixedLocale {
    fn locale(&self) -> Locale {
        self.0.clone()
    }
}

/// One declared parameter of a [`ResourceMethod`]
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Name as declared in the signature, if known
    pub name: Option<String>,
    /// Declared type
    pub ty: TypeRef,
}

/// Signature of a dispatch target
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceMethod {
    resource: String,
    name: String,
    params: Vec<Parameter>,
}

impl ResourceMethod {
    /// Method `name` on `resource`, with no parameters yet
    pub fn new(resource: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Append an unnamed parameter
    pub fn param(mut self, ty: TypeRef) -> Self {
        self.params.push(Parameter { name: None, ty });
        self
    }

    /// Append a parameter with its declared name
    pub fn named_param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.params.push(Parameter {
            name: Some(name.into()),
            ty,
        });
        self
    }

    /// Resource (controller) name
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Resource.method`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.resource, self.name)
    }

    /// Declared parameters, in order
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Declared names, when every parameter has one
    pub fn declared_names(&self) -> Option<Vec<String>> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }
}

impl fmt::Display for ResourceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.resource, self.name)?;
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            match &param.name {
                Some(name) => write!(f, "{}: {}", name, param.ty)?,
                None => write!(f, "{}", param.ty)?,
            }
        }
        f.write_str(")")
    }
}

/// Discovers the names of a method's parameters
pub trait ParameterNameProvider: Send + Sync {
    /// Names of the parameters of `method`, in declaration order
    fn parameter_names_for(&self, method: &ResourceMethod, locale: &Locale) -> Result<Vec<String>>;
}

/// Uses the names carried by the signature, `arg0`, `arg1`, ... otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredParameterNames;

impl ParameterNameProvider for DeclaredParameterNames {
    fn parameter_names_for(&self, method: &ResourceMethod, _locale: &Locale) -> Result<Vec<String>> {
        let names = method
            .params()
            .iter()
            .enumerate()
            .map(|(idx, p)| p.name.clone().unwrap_or_else(|| format!("arg{}", idx)))
            .collect();
        Ok(names)
    }
}

/// Fixed names per qualified method, falling back to [`DeclaredParameterNames`]
#[derive(Debug, Clone, Default)]
pub struct StaticParameterNames {
    names: AHashMap<String, Vec<String>>,
}

impl StaticParameterNames {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Names for `Resource.method`
    pub fn with<I, S>(mut self, qualified_method: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.insert(
            qualified_method.into(),
            names.into_iter().map(Into::into).collect(),
        );
        self
    }
}

impl ParameterNameProvider for StaticParameterNames {
    fn parameter_names_for(&self, method: &ResourceMethod, locale: &Locale) -> Result<Vec<String>> {
        match self.names.get(&method.qualified_name()) {
            Some(names) => Ok(names.clone()),
            None => DeclaredParameterNames.parameter_names_for(method, locale),
        }
    }
}

/// Binds JSON request bodies to the arguments of a [`ResourceMethod`]
#[derive(Clone)]
pub struct ArgumentDeserializer {
    engine: Arc<Engine>,
    names: Arc<dyn ParameterNameProvider>,
    localization: Arc<dyn Localization>,
}

impl ArgumentDeserializer {
    /// Deserializer over `engine` using the given collaborators
    pub fn new(
        engine: Arc<Engine>,
        names: Arc<dyn ParameterNameProvider>,
        localization: Arc<dyn Localization>,
    ) -> Self {
        Self {
            engine,
            names,
            localization,
        }
    }

    /// Deserializer that takes names from the signature and the default locale
    pub fn with_declared_names(engine: Arc<Engine>) -> Self {
        Self::new(
            engine,
            Arc::new(DeclaredParameterNames),
            Arc::new(FixedLocale::default()),
        )
    }

    /// Content types accepted by [`ArgumentDeserializer::deserialize`]
    pub fn content_types(&self) -> &'static [&'static str] {
        &CONTENT_TYPES
    }

    /// Engine used for binding
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Read one JSON object from `reader` and bind it to `method`'s parameters
    ///
    /// Returns one slot per declared parameter, in declaration order; `None`
    /// marks a parameter the payload left out or set to `null`.
    ///
    /// # Errors
    ///
    /// - [`BindError::NoParameters`] if `method` declares no parameters; the
    ///   stream is not read
    /// - [`BindError::EmptyPayload`], [`BindError::Json`] or
    ///   [`BindError::NotAnObject`] for a payload that is not one JSON object
    /// - [`BindError::ParameterNameMismatch`] if the name provider disagrees
    ///   with the signature
    /// - binding errors from the engine, naming the JSON path
    pub fn deserialize<R: Read>(
        &self,
        mut reader: R,
        method: &ResourceMethod,
    ) -> Result<Vec<Option<Value>>> {
        if method.arity() == 0 {
            return Err(BindError::NoParameters {
                method: method.qualified_name(),
            });
        }

        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(BindError::EmptyPayload);
        }
        // Strict JSON: single-quoted strings and bare words are rejected
        let root: JsonValue = serde_json::from_slice(&body)?;
        self.bind(&root, method)
    }

    /// Bind an already parsed payload to `method`'s parameters
    pub fn bind(&self, root: &JsonValue, method: &ResourceMethod) -> Result<Vec<Option<Value>>> {
        if method.arity() == 0 {
            return Err(BindError::NoParameters {
                method: method.qualified_name(),
            });
        }
        let payload = root.as_object().ok_or(BindError::NotAnObject {
            found: json_type_name(root),
        })?;

        let locale = self.localization.locale();
        let names = self.names.parameter_names_for(method, &locale)?;
        if names.len() != method.arity() {
            return Err(BindError::ParameterNameMismatch {
                method: method.qualified_name(),
                names: names.len(),
                declared: method.arity(),
            });
        }

        for key in payload.keys() {
            if !names.iter().any(|name| name == key) {
                warn!(method = %method.qualified_name(), key = %key, "payload key matches no parameter");
            }
        }

        let mut arguments = Vec::with_capacity(method.arity());
        for (name, param) in names.iter().zip(method.params()) {
            let slot = match payload.get(name) {
                None | Some(JsonValue::Null) => {
                    debug!(method = %method.qualified_name(), parameter = %name, "parameter absent");
                    None
                }
                Some(json) => {
                    let value = self
                        .engine
                        .from_tree(json, &param.ty, &format!("$.{}", name))?;
                    (!value.is_null()).then_some(value)
                }
            };
            arguments.push(slot);
        }

        Ok(arguments)
    }
}

impl fmt::Debug for ArgumentDeserializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentDeserializer")
            .field("engine", &self.engine)
            .field("locale", &self.localization.locale())
            .finish()
    }
}
