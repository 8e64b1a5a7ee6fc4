//! Engine configuration and construction

use crate::adapter::{
    classify, Adapter, AdapterRegistration, AdapterTable, Direction, JsonDeserializer,
    JsonSerializer, Locality,
};
use crate::adapters::LazyProxyUnwrapper;
use crate::engine::Engine;
use crate::exclusion::ExclusionStrategy;
use ahash::AHashSet;
use jab_model::{BindError, Limits, Result, Schema, TypeToken};
use std::sync::Arc;
use tracing::debug;

/// Output and safety options of an [`Engine`]
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Indent the JSON output
    pub pretty_print: bool,
    /// Wrap the output in a single-key object named after the root
    pub root_wrapping: bool,
    /// Root key to use instead of the derived one
    pub root_alias: Option<String>,
    /// Write `null` for unset fields instead of omitting them
    pub serialize_nulls: bool,
    /// Walk limits
    pub limits: Limits,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            pretty_print: false,
            root_wrapping: false,
            root_alias: None,
            serialize_nulls: false,
            limits: Limits::default(),
        }
    }
}

/// Collects adapters, strategies and options, then builds an [`Engine`]
pub struct EngineBuilder {
    schema: Arc<Schema>,
    registrations: Vec<AdapterRegistration>,
    strategies: Vec<Arc<dyn ExclusionStrategy>>,
    options: EngineOptions,
}

impl EngineBuilder {
    /// Start a builder over `schema`
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            registrations: Vec::new(),
            strategies: Vec::new(),
            options: EngineOptions::default(),
        }
    }

    /// Add one adapter registration
    pub fn register(mut self, registration: AdapterRegistration) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Add several adapter registrations, in order
    pub fn register_all<I>(mut self, registrations: I) -> Self
    where
        I: IntoIterator<Item = AdapterRegistration>,
    {
        self.registrations.extend(registrations);
        self
    }

    /// Indent the output
    pub fn pretty_print(mut self) -> Self {
        self.options.pretty_print = true;
        self
    }

    /// Wrap output under a root key
    pub fn root_wrapping(mut self, enabled: bool) -> Self {
        self.options.root_wrapping = enabled;
        self
    }

    /// Fixed root key for wrapped output
    pub fn root_alias(mut self, alias: impl Into<String>) -> Self {
        self.options.root_alias = Some(alias.into());
        self
    }

    /// Add a strategy applied to every serialization and deserialization
    pub fn exclusion_strategy<S: ExclusionStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategies.push(Arc::new(strategy));
        self
    }

    /// Write `null` for unset fields
    pub fn serialize_nulls(mut self) -> Self {
        self.options.serialize_nulls = true;
        self
    }

    /// Walk limits
    pub fn limits(mut self, limits: Limits) -> Self {
        self.options.limits = limits;
        self
    }

    /// Replace all options at once
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Classify every registration and freeze the engine
    ///
    /// # Errors
    ///
    /// - [`BindError::ConfigurationExceedsHardLimits`] for invalid limits
    /// - [`BindError::UnresolvedAdapterTarget`] for a target the schema lacks
    /// - [`BindError::DuplicateAdapter`] when two registrations share
    ///   direction, locality and target
    pub fn build(self) -> Result<Engine> {
        self.options.limits.validate()?;

        let mut serializers: AdapterTable<dyn JsonSerializer> = AdapterTable::new();
        let mut deserializers: AdapterTable<dyn JsonDeserializer> = AdapterTable::new();

        // Caller registrations land after this one and shadow it
        serializers.insert(
            TypeToken::lazy_proxy(),
            Locality::Hierarchical,
            Arc::new(LazyProxyUnwrapper),
        );

        let mut seen: AHashSet<(Direction, Locality, TypeToken)> = AHashSet::new();
        for registration in self.registrations {
            let classified = classify(&self.schema, registration)?;
            let direction = classified.adapter.direction();
            if !seen.insert((direction, classified.locality, classified.target.clone())) {
                return Err(BindError::DuplicateAdapter {
                    target: classified.target.to_string(),
                    locality: classified.locality.as_str(),
                    direction: direction.as_str(),
                });
            }

            debug!(
                target_type = %classified.target,
                locality = classified.locality.as_str(),
                direction = direction.as_str(),
                "registered adapter"
            );

            match classified.adapter {
                Adapter::Serializer(adapter) => {
                    serializers.insert(classified.target, classified.locality, adapter)
                }
                Adapter::Deserializer(adapter) => {
                    deserializers.insert(classified.target, classified.locality, adapter)
                }
            }
        }

        Ok(Engine::new(
            self.schema,
            serializers,
            deserializers,
            self.strategies,
            self.options,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jab_model::{ClassDef, ErrorKind, TypeRef, Value};
    use serde_json::Value as JsonValue;

    fn schema() -> Schema {
        Schema::builder()
            .class(ClassDef::new("Dog").field("name", TypeRef::STRING))
            .build()
            .unwrap()
    }

    fn constant(text: &'static str) -> Adapter {
        Adapter::serializer_fn(move |_, _| Ok(JsonValue::from(text)))
    }

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert!(!options.pretty_print);
        assert!(!options.root_wrapping);
        assert!(!options.serialize_nulls);
        assert!(options.root_alias.is_none());
        assert_eq!(options.limits, Limits::default());
    }

    #[test]
    fn test_builtin_proxy_serializer_is_installed() {
        let engine = EngineBuilder::new(schema()).build().unwrap();
        assert!(engine.serializer_for("LazyProxy").is_some());
        assert!(engine.serializer_for("Dog").is_none());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let err = EngineBuilder::new(schema())
            .register(AdapterRegistration::exact("Dog", constant("a")))
            .register(AdapterRegistration::exact("Dog", constant("b")))
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::DuplicateAdapter { .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_same_target_different_locality_or_direction_is_fine() {
        let deserializer = Adapter::deserializer_fn(|_, _, _| Ok(Value::Null));
        let engine = EngineBuilder::new(schema())
            .register(AdapterRegistration::exact("Dog", constant("a")))
            .register(AdapterRegistration::hierarchical("Dog", constant("b")))
            .register(AdapterRegistration::exact("Dog", deserializer))
            .build();
        assert!(engine.is_ok());
    }

    #[test]
    fn test_invalid_limits_fail() {
        let err = EngineBuilder::new(schema())
            .limits(Limits { max_depth: 0 })
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::ConfigurationExceedsHardLimits(_)));
    }

    #[test]
    fn test_unknown_target_fails() {
        let err = EngineBuilder::new(schema())
            .register(AdapterRegistration::hierarchical("Cat", constant("meow")))
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::UnresolvedAdapterTarget { .. }));
    }
}
