//! The immutable (de)serialization engine

use crate::adapter::{AdapterTable, JsonDeserializer, JsonSerializer};
use crate::builder::{EngineBuilder, EngineOptions};
use crate::de::DeserializationContext;
use crate::exclusion::{ExclusionStrategy, Exclusions, Serializee, StrategySet};
use crate::ser::SerializationContext;
use jab_model::{Result, Schema, TypeRef, Value};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::io::Write;
use std::sync::Arc;

/// Schema-driven JSON engine
///
/// Built once by [`EngineBuilder`] and shared read-only afterwards; every
/// call keeps its own state on the stack.
pub struct Engine {
    schema: Arc<Schema>,
    serializers: AdapterTable<dyn JsonSerializer>,
    deserializers: AdapterTable<dyn JsonDeserializer>,
    strategies: Vec<Arc<dyn ExclusionStrategy>>,
    options: EngineOptions,
}

impl Engine {
    pub(crate) fn new(
        schema: Arc<Schema>,
        serializers: AdapterTable<dyn JsonSerializer>,
        deserializers: AdapterTable<dyn JsonDeserializer>,
        strategies: Vec<Arc<dyn ExclusionStrategy>>,
        options: EngineOptions,
    ) -> Self {
        Self {
            schema,
            serializers,
            deserializers,
            strategies,
            options,
        }
    }

    /// Start configuring an engine over `schema`
    pub fn builder(schema: impl Into<Arc<Schema>>) -> EngineBuilder {
        EngineBuilder::new(schema)
    }

    /// Type model this engine binds against
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Shared handle to the schema
    pub fn schema_arc(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// Options the engine was built with
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Serializer that applies to values of runtime type `ty`
    pub fn serializer_for(&self, ty: &str) -> Option<&Arc<dyn JsonSerializer>> {
        self.serializers.lookup(&self.schema, ty)
    }

    /// Deserializer that applies to the declared type `ty`
    pub fn deserializer_for(&self, ty: &str) -> Option<&Arc<dyn JsonDeserializer>> {
        self.deserializers.lookup(&self.schema, ty)
    }

    fn strategy_set(&self) -> StrategySet<'_> {
        let mut set = StrategySet::default();
        for strategy in &self.strategies {
            set.push(strategy.as_ref());
        }
        set
    }

    /// Serialize `serializee` to a JSON tree, root wrapping included
    pub fn to_tree(&self, serializee: &Serializee) -> Result<JsonValue> {
        let exclusions = Exclusions::new(serializee);
        let mut strategies = self.strategy_set();
        strategies.push(&exclusions);

        let json = SerializationContext::root(self, &strategies).dispatch(serializee.target())?;
        self.wrap(json, serializee.target(), serializee.alias())
    }

    /// Serialize a whole value graph with only the engine-level strategies
    pub fn value_to_tree(&self, value: &Value) -> Result<JsonValue> {
        let strategies = self.strategy_set();
        let json = SerializationContext::root(self, &strategies).dispatch(value)?;
        self.wrap(json, value, None)
    }

    /// Serialize `serializee` to JSON text
    pub fn serialize(&self, serializee: &Serializee) -> Result<String> {
        let tree = self.to_tree(serializee)?;
        self.render(&tree)
    }

    /// Serialize a whole value graph to JSON text
    pub fn serialize_value(&self, value: &Value) -> Result<String> {
        let tree = self.value_to_tree(value)?;
        self.render(&tree)
    }

    /// Serialize `serializee` into `writer`
    pub fn write<W: Write>(&self, serializee: &Serializee, mut writer: W) -> Result<()> {
        let tree = self.to_tree(serializee)?;
        if self.options.pretty_print {
            serde_json::to_writer_pretty(&mut writer, &tree)?;
        } else {
            serde_json::to_writer(&mut writer, &tree)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn render(&self, tree: &JsonValue) -> Result<String> {
        let text = if self.options.pretty_print {
            serde_json::to_string_pretty(tree)?
        } else {
            serde_json::to_string(tree)?
        };
        Ok(text)
    }

    fn wrap(&self, json: JsonValue, root: &Value, alias: Option<&str>) -> Result<JsonValue> {
        if !self.options.root_wrapping {
            return Ok(json);
        }
        let key = match alias.or(self.options.root_alias.as_deref()) {
            Some(alias) => alias.to_string(),
            None => Self::derived_alias(root)?,
        };
        let mut map = Map::with_capacity(1);
        map.insert(key, json);
        Ok(JsonValue::Object(map))
    }

    /// Root key for `value` when no alias is configured
    ///
    /// The lower-camel class name of an object (looking through lazy proxies),
    /// `"list"` for lists and `"value"` for anything else.
    pub fn derived_alias(value: &Value) -> Result<String> {
        let alias = match value {
            Value::Object(instance) => instance.class().lower_camel(),
            Value::Lazy(proxy) => return Self::derived_alias(&proxy.resolve_real()?),
            Value::List(_) => "list".to_string(),
            _ => "value".to_string(),
        };
        Ok(alias)
    }

    /// Bind a JSON tree to a value of `declared`
    ///
    /// `path` names the tree's position in error messages (`$` for a root).
    pub fn from_tree(&self, json: &JsonValue, declared: &TypeRef, path: &str) -> Result<Value> {
        let strategies = self.strategy_set();
        DeserializationContext::root(self, &strategies, path).dispatch(json, declared)
    }

    /// Parse and bind JSON text to a value of `declared`
    pub fn deserialize_str(&self, text: &str, declared: &TypeRef) -> Result<Value> {
        let json: JsonValue = serde_json::from_str(text)?;
        self.from_tree(&json, declared, "$")
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("classes", &self.schema.classes().count())
            .field("serializers", &self.serializers.len())
            .field("deserializers", &self.deserializers.len())
            .field("strategies", &self.strategies.len())
            .field("options", &self.options)
            .finish()
    }
}
