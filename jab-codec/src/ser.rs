//! Value → JSON walk

use crate::engine::Engine;
use crate::exclusion::{FieldAttributes, StrategySet};
use chrono::SecondsFormat;
use jab_model::{BindError, Instance, Result, Schema, Value};
use serde_json::{Map, Number, Value as JsonValue};
use tracing::trace;

/// Handle given to serializers for the walk in progress
///
/// Carries the engine, the exclusion strategies active for this call and the
/// current nesting depth.
pub struct SerializationContext<'a> {
    engine: &'a Engine,
    strategies: &'a StrategySet<'a>,
    depth: usize,
}

impl<'a> SerializationContext<'a> {
    pub(crate) fn root(engine: &'a Engine, strategies: &'a StrategySet<'a>) -> Self {
        Self {
            engine,
            strategies,
            depth: 0,
        }
    }

    fn descend(&self) -> Result<SerializationContext<'a>> {
        let depth = self.depth + 1;
        self.engine
            .options()
            .limits
            .check_depth(depth, "serialization")?;
        Ok(SerializationContext {
            engine: self.engine,
            strategies: self.strategies,
            depth,
        })
    }

    /// Schema of the engine
    pub fn schema(&self) -> &Schema {
        self.engine.schema()
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Serialize a nested value, applying adapters
    pub fn serialize(&self, value: &Value) -> Result<JsonValue> {
        self.descend()?.dispatch(value)
    }

    /// Serialize `value` with the engine's built-in handling, skipping any
    /// adapter registered for its own type
    pub fn serialize_default(&self, value: &Value) -> Result<JsonValue> {
        self.descend()?.write_value(value)
    }

    pub(crate) fn dispatch(&self, value: &Value) -> Result<JsonValue> {
        if let Some(ty) = value.runtime_type() {
            if self.strategies.skip_class(&ty) {
                trace!(class = %ty, "class excluded; writing null");
                return Ok(JsonValue::Null);
            }
            if let Some(adapter) = self.engine.serializer_for(ty.as_str()) {
                trace!(class = %ty, "using registered serializer");
                return adapter.serialize(value, self);
            }
        }
        self.write_value(value)
    }

    fn write_value(&self, value: &Value) -> Result<JsonValue> {
        let json = match value {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Char(c) => JsonValue::String(c.to_string()),
            Value::Int(i) => JsonValue::Number((*i).into()),
            Value::Float(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .ok_or_else(|| {
                    BindError::InvalidValue(format!("{} is not a valid JSON number", f))
                })?,
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => {
                JsonValue::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Enum { variant, .. } => JsonValue::String(variant.clone()),
            Value::List(items) => JsonValue::Array(
                items
                    .iter()
                    .map(|item| self.serialize(item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Map(entries) => {
                let mut map = Map::new();
                for (key, item) in entries {
                    if item.is_null() && !self.engine.options().serialize_nulls {
                        continue;
                    }
                    map.insert(key.clone(), self.serialize(item)?);
                }
                JsonValue::Object(map)
            }
            Value::Object(instance) => self.write_object(instance)?,
            // No serializer claimed the proxy; unwrap it in place
            Value::Lazy(proxy) => self.dispatch(&proxy.resolve_real()?)?,
        };
        Ok(json)
    }

    fn write_object(&self, instance: &Instance) -> Result<JsonValue> {
        let schema = self.schema();
        let class = instance.class();
        if schema.class(class.as_str()).is_none() {
            return Err(BindError::UnknownType(class.to_string()));
        }

        let mut map = Map::new();
        for (declaring, field) in schema.fields_of(class.as_str()) {
            let attrs = FieldAttributes {
                name: &field.name,
                declaring_class: declaring,
                declared_type: &field.ty,
                primitive: schema.is_primitive(&field.ty),
            };
            if self.strategies.skip_field(&attrs) {
                trace!(class = %declaring, field = %field.name, "field skipped");
                continue;
            }
            if let Some(token) = field.ty.element().token() {
                if self.strategies.skip_class(token) {
                    continue;
                }
            }

            let value = instance.get(&field.name);
            if value.is_null() && !self.engine.options().serialize_nulls {
                continue;
            }
            map.insert(field.name.clone(), self.serialize(value)?);
        }
        Ok(JsonValue::Object(map))
    }
}
