//! JSON → value walk
//!
//! Binding is driven by the declared type. Scalars are coerced leniently the
//! way the wrapped JSON engine always has: numeric strings bind to numbers,
//! numbers and booleans bind to strings, `"true"`/`"false"` bind to booleans.
//! Unknown object keys are ignored and missing ones leave the field unset.

use crate::engine::Engine;
use crate::exclusion::{FieldAttributes, StrategySet};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use jab_model::{BindError, Instance, PrimitiveKind, Result, Schema, TypeRef, TypeToken, Value};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tracing::trace;

/// Handle given to deserializers for the walk in progress
pub struct DeserializationContext<'a> {
    engine: &'a Engine,
    strategies: &'a StrategySet<'a>,
    depth: usize,
    path: String,
}

impl<'a> DeserializationContext<'a> {
    pub(crate) fn root(
        engine: &'a Engine,
        strategies: &'a StrategySet<'a>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            strategies,
            depth: 0,
            path: path.into(),
        }
    }

    fn at(&self, path: String) -> Result<DeserializationContext<'a>> {
        let depth = self.depth + 1;
        self.engine.options().limits.check_depth(depth, &path)?;
        Ok(DeserializationContext {
            engine: self.engine,
            strategies: self.strategies,
            depth,
            path,
        })
    }

    /// Schema of the engine
    pub fn schema(&self) -> &Schema {
        self.engine.schema()
    }

    /// JSON path of the value being bound (e.g. `$.order.products[0]`)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Bind a nested value, applying adapters
    pub fn deserialize(&self, json: &JsonValue, declared: &TypeRef) -> Result<Value> {
        self.at(self.path.clone())?.dispatch(json, declared)
    }

    /// Bind `json` with the engine's built-in handling, skipping any adapter
    /// registered for `declared`
    pub fn deserialize_default(&self, json: &JsonValue, declared: &TypeRef) -> Result<Value> {
        self.at(self.path.clone())?.read_value(json, declared)
    }

    fn mismatch(&self, expected: impl ToString, json: &JsonValue) -> BindError {
        BindError::TypeMismatch {
            path: self.path.clone(),
            expected: expected.to_string(),
            found: describe(json),
        }
    }

    pub(crate) fn dispatch(&self, json: &JsonValue, declared: &TypeRef) -> Result<Value> {
        if json.is_null() {
            return Ok(Value::Null);
        }

        if let TypeRef::Named(token) = declared {
            if self.strategies.skip_class(token) {
                return Ok(Value::Null);
            }
            if let Some(adapter) = self.engine.deserializer_for(token.as_str()) {
                trace!(class = %token, path = %self.path, "using registered deserializer");
                let value = adapter.deserialize(json, declared, self)?;
                self.check_assignable(&value, token)?;
                return Ok(value);
            }
        }

        self.read_value(json, declared)
    }

    /// Adapters may return subtypes of the declared class, never anything else
    fn check_assignable(&self, value: &Value, declared: &TypeToken) -> Result<()> {
        let actual = match value {
            Value::Object(instance) => instance.class(),
            Value::Enum { ty, .. } => ty,
            Value::Null | Value::Lazy(_) => return Ok(()),
            other => {
                return Err(BindError::TypeMismatch {
                    path: self.path.clone(),
                    expected: declared.to_string(),
                    found: format!("{} from adapter", other.type_name()),
                })
            }
        };
        if self.schema().is_subtype(actual.as_str(), declared.as_str()) {
            Ok(())
        } else {
            Err(BindError::TypeMismatch {
                path: self.path.clone(),
                expected: declared.to_string(),
                found: format!("{} from adapter", actual),
            })
        }
    }

    fn read_value(&self, json: &JsonValue, declared: &TypeRef) -> Result<Value> {
        if json.is_null() {
            return Ok(Value::Null);
        }
        match declared {
            TypeRef::Primitive(kind) => self.read_primitive(*kind, json),
            TypeRef::Named(token) => {
                let schema = self.schema();
                if let Some(def) = schema.enum_def(token.as_str()) {
                    return match json.as_str() {
                        Some(variant) if def.has_variant(variant) => Ok(Value::Enum {
                            ty: def.name.clone(),
                            variant: variant.to_string(),
                        }),
                        _ => Err(self.mismatch(format!("one of {} variants", token), json)),
                    };
                }
                if schema.class(token.as_str()).is_none() {
                    return Err(BindError::UnknownType(token.to_string()));
                }
                self.read_object(token, json)
            }
            TypeRef::List(element) => {
                let items = json
                    .as_array()
                    .ok_or_else(|| self.mismatch(declared, json))?;
                let mut values = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let child = self.at(format!("{}[{}]", self.path, idx))?;
                    values.push(child.dispatch(item, element)?);
                }
                Ok(Value::List(values))
            }
            TypeRef::Any => self.read_any(json),
        }
    }

    fn read_object(&self, class: &TypeToken, json: &JsonValue) -> Result<Value> {
        let object = json
            .as_object()
            .ok_or_else(|| self.mismatch(class, json))?;
        let schema = self.schema();
        let mut instance = Instance::new(class.clone());

        for (declaring, field) in schema.fields_of(class.as_str()) {
            let attrs = FieldAttributes {
                name: &field.name,
                declaring_class: declaring,
                declared_type: &field.ty,
                primitive: schema.is_primitive(&field.ty),
            };
            if self.strategies.skip_field(&attrs) {
                continue;
            }
            let Some(item) = object.get(&field.name) else {
                continue;
            };
            let child = self.at(format!("{}.{}", self.path, field.name))?;
            let value = child.dispatch(item, &field.ty)?;
            if !value.is_null() {
                instance.set(field.name.clone(), value);
            }
        }

        Ok(Value::Object(instance))
    }

    fn read_any(&self, json: &JsonValue) -> Result<Value> {
        let value = match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::Str(s.clone()),
            JsonValue::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let child = self.at(format!("{}[{}]", self.path, idx))?;
                    values.push(child.read_any(item)?);
                }
                Value::List(values)
            }
            JsonValue::Object(entries) => {
                let mut map = BTreeMap::new();
                for (key, item) in entries {
                    let child = self.at(format!("{}.{}", self.path, key))?;
                    map.insert(key.clone(), child.read_any(item)?);
                }
                Value::Map(map)
            }
        };
        Ok(value)
    }

    fn read_primitive(&self, kind: PrimitiveKind, json: &JsonValue) -> Result<Value> {
        let fail = || self.mismatch(kind.name(), json);

        match kind {
            PrimitiveKind::Bool => match json {
                JsonValue::Bool(b) => Ok(Value::Bool(*b)),
                JsonValue::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
                JsonValue::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
                _ => Err(fail()),
            },
            PrimitiveKind::Char => {
                let s = json.as_str().ok_or_else(fail)?;
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(fail()),
                }
            }
            PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Int | PrimitiveKind::Long => {
                let value = integer_of(json).ok_or_else(fail)?;
                let (min, max) = kind.integer_range().ok_or_else(fail)?;
                if value < min || value > max {
                    return Err(fail());
                }
                Ok(Value::Int(value))
            }
            PrimitiveKind::Float | PrimitiveKind::Double => {
                let value = match json {
                    JsonValue::Number(n) => n.as_f64(),
                    JsonValue::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .ok_or_else(fail)?;
                Ok(Value::Float(value))
            }
            PrimitiveKind::String => match json {
                JsonValue::String(s) => Ok(Value::Str(s.clone())),
                JsonValue::Number(n) => Ok(Value::Str(n.to_string())),
                JsonValue::Bool(b) => Ok(Value::Str(b.to_string())),
                _ => Err(fail()),
            },
            PrimitiveKind::Date => {
                let s = json.as_str().ok_or_else(fail)?;
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .or_else(|| {
                        DateTime::parse_from_rfc3339(s)
                            .ok()
                            .map(|dt| dt.date_naive())
                    })
                    .map(Value::Date)
                    .ok_or_else(fail)
            }
            PrimitiveKind::DateTime => match json {
                JsonValue::String(s) => DateTime::parse_from_rfc3339(s)
                    .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
                    .map_err(|_| fail()),
                // Epoch milliseconds
                JsonValue::Number(n) => n
                    .as_i64()
                    .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                    .map(Value::DateTime)
                    .ok_or_else(fail),
                _ => Err(fail()),
            },
        }
    }
}

fn integer_of(json: &JsonValue) -> Option<i64> {
    match json {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        JsonValue::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Short description of a JSON value for error messages
pub(crate) fn describe(json: &JsonValue) -> String {
    match json {
        JsonValue::Null => "null".to_string(),
        JsonValue::Bool(b) => format!("bool {}", b),
        JsonValue::Number(n) => format!("number {}", n),
        JsonValue::String(s) if s.chars().count() > 32 => {
            let head: String = s.chars().take(32).collect();
            format!("string \"{}...\"", head)
        }
        JsonValue::String(s) => format!("string \"{}\"", s),
        JsonValue::Array(items) => format!("array of {} items", items.len()),
        JsonValue::Object(_) => "object".to_string(),
    }
}

/// JSON type name of the root, for [`BindError::NotAnObject`]
pub fn json_type_name(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
