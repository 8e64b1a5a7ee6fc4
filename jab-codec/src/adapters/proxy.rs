//! Lazy-proxy unwrapping
//!
//! Installed as a hierarchical serializer on `LazyProxy`, so every proxy
//! serializes exactly like the value it stands for.

use crate::adapter::JsonSerializer;
use crate::ser::SerializationContext;
use jab_model::{Result, Value};
use serde_json::Value as JsonValue;
use tracing::debug;

/// Serializer that replaces a proxy with its real value
#[derive(Debug, Clone, Copy, Default)]
pub struct LazyProxyUnwrapper;

impl JsonSerializer for LazyProxyUnwrapper {
    fn serialize(&self, value: &Value, ctx: &SerializationContext<'_>) -> Result<JsonValue> {
        match value {
            Value::Lazy(proxy) => {
                debug!(proxy_type = %proxy.proxy_type(), "resolving lazy proxy");
                let real = proxy.resolve_real()?;
                // Same depth as the proxy itself
                ctx.dispatch(&real)
            }
            other => ctx.serialize_default(other),
        }
    }
}
