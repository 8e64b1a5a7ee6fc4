//! Lazy-proxy capability
//!
//! Any lazy-loading abstraction can take part in serialization by
//! implementing [`Unwrappable`]. The codec never looks at the proxy itself:
//! it asks for the real value and serializes that instead.

use crate::error::{BindError, Result};
use crate::types::TypeToken;
use crate::value::Value;
use std::fmt;
use std::sync::OnceLock;

/// A stand-in that can produce the real value it defers
pub trait Unwrappable: Send + Sync {
    /// Runtime type of the proxy itself
    ///
    /// Must be the built-in `LazyProxy` type or one of its subtypes for the
    /// built-in unwrap adapter to pick it up; custom proxy families can declare
    /// their own subtypes and register more specific adapters against them.
    fn proxy_type(&self) -> TypeToken {
        TypeToken::lazy_proxy()
    }

    /// Resolve (loading if needed) the real value behind the proxy
    fn resolve_real(&self) -> Result<Value>;
}

type Loader = Box<dyn Fn() -> Result<Value> + Send + Sync>;

/// Ready-made [`Unwrappable`] backed by a loader closure
///
/// The loader runs at most once successfully; its value is cached.
pub struct LazyValue {
    proxy_type: TypeToken,
    loader: Loader,
    resolved: OnceLock<Value>,
}

impl LazyValue {
    /// Proxy of the built-in `LazyProxy` type
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        Self::with_type(TypeToken::lazy_proxy(), loader)
    }

    /// Proxy reporting a custom runtime type
    pub fn with_type<F>(proxy_type: impl Into<TypeToken>, loader: F) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            proxy_type: proxy_type.into(),
            loader: Box::new(loader),
            resolved: OnceLock::new(),
        }
    }

    /// Proxy around an already-loaded value
    pub fn ready(value: Value) -> Self {
        let lazy = Self::new(|| {
            Err(BindError::ProxyResolution(
                "loader of a ready proxy must not run".to_string(),
            ))
        });
        let _ = lazy.resolved.set(value);
        lazy
    }

    /// Whether the real value has been loaded
    pub fn is_initialized(&self) -> bool {
        self.resolved.get().is_some()
    }
}

impl Unwrappable for LazyValue {
    fn proxy_type(&self) -> TypeToken {
        self.proxy_type.clone()
    }

    fn resolve_real(&self) -> Result<Value> {
        if let Some(value) = self.resolved.get() {
            return Ok(value.clone());
        }
        let value = (self.loader)()?;
        Ok(self.resolved.get_or_init(|| value).clone())
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyValue")
            .field("proxy_type", &self.proxy_type)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Instance;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_loader_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let lazy = LazyValue::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Instance::new("Order").with("id", 1i64).into())
        });

        assert!(!lazy.is_initialized());
        let first = lazy.resolve_real().unwrap();
        let second = lazy.resolve_real().unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(lazy.is_initialized());
    }

    #[test]
    fn test_failed_load_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let lazy = LazyValue::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(BindError::ProxyResolution("session closed".into()))
            } else {
                Ok(Value::Int(3))
            }
        });

        assert!(lazy.resolve_real().is_err());
        assert_eq!(lazy.resolve_real().unwrap(), Value::Int(3));
    }

    #[test]
    fn test_ready_and_custom_type() {
        let lazy = LazyValue::ready(Value::Str("x".into()));
        assert!(lazy.is_initialized());
        assert_eq!(lazy.resolve_real().unwrap(), Value::Str("x".into()));
        assert_eq!(lazy.proxy_type(), TypeToken::lazy_proxy());

        let typed = LazyValue::with_type("OrderProxy", || Ok(Value::Null));
        assert_eq!(typed.proxy_type().as_str(), "OrderProxy");
    }
}
