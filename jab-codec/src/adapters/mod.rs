//! Adapters the engine installs on its own

pub mod proxy;

pub use proxy::LazyProxyUnwrapper;
