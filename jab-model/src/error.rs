//! Error types for JAB

use thiserror::Error;

/// Broad classification of a [`BindError`]
///
/// Callers at the transport boundary use this to decide how a failure is
/// reported (e.g. `Argument` and `MalformedPayload` map to a bad request).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Build-time failure; fatal and never retried
    Configuration,
    /// The call itself is not meaningful (e.g. binding into a zero-arg method)
    Argument,
    /// The payload is not valid JSON or cannot be coerced to the declared types
    MalformedPayload,
    /// Reading or writing the underlying stream failed
    Io,
    /// A runtime guard tripped while walking a value graph
    Internal,
}

/// JAB error types
#[derive(Debug, Error)]
pub enum BindError {
    /// A type name is not declared in the schema.
    #[error("Unknown type: {0}")]
    UnknownType(String),
    /// Schema definitions are inconsistent.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// Adapter was registered against a type that the schema cannot resolve.
    #[error("Adapter target '{target}' is not a class or enum declared in the schema")]
    UnresolvedAdapterTarget {
        /// The token the adapter was registered with
        target: String,
    },
    /// Two adapters claim the same target with the same locality and direction.
    #[error("Ambiguous registration: more than one {locality} {direction} for '{target}'")]
    DuplicateAdapter {
        /// Target type shared by both registrations
        target: String,
        /// "exact" or "hierarchical"
        locality: &'static str,
        /// "serializer" or "deserializer"
        direction: &'static str,
    },
    /// Parameter-name provider disagrees with the method signature.
    #[error(
        "Parameter name provider returned {names} names for '{method}', which declares {declared} parameters"
    )]
    ParameterNameMismatch {
        /// Qualified method name
        method: String,
        /// Number of names returned by the provider
        names: usize,
        /// Number of declared parameters
        declared: usize,
    },
    /// A dotted include/exclude path does not resolve against the schema.
    #[error("Invalid field path '{path}' from '{root}': {reason}")]
    InvalidPath {
        /// Dotted path as given
        path: String,
        /// Type the path was resolved from
        root: String,
        /// Why resolution stopped
        reason: String,
    },
    /// Configured limits exceed the hard maximums.
    #[error("Configuration exceeds hard limits: {0}")]
    ConfigurationExceedsHardLimits(String),
    /// Target method declares no parameters, so there is nothing to bind.
    #[error("Method '{method}' has no parameters; refusing to deserialize a payload into it")]
    NoParameters {
        /// Qualified method name
        method: String,
    },
    /// Payload stream contained no JSON at all.
    #[error("Empty payload")]
    EmptyPayload,
    /// Payload root is not a JSON object.
    #[error("Payload root must be a JSON object, found {found}")]
    NotAnObject {
        /// JSON type found at the root
        found: &'static str,
    },
    /// A JSON value cannot be coerced to the declared type.
    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        /// JSON path of the offending value (e.g. `$.order.products[1].id`)
        path: String,
        /// Declared type
        expected: String,
        /// What was found instead
        found: String,
    },
    /// A registered adapter rejected its input.
    #[error("Adapter failed for '{target}': {message}")]
    Adapter {
        /// Type the adapter was invoked for
        target: String,
        /// Adapter-supplied message
        message: String,
    },
    /// A value cannot be represented in JSON.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// A lazy proxy failed to produce its real value.
    #[error("Proxy resolution failed: {0}")]
    ProxyResolution(String),
    /// A configured limit was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
    /// I/O operation failed while reading or writing data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BindError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BindError::UnknownType(_)
            | BindError::InvalidSchema(_)
            | BindError::UnresolvedAdapterTarget { .. }
            | BindError::DuplicateAdapter { .. }
            | BindError::ParameterNameMismatch { .. }
            | BindError::InvalidPath { .. }
            | BindError::ConfigurationExceedsHardLimits(_) => ErrorKind::Configuration,
            BindError::NoParameters { .. } => ErrorKind::Argument,
            BindError::EmptyPayload
            | BindError::NotAnObject { .. }
            | BindError::TypeMismatch { .. }
            | BindError::Adapter { .. } => ErrorKind::MalformedPayload,
            BindError::Json(e) if e.is_io() => ErrorKind::Io,
            BindError::Json(_) => ErrorKind::MalformedPayload,
            BindError::Io(_) => ErrorKind::Io,
            BindError::InvalidValue(_)
            | BindError::ProxyResolution(_)
            | BindError::LimitExceeded(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for adapters reporting a rejected input
    pub fn adapter(target: impl Into<String>, message: impl Into<String>) -> Self {
        BindError::Adapter {
            target: target.into(),
            message: message.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            BindError::NoParameters {
                method: "OrderController.list".into()
            }
            .kind(),
            ErrorKind::Argument
        );
        assert_eq!(
            BindError::UnknownType("Nope".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(BindError::EmptyPayload.kind(), ErrorKind::MalformedPayload);

        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(BindError::from(parse).kind(), ErrorKind::MalformedPayload);
    }

    #[test]
    fn test_messages_name_the_offender() {
        let err = BindError::TypeMismatch {
            path: "$.order.id".into(),
            expected: "long".into(),
            found: "string \"x\"".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("$.order.id"));
        assert!(msg.contains("long"));
    }
}
