//! Error types for dependency injection

use thiserror::Error;

/// Errors that can occur while registering or resolving dependencies.
///
/// Variants raised during resolution carry the rendered trace of the
/// container's [`Tracer`](crate::Tracer) at the moment of failure.
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// No provider is registered for the requested name
    #[error("Provider for '{name}' not found\n{trace}")]
    DependencyNotFound { name: String, trace: String },

    /// Resolution of a name re-entered itself
    #[error("Ring dependency found for {name}.\n{trace}")]
    RingDependency { name: String, trace: String },

    /// The terminal element of a descriptor is not invocable
    #[error("Can't handle factory {factory}.\n{trace}")]
    InvalidFactory { factory: String, trace: String },

    /// The terminal element of a descriptor is not a constructible type
    #[error("Instantiation of {constructor} not possible.\n{trace}")]
    Instantiation { constructor: String, trace: String },

    /// No dependency list was given and none could be extracted
    #[error("Can't extract parameters from given argument with type '{kind}'")]
    InvalidArgument { kind: String },

    /// The operation exists only for interface symmetry
    #[error("Not implemented: {operation}")]
    NotImplemented { operation: &'static str },

    /// A resolved value does not have the type a caller asked for
    #[error("Type mismatch for {subject}: expected {expected}, found {found}")]
    TypeMismatch {
        subject: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A factory read a positional argument that was not supplied
    #[error("Missing argument #{index} ({len} supplied)")]
    MissingArgument { index: usize, len: usize },

    /// A self-registered handle outlived its container or injector
    #[error("Container has been dropped")]
    ContainerDropped,

    /// A user factory reported a failure
    #[error("Failed to create {name}: {reason}")]
    CreationFailed { name: String, reason: String },
}

impl DiError {
    /// Create a DependencyNotFound error
    #[inline]
    pub fn not_found(name: impl Into<String>, trace: impl ToString) -> Self {
        Self::DependencyNotFound {
            name: name.into(),
            trace: trace.to_string(),
        }
    }

    /// Create a RingDependency error
    #[inline]
    pub fn ring(name: impl Into<String>, trace: impl ToString) -> Self {
        Self::RingDependency {
            name: name.into(),
            trace: trace.to_string(),
        }
    }

    /// Create an InvalidFactory error
    #[inline]
    pub fn invalid_factory(factory: impl Into<String>, trace: impl ToString) -> Self {
        Self::InvalidFactory {
            factory: factory.into(),
            trace: trace.to_string(),
        }
    }

    /// Create an Instantiation error
    #[inline]
    pub fn instantiation(constructor: impl Into<String>, trace: impl ToString) -> Self {
        Self::Instantiation {
            constructor: constructor.into(),
            trace: trace.to_string(),
        }
    }

    /// Create an InvalidArgument error
    #[inline]
    pub fn invalid_argument(kind: impl Into<String>) -> Self {
        Self::InvalidArgument { kind: kind.into() }
    }

    /// Create a TypeMismatch error for a value expected to hold `T`
    #[inline]
    pub fn type_mismatch<T: 'static>(subject: impl Into<String>, found: &'static str) -> Self {
        Self::TypeMismatch {
            subject: subject.into(),
            expected: std::any::type_name::<T>(),
            found,
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// The trace captured when this error was raised, if any.
    pub fn trace(&self) -> Option<&str> {
        match self {
            Self::DependencyNotFound { trace, .. }
            | Self::RingDependency { trace, .. }
            | Self::InvalidFactory { trace, .. }
            | Self::Instantiation { trace, .. } => Some(trace),
            _ => None,
        }
    }
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_dependency() {
        let err = DiError::not_found("UnknownKey", "UnknownKey requested (");
        let message = err.to_string();
        assert!(message.starts_with("Provider for 'UnknownKey' not found"));
        assert!(message.ends_with("UnknownKey requested ("));
    }

    #[test]
    fn test_trace_accessor() {
        let err = DiError::ring("A", "trace text");
        assert_eq!(err.trace(), Some("trace text"));

        let err = DiError::invalid_argument("str");
        assert_eq!(err.trace(), None);
    }

    #[test]
    fn test_type_mismatch_names_both_types() {
        let err = DiError::type_mismatch::<u32>("'count'", "alloc::string::String");
        let message = err.to_string();
        assert!(message.contains("u32"));
        assert!(message.contains("alloc::string::String"));
    }
}
