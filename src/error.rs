//! Error types for the class engine

use thiserror::Error;

use crate::value::{Str, Value};

/// Main error type for class definition and instance construction.
///
/// Definition errors are fatal to the `define_class` call that raised them;
/// nothing is registered. Every other variant is a runtime error, fatal only
/// to the call or construction that raised it.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("DefinitionError: {message}")]
    Definition { message: String },

    #[error("SyntaxError: {message}")]
    Syntax { message: String },

    #[error("TypeError: {message}")]
    Type { message: String },

    #[error("ReferenceError: {message}")]
    Reference { message: String },

    #[error("{kind}: {message}")]
    Runtime { kind: String, message: String },

    /// A value raised by user code (a member body returning a custom error value)
    #[error("Thrown: {}", .value.to_display())]
    Thrown { value: Value },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn definition_error(message: impl Into<String>) -> Self {
        Error::Definition {
            message: message.into(),
        }
    }

    /// Two Box attributes that cannot hold at the same time
    pub fn conflicting_attributes(first: &str, second: &str) -> Self {
        Error::Definition {
            message: format!("member attributes '{}' and '{}' are mutually exclusive", first, second),
        }
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        Error::Syntax {
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Error::Type {
            message: message.into(),
        }
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        Error::Reference {
            message: message.into(),
        }
    }

    pub fn unresolved_link(key: &Str) -> Self {
        Error::Reference {
            message: format!("link '{}' has no resolved target", key),
        }
    }

    pub fn runtime_error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Runtime {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn thrown(value: Value) -> Self {
        Error::Thrown { value }
    }

    /// Create an internal error for unexpected engine states
    pub fn internal_error(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    pub fn is_definition_error(&self) -> bool {
        matches!(self, Error::Definition { .. })
    }

    pub fn is_runtime_error(&self) -> bool {
        !self.is_definition_error()
    }

    /// The error-kind name as it appears in messages ("TypeError", ...)
    pub fn kind(&self) -> &str {
        match self {
            Error::Definition { .. } => "DefinitionError",
            Error::Syntax { .. } => "SyntaxError",
            Error::Type { .. } => "TypeError",
            Error::Reference { .. } => "ReferenceError",
            Error::Runtime { kind, .. } => kind,
            Error::Thrown { .. } => "Thrown",
            Error::Internal(_) => "InternalError",
        }
    }
}
