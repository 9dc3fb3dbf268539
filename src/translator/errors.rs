//! # Translation Error Types
//!
//! Request-level failures. Every variant is reported before a statement is
//! emitted, except `Cardinality`, `Forbidden` and `Execution`, which may also be
//! recovered from database errors raised by guards inside an emitted statement
//! (see [`crate::executor::classify_execution_error`]).
//!
//! The authorization message is always exactly `Forbidden`, whichever rule
//! failed.

use thiserror::Error;

use crate::graph_catalog::NestedOperation;

/// Coarse category of a [`TranslateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Translation,
    Authentication,
    Authorization,
    Cardinality,
    Execution,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslateError {
    #[error("Unknown root field `{field}`")]
    UnknownRootField { field: String },

    #[error("Unknown field `{field}` on type `{type_name}`")]
    UnknownField { type_name: String, field: String },

    #[error("Operation `{operation}` is disabled for type `{type_name}`")]
    OperationDisabled { type_name: String, operation: String },

    #[error("Nested operation {operation} is not allowed on `{type_name}.{field}`")]
    NestedOperationNotAllowed {
        type_name: String,
        field: String,
        operation: NestedOperation,
    },

    #[error("Unsupported filter `{key}` on type `{type_name}`: {reason}")]
    UnsupportedFilter {
        type_name: String,
        key: String,
        reason: String,
    },

    #[error("Invalid argument at {location}: {message}")]
    InvalidArgument { location: String, message: String },

    #[error("Invalid cursor `{cursor}`")]
    InvalidCursor { cursor: String },

    #[error("Missing required field `{field}` on type `{type_name}`")]
    MissingRequiredField { type_name: String, field: String },

    #[error("Selection depth {depth} exceeds the maximum of {max}")]
    SelectionTooDeep { depth: usize, max: usize },

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,

    #[error("{message}")]
    Cardinality { message: String },

    #[error("{message}")]
    Execution { message: String },
}

impl TranslateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslateError::Unauthenticated => ErrorKind::Authentication,
            TranslateError::Forbidden => ErrorKind::Authorization,
            TranslateError::Cardinality { .. } => ErrorKind::Cardinality,
            TranslateError::Execution { .. } => ErrorKind::Execution,
            _ => ErrorKind::Translation,
        }
    }

    pub fn invalid_argument(location: impl Into<String>, message: impl Into<String>) -> Self {
        TranslateError::InvalidArgument {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_filter(
        type_name: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        TranslateError::UnsupportedFilter {
            type_name: type_name.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        TranslateError::UnknownField {
            type_name: type_name.into(),
            field: field.into(),
        }
    }
}
