//! # Graph Schema Error Types
//!
//! Errors raised while loading and building the graph schema model.
//!
//! A [`ModelError`] always means the schema itself is inconsistent. It is surfaced
//! once, when [`GraphSchema::build`](super::GraphSchema::build) runs at startup, and
//! never from a per-request translation.
//!
//! ## Error Categories
//!
//! - **Reference Errors**: a relationship target, properties type, interface or
//!   union member that does not exist
//! - **Declaration Errors**: duplicate names, unknown attribute types, invalid
//!   directive combinations
//! - **Configuration Errors**: file I/O and YAML parsing issues

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("Duplicate type name `{name}`")]
    DuplicateType { name: String },

    #[error("Duplicate field `{field}` on type `{type_name}`")]
    DuplicateField { type_name: String, field: String },

    #[error("Unknown attribute type `{attribute_type}` for `{type_name}.{field}`")]
    UnknownAttributeType {
        type_name: String,
        field: String,
        attribute_type: String,
    },

    #[error("Relationship `{type_name}.{field}` targets unknown type `{target}`")]
    UnknownRelationshipTarget {
        type_name: String,
        field: String,
        target: String,
    },

    #[error("Relationship `{type_name}.{field}` references unknown properties type `{properties}`")]
    UnknownPropertiesType {
        type_name: String,
        field: String,
        properties: String,
    },

    #[error("Type `{type_name}` implements unknown interface `{interface}`")]
    UnknownInterface { type_name: String, interface: String },

    #[error("Type `{type_name}` does not declare interface field `{interface}.{field}`")]
    MissingInterfaceField {
        type_name: String,
        interface: String,
        field: String,
    },

    #[error("Union `{union}` has unknown member `{member}`")]
    UnknownUnionMember { union: String, member: String },

    #[error("Invalid directive on `{location}`: {message}")]
    InvalidDirective { location: String, message: String },

    #[error("Invalid authorization rule on `{location}`: {message}")]
    InvalidAuthorizationRule { location: String, message: String },

    #[error("Root field `{field}` is declared by both `{first}` and `{second}`")]
    RootFieldConflict {
        field: String,
        first: String,
        second: String,
    },

    #[error("Failed to read schema file: {error}")]
    ConfigReadError { error: String },

    #[error("Failed to parse schema: {error}")]
    ConfigParseError { error: String },
}

impl ModelError {
    pub fn invalid_directive(location: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::InvalidDirective {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn invalid_rule(location: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::InvalidAuthorizationRule {
            location: location.into(),
            message: message.into(),
        }
    }
}
