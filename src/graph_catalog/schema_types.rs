//! Small enumerations shared between the YAML configuration and the built model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge direction as seen from the node that declares the relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Out,
    In,
    Undirected,
}

impl Direction {
    pub fn reversed(self) -> Direction {
        match self {
            Direction::Out => Direction::In,
            Direction::In => Direction::Out,
            Direction::Undirected => Direction::Undirected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    #[default]
    Many,
}

/// Operations a relationship allows inside a nested mutation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NestedOperation {
    Create,
    Connect,
    ConnectOrCreate,
    Update,
    Disconnect,
    Delete,
}

impl NestedOperation {
    pub const ALL: [NestedOperation; 6] = [
        NestedOperation::Create,
        NestedOperation::Connect,
        NestedOperation::ConnectOrCreate,
        NestedOperation::Update,
        NestedOperation::Disconnect,
        NestedOperation::Delete,
    ];

    /// Argument name used for this operation in mutation inputs.
    pub fn argument_name(self) -> &'static str {
        match self {
            NestedOperation::Create => "create",
            NestedOperation::Connect => "connect",
            NestedOperation::ConnectOrCreate => "connectOrCreate",
            NestedOperation::Update => "update",
            NestedOperation::Disconnect => "disconnect",
            NestedOperation::Delete => "delete",
        }
    }
}

impl fmt::Display for NestedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NestedOperation::Create => "CREATE",
            NestedOperation::Connect => "CONNECT",
            NestedOperation::ConnectOrCreate => "CONNECT_OR_CREATE",
            NestedOperation::Update => "UPDATE",
            NestedOperation::Disconnect => "DISCONNECT",
            NestedOperation::Delete => "DELETE",
        };
        write!(f, "{}", name)
    }
}

/// Operation kinds authorization and authentication rules are scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthOperation {
    Read,
    Aggregate,
    Create,
    Update,
    Delete,
    CreateRelationship,
    DeleteRelationship,
}

impl AuthOperation {
    pub const ALL: [AuthOperation; 7] = [
        AuthOperation::Read,
        AuthOperation::Aggregate,
        AuthOperation::Create,
        AuthOperation::Update,
        AuthOperation::Delete,
        AuthOperation::CreateRelationship,
        AuthOperation::DeleteRelationship,
    ];

    /// Operations a `filter` rule applies to when none are listed. A filter cannot
    /// narrow a node that does not exist yet, so CREATE is absent.
    pub const FILTER_DEFAULT: [AuthOperation; 6] = [
        AuthOperation::Read,
        AuthOperation::Aggregate,
        AuthOperation::Update,
        AuthOperation::Delete,
        AuthOperation::CreateRelationship,
        AuthOperation::DeleteRelationship,
    ];
}

impl fmt::Display for AuthOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthOperation::Read => "READ",
            AuthOperation::Aggregate => "AGGREGATE",
            AuthOperation::Create => "CREATE",
            AuthOperation::Update => "UPDATE",
            AuthOperation::Delete => "DELETE",
            AuthOperation::CreateRelationship => "CREATE_RELATIONSHIP",
            AuthOperation::DeleteRelationship => "DELETE_RELATIONSHIP",
        };
        write!(f, "{}", name)
    }
}

/// When a `validate` rule is evaluated relative to the writes of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Timing {
    Before,
    After,
}

/// Root mutation kinds that can be switched off per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

/// Mutations that refresh a timestamp attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimestampOperation {
    Create,
    Update,
}
