//! graphcypher - GraphQL-style graph operations to parameterized Cypher
//!
//! This crate compiles operations against a declared graph schema into one
//! Cypher statement plus parameters:
//! - Schema model with relationship, authorization and computed-field directives
//! - Filter and authorization rule compilation
//! - Nested mutation planning with cardinality guards
//! - Relay-style connections and aggregations
//!
//! ```no_run
//! use graphcypher::auth::AuthContext;
//! use graphcypher::graph_catalog::GraphSchemaConfig;
//! use graphcypher::translator::{translate, FieldSelection, Operation};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = GraphSchemaConfig::from_yaml_file("schema.yaml")?.build()?;
//! let operation = Operation::query(
//!     FieldSelection::new("movies").with_selections(FieldSelection::leaves(&["title"])),
//! );
//! let statement = translate(&schema, &operation, &AuthContext::anonymous())?;
//! println!("{}", statement.cypher);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod cypher;
pub mod executor;
pub mod filter;
pub mod graph_catalog;
pub mod pagination;
pub mod translator;

pub use cypher::CypherStatement;
pub use translator::{translate, Translator};
