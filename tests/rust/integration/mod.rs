//! Integration tests - whole operations translated through the public API
//!
//! The executor suite drives statements through an in-memory executor; nothing
//! here needs a running database.

use graphcypher::auth::AuthContext;
use graphcypher::graph_catalog::{GraphSchema, GraphSchemaConfig};
use graphcypher::translator::{FieldSelection, Operation, TranslateError};
use graphcypher::CypherStatement;

mod config_tests;
mod connection_tests;
mod executor_tests;
mod mutation_tests;

pub const MOVIES_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/movies.yaml");

pub fn movie_schema() -> GraphSchema {
    GraphSchemaConfig::from_yaml_file(MOVIES_FIXTURE)
        .and_then(|config| config.build())
        .expect("movie fixture should build")
}

pub fn run_query(root: FieldSelection) -> Result<CypherStatement, TranslateError> {
    graphcypher::translate(&movie_schema(), &Operation::query(root), &AuthContext::anonymous())
}

pub fn run_mutation(root: FieldSelection) -> Result<CypherStatement, TranslateError> {
    graphcypher::translate(&movie_schema(), &Operation::mutation(root), &AuthContext::anonymous())
}
