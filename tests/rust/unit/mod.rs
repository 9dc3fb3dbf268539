//! Unit tests - single translations checked against the emitted text
//!
//! Everything here runs against the movie fixture schema; no database is needed.

use graphcypher::graph_catalog::{GraphSchema, GraphSchemaConfig};

mod authorization_tests;
mod filter_operator_tests;
mod schema_model_tests;

pub const MOVIES_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/movies.yaml");

pub fn movie_schema() -> GraphSchema {
    GraphSchemaConfig::from_yaml_file(MOVIES_FIXTURE)
        .and_then(|config| config.build())
        .expect("movie fixture should build")
}
