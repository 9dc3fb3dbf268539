//! Shared schema fixture for unit tests.

use super::config::GraphSchemaConfig;
use super::graph_schema::GraphSchema;

pub const MOVIES_YAML: &str = include_str!("../../tests/fixtures/movies.yaml");

pub fn movie_schema() -> GraphSchema {
    GraphSchemaConfig::from_yaml_str(MOVIES_YAML)
        .expect("fixture parses")
        .build()
        .expect("fixture builds")
}
