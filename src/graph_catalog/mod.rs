pub mod auth_rules;
pub mod config;
pub mod errors;
pub mod graph_schema;
pub mod schema_types;
pub mod schema_validator;

#[cfg(test)]
pub mod testing;

// Re-export commonly used types
pub use auth_rules::{AuthPredicate, AuthenticationRule, AuthorizationRules, FilterRule, ValidateRule};
pub use config::{FilterFeatures, GraphSchemaConfig};
pub use errors::ModelError;
pub use graph_schema::{
    AttributeKind, AttributeSchema, ComputedField, DefaultPolicy, FieldContainer, GraphSchema,
    InterfaceSchema, LimitSchema, NodeSchema, PrimaryKeyStrategy, PropertiesSchema, QueryFlags,
    RelationshipSchema, RelationshipTarget, RootField, TemporalKind, UnionSchema,
};
pub use schema_types::{
    AuthOperation, Cardinality, Direction, MutationKind, NestedOperation, Timing,
};
pub use schema_validator::SchemaValidator;
