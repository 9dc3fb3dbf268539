use super::errors::ModelError;
use super::graph_schema::GraphSchema;
use super::schema_types::{
    AuthOperation, Cardinality, Direction, MutationKind, NestedOperation, TimestampOperation,
    Timing,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Graph schema model configuration.
///
/// The schema is declared once in YAML (or JSON) and built into an immutable
/// [`GraphSchema`] at startup:
///
/// ```yaml
/// features:
///   filters:
///     string_ordering: false   # enable _LT/_GT on String attributes everywhere
///     regex_matching: false    # enable _MATCHES everywhere
/// jwt:
///   claims:
///     roles: realm_access.roles
/// nodes:
///   - name: Movie
///     attributes:
///       - { name: id, type: ID, id: { autogenerate: true } }
///       - { name: title, type: String, nullable: false }
///     relationships:
///       - name: actors
///         type: ACTED_IN
///         direction: IN
///         target: Actor
///         properties: ActedIn
///     authorization:
///       filter:
///         - where: { node: { owner: "$jwt.sub" } }
/// relationship_properties:
///   - name: ActedIn
///     attributes:
///       - { name: role, type: String }
/// ```
///
/// # Usage
///
/// ```ignore
/// let config = GraphSchemaConfig::from_yaml_file("schema.yaml")?;
/// let schema = config.build()?;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSchemaConfig {
    /// Optional schema name, only used in log output
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub features: FeaturesDefinition,
    #[serde(default)]
    pub jwt: Option<JwtDefinition>,
    pub nodes: Vec<NodeDefinition>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceDefinition>,
    #[serde(default)]
    pub unions: Vec<UnionDefinition>,
    #[serde(default)]
    pub enums: Vec<EnumDefinition>,
    #[serde(default)]
    pub relationship_properties: Vec<PropertiesDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeaturesDefinition {
    #[serde(default)]
    pub filters: FilterFeatures,
}

/// Schema-wide opt-in filter operators.
///
/// Graph databases do not total-order strings, and unrestricted regular
/// expressions are a backtracking hazard, so both are off unless enabled here
/// or on the individual attribute.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterFeatures {
    #[serde(default)]
    pub string_ordering: bool,
    #[serde(default)]
    pub regex_matching: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JwtDefinition {
    /// Claim name → dotted path inside the token payload
    /// Example: {"roles": "realm_access.roles"}
    #[serde(default)]
    pub claims: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub name: String,
    /// Database labels; defaults to `[name]`
    #[serde(default)]
    pub labels: Vec<String>,
    /// Plural used for root field names; defaults to lower-camel `name` + "s"
    #[serde(default)]
    pub plural: Option<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDefinition>,
    #[serde(default)]
    pub authorization: Option<AuthorizationDefinition>,
    #[serde(default)]
    pub authentication: Option<AuthenticationDefinition>,
    #[serde(default)]
    pub limit: Option<LimitDefinition>,
    #[serde(default)]
    pub query: Option<QueryOptionsDefinition>,
    #[serde(default)]
    pub mutation: Option<MutationOptionsDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    /// Scalar, enum, temporal or spatial type name (e.g. "String", "DateTime", "Point")
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub list: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub id: Option<IdDefinition>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub timestamps: Vec<TimestampOperation>,
    #[serde(default)]
    pub computed: Option<ComputedDefinition>,
    #[serde(default)]
    pub filters: Option<AttributeFilterDefinition>,
    #[serde(default)]
    pub authorization: Option<AuthorizationDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdDefinition {
    #[serde(default = "default_true")]
    pub autogenerate: bool,
}

/// Attribute whose value is produced by a Cypher statement instead of a stored property.
/// The statement sees the owning node as `this` and must return `column`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputedDefinition {
    pub statement: String,
    pub column: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeFilterDefinition {
    #[serde(default)]
    pub ordering: Option<bool>,
    #[serde(default)]
    pub matches: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub direction: Direction,
    pub target: String,
    #[serde(default)]
    pub cardinality: Cardinality,
    #[serde(default)]
    pub required: bool,
    /// Defaults to all nested operations
    #[serde(default)]
    pub nested_operations: Option<Vec<NestedOperation>>,
    #[serde(default)]
    pub properties: Option<String>,
    #[serde(default)]
    pub authorization: Option<AuthorizationDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationDefinition {
    #[serde(default)]
    pub filter: Vec<FilterRuleDefinition>,
    #[serde(default)]
    pub validate: Vec<ValidateRuleDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRuleDefinition {
    #[serde(default)]
    pub operations: Option<Vec<AuthOperation>>,
    #[serde(default = "default_true")]
    pub require_authentication: bool,
    #[serde(rename = "where")]
    pub predicate: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRuleDefinition {
    #[serde(default)]
    pub operations: Option<Vec<AuthOperation>>,
    #[serde(default)]
    pub when: Option<Vec<Timing>>,
    #[serde(default = "default_true")]
    pub require_authentication: bool,
    #[serde(rename = "where")]
    pub predicate: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthenticationDefinition {
    #[serde(default)]
    pub operations: Option<Vec<AuthOperation>>,
    /// Claim predicate the token must satisfy, e.g. `{ roles_INCLUDES: admin }`
    #[serde(default)]
    pub jwt: Option<Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LimitDefinition {
    #[serde(default)]
    pub default: Option<u64>,
    #[serde(default)]
    pub max: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueryOptionsDefinition {
    #[serde(default = "default_true")]
    pub read: bool,
    #[serde(default = "default_true")]
    pub aggregate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationOptionsDefinition {
    pub operations: Vec<MutationKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceDefinition {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
    #[serde(default)]
    pub authorization: Option<AuthorizationDefinition>,
    #[serde(default)]
    pub authentication: Option<AuthenticationDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnionDefinition {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDefinition {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertiesDefinition {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

fn default_true() -> bool {
    true
}

impl GraphSchemaConfig {
    /// Load configuration from a YAML file (JSON is valid YAML and works too)
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ModelError::ConfigReadError {
            error: format!("{}: {}", path.as_ref().display(), e),
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ModelError> {
        serde_yaml::from_str(yaml).map_err(|e| ModelError::ConfigParseError {
            error: e.to_string(),
        })
    }

    /// Build the immutable schema model from this configuration
    pub fn build(&self) -> Result<GraphSchema, ModelError> {
        GraphSchema::build(self)
    }
}
