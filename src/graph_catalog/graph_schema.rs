use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::auth_rules::{AuthenticationRule, AuthorizationRules};
use super::config::{
    AttributeDefinition, FilterFeatures, GraphSchemaConfig, LimitDefinition, NodeDefinition,
    RelationshipDefinition,
};
use super::errors::ModelError;
use super::schema_types::{
    Cardinality, Direction, MutationKind, NestedOperation, TimestampOperation,
};
use super::schema_validator::SchemaValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    Date,
    DateTime,
    LocalDateTime,
    Time,
    LocalTime,
}

impl TemporalKind {
    /// Cypher function constructing a value of this type from a string or map.
    pub fn constructor(self) -> &'static str {
        match self {
            TemporalKind::Date => "date",
            TemporalKind::DateTime => "datetime",
            TemporalKind::LocalDateTime => "localdatetime",
            TemporalKind::Time => "time",
            TemporalKind::LocalTime => "localtime",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Id,
    String,
    Int,
    Float,
    BigInt,
    Boolean,
    Enum(String),
    Temporal(TemporalKind),
    Duration,
    Point,
    CartesianPoint,
}

impl AttributeKind {
    fn parse(type_name: &str, enums: &HashMap<String, Vec<String>>) -> Option<Self> {
        let kind = match type_name {
            "ID" => AttributeKind::Id,
            "String" => AttributeKind::String,
            "Int" => AttributeKind::Int,
            "Float" => AttributeKind::Float,
            "BigInt" => AttributeKind::BigInt,
            "Boolean" => AttributeKind::Boolean,
            "Date" => AttributeKind::Temporal(TemporalKind::Date),
            "DateTime" => AttributeKind::Temporal(TemporalKind::DateTime),
            "LocalDateTime" => AttributeKind::Temporal(TemporalKind::LocalDateTime),
            "Time" => AttributeKind::Temporal(TemporalKind::Time),
            "LocalTime" => AttributeKind::Temporal(TemporalKind::LocalTime),
            "Duration" => AttributeKind::Duration,
            "Point" => AttributeKind::Point,
            "CartesianPoint" => AttributeKind::CartesianPoint,
            other if enums.contains_key(other) => AttributeKind::Enum(other.to_string()),
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_string_like(&self) -> bool {
        matches!(self, AttributeKind::Id | AttributeKind::String)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AttributeKind::Int | AttributeKind::Float | AttributeKind::BigInt
        )
    }

    pub fn is_spatial(&self) -> bool {
        matches!(self, AttributeKind::Point | AttributeKind::CartesianPoint)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultPolicy {
    None,
    Value(Value),
    GeneratedId,
    Timestamp { on_create: bool, on_update: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedField {
    pub statement: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSchema {
    pub name: String,
    pub kind: AttributeKind,
    pub list: bool,
    pub nullable: bool,
    pub unique: bool,
    pub default: DefaultPolicy,
    pub computed: Option<ComputedField>,
    /// `_LT/_LTE/_GT/_GTE` on string-like attributes
    pub ordering_enabled: bool,
    /// `_MATCHES` on string-like attributes
    pub matches_enabled: bool,
    pub authorization: AuthorizationRules,
}

impl AttributeSchema {
    pub fn is_computed(&self) -> bool {
        self.computed.is_some()
    }

    pub fn is_generated_id(&self) -> bool {
        matches!(self.default, DefaultPolicy::GeneratedId)
    }

    /// Whether mutation inputs may assign this attribute directly.
    pub fn is_settable(&self) -> bool {
        !self.is_computed()
            && !self.is_generated_id()
            && !matches!(self.default, DefaultPolicy::Timestamp { .. })
    }

    /// Whether a create input must supply a value.
    pub fn is_required_on_create(&self) -> bool {
        !self.nullable && self.is_settable() && matches!(self.default, DefaultPolicy::None)
    }

    /// Usable as a `connectOrCreate` match key.
    pub fn is_unique_key(&self) -> bool {
        !self.is_computed() && (self.unique || self.is_generated_id())
    }
}

/// Where a relationship points.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationshipTarget {
    Node(String),
    Interface {
        name: String,
        implementations: Vec<String>,
    },
    Union {
        name: String,
        members: Vec<String>,
    },
}

impl RelationshipTarget {
    pub fn name(&self) -> &str {
        match self {
            RelationshipTarget::Node(name) => name,
            RelationshipTarget::Interface { name, .. } | RelationshipTarget::Union { name, .. } => {
                name
            }
        }
    }

    /// Concrete node types reachable through this target, in declaration order.
    pub fn concrete_types(&self) -> Vec<&str> {
        match self {
            RelationshipTarget::Node(name) => vec![name.as_str()],
            RelationshipTarget::Interface {
                implementations, ..
            } => implementations.iter().map(String::as_str).collect(),
            RelationshipTarget::Union { members, .. } => members.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_abstract(&self) -> bool {
        !matches!(self, RelationshipTarget::Node(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipSchema {
    pub name: String,
    pub edge_type: String,
    pub direction: Direction,
    pub target: RelationshipTarget,
    pub cardinality: Cardinality,
    pub required: bool,
    pub nested_operations: BTreeSet<NestedOperation>,
    pub properties: Option<String>,
    pub authorization: AuthorizationRules,
}

impl RelationshipSchema {
    pub fn is_one(&self) -> bool {
        self.cardinality == Cardinality::One
    }

    pub fn allows(&self, operation: NestedOperation) -> bool {
        self.nested_operations.contains(&operation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryKeyStrategy {
    None,
    GeneratedId { attribute: String },
    UniqueConstraint { attributes: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitSchema {
    pub default: Option<u64>,
    pub max: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryFlags {
    pub read: bool,
    pub aggregate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSchema {
    pub name: String,
    pub labels: Vec<String>,
    pub plural: String,
    pub interfaces: Vec<String>,
    pub attributes: Vec<AttributeSchema>,
    pub relationships: Vec<RelationshipSchema>,
    pub primary_key: PrimaryKeyStrategy,
    pub authorization: AuthorizationRules,
    pub authentication: Option<AuthenticationRule>,
    pub limit: Option<LimitSchema>,
    pub query: QueryFlags,
    pub mutations: BTreeSet<MutationKind>,
}

impl NodeSchema {
    pub fn relationship(&self, name: &str) -> Option<&RelationshipSchema> {
        self.relationships.iter().find(|r| r.name == name)
    }

    pub fn mutation_enabled(&self, kind: MutationKind) -> bool {
        self.mutations.contains(&kind)
    }

    pub fn one_relationships(&self) -> impl Iterator<Item = &RelationshipSchema> {
        self.relationships.iter().filter(|r| r.is_one())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceSchema {
    pub name: String,
    pub attributes: Vec<AttributeSchema>,
    pub implementations: Vec<String>,
    pub authorization: AuthorizationRules,
    pub authentication: Option<AuthenticationRule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionSchema {
    pub name: String,
    pub members: Vec<String>,
}

/// Attribute set carried by a relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertiesSchema {
    pub name: String,
    pub attributes: Vec<AttributeSchema>,
}

/// Anything that owns fields a `where` tree can address.
pub trait FieldContainer {
    fn type_name(&self) -> &str;
    fn attributes(&self) -> &[AttributeSchema];
    fn relationships(&self) -> &[RelationshipSchema] {
        &[]
    }

    fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes().iter().find(|a| a.name == name)
    }

    fn relationship_named(&self, name: &str) -> Option<&RelationshipSchema> {
        self.relationships().iter().find(|r| r.name == name)
    }

    fn has_field(&self, name: &str) -> bool {
        self.attribute(name).is_some() || self.relationship_named(name).is_some()
    }
}

impl FieldContainer for NodeSchema {
    fn type_name(&self) -> &str {
        &self.name
    }
    fn attributes(&self) -> &[AttributeSchema] {
        &self.attributes
    }
    fn relationships(&self) -> &[RelationshipSchema] {
        &self.relationships
    }
}

impl FieldContainer for InterfaceSchema {
    fn type_name(&self) -> &str {
        &self.name
    }
    fn attributes(&self) -> &[AttributeSchema] {
        &self.attributes
    }
}

impl FieldContainer for UnionSchema {
    fn type_name(&self) -> &str {
        &self.name
    }
    fn attributes(&self) -> &[AttributeSchema] {
        &[]
    }
}

impl FieldContainer for PropertiesSchema {
    fn type_name(&self) -> &str {
        &self.name
    }
    fn attributes(&self) -> &[AttributeSchema] {
        &self.attributes
    }
}

/// Root operation fields derived from node plurals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootField {
    Read(String),
    Connection(String),
    Aggregate(String),
    Create(String),
    Update(String),
    Delete(String),
}

impl RootField {
    pub fn type_name(&self) -> &str {
        match self {
            RootField::Read(t)
            | RootField::Connection(t)
            | RootField::Aggregate(t)
            | RootField::Create(t)
            | RootField::Update(t)
            | RootField::Delete(t) => t,
        }
    }
}

/// Immutable graph schema model.
///
/// Built once from a [`GraphSchemaConfig`]; a partially built model is never
/// observable because [`GraphSchema::build`] returns either the complete model
/// or the first [`ModelError`]. Share it between request handlers behind an `Arc`.
#[derive(Debug, Clone)]
pub struct GraphSchema {
    name: Option<String>,
    nodes: HashMap<String, NodeSchema>,
    node_order: Vec<String>,
    interfaces: HashMap<String, InterfaceSchema>,
    unions: HashMap<String, UnionSchema>,
    relationship_properties: HashMap<String, PropertiesSchema>,
    root_fields: HashMap<String, RootField>,
    filter_features: FilterFeatures,
    claim_paths: BTreeMap<String, Vec<String>>,
}

impl GraphSchema {
    pub fn build(config: &GraphSchemaConfig) -> Result<Self, ModelError> {
        let mut known_types = HashSet::new();
        let declared = config
            .nodes
            .iter()
            .map(|n| &n.name)
            .chain(config.interfaces.iter().map(|i| &i.name))
            .chain(config.unions.iter().map(|u| &u.name))
            .chain(config.enums.iter().map(|e| &e.name))
            .chain(config.relationship_properties.iter().map(|p| &p.name));
        for name in declared {
            if !known_types.insert(name.clone()) {
                return Err(ModelError::DuplicateType { name: name.clone() });
            }
        }

        let enums: HashMap<String, Vec<String>> = config
            .enums
            .iter()
            .map(|e| (e.name.clone(), e.values.clone()))
            .collect();
        let features = config.features.filters;

        let mut relationship_properties = HashMap::new();
        for definition in &config.relationship_properties {
            let attributes =
                build_attributes(&definition.name, &definition.attributes, &enums, features)?;
            relationship_properties.insert(
                definition.name.clone(),
                PropertiesSchema {
                    name: definition.name.clone(),
                    attributes,
                },
            );
        }

        let mut interfaces = HashMap::new();
        for definition in &config.interfaces {
            let implementations = config
                .nodes
                .iter()
                .filter(|n| n.implements.contains(&definition.name))
                .map(|n| n.name.clone())
                .collect();
            interfaces.insert(
                definition.name.clone(),
                InterfaceSchema {
                    name: definition.name.clone(),
                    attributes: build_attributes(
                        &definition.name,
                        &definition.attributes,
                        &enums,
                        features,
                    )?,
                    implementations,
                    authorization: AuthorizationRules::from_definition(
                        definition.authorization.as_ref(),
                        &definition.name,
                    )?,
                    authentication: AuthenticationRule::from_definition(
                        definition.authentication.as_ref(),
                        &definition.name,
                    )?,
                },
            );
        }

        let mut unions = HashMap::new();
        for definition in &config.unions {
            for member in &definition.members {
                if !config.nodes.iter().any(|n| &n.name == member) {
                    return Err(ModelError::UnknownUnionMember {
                        union: definition.name.clone(),
                        member: member.clone(),
                    });
                }
            }
            unions.insert(
                definition.name.clone(),
                UnionSchema {
                    name: definition.name.clone(),
                    members: definition.members.clone(),
                },
            );
        }

        let mut nodes = HashMap::new();
        let mut node_order = Vec::new();
        for definition in &config.nodes {
            let node = build_node(
                definition,
                &enums,
                features,
                &interfaces,
                &unions,
                &relationship_properties,
                config,
            )?;
            node_order.push(node.name.clone());
            nodes.insert(node.name.clone(), node);
        }

        let root_fields = build_root_fields(&node_order, &nodes)?;

        let claim_paths = config
            .jwt
            .as_ref()
            .map(|jwt| {
                jwt.claims
                    .iter()
                    .map(|(claim, path)| {
                        (claim.clone(), path.split('.').map(str::to_string).collect())
                    })
                    .collect()
            })
            .unwrap_or_default();

        let schema = GraphSchema {
            name: config.name.clone(),
            nodes,
            node_order,
            interfaces,
            unions,
            relationship_properties,
            root_fields,
            filter_features: features,
            claim_paths,
        };

        SchemaValidator::new(&schema).validate()?;

        log::info!(
            "Built graph schema {}: {} node types, {} interfaces, {} unions, {} root fields",
            schema.name.as_deref().unwrap_or("<unnamed>"),
            schema.nodes.len(),
            schema.interfaces.len(),
            schema.unions.len(),
            schema.root_fields.len()
        );
        Ok(schema)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn node(&self, name: &str) -> Option<&NodeSchema> {
        self.nodes.get(name)
    }

    /// Node types in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeSchema> {
        self.node_order.iter().filter_map(|n| self.nodes.get(n))
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceSchema> {
        self.interfaces.get(name)
    }

    pub fn union(&self, name: &str) -> Option<&UnionSchema> {
        self.unions.get(name)
    }

    pub fn relationship_properties(&self, name: &str) -> Option<&PropertiesSchema> {
        self.relationship_properties.get(name)
    }

    pub fn root_field(&self, name: &str) -> Option<&RootField> {
        self.root_fields.get(name)
    }

    pub fn filter_features(&self) -> FilterFeatures {
        self.filter_features
    }

    /// Path of a claim inside the token payload, honoring `jwt.claims` remapping.
    pub fn claim_path(&self, claim: &str) -> Vec<String> {
        self.claim_paths
            .get(claim)
            .cloned()
            .unwrap_or_else(|| claim.split('.').map(str::to_string).collect())
    }
}

fn build_node(
    definition: &NodeDefinition,
    enums: &HashMap<String, Vec<String>>,
    features: FilterFeatures,
    interfaces: &HashMap<String, InterfaceSchema>,
    unions: &HashMap<String, UnionSchema>,
    properties: &HashMap<String, PropertiesSchema>,
    config: &GraphSchemaConfig,
) -> Result<NodeSchema, ModelError> {
    let attributes = build_attributes(&definition.name, &definition.attributes, enums, features)?;

    let mut seen: HashSet<&str> = attributes.iter().map(|a| a.name.as_str()).collect();
    let mut relationships = Vec::with_capacity(definition.relationships.len());
    for rel in &definition.relationships {
        if !seen.insert(rel.name.as_str()) {
            return Err(ModelError::DuplicateField {
                type_name: definition.name.clone(),
                field: rel.name.clone(),
            });
        }
        relationships.push(build_relationship(
            &definition.name,
            rel,
            interfaces,
            unions,
            properties,
            config,
        )?);
    }

    for interface_name in &definition.implements {
        let interface = interfaces
            .get(interface_name)
            .ok_or_else(|| ModelError::UnknownInterface {
                type_name: definition.name.clone(),
                interface: interface_name.clone(),
            })?;
        for field in &interface.attributes {
            let matches = attributes
                .iter()
                .any(|a| a.name == field.name && a.kind == field.kind && a.list == field.list);
            if !matches {
                return Err(ModelError::MissingInterfaceField {
                    type_name: definition.name.clone(),
                    interface: interface_name.clone(),
                    field: field.name.clone(),
                });
            }
        }
    }

    let primary_key = if let Some(id) = attributes.iter().find(|a| a.is_generated_id()) {
        PrimaryKeyStrategy::GeneratedId {
            attribute: id.name.clone(),
        }
    } else {
        let unique: Vec<String> = attributes
            .iter()
            .filter(|a| a.unique)
            .map(|a| a.name.clone())
            .collect();
        if unique.is_empty() {
            PrimaryKeyStrategy::None
        } else {
            PrimaryKeyStrategy::UniqueConstraint { attributes: unique }
        }
    };

    let labels = if definition.labels.is_empty() {
        vec![definition.name.clone()]
    } else {
        definition.labels.clone()
    };

    let mutations = match &definition.mutation {
        Some(options) => options.operations.iter().copied().collect(),
        None => [
            MutationKind::Create,
            MutationKind::Update,
            MutationKind::Delete,
        ]
        .into_iter()
        .collect(),
    };

    Ok(NodeSchema {
        name: definition.name.clone(),
        labels,
        plural: definition
            .plural
            .clone()
            .unwrap_or_else(|| default_plural(&definition.name)),
        interfaces: definition.implements.clone(),
        attributes,
        relationships,
        primary_key,
        authorization: AuthorizationRules::from_definition(
            definition.authorization.as_ref(),
            &definition.name,
        )?,
        authentication: AuthenticationRule::from_definition(
            definition.authentication.as_ref(),
            &definition.name,
        )?,
        limit: build_limit(&definition.name, definition.limit.as_ref())?,
        query: definition
            .query
            .map(|q| QueryFlags {
                read: q.read,
                aggregate: q.aggregate,
            })
            .unwrap_or(QueryFlags {
                read: true,
                aggregate: true,
            }),
        mutations,
    })
}

fn build_relationship(
    owner: &str,
    definition: &RelationshipDefinition,
    interfaces: &HashMap<String, InterfaceSchema>,
    unions: &HashMap<String, UnionSchema>,
    properties: &HashMap<String, PropertiesSchema>,
    config: &GraphSchemaConfig,
) -> Result<RelationshipSchema, ModelError> {
    let location = format!("{}.{}", owner, definition.name);
    let target = if config.nodes.iter().any(|n| n.name == definition.target) {
        RelationshipTarget::Node(definition.target.clone())
    } else if let Some(interface) = interfaces.get(&definition.target) {
        RelationshipTarget::Interface {
            name: interface.name.clone(),
            implementations: interface.implementations.clone(),
        }
    } else if let Some(union) = unions.get(&definition.target) {
        RelationshipTarget::Union {
            name: union.name.clone(),
            members: union.members.clone(),
        }
    } else {
        return Err(ModelError::UnknownRelationshipTarget {
            type_name: owner.to_string(),
            field: definition.name.clone(),
            target: definition.target.clone(),
        });
    };

    if let Some(props) = &definition.properties {
        if !properties.contains_key(props) {
            return Err(ModelError::UnknownPropertiesType {
                type_name: owner.to_string(),
                field: definition.name.clone(),
                properties: props.clone(),
            });
        }
    }

    if definition.required && definition.cardinality == Cardinality::Many {
        return Err(ModelError::invalid_directive(
            &location,
            "`required` only applies to relationships with cardinality `one`",
        ));
    }

    if definition.edge_type.trim().is_empty() {
        return Err(ModelError::invalid_directive(&location, "edge type must not be empty"));
    }

    let nested_operations = match &definition.nested_operations {
        Some(ops) => ops.iter().copied().collect(),
        None => NestedOperation::ALL.into_iter().collect(),
    };

    Ok(RelationshipSchema {
        name: definition.name.clone(),
        edge_type: definition.edge_type.clone(),
        direction: definition.direction,
        target,
        cardinality: definition.cardinality,
        required: definition.required,
        nested_operations,
        properties: definition.properties.clone(),
        authorization: AuthorizationRules::from_definition(
            definition.authorization.as_ref(),
            &location,
        )?,
    })
}

fn build_attributes(
    owner: &str,
    definitions: &[AttributeDefinition],
    enums: &HashMap<String, Vec<String>>,
    features: FilterFeatures,
) -> Result<Vec<AttributeSchema>, ModelError> {
    let mut seen = HashSet::new();
    let mut attributes = Vec::with_capacity(definitions.len());

    for definition in definitions {
        if !seen.insert(definition.name.as_str()) {
            return Err(ModelError::DuplicateField {
                type_name: owner.to_string(),
                field: definition.name.clone(),
            });
        }
        let location = format!("{}.{}", owner, definition.name);
        let kind = AttributeKind::parse(&definition.type_name, enums).ok_or_else(|| {
            ModelError::UnknownAttributeType {
                type_name: owner.to_string(),
                field: definition.name.clone(),
                attribute_type: definition.type_name.clone(),
            }
        })?;

        let generated = definition.id.as_ref().is_some_and(|id| id.autogenerate);
        let default = if generated {
            if kind != AttributeKind::Id {
                return Err(ModelError::invalid_directive(
                    &location,
                    "generated ids require type ID",
                ));
            }
            DefaultPolicy::GeneratedId
        } else if !definition.timestamps.is_empty() {
            if !matches!(kind, AttributeKind::Temporal(_)) {
                return Err(ModelError::invalid_directive(
                    &location,
                    "timestamps require a temporal type",
                ));
            }
            DefaultPolicy::Timestamp {
                on_create: definition.timestamps.contains(&TimestampOperation::Create),
                on_update: definition.timestamps.contains(&TimestampOperation::Update),
            }
        } else if let Some(value) = &definition.default {
            DefaultPolicy::Value(value.clone())
        } else {
            DefaultPolicy::None
        };

        let computed = match &definition.computed {
            Some(computed) => {
                if computed.statement.trim().is_empty() || computed.column.trim().is_empty() {
                    return Err(ModelError::invalid_directive(
                        &location,
                        "computed attributes need a statement and a column",
                    ));
                }
                if !matches!(default, DefaultPolicy::None) {
                    return Err(ModelError::invalid_directive(
                        &location,
                        "computed attributes cannot have defaults",
                    ));
                }
                Some(ComputedField {
                    statement: computed.statement.clone(),
                    column: computed.column.clone(),
                })
            }
            None => None,
        };

        let filters = definition.filters.clone().unwrap_or_default();
        attributes.push(AttributeSchema {
            name: definition.name.clone(),
            kind,
            list: definition.list,
            nullable: definition.nullable,
            unique: definition.unique,
            default,
            computed,
            ordering_enabled: filters.ordering.unwrap_or(features.string_ordering),
            matches_enabled: filters.matches.unwrap_or(features.regex_matching),
            authorization: AuthorizationRules::from_definition(
                definition.authorization.as_ref(),
                &location,
            )?,
        });
    }

    Ok(attributes)
}

fn build_limit(owner: &str, definition: Option<&LimitDefinition>) -> Result<Option<LimitSchema>, ModelError> {
    let Some(definition) = definition else {
        return Ok(None);
    };
    if definition.default == Some(0) || definition.max == Some(0) {
        return Err(ModelError::invalid_directive(owner, "limit values must be positive"));
    }
    if let (Some(default), Some(max)) = (definition.default, definition.max) {
        if default > max {
            return Err(ModelError::invalid_directive(
                owner,
                format!("limit default {} exceeds max {}", default, max),
            ));
        }
    }
    Ok(Some(LimitSchema {
        default: definition.default,
        max: definition.max,
    }))
}

fn build_root_fields(
    order: &[String],
    nodes: &HashMap<String, NodeSchema>,
) -> Result<HashMap<String, RootField>, ModelError> {
    let mut fields: HashMap<String, RootField> = HashMap::new();
    for name in order {
        let Some(node) = nodes.get(name) else { continue };
        let plural = &node.plural;
        let upper = upper_first(plural);
        let candidates = [
            (plural.clone(), RootField::Read(name.clone())),
            (format!("{}Connection", plural), RootField::Connection(name.clone())),
            (format!("{}Aggregate", plural), RootField::Aggregate(name.clone())),
            (format!("create{}", upper), RootField::Create(name.clone())),
            (format!("update{}", upper), RootField::Update(name.clone())),
            (format!("delete{}", upper), RootField::Delete(name.clone())),
        ];
        for (field, root) in candidates {
            if let Some(existing) = fields.get(&field) {
                return Err(ModelError::RootFieldConflict {
                    field,
                    first: existing.type_name().to_string(),
                    second: name.clone(),
                });
            }
            fields.insert(field, root);
        }
    }
    Ok(fields)
}

fn default_plural(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("{}{}s", first.to_lowercase(), chars.as_str()),
        None => String::new(),
    }
}

pub(crate) fn upper_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}
