//! Mutation arguments parsed into a typed tree.
//!
//! Everything the emitted statement depends on is checked here, before any
//! clause exists: unknown fields, nested operations a relationship does not
//! allow, missing required attributes and malformed `connectOrCreate` keys.
//! Relationships are kept in schema declaration order so argument key order
//! never changes the statement.
//!
//! Inputs for interface and union relationships are keyed by the concrete
//! member type: `{ items: { Movie: { create: [...] }, Actor: { connect: [...] } } }`.

use serde_json::{Map, Value};

use crate::graph_catalog::{
    AttributeSchema, FieldContainer, GraphSchema, NestedOperation, NodeSchema, PropertiesSchema,
    RelationshipSchema, RelationshipTarget,
};

use super::errors::TranslateError;

/// Attribute values written as-is.
pub type Assignments<'a> = Vec<(&'a AttributeSchema, Value)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Assign,
    Increment,
    Decrement,
    Push,
    Pop,
}

impl SetOperator {
    const SUFFIXES: [(&'static str, SetOperator); 4] = [
        ("_INCREMENT", SetOperator::Increment),
        ("_DECREMENT", SetOperator::Decrement),
        ("_PUSH", SetOperator::Push),
        ("_POP", SetOperator::Pop),
    ];

    fn split(key: &str) -> (&str, SetOperator) {
        for (suffix, operator) in Self::SUFFIXES {
            if let Some(field) = key.strip_suffix(suffix) {
                return (field, operator);
            }
        }
        (key, SetOperator::Assign)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetOp<'a> {
    pub attribute: &'a AttributeSchema,
    pub operator: SetOperator,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateInput<'a> {
    pub node: &'a NodeSchema,
    pub properties: Assignments<'a>,
    pub relationships: Vec<RelationshipInput<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateInput<'a> {
    pub node: &'a NodeSchema,
    pub set: Vec<SetOp<'a>>,
    pub relationships: Vec<RelationshipInput<'a>>,
}

/// Nested operations on one relationship towards one concrete target type.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipInput<'a> {
    /// Node type declaring the relationship
    pub owner: &'a NodeSchema,
    pub relationship: &'a RelationshipSchema,
    pub target: &'a NodeSchema,
    pub ops: RelationshipOps<'a>,
}

impl RelationshipInput<'_> {
    /// Whether any phase adds or removes an edge of this relationship.
    pub fn changes_edges(&self) -> bool {
        let ops = &self.ops;
        !(ops.disconnect.is_empty()
            && ops.delete.is_empty()
            && ops.create.is_empty()
            && ops.connect.is_empty()
            && ops.connect_or_create.is_empty())
    }
}

/// Nested operations grouped by phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipOps<'a> {
    pub disconnect: Vec<DisconnectInput<'a>>,
    pub delete: Vec<DeleteInput<'a>>,
    pub create: Vec<NestedCreate<'a>>,
    pub connect: Vec<ConnectInput<'a>>,
    pub connect_or_create: Vec<ConnectOrCreateInput<'a>>,
    pub update: Vec<NestedUpdate<'a>>,
}

impl<'a> RelationshipOps<'a> {
    fn extend(&mut self, other: RelationshipOps<'a>) {
        self.disconnect.extend(other.disconnect);
        self.delete.extend(other.delete);
        self.create.extend(other.create);
        self.connect.extend(other.connect);
        self.connect_or_create.extend(other.connect_or_create);
        self.update.extend(other.update);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectInput<'a> {
    /// `where.node`
    pub filter: Option<Map<String, Value>>,
    pub edge: Assignments<'a>,
    /// Connects made from the connected node
    pub connect: Vec<RelationshipInput<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisconnectInput<'a> {
    /// Connection `where: { node, edge }`
    pub filter: Option<Map<String, Value>>,
    pub disconnect: Vec<RelationshipInput<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteInput<'a> {
    /// Connection `where: { node, edge }`
    pub filter: Option<Map<String, Value>>,
    pub delete: Vec<RelationshipInput<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NestedCreate<'a> {
    pub node: CreateInput<'a>,
    pub edge: Assignments<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectOrCreateInput<'a> {
    pub key: (&'a AttributeSchema, Value),
    pub on_create: Assignments<'a>,
    pub edge: Assignments<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NestedUpdate<'a> {
    /// Connection `where: { node, edge }`
    pub filter: Option<Map<String, Value>>,
    pub node: Option<UpdateInput<'a>>,
    pub edge: Vec<SetOp<'a>>,
}

/// Parses mutation arguments against the schema.
pub struct MutationPlanner<'a> {
    schema: &'a GraphSchema,
}

impl<'a> MutationPlanner<'a> {
    pub fn new(schema: &'a GraphSchema) -> Self {
        Self { schema }
    }

    /// One element of a `create<Plural>(input: [...])` list, or the `node` of a
    /// nested create.
    pub fn create(
        &self,
        node: &'a NodeSchema,
        input: &Map<String, Value>,
        location: &str,
    ) -> Result<CreateInput<'a>, TranslateError> {
        let mut properties = Vec::new();
        let mut relationship_values = Map::new();
        for (key, value) in input {
            if node.relationship(key).is_some() {
                relationship_values.insert(key.clone(), value.clone());
                continue;
            }
            let attribute = settable(node, key, location)?;
            properties.push((attribute, value.clone()));
        }
        require_attributes(node, &properties)?;

        let mut relationships = Vec::new();
        for relationship in &node.relationships {
            let Some(value) = relationship_values.get(&relationship.name) else {
                continue;
            };
            let location = format!("{}.{}", location, relationship.name);
            for (target, value) in self.by_target(relationship, value, &location)? {
                let fields = expect_object(&location, value)?;
                let mut ops = RelationshipOps::default();
                for (op_name, op_value) in fields {
                    let operation = match op_name.as_str() {
                        "create" => NestedOperation::Create,
                        "connect" => NestedOperation::Connect,
                        "connectOrCreate" => NestedOperation::ConnectOrCreate,
                        other => {
                            return Err(TranslateError::invalid_argument(
                                format!("{}.{}", location, other),
                                "expected create, connect or connectOrCreate",
                            ))
                        }
                    };
                    ops.extend(self.operation(relationship, target, operation, op_value, &location)?);
                }
                relationships.push(RelationshipInput {
                    owner: node,
                    relationship,
                    target,
                    ops,
                });
            }
        }
        Ok(CreateInput {
            node,
            properties,
            relationships,
        })
    }

    /// `update: { title: "T", released_INCREMENT: 1, actors: [{ where, update, connect, ... }] }`
    pub fn update(
        &self,
        node: &'a NodeSchema,
        input: &Map<String, Value>,
        location: &str,
    ) -> Result<UpdateInput<'a>, TranslateError> {
        let mut set = Vec::new();
        let mut relationship_values = Map::new();
        for (key, value) in input {
            if node.relationship(key).is_some() {
                relationship_values.insert(key.clone(), value.clone());
                continue;
            }
            set.push(set_op(node, key, value, location)?);
        }

        let mut relationships = Vec::new();
        for relationship in &node.relationships {
            let Some(value) = relationship_values.get(&relationship.name) else {
                continue;
            };
            let location = format!("{}.{}", location, relationship.name);
            for (target, value) in self.by_target(relationship, value, &location)? {
                let mut ops = RelationshipOps::default();
                for (index, item) in items(&location, value)?.into_iter().enumerate() {
                    let location = format!("{}[{}]", location, index);
                    ops.extend(self.update_item(relationship, target, item, &location)?);
                }
                relationships.push(RelationshipInput {
                    owner: node,
                    relationship,
                    target,
                    ops,
                });
            }
        }
        Ok(UpdateInput {
            node,
            set,
            relationships,
        })
    }

    /// Root mutation argument `connect: { actors: [...] }` (and likewise for
    /// the other nested operations).
    pub fn top_level(
        &self,
        node: &'a NodeSchema,
        operation: NestedOperation,
        input: &Map<String, Value>,
    ) -> Result<Vec<RelationshipInput<'a>>, TranslateError> {
        let location = operation.argument_name();
        self.operation_map(node, operation, input, location)
    }

    /// Merge inputs addressing the same relationship and target, in schema
    /// declaration order.
    pub fn group(
        &self,
        node: &'a NodeSchema,
        inputs: Vec<RelationshipInput<'a>>,
    ) -> Vec<RelationshipInput<'a>> {
        let mut grouped: Vec<RelationshipInput<'a>> = Vec::new();
        for relationship in &node.relationships {
            for type_name in relationship.target.concrete_types() {
                let mut merged: Option<RelationshipInput<'a>> = None;
                for input in inputs.iter().filter(|input| {
                    std::ptr::eq(input.relationship, relationship) && input.target.name == type_name
                }) {
                    match merged.as_mut() {
                        Some(existing) => existing.ops.extend(input.ops.clone()),
                        None => merged = Some(input.clone()),
                    }
                }
                grouped.extend(merged);
            }
        }
        grouped
    }

    /// `{ <relationship>: <items> }` where every item is of one operation.
    fn operation_map(
        &self,
        node: &'a NodeSchema,
        operation: NestedOperation,
        input: &Map<String, Value>,
        location: &str,
    ) -> Result<Vec<RelationshipInput<'a>>, TranslateError> {
        for key in input.keys() {
            if node.relationship(key).is_none() {
                return Err(TranslateError::unknown_field(&node.name, key));
            }
        }
        let mut relationships = Vec::new();
        for relationship in &node.relationships {
            let Some(value) = input.get(&relationship.name) else {
                continue;
            };
            let location = format!("{}.{}", location, relationship.name);
            for (target, value) in self.by_target(relationship, value, &location)? {
                let ops = self.operation(relationship, target, operation, value, &location)?;
                relationships.push(RelationshipInput {
                    owner: node,
                    relationship,
                    target,
                    ops,
                });
            }
        }
        Ok(relationships)
    }

    /// One `[{ where, update, connect, disconnect, create, delete, connectOrCreate }]`
    /// element of a relationship field in an update.
    fn update_item(
        &self,
        relationship: &'a RelationshipSchema,
        target: &'a NodeSchema,
        item: &Map<String, Value>,
        location: &str,
    ) -> Result<RelationshipOps<'a>, TranslateError> {
        let mut ops = RelationshipOps::default();
        for (key, value) in item {
            let operation = match key.as_str() {
                "where" => continue,
                "update" => NestedOperation::Update,
                "connect" => NestedOperation::Connect,
                "disconnect" => NestedOperation::Disconnect,
                "create" => NestedOperation::Create,
                "delete" => NestedOperation::Delete,
                "connectOrCreate" => NestedOperation::ConnectOrCreate,
                other => return Err(TranslateError::unknown_field(&relationship.name, other)),
            };
            if operation == NestedOperation::Update {
                allow(relationship, operation)?;
                let fields = expect_object(&format!("{}.update", location), value)?;
                let filter = object_field(item, "where", location)?;
                ops.update
                    .push(self.nested_update(relationship, target, filter, fields, location)?);
            } else {
                ops.extend(self.operation(relationship, target, operation, value, location)?);
            }
        }
        Ok(ops)
    }

    /// Items of one nested operation on one relationship target.
    fn operation(
        &self,
        relationship: &'a RelationshipSchema,
        target: &'a NodeSchema,
        operation: NestedOperation,
        value: &Value,
        location: &str,
    ) -> Result<RelationshipOps<'a>, TranslateError> {
        allow(relationship, operation)?;
        let mut ops = RelationshipOps::default();
        let location = format!("{}.{}", location, operation.argument_name());
        for (index, item) in items(&location, value)?.into_iter().enumerate() {
            let location = format!("{}[{}]", location, index);
            match operation {
                NestedOperation::Create => {
                    let node = object_field(item, "node", &location)?.ok_or_else(|| {
                        TranslateError::invalid_argument(&location, "expected a node input")
                    })?;
                    let node = self.create(target, &node, &format!("{}.node", location))?;
                    let edge = self.edge_assignments(relationship, item.get("edge"), &location, true)?;
                    ops.create.push(NestedCreate { node, edge });
                }
                NestedOperation::Connect => {
                    let filter = node_filter(item, &location)?;
                    let edge = self.edge_assignments(relationship, item.get("edge"), &location, true)?;
                    let connect = match object_field(item, "connect", &location)? {
                        Some(nested) => self.operation_map(target, NestedOperation::Connect, &nested, &location)?,
                        None => Vec::new(),
                    };
                    ops.connect.push(ConnectInput {
                        filter,
                        edge,
                        connect,
                    });
                }
                NestedOperation::Disconnect => {
                    let filter = object_field(item, "where", &location)?;
                    let disconnect = match object_field(item, "disconnect", &location)? {
                        Some(nested) => {
                            self.operation_map(target, NestedOperation::Disconnect, &nested, &location)?
                        }
                        None => Vec::new(),
                    };
                    ops.disconnect.push(DisconnectInput { filter, disconnect });
                }
                NestedOperation::Delete => {
                    let filter = object_field(item, "where", &location)?;
                    let delete = match object_field(item, "delete", &location)? {
                        Some(nested) => self.operation_map(target, NestedOperation::Delete, &nested, &location)?,
                        None => Vec::new(),
                    };
                    ops.delete.push(DeleteInput { filter, delete });
                }
                NestedOperation::ConnectOrCreate => {
                    ops.connect_or_create
                        .push(self.connect_or_create(relationship, target, item, &location)?);
                }
                NestedOperation::Update => {
                    let filter = object_field(item, "where", &location)?;
                    let fields = object_field(item, "update", &location)?.unwrap_or_default();
                    ops.update
                        .push(self.nested_update(relationship, target, filter, &fields, &location)?);
                }
            }
        }
        Ok(ops)
    }

    fn nested_update(
        &self,
        relationship: &'a RelationshipSchema,
        target: &'a NodeSchema,
        filter: Option<Map<String, Value>>,
        fields: &Map<String, Value>,
        location: &str,
    ) -> Result<NestedUpdate<'a>, TranslateError> {
        let mut update = NestedUpdate {
            filter,
            node: None,
            edge: Vec::new(),
        };
        for (key, value) in fields {
            match key.as_str() {
                "node" => {
                    let node = expect_object(&format!("{}.node", location), value)?;
                    update.node = Some(self.update(target, node, &format!("{}.node", location))?);
                }
                "edge" => {
                    let properties = self.properties(relationship, location)?;
                    let edge = expect_object(&format!("{}.edge", location), value)?;
                    for (attribute, value) in edge {
                        update.edge.push(set_op(properties, attribute, value, location)?);
                    }
                }
                other => return Err(TranslateError::unknown_field(&relationship.name, other)),
            }
        }
        Ok(update)
    }

    /// `{ where: { node: { <unique key>: value } }, onCreate: { node, edge } }`
    fn connect_or_create(
        &self,
        relationship: &'a RelationshipSchema,
        target: &'a NodeSchema,
        item: &Map<String, Value>,
        location: &str,
    ) -> Result<ConnectOrCreateInput<'a>, TranslateError> {
        let key_location = format!("{}.where.node", location);
        let filter = node_filter(item, location)?.unwrap_or_default();
        let mut entries = filter.iter();
        let (key, value) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(TranslateError::invalid_argument(
                    key_location,
                    "expected exactly one unique attribute",
                ))
            }
        };
        let attribute = target
            .attribute(key)
            .filter(|attribute| attribute.is_unique_key())
            .ok_or_else(|| {
                TranslateError::invalid_argument(&key_location, format!("`{}` is not a unique attribute", key))
            })?;

        let on_create = object_field(item, "onCreate", location)?.unwrap_or_default();
        let mut properties = Vec::new();
        if let Some(node) = object_field(&on_create, "node", location)? {
            for (name, value) in &node {
                if name == key {
                    continue;
                }
                properties.push((settable(target, name, location)?, value.clone()));
            }
        }
        let mut required = properties.clone();
        required.push((attribute, value.clone()));
        require_attributes(target, &required)?;
        let edge = self.edge_assignments(relationship, on_create.get("edge"), location, true)?;

        Ok(ConnectOrCreateInput {
            key: (attribute, value.clone()),
            on_create: properties,
            edge,
        })
    }

    fn properties(
        &self,
        relationship: &RelationshipSchema,
        location: &str,
    ) -> Result<&'a PropertiesSchema, TranslateError> {
        relationship
            .properties
            .as_deref()
            .and_then(|name| self.schema.relationship_properties(name))
            .ok_or_else(|| TranslateError::invalid_argument(format!("{}.edge", location), "relationship has no properties"))
    }

    /// Edge properties written with a new relationship. With `creating` set,
    /// required properties must be present.
    fn edge_assignments(
        &self,
        relationship: &RelationshipSchema,
        value: Option<&Value>,
        location: &str,
        creating: bool,
    ) -> Result<Assignments<'a>, TranslateError> {
        let Some(properties) = relationship
            .properties
            .as_deref()
            .and_then(|name| self.schema.relationship_properties(name))
        else {
            return match value.filter(|v| !v.is_null()) {
                Some(_) => Err(TranslateError::invalid_argument(
                    format!("{}.edge", location),
                    "relationship has no properties",
                )),
                None => Ok(Vec::new()),
            };
        };
        let mut assignments = Vec::new();
        if let Some(value) = value.filter(|v| !v.is_null()) {
            for (key, value) in expect_object(&format!("{}.edge", location), value)? {
                assignments.push((settable(properties, key, location)?, value.clone()));
            }
        }
        if creating {
            require_attributes(properties, &assignments)?;
        }
        Ok(assignments)
    }

    /// Split a relationship value by concrete target. Abstract targets are
    /// keyed by member type name.
    fn by_target<'v>(
        &self,
        relationship: &'a RelationshipSchema,
        value: &'v Value,
        location: &str,
    ) -> Result<Vec<(&'a NodeSchema, &'v Value)>, TranslateError> {
        let missing = |name: &str| TranslateError::unknown_field(relationship.target.name(), name);
        match &relationship.target {
            RelationshipTarget::Node(name) => {
                let target = self.schema.node(name).ok_or_else(|| missing(name))?;
                Ok(vec![(target, value)])
            }
            _ => {
                let members = expect_object(location, value)?;
                let concrete = relationship.target.concrete_types();
                if let Some(unknown) = members.keys().find(|key| !concrete.contains(&key.as_str())) {
                    return Err(missing(unknown));
                }
                let mut split = Vec::new();
                for type_name in concrete {
                    if let Some(member_value) = members.get(type_name) {
                        let target = self.schema.node(type_name).ok_or_else(|| missing(type_name))?;
                        split.push((target, member_value));
                    }
                }
                Ok(split)
            }
        }
    }
}

fn allow(relationship: &RelationshipSchema, operation: NestedOperation) -> Result<(), TranslateError> {
    if relationship.allows(operation) {
        Ok(())
    } else {
        Err(TranslateError::NestedOperationNotAllowed {
            type_name: relationship.target.name().to_string(),
            field: relationship.name.clone(),
            operation,
        })
    }
}

fn settable<'o>(
    owner: &'o dyn FieldContainer,
    key: &str,
    location: &str,
) -> Result<&'o AttributeSchema, TranslateError> {
    let attribute = owner
        .attribute(key)
        .ok_or_else(|| TranslateError::unknown_field(owner.type_name(), key))?;
    if !attribute.is_settable() {
        return Err(TranslateError::invalid_argument(
            format!("{}.{}", location, key),
            "attribute cannot be set",
        ));
    }
    Ok(attribute)
}

fn require_attributes(
    owner: &dyn FieldContainer,
    assignments: &[(&AttributeSchema, Value)],
) -> Result<(), TranslateError> {
    for attribute in owner.attributes().iter().filter(|a| a.is_required_on_create()) {
        let present = assignments
            .iter()
            .any(|(assigned, value)| assigned.name == attribute.name && !value.is_null());
        if !present {
            return Err(TranslateError::MissingRequiredField {
                type_name: owner.type_name().to_string(),
                field: attribute.name.clone(),
            });
        }
    }
    Ok(())
}

fn set_op<'o>(
    owner: &'o dyn FieldContainer,
    key: &str,
    value: &Value,
    location: &str,
) -> Result<SetOp<'o>, TranslateError> {
    let (field, operator) = match owner.attribute(key) {
        Some(_) => (key, SetOperator::Assign),
        None => SetOperator::split(key),
    };
    let attribute = settable(owner, field, location)?;
    let invalid = |message: &str| TranslateError::invalid_argument(format!("{}.{}", location, key), message);
    match operator {
        SetOperator::Increment | SetOperator::Decrement => {
            if !attribute.kind.is_numeric() || attribute.list {
                return Err(invalid("only numeric attributes can be incremented"));
            }
            if !value.is_number() {
                return Err(invalid("expected a number"));
            }
        }
        SetOperator::Push if !attribute.list => return Err(invalid("only list attributes can be pushed to")),
        SetOperator::Pop => {
            if !attribute.list {
                return Err(invalid("only list attributes can be popped"));
            }
            match value.as_u64() {
                None => return Err(invalid("expected a non-negative integer")),
                Some(count) if i64::try_from(count).is_err() => return Err(invalid("count is out of range")),
                Some(_) => {}
            }
        }
        _ => {}
    }
    Ok(SetOp {
        attribute,
        operator,
        value: value.clone(),
    })
}

fn expect_object<'v>(location: &str, value: &'v Value) -> Result<&'v Map<String, Value>, TranslateError> {
    value
        .as_object()
        .ok_or_else(|| TranslateError::invalid_argument(location, "expected an object"))
}

/// A list of objects, or a single object.
fn items<'v>(location: &str, value: &'v Value) -> Result<Vec<&'v Map<String, Value>>, TranslateError> {
    match value {
        Value::Array(values) => values.iter().map(|v| expect_object(location, v)).collect(),
        Value::Object(map) => Ok(vec![map]),
        _ => Err(TranslateError::invalid_argument(location, "expected an object or a list of objects")),
    }
}

/// Optional object-valued field; `null` counts as absent.
fn object_field(
    map: &Map<String, Value>,
    key: &str,
    location: &str,
) -> Result<Option<Map<String, Value>>, TranslateError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(object)) => Ok(Some(object.clone())),
        Some(_) => Err(TranslateError::invalid_argument(
            format!("{}.{}", location, key),
            "expected an object",
        )),
    }
}

/// `where: { node: {...} }` of a connect item.
fn node_filter(item: &Map<String, Value>, location: &str) -> Result<Option<Map<String, Value>>, TranslateError> {
    match object_field(item, "where", location)? {
        Some(filter) => object_field(&filter, "node", &format!("{}.where", location)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_catalog::testing::movie_schema;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_create_requires_non_nullable_attributes() {
        let schema = movie_schema();
        let planner = MutationPlanner::new(&schema);
        let err = planner
            .create(schema.node("Movie").unwrap(), &object(json!({ "released": 1999 })), "input[0]")
            .unwrap_err();
        assert_eq!(
            err,
            TranslateError::MissingRequiredField {
                type_name: "Movie".to_string(),
                field: "title".to_string()
            }
        );
    }

    #[test]
    fn test_generated_and_timestamp_attributes_cannot_be_set() {
        let schema = movie_schema();
        let planner = MutationPlanner::new(&schema);
        let err = planner
            .create(
                schema.node("Movie").unwrap(),
                &object(json!({ "title": "M", "createdAt": "2020-01-01T00:00:00Z" })),
                "input[0]",
            )
            .unwrap_err();
        assert!(matches!(err, TranslateError::InvalidArgument { .. }));
    }

    #[test]
    fn test_relationships_follow_declaration_order() {
        let schema = movie_schema();
        let planner = MutationPlanner::new(&schema);
        let update = planner
            .update(
                schema.node("Movie").unwrap(),
                &object(json!({
                    "director": { "connect": { "where": { "node": { "id": "2" } } } },
                    "actors": [{ "disconnect": [{ "where": { "node": { "name": "A" } } }] }]
                })),
                "update",
            )
            .unwrap();
        let names: Vec<&str> = update
            .relationships
            .iter()
            .map(|r| r.relationship.name.as_str())
            .collect();
        assert_eq!(names, vec!["actors", "director"]);
        assert_eq!(update.relationships[1].ops.connect.len(), 1);
        assert!(update.relationships[1].changes_edges());
    }

    #[test]
    fn test_disallowed_nested_operation() {
        let schema = movie_schema();
        let planner = MutationPlanner::new(&schema);
        let err = planner
            .top_level(
                schema.node("Studio").unwrap(),
                NestedOperation::Create,
                &object(json!({ "movies": [{ "node": { "title": "M" } }] })),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TranslateError::NestedOperationNotAllowed {
                operation: NestedOperation::Create,
                ..
            }
        ));
    }

    #[test]
    fn test_set_operators() {
        let schema = movie_schema();
        let planner = MutationPlanner::new(&schema);
        let update = planner
            .update(
                schema.node("Movie").unwrap(),
                &object(json!({ "released_INCREMENT": 1, "tags_POP": 2, "title": "T" })),
                "update",
            )
            .unwrap();
        let operators: Vec<SetOperator> = update.set.iter().map(|op| op.operator).collect();
        assert_eq!(
            operators,
            vec![SetOperator::Increment, SetOperator::Pop, SetOperator::Assign]
        );
        assert!(planner
            .update(schema.node("Movie").unwrap(), &object(json!({ "title_INCREMENT": 1 })), "update")
            .is_err());
    }

    #[test]
    fn test_pop_count_beyond_i64_is_rejected() {
        let schema = movie_schema();
        let planner = MutationPlanner::new(&schema);
        let movie = schema.node("Movie").unwrap();
        let err = planner
            .update(movie, &object(json!({ "tags_POP": 1u64 << 63 })), "update")
            .unwrap_err();
        assert_eq!(
            err,
            TranslateError::invalid_argument("update.tags_POP", "count is out of range")
        );
        assert!(planner
            .update(movie, &object(json!({ "tags_POP": i64::MAX })), "update")
            .is_ok());
    }

    #[test]
    fn test_connect_or_create_needs_one_unique_key() {
        let schema = movie_schema();
        let planner = MutationPlanner::new(&schema);
        let movie = schema.node("Movie").unwrap();
        let ok = planner
            .top_level(
                movie,
                NestedOperation::ConnectOrCreate,
                &object(json!({ "actors": [{ "where": { "node": { "name": "Keanu" } }, "onCreate": { "node": { "born": 1964 } } }] })),
            )
            .unwrap();
        assert_eq!(ok[0].ops.connect_or_create[0].key.0.name, "name");

        let err = planner
            .top_level(
                movie,
                NestedOperation::ConnectOrCreate,
                &object(json!({ "actors": [{ "where": { "node": { "born": 1964 } } }] })),
            )
            .unwrap_err();
        assert!(matches!(err, TranslateError::InvalidArgument { .. }));
    }

    #[test]
    fn test_union_input_keyed_by_member() {
        let schema = movie_schema();
        let planner = MutationPlanner::new(&schema);
        let create = planner
            .create(
                schema.node("Collection").unwrap(),
                &object(json!({
                    "name": "C",
                    "items": {
                        "Actor": { "connect": [{ "where": { "node": { "name": "A" } } }] },
                        "Movie": { "create": [{ "node": { "title": "M" } }] }
                    }
                })),
                "input[0]",
            )
            .unwrap();
        let targets: Vec<&str> = create.relationships.iter().map(|r| r.target.name.as_str()).collect();
        assert_eq!(targets, vec!["Movie", "Actor"]);

        let err = planner
            .create(
                schema.node("Collection").unwrap(),
                &object(json!({ "items": { "Studio": { "connect": [] } } })),
                "input[0]",
            )
            .unwrap_err();
        assert!(matches!(err, TranslateError::UnknownField { .. }));
    }
}
