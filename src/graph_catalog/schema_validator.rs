//! Consistency checks run on a freshly built schema model.
//!
//! The checks cover what translation later relies on without re-checking:
//!
//! - authorization `node` predicates only address fields of the guarded type
//! - authorization predicates never address computed attributes (a guard must be a
//!   single predicate; computed values need a preceding sub-query)
//! - relationship-property attributes are stored values

use serde_json::{Map, Value};

use super::auth_rules::{AuthPredicate, AuthorizationRules};
use super::errors::ModelError;
use super::graph_schema::{FieldContainer, GraphSchema};

const LOGICAL_KEYS: [&str; 3] = ["AND", "OR", "NOT"];

pub struct SchemaValidator<'a> {
    schema: &'a GraphSchema,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(schema: &'a GraphSchema) -> Self {
        Self { schema }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        for node in self.schema.nodes() {
            self.validate_rules(node, &node.authorization, &node.name)?;
            for attribute in &node.attributes {
                let location = format!("{}.{}", node.name, attribute.name);
                self.validate_rules(node, &attribute.authorization, &location)?;
            }
            for relationship in &node.relationships {
                let location = format!("{}.{}", node.name, relationship.name);
                self.validate_rules(node, &relationship.authorization, &location)?;

                if let Some(properties) = relationship
                    .properties
                    .as_deref()
                    .and_then(|p| self.schema.relationship_properties(p))
                {
                    if let Some(computed) = properties.attributes.iter().find(|a| a.is_computed()) {
                        return Err(ModelError::invalid_directive(
                            format!("{}.{}", properties.name, computed.name),
                            "relationship properties cannot be computed",
                        ));
                    }
                }
            }

            for interface_name in &node.interfaces {
                if let Some(interface) = self.schema.interface(interface_name) {
                    self.validate_rules(interface, &interface.authorization, &interface.name)?;
                }
            }
        }
        Ok(())
    }

    fn validate_rules(
        &self,
        owner: &dyn FieldContainer,
        rules: &AuthorizationRules,
        location: &str,
    ) -> Result<(), ModelError> {
        let predicates = rules
            .filter
            .iter()
            .map(|r| &r.predicate)
            .chain(rules.validate.iter().map(|r| &r.predicate));
        for predicate in predicates {
            self.validate_predicate(owner, predicate, location)?;
        }
        Ok(())
    }

    fn validate_predicate(
        &self,
        owner: &dyn FieldContainer,
        predicate: &AuthPredicate,
        location: &str,
    ) -> Result<(), ModelError> {
        match predicate {
            AuthPredicate::All(parts) | AuthPredicate::Any(parts) => parts
                .iter()
                .try_for_each(|p| self.validate_predicate(owner, p, location)),
            AuthPredicate::Not(inner) => self.validate_predicate(owner, inner, location),
            AuthPredicate::Node(map) => validate_node_keys(owner, map, location),
            AuthPredicate::Jwt(_) => Ok(()),
        }
    }
}

fn validate_node_keys(
    owner: &dyn FieldContainer,
    map: &Map<String, Value>,
    location: &str,
) -> Result<(), ModelError> {
    for (key, value) in map {
        if LOGICAL_KEYS.contains(&key.as_str()) {
            let nested: Vec<&Map<String, Value>> = match value {
                Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
                Value::Object(object) => vec![object],
                _ => Vec::new(),
            };
            for object in nested {
                validate_node_keys(owner, object, location)?;
            }
            continue;
        }
        if key == "typename_IN" {
            continue;
        }

        let field = referenced_field(owner, key).ok_or_else(|| {
            ModelError::invalid_rule(
                location,
                format!("`{}` does not address a field of `{}`", key, owner.type_name()),
            )
        })?;

        if owner.attribute(field).is_some_and(|a| a.is_computed()) {
            return Err(ModelError::invalid_rule(
                location,
                format!("computed attribute `{}` cannot be used in a rule", field),
            ));
        }
    }
    Ok(())
}

/// The longest field name the filter key starts with.
fn referenced_field<'o>(owner: &'o dyn FieldContainer, key: &str) -> Option<&'o str> {
    let attributes = owner.attributes().iter().map(|a| a.name.as_str());
    let relationships = owner.relationships().iter().map(|r| r.name.as_str());
    attributes
        .chain(relationships)
        .filter(|field| {
            key == *field
                || key
                    .strip_prefix(*field)
                    .is_some_and(|rest| rest.starts_with('_') || rest.starts_with("Connection") || rest.starts_with("Aggregate"))
        })
        .max_by_key(|field| field.len())
}
