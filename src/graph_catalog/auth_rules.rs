//! Authorization and authentication declarations, resolved once at schema build.
//!
//! A rule's `where` tree is parsed into an [`AuthPredicate`] so translation never
//! re-inspects raw configuration values. Leaves keep the filter maps as JSON: the
//! `node` half is compiled by the filter compiler against the guarded type, the
//! `jwt` half is evaluated against the request claims.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use super::config::{AuthenticationDefinition, AuthorizationDefinition};
use super::errors::ModelError;
use super::schema_types::{AuthOperation, Timing};

#[derive(Debug, Clone, PartialEq)]
pub enum AuthPredicate {
    All(Vec<AuthPredicate>),
    Any(Vec<AuthPredicate>),
    Not(Box<AuthPredicate>),
    /// Filter tree over the guarded node, claim references written as `"$jwt.<claim>"`
    Node(Map<String, Value>),
    /// Filter tree over the request claims
    Jwt(Map<String, Value>),
}

impl AuthPredicate {
    pub fn parse(value: &Value, location: &str) -> Result<Self, ModelError> {
        let object = value
            .as_object()
            .ok_or_else(|| ModelError::invalid_rule(location, "`where` must be an object"))?;

        let mut parts = Vec::with_capacity(object.len());
        for (key, inner) in object {
            let part = match key.as_str() {
                "node" => AuthPredicate::Node(expect_object(inner, location, "node")?),
                "jwt" => AuthPredicate::Jwt(expect_object(inner, location, "jwt")?),
                "AND" => AuthPredicate::All(parse_list(inner, location)?),
                "OR" => AuthPredicate::Any(parse_list(inner, location)?),
                "NOT" => AuthPredicate::Not(Box::new(AuthPredicate::parse(inner, location)?)),
                other => {
                    return Err(ModelError::invalid_rule(
                        location,
                        format!("unexpected key `{}` (expected node, jwt, AND, OR, NOT)", other),
                    ))
                }
            };
            parts.push(part);
        }

        match parts.len() {
            0 => Err(ModelError::invalid_rule(location, "`where` must not be empty")),
            1 => Ok(parts.remove(0)),
            _ => Ok(AuthPredicate::All(parts)),
        }
    }

    /// True when the predicate never looks at the guarded node.
    pub fn is_claims_only(&self) -> bool {
        match self {
            AuthPredicate::All(parts) | AuthPredicate::Any(parts) => {
                parts.iter().all(AuthPredicate::is_claims_only)
            }
            AuthPredicate::Not(inner) => inner.is_claims_only(),
            AuthPredicate::Node(_) => false,
            AuthPredicate::Jwt(_) => true,
        }
    }
}

fn expect_object(value: &Value, location: &str, key: &str) -> Result<Map<String, Value>, ModelError> {
    value
        .as_object()
        .cloned()
        .ok_or_else(|| ModelError::invalid_rule(location, format!("`{}` must be an object", key)))
}

fn parse_list(value: &Value, location: &str) -> Result<Vec<AuthPredicate>, ModelError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| AuthPredicate::parse(item, location))
            .collect(),
        other => Ok(vec![AuthPredicate::parse(other, location)?]),
    }
}

/// Narrows the rows an operation sees, silently.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRule {
    pub operations: BTreeSet<AuthOperation>,
    pub require_authentication: bool,
    pub predicate: AuthPredicate,
}

/// Must hold or the request fails with `Forbidden`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidateRule {
    pub operations: BTreeSet<AuthOperation>,
    pub timing: BTreeSet<Timing>,
    pub require_authentication: bool,
    pub predicate: AuthPredicate,
}

impl ValidateRule {
    pub fn applies(&self, operation: AuthOperation, timing: Timing) -> bool {
        self.operations.contains(&operation) && self.timing.contains(&timing)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationRules {
    pub filter: Vec<FilterRule>,
    pub validate: Vec<ValidateRule>,
}

impl AuthorizationRules {
    pub fn from_definition(
        definition: Option<&AuthorizationDefinition>,
        location: &str,
    ) -> Result<Self, ModelError> {
        let Some(definition) = definition else {
            return Ok(Self::default());
        };

        let filter = definition
            .filter
            .iter()
            .map(|rule| {
                Ok(FilterRule {
                    operations: operation_set(
                        rule.operations.as_deref(),
                        &AuthOperation::FILTER_DEFAULT,
                    ),
                    require_authentication: rule.require_authentication,
                    predicate: AuthPredicate::parse(&rule.predicate, location)?,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        let validate = definition
            .validate
            .iter()
            .map(|rule| {
                let timing: BTreeSet<Timing> = match rule.when.as_deref() {
                    Some(when) if !when.is_empty() => when.iter().copied().collect(),
                    _ => [Timing::Before, Timing::After].into_iter().collect(),
                };
                Ok(ValidateRule {
                    operations: operation_set(rule.operations.as_deref(), &AuthOperation::ALL),
                    timing,
                    require_authentication: rule.require_authentication,
                    predicate: AuthPredicate::parse(&rule.predicate, location)?,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        Ok(Self { filter, validate })
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_empty() && self.validate.is_empty()
    }
}

/// `@authentication`: the operation requires a token, optionally with claims.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticationRule {
    pub operations: BTreeSet<AuthOperation>,
    pub jwt: Option<Map<String, Value>>,
}

impl AuthenticationRule {
    pub fn from_definition(
        definition: Option<&AuthenticationDefinition>,
        location: &str,
    ) -> Result<Option<Self>, ModelError> {
        let Some(definition) = definition else {
            return Ok(None);
        };
        let jwt = match &definition.jwt {
            None => None,
            Some(Value::Object(map)) => Some(map.clone()),
            Some(_) => {
                return Err(ModelError::invalid_rule(
                    location,
                    "authentication `jwt` must be an object",
                ))
            }
        };
        Ok(Some(Self {
            operations: operation_set(definition.operations.as_deref(), &AuthOperation::ALL),
            jwt,
        }))
    }
}

fn operation_set(listed: Option<&[AuthOperation]>, default: &[AuthOperation]) -> BTreeSet<AuthOperation> {
    match listed {
        Some(ops) if !ops.is_empty() => ops.iter().copied().collect(),
        _ => default.iter().copied().collect(),
    }
}
