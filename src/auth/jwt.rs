//! Translation-time evaluation of claim filters (`jwt: { roles_INCLUDES: "admin" }`).
//!
//! Claim filters never look at graph data, so they are resolved against the
//! request claims before any statement is built. Evaluation is three-valued:
//! `None` stands for NULL, produced by absent claims, and is never "true".

use regex::Regex;
use serde_json::{Map, Value};
use std::cmp::Ordering;

use crate::filter::operators::{split_key, FilterOperator};
use crate::graph_catalog::GraphSchema;
use crate::translator::errors::TranslateError;

use super::AuthContext;

/// Evaluate a claim filter tree. Sibling keys are conjoined.
pub fn evaluate(
    schema: &GraphSchema,
    auth: &AuthContext,
    filter: &Map<String, Value>,
) -> Result<Option<bool>, TranslateError> {
    let mut results = Vec::with_capacity(filter.len());
    for (key, value) in filter {
        let result = match key.as_str() {
            "AND" => and(nested(schema, auth, key, value)?),
            "OR" => or(nested(schema, auth, key, value)?),
            "NOT" => {
                let inner = value.as_object().ok_or_else(|| {
                    TranslateError::invalid_argument("jwt.NOT", "expected an object")
                })?;
                evaluate(schema, auth, inner)?.map(|b| !b)
            }
            _ => {
                let (claim, operator) = split_key(key);
                let actual = auth.claim(&schema.claim_path(claim));
                compare(key, actual, operator, value)?
            }
        };
        results.push(result);
    }
    Ok(and(results))
}

fn nested(
    schema: &GraphSchema,
    auth: &AuthContext,
    key: &str,
    value: &Value,
) -> Result<Vec<Option<bool>>, TranslateError> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    items
        .into_iter()
        .map(|item| {
            let map = item.as_object().ok_or_else(|| {
                TranslateError::invalid_argument(format!("jwt.{}", key), "expected a list of objects")
            })?;
            evaluate(schema, auth, map)
        })
        .collect()
}

/// Kleene conjunction.
pub fn and(values: impl IntoIterator<Item = Option<bool>>) -> Option<bool> {
    let mut unknown = false;
    for value in values {
        match value {
            Some(false) => return Some(false),
            None => unknown = true,
            Some(true) => {}
        }
    }
    if unknown {
        None
    } else {
        Some(true)
    }
}

/// Kleene disjunction.
pub fn or(values: impl IntoIterator<Item = Option<bool>>) -> Option<bool> {
    let mut unknown = false;
    for value in values {
        match value {
            Some(true) => return Some(true),
            None => unknown = true,
            Some(false) => {}
        }
    }
    if unknown {
        None
    } else {
        Some(false)
    }
}

fn compare(
    key: &str,
    actual: Option<&Value>,
    operator: FilterOperator,
    expected: &Value,
) -> Result<Option<bool>, TranslateError> {
    let Some(actual) = actual else {
        return Ok(None);
    };
    if expected.is_null() {
        return Ok(None);
    }
    let result = match operator {
        FilterOperator::Equal => Some(actual == expected),
        FilterOperator::Not => Some(actual != expected),
        FilterOperator::In | FilterOperator::NotIn => {
            let options = expected.as_array().ok_or_else(|| {
                TranslateError::invalid_argument(format!("jwt.{}", key), "expected a list")
            })?;
            let found = options.contains(actual);
            Some(found == (operator == FilterOperator::In))
        }
        FilterOperator::Includes | FilterOperator::NotIncludes => {
            let found = actual.as_array().map(|items| items.contains(expected));
            found.map(|found| found == (operator == FilterOperator::Includes))
        }
        op if op.is_ordering() => order(actual, expected).map(|ordering| match op {
            FilterOperator::LessThan => ordering == Ordering::Less,
            FilterOperator::LessThanEqual => ordering != Ordering::Greater,
            FilterOperator::GreaterThan => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        }),
        op if op.is_string() => match (actual.as_str(), expected.as_str()) {
            (Some(actual), Some(expected)) => Some(match op {
                FilterOperator::Contains => actual.contains(expected),
                FilterOperator::NotContains => !actual.contains(expected),
                FilterOperator::StartsWith => actual.starts_with(expected),
                FilterOperator::NotStartsWith => !actual.starts_with(expected),
                FilterOperator::EndsWith => actual.ends_with(expected),
                _ => !actual.ends_with(expected),
            }),
            _ => None,
        },
        FilterOperator::Matches => match (actual.as_str(), expected.as_str()) {
            (Some(actual), Some(pattern)) => {
                // Cypher `=~` matches the whole string.
                let anchored = format!("^(?:{})$", pattern);
                let regex = Regex::new(&anchored).map_err(|e| {
                    TranslateError::invalid_argument(format!("jwt.{}", key), e.to_string())
                })?;
                Some(regex.is_match(actual))
            }
            _ => None,
        },
        _ => {
            return Err(TranslateError::unsupported_filter(
                "jwt",
                key,
                "operator does not apply to claims",
            ))
        }
    };
    Ok(result)
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
