//! `sort` / `limit` / `offset` arguments of list reads.

use serde_json::{Map, Value};

use crate::cypher::{Clause, Expr, OrderItem, Projection, Variable};
use crate::graph_catalog::{FieldContainer, LimitSchema};
use crate::translator::computed::computed_subquery;
use crate::translator::context::TranslationContext;
use crate::translator::errors::TranslateError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub descending: bool,
}

/// Window and order of a list read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub sort: Vec<SortField>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ReadOptions {
    /// Read `options: { sort, limit, offset }` or the same keys at the top level,
    /// then apply the type's `@limit`.
    pub fn from_arguments(
        location: &str,
        arguments: &Map<String, Value>,
        limit: Option<LimitSchema>,
    ) -> Result<Self, TranslateError> {
        let options = match arguments.get("options") {
            Some(Value::Object(options)) => Some(options),
            Some(Value::Null) | None => None,
            Some(_) => {
                return Err(TranslateError::invalid_argument(
                    format!("{}.options", location),
                    "expected an object",
                ))
            }
        };
        let lookup = |key: &str| {
            options
                .and_then(|o| o.get(key))
                .or_else(|| arguments.get(key))
                .filter(|v| !v.is_null())
        };

        let sort = match lookup("sort") {
            Some(value) => parse_sort(location, value)?,
            None => Vec::new(),
        };
        let requested = lookup("limit")
            .map(|v| non_negative(location, "limit", v))
            .transpose()?;
        let offset = lookup("offset")
            .map(|v| non_negative(location, "offset", v))
            .transpose()?
            .filter(|offset| *offset > 0);

        Ok(Self {
            sort,
            limit: effective_limit(requested, limit),
            offset,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.sort.is_empty() && self.limit.is_none() && self.offset.is_none()
    }

    /// `WITH * ORDER BY ... SKIP ... LIMIT ...` over rows binding `variable`,
    /// preceded by the sub-queries computed sort keys need.
    pub fn clauses(
        &self,
        ctx: &mut TranslationContext<'_>,
        owner: &dyn FieldContainer,
        variable: &Variable,
    ) -> Result<Vec<Clause>, TranslateError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let mut clauses = Vec::new();
        let order_by = sort_items(ctx, owner, variable, &self.sort, &mut clauses)?;
        let mut projection = Projection::star();
        projection.order_by = order_by;
        projection.skip = self.offset.map(Expr::value);
        projection.limit = self.limit.map(Expr::value);
        clauses.push(Clause::With(projection));
        Ok(clauses)
    }
}

/// The limit actually applied: the requested one capped by `max`, or the
/// type's default when none was requested.
pub fn effective_limit(requested: Option<u64>, limit: Option<LimitSchema>) -> Option<u64> {
    let Some(limit) = limit else {
        return requested;
    };
    match (requested.or(limit.default), limit.max) {
        (Some(value), Some(max)) => Some(value.min(max)),
        (Some(value), None) => Some(value),
        (None, max) => max,
    }
}

/// `[{ title: ASC }, { released: DESC }]`; one object may name several fields.
pub fn parse_sort(location: &str, value: &Value) -> Result<Vec<SortField>, TranslateError> {
    let entries: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    let mut sort = Vec::new();
    for entry in entries {
        let object = entry.as_object().ok_or_else(|| {
            TranslateError::invalid_argument(format!("{}.sort", location), "expected a list of objects")
        })?;
        for (field, direction) in object {
            let descending = match direction.as_str() {
                Some("ASC") => false,
                Some("DESC") => true,
                _ => {
                    return Err(TranslateError::invalid_argument(
                        format!("{}.sort.{}", location, field),
                        "expected ASC or DESC",
                    ))
                }
            };
            sort.push(SortField {
                field: field.clone(),
                descending,
            });
        }
    }
    Ok(sort)
}

/// Order items over `variable`. Computed attributes are materialized by a
/// sub-query pushed onto `preludes`.
pub fn sort_items(
    ctx: &mut TranslationContext<'_>,
    owner: &dyn FieldContainer,
    variable: &Variable,
    sort: &[SortField],
    preludes: &mut Vec<Clause>,
) -> Result<Vec<OrderItem>, TranslateError> {
    let mut items = Vec::with_capacity(sort.len());
    for field in sort {
        let attribute = owner
            .attribute(&field.field)
            .ok_or_else(|| TranslateError::unknown_field(owner.type_name(), field.field.clone()))?;
        let expr = match &attribute.computed {
            Some(computed) => {
                let (clause, result) = computed_subquery(ctx, variable, computed);
                preludes.push(clause);
                Expr::var(&result)
            }
            None => Expr::prop(variable, attribute.name.as_str()),
        };
        items.push(OrderItem {
            expr,
            descending: field.descending,
        });
    }
    Ok(items)
}

/// A non-negative integer argument that fits a Cypher integer.
pub(crate) fn non_negative(location: &str, key: &str, value: &Value) -> Result<u64, TranslateError> {
    let invalid = |message: &str| TranslateError::invalid_argument(format!("{}.{}", location, key), message);
    let number = value.as_u64().ok_or_else(|| invalid("expected a non-negative integer"))?;
    if i64::try_from(number).is_err() {
        return Err(invalid("value is out of range"));
    }
    Ok(number)
}
