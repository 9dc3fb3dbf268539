//! `<plural>Aggregate` and `<relationship>Aggregate` fields.
//!
//! Each selected aggregate runs in its own sub-query that re-matches the
//! filtered pattern, so one aggregate's ordering or collection never changes
//! the rows another one sees.

use crate::auth::{check_authentication, read_access, AuthTarget};
use crate::cypher::{
    Clause, Expr, NodePattern, OrderItem, Pattern, Projection, ProjectionItem, Variable,
};
use crate::filter::{CompiledFilter, FilterCompiler, ValueMode};
use crate::graph_catalog::{
    AttributeKind, AttributeSchema, AuthOperation, FieldContainer, NodeSchema, RelationshipSchema,
    RelationshipTarget,
};

use super::context::TranslationContext;
use super::errors::TranslateError;
use super::operation::FieldSelection;
use super::patterns::relationship_pattern;

/// Rows being aggregated.
#[derive(Clone, Copy)]
enum Rows<'p, 'a> {
    Root(&'a NodeSchema),
    Related {
        parent: &'p Variable,
        relationship: &'a RelationshipSchema,
        target: &'a NodeSchema,
    },
}

impl<'p, 'a> Rows<'p, 'a> {
    fn target(&self) -> &'a NodeSchema {
        match self {
            Rows::Root(node) => node,
            Rows::Related { target, .. } => target,
        }
    }
}

/// `RETURN { count: var1, title: var3 } AS this` preceded by one sub-query
/// per selected aggregate.
pub fn root_aggregate<'a>(
    ctx: &mut TranslationContext<'a>,
    node: &'a NodeSchema,
    selection: &FieldSelection,
) -> Result<Vec<Clause>, TranslateError> {
    check_authentication(ctx, node, AuthOperation::Aggregate)?;
    let (mut clauses, map) = aggregate_fields(ctx, Rows::Root(node), selection)?;
    clauses.push(Clause::Return(Projection::items(vec![ProjectionItem::aliased(
        map,
        &Variable::this(),
    )])));
    log::debug!("{}: aggregating {}", selection.name, node.name);
    Ok(clauses)
}

/// `actorsAggregate { count node { name { longest } } edge { screenTime { max } } }`
pub fn relationship_aggregate<'a>(
    ctx: &mut TranslationContext<'a>,
    parent: &Variable,
    owner: &'a NodeSchema,
    relationship: &'a RelationshipSchema,
    selection: &FieldSelection,
) -> Result<(Clause, Variable), TranslateError> {
    let schema = ctx.schema;
    let target = match &relationship.target {
        RelationshipTarget::Node(name) => schema.node(name),
        _ => None,
    }
    .ok_or_else(|| {
        TranslateError::invalid_argument(
            format!("{}.{}", owner.name, selection.name),
            "aggregations over interface or union targets are not supported",
        )
    })?;
    check_authentication(ctx, target, AuthOperation::Aggregate)?;

    ctx.enter();
    let result = ctx.fresh_value(format!("{}.{}", owner.name, selection.name));
    let rows = Rows::Related {
        parent,
        relationship,
        target,
    };
    let (mut body, map) = aggregate_fields(ctx, rows, selection)?;
    body.push(Clause::Return(Projection::items(vec![ProjectionItem::aliased(
        map, &result,
    )])));
    ctx.leave();
    Ok((Clause::call(&[parent], body), result))
}

fn aggregate_fields<'a>(
    ctx: &mut TranslationContext<'a>,
    rows: Rows<'_, 'a>,
    selection: &FieldSelection,
) -> Result<(Vec<Clause>, Expr), TranslateError> {
    let schema = ctx.schema;
    let target = rows.target();
    let mut clauses = Vec::new();
    let mut entries = Vec::new();

    for field in &selection.selections {
        let key = field.response_key().to_string();
        let value = match (field.name.as_str(), rows) {
            ("count", _) => {
                let (mut body, node, _) = matched(ctx, rows, selection, &[])?;
                let count = ctx.fresh_value("aggregate.count");
                body.push(Clause::Return(Projection::items(vec![ProjectionItem::aliased(
                    Expr::call("count", vec![Expr::var(&node)]),
                    &count,
                )])));
                clauses.push(call(rows, body));
                Expr::var(&count)
            }
            ("__typename", _) => Expr::string(format!("{}AggregateSelection", target.name)),
            ("node", Rows::Related { .. }) => {
                let mut nested = Vec::new();
                for attribute_field in &field.selections {
                    let attribute = target
                        .attribute(&attribute_field.name)
                        .ok_or_else(|| TranslateError::unknown_field(&target.name, &attribute_field.name))?;
                    let (body, value) = attribute_aggregate(ctx, rows, selection, Side::Node, attribute, attribute_field)?;
                    clauses.push(call(rows, body));
                    nested.push((attribute_field.response_key().to_string(), value));
                }
                Expr::Map(nested)
            }
            ("edge", Rows::Related { relationship, .. }) => {
                let properties = relationship
                    .properties
                    .as_deref()
                    .and_then(|name| schema.relationship_properties(name))
                    .ok_or_else(|| TranslateError::unknown_field(&selection.name, "edge"))?;
                let mut nested = Vec::new();
                for attribute_field in &field.selections {
                    let attribute = properties
                        .attribute(&attribute_field.name)
                        .ok_or_else(|| TranslateError::unknown_field(&properties.name, &attribute_field.name))?;
                    let (body, value) = attribute_aggregate(ctx, rows, selection, Side::Edge, attribute, attribute_field)?;
                    clauses.push(call(rows, body));
                    nested.push((attribute_field.response_key().to_string(), value));
                }
                Expr::Map(nested)
            }
            (name, Rows::Root(node)) => {
                let attribute = node
                    .attribute(name)
                    .ok_or_else(|| TranslateError::unknown_field(&node.name, name))?;
                let (body, value) = attribute_aggregate(ctx, rows, selection, Side::Node, attribute, field)?;
                clauses.push(call(rows, body));
                value
            }
            (name, Rows::Related { .. }) => {
                return Err(TranslateError::unknown_field(&selection.name, name));
            }
        };
        entries.push((key, value));
    }
    Ok((clauses, Expr::Map(entries)))
}

/// Whether an aggregated attribute lives on the node or on the relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Node,
    Edge,
}

/// Sub-query body computing one attribute aggregate. Returns the body and the
/// expression reading its result.
fn attribute_aggregate<'a>(
    ctx: &mut TranslationContext<'a>,
    rows: Rows<'_, 'a>,
    selection: &FieldSelection,
    side: Side,
    attribute: &'a AttributeSchema,
    field: &FieldSelection,
) -> Result<(Vec<Clause>, Expr), TranslateError> {
    if attribute.is_computed() || attribute.list {
        return Err(TranslateError::invalid_argument(
            format!("{}.{}", selection.name, attribute.name),
            "attribute cannot be aggregated",
        ));
    }
    let (mut body, node, edge) = matched(ctx, rows, selection, &[attribute])?;
    let owner = match side {
        Side::Node => node,
        Side::Edge => edge.ok_or_else(|| TranslateError::unknown_field(&selection.name, "edge"))?,
    };
    let value = Expr::prop(&owner, attribute.name.as_str());
    let result = ctx.fresh_value("aggregate.result");

    let allowed: &[&str] = if attribute.kind.is_string_like() {
        &["shortest", "longest"]
    } else if attribute.kind.is_numeric() {
        &["min", "max", "average", "sum"]
    } else if matches!(attribute.kind, AttributeKind::Temporal(_)) {
        &["min", "max"]
    } else {
        return Err(TranslateError::invalid_argument(
            format!("{}.{}", selection.name, attribute.name),
            "attribute cannot be aggregated",
        ));
    };

    let mut entries = Vec::new();
    let list = ctx.fresh_value("aggregate.list");
    for sub in &field.selections {
        let name = sub.name.as_str();
        if !allowed.contains(&name) {
            return Err(TranslateError::unknown_field(
                format!("{}AggregateSelection", attribute.name),
                name,
            ));
        }
        let aggregate = match name {
            "longest" => Expr::call("head", vec![Expr::var(&list)]),
            "shortest" => Expr::call("last", vec![Expr::var(&list)]),
            "average" => Expr::call("avg", vec![value.clone()]),
            other => Expr::call(other, vec![value.clone()]),
        };
        entries.push((sub.response_key().to_string(), aggregate));
    }

    if attribute.kind.is_string_like() {
        let mut ordered = Projection::variables(&[&owner]);
        ordered.order_by = vec![OrderItem {
            expr: Expr::call("size", vec![value.clone()]),
            descending: true,
        }];
        body.push(Clause::With(ordered));
        body.push(Clause::With(Projection::items(vec![ProjectionItem::aliased(
            Expr::call("collect", vec![value]),
            &list,
        )])));
    }
    body.push(Clause::Return(Projection::items(vec![ProjectionItem::aliased(
        Expr::Map(entries),
        &result,
    )])));
    Ok((body, Expr::var(&result)))
}

/// Filtered match of the aggregated rows with fresh variables. Returns the
/// clauses, the node variable and, for relationship aggregates, the edge.
fn matched<'a>(
    ctx: &mut TranslationContext<'a>,
    rows: Rows<'_, 'a>,
    selection: &FieldSelection,
    attributes: &[&'a AttributeSchema],
) -> Result<(Vec<Clause>, Variable, Option<Variable>), TranslateError> {
    let target = rows.target();
    let node = ctx.fresh_entity(format!("{}.aggregate", target.name));
    let (pattern, edge) = match rows {
        Rows::Root(_) => (Pattern::node(NodePattern::new(&node, &target.labels)), None),
        Rows::Related {
            parent,
            relationship,
            ..
        } => {
            let edge = ctx.fresh_entity(format!("{}.aggregate.edge", target.name));
            (
                relationship_pattern(parent, relationship, Some(&edge), &node, &target.labels),
                Some(edge),
            )
        }
    };

    let user = match selection.object_argument("where") {
        Some(filter) => FilterCompiler::new(ctx, ValueMode::Literal).node_where(target, &node, filter)?,
        None => CompiledFilter::default(),
    };
    let auth_target = AuthTarget::node(target).with_fields(
        attributes
            .iter()
            .map(|a| &a.authorization)
            .filter(|rules| !rules.is_empty()),
    );
    let access = read_access(ctx, &auth_target, &node, AuthOperation::Aggregate)?;
    Ok((user.and(access).apply_to(Clause::matching(pattern, None)), node, edge))
}

fn call(rows: Rows<'_, '_>, body: Vec<Clause>) -> Clause {
    match rows {
        Rows::Root(_) => Clause::call(&[], body),
        Rows::Related { parent, .. } => Clause::call(&[parent], body),
    }
}
