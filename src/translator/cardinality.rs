//! Count guards for `one` relationships, emitted after the mutation phases.

use crate::cypher::{
    Clause, Expr, NodePattern, Operator, Pattern, Projection, ProjectionItem, RelationshipPattern, Variable,
};
use crate::graph_catalog::{NodeSchema, RelationshipSchema};

use super::context::TranslationContext;
use super::patterns::target_labels;

/// Message raised when `relationship` ends up with the wrong number of edges.
pub fn violation_message(owner: &NodeSchema, relationship: &RelationshipSchema) -> String {
    if relationship.required {
        format!("{}.{} required exactly once", owner.name, relationship.name)
    } else {
        format!("{}.{} must be less than or equal to one", owner.name, relationship.name)
    }
}

/// ```text
/// CALL {
///     WITH this
///     MATCH (this)<-[this0:DIRECTED]-(:Person)
///     WITH count(this0) AS var1
///     WHERE apoc.util.validatePredicate(NOT (coalesce(var1 = 1, false)), "Movie.director required exactly once", [0])
///     RETURN var1 AS var2
/// }
/// ```
pub fn cardinality_guard(
    ctx: &mut TranslationContext<'_>,
    node: &Variable,
    owner: &NodeSchema,
    relationship: &RelationshipSchema,
) -> Clause {
    let edge = ctx.fresh_entity("cardinality.edge");
    let count = ctx.fresh_value("cardinality.count");
    let result = ctx.fresh_value("cardinality.result");

    let labels = target_labels(ctx.schema, relationship);
    let pattern = Pattern::hop(
        NodePattern::bound(node),
        RelationshipPattern::new(Some(&edge), &relationship.edge_type, relationship.direction),
        NodePattern::anonymous(&labels),
    );
    let condition = if relationship.required {
        Expr::eq(Expr::var(&count), Expr::int(1))
    } else {
        Expr::binary(Operator::LessThanEqual, Expr::var(&count), Expr::int(1))
    };
    let guard = Expr::validation_guard(condition, &violation_message(owner, relationship));

    let body = vec![
        Clause::matching(pattern, None),
        Clause::With(
            Projection::items(vec![ProjectionItem::aliased(
                Expr::call("count", vec![Expr::var(&edge)]),
                &count,
            )])
            .filtered(Some(guard)),
        ),
        Clause::Return(Projection::items(vec![ProjectionItem::aliased(
            Expr::var(&count),
            &result,
        )])),
    ];
    Clause::call(&[node], body)
}

/// Guards for the `one` relationships among `relationships`, in the order given.
pub fn cardinality_guards<'r>(
    ctx: &mut TranslationContext<'_>,
    node: &Variable,
    owner: &NodeSchema,
    relationships: impl IntoIterator<Item = &'r RelationshipSchema>,
) -> Vec<Clause> {
    let guards: Vec<Clause> = relationships
        .into_iter()
        .filter(|relationship| relationship.is_one())
        .map(|relationship| cardinality_guard(ctx, node, owner, relationship))
        .collect();
    if !guards.is_empty() {
        log::debug!("{}: {} cardinality guard(s)", owner.name, guards.len());
    }
    guards
}
