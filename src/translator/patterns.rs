//! Pattern fragments shared by filters, projections and mutations.

use crate::cypher::{Expr, NodePattern, Pattern, RelationshipPattern, Variable};
use crate::graph_catalog::{GraphSchema, NodeSchema, RelationshipSchema, RelationshipTarget};

/// `(parent)-[edge:TYPE]->(target:Labels)` oriented from the declaring node.
pub fn relationship_pattern(
    parent: &Variable,
    relationship: &RelationshipSchema,
    edge: Option<&Variable>,
    target: &Variable,
    labels: &[String],
) -> Pattern {
    Pattern::hop(
        NodePattern::bound(parent),
        RelationshipPattern::new(edge, &relationship.edge_type, relationship.direction),
        NodePattern::new(target, labels),
    )
}

/// Labels written on the far node of a relationship pattern. Abstract targets
/// are matched without labels and narrowed by [`member_predicate`].
pub fn target_labels(schema: &GraphSchema, relationship: &RelationshipSchema) -> Vec<String> {
    match &relationship.target {
        RelationshipTarget::Node(name) => schema
            .node(name)
            .map(|node| node.labels.clone())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// `this0:Movie`, conjoined over all labels of the node type.
pub fn label_predicate(variable: &Variable, node: &NodeSchema) -> Expr {
    Expr::and_all(node.labels.iter().map(|label| Expr::HasLabel {
        variable: variable.clone(),
        label: label.clone(),
    }))
    .unwrap_or_else(|| Expr::bool(true))
}

/// For interface and union targets: the far node is one of the concrete types.
pub fn member_predicate(
    schema: &GraphSchema,
    variable: &Variable,
    relationship: &RelationshipSchema,
) -> Option<Expr> {
    if !relationship.target.is_abstract() {
        return None;
    }
    let members = relationship
        .target
        .concrete_types()
        .into_iter()
        .filter_map(|name| schema.node(name))
        .map(|node| label_predicate(variable, node));
    Some(Expr::or_all(members).unwrap_or_else(|| Expr::bool(false)))
}
