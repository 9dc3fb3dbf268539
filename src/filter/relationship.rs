//! Filters that cross a relationship. Each compiles to a sub-query over the
//! matched pattern so that an empty traversal is `false`, never "no rows".

use serde_json::{Map, Value};

use crate::cypher::{Clause, Expr, Variable};
use crate::graph_catalog::RelationshipSchema;
use crate::translator::errors::TranslateError;
use crate::translator::patterns::{member_predicate, relationship_pattern, target_labels};

use super::operators::COUNT_SUFFIXES;
use super::{comparison, expect_object, logical_items, FilterCompiler, Quantifier, Subject};

/// Which grammar the filter inside the sub-query follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inner {
    /// Filter over the related node
    Node,
    /// `{ node, edge }` over the related node and the relationship
    Connection,
}

/// `MATCH <pattern> WHERE <predicate>`, or a bare `MATCH` followed by the
/// preludes and a `WITH * WHERE` when the predicate depends on them.
pub(crate) fn subquery_body(
    matched: Clause,
    predicate: Option<Expr>,
    preludes: Vec<Clause>,
) -> Vec<Clause> {
    super::CompiledFilter {
        predicate,
        preludes,
    }
    .apply_to(matched)
}

impl<'c, 'a> FilterCompiler<'c, 'a> {
    pub(super) fn relationship_filter(
        &mut self,
        parent: &Variable,
        relationship: &'a RelationshipSchema,
        quantifier: Quantifier,
        value: &Value,
    ) -> Result<Expr, TranslateError> {
        self.quantified(parent, relationship, quantifier, value, Inner::Node)
    }

    pub(super) fn connection_filter(
        &mut self,
        parent: &Variable,
        relationship: &'a RelationshipSchema,
        quantifier: Quantifier,
        value: &Value,
    ) -> Result<Expr, TranslateError> {
        self.quantified(parent, relationship, quantifier, value, Inner::Connection)
    }

    fn quantified(
        &mut self,
        parent: &Variable,
        relationship: &'a RelationshipSchema,
        quantifier: Quantifier,
        value: &Value,
        inner: Inner,
    ) -> Result<Expr, TranslateError> {
        // `actors: null` asks for nodes without any related node.
        if value.is_null() {
            let body = self.related(parent, relationship, None, inner, false)?;
            return Ok(Expr::not(Expr::Exists(body)));
        }
        let filter = expect_object(&relationship.name, "where", value)?;

        let expr = match quantifier {
            Quantifier::Some => Expr::Exists(self.related(parent, relationship, Some(filter), inner, false)?),
            Quantifier::None => Expr::not(Expr::Exists(self.related(
                parent,
                relationship,
                Some(filter),
                inner,
                false,
            )?)),
            Quantifier::Single => Expr::eq(
                Expr::CountSubquery(self.related(parent, relationship, Some(filter), inner, false)?),
                Expr::int(1),
            ),
            Quantifier::All => {
                let exists = Expr::Exists(self.related(parent, relationship, None, inner, false)?);
                let counter_examples = self.related(parent, relationship, Some(filter), inner, true)?;
                if counter_examples.is_empty() {
                    exists
                } else {
                    Expr::And(vec![exists, Expr::not(Expr::Exists(counter_examples))])
                }
            }
        };
        Ok(expr)
    }

    /// Sub-query body matching related nodes that satisfy `filter`, or that
    /// violate it when `negate` is set. An empty body means nothing can violate
    /// an empty filter.
    fn related(
        &mut self,
        parent: &Variable,
        relationship: &'a RelationshipSchema,
        filter: Option<&Map<String, Value>>,
        inner: Inner,
        negate: bool,
    ) -> Result<Vec<Clause>, TranslateError> {
        let schema = self.ctx.schema;
        let target = Subject::target(schema, relationship)?;
        let node = self.ctx.fresh_entity(format!("filter.{}", relationship.name));
        let edge = match inner {
            Inner::Connection => Some(self.ctx.fresh_entity(format!("filter.{}.edge", relationship.name))),
            Inner::Node => None,
        };

        let mut preludes = Vec::new();
        let compiled = match (filter, inner) {
            (None, _) => None,
            (Some(filter), Inner::Node) => self.compile_map(&target, &node, filter, &mut preludes)?,
            (Some(filter), Inner::Connection) => self.compile_connection_map(
                relationship,
                &target,
                &node,
                edge.as_ref(),
                filter,
                &mut preludes,
            )?,
        };
        let compiled = match (compiled, negate) {
            (None, true) => return Ok(Vec::new()),
            (Some(expr), true) => Some(Expr::not(expr)),
            (other, false) => other,
        };

        let labels = target_labels(schema, relationship);
        let pattern = relationship_pattern(parent, relationship, edge.as_ref(), &node, &labels);
        let predicate = Expr::and_all(
            member_predicate(schema, &node, relationship)
                .into_iter()
                .chain(compiled),
        );
        Ok(subquery_body(Clause::matching(pattern, None), predicate, preludes))
    }

    /// `{ node, edge, AND, OR, NOT }` over a related node and its relationship.
    pub(super) fn compile_connection_map(
        &mut self,
        relationship: &'a RelationshipSchema,
        target: &Subject<'a>,
        node: &Variable,
        edge: Option<&Variable>,
        map: &Map<String, Value>,
        preludes: &mut Vec<Clause>,
    ) -> Result<Option<Expr>, TranslateError> {
        let owner = format!("{}Connection", relationship.name);
        let mut parts = Vec::new();
        for (key, value) in map {
            match key.as_str() {
                "node" => {
                    let filter = expect_object(&owner, key, value)?;
                    parts.extend(self.compile_map(target, node, filter, preludes)?);
                }
                "edge" => {
                    let filter = expect_object(&owner, key, value)?;
                    let properties = relationship
                        .properties
                        .as_deref()
                        .and_then(|name| self.ctx.schema.relationship_properties(name));
                    let (Some(properties), Some(edge)) = (properties, edge) else {
                        return Err(TranslateError::unsupported_filter(
                            &owner,
                            "edge",
                            "relationship has no properties",
                        ));
                    };
                    parts.extend(self.compile_map(&Subject::fields(properties), edge, filter, preludes)?);
                }
                "AND" | "OR" => {
                    let mut compiled = Vec::new();
                    for item in logical_items(&owner, key, value)? {
                        compiled.extend(
                            self.compile_connection_map(relationship, target, node, edge, item, preludes)?,
                        );
                    }
                    parts.extend(if key == "AND" {
                        Expr::and_all(compiled)
                    } else {
                        Expr::or_all(compiled)
                    });
                }
                "NOT" => {
                    let item = expect_object(&owner, key, value)?;
                    if let Some(expr) =
                        self.compile_connection_map(relationship, target, node, edge, item, preludes)?
                    {
                        parts.push(Expr::not(expr));
                    }
                }
                other => {
                    return Err(TranslateError::unsupported_filter(
                        &owner,
                        other,
                        "expected node, edge, AND, OR or NOT",
                    ))
                }
            }
        }
        Ok(Expr::and_all(parts))
    }

    /// `actorsAggregate: { count_GT: 2 }` → `COUNT { MATCH ... } > $param0`
    pub(super) fn aggregate_filter(
        &mut self,
        parent: &Variable,
        relationship: &'a RelationshipSchema,
        value: &Value,
    ) -> Result<Expr, TranslateError> {
        let owner = format!("{}Aggregate", relationship.name);
        let map = expect_object(&owner, "where", value)?;
        Ok(self
            .aggregate_map(parent, relationship, &owner, map)?
            .unwrap_or_else(|| Expr::bool(true)))
    }

    fn aggregate_map(
        &mut self,
        parent: &Variable,
        relationship: &'a RelationshipSchema,
        owner: &str,
        map: &Map<String, Value>,
    ) -> Result<Option<Expr>, TranslateError> {
        let mut parts = Vec::new();
        for (key, value) in map {
            match key.as_str() {
                "AND" | "OR" => {
                    let mut compiled = Vec::new();
                    for item in logical_items(owner, key, value)? {
                        compiled.extend(self.aggregate_map(parent, relationship, owner, item)?);
                    }
                    parts.extend(if key == "AND" {
                        Expr::and_all(compiled)
                    } else {
                        Expr::or_all(compiled)
                    });
                }
                "NOT" => {
                    let item = expect_object(owner, key, value)?;
                    if let Some(expr) = self.aggregate_map(parent, relationship, owner, item)? {
                        parts.push(Expr::not(expr));
                    }
                }
                other => {
                    let operator = COUNT_SUFFIXES
                        .iter()
                        .find(|(suffix, _)| *suffix == other)
                        .map(|(_, operator)| *operator)
                        .ok_or_else(|| {
                            TranslateError::unsupported_filter(owner, other, "only count filters are supported")
                        })?;
                    if !value.is_u64() {
                        return Err(TranslateError::invalid_argument(
                            format!("{}.{}", owner, other),
                            "expected a non-negative integer",
                        ));
                    }
                    let counted = self.related(parent, relationship, None, Inner::Node, false)?;
                    parts.push(Expr::binary(
                        comparison(operator),
                        Expr::CountSubquery(counted),
                        Expr::Value(value.clone()),
                    ));
                }
            }
        }
        Ok(Expr::and_all(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::super::{FilterCompiler, ValueMode};
    use crate::auth::AuthContext;
    use crate::cypher::{Clause, NodePattern, Pattern, Variable};
    use crate::graph_catalog::testing::movie_schema;
    use crate::translator::context::TranslationContext;
    use crate::translator::errors::TranslateError;
    use serde_json::{json, Value};

    fn render(type_name: &str, filter: Value) -> Result<String, TranslateError> {
        let schema = movie_schema();
        let auth = AuthContext::anonymous();
        let mut ctx = TranslationContext::new(&schema, &auth);
        let node = schema.node(type_name).unwrap();
        let this = Variable::this();
        let compiled = FilterCompiler::new(&mut ctx, ValueMode::Literal).node_where(
            node,
            &this,
            filter.as_object().unwrap(),
        )?;
        let matched = Clause::matching(Pattern::node(NodePattern::new(&this, &node.labels)), None);
        Ok(ctx.into_statement(compiled.apply_to(matched)).render().cypher)
    }

    #[test]
    fn test_some_is_exists() {
        let text = render("Movie", json!({ "actors_SOME": { "name": "Keanu" } })).unwrap();
        assert_eq!(
            text,
            "MATCH (this:Movie)\nWHERE EXISTS {\n    MATCH (this)<-[:ACTED_IN]-(this0:Actor)\n    WHERE this0.name = $param0\n}"
        );
    }

    #[test]
    fn test_none_and_null_are_negated_exists() {
        let none = render("Movie", json!({ "actors_NONE": { "name": "Keanu" } })).unwrap();
        assert!(none.starts_with("MATCH (this:Movie)\nWHERE NOT (EXISTS {"));
        let null = render("Movie", json!({ "director": null })).unwrap();
        assert_eq!(
            null,
            "MATCH (this:Movie)\nWHERE NOT (EXISTS { MATCH (this)<-[:DIRECTED]-(this0:Person) })"
        );
    }

    #[test]
    fn test_all_requires_existence_and_no_counter_example() {
        let text = render("Movie", json!({ "actors_ALL": { "born_GT": 1960 } })).unwrap();
        assert_eq!(
            text,
            "MATCH (this:Movie)\nWHERE EXISTS { MATCH (this)<-[:ACTED_IN]-(this0:Actor) } \
             AND NOT (EXISTS {\n    MATCH (this)<-[:ACTED_IN]-(this1:Actor)\n    WHERE NOT (this1.born > $param0)\n})"
        );
    }

    #[test]
    fn test_single_counts_exactly_one() {
        let text = render("Movie", json!({ "actors_SINGLE": { "name": "Keanu" } })).unwrap();
        assert!(text.starts_with("MATCH (this:Movie)\nWHERE COUNT {"));
        assert!(text.ends_with("} = 1"));
    }

    #[test]
    fn test_connection_filter_on_edge_properties() {
        let text = render(
            "Movie",
            json!({ "actorsConnection_SOME": { "edge": { "role": "Neo" }, "node": { "name": "Keanu" } } }),
        )
        .unwrap();
        assert_eq!(
            text,
            "MATCH (this:Movie)\nWHERE EXISTS {\n    MATCH (this)<-[this0:ACTED_IN]-(this1:Actor)\n    \
             WHERE this0.role = $param0 AND this1.name = $param1\n}"
        );
    }

    #[test]
    fn test_edge_filter_without_properties_is_rejected() {
        let err = render("Movie", json!({ "directorConnection": { "edge": { "x": 1 } } })).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedFilter { .. }));
    }

    #[test]
    fn test_aggregate_count_filter() {
        let text = render("Movie", json!({ "actorsAggregate": { "count_GT": 2 } })).unwrap();
        assert_eq!(
            text,
            "MATCH (this:Movie)\nWHERE COUNT { MATCH (this)<-[:ACTED_IN]-(this0:Actor) } > $param0"
        );
    }

    #[test]
    fn test_union_member_filters() {
        let text = render(
            "Collection",
            json!({ "items_SOME": { "Movie": { "title": "M" }, "Actor": { "name": "A" } } }),
        )
        .unwrap();
        assert_eq!(
            text,
            "MATCH (this:Collection)\nWHERE EXISTS {\n    MATCH (this)-[:CONTAINS]->(this0)\n    \
             WHERE (this0:Movie OR this0:Actor) AND ((this0:Movie AND this0.title = $param0) OR (this0:Actor AND this0.name = $param1))\n}"
        );
    }

    #[test]
    fn test_typename_in_on_interface_target() {
        let text = render("Movie", json!({ "related_SOME": { "typename_IN": ["Series"] } })).unwrap();
        assert_eq!(
            text,
            "MATCH (this:Movie)\nWHERE EXISTS {\n    MATCH (this)-[:RELATED_TO]->(this0)\n    \
             WHERE (this0:Movie OR this0:Series) AND this0:Series\n}"
        );
    }
}
