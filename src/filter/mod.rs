//! Compiles `where` argument trees into predicates over a bound variable.
//!
//! Keys are `<field>` or `<field>_<OPERATOR>`; siblings are conjoined and
//! `AND`/`OR`/`NOT` nest arbitrarily. Relationship fields take quantified
//! existence filters (`_SOME`, `_ALL`, `_NONE`, `_SINGLE`), connection fields
//! take `{node, edge}` trees and aggregate fields take `count` comparisons.
//! Abstract subjects (interfaces, unions) additionally accept `typename_IN`
//! and per-member sub-filters keyed by the concrete type name.
//!
//! Computed attributes are materialized by a sub-query that must run before the
//! predicate; those sub-queries are returned as [`CompiledFilter::preludes`].

pub mod operators;
pub mod relationship;
pub mod values;

use serde_json::{Map, Value};

use crate::cypher::{Clause, Expr, Operator};
use crate::graph_catalog::{
    AttributeKind, AttributeSchema, FieldContainer, GraphSchema, NodeSchema, RelationshipSchema,
    RelationshipTarget,
};
use crate::translator::computed::computed_subquery;
use crate::translator::context::TranslationContext;
use crate::translator::errors::TranslateError;
use crate::translator::patterns::label_predicate;

pub use operators::{FilterKey, FilterOperator, Quantifier};
use values::{typed, typed_list, Operand};

/// Result of compiling a `where` tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFilter {
    pub predicate: Option<Expr>,
    /// Sub-queries the predicate depends on, in order
    pub preludes: Vec<Clause>,
}

impl CompiledFilter {
    pub fn predicate(predicate: Option<Expr>) -> Self {
        Self {
            predicate,
            preludes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.predicate.is_none() && self.preludes.is_empty()
    }

    /// Conjoin another filter over the same rows.
    pub fn and(mut self, other: CompiledFilter) -> Self {
        self.preludes.extend(other.preludes);
        self.predicate = Expr::and_all(self.predicate.into_iter().chain(other.predicate));
        self
    }

    /// Clauses filtering the rows produced by `matched`. Without preludes the
    /// predicate is folded into the `MATCH ... WHERE` itself.
    pub fn apply_to(self, matched: Clause) -> Vec<Clause> {
        match matched {
            Clause::Match {
                optional,
                pattern,
                predicate,
            } if self.preludes.is_empty() => vec![Clause::Match {
                optional,
                pattern,
                predicate: Expr::and_all(predicate.into_iter().chain(self.predicate)),
            }],
            other => {
                let mut clauses = vec![other];
                let has_predicate = self.predicate.is_some();
                clauses.extend(self.preludes);
                if has_predicate {
                    clauses.push(Clause::with_star(self.predicate));
                }
                clauses
            }
        }
    }
}

/// How string values shaped like `"$jwt.<claim>"` are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    /// User `where` arguments: every value is data
    Literal,
    /// Authorization rules: `"$jwt.<claim>"` reads a request claim
    Claims,
}

/// The type a `where` tree is compiled against.
#[derive(Clone, Copy)]
pub struct Subject<'s> {
    pub owner: &'s dyn FieldContainer,
    /// Concrete node types of an abstract subject; empty for node types
    pub members: &'s [String],
}

impl<'s> Subject<'s> {
    pub fn node(node: &'s NodeSchema) -> Self {
        Self {
            owner: node,
            members: &[],
        }
    }

    pub fn fields(owner: &'s dyn FieldContainer) -> Self {
        Self { owner, members: &[] }
    }

    /// Subject for the far side of a relationship.
    pub fn target(
        schema: &'s GraphSchema,
        relationship: &RelationshipSchema,
    ) -> Result<Self, TranslateError> {
        let missing = || TranslateError::unknown_field(relationship.target.name(), relationship.name.clone());
        match &relationship.target {
            RelationshipTarget::Node(name) => schema.node(name).map(Subject::node).ok_or_else(missing),
            RelationshipTarget::Interface { name, .. } => schema
                .interface(name)
                .map(|interface| Subject {
                    owner: interface,
                    members: &interface.implementations,
                })
                .ok_or_else(missing),
            RelationshipTarget::Union { name, .. } => schema
                .union(name)
                .map(|union| Subject {
                    owner: union,
                    members: &union.members,
                })
                .ok_or_else(missing),
        }
    }
}

pub struct FilterCompiler<'c, 'a> {
    ctx: &'c mut TranslationContext<'a>,
    mode: ValueMode,
    missing_claim: bool,
}

impl<'c, 'a> FilterCompiler<'c, 'a> {
    pub fn new(ctx: &'c mut TranslationContext<'a>, mode: ValueMode) -> Self {
        Self {
            ctx,
            mode,
            missing_claim: false,
        }
    }

    /// Whether any compiled comparison read a claim the request does not carry.
    /// The emitted predicate is meaningless in that case and must be discarded.
    pub fn missing_claim(&self) -> bool {
        self.missing_claim
    }

    /// `where` over a node type.
    pub fn node_where(
        &mut self,
        node: &'a NodeSchema,
        variable: &crate::cypher::Variable,
        filter: &Map<String, Value>,
    ) -> Result<CompiledFilter, TranslateError> {
        self.subject_where(Subject::node(node), variable, filter)
    }

    pub fn subject_where(
        &mut self,
        subject: Subject<'a>,
        variable: &crate::cypher::Variable,
        filter: &Map<String, Value>,
    ) -> Result<CompiledFilter, TranslateError> {
        let mut preludes = Vec::new();
        let predicate = self.compile_map(&subject, variable, filter, &mut preludes)?;
        Ok(CompiledFilter {
            predicate,
            preludes,
        })
    }

    /// Connection `where: { node, edge }` over an already matched relationship.
    pub fn connection_where(
        &mut self,
        relationship: &'a RelationshipSchema,
        node: &crate::cypher::Variable,
        edge: &crate::cypher::Variable,
        filter: &Map<String, Value>,
    ) -> Result<CompiledFilter, TranslateError> {
        let target = Subject::target(self.ctx.schema, relationship)?;
        let mut preludes = Vec::new();
        let predicate =
            self.compile_connection_map(relationship, &target, node, Some(edge), filter, &mut preludes)?;
        Ok(CompiledFilter {
            predicate,
            preludes,
        })
    }

    fn schema(&self) -> &'a GraphSchema {
        self.ctx.schema
    }

    pub(crate) fn compile_map(
        &mut self,
        subject: &Subject<'a>,
        variable: &crate::cypher::Variable,
        map: &Map<String, Value>,
        preludes: &mut Vec<Clause>,
    ) -> Result<Option<Expr>, TranslateError> {
        let mut parts = Vec::new();
        let mut member_parts = Vec::new();

        for (key, value) in map {
            match key.as_str() {
                "AND" | "OR" => {
                    let mut compiled = Vec::new();
                    for item in logical_items(subject.owner.type_name(), key, value)? {
                        compiled.extend(self.compile_map(subject, variable, item, preludes)?);
                    }
                    let combined = if key == "AND" {
                        Expr::and_all(compiled)
                    } else {
                        Expr::or_all(compiled)
                    };
                    parts.extend(combined);
                }
                "NOT" => {
                    let inner = expect_object(subject.owner.type_name(), key, value)?;
                    if let Some(expr) = self.compile_map(subject, variable, inner, preludes)? {
                        parts.push(Expr::not(expr));
                    }
                }
                "typename_IN" if !subject.members.is_empty() => {
                    parts.push(self.typename_in(subject, variable, value)?);
                }
                member if subject.members.iter().any(|m| m == member) => {
                    let node = self
                        .schema()
                        .node(member)
                        .ok_or_else(|| TranslateError::unknown_field(subject.owner.type_name(), member))?;
                    let inner = expect_object(subject.owner.type_name(), key, value)?;
                    let narrowed = self.compile_map(&Subject::node(node), variable, inner, preludes)?;
                    member_parts.extend(Expr::and_all(
                        std::iter::once(label_predicate(variable, node)).chain(narrowed),
                    ));
                }
                _ => parts.push(self.compile_entry(subject, variable, key, value, preludes)?),
            }
        }

        parts.extend(Expr::or_all(member_parts));
        Ok(Expr::and_all(parts))
    }

    fn compile_entry(
        &mut self,
        subject: &Subject<'a>,
        variable: &crate::cypher::Variable,
        key: &str,
        value: &Value,
        preludes: &mut Vec<Clause>,
    ) -> Result<Expr, TranslateError> {
        let type_name = subject.owner.type_name();
        match operators::parse_key(subject.owner, key) {
            Some(FilterKey::Attribute(attribute, operator)) => {
                self.attribute_filter(type_name, variable, attribute, operator, key, value, preludes)
            }
            Some(FilterKey::Relationship(relationship, quantifier)) => {
                self.relationship_filter(variable, relationship, quantifier, value)
            }
            Some(FilterKey::Connection(relationship, quantifier)) => {
                self.connection_filter(variable, relationship, quantifier, value)
            }
            Some(FilterKey::Aggregate(relationship)) => {
                self.aggregate_filter(variable, relationship, value)
            }
            None => Err(TranslateError::unsupported_filter(
                type_name,
                key,
                "no such field or operator",
            )),
        }
    }

    fn typename_in(
        &mut self,
        subject: &Subject<'a>,
        variable: &crate::cypher::Variable,
        value: &Value,
    ) -> Result<Expr, TranslateError> {
        let names = value.as_array().ok_or_else(|| {
            TranslateError::invalid_argument("typename_IN", "expected a list of type names")
        })?;
        let mut alternatives = Vec::new();
        for name in names {
            let name = name.as_str().unwrap_or_default();
            if !subject.members.iter().any(|m| m == name) {
                return Err(TranslateError::unsupported_filter(
                    subject.owner.type_name(),
                    "typename_IN",
                    format!("`{}` is not a member type", name),
                ));
            }
            if let Some(node) = self.schema().node(name) {
                alternatives.push(label_predicate(variable, node));
            }
        }
        Ok(Expr::or_all(alternatives).unwrap_or_else(|| Expr::bool(false)))
    }

    #[allow(clippy::too_many_arguments)]
    fn attribute_filter(
        &mut self,
        type_name: &str,
        variable: &crate::cypher::Variable,
        attribute: &AttributeSchema,
        operator: FilterOperator,
        key: &str,
        value: &Value,
        preludes: &mut Vec<Clause>,
    ) -> Result<Expr, TranslateError> {
        let lhs = match &attribute.computed {
            Some(computed) => {
                let (clause, result) = computed_subquery(self.ctx, variable, computed);
                preludes.push(clause);
                Expr::var(&result)
            }
            None => Expr::prop(variable, attribute.name.as_str()),
        };

        if value.is_null() {
            return match operator {
                FilterOperator::Equal => Ok(Expr::IsNull(Box::new(lhs))),
                FilterOperator::Not => Ok(Expr::IsNotNull(Box::new(lhs))),
                _ => Err(TranslateError::invalid_argument(
                    format!("{}.{}", type_name, key),
                    "null is only accepted by equality filters",
                )),
            };
        }

        let kind = &attribute.kind;
        if kind.is_spatial()
            && (operator.is_ordering() || operator == FilterOperator::Distance)
        {
            return self.distance_filter(type_name, key, lhs, operator, value);
        }

        let rhs = match values::operand(self.ctx, value, self.mode == ValueMode::Claims) {
            Operand::Expr(expr) => expr,
            Operand::MissingClaim => {
                self.missing_claim = true;
                return Ok(Expr::null());
            }
        };
        let unsupported = |reason: &str| TranslateError::unsupported_filter(type_name, key, reason);

        let expr = match operator {
            FilterOperator::Equal | FilterOperator::Not => {
                let rhs = if attribute.list {
                    typed_list(self.ctx, kind, rhs)
                } else {
                    typed(kind, rhs)
                };
                negate_if(operator == FilterOperator::Not, Expr::eq(lhs, rhs))
            }
            FilterOperator::In | FilterOperator::NotIn => {
                if attribute.list {
                    return Err(unsupported("list attributes are filtered with _INCLUDES"));
                }
                if matches!(&rhs, Expr::Value(v) if !v.is_array()) {
                    return Err(unsupported("expected a list"));
                }
                let rhs = typed_list(self.ctx, kind, rhs);
                negate_if(
                    operator == FilterOperator::NotIn,
                    Expr::binary(Operator::In, lhs, rhs),
                )
            }
            op if op.is_ordering() => {
                let orderable = kind.is_numeric()
                    || matches!(kind, AttributeKind::Temporal(_) | AttributeKind::Duration)
                    || (kind.is_string_like() && attribute.ordering_enabled);
                if attribute.list || !orderable {
                    return Err(unsupported(if kind.is_string_like() {
                        "string ordering is not enabled for this attribute"
                    } else {
                        "ordering is not defined for this type"
                    }));
                }
                Expr::binary(comparison(op), lhs, typed(kind, rhs))
            }
            op if op.is_string() => {
                if attribute.list || !kind.is_string_like() {
                    return Err(unsupported("string operators require a string attribute"));
                }
                let (cypher_op, negated) = match op {
                    FilterOperator::Contains => (Operator::Contains, false),
                    FilterOperator::NotContains => (Operator::Contains, true),
                    FilterOperator::StartsWith => (Operator::StartsWith, false),
                    FilterOperator::NotStartsWith => (Operator::StartsWith, true),
                    FilterOperator::EndsWith => (Operator::EndsWith, false),
                    _ => (Operator::EndsWith, true),
                };
                negate_if(negated, Expr::binary(cypher_op, lhs, rhs))
            }
            FilterOperator::Matches => {
                if attribute.list || !kind.is_string_like() || !attribute.matches_enabled {
                    return Err(unsupported("_MATCHES is not enabled for this attribute"));
                }
                Expr::binary(Operator::RegexMatch, lhs, rhs)
            }
            FilterOperator::Includes | FilterOperator::NotIncludes => {
                if !attribute.list {
                    return Err(unsupported("_INCLUDES requires a list attribute"));
                }
                negate_if(
                    operator == FilterOperator::NotIncludes,
                    Expr::binary(Operator::In, typed(kind, rhs), lhs),
                )
            }
            _ => return Err(unsupported("operator does not apply to this type")),
        };
        Ok(expr)
    }

    /// `point.distance(this.location, point($p.point)) < $p.distance`
    fn distance_filter(
        &mut self,
        type_name: &str,
        key: &str,
        lhs: Expr,
        operator: FilterOperator,
        value: &Value,
    ) -> Result<Expr, TranslateError> {
        let (Some(point), Some(distance)) = (value.get("point"), value.get("distance")) else {
            return Err(TranslateError::invalid_argument(
                format!("{}.{}", type_name, key),
                "expected { point, distance }",
            ));
        };
        let measured = Expr::call(
            "point.distance",
            vec![lhs, Expr::call("point", vec![Expr::Value(point.clone())])],
        );
        let op = if operator == FilterOperator::Distance {
            Operator::Equal
        } else {
            comparison(operator)
        };
        Ok(Expr::binary(op, measured, Expr::Value(distance.clone())))
    }
}

pub(crate) fn comparison(operator: FilterOperator) -> Operator {
    match operator {
        FilterOperator::LessThan => Operator::LessThan,
        FilterOperator::LessThanEqual => Operator::LessThanEqual,
        FilterOperator::GreaterThan => Operator::GreaterThan,
        FilterOperator::GreaterThanEqual => Operator::GreaterThanEqual,
        _ => Operator::Equal,
    }
}

fn negate_if(negate: bool, expr: Expr) -> Expr {
    if negate {
        Expr::not(expr)
    } else {
        expr
    }
}

pub(crate) fn expect_object<'v>(
    type_name: &str,
    key: &str,
    value: &'v Value,
) -> Result<&'v Map<String, Value>, TranslateError> {
    value.as_object().ok_or_else(|| {
        TranslateError::invalid_argument(format!("{}.{}", type_name, key), "expected an object")
    })
}

/// Items of an `AND`/`OR` list; a single object is accepted as a one-item list.
pub(crate) fn logical_items<'v>(
    type_name: &str,
    key: &str,
    value: &'v Value,
) -> Result<Vec<&'v Map<String, Value>>, TranslateError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| expect_object(type_name, key, item))
            .collect(),
        Value::Object(object) => Ok(vec![object]),
        _ => Err(TranslateError::invalid_argument(
            format!("{}.{}", type_name, key),
            "expected a list of filters",
        )),
    }
}
