//! Selection sets → map projections.
//!
//! Stored attributes project as `.name`. Everything else needs a sub-query
//! that runs before the projection: computed attributes, relationship fields,
//! connection fields and aggregate fields each contribute one `CALL` whose
//! result variable the map then refers to.

use crate::auth::{check_authentication, read_access, AuthTarget};
use crate::cypher::{Clause, Expr, Projection, ProjectionEntry, ProjectionItem, Variable};
use crate::filter::{CompiledFilter, FilterCompiler, Subject, ValueMode};
use crate::graph_catalog::{
    AuthOperation, AuthorizationRules, FieldContainer, GraphSchema, NodeSchema, RelationshipSchema,
    RelationshipTarget,
};
use crate::pagination::connection::relationship_connection;
use crate::pagination::ReadOptions;

use super::aggregate::relationship_aggregate;
use super::computed::computed_subquery;
use super::context::TranslationContext;
use super::errors::TranslateError;
use super::operation::FieldSelection;
use super::patterns::relationship_pattern;

pub const TYPENAME: &str = "__typename";

/// Map projection of one node plus the sub-queries it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeProjection {
    pub subqueries: Vec<Clause>,
    pub map: Expr,
}

/// Whether a field selected under type condition `on` applies to `node`.
pub fn applies_to(schema: &GraphSchema, selection: &FieldSelection, node: &NodeSchema) -> bool {
    match selection.on.as_deref() {
        None => true,
        Some(on) if on == node.name => true,
        Some(on) => {
            node.interfaces.iter().any(|i| i == on)
                || schema
                    .union(on)
                    .is_some_and(|union| union.members.contains(&node.name))
        }
    }
}

/// Field-level authorization rules of the fields selected on `node`.
pub fn selected_field_rules<'a>(
    schema: &GraphSchema,
    node: &'a NodeSchema,
    selections: &[FieldSelection],
) -> Vec<&'a AuthorizationRules> {
    let mut rules: Vec<&'a AuthorizationRules> = Vec::new();
    for selection in selections.iter().filter(|s| applies_to(schema, s, node)) {
        let name = selection.name.as_str();
        let field_rules = node
            .attribute(name)
            .map(|a| &a.authorization)
            .or_else(|| node.relationship(relationship_name(name)).map(|r| &r.authorization));
        if let Some(field_rules) = field_rules.filter(|r| !r.is_empty()) {
            if !rules.iter().any(|seen| std::ptr::eq(*seen, field_rules)) {
                rules.push(field_rules);
            }
        }
    }
    rules
}

/// `actorsConnection` and `actorsAggregate` both address `actors`.
fn relationship_name(field: &str) -> &str {
    field
        .strip_suffix("Connection")
        .or_else(|| field.strip_suffix("Aggregate"))
        .unwrap_or(field)
}

/// Project `selections` of `node` bound to `variable`. With `typename` set the
/// map always carries `__typename`, as abstract results need it.
pub fn project_node<'a>(
    ctx: &mut TranslationContext<'a>,
    node: &'a NodeSchema,
    variable: &Variable,
    selections: &[FieldSelection],
    typename: bool,
) -> Result<NodeProjection, TranslateError> {
    let schema = ctx.schema;
    let mut subqueries = Vec::new();
    let mut entries = Vec::new();
    let mut has_typename = false;

    for selection in selections.iter().filter(|s| applies_to(schema, s, node)) {
        let key = selection.response_key().to_string();
        let name = selection.name.as_str();

        if name == TYPENAME {
            has_typename = true;
            entries.push(ProjectionEntry::Field(key, Expr::string(node.name.as_str())));
            continue;
        }

        if let Some(attribute) = node.attribute(name) {
            let entry = match &attribute.computed {
                Some(computed) => {
                    let (clause, result) = computed_subquery(ctx, variable, computed);
                    subqueries.push(clause);
                    ProjectionEntry::Field(key, Expr::var(&result))
                }
                None if key == attribute.name => ProjectionEntry::Property(key),
                None => ProjectionEntry::Field(key, Expr::prop(variable, attribute.name.as_str())),
            };
            entries.push(entry);
            continue;
        }

        let (clause, result) = if let Some(relationship) = node.relationship(name) {
            relationship_field(ctx, variable, node, relationship, selection)?
        } else if let Some(relationship) = name
            .strip_suffix("Connection")
            .and_then(|field| node.relationship(field))
        {
            relationship_connection(ctx, variable, node, relationship, selection)?
        } else if let Some(relationship) = name
            .strip_suffix("Aggregate")
            .and_then(|field| node.relationship(field))
        {
            relationship_aggregate(ctx, variable, node, relationship, selection)?
        } else {
            return Err(TranslateError::unknown_field(&node.name, name));
        };
        subqueries.push(clause);
        entries.push(ProjectionEntry::Field(key, Expr::var(&result)));
    }

    if typename && !has_typename {
        entries.insert(
            0,
            ProjectionEntry::Field(TYPENAME.to_string(), Expr::string(node.name.as_str())),
        );
    }

    Ok(NodeProjection {
        subqueries,
        map: Expr::MapProjection {
            variable: variable.clone(),
            entries,
        },
    })
}

/// Sub-query collecting the projected related nodes of a relationship field.
///
/// ```text
/// CALL {
///     WITH this
///     MATCH (this)<-[:ACTED_IN]-(this0:Actor)
///     WHERE ...
///     RETURN collect(this0 { .name }) AS var1
/// }
/// ```
///
/// `one` relationships return `head(collect(...))`. Interface and union targets
/// match every member type in a `UNION` of branches.
pub fn relationship_field<'a>(
    ctx: &mut TranslationContext<'a>,
    parent: &Variable,
    owner: &'a NodeSchema,
    relationship: &'a RelationshipSchema,
    selection: &FieldSelection,
) -> Result<(Clause, Variable), TranslateError> {
    let schema = ctx.schema;
    let location = format!("{}.{}", owner.name, relationship.name);
    ctx.enter();
    let result = ctx.fresh_value(location.clone());

    let body = match &relationship.target {
        RelationshipTarget::Node(name) => {
            let target = schema
                .node(name)
                .ok_or_else(|| TranslateError::unknown_field(&owner.name, &relationship.name))?;
            let related = ctx.fresh_entity(format!("{}.node", location));
            let mut body = related_rows(ctx, parent, relationship, target, &related, selection)?;
            if !relationship.is_one() {
                let options = ReadOptions::from_arguments(&location, &selection.arguments, target.limit)?;
                body.extend(options.clauses(ctx, target, &related)?);
            }
            let projection = project_node(ctx, target, &related, &selection.selections, false)?;
            body.extend(projection.subqueries);
            body.push(collect_into(projection.map, relationship.is_one(), &result));
            body
        }
        RelationshipTarget::Interface { .. } | RelationshipTarget::Union { .. } => {
            let item = ctx.fresh_value(format!("{}.item", location));
            let mut branches = Vec::new();
            for member in relationship.target.concrete_types() {
                let target = schema
                    .node(member)
                    .ok_or_else(|| TranslateError::unknown_field(&owner.name, &relationship.name))?;
                let related = ctx.fresh_entity(format!("{}.{}", location, member));
                let mut branch = vec![Clause::With(Projection::variables(&[parent]))];
                branch.extend(related_rows(ctx, parent, relationship, target, &related, selection)?);
                let projection = project_node(ctx, target, &related, &selection.selections, true)?;
                branch.extend(projection.subqueries);
                branch.push(Clause::Return(Projection::items(vec![ProjectionItem::aliased(
                    projection.map,
                    &item,
                )])));
                branches.push(branch);
            }
            let mut body = vec![Clause::call(&[], vec![Clause::Union(branches)])];
            if !relationship.is_one() {
                let options = ReadOptions::from_arguments(&location, &selection.arguments, None)?;
                let fields = Subject::target(schema, relationship)?.owner;
                body.extend(options.clauses(ctx, fields, &item)?);
            }
            body.push(collect_into(Expr::var(&item), relationship.is_one(), &result));
            body
        }
    };

    ctx.leave();
    Ok((Clause::call(&[parent], body), result))
}

/// `MATCH (parent)-[:T]-(related:Label)` filtered by the field's `where`, the
/// target's read filter rules and its `BEFORE` read validation.
fn related_rows<'a>(
    ctx: &mut TranslationContext<'a>,
    parent: &Variable,
    relationship: &'a RelationshipSchema,
    target: &'a NodeSchema,
    related: &Variable,
    selection: &FieldSelection,
) -> Result<Vec<Clause>, TranslateError> {
    check_authentication(ctx, target, AuthOperation::Read)?;
    let schema = ctx.schema;
    let pattern = relationship_pattern(parent, relationship, None, related, &target.labels);

    let user = match selection.object_argument("where") {
        Some(filter) => {
            let subject = if relationship.target.is_abstract() {
                Subject::target(schema, relationship)?
            } else {
                Subject::node(target)
            };
            FilterCompiler::new(ctx, ValueMode::Literal).subject_where(subject, related, filter)?
        }
        None => CompiledFilter::default(),
    };
    let auth_target = AuthTarget::node(target).with_fields(selected_field_rules(
        schema,
        target,
        &selection.selections,
    ));
    let access = read_access(ctx, &auth_target, related, AuthOperation::Read)?;
    Ok(user.and(access).apply_to(Clause::matching(pattern, None)))
}

/// `RETURN collect(<value>) AS <result>`, or `head(collect(...))` for `one`.
fn collect_into(value: Expr, one: bool, result: &Variable) -> Clause {
    let collected = Expr::call("collect", vec![value]);
    let collected = if one {
        Expr::call("head", vec![collected])
    } else {
        collected
    };
    Clause::Return(Projection::items(vec![ProjectionItem::aliased(collected, result)]))
}
