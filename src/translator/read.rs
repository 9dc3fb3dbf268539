use crate::auth::{check_authentication, read_access, AuthTarget};
use crate::cypher::{Clause, Expr, NodePattern, Pattern, Projection, ProjectionItem, Variable};
use crate::filter::{CompiledFilter, FilterCompiler, ValueMode};
use crate::graph_catalog::{AuthOperation, NodeSchema};
use crate::pagination::ReadOptions;

use super::context::TranslationContext;
use super::errors::TranslateError;
use super::operation::FieldSelection;
use super::projection::{project_node, selected_field_rules};

/// `<plural>` root read.
///
/// ```text
/// MATCH (this:Movie)
/// WHERE <where> AND <filter rules> AND <BEFORE validate>
/// WITH *
/// ORDER BY this.title ASC
/// LIMIT $param1
/// CALL { ... }
/// RETURN this { .title, actors: var2 } AS this
/// ```
pub fn root_read<'a>(
    ctx: &mut TranslationContext<'a>,
    node: &'a NodeSchema,
    selection: &FieldSelection,
) -> Result<Vec<Clause>, TranslateError> {
    check_authentication(ctx, node, AuthOperation::Read)?;
    let this = Variable::this();
    ctx.scope.bind("this", this.clone());

    let user = match selection.object_argument("where") {
        Some(filter) => FilterCompiler::new(ctx, ValueMode::Literal).node_where(node, &this, filter)?,
        None => CompiledFilter::default(),
    };
    let target = AuthTarget::node(node).with_fields(selected_field_rules(
        ctx.schema,
        node,
        &selection.selections,
    ));
    let access = read_access(ctx, &target, &this, AuthOperation::Read)?;
    let matched = Clause::matching(Pattern::node(NodePattern::new(&this, &node.labels)), None);
    let mut clauses = user.and(access).apply_to(matched);

    let options = ReadOptions::from_arguments(&selection.name, &selection.arguments, node.limit)?;
    clauses.extend(options.clauses(ctx, node, &this)?);

    let projection = project_node(ctx, node, &this, &selection.selections, false)?;
    clauses.extend(projection.subqueries);
    clauses.push(Clause::Return(Projection::items(vec![ProjectionItem::aliased(
        projection.map,
        &this,
    )])));
    log::debug!(
        "{}: read of {} with {} selected fields",
        selection.name,
        node.name,
        selection.selections.len()
    );
    Ok(clauses)
}

/// Response projection shared by mutations: read access on the written nodes,
/// then `RETURN collect(this { ... }) AS data`.
pub fn mutation_response<'a>(
    ctx: &mut TranslationContext<'a>,
    node: &'a NodeSchema,
    this: &Variable,
    selections: &[FieldSelection],
) -> Result<Vec<Clause>, TranslateError> {
    let target = AuthTarget::node(node).with_fields(selected_field_rules(ctx.schema, node, selections));
    let access = read_access(ctx, &target, this, AuthOperation::Read)?;
    let mut clauses = access.preludes;
    if access.predicate.is_some() {
        clauses.push(Clause::with_star(access.predicate));
    }

    let projection = project_node(ctx, node, this, selections, false)?;
    clauses.extend(projection.subqueries);
    let data = Variable::named("data");
    clauses.push(Clause::Return(Projection::items(vec![ProjectionItem::aliased(
        Expr::call("collect", vec![projection.map]),
        &data,
    )])));
    Ok(clauses)
}
