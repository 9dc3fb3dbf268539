use crate::auth::{check_authentication, read_access, AuthTarget};
use crate::cypher::{Clause, NodePattern, Pattern, Variable};
use crate::filter::{CompiledFilter, FilterCompiler, ValueMode};
use crate::graph_catalog::{AuthOperation, NestedOperation, NodeSchema};

use super::context::TranslationContext;
use super::errors::TranslateError;
use super::mutation_plan::{MutationPlanner, UpdateInput};
use super::operation::FieldSelection;
use super::phases::PhaseCompiler;
use super::read::mutation_response;

/// Root arguments that address relationships directly, outside `update`.
const RELATIONSHIP_ARGUMENTS: [NestedOperation; 5] = [
    NestedOperation::Connect,
    NestedOperation::Disconnect,
    NestedOperation::Create,
    NestedOperation::Delete,
    NestedOperation::ConnectOrCreate,
];

/// `update<Plural>(where, update, connect, disconnect, create, delete, connectOrCreate)`.
///
/// Matched nodes are narrowed by the `UPDATE` filter rules and checked by the
/// `BEFORE` validate rules; `SET` and the nested phases follow, then the count
/// guards of relationships whose edges changed and the `AFTER` validate rules.
pub fn root_update<'a>(
    ctx: &mut TranslationContext<'a>,
    node: &'a NodeSchema,
    selection: &FieldSelection,
) -> Result<Vec<Clause>, TranslateError> {
    check_authentication(ctx, node, AuthOperation::Update)?;
    let this = Variable::this();
    ctx.scope.bind("this", this.clone());

    let planner = MutationPlanner::new(ctx.schema);
    let mut plan = match selection.argument("update") {
        Some(value) => {
            let fields = value
                .as_object()
                .ok_or_else(|| TranslateError::invalid_argument("update", "expected an object"))?;
            planner.update(node, fields, "update")?
        }
        None => UpdateInput {
            node,
            set: Vec::new(),
            relationships: Vec::new(),
        },
    };
    for operation in RELATIONSHIP_ARGUMENTS {
        let name = operation.argument_name();
        if let Some(value) = selection.argument(name) {
            let fields = value
                .as_object()
                .ok_or_else(|| TranslateError::invalid_argument(name, "expected an object"))?;
            plan.relationships.extend(planner.top_level(node, operation, fields)?);
        }
    }
    plan.relationships = planner.group(node, std::mem::take(&mut plan.relationships));
    log::debug!(
        "{}: {} attribute update(s) on {} relationship(s)",
        selection.name,
        plan.set.len(),
        plan.relationships.len()
    );

    let user = match selection.object_argument("where") {
        Some(filter) => FilterCompiler::new(ctx, ValueMode::Literal).node_where(node, &this, filter)?,
        None => CompiledFilter::default(),
    };
    let target = AuthTarget::node(node).with_fields(plan.set.iter().map(|op| &op.attribute.authorization));
    let access = read_access(ctx, &target, &this, AuthOperation::Update)?;
    let matched = Clause::matching(Pattern::node(NodePattern::new(&this, &node.labels)), None);
    let mut clauses = user.and(access).apply_to(matched);

    clauses.extend(PhaseCompiler::new(ctx).update_node(&plan, &this)?);

    let selections = selection
        .selection(&node.plural)
        .map(|response| response.selections.as_slice())
        .unwrap_or_default();
    clauses.extend(mutation_response(ctx, node, &this, selections)?);
    Ok(clauses)
}
