use serde_json::Value;

use crate::cypher::{Clause, Expr, Projection, Variable};
use crate::graph_catalog::NodeSchema;

use super::context::TranslationContext;
use super::errors::TranslateError;
use super::mutation_plan::{CreateInput, MutationPlanner};
use super::operation::FieldSelection;
use super::phases::PhaseCompiler;
use super::read::mutation_response;

/// `create<Plural>(input: [...])`.
///
/// Each input element is created in its own sub-query returning the new node;
/// the nodes are then unwound into `this` for the response projection.
///
/// ```text
/// CALL {
///     CREATE (this0:Movie)
///     SET this0.title = $param0
///     ...
///     RETURN this0
/// }
/// UNWIND [this0] AS this
/// RETURN collect(this { .title }) AS data
/// ```
pub fn root_create<'a>(
    ctx: &mut TranslationContext<'a>,
    node: &'a NodeSchema,
    selection: &FieldSelection,
) -> Result<Vec<Clause>, TranslateError> {
    let inputs = match selection.argument("input") {
        Some(Value::Array(items)) => items.iter().collect::<Vec<&Value>>(),
        Some(single @ Value::Object(_)) => vec![single],
        Some(_) => return Err(TranslateError::invalid_argument("input", "expected a list of objects")),
        None => Vec::new(),
    };
    if inputs.is_empty() {
        return Err(TranslateError::invalid_argument("input", "expected at least one input"));
    }

    let planner = MutationPlanner::new(ctx.schema);
    let mut clauses = Vec::with_capacity(inputs.len() + 2);
    let mut created = Vec::with_capacity(inputs.len());
    for (index, value) in inputs.into_iter().enumerate() {
        let location = format!("input[{}]", index);
        let fields = value
            .as_object()
            .ok_or_else(|| TranslateError::invalid_argument(&location, "expected an object"))?;
        let plan = planner.create(node, fields, &location)?;

        ctx.enter();
        let new_node = ctx.fresh_entity("create.node");
        let body = created_node(ctx, &plan, &new_node);
        ctx.leave();
        let mut body = body?;
        body.push(Clause::Return(Projection::variables(&[&new_node])));
        clauses.push(Clause::call(&[], body));
        created.push(new_node);
    }
    log::debug!("{}: creating {} {} node(s)", selection.name, created.len(), node.name);

    let this = Variable::this();
    ctx.scope.bind("this", this.clone());
    clauses.push(Clause::Unwind {
        list: Expr::List(created.iter().map(Expr::var).collect()),
        alias: this.clone(),
    });
    let selections = selection
        .selection(&node.plural)
        .map(|response| response.selections.as_slice())
        .unwrap_or_default();
    clauses.extend(mutation_response(ctx, node, &this, selections)?);
    Ok(clauses)
}

fn created_node<'a>(
    ctx: &mut TranslationContext<'a>,
    plan: &CreateInput<'a>,
    node: &Variable,
) -> Result<Vec<Clause>, TranslateError> {
    let mut compiler = PhaseCompiler::new(ctx);
    let mut clauses = compiler.create_node(plan, node)?;
    clauses.extend(compiler.create_checks(plan, node)?);
    Ok(clauses)
}
