use crate::auth::{check_authentication, read_access, AuthTarget};
use crate::cypher::{Clause, Expr, NodePattern, Pattern, Variable};
use crate::filter::{CompiledFilter, FilterCompiler, ValueMode};
use crate::graph_catalog::{AuthOperation, NestedOperation, NodeSchema};

use super::context::TranslationContext;
use super::errors::TranslateError;
use super::mutation_plan::MutationPlanner;
use super::operation::FieldSelection;
use super::phases::PhaseCompiler;

/// `delete<Plural>(where, delete)`. Deleted nodes are detached; the statement
/// returns nothing and the executor reports the counters.
pub fn root_delete<'a>(
    ctx: &mut TranslationContext<'a>,
    node: &'a NodeSchema,
    selection: &FieldSelection,
) -> Result<Vec<Clause>, TranslateError> {
    check_authentication(ctx, node, AuthOperation::Delete)?;
    let this = Variable::this();
    ctx.scope.bind("this", this.clone());

    let user = match selection.object_argument("where") {
        Some(filter) => FilterCompiler::new(ctx, ValueMode::Literal).node_where(node, &this, filter)?,
        None => CompiledFilter::default(),
    };
    let access = read_access(ctx, &AuthTarget::node(node), &this, AuthOperation::Delete)?;
    let matched = Clause::matching(Pattern::node(NodePattern::new(&this, &node.labels)), None);
    let mut clauses = user.and(access).apply_to(matched);

    if let Some(nested) = selection.object_argument(NestedOperation::Delete.argument_name()) {
        let planner = MutationPlanner::new(ctx.schema);
        let inputs = planner.top_level(node, NestedOperation::Delete, nested)?;
        clauses.extend(PhaseCompiler::new(ctx).delete_nested(&this, &inputs)?);
    }
    clauses.push(Clause::Delete {
        detach: true,
        targets: vec![Expr::var(&this)],
    });
    log::debug!("{}: delete of {}", selection.name, node.name);
    Ok(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContext;
    use crate::graph_catalog::testing::movie_schema;
    use serde_json::json;

    fn delete(type_name: &str, selection: FieldSelection, auth: AuthContext) -> Result<String, TranslateError> {
        let schema = movie_schema();
        let mut ctx = TranslationContext::new(&schema, &auth);
        let clauses = root_delete(&mut ctx, schema.node(type_name).unwrap(), &selection)?;
        Ok(ctx.into_statement(clauses).render().cypher)
    }

    #[test]
    fn test_delete_with_nested_delete() {
        let text = delete(
            "Actor",
            FieldSelection::new("deleteActors").with_arguments(json!({
                "where": { "name": "A" },
                "delete": { "movies": { "where": { "node": { "released_LT": 1990 } } } }
            })),
            AuthContext::anonymous(),
        )
        .unwrap();
        assert_eq!(
            text,
            "MATCH (this:Actor)\nWHERE this.name = $param0\n\
             CALL {\n    WITH this\n    MATCH (this)-[this0:ACTED_IN]->(this1:Movie)\n    WHERE this1.released < $param1\n    \
             DETACH DELETE this1\n    RETURN count(*) AS var2\n}\n\
             DETACH DELETE this"
        );
    }

    #[test]
    fn test_delete_before_rule_is_checked() {
        let anonymous = delete(
            "Post",
            FieldSelection::new("deletePosts"),
            AuthContext::anonymous(),
        );
        assert_eq!(anonymous.unwrap_err(), TranslateError::Forbidden);

        let text = delete("Post", FieldSelection::new("deletePosts"), AuthContext::with_claims(json!({ "sub": "u1" })))
            .unwrap();
        assert!(text.contains("\"Forbidden\""));
        assert!(text.ends_with("DETACH DELETE this"));
    }
}
