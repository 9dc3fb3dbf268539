use crate::cypher::{Clause, Expr, Projection, ProjectionItem, Variable};
use crate::graph_catalog::graph_schema::ComputedField;

use super::context::TranslationContext;

/// Sub-query materializing a computed attribute of `owner`.
///
/// ```text
/// CALL {
///     WITH this0
///     CALL {
///         WITH this0
///         WITH this0 AS this
///         <statement>
///     }
///     WITH <column> AS var1
///     RETURN head(collect(var1)) AS var2
/// }
/// ```
///
/// The schema statement always sees the owner as `this`. Returns the clause and
/// the variable holding the value after it.
pub fn computed_subquery(
    ctx: &mut TranslationContext<'_>,
    owner: &Variable,
    computed: &ComputedField,
) -> (Clause, Variable) {
    let column = ctx.fresh_value("computed.column");
    let result = ctx.fresh_value("computed.result");
    let this = Variable::this();

    let mut inner = vec![];
    if owner != &this {
        inner.push(Clause::With(Projection::items(vec![ProjectionItem::aliased(
            Expr::var(owner),
            &this,
        )])));
    }
    inner.push(Clause::Raw(computed.statement.clone()));

    let body = vec![
        Clause::call(&[owner], inner),
        Clause::With(Projection::items(vec![ProjectionItem::aliased(
            Expr::var(&Variable::named(computed.column.clone())),
            &column,
        )])),
        Clause::Return(Projection::items(vec![ProjectionItem::aliased(
            Expr::call("head", vec![Expr::call("collect", vec![Expr::var(&column)])]),
            &result,
        )])),
    ];
    (Clause::call(&[owner], body), result)
}
