use serde_json::Value;

use crate::cypher::Expr;
use crate::graph_catalog::{AttributeKind, AttributeSchema};
use crate::translator::context::TranslationContext;

/// Prefix marking a claim reference inside authorization rules.
pub const CLAIM_PREFIX: &str = "$jwt.";

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Expr(Expr),
    /// Claim referenced by a rule but absent from the request
    MissingClaim,
}

/// Resolve a filter value. With `claims` enabled, `"$jwt.<claim>"` strings
/// refer to request claims; otherwise every value is taken literally.
pub fn operand(ctx: &mut TranslationContext<'_>, value: &Value, claims: bool) -> Operand {
    if claims {
        if let Some(claim) = value.as_str().and_then(|s| s.strip_prefix(CLAIM_PREFIX)) {
            return match ctx.claim(claim) {
                Some(expr) => Operand::Expr(expr),
                None => Operand::MissingClaim,
            };
        }
        if let Value::Array(items) = value {
            let has_claims = items
                .iter()
                .any(|item| item.as_str().is_some_and(|s| s.starts_with(CLAIM_PREFIX)));
            if has_claims {
                let mut resolved = Vec::with_capacity(items.len());
                for item in items {
                    match operand(ctx, item, true) {
                        Operand::Expr(expr) => resolved.push(expr),
                        Operand::MissingClaim => return Operand::MissingClaim,
                    }
                }
                return Operand::Expr(Expr::List(resolved));
            }
        }
    }
    Operand::Expr(Expr::Value(value.clone()))
}

/// Name of the Cypher constructor applied to values of this kind, if any.
fn constructor(kind: &AttributeKind) -> Option<&'static str> {
    match kind {
        AttributeKind::Temporal(temporal) => Some(temporal.constructor()),
        AttributeKind::Duration => Some("duration"),
        AttributeKind::Point | AttributeKind::CartesianPoint => Some("point"),
        _ => None,
    }
}

/// Convert a scalar operand to the attribute's stored type.
pub fn typed(kind: &AttributeKind, expr: Expr) -> Expr {
    match constructor(kind) {
        Some(name) => Expr::call(name, vec![expr]),
        None => expr,
    }
}

/// Convert every element of a list operand to the attribute's stored type.
pub fn typed_list(ctx: &mut TranslationContext<'_>, kind: &AttributeKind, expr: Expr) -> Expr {
    match constructor(kind) {
        Some(name) => {
            let element = ctx.fresh_value("list.element");
            Expr::comprehension(
                &element,
                expr,
                None,
                Some(Expr::call(name, vec![Expr::var(&element)])),
            )
        }
        None => expr,
    }
}

/// Value written for an attribute by `SET` or `CREATE`.
pub fn stored_value(ctx: &mut TranslationContext<'_>, attribute: &AttributeSchema, value: &Value) -> Expr {
    if value.is_null() {
        return Expr::null();
    }
    let expr = Expr::Value(value.clone());
    if attribute.list {
        typed_list(ctx, &attribute.kind, expr)
    } else {
        typed(&attribute.kind, expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContext;
    use crate::graph_catalog::testing::movie_schema;
    use crate::graph_catalog::TemporalKind;
    use serde_json::json;

    #[test]
    fn test_claim_operand_resolves_present_and_missing_claims() {
        let schema = movie_schema();
        let auth = AuthContext::with_claims(json!({ "sub": "user-1" }));
        let mut ctx = TranslationContext::new(&schema, &auth);

        match operand(&mut ctx, &json!("$jwt.sub"), true) {
            Operand::Expr(Expr::Property { key, .. }) => assert_eq!(key, "sub"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(operand(&mut ctx, &json!("$jwt.email"), true), Operand::MissingClaim);
        assert_eq!(
            operand(&mut ctx, &json!("$jwt.sub"), false),
            Operand::Expr(Expr::Value(json!("$jwt.sub")))
        );
    }

    #[test]
    fn test_list_operand_with_missing_claim_is_missing() {
        let schema = movie_schema();
        let auth = AuthContext::with_claims(json!({ "sub": "user-1" }));
        let mut ctx = TranslationContext::new(&schema, &auth);
        assert_eq!(
            operand(&mut ctx, &json!(["$jwt.sub", "$jwt.email"]), true),
            Operand::MissingClaim
        );
        assert!(matches!(
            operand(&mut ctx, &json!(["$jwt.sub", "fixed"]), true),
            Operand::Expr(Expr::List(items)) if items.len() == 2
        ));
    }

    #[test]
    fn test_temporal_values_are_wrapped() {
        let kind = AttributeKind::Temporal(TemporalKind::DateTime);
        assert_eq!(
            typed(&kind, Expr::value("2020-01-01T00:00:00Z")),
            Expr::call("datetime", vec![Expr::value("2020-01-01T00:00:00Z")])
        );
        assert_eq!(typed(&AttributeKind::Int, Expr::value(1)), Expr::value(1));
    }
}
