use serde_json::{Map, Value};

use crate::auth::AuthContext;
use crate::cypher::{Clause, Expr, Statement, Variable, VariableScope};
use crate::graph_catalog::GraphSchema;

/// Name of the statement parameter carrying the request claims.
pub const JWT_PARAM: &str = "jwt";

/// Per-request translation state.
///
/// Created fresh for every operation and consumed when the statement is built;
/// nothing in it outlives the request. The schema is only borrowed.
pub struct TranslationContext<'a> {
    pub schema: &'a GraphSchema,
    pub auth: &'a AuthContext,
    pub scope: VariableScope,
    params: Map<String, Value>,
}

impl<'a> TranslationContext<'a> {
    pub fn new(schema: &'a GraphSchema, auth: &'a AuthContext) -> Self {
        Self {
            schema,
            auth,
            scope: VariableScope::new(),
            params: Map::new(),
        }
    }

    pub fn fresh_entity(&mut self, role: impl Into<String>) -> Variable {
        self.scope.fresh_entity(role)
    }

    pub fn fresh_value(&mut self, role: impl Into<String>) -> Variable {
        self.scope.fresh_value(role)
    }

    /// Enter a sub-query. Roles bound until the matching [`leave`](Self::leave)
    /// are only visible inside it.
    pub fn enter(&mut self) {
        self.scope.push_frame();
    }

    pub fn leave(&mut self) {
        self.scope.pop_frame();
    }

    /// Expression reading `claim` from the `$jwt` parameter, or `None` when the
    /// request does not carry that claim. Binds `$jwt` on first use.
    pub fn claim(&mut self, claim: &str) -> Option<Expr> {
        let path = self.schema.claim_path(claim);
        self.auth.claim(&path)?;
        let claims = self.auth.claims()?;
        self.params
            .entry(JWT_PARAM.to_string())
            .or_insert_with(|| Value::Object(claims.clone()));
        Some(
            path.iter()
                .fold(Expr::Param(JWT_PARAM.to_string()), |base, key| {
                    Expr::property_of(base, key.as_str())
                }),
        )
    }

    pub fn into_statement(self, clauses: Vec<Clause>) -> Statement {
        Statement::new(clauses).with_params(self.params)
    }
}
