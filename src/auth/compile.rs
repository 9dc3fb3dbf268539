//! Authorization rules → predicates and guards.
//!
//! Rules are gathered from three origins: the node type itself, the interfaces
//! it implements and the fields an operation touches. For `filter` rules the
//! rules of one origin are alternatives (any of them admits a row) and the
//! origins are conjoined with each other and with the user `where`. `validate`
//! rules are conjoined everywhere and wrapped in a guard raising `Forbidden`.
//!
//! Parts of a rule that only read claims are folded while compiling. A folded
//! `validate` failure is reported immediately instead of being emitted.

use crate::cypher::{Clause, Expr, Variable};
use crate::filter::{CompiledFilter, FilterCompiler, Subject, ValueMode};
use crate::graph_catalog::{
    AuthOperation, AuthPredicate, AuthorizationRules, FilterRule, NodeSchema, Timing,
};
use crate::translator::context::TranslationContext;
use crate::translator::errors::TranslateError;

use super::jwt;

/// Message raised by every authorization guard.
pub const FORBIDDEN: &str = "Forbidden";

/// A node type together with the fields an operation reads or writes on it.
#[derive(Debug, Clone)]
pub struct AuthTarget<'a> {
    pub node: &'a NodeSchema,
    pub fields: Vec<&'a AuthorizationRules>,
}

impl<'a> AuthTarget<'a> {
    pub fn node(node: &'a NodeSchema) -> Self {
        Self {
            node,
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: impl IntoIterator<Item = &'a AuthorizationRules>) -> Self {
        self.fields
            .extend(fields.into_iter().filter(|rules| !rules.is_empty()));
        self
    }
}

/// Partially evaluated condition.
#[derive(Debug, Clone, PartialEq)]
enum Cond {
    /// Known at translation time; `None` is NULL
    Const(Option<bool>),
    Expr(Expr),
}

impl Cond {
    fn and(parts: Vec<Cond>) -> Cond {
        let mut exprs = Vec::new();
        let mut unknown = false;
        for part in parts {
            match part {
                Cond::Const(Some(false)) => return Cond::Const(Some(false)),
                Cond::Const(Some(true)) => {}
                Cond::Const(None) => unknown = true,
                Cond::Expr(expr) => exprs.push(expr),
            }
        }
        Cond::combine(exprs, unknown, true)
    }

    fn or(parts: Vec<Cond>) -> Cond {
        let mut exprs = Vec::new();
        let mut unknown = false;
        for part in parts {
            match part {
                Cond::Const(Some(true)) => return Cond::Const(Some(true)),
                Cond::Const(Some(false)) => {}
                Cond::Const(None) => unknown = true,
                Cond::Expr(expr) => exprs.push(expr),
            }
        }
        Cond::combine(exprs, unknown, false)
    }

    fn combine(mut exprs: Vec<Expr>, unknown: bool, conjunction: bool) -> Cond {
        if exprs.is_empty() {
            return Cond::Const(if unknown { None } else { Some(conjunction) });
        }
        if unknown {
            exprs.push(Expr::null());
        }
        let combined = if conjunction {
            Expr::and_all(exprs)
        } else {
            Expr::or_all(exprs)
        };
        combined.map_or(Cond::Const(Some(conjunction)), Cond::Expr)
    }

    fn not(self) -> Cond {
        match self {
            Cond::Const(value) => Cond::Const(value.map(|b| !b)),
            Cond::Expr(expr) => Cond::Expr(Expr::not(expr)),
        }
    }
}

/// Fails with `Unauthenticated` or `Forbidden` when the type requires
/// authentication for `operation` and the request does not satisfy it.
pub fn check_authentication(
    ctx: &TranslationContext<'_>,
    node: &NodeSchema,
    operation: AuthOperation,
) -> Result<(), TranslateError> {
    let interface_rules = node
        .interfaces
        .iter()
        .filter_map(|name| ctx.schema.interface(name))
        .filter_map(|interface| interface.authentication.as_ref());
    let rules = node.authentication.iter().chain(interface_rules);

    for rule in rules.filter(|rule| rule.operations.contains(&operation)) {
        if !ctx.auth.is_authenticated() {
            log::debug!("{} {} requires authentication", node.name, operation);
            return Err(TranslateError::Unauthenticated);
        }
        if let Some(claims) = &rule.jwt {
            if jwt::evaluate(ctx.schema, ctx.auth, claims)? != Some(true) {
                return Err(TranslateError::Forbidden);
            }
        }
    }
    Ok(())
}

/// Filter rules applying to `operation`, as a predicate over `variable`.
/// Returns an empty filter when no rule applies.
pub fn filter_predicate<'a>(
    ctx: &mut TranslationContext<'a>,
    target: &AuthTarget<'a>,
    variable: &Variable,
    operation: AuthOperation,
) -> Result<CompiledFilter, TranslateError> {
    let mut preludes = Vec::new();
    let mut origins = Vec::new();
    for rules in origins_of(ctx, target) {
        let applicable: Vec<&'a FilterRule> = rules
            .into_iter()
            .flat_map(|r| r.filter.iter())
            .filter(|rule| rule.operations.contains(&operation))
            .collect();
        if applicable.is_empty() {
            continue;
        }
        let mut alternatives = Vec::with_capacity(applicable.len());
        for rule in applicable {
            let cond = if rule.require_authentication && !ctx.auth.is_authenticated() {
                Cond::Const(Some(false))
            } else {
                compile_rule(ctx, target.node, variable, &rule.predicate, &mut preludes)?
            };
            alternatives.push(cond);
        }
        origins.push(Cond::or(alternatives));
    }

    let predicate = match Cond::and(origins) {
        Cond::Const(Some(true)) => None,
        // Rows a NULL rule would see are excluded like rows of a false one.
        Cond::Const(_) => Some(Expr::bool(false)),
        Cond::Expr(expr) => Some(expr),
    };
    if predicate.is_some() {
        log::debug!("{} {}: applying filter rules", target.node.name, operation);
    }
    Ok(CompiledFilter {
        predicate,
        preludes,
    })
}

/// `validate` rules applying to `operation` at `timing`, as
/// `apoc.util.validatePredicate(NOT (coalesce(<rules>, false)), "Forbidden", [0])`.
///
/// Rules that fold to false, or to NULL through an absent claim, fail here with
/// [`TranslateError::Forbidden`]; rules that fold to true are dropped.
pub fn validate_guard<'a>(
    ctx: &mut TranslationContext<'a>,
    target: &AuthTarget<'a>,
    variable: &Variable,
    operation: AuthOperation,
    timing: Timing,
) -> Result<CompiledFilter, TranslateError> {
    let mut preludes = Vec::new();
    let mut conditions = Vec::new();
    for rules in origins_of(ctx, target) {
        for rule in rules
            .into_iter()
            .flat_map(|r| r.validate.iter())
            .filter(|rule| rule.applies(operation, timing))
        {
            let cond = if rule.require_authentication && !ctx.auth.is_authenticated() {
                Cond::Const(Some(false))
            } else {
                compile_rule(ctx, target.node, variable, &rule.predicate, &mut preludes)?
            };
            conditions.push(cond);
        }
    }

    match Cond::and(conditions) {
        Cond::Const(Some(true)) => Ok(CompiledFilter::default()),
        Cond::Const(_) => {
            log::debug!(
                "{} {} {:?}: validate rule folded to false",
                target.node.name,
                operation,
                timing
            );
            Err(TranslateError::Forbidden)
        }
        Cond::Expr(expr) => Ok(CompiledFilter {
            predicate: Some(Expr::validation_guard(expr, FORBIDDEN)),
            preludes,
        }),
    }
}

/// Filter rules and `BEFORE` validate rules for a read-like access, in the
/// order they are applied to matched rows.
pub fn read_access<'a>(
    ctx: &mut TranslationContext<'a>,
    target: &AuthTarget<'a>,
    variable: &Variable,
    operation: AuthOperation,
) -> Result<CompiledFilter, TranslateError> {
    let filter = filter_predicate(ctx, target, variable, operation)?;
    let validate = validate_guard(ctx, target, variable, operation, Timing::Before)?;
    Ok(filter.and(validate))
}

/// `WITH * WHERE <guard>` clauses for `validate` rules, empty when none apply.
pub fn validate_clauses<'a>(
    ctx: &mut TranslationContext<'a>,
    target: &AuthTarget<'a>,
    variable: &Variable,
    operation: AuthOperation,
    timing: Timing,
) -> Result<Vec<Clause>, TranslateError> {
    let guard = validate_guard(ctx, target, variable, operation, timing)?;
    if guard.is_empty() {
        return Ok(Vec::new());
    }
    let mut clauses = guard.preludes;
    clauses.push(Clause::with_star(guard.predicate));
    Ok(clauses)
}

/// Rule groups in origin order: type, interfaces (one group), fields.
fn origins_of<'a>(ctx: &TranslationContext<'a>, target: &AuthTarget<'a>) -> Vec<Vec<&'a AuthorizationRules>> {
    let mut origins = vec![vec![&target.node.authorization]];
    let interfaces: Vec<&'a AuthorizationRules> = target
        .node
        .interfaces
        .iter()
        .filter_map(|name| ctx.schema.interface(name))
        .map(|interface| &interface.authorization)
        .collect();
    if !interfaces.is_empty() {
        origins.push(interfaces);
    }
    origins.extend(target.fields.iter().map(|rules| vec![*rules]));
    origins
}

/// Compile one rule. A rule that reads a claim the request does not carry is
/// false as a whole, whatever its shape, so that no negation or quantifier can
/// turn the missing value into a pass.
fn compile_rule<'a>(
    ctx: &mut TranslationContext<'a>,
    node: &'a NodeSchema,
    variable: &Variable,
    predicate: &AuthPredicate,
    preludes: &mut Vec<Clause>,
) -> Result<Cond, TranslateError> {
    let mut rule_preludes = Vec::new();
    let mut missing_claim = false;
    let cond = compile(ctx, node, variable, predicate, &mut rule_preludes, &mut missing_claim)?;
    if missing_claim {
        log::debug!("{}: rule reads an absent claim", node.name);
        return Ok(Cond::Const(Some(false)));
    }
    preludes.extend(rule_preludes);
    Ok(cond)
}

fn compile<'a>(
    ctx: &mut TranslationContext<'a>,
    node: &'a NodeSchema,
    variable: &Variable,
    predicate: &AuthPredicate,
    preludes: &mut Vec<Clause>,
    missing_claim: &mut bool,
) -> Result<Cond, TranslateError> {
    let cond = match predicate {
        AuthPredicate::All(parts) => {
            let mut compiled = Vec::with_capacity(parts.len());
            for part in parts {
                compiled.push(compile(ctx, node, variable, part, preludes, missing_claim)?);
            }
            Cond::and(compiled)
        }
        AuthPredicate::Any(parts) => {
            let mut compiled = Vec::with_capacity(parts.len());
            for part in parts {
                compiled.push(compile(ctx, node, variable, part, preludes, missing_claim)?);
            }
            Cond::or(compiled)
        }
        AuthPredicate::Not(inner) => compile(ctx, node, variable, inner, preludes, missing_claim)?.not(),
        AuthPredicate::Jwt(claims) => {
            let value = jwt::evaluate(ctx.schema, ctx.auth, claims)?;
            // NULL only comes from an absent claim
            *missing_claim |= value.is_none();
            Cond::Const(value)
        }
        AuthPredicate::Node(filter) => {
            let mut compiler = FilterCompiler::new(ctx, ValueMode::Claims);
            let compiled = compiler.subject_where(Subject::node(node), variable, filter)?;
            if compiler.missing_claim() {
                *missing_claim = true;
                return Ok(Cond::Const(None));
            }
            preludes.extend(compiled.preludes);
            match compiled.predicate {
                None => Cond::Const(Some(true)),
                Some(expr) if expr.is_constant_true() => Cond::Const(Some(true)),
                Some(expr) => Cond::Expr(expr),
            }
        }
    };
    Ok(cond)
}
