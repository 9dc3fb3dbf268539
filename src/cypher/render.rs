//! Single rendering pass from the statement IR to Cypher text.
//!
//! Rendering walks the tree in textual order. Along the way it
//! - names generated variables in first-appearance order (`this0`, `var1`, ...)
//! - hoists every request value into a generated parameter (`$param0`, ...)
//! - escapes labels, relationship types and property keys that are not plain identifiers
//!
//! The walk is deterministic, so rendering the same IR twice yields identical
//! text and parameters.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use super::clause::{Clause, OrderItem, Projection, ProjectionItem, SetItem};
use super::expr::{Expr, Literal, ProjectionEntry};
use super::pattern::{NodePattern, Pattern, RelationshipPattern};
use super::variable::{Variable, VariableKind};
use crate::graph_catalog::Direction;

lazy_static! {
    static ref PLAIN_IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

const INDENT: &str = "    ";

/// Rendered statement handed to an external executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CypherStatement {
    pub cypher: String,
    pub params: Map<String, Value>,
}

impl CypherStatement {
    /// Hex SHA-256 over the statement text and parameter names. Statements that
    /// differ only in parameter values share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.cypher.as_bytes());
        for name in self.params.keys() {
            hasher.update([0u8]);
            hasher.update(name.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// A complete statement in IR form plus the parameters bound by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub clauses: Vec<Clause>,
    named_params: Map<String, Value>,
}

impl Statement {
    pub fn new(clauses: Vec<Clause>) -> Self {
        Self {
            clauses,
            named_params: Map::new(),
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.named_params = params;
        self
    }

    pub fn render(&self) -> CypherStatement {
        let mut env = RenderEnv::new(self.named_params.clone());
        let cypher = self.clauses.as_slice().to_cypher(&mut env);
        CypherStatement {
            cypher,
            params: env.params,
        }
    }
}

/// Mutable state of one rendering pass.
#[derive(Debug)]
pub struct RenderEnv {
    params: Map<String, Value>,
    next_param: usize,
    names: HashMap<u32, String>,
    next_name: usize,
}

impl RenderEnv {
    pub fn new(named_params: Map<String, Value>) -> Self {
        Self {
            params: named_params,
            next_param: 0,
            names: HashMap::new(),
            next_name: 0,
        }
    }

    fn variable(&mut self, variable: &Variable) -> String {
        match variable {
            Variable::Named(name) => escape(name),
            Variable::Generated { id, kind } => {
                if let Some(name) = self.names.get(id) {
                    return name.clone();
                }
                let prefix = match kind {
                    VariableKind::Entity => "this",
                    VariableKind::Value => "var",
                };
                let name = format!("{}{}", prefix, self.next_name);
                self.next_name += 1;
                self.names.insert(*id, name.clone());
                name
            }
        }
    }

    fn hoist(&mut self, value: &Value) -> String {
        let mut name = format!("param{}", self.next_param);
        self.next_param += 1;
        while self.params.contains_key(&name) {
            name = format!("param{}", self.next_param);
            self.next_param += 1;
        }
        self.params.insert(name.clone(), value.clone());
        format!("${}", name)
    }
}

/// Render an IR fragment to Cypher text.
pub trait ToCypher {
    fn to_cypher(&self, env: &mut RenderEnv) -> String;
}

/// Backtick-quote anything that is not a plain identifier.
pub fn escape(identifier: &str) -> String {
    if PLAIN_IDENTIFIER.is_match(identifier) {
        identifier.to_string()
    } else {
        format!("`{}`", identifier.replace('`', "``"))
    }
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", INDENT, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn block(keyword: &str, body: &str) -> String {
    if body.contains('\n') {
        format!("{} {{\n{}\n}}", keyword, indent(body))
    } else {
        format!("{} {{ {} }}", keyword, body)
    }
}

/// Render a boolean expression in clause position: a top-level conjunction is
/// written without surrounding parentheses.
fn condition(expr: &Expr, env: &mut RenderEnv) -> String {
    match expr {
        Expr::And(parts) => parts
            .iter()
            .map(|p| p.to_cypher(env))
            .collect::<Vec<_>>()
            .join(" AND "),
        other => other.to_cypher(env),
    }
}

fn join(items: &[Expr], separator: &str, env: &mut RenderEnv) -> String {
    items
        .iter()
        .map(|item| item.to_cypher(env))
        .collect::<Vec<_>>()
        .join(separator)
}

impl ToCypher for Variable {
    fn to_cypher(&self, env: &mut RenderEnv) -> String {
        env.variable(self)
    }
}

impl ToCypher for Literal {
    fn to_cypher(&self, _env: &mut RenderEnv) -> String {
        match self {
            Literal::Null => "null".to_string(),
            Literal::Boolean(b) => b.to_string(),
            Literal::Integer(i) => i.to_string(),
            Literal::String(s) => quote(s),
        }
    }
}

impl ToCypher for Expr {
    fn to_cypher(&self, env: &mut RenderEnv) -> String {
        match self {
            Expr::Literal(literal) => literal.to_cypher(env),
            Expr::Value(value) => env.hoist(value),
            Expr::Param(name) => format!("${}", escape(name)),
            Expr::Variable(variable) => env.variable(variable),
            Expr::Property { base, key } => {
                let base_text = base.to_cypher(env);
                match base.as_ref() {
                    Expr::Variable(_)
                    | Expr::Param(_)
                    | Expr::Property { .. }
                    | Expr::Index { .. }
                    | Expr::Function { .. } => format!("{}.{}", base_text, escape(key)),
                    _ => format!("({}).{}", base_text, escape(key)),
                }
            }
            Expr::Index { list, index } => {
                format!("{}[{}]", list.to_cypher(env), index.to_cypher(env))
            }
            Expr::Slice { list, from, to } => {
                let list = list.to_cypher(env);
                let from = from.as_ref().map(|f| f.to_cypher(env)).unwrap_or_default();
                let to = to.as_ref().map(|t| t.to_cypher(env)).unwrap_or_default();
                format!("{}[{}..{}]", list, from, to)
            }
            Expr::Binary { op, left, right } => format!(
                "{} {} {}",
                left.to_cypher(env),
                op.symbol(),
                right.to_cypher(env)
            ),
            Expr::And(parts) => format!("({})", join(parts, " AND ", env)),
            Expr::Or(parts) => format!("({})", join(parts, " OR ", env)),
            Expr::Not(inner) => format!("NOT ({})", condition(inner, env)),
            Expr::IsNull(inner) => format!("{} IS NULL", inner.to_cypher(env)),
            Expr::IsNotNull(inner) => format!("{} IS NOT NULL", inner.to_cypher(env)),
            Expr::HasLabel { variable, label } => {
                format!("{}:{}", env.variable(variable), escape(label))
            }
            Expr::Function { name, args } => format!("{}({})", name, join(args, ", ", env)),
            Expr::CountStar => "*".to_string(),
            Expr::List(items) => format!("[{}]", join(items, ", ", env)),
            Expr::Map(entries) => {
                if entries.is_empty() {
                    return "{}".to_string();
                }
                let body = entries
                    .iter()
                    .map(|(key, value)| format!("{}: {}", escape(key), value.to_cypher(env)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{ {} }}", body)
            }
            Expr::MapProjection { variable, entries } => {
                if entries.is_empty() {
                    return "{}".to_string();
                }
                let name = env.variable(variable);
                let body = entries
                    .iter()
                    .map(|entry| match entry {
                        ProjectionEntry::Property(key) => format!(".{}", escape(key)),
                        ProjectionEntry::Field(key, value) => {
                            format!("{}: {}", escape(key), value.to_cypher(env))
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} {{ {} }}", name, body)
            }
            Expr::Exists(body) => block("EXISTS", &body.as_slice().to_cypher(env)),
            Expr::CountSubquery(body) => block("COUNT", &body.as_slice().to_cypher(env)),
            Expr::ListComprehension {
                variable,
                list,
                predicate,
                projection,
            } => {
                let mut text = format!("[{} IN {}", env.variable(variable), list.to_cypher(env));
                if let Some(predicate) = predicate {
                    text.push_str(&format!(" WHERE {}", condition(predicate, env)));
                }
                if let Some(projection) = projection {
                    text.push_str(&format!(" | {}", projection.to_cypher(env)));
                }
                text.push(']');
                text
            }
            Expr::Case { branches, default } => {
                let mut text = "CASE".to_string();
                for (when, then) in branches {
                    text.push_str(&format!(
                        " WHEN {} THEN {}",
                        condition(when, env),
                        then.to_cypher(env)
                    ));
                }
                if let Some(default) = default {
                    text.push_str(&format!(" ELSE {}", default.to_cypher(env)));
                }
                text.push_str(" END");
                text
            }
        }
    }
}

impl ToCypher for NodePattern {
    fn to_cypher(&self, env: &mut RenderEnv) -> String {
        let mut text = String::from("(");
        if let Some(variable) = &self.variable {
            text.push_str(&env.variable(variable));
        }
        for label in &self.labels {
            text.push(':');
            text.push_str(&escape(label));
        }
        if !self.properties.is_empty() {
            let properties = self
                .properties
                .iter()
                .map(|(key, value)| format!("{}: {}", escape(key), value.to_cypher(env)))
                .collect::<Vec<_>>()
                .join(", ");
            text.push_str(&format!(" {{ {} }}", properties));
        }
        text.push(')');
        text
    }
}

impl ToCypher for RelationshipPattern {
    fn to_cypher(&self, env: &mut RenderEnv) -> String {
        let variable = self
            .variable
            .as_ref()
            .map(|v| env.variable(v))
            .unwrap_or_default();
        let body = format!("[{}:{}]", variable, escape(&self.edge_type));
        match self.direction {
            Direction::Out => format!("-{}->", body),
            Direction::In => format!("<-{}-", body),
            Direction::Undirected => format!("-{}-", body),
        }
    }
}

impl ToCypher for Pattern {
    fn to_cypher(&self, env: &mut RenderEnv) -> String {
        let mut text = self.start.to_cypher(env);
        for (relationship, node) in &self.hops {
            text.push_str(&relationship.to_cypher(env));
            text.push_str(&node.to_cypher(env));
        }
        text
    }
}

impl ToCypher for ProjectionItem {
    fn to_cypher(&self, env: &mut RenderEnv) -> String {
        let expr = self.expr.to_cypher(env);
        match &self.alias {
            Some(alias) => format!("{} AS {}", expr, env.variable(alias)),
            None => expr,
        }
    }
}

impl ToCypher for OrderItem {
    fn to_cypher(&self, env: &mut RenderEnv) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("{} {}", self.expr.to_cypher(env), direction)
    }
}

impl ToCypher for SetItem {
    fn to_cypher(&self, env: &mut RenderEnv) -> String {
        format!("{} = {}", self.target.to_cypher(env), self.value.to_cypher(env))
    }
}

fn projection(keyword: &str, projection: &Projection, env: &mut RenderEnv) -> String {
    let mut text = keyword.to_string();
    let mut items = Vec::new();
    if projection.star {
        items.push("*".to_string());
    }
    for item in &projection.items {
        items.push(item.to_cypher(env));
    }
    text.push(' ');
    text.push_str(&items.join(", "));
    if keyword == "WITH" {
        if let Some(predicate) = &projection.predicate {
            text.push_str(&format!("\nWHERE {}", condition(predicate, env)));
        }
    }
    if !projection.order_by.is_empty() {
        let order = projection
            .order_by
            .iter()
            .map(|o| o.to_cypher(env))
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!("\nORDER BY {}", order));
    }
    if let Some(skip) = &projection.skip {
        text.push_str(&format!("\nSKIP {}", skip.to_cypher(env)));
    }
    if let Some(limit) = &projection.limit {
        text.push_str(&format!("\nLIMIT {}", limit.to_cypher(env)));
    }
    text
}

fn set_items(items: &[SetItem], env: &mut RenderEnv) -> String {
    items
        .iter()
        .map(|item| item.to_cypher(env))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ToCypher for Clause {
    fn to_cypher(&self, env: &mut RenderEnv) -> String {
        match self {
            Clause::Match {
                optional,
                pattern,
                predicate,
            } => {
                let keyword = if *optional { "OPTIONAL MATCH" } else { "MATCH" };
                let mut text = format!("{} {}", keyword, pattern.to_cypher(env));
                if let Some(predicate) = predicate {
                    text.push_str(&format!("\nWHERE {}", condition(predicate, env)));
                }
                text
            }
            Clause::With(body) => projection("WITH", body, env),
            Clause::Return(body) => projection("RETURN", body, env),
            Clause::Unwind { list, alias } => {
                format!("UNWIND {} AS {}", list.to_cypher(env), env.variable(alias))
            }
            Clause::Call { imports, body } => {
                let mut lines = Vec::new();
                if !imports.is_empty() {
                    let names = imports
                        .iter()
                        .map(|v| env.variable(v))
                        .collect::<Vec<_>>()
                        .join(", ");
                    lines.push(format!("WITH {}", names));
                }
                lines.push(body.as_slice().to_cypher(env));
                format!("CALL {{\n{}\n}}", indent(&lines.join("\n")))
            }
            Clause::Union(branches) => branches
                .iter()
                .map(|branch| branch.as_slice().to_cypher(env))
                .collect::<Vec<_>>()
                .join("\nUNION\n"),
            Clause::Create(pattern) => format!("CREATE {}", pattern.to_cypher(env)),
            Clause::Merge { pattern, on_create } => {
                let mut text = format!("MERGE {}", pattern.to_cypher(env));
                if !on_create.is_empty() {
                    text.push_str(&format!("\nON CREATE SET {}", set_items(on_create, env)));
                }
                text
            }
            Clause::Set(items) => format!("SET {}", set_items(items, env)),
            Clause::Delete { detach, targets } => {
                let keyword = if *detach { "DETACH DELETE" } else { "DELETE" };
                format!("{} {}", keyword, join(targets, ", ", env))
            }
            Clause::Raw(text) => text.trim().to_string(),
        }
    }
}

impl ToCypher for [Clause] {
    fn to_cypher(&self, env: &mut RenderEnv) -> String {
        self.iter()
            .map(|clause| clause.to_cypher(env))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::scope::VariableScope;
    use serde_json::json;

    fn movie_match(scope: &mut VariableScope) -> (Statement, Variable) {
        let movie = scope.fresh_entity("this");
        let actor = scope.fresh_entity("this.actors");
        let edge = scope.fresh_entity("this.actors.edge");
        let pattern = Pattern::hop(
            NodePattern::new(&movie, &["Movie".to_string()]),
            RelationshipPattern::new(Some(&edge), "ACTED_IN", Direction::In),
            NodePattern::new(&actor, &["Actor".to_string()]),
        );
        let predicate = Expr::and_all(vec![
            Expr::eq(Expr::prop(&movie, "title"), Expr::value("M")),
            Expr::Or(vec![
                Expr::eq(Expr::prop(&actor, "name"), Expr::value("A")),
                Expr::IsNull(Box::new(Expr::prop(&actor, "born"))),
            ]),
        ]);
        let statement = Statement::new(vec![
            Clause::matching(pattern, predicate),
            Clause::Return(Projection::variables(&[&actor])),
        ]);
        (statement, actor)
    }

    #[test]
    fn test_render_names_variables_in_order_of_appearance() {
        let mut scope = VariableScope::new();
        let (statement, _) = movie_match(&mut scope);
        let rendered = statement.render();
        assert_eq!(
            rendered.cypher,
            "MATCH (this0:Movie)<-[this1:ACTED_IN]-(this2:Actor)\n\
             WHERE this0.title = $param0 AND (this2.name = $param1 OR this2.born IS NULL)\n\
             RETURN this2"
        );
        assert_eq!(rendered.params.get("param0"), Some(&json!("M")));
        assert_eq!(rendered.params.get("param1"), Some(&json!("A")));
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut scope = VariableScope::new();
        let (statement, _) = movie_match(&mut scope);
        let first = statement.render();
        let second = statement.render();
        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_call_body_is_indented() {
        let mut scope = VariableScope::new();
        let this = Variable::this();
        let count = scope.fresh_value("count");
        let statement = Statement::new(vec![Clause::call(
            &[&this],
            vec![
                Clause::matching(Pattern::node(NodePattern::bound(&this)), None),
                Clause::return_count(&count),
            ],
        )]);
        assert_eq!(
            statement.render().cypher,
            "CALL {\n    WITH this\n    MATCH (this)\n    RETURN count(*) AS var0\n}"
        );
    }

    #[test]
    fn test_escape_identifiers() {
        assert_eq!(escape("title"), "title");
        assert_eq!(escape("my label"), "`my label`");
        assert_eq!(escape("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_named_params_are_not_overwritten() {
        let mut named = Map::new();
        named.insert("param0".to_string(), json!("taken"));
        let statement = Statement::new(vec![Clause::Return(Projection::items(vec![
            ProjectionItem {
                expr: Expr::value(1),
                alias: None,
            },
        ]))])
        .with_params(named);
        let rendered = statement.render();
        assert_eq!(rendered.cypher, "RETURN $param1");
        assert_eq!(rendered.params.get("param0"), Some(&json!("taken")));
    }

    #[test]
    fn test_exists_subquery_inline() {
        let mut scope = VariableScope::new();
        let this = Variable::this();
        let actor = scope.fresh_entity("actor");
        let exists = Expr::Exists(vec![Clause::matching(
            Pattern::hop(
                NodePattern::bound(&this),
                RelationshipPattern::new(None, "ACTED_IN", Direction::In),
                NodePattern::new(&actor, &["Actor".to_string()]),
            ),
            Some(Expr::eq(Expr::prop(&actor, "name"), Expr::value("A"))),
        )]);
        let statement = Statement::new(vec![Clause::with_star(Some(exists))]);
        assert_eq!(
            statement.render().cypher,
            "WITH *\nWHERE EXISTS {\n    MATCH (this)<-[:ACTED_IN]-(this0:Actor)\n    WHERE this0.name = $param0\n}"
        );
    }
}
