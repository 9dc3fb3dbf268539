use super::expr::Expr;
use super::pattern::Pattern;
use super::variable::Variable;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: Expr,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionItem {
    pub expr: Expr,
    pub alias: Option<Variable>,
}

impl ProjectionItem {
    pub fn aliased(expr: Expr, alias: &Variable) -> Self {
        Self {
            expr,
            alias: Some(alias.clone()),
        }
    }

    pub fn bare(variable: &Variable) -> Self {
        Self {
            expr: Expr::var(variable),
            alias: None,
        }
    }
}

/// Body shared by `WITH` and `RETURN`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    pub star: bool,
    pub items: Vec<ProjectionItem>,
    /// `WHERE` following a `WITH`; ignored on `RETURN`
    pub predicate: Option<Expr>,
    pub order_by: Vec<OrderItem>,
    pub skip: Option<Expr>,
    pub limit: Option<Expr>,
}

impl Projection {
    pub fn star() -> Self {
        Self {
            star: true,
            ..Default::default()
        }
    }

    pub fn items(items: Vec<ProjectionItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub fn variables(variables: &[&Variable]) -> Self {
        Self::items(variables.iter().map(|v| ProjectionItem::bare(v)).collect())
    }

    pub fn filtered(mut self, predicate: Option<Expr>) -> Self {
        self.predicate = predicate;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetItem {
    pub target: Expr,
    pub value: Expr,
}

impl SetItem {
    pub fn property(variable: &Variable, key: &str, value: Expr) -> Self {
        Self {
            target: Expr::prop(variable, key),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Match {
        optional: bool,
        pattern: Pattern,
        predicate: Option<Expr>,
    },
    With(Projection),
    Unwind {
        list: Expr,
        alias: Variable,
    },
    /// `CALL { WITH <imports> <body> }`
    Call {
        imports: Vec<Variable>,
        body: Vec<Clause>,
    },
    /// Branches joined by `UNION`; only valid as the body of a `CALL`
    Union(Vec<Vec<Clause>>),
    Create(Pattern),
    Merge {
        pattern: Pattern,
        on_create: Vec<SetItem>,
    },
    Set(Vec<SetItem>),
    Delete {
        detach: bool,
        targets: Vec<Expr>,
    },
    Return(Projection),
    /// Statement text supplied by the schema (computed attributes)
    Raw(String),
}

impl Clause {
    pub fn matching(pattern: Pattern, predicate: Option<Expr>) -> Self {
        Clause::Match {
            optional: false,
            pattern,
            predicate,
        }
    }

    pub fn optional_matching(pattern: Pattern, predicate: Option<Expr>) -> Self {
        Clause::Match {
            optional: true,
            pattern,
            predicate,
        }
    }

    /// `WITH *` optionally followed by `WHERE`.
    pub fn with_star(predicate: Option<Expr>) -> Self {
        Clause::With(Projection::star().filtered(predicate))
    }

    pub fn call(imports: &[&Variable], body: Vec<Clause>) -> Self {
        Clause::Call {
            imports: imports.iter().map(|v| (*v).clone()).collect(),
            body,
        }
    }

    /// `RETURN count(*) AS <alias>`, the closing line of write sub-queries.
    pub fn return_count(alias: &Variable) -> Self {
        Clause::Return(Projection::items(vec![ProjectionItem::aliased(
            Expr::call("count", vec![Expr::CountStar]),
            alias,
        )]))
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Clause::Create(_)
                | Clause::Merge { .. }
                | Clause::Set(_)
                | Clause::Delete { .. }
        )
    }
}
