use serde_json::Value;

use super::clause::Clause;
use super::variable::Variable;

/// Constants written by the translator itself. Values that come from a request
/// are never literals; they travel as [`Expr::Value`] and become parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    In,
    Contains,
    StartsWith,
    EndsWith,
    RegexMatch,
    Addition,
    Subtraction,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::LessThan => "<",
            Operator::LessThanEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanEqual => ">=",
            Operator::In => "IN",
            Operator::Contains => "CONTAINS",
            Operator::StartsWith => "STARTS WITH",
            Operator::EndsWith => "ENDS WITH",
            Operator::RegexMatch => "=~",
            Operator::Addition => "+",
            Operator::Subtraction => "-",
        }
    }
}

/// One entry of a map projection `n { .name, actors: var3 }`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionEntry {
    Property(String),
    Field(String, Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// Request value, hoisted into a generated parameter at render time
    Value(Value),
    /// Parameter bound by name for the whole statement (`$jwt`)
    Param(String),
    Variable(Variable),
    Property {
        base: Box<Expr>,
        key: String,
    },
    Index {
        list: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        list: Box<Expr>,
        from: Option<Box<Expr>>,
        to: Option<Box<Expr>>,
    },
    Binary {
        op: Operator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    IsNull(Box<Expr>),
    IsNotNull(Box<Expr>),
    HasLabel {
        variable: Variable,
        label: String,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
    CountStar,
    List(Vec<Expr>),
    Map(Vec<(String, Expr)>),
    MapProjection {
        variable: Variable,
        entries: Vec<ProjectionEntry>,
    },
    Exists(Vec<Clause>),
    CountSubquery(Vec<Clause>),
    ListComprehension {
        variable: Variable,
        list: Box<Expr>,
        predicate: Option<Box<Expr>>,
        projection: Option<Box<Expr>>,
    },
    Case {
        branches: Vec<(Expr, Expr)>,
        default: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn var(variable: &Variable) -> Expr {
        Expr::Variable(variable.clone())
    }

    pub fn prop(variable: &Variable, key: impl Into<String>) -> Expr {
        Expr::Property {
            base: Box::new(Expr::var(variable)),
            key: key.into(),
        }
    }

    pub fn property_of(base: Expr, key: impl Into<String>) -> Expr {
        Expr::Property {
            base: Box::new(base),
            key: key.into(),
        }
    }

    pub fn value(value: impl Into<Value>) -> Expr {
        Expr::Value(value.into())
    }

    pub fn string(value: impl Into<String>) -> Expr {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn int(value: i64) -> Expr {
        Expr::Literal(Literal::Integer(value))
    }

    pub fn bool(value: bool) -> Expr {
        Expr::Literal(Literal::Boolean(value))
    }

    pub fn null() -> Expr {
        Expr::Literal(Literal::Null)
    }

    pub fn binary(op: Operator, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: Expr, right: Expr) -> Expr {
        Expr::binary(Operator::Equal, left, right)
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Function {
            name: name.into(),
            args,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Expr) -> Expr {
        match inner {
            Expr::Literal(Literal::Boolean(b)) => Expr::bool(!b),
            Expr::Not(inner) => *inner,
            other => Expr::Not(Box::new(other)),
        }
    }

    /// Conjunction of the parts, `None` when there are none. Nested
    /// conjunctions are flattened.
    pub fn and_all(parts: impl IntoIterator<Item = Expr>) -> Option<Expr> {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Expr::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Expr::And(flat)),
        }
    }

    /// Disjunction of the parts, `None` when there are none.
    pub fn or_all(parts: impl IntoIterator<Item = Expr>) -> Option<Expr> {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Expr::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Expr::Or(flat)),
        }
    }

    pub fn index(list: Expr, index: Expr) -> Expr {
        Expr::Index {
            list: Box::new(list),
            index: Box::new(index),
        }
    }

    pub fn slice(list: Expr, from: Option<Expr>, to: Option<Expr>) -> Expr {
        Expr::Slice {
            list: Box::new(list),
            from: from.map(Box::new),
            to: to.map(Box::new),
        }
    }

    pub fn comprehension(
        variable: &Variable,
        list: Expr,
        predicate: Option<Expr>,
        projection: Option<Expr>,
    ) -> Expr {
        Expr::ListComprehension {
            variable: variable.clone(),
            list: Box::new(list),
            predicate: predicate.map(Box::new),
            projection: projection.map(Box::new),
        }
    }

    /// `apoc.util.validatePredicate(NOT (coalesce(<condition>, false)), "<message>", [0])`
    ///
    /// Raises `message` inside the database when `condition` is false or null.
    pub fn validation_guard(condition: Expr, message: &str) -> Expr {
        let coalesced = Expr::call("coalesce", vec![condition, Expr::bool(false)]);
        Expr::call(
            "apoc.util.validatePredicate",
            vec![
                Expr::Not(Box::new(coalesced)),
                Expr::string(message),
                Expr::List(vec![Expr::int(0)]),
            ],
        )
    }

    pub fn is_constant_true(&self) -> bool {
        matches!(self, Expr::Literal(Literal::Boolean(true)))
    }
}
