use std::fmt;

/// What a generated variable is bound to. Only affects the rendered prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// Node or relationship bound by a pattern (`this3`)
    Entity,
    /// Any other value: aggregates, lists, projections (`var4`)
    Value,
}

/// A variable in the statement IR.
///
/// Generated variables carry an allocation id that is unique for the whole
/// translation; their text (`this0`, `var1`, ...) is assigned by the renderer in
/// first-appearance order, so nested sub-queries built independently can never
/// collide on a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Variable {
    /// Fixed name chosen by the translator (`this`)
    Named(String),
    Generated { id: u32, kind: VariableKind },
}

impl Variable {
    pub fn named(name: impl Into<String>) -> Self {
        Variable::Named(name.into())
    }

    pub fn this() -> Self {
        Variable::Named("this".to_string())
    }
}

impl fmt::Display for Variable {
    /// Debug-oriented text; the statement text comes from the renderer.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Named(name) => write!(f, "{}", name),
            Variable::Generated { id, kind } => match kind {
                VariableKind::Entity => write!(f, "<entity#{}>", id),
                VariableKind::Value => write!(f, "<value#{}>", id),
            },
        }
    }
}
