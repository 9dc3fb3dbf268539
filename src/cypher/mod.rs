//! Statement IR for the emitted Cypher.
//!
//! Translation builds a tree of [`Clause`]s and [`Expr`]s; [`Statement::render`]
//! turns it into text plus parameters in one pass. No part of the translator
//! concatenates Cypher text directly.

pub mod clause;
pub mod expr;
pub mod pattern;
pub mod render;
pub mod scope;
pub mod variable;

pub use clause::{Clause, OrderItem, Projection, ProjectionItem, SetItem};
pub use expr::{Expr, Literal, Operator, ProjectionEntry};
pub use pattern::{NodePattern, Pattern, RelationshipPattern};
pub use render::{CypherStatement, RenderEnv, Statement, ToCypher};
pub use scope::VariableScope;
pub use variable::{Variable, VariableKind};
