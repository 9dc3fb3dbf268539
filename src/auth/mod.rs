//! Request authentication state and the authorization rule compiler.

pub mod compile;
pub mod context;
pub mod jwt;

pub use compile::{
    check_authentication, filter_predicate, read_access, validate_clauses, validate_guard,
    AuthTarget, FORBIDDEN,
};
pub use context::AuthContext;
