//! Sort, limit and cursor handling for list and connection reads.

pub mod connection;
pub mod cursor;
pub mod options;

pub use connection::{relationship_connection, root_connection};
pub use options::{ReadOptions, SortField};
