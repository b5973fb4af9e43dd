//! SQL statement generation.

mod builder;
mod select;

pub use builder::{PreparedQuery, SqlBuilder};
pub use select::{JoinKey, LeftJoin, OrderTerm, SelectColumn, SelectStatement};
