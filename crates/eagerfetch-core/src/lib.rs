//! eagerfetch - eager-loading query translation and result materialization.
//!
//! This crate translates queries that request a root entity plus related
//! collections into SQL statements (joined or split strategy), and folds the
//! resulting flat rows into a deterministic object graph: each distinct
//! parent identity appears exactly once, each distinct child identity
//! exactly once per parent, and ordering is normalized so that pagination
//! and grouping do not depend on engine-specific row arrival order.
//!
//! The SQL execution itself is a collaborator behind the [`RowSource`]
//! trait; connection handling, dialect quirks, and retry policy live there.

pub mod assemble;
pub mod catalog;
pub mod error;
pub mod loader;
pub mod materialize;
pub mod order;
pub mod plan;
pub mod resolve;
pub mod row;
pub mod sql;
pub mod value;

pub use assemble::{EntityAssembler, EntityNode, ResultGraph};
pub use catalog::{Cardinality, Catalog, ColumnDef, ColumnType, EntityDef, RelationDef};
pub use error::Error;
pub use loader::IncludeLoader;
pub use materialize::{materialize, EntityData, Materialized};
pub use order::{NormalizedOrder, OrderKey, OrderingNormalizer, RowComparator};
pub use plan::{
    FilterExpr, GroupPick, IncludePlan, IncludeQuery, LoadPlan, LoadStrategy, OrderDirection,
    OrderSpec, Pagination, QueryPlanner, RelationInclude,
};
pub use resolve::KeyResolver;
pub use row::{RowCursor, RowShape, RowSource, SegmentShape, SharedShape};
pub use sql::{PreparedQuery, SelectStatement, SqlBuilder};
pub use value::{compare_values, Key, Value};
