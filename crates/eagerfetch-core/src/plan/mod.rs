//! Query IR and planning.

mod planner;
mod query;

pub use planner::{IncludePlan, LoadPlan, QueryPlanner};
pub use query::{
    FilterExpr, GroupPick, IncludeQuery, LoadStrategy, OrderDirection, OrderSpec, Pagination,
    RelationInclude,
};
