//! The eager-loading entry point.

use tracing::debug;

use crate::assemble::{EntityAssembler, EntityNode, ResultGraph};
use crate::catalog::Catalog;
use crate::error::Error;
use crate::materialize::materialize;
use crate::plan::{IncludeQuery, Pagination, QueryPlanner};
use crate::row::RowSource;

/// Loads eager-loading queries against a row source.
///
/// One loader execution is a single cooperative pull over the source; no
/// state is shared across executions. Dropping the loader (or the cursor
/// it is draining) mid-query abandons materialization without emitting a
/// partial graph.
pub struct IncludeLoader<'a, S: RowSource> {
    catalog: &'a Catalog,
    source: &'a S,
}

impl<'a, S: RowSource> IncludeLoader<'a, S> {
    /// Create a loader over a catalog and row source.
    pub fn new(catalog: &'a Catalog, source: &'a S) -> Self {
        Self { catalog, source }
    }

    /// Execute a query and assemble its result graph.
    pub fn load(&self, query: &IncludeQuery) -> Result<ResultGraph, Error> {
        let plan = QueryPlanner::new(self.catalog).plan(query)?;
        let materialized = materialize(&plan, self.source)?;
        let graph = EntityAssembler::new(&plan).assemble(materialized);
        debug!(
            entity = %plan.root.name,
            roots = graph.len(),
            entries = graph.entry_count(),
            "assembled result graph"
        );
        Ok(graph)
    }

    /// Execute a query and return its first root entity, or
    /// [`Error::EmptyResult`] if the (deterministically ordered) result is
    /// empty.
    pub fn load_first(&self, query: &IncludeQuery) -> Result<EntityNode, Error> {
        self.load_first_or_default(query)?.ok_or(Error::EmptyResult)
    }

    /// Execute a query and return its first root entity, if any.
    pub fn load_first_or_default(
        &self,
        query: &IncludeQuery,
    ) -> Result<Option<EntityNode>, Error> {
        let mut query = query.clone();
        query.pagination = Some(match query.pagination.take() {
            Some(p) => Pagination {
                offset: p.offset,
                limit: Some(p.limit.map_or(1, |l| l.min(1))),
            },
            None => Pagination::take(1),
        });
        let graph = self.load(&query)?;
        Ok(graph.roots.into_iter().next())
    }
}
