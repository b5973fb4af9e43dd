//! Planner for transforming an IncludeQuery into a load plan.
//!
//! The planner resolves entity and relation definitions from the catalog,
//! validates every referenced field and include path, and normalizes the
//! caller's ordering into a total order over result rows.

use tracing::{debug, warn};

use crate::catalog::{Catalog, EntityDef, RelationDef};
use crate::error::Error;
use crate::order::{NormalizedOrder, OrderingNormalizer};

use super::query::{
    FilterExpr, GroupPick, IncludeQuery, LoadStrategy, OrderSpec, Pagination, RelationInclude,
};

/// Plan for fetching one included relation path.
#[derive(Debug, Clone)]
pub struct IncludePlan {
    /// Original path from the query (e.g., "orders.details").
    pub path: String,
    /// Resolved relation definition.
    pub relation: RelationDef,
    /// Resolved target entity definition.
    pub target: EntityDef,
    /// Filter for the related entities.
    pub filter: Option<FilterExpr>,
    /// Caller ordering for the related entities.
    pub order_by: Vec<OrderSpec>,
    /// Pagination applied to the include's own result set.
    pub pagination: Option<Pagination>,
}

impl IncludePlan {
    /// Get the depth of this include (1 for top-level, 2 for nested, etc.)
    pub fn depth(&self) -> usize {
        self.path.matches('.').count() + 1
    }

    /// Check if this is a top-level include.
    pub fn is_top_level(&self) -> bool {
        !self.path.contains('.')
    }

    /// Get the parent path for nested includes.
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rsplit_once('.').map(|(parent, _)| parent)
    }

    /// Collection name on the parent entity (last path segment).
    pub fn collection_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

/// An executable load plan.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    /// Resolved root entity definition.
    pub root: EntityDef,
    /// Filter for the root entity.
    pub filter: Option<FilterExpr>,
    /// Caller ordering over root fields, as written.
    pub caller_order: Vec<OrderSpec>,
    /// Caller ordering extended to a total order over rows.
    pub ordering: NormalizedOrder,
    /// Pagination over the root entity sequence.
    pub pagination: Option<Pagination>,
    /// Optional group-and-pick step over the root sequence.
    pub group: Option<GroupPick>,
    /// Eager-loading strategy.
    pub strategy: LoadStrategy,
    /// Resolved include plans, parents before children.
    pub includes: Vec<IncludePlan>,
}

/// Planner that resolves queries against a catalog.
pub struct QueryPlanner<'a> {
    catalog: &'a Catalog,
}

impl<'a> QueryPlanner<'a> {
    /// Create a new planner with a catalog reference.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Plan a query.
    pub fn plan(&self, query: &IncludeQuery) -> Result<LoadPlan, Error> {
        let root = self.catalog.entity(&query.root_entity)?.clone();

        validate_fields(&root, &query.order_by, query.filter.as_ref())?;
        if let Some(group) = &query.group {
            if root.column(&group.key_field).is_none() {
                return Err(Error::InvalidPlan(format!(
                    "group field '{}' not defined on entity '{}'",
                    group.key_field, root.name
                )));
            }
            validate_fields(&root, &group.pick_order, None)?;
        }

        let includes = self.plan_includes(&root, &query.includes)?;

        let include_entities: Vec<(String, &EntityDef)> = includes
            .iter()
            .map(|i| (i.path.clone(), &i.target))
            .collect();
        let ordering =
            OrderingNormalizer::normalize(&query.order_by, &root, &include_entities);

        if !ordering.caller_was_total && (query.pagination.is_some() || query.group.is_some()) {
            warn!(
                entity = %root.name,
                "pagination or grouping over a non-total caller order; \
                 identity tie-break applied"
            );
        }
        if let Some(group) = &query.group {
            let covered = group
                .pick_order
                .iter()
                .map(|s| s.field.as_str())
                .collect::<std::collections::HashSet<_>>();
            if !root.key.iter().all(|k| covered.contains(k.as_str())) {
                warn!(
                    entity = %root.name,
                    "group representative pick order is not total over the \
                     root identity; selection depends on the tie-break"
                );
            }
        }

        debug!(
            entity = %root.name,
            includes = includes.len(),
            strategy = ?query.strategy,
            "planned eager-loading query"
        );

        Ok(LoadPlan {
            root,
            filter: query.filter.clone(),
            caller_order: query.order_by.clone(),
            ordering,
            pagination: query.pagination.clone(),
            group: query.group.clone(),
            strategy: query.strategy,
            includes,
        })
    }

    /// Resolve relation includes, de-duplicating repeated paths.
    fn plan_includes(
        &self,
        root: &EntityDef,
        includes: &[RelationInclude],
    ) -> Result<Vec<IncludePlan>, Error> {
        let mut plans: Vec<IncludePlan> = Vec::with_capacity(includes.len());

        for include in includes {
            if plans.iter().any(|p| p.path == include.path) {
                continue;
            }

            let source_entity = if include.is_top_level() {
                root.name.clone()
            } else {
                let parent_path = include.parent_path().unwrap();
                let parent = plans
                    .iter()
                    .find(|p| p.path == parent_path)
                    .ok_or_else(|| {
                        Error::InvalidPlan(format!(
                            "include '{}' references parent path '{}' which is not included",
                            include.path, parent_path
                        ))
                    })?;
                parent.target.name.clone()
            };

            let relation = self
                .catalog
                .relation_from(&source_entity, include.relation_name())?
                .clone();
            let target = self.catalog.entity(&relation.to_entity)?.clone();

            validate_fields(&target, &include.order_by, include.filter.as_ref())?;

            plans.push(IncludePlan {
                path: include.path.clone(),
                relation,
                target,
                filter: include.filter.clone(),
                order_by: include.order_by.clone(),
                pagination: include.pagination.clone(),
            });
        }

        Ok(plans)
    }
}

fn validate_fields(
    entity: &EntityDef,
    order_by: &[OrderSpec],
    filter: Option<&FilterExpr>,
) -> Result<(), Error> {
    for spec in order_by {
        if entity.column(&spec.field).is_none() {
            return Err(Error::InvalidPlan(format!(
                "order field '{}' not defined on entity '{}'",
                spec.field, entity.name
            )));
        }
    }
    if let Some(filter) = filter {
        for field in filter.fields() {
            if entity.column(field).is_none() {
                return Err(Error::InvalidPlan(format!(
                    "filter field '{}' not defined on entity '{}'",
                    field, entity.name
                )));
            }
        }
    }
    Ok(())
}
