//! Statement generation from load plans.
//!
//! The builder translates a [`LoadPlan`] into one statement (joined
//! strategy) or a root statement plus one statement per include path (split
//! strategy), together with the row shape each statement produces.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::EntityDef;
use crate::error::Error;
use crate::order::{NormalizedOrder, OrderingNormalizer};
use crate::plan::{FilterExpr, IncludePlan, LoadPlan};
use crate::row::{RowShape, SegmentShape};
use crate::value::Value;

use super::select::{JoinKey, LeftJoin, OrderTerm, SelectColumn, SelectStatement};

/// A statement paired with the shape of its result rows and the normalized
/// order its rows follow.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    /// The statement to execute.
    pub statement: SelectStatement,
    /// Column layout of the result rows.
    pub shape: Arc<RowShape>,
    /// Total order the rows are sorted by.
    pub ordering: NormalizedOrder,
}

/// Builds statements for a load plan.
pub struct SqlBuilder<'a> {
    plan: &'a LoadPlan,
}

impl<'a> SqlBuilder<'a> {
    /// Create a builder over a plan.
    pub fn new(plan: &'a LoadPlan) -> Self {
        Self { plan }
    }

    /// Alias for a segment path (None = root).
    fn alias(&self, path: Option<&str>) -> String {
        match path {
            None => "t0".to_string(),
            Some(p) => {
                let index = self
                    .plan
                    .includes
                    .iter()
                    .position(|i| i.path == p)
                    .map(|i| i + 1)
                    .unwrap_or(0);
                format!("t{}", index)
            }
        }
    }

    /// Build the single joined statement: root plus one LEFT JOIN per
    /// include path, ordered by the plan's normalized total order.
    ///
    /// Root pagination is left to the materializer: a row-level LIMIT over
    /// fanned-out rows would truncate child collections mid-parent.
    pub fn joined(&self) -> Result<PreparedQuery, Error> {
        let mut columns = Vec::new();
        let mut offset = 0;

        let root_alias = self.alias(None);
        let root_segment = segment_for(&self.plan.root, offset)?;
        push_columns(&mut columns, &root_alias, &self.plan.root);
        offset += root_segment.len();

        let mut joins = Vec::new();
        let mut include_segments = Vec::new();

        for include in &self.plan.includes {
            if include.pagination.is_some() {
                return Err(Error::InvalidPlan(format!(
                    "include '{}' pagination requires the split strategy",
                    include.path
                )));
            }
            let alias = self.alias(Some(&include.path));
            let left_alias = self.alias(include.parent_path());

            let segment = segment_for(&include.target, offset)?;
            push_columns(&mut columns, &alias, &include.target);
            offset += segment.len();
            include_segments.push((include.path.clone(), segment));

            joins.push(LeftJoin {
                table: include.target.table.clone(),
                alias,
                on: vec![JoinKey {
                    left_alias,
                    left_column: include.relation.from_key.clone(),
                    right_column: include.relation.to_key.clone(),
                }],
                filter: include.filter.clone(),
            });
        }

        let order_by = self.order_terms(&self.plan.ordering);

        let statement = SelectStatement {
            base_table: self.plan.root.table.clone(),
            base_alias: root_alias,
            columns,
            joins,
            filter: self.plan.filter.clone(),
            order_by,
            offset: None,
            limit: None,
        };

        debug!(sql = %statement.to_sql().0, "generated joined statement");

        Ok(PreparedQuery {
            statement,
            shape: Arc::new(RowShape {
                root: root_segment,
                includes: include_segments,
            }),
            ordering: self.plan.ordering.clone(),
        })
    }

    /// Build the split strategy's root statement.
    ///
    /// Pagination is pushed down only when no group step follows; grouping
    /// must see the full root set before the page is cut.
    pub fn split_root(&self) -> Result<PreparedQuery, Error> {
        let root_alias = self.alias(None);
        let root_segment = segment_for(&self.plan.root, 0)?;

        let mut columns = Vec::new();
        push_columns(&mut columns, &root_alias, &self.plan.root);

        let ordering = NormalizedOrder {
            keys: self
                .plan
                .ordering
                .keys
                .iter()
                .filter(|k| k.path.is_none())
                .cloned()
                .collect(),
            caller_was_total: self.plan.ordering.caller_was_total,
        };
        let order_by = self.order_terms(&ordering);

        let (offset, limit) = match (&self.plan.group, &self.plan.pagination) {
            (None, Some(p)) => (Some(p.offset).filter(|o| *o > 0), p.limit),
            _ => (None, None),
        };

        let statement = SelectStatement {
            base_table: self.plan.root.table.clone(),
            base_alias: root_alias,
            columns,
            joins: vec![],
            filter: self.plan.filter.clone(),
            order_by,
            offset,
            limit,
        };

        debug!(sql = %statement.to_sql().0, "generated split root statement");

        Ok(PreparedQuery {
            statement,
            shape: Arc::new(RowShape {
                root: root_segment,
                includes: vec![],
            }),
            ordering,
        })
    }

    /// Build a split strategy child statement for one include path,
    /// correlated to the given parent key values.
    pub fn split_child(
        &self,
        include: &IncludePlan,
        parent_keys: &[Value],
    ) -> Result<PreparedQuery, Error> {
        let alias = "t0".to_string();
        let segment = segment_for(&include.target, 0)?;

        let mut columns = Vec::new();
        push_columns(&mut columns, &alias, &include.target);

        let correlation = FilterExpr::is_in(&include.relation.to_key, parent_keys.to_vec());
        let filter = match &include.filter {
            Some(f) => FilterExpr::And(vec![correlation, f.clone()]),
            None => correlation,
        };

        let ordering = OrderingNormalizer::normalize(&include.order_by, &include.target, &[]);
        let order_by = ordering
            .keys
            .iter()
            .map(|k| OrderTerm {
                table_alias: alias.clone(),
                column: k.field.clone(),
                direction: k.direction,
            })
            .collect();

        let (offset, limit) = match &include.pagination {
            Some(p) => (Some(p.offset).filter(|o| *o > 0), p.limit),
            None => (None, None),
        };

        let statement = SelectStatement {
            base_table: include.target.table.clone(),
            base_alias: alias,
            columns,
            joins: vec![],
            filter: Some(filter),
            order_by,
            offset,
            limit,
        };

        debug!(
            path = %include.path,
            sql = %statement.to_sql().0,
            "generated split child statement"
        );

        Ok(PreparedQuery {
            statement,
            shape: Arc::new(RowShape {
                root: segment,
                includes: vec![],
            }),
            ordering,
        })
    }

    fn order_terms(&self, ordering: &NormalizedOrder) -> Vec<OrderTerm> {
        ordering
            .keys
            .iter()
            .map(|k| OrderTerm {
                table_alias: self.alias(k.path.as_deref()),
                column: k.field.clone(),
                direction: k.direction,
            })
            .collect()
    }
}

fn segment_for(entity: &EntityDef, offset: usize) -> Result<SegmentShape, Error> {
    let mut key = Vec::with_capacity(entity.key.len());
    for k in &entity.key {
        let position = entity.column_position(k).ok_or_else(|| {
            Error::InvalidSchema(format!(
                "entity '{}' key column '{}' not defined",
                entity.name, k
            ))
        })?;
        key.push(offset + position);
    }
    Ok(SegmentShape {
        entity: entity.name.clone(),
        offset,
        fields: entity.columns.iter().map(|c| c.name.clone()).collect(),
        key,
    })
}

fn push_columns(columns: &mut Vec<SelectColumn>, alias: &str, entity: &EntityDef) {
    for column in &entity.columns {
        columns.push(SelectColumn {
            table_alias: alias.to_string(),
            column: column.name.clone(),
            output: format!("{}_{}", alias, column.name),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, ColumnDef, ColumnType, RelationDef};
    use crate::plan::{
        IncludeQuery, OrderSpec, Pagination, QueryPlanner, RelationInclude,
    };

    fn test_catalog() -> Catalog {
        let order = EntityDef::new("Order", "orders")
            .with_key(&["order_id"])
            .with_column(ColumnDef::new("order_id", ColumnType::Int32))
            .with_column(ColumnDef::new("customer_id", ColumnType::Text));
        let detail = EntityDef::new("OrderDetail", "order_details")
            .with_key(&["order_id", "product_id"])
            .with_column(ColumnDef::new("order_id", ColumnType::Int32))
            .with_column(ColumnDef::new("product_id", ColumnType::Int32))
            .with_column(ColumnDef::new("quantity", ColumnType::Int32));

        Catalog::new()
            .with_entity(order)
            .unwrap()
            .with_entity(detail)
            .unwrap()
            .with_relation(RelationDef::one_to_many(
                "details",
                "Order",
                "order_id",
                "OrderDetail",
                "order_id",
            ))
            .unwrap()
    }

    fn plan_for(query: IncludeQuery) -> LoadPlan {
        let catalog = test_catalog();
        QueryPlanner::new(&catalog).plan(&query).unwrap()
    }

    #[test]
    fn test_joined_statement_shape_and_sql() {
        let plan = plan_for(
            IncludeQuery::new("Order")
                .include(RelationInclude::new("details"))
                .order_by(OrderSpec::asc("order_id")),
        );
        let prepared = SqlBuilder::new(&plan).joined().unwrap();

        assert_eq!(prepared.shape.width(), 5);
        assert_eq!(prepared.shape.root.key, vec![0]);
        assert_eq!(prepared.shape.includes[0].1.key, vec![2, 3]);

        let (sql, params) = prepared.statement.to_sql();
        assert_eq!(
            sql,
            "SELECT t0.order_id AS t0_order_id, t0.customer_id AS t0_customer_id, \
             t1.order_id AS t1_order_id, t1.product_id AS t1_product_id, \
             t1.quantity AS t1_quantity \
             FROM orders AS t0 \
             LEFT JOIN order_details AS t1 ON t1.order_id = t0.order_id \
             ORDER BY t0.order_id ASC, t1.order_id ASC, t1.product_id ASC"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_joined_rejects_include_pagination() {
        let plan = plan_for(
            IncludeQuery::new("Order")
                .include(RelationInclude::new("details").with_pagination(Pagination::take(2))),
        );
        assert!(matches!(
            SqlBuilder::new(&plan).joined(),
            Err(Error::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_split_root_pushes_pagination() {
        let plan = plan_for(
            IncludeQuery::new("Order")
                .include(RelationInclude::new("details"))
                .order_by(OrderSpec::asc("order_id"))
                .with_pagination(Pagination::take(5)),
        );
        let prepared = SqlBuilder::new(&plan).split_root().unwrap();
        let (sql, _) = prepared.statement.to_sql();
        assert!(sql.ends_with("ORDER BY t0.order_id ASC LIMIT 5"));
        // Root statement carries no child segments.
        assert!(prepared.shape.includes.is_empty());
    }

    #[test]
    fn test_split_child_correlates_on_parent_keys() {
        let plan = plan_for(IncludeQuery::new("Order").include(RelationInclude::new("details")));
        let prepared = SqlBuilder::new(&plan)
            .split_child(&plan.includes[0], &[Value::Int32(10248), Value::Int32(10249)])
            .unwrap();
        let (sql, params) = prepared.statement.to_sql();
        assert!(sql.contains("WHERE t0.order_id IN (?, ?)"));
        assert!(sql.contains("ORDER BY t0.order_id ASC, t0.product_id ASC"));
        assert_eq!(params, vec![Value::Int32(10248), Value::Int32(10249)]);
    }
}
