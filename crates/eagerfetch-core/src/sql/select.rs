//! Structured SELECT statements and SQL text rendering.
//!
//! Statements keep their structure (base table, joins, filters, ordering,
//! pagination) so that row sources can either render them to SQL text via
//! [`SelectStatement::to_sql`] or interpret them directly (the in-memory
//! test source does the latter).

use std::fmt::Write;

use crate::plan::{FilterExpr, OrderDirection};
use crate::value::Value;

/// A projected column with its output alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    /// Table alias the column is read from.
    pub table_alias: String,
    /// Source column name.
    pub column: String,
    /// Output alias in the result set.
    pub output: String,
}

/// An equi-join key pairing a column of an earlier table with a column of
/// the joined table.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinKey {
    /// Alias of the left-hand (already joined) table.
    pub left_alias: String,
    /// Column on the left-hand table.
    pub left_column: String,
    /// Column on the joined table.
    pub right_column: String,
}

/// A LEFT JOIN clause.
///
/// Include filters attach to the ON clause rather than WHERE so the join
/// stays outer: a parent with no matching children still produces a row.
#[derive(Debug, Clone, PartialEq)]
pub struct LeftJoin {
    /// Joined table name.
    pub table: String,
    /// Alias for the joined table.
    pub alias: String,
    /// Equi-join keys.
    pub on: Vec<JoinKey>,
    /// Additional filter on the joined table.
    pub filter: Option<FilterExpr>,
}

/// An ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    /// Table alias the term refers to.
    pub table_alias: String,
    /// Column name.
    pub column: String,
    /// Sort direction.
    pub direction: OrderDirection,
}

/// A single-select query description.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Base table name.
    pub base_table: String,
    /// Alias for the base table.
    pub base_alias: String,
    /// Projected columns, in result order.
    pub columns: Vec<SelectColumn>,
    /// LEFT JOIN clauses, in join order.
    pub joins: Vec<LeftJoin>,
    /// WHERE filter on the base table.
    pub filter: Option<FilterExpr>,
    /// ORDER BY terms.
    pub order_by: Vec<OrderTerm>,
    /// Row offset.
    pub offset: Option<u64>,
    /// Row limit.
    pub limit: Option<u64>,
}

impl SelectStatement {
    /// Render SQL text with `?` placeholders and the parameter values bound
    /// to them, in placeholder order.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();

        sql.push_str("SELECT ");
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            let _ = write!(sql, "{}.{} AS {}", col.table_alias, col.column, col.output);
        }

        let _ = write!(sql, " FROM {} AS {}", self.base_table, self.base_alias);

        for join in &self.joins {
            let _ = write!(sql, " LEFT JOIN {} AS {} ON ", join.table, join.alias);
            for (i, key) in join.on.iter().enumerate() {
                if i > 0 {
                    sql.push_str(" AND ");
                }
                let _ = write!(
                    sql,
                    "{}.{} = {}.{}",
                    join.alias, key.right_column, key.left_alias, key.left_column
                );
            }
            if let Some(filter) = &join.filter {
                sql.push_str(" AND ");
                render_filter(filter, &join.alias, &mut sql, &mut params);
            }
        }

        if let Some(filter) = &self.filter {
            sql.push_str(" WHERE ");
            render_filter(filter, &self.base_alias, &mut sql, &mut params);
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, term) in self.order_by.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                let dir = match term.direction {
                    OrderDirection::Asc => "ASC",
                    OrderDirection::Desc => "DESC",
                };
                let _ = write!(sql, "{}.{} {}", term.table_alias, term.column, dir);
            }
        }

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                let _ = write!(sql, " LIMIT {} OFFSET {}", limit, offset);
            }
            (Some(limit), None) => {
                let _ = write!(sql, " LIMIT {}", limit);
            }
            // MySQL requires LIMIT before OFFSET; the huge limit is the
            // documented idiom for offset-only pagination.
            (None, Some(offset)) => {
                let _ = write!(sql, " LIMIT 18446744073709551615 OFFSET {}", offset);
            }
            (None, None) => {}
        }

        (sql, params)
    }
}

fn render_filter(expr: &FilterExpr, alias: &str, sql: &mut String, params: &mut Vec<Value>) {
    match expr {
        FilterExpr::Eq { field, value } => render_binary(alias, field, "=", value, sql, params),
        FilterExpr::Ne { field, value } => render_binary(alias, field, "<>", value, sql, params),
        FilterExpr::Lt { field, value } => render_binary(alias, field, "<", value, sql, params),
        FilterExpr::Le { field, value } => render_binary(alias, field, "<=", value, sql, params),
        FilterExpr::Gt { field, value } => render_binary(alias, field, ">", value, sql, params),
        FilterExpr::Ge { field, value } => render_binary(alias, field, ">=", value, sql, params),
        FilterExpr::In { field, values } => {
            let _ = write!(sql, "{}.{} IN (", alias, field);
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push('?');
                params.push(value.clone());
            }
            sql.push(')');
        }
        FilterExpr::IsNull { field } => {
            let _ = write!(sql, "{}.{} IS NULL", alias, field);
        }
        FilterExpr::IsNotNull { field } => {
            let _ = write!(sql, "{}.{} IS NOT NULL", alias, field);
        }
        FilterExpr::And(exprs) => render_compound(exprs, " AND ", alias, sql, params),
        FilterExpr::Or(exprs) => render_compound(exprs, " OR ", alias, sql, params),
    }
}

fn render_binary(
    alias: &str,
    field: &str,
    op: &str,
    value: &Value,
    sql: &mut String,
    params: &mut Vec<Value>,
) {
    let _ = write!(sql, "{}.{} {} ?", alias, field, op);
    params.push(value.clone());
}

fn render_compound(
    exprs: &[FilterExpr],
    separator: &str,
    alias: &str,
    sql: &mut String,
    params: &mut Vec<Value>,
) {
    sql.push('(');
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            sql.push_str(separator);
        }
        render_filter(expr, alias, sql, params);
    }
    sql.push(')');
}
