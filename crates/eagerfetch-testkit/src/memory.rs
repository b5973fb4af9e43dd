//! In-memory row source.
//!
//! Interprets [`SelectStatement`] structure directly against in-memory
//! tables: base filter, LEFT JOINs with ON-clause filters, ORDER BY, and
//! offset/limit. With a shuffle seed set, base-table rows are permuted
//! before any explicit ORDER BY is applied, simulating the scan-order
//! nondeterminism of real engines; rows not covered by an ORDER BY term
//! keep their (permuted) arrival order.

use std::collections::HashMap;

use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use eagerfetch_core::plan::FilterExpr;
use eagerfetch_core::row::{RowCursor, RowSource};
use eagerfetch_core::sql::{OrderTerm, SelectStatement};
use eagerfetch_core::value::{compare_values, Value};
use eagerfetch_core::Error;
use eagerfetch_core::OrderDirection;

#[derive(Debug, Clone)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Table>,
    shuffle_seed: Option<u64>,
}

/// A table-backed row source for tests.
#[derive(Default)]
pub struct MemoryRowSource {
    inner: RwLock<Inner>,
}

impl MemoryRowSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the given columns.
    pub fn create_table(&self, name: &str, columns: &[&str]) {
        self.inner.write().tables.insert(
            name.to_string(),
            Table {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows: Vec::new(),
            },
        );
    }

    /// Insert a row into a table. Panics on unknown table or width
    /// mismatch (fixture programming error).
    pub fn insert(&self, table: &str, row: Vec<Value>) {
        let mut inner = self.inner.write();
        let table = inner
            .tables
            .get_mut(table)
            .unwrap_or_else(|| panic!("unknown table '{}'", table));
        assert_eq!(
            row.len(),
            table.columns.len(),
            "row width does not match table"
        );
        table.rows.push(row);
    }

    /// Permute base-table row order with a seeded RNG on every execution,
    /// or disable permutation with `None`.
    pub fn set_shuffle_seed(&self, seed: Option<u64>) {
        self.inner.write().shuffle_seed = seed;
    }

    fn run(&self, statement: &SelectStatement) -> Result<Vec<Vec<Value>>, Error> {
        let inner = self.inner.read();

        let base = inner
            .tables
            .get(&statement.base_table)
            .ok_or_else(|| Error::Execution(format!("no table '{}'", statement.base_table)))?;

        let mut columns_by_alias: HashMap<&str, &[String]> = HashMap::new();
        columns_by_alias.insert(statement.base_alias.as_str(), &base.columns);
        for join in &statement.joins {
            let table = inner
                .tables
                .get(&join.table)
                .ok_or_else(|| Error::Execution(format!("no table '{}'", join.table)))?;
            columns_by_alias.insert(join.alias.as_str(), &table.columns);
        }

        let mut base_rows: Vec<&Vec<Value>> = base.rows.iter().collect();
        if let Some(seed) = inner.shuffle_seed {
            let mut rng = StdRng::seed_from_u64(seed);
            base_rows.shuffle(&mut rng);
        }

        // Bind the base alias, filtering base rows up front.
        let mut envs: Vec<HashMap<&str, Option<&Vec<Value>>>> = Vec::new();
        for row in base_rows {
            if let Some(filter) = &statement.filter {
                if !eval_filter(filter, &base.columns, row)? {
                    continue;
                }
            }
            let mut env = HashMap::new();
            env.insert(statement.base_alias.as_str(), Some(row));
            envs.push(env);
        }

        // LEFT JOIN semantics: no match binds the alias to NULL columns.
        for join in &statement.joins {
            let table = inner.tables.get(&join.table).expect("checked above");
            let mut next = Vec::new();
            for env in envs {
                let mut matched = false;
                for candidate in &table.rows {
                    if !join_matches(join, &env, &columns_by_alias, candidate)? {
                        continue;
                    }
                    if let Some(filter) = &join.filter {
                        if !eval_filter(filter, &table.columns, candidate)? {
                            continue;
                        }
                    }
                    let mut env = env.clone();
                    env.insert(join.alias.as_str(), Some(candidate));
                    next.push(env);
                    matched = true;
                }
                if !matched {
                    let mut env = env.clone();
                    env.insert(join.alias.as_str(), None);
                    next.push(env);
                }
            }
            envs = next;
        }

        // Projection.
        let mut rows: Vec<Vec<Value>> = Vec::with_capacity(envs.len());
        for env in &envs {
            let mut out = Vec::with_capacity(statement.columns.len());
            for column in &statement.columns {
                let columns = columns_by_alias
                    .get(column.table_alias.as_str())
                    .ok_or_else(|| {
                        Error::Execution(format!("unknown alias '{}'", column.table_alias))
                    })?;
                let value = match env.get(column.table_alias.as_str()) {
                    Some(Some(row)) => {
                        let index = columns
                            .iter()
                            .position(|c| c == &column.column)
                            .ok_or_else(|| {
                                Error::Execution(format!("unknown column '{}'", column.column))
                            })?;
                        row[index].clone()
                    }
                    _ => Value::Null,
                };
                out.push(value);
            }
            rows.push(out);
        }

        sort_rows(&mut rows, &statement.order_by, &statement.columns)?;

        let offset = statement.offset.unwrap_or(0) as usize;
        if offset > 0 {
            rows = if offset >= rows.len() {
                Vec::new()
            } else {
                rows.split_off(offset)
            };
        }
        if let Some(limit) = statement.limit {
            rows.truncate(limit as usize);
        }

        Ok(rows)
    }
}

impl RowSource for MemoryRowSource {
    fn execute(&self, statement: &SelectStatement) -> Result<RowCursor, Error> {
        let rows = self.run(statement)?;
        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}

fn join_matches(
    join: &eagerfetch_core::sql::LeftJoin,
    env: &HashMap<&str, Option<&Vec<Value>>>,
    columns_by_alias: &HashMap<&str, &[String]>,
    candidate: &[Value],
) -> Result<bool, Error> {
    let candidate_columns = columns_by_alias.get(join.alias.as_str()).expect("joined alias");
    for key in &join.on {
        let left_columns = columns_by_alias
            .get(key.left_alias.as_str())
            .ok_or_else(|| Error::Execution(format!("unknown alias '{}'", key.left_alias)))?;
        let left_row = match env.get(key.left_alias.as_str()) {
            Some(Some(row)) => row,
            // A null left side never matches.
            _ => return Ok(false),
        };
        let left_index = left_columns
            .iter()
            .position(|c| c == &key.left_column)
            .ok_or_else(|| Error::Execution(format!("unknown column '{}'", key.left_column)))?;
        let right_index = candidate_columns
            .iter()
            .position(|c| c == &key.right_column)
            .ok_or_else(|| Error::Execution(format!("unknown column '{}'", key.right_column)))?;

        let left = &left_row[left_index];
        let right = &candidate[right_index];
        if left.is_null() || right.is_null() {
            return Ok(false);
        }
        if compare_values(left, right) != std::cmp::Ordering::Equal {
            return Ok(false);
        }
    }
    Ok(true)
}

fn sort_rows(
    rows: &mut [Vec<Value>],
    order_by: &[OrderTerm],
    columns: &[eagerfetch_core::sql::SelectColumn],
) -> Result<(), Error> {
    if order_by.is_empty() {
        return Ok(());
    }
    let mut indexes = Vec::with_capacity(order_by.len());
    for term in order_by {
        let index = columns
            .iter()
            .position(|c| c.table_alias == term.table_alias && c.column == term.column)
            .ok_or_else(|| {
                Error::Execution(format!("order term '{}' not projected", term.column))
            })?;
        indexes.push((index, term.direction));
    }
    rows.sort_by(|a, b| {
        for (index, direction) in &indexes {
            let cmp = compare_values(&a[*index], &b[*index]);
            let cmp = match direction {
                OrderDirection::Asc => cmp,
                OrderDirection::Desc => cmp.reverse(),
            };
            if cmp != std::cmp::Ordering::Equal {
                return cmp;
            }
        }
        std::cmp::Ordering::Equal
    });
    Ok(())
}

// SQL comparison semantics: NULL never compares true.
fn eval_filter(expr: &FilterExpr, columns: &[String], row: &[Value]) -> Result<bool, Error> {
    let cell = |field: &str| -> Result<&Value, Error> {
        columns
            .iter()
            .position(|c| c == field)
            .map(|i| &row[i])
            .ok_or_else(|| Error::Execution(format!("unknown filter field '{}'", field)))
    };

    let compare = |field: &str, value: &Value| -> Result<Option<std::cmp::Ordering>, Error> {
        let cell = cell(field)?;
        if cell.is_null() || value.is_null() {
            return Ok(None);
        }
        Ok(Some(compare_values(cell, value)))
    };

    Ok(match expr {
        FilterExpr::Eq { field, value } => {
            compare(field, value)? == Some(std::cmp::Ordering::Equal)
        }
        FilterExpr::Ne { field, value } => matches!(
            compare(field, value)?,
            Some(ord) if ord != std::cmp::Ordering::Equal
        ),
        FilterExpr::Lt { field, value } => {
            compare(field, value)? == Some(std::cmp::Ordering::Less)
        }
        FilterExpr::Le { field, value } => matches!(
            compare(field, value)?,
            Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
        ),
        FilterExpr::Gt { field, value } => {
            compare(field, value)? == Some(std::cmp::Ordering::Greater)
        }
        FilterExpr::Ge { field, value } => matches!(
            compare(field, value)?,
            Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
        ),
        FilterExpr::In { field, values } => {
            let cell = cell(field)?;
            !cell.is_null()
                && values
                    .iter()
                    .any(|v| compare_values(cell, v) == std::cmp::Ordering::Equal)
        }
        FilterExpr::IsNull { field } => cell(field)?.is_null(),
        FilterExpr::IsNotNull { field } => !cell(field)?.is_null(),
        FilterExpr::And(exprs) => {
            for e in exprs {
                if !eval_filter(e, columns, row)? {
                    return Ok(false);
                }
            }
            true
        }
        FilterExpr::Or(exprs) => {
            for e in exprs {
                if eval_filter(e, columns, row)? {
                    return Ok(true);
                }
            }
            false
        }
    })
}
