//! Ordering normalization for deterministic materialization.
//!
//! Standard SQL guarantees no row order without an explicit ORDER BY, and
//! different engines (or versions of one engine) return otherwise-identical
//! queries in different orders. Any pagination or grouping applied over rows
//! before a total order is established is therefore engine-dependent. The
//! normalizer closes that gap by appending tie-breaking identity keys to the
//! caller's ordering: root identity columns first, then each include path's
//! child identity columns, in column-definition order. Row-level pagination
//! is applied only after sorting with the resulting comparator.
//!
//! Grouping a nondeterministically ordered row stream and picking "the
//! first" per group remains a caller obligation: narrow the row set or
//! supply a total pick order. The normalizer flags such plans, it does not
//! repair them.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::catalog::EntityDef;
use crate::error::Error;
use crate::plan::{OrderDirection, OrderSpec};
use crate::row::RowShape;
use crate::value::{compare_values, Value};

/// One term of a normalized ordering, addressed by segment path and field.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    /// Include path of the segment (None = root).
    pub path: Option<String>,
    /// Field name within the segment.
    pub field: String,
    /// Sort direction.
    pub direction: OrderDirection,
}

/// A caller ordering extended to a total order over rows.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedOrder {
    /// Ordering terms: caller terms first, then appended tie-breakers.
    pub keys: Vec<OrderKey>,
    /// Whether the caller's own ordering already covered the root identity.
    /// When false, parent selection under pagination or grouping relies on
    /// the appended tie-break.
    pub caller_was_total: bool,
}

/// Appends identity tie-breakers to caller-specified orderings.
pub struct OrderingNormalizer;

impl OrderingNormalizer {
    /// Normalize a caller ordering over `root` into a total order over rows
    /// that also span the given include segments.
    ///
    /// Caller terms are kept verbatim; missing root identity columns are
    /// appended ascending, then each include's identity columns.
    pub fn normalize(
        caller: &[OrderSpec],
        root: &EntityDef,
        includes: &[(String, &EntityDef)],
    ) -> NormalizedOrder {
        let mut keys: Vec<OrderKey> = caller
            .iter()
            .map(|spec| OrderKey {
                path: None,
                field: spec.field.clone(),
                direction: spec.direction,
            })
            .collect();

        let covered: HashSet<&str> = caller.iter().map(|s| s.field.as_str()).collect();
        let caller_was_total = root.key.iter().all(|k| covered.contains(k.as_str()));

        for k in &root.key {
            if !covered.contains(k.as_str()) {
                keys.push(OrderKey {
                    path: None,
                    field: k.clone(),
                    direction: OrderDirection::Asc,
                });
            }
        }

        for (path, entity) in includes {
            for k in &entity.key {
                keys.push(OrderKey {
                    path: Some(path.clone()),
                    field: k.clone(),
                    direction: OrderDirection::Asc,
                });
            }
        }

        NormalizedOrder {
            keys,
            caller_was_total,
        }
    }
}

/// A deterministic comparator over raw rows of one statement shape.
///
/// Implements `caller_order ?: parent_identity ?: child_identity` with
/// NULLs-first value comparison.
pub struct RowComparator {
    terms: Vec<(usize, OrderDirection)>,
}

impl RowComparator {
    /// Bind a normalized order to a row shape.
    pub fn new(order: &NormalizedOrder, shape: &RowShape) -> Result<Self, Error> {
        let mut terms = Vec::with_capacity(order.keys.len());
        for key in &order.keys {
            let index = shape
                .column_index(key.path.as_deref(), &key.field)
                .ok_or_else(|| {
                    Error::InvalidPlan(format!(
                        "order field '{}' not present in row shape",
                        key.field
                    ))
                })?;
            terms.push((index, key.direction));
        }
        Ok(Self { terms })
    }

    /// Compare two rows.
    pub fn compare(&self, a: &[Value], b: &[Value]) -> Ordering {
        for (index, direction) in &self.terms {
            let cmp = compare_values(&a[*index], &b[*index]);
            let cmp = match direction {
                OrderDirection::Asc => cmp,
                OrderDirection::Desc => cmp.reverse(),
            };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDef, ColumnType};
    use crate::row::SegmentShape;

    fn order_entity() -> EntityDef {
        EntityDef::new("Order", "orders")
            .with_key(&["order_id"])
            .with_column(ColumnDef::new("order_id", ColumnType::Int32))
            .with_column(ColumnDef::new("customer_id", ColumnType::Text))
    }

    fn detail_entity() -> EntityDef {
        EntityDef::new("OrderDetail", "order_details")
            .with_key(&["order_id", "product_id"])
            .with_column(ColumnDef::new("order_id", ColumnType::Int32))
            .with_column(ColumnDef::new("product_id", ColumnType::Int32))
    }

    fn joined_shape() -> RowShape {
        RowShape {
            root: SegmentShape {
                entity: "Order".into(),
                offset: 0,
                fields: vec!["order_id".into(), "customer_id".into()],
                key: vec![0],
            },
            includes: vec![(
                "details".into(),
                SegmentShape {
                    entity: "OrderDetail".into(),
                    offset: 2,
                    fields: vec!["order_id".into(), "product_id".into()],
                    key: vec![2, 3],
                },
            )],
        }
    }

    #[test]
    fn test_tie_breakers_appended() {
        let root = order_entity();
        let detail = detail_entity();
        let caller = vec![OrderSpec::asc("customer_id")];

        let order =
            OrderingNormalizer::normalize(&caller, &root, &[("details".into(), &detail)]);

        assert!(!order.caller_was_total);
        let fields: Vec<_> = order.keys.iter().map(|k| k.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["customer_id", "order_id", "order_id", "product_id"]
        );
        assert_eq!(order.keys[2].path.as_deref(), Some("details"));
    }

    #[test]
    fn test_caller_covering_root_key_is_total() {
        let root = order_entity();
        let caller = vec![OrderSpec::asc("order_id")];
        let order = OrderingNormalizer::normalize(&caller, &root, &[]);
        assert!(order.caller_was_total);
        // No duplicate root key term.
        assert_eq!(order.keys.len(), 1);
    }

    #[test]
    fn test_comparator_breaks_ties_by_identity() {
        let root = order_entity();
        let detail = detail_entity();
        let order = OrderingNormalizer::normalize(
            &[OrderSpec::asc("customer_id")],
            &root,
            &[("details".into(), &detail)],
        );
        let shape = joined_shape();
        let cmp = RowComparator::new(&order, &shape).unwrap();

        // Same customer, same order, different detail product.
        let a = vec![
            Value::Int32(10248),
            Value::String("VINET".into()),
            Value::Int32(10248),
            Value::Int32(72),
        ];
        let b = vec![
            Value::Int32(10248),
            Value::String("VINET".into()),
            Value::Int32(10248),
            Value::Int32(11),
        ];
        assert_eq!(cmp.compare(&a, &b), Ordering::Greater);
        assert_eq!(cmp.compare(&b, &a), Ordering::Less);
    }

    #[test]
    fn test_comparator_descending_caller_term() {
        let root = order_entity();
        let order = OrderingNormalizer::normalize(&[OrderSpec::desc("order_id")], &root, &[]);
        let shape = RowShape {
            root: SegmentShape {
                entity: "Order".into(),
                offset: 0,
                fields: vec!["order_id".into(), "customer_id".into()],
                key: vec![0],
            },
            includes: vec![],
        };
        let cmp = RowComparator::new(&order, &shape).unwrap();
        let a = vec![Value::Int32(10249), Value::Null];
        let b = vec![Value::Int32(10248), Value::Null];
        assert_eq!(cmp.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_unknown_order_field_rejected() {
        let root = order_entity();
        let order = OrderingNormalizer::normalize(&[OrderSpec::asc("missing")], &root, &[]);
        let shape = joined_shape();
        assert!(matches!(
            RowComparator::new(&order, &shape),
            Err(Error::InvalidPlan(_))
        ));
    }
}
