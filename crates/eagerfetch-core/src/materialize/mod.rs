//! Row-to-accumulation materialization.
//!
//! Two interchangeable strategies produce the same intermediate form: an
//! ordered, de-duplicated root entity list plus per-path child lists keyed
//! by parent identity. Their failure modes differ (fan-out duplication for
//! the joined strategy, orphan correlation for the split strategy), so they
//! are implemented independently and tested for result equality.

mod joined;
mod split;

pub use joined::materialize_joined;
pub use split::materialize_split;

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::Error;
use crate::plan::{GroupPick, LoadPlan, LoadStrategy, OrderDirection, Pagination};
use crate::row::{RowSource, SegmentShape};
use crate::value::{compare_values, Key, Value};

/// One entity's field values, extracted from a row segment.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityData {
    /// Entity type name.
    pub entity: String,
    /// Identity key.
    pub key: Key,
    /// Field name/value pairs in segment order.
    pub values: Vec<(String, Value)>,
}

impl EntityData {
    /// Get a field value by name.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v)
    }
}

/// Materialized accumulations, ready for assembly.
#[derive(Debug, Clone, Default)]
pub struct Materialized {
    /// Distinct root entities in presentation order.
    pub roots: Vec<EntityData>,
    /// Distinct children per include path, keyed by parent identity, in
    /// presentation order within each parent.
    pub children: HashMap<String, HashMap<Key, Vec<EntityData>>>,
}

/// Materialize a plan using its selected strategy.
pub fn materialize<S: RowSource + ?Sized>(
    plan: &LoadPlan,
    source: &S,
) -> Result<Materialized, Error> {
    match plan.strategy {
        LoadStrategy::Joined => materialize_joined(plan, source),
        LoadStrategy::Split => materialize_split(plan, source),
    }
}

/// Extract one entity's data from its segment of a row.
pub(crate) fn extract_entity(segment: &SegmentShape, key: Key, row: &[Value]) -> EntityData {
    let values = segment
        .fields
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), row[segment.offset + i].clone()))
        .collect();
    EntityData {
        entity: segment.entity.clone(),
        key,
        values,
    }
}

/// Group roots by a field and keep one representative per group.
///
/// Group order follows first appearance in the (already deterministic) root
/// sequence; the representative is the group's first element under
/// `pick_order`, stable-sorted so the incoming order breaks remaining ties.
pub(crate) fn apply_group_pick(roots: &mut Vec<EntityData>, group: &GroupPick) {
    let mut order: Vec<Value> = Vec::new();
    let mut groups: HashMap<Value, Vec<EntityData>> = HashMap::new();

    for root in roots.drain(..) {
        let group_key = root.value(&group.key_field).cloned().unwrap_or(Value::Null);
        let members = groups.entry(group_key.clone()).or_insert_with(|| {
            order.push(group_key);
            Vec::new()
        });
        members.push(root);
    }

    for group_key in order {
        let mut members = groups.remove(&group_key).unwrap_or_default();
        members.sort_by(|a, b| compare_picks(a, b, group));
        if let Some(representative) = members.into_iter().next() {
            roots.push(representative);
        }
    }
}

fn compare_picks(a: &EntityData, b: &EntityData, group: &GroupPick) -> Ordering {
    for spec in &group.pick_order {
        let av = a.value(&spec.field).unwrap_or(&Value::Null);
        let bv = b.value(&spec.field).unwrap_or(&Value::Null);
        let cmp = compare_values(av, bv);
        let cmp = match spec.direction {
            OrderDirection::Asc => cmp,
            OrderDirection::Desc => cmp.reverse(),
        };
        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    Ordering::Equal
}

/// Apply offset/limit to the root sequence.
pub(crate) fn apply_pagination(roots: &mut Vec<EntityData>, pagination: &Pagination) {
    let offset = pagination.offset as usize;
    if offset > 0 {
        if offset >= roots.len() {
            roots.clear();
            return;
        }
        roots.drain(0..offset);
    }
    if let Some(limit) = pagination.limit {
        let limit = limit as usize;
        if limit < roots.len() {
            roots.truncate(limit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::OrderSpec;

    fn order(id: i32, customer: &str) -> EntityData {
        EntityData {
            entity: "Order".into(),
            key: Key::single(Value::Int32(id)),
            values: vec![
                ("order_id".into(), Value::Int32(id)),
                ("customer_id".into(), Value::String(customer.into())),
            ],
        }
    }

    #[test]
    fn test_group_pick_keeps_one_per_group() {
        let mut roots = vec![
            order(10250, "HANAR"),
            order(10248, "VINET"),
            order(10249, "VINET"),
        ];
        let group = GroupPick::new("customer_id", vec![OrderSpec::asc("order_id")]);
        apply_group_pick(&mut roots, &group);

        assert_eq!(roots.len(), 2);
        // Group order follows first appearance; representative is the
        // smallest order_id within each group.
        assert_eq!(roots[0].key, Key::single(Value::Int32(10250)));
        assert_eq!(roots[1].key, Key::single(Value::Int32(10248)));
    }

    #[test]
    fn test_group_pick_descending() {
        let mut roots = vec![order(10248, "VINET"), order(10249, "VINET")];
        let group = GroupPick::new("customer_id", vec![OrderSpec::desc("order_id")]);
        apply_group_pick(&mut roots, &group);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].key, Key::single(Value::Int32(10249)));
    }

    #[test]
    fn test_pagination_offset_and_limit() {
        let mut roots = vec![
            order(10248, "a"),
            order(10249, "b"),
            order(10250, "c"),
            order(10251, "d"),
        ];
        apply_pagination(&mut roots, &Pagination::skip_take(1, 2));
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].key, Key::single(Value::Int32(10249)));
        assert_eq!(roots[1].key, Key::single(Value::Int32(10250)));
    }

    #[test]
    fn test_pagination_offset_past_end() {
        let mut roots = vec![order(10248, "a")];
        apply_pagination(&mut roots, &Pagination::skip(5));
        assert!(roots.is_empty());
    }
}
