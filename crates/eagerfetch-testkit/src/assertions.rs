//! Graph comparison harness.
//!
//! Compares two result graphs structurally and returns the actual graph's
//! distinct-entity count so tests can assert it in one place. Root order is
//! significant by default; pass an element sorter for scenarios whose root
//! order is intentionally unconstrained. Child collections are always
//! compared as identity sets (sorted by key) since collection order within a
//! parent is presentation detail.

use std::cmp::Ordering;

use eagerfetch_core::assemble::{EntityNode, ResultGraph};

/// Orders root entities before pairwise comparison.
pub type ElementSorter<'a> = &'a dyn Fn(&EntityNode, &EntityNode) -> Ordering;

/// Custom per-root assertion, replacing the default structural comparison
/// of field values.
pub type ElementAsserter<'a> = &'a dyn Fn(&EntityNode, &EntityNode);

/// Options for [`assert_graphs_equal`].
#[derive(Default)]
pub struct GraphAssertOptions<'a> {
    /// Sort both root sequences before comparing.
    pub element_sorter: Option<ElementSorter<'a>>,
    /// Assert each matched root pair instead of the default comparison.
    pub element_asserter: Option<ElementAsserter<'a>>,
}

/// Assert two graphs are equal and return the actual graph's entry count.
///
/// Panics with a description of the first mismatch.
pub fn assert_graphs_equal(
    expected: &ResultGraph,
    actual: &ResultGraph,
    options: &GraphAssertOptions<'_>,
) -> usize {
    assert_eq!(
        expected.len(),
        actual.len(),
        "root count mismatch: expected {}, got {}",
        expected.len(),
        actual.len()
    );

    let mut expected_roots: Vec<&EntityNode> = expected.roots.iter().collect();
    let mut actual_roots: Vec<&EntityNode> = actual.roots.iter().collect();
    if let Some(sorter) = options.element_sorter {
        expected_roots.sort_by(|a, b| sorter(a, b));
        actual_roots.sort_by(|a, b| sorter(a, b));
    }

    for (e, a) in expected_roots.iter().zip(&actual_roots) {
        match options.element_asserter {
            Some(asserter) => asserter(e, a),
            None => assert_nodes_equal(e, a),
        }
    }

    actual.entry_count()
}

/// Assert two entity nodes are structurally equal: identity, field values,
/// and (recursively) collection contents compared by identity.
pub fn assert_nodes_equal(expected: &EntityNode, actual: &EntityNode) {
    assert_eq!(
        expected.entity, actual.entity,
        "entity type mismatch at key {}",
        expected.key
    );
    assert_eq!(
        expected.key, actual.key,
        "identity mismatch for {}: expected {}, got {}",
        expected.entity, expected.key, actual.key
    );
    assert_eq!(
        expected.values, actual.values,
        "field values differ for {} {}",
        expected.entity, expected.key
    );

    let mut expected_names: Vec<&str> =
        expected.collections.iter().map(|(n, _)| n.as_str()).collect();
    let mut actual_names: Vec<&str> =
        actual.collections.iter().map(|(n, _)| n.as_str()).collect();
    expected_names.sort_unstable();
    actual_names.sort_unstable();
    assert_eq!(
        expected_names, actual_names,
        "collection names differ for {} {}",
        expected.entity, expected.key
    );

    for (name, expected_children) in &expected.collections {
        let actual_children = actual
            .collection(name)
            .unwrap_or_else(|| panic!("missing collection '{}'", name));
        assert_eq!(
            expected_children.len(),
            actual_children.len(),
            "collection '{}' size differs for {} {}: expected {}, got {}",
            name,
            expected.entity,
            expected.key,
            expected_children.len(),
            actual_children.len()
        );

        let mut expected_sorted: Vec<&EntityNode> = expected_children.iter().collect();
        let mut actual_sorted: Vec<&EntityNode> = actual_children.iter().collect();
        expected_sorted.sort_by(|a, b| a.key.compare(&b.key));
        actual_sorted.sort_by(|a, b| a.key.compare(&b.key));

        for (e, a) in expected_sorted.iter().zip(&actual_sorted) {
            assert_nodes_equal(e, a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eagerfetch_core::value::{Key, Value};

    fn node(id: i32, children: Vec<EntityNode>) -> EntityNode {
        EntityNode {
            entity: "Order".into(),
            key: Key::single(Value::Int32(id)),
            values: vec![("order_id".into(), Value::Int32(id))],
            collections: vec![("details".into(), children)],
        }
    }

    fn detail(order_id: i32, product_id: i32) -> EntityNode {
        EntityNode {
            entity: "OrderDetail".into(),
            key: Key(vec![Value::Int32(order_id), Value::Int32(product_id)]),
            values: vec![
                ("order_id".into(), Value::Int32(order_id)),
                ("product_id".into(), Value::Int32(product_id)),
            ],
            collections: vec![],
        }
    }

    #[test]
    fn test_equal_graphs_report_entry_count() {
        let left = ResultGraph {
            roots: vec![node(10248, vec![detail(10248, 11), detail(10248, 42)])],
        };
        // Same identities, different child arrival order.
        let right = ResultGraph {
            roots: vec![node(10248, vec![detail(10248, 42), detail(10248, 11)])],
        };
        let entries = assert_graphs_equal(&left, &right, &GraphAssertOptions::default());
        assert_eq!(entries, 3);
    }

    #[test]
    #[should_panic(expected = "size differs")]
    fn test_missing_child_panics() {
        let left = ResultGraph {
            roots: vec![node(10248, vec![detail(10248, 11)])],
        };
        let right = ResultGraph {
            roots: vec![node(10248, vec![])],
        };
        assert_graphs_equal(&left, &right, &GraphAssertOptions::default());
    }

    #[test]
    fn test_element_sorter_relaxes_root_order() {
        let left = ResultGraph {
            roots: vec![node(10248, vec![]), node(10249, vec![])],
        };
        let right = ResultGraph {
            roots: vec![node(10249, vec![]), node(10248, vec![])],
        };
        let options = GraphAssertOptions {
            element_sorter: Some(&|a, b| a.key.compare(&b.key)),
            element_asserter: None,
        };
        assert_eq!(assert_graphs_equal(&left, &right, &options), 2);
    }
}
