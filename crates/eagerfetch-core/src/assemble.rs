//! Object-graph assembly from materialized accumulations.

use std::collections::{HashMap, HashSet};

use crate::materialize::{EntityData, Materialized};
use crate::plan::LoadPlan;
use crate::value::{Key, Value};

/// A materialized entity with its populated navigation collections.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityNode {
    /// Entity type name.
    pub entity: String,
    /// Identity key.
    pub key: Key,
    /// Field name/value pairs.
    pub values: Vec<(String, Value)>,
    /// Populated collections, one per include at this level, named after
    /// the relation. Present (possibly empty) for every planned include.
    pub collections: Vec<(String, Vec<EntityNode>)>,
}

impl EntityNode {
    /// Get a field value by name.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v)
    }

    /// Get a collection by relation name.
    pub fn collection(&self, name: &str) -> Option<&[EntityNode]> {
        self.collections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, nodes)| nodes.as_slice())
    }
}

/// The final in-memory result: root entities with populated collections.
///
/// Built fresh per query execution and discarded once consumed; there is no
/// cross-query cache. Within one graph each distinct identity appears as
/// exactly one node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultGraph {
    /// Root entities in presentation order.
    pub roots: Vec<EntityNode>,
}

impl ResultGraph {
    /// Number of root entities.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// True when the graph has no roots.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of distinct tracked entities in the graph: every root
    /// plus every attached child, each identity counted once.
    pub fn entry_count(&self) -> usize {
        let mut seen: HashSet<(String, Key)> = HashSet::new();
        for root in &self.roots {
            count_node(root, &mut seen);
        }
        seen.len()
    }
}

fn count_node(node: &EntityNode, seen: &mut HashSet<(String, Key)>) {
    seen.insert((node.entity.clone(), node.key.clone()));
    for (_, children) in &node.collections {
        for child in children {
            count_node(child, seen);
        }
    }
}

/// Builds result graphs from materialized accumulations.
///
/// Deterministic given deterministic input: node order mirrors accumulation
/// order, and each distinct identity is assembled exactly once.
pub struct EntityAssembler<'a> {
    plan: &'a LoadPlan,
}

impl<'a> EntityAssembler<'a> {
    /// Create an assembler for a plan.
    pub fn new(plan: &'a LoadPlan) -> Self {
        Self { plan }
    }

    /// Assemble the final graph.
    pub fn assemble(&self, materialized: Materialized) -> ResultGraph {
        let roots = materialized
            .roots
            .iter()
            .map(|root| self.build_node(root, "", &materialized.children))
            .collect();
        ResultGraph { roots }
    }

    fn build_node(
        &self,
        data: &EntityData,
        path_prefix: &str,
        children: &HashMap<String, HashMap<Key, Vec<EntityData>>>,
    ) -> EntityNode {
        let mut collections = Vec::new();

        for include in &self.plan.includes {
            let parent_path = include.parent_path().unwrap_or("");
            if parent_path != path_prefix {
                continue;
            }

            let nodes = children
                .get(&include.path)
                .and_then(|per_parent| per_parent.get(&data.key))
                .map(|list| {
                    list.iter()
                        .map(|child| self.build_node(child, &include.path, children))
                        .collect()
                })
                .unwrap_or_default();

            collections.push((include.collection_name().to_string(), nodes));
        }

        EntityNode {
            entity: data.entity.clone(),
            key: data.key.clone(),
            values: data.values.clone(),
            collections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, ColumnDef, ColumnType, EntityDef, RelationDef};
    use crate::plan::{IncludeQuery, QueryPlanner, RelationInclude};

    fn test_plan() -> LoadPlan {
        let order = EntityDef::new("Order", "orders")
            .with_key(&["order_id"])
            .with_column(ColumnDef::new("order_id", ColumnType::Int32));
        let detail = EntityDef::new("OrderDetail", "order_details")
            .with_key(&["order_id", "product_id"])
            .with_column(ColumnDef::new("order_id", ColumnType::Int32))
            .with_column(ColumnDef::new("product_id", ColumnType::Int32));
        let catalog = Catalog::new()
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
            .unwrap();
        QueryPlanner::new(&catalog)
            .plan(&IncludeQuery::new("Order").include(RelationInclude::new("details")))
            .unwrap()
    }

    fn order_data(id: i32) -> EntityData {
        EntityData {
            entity: "Order".into(),
            key: Key::single(Value::Int32(id)),
            values: vec![("order_id".into(), Value::Int32(id))],
        }
    }

    fn detail_data(order_id: i32, product_id: i32) -> EntityData {
        EntityData {
            entity: "OrderDetail".into(),
            key: Key(vec![Value::Int32(order_id), Value::Int32(product_id)]),
            values: vec![
                ("order_id".into(), Value::Int32(order_id)),
                ("product_id".into(), Value::Int32(product_id)),
            ],
        }
    }

    #[test]
    fn test_assemble_attaches_children() {
        let plan = test_plan();
        let mut children = HashMap::new();
        let mut per_parent = HashMap::new();
        per_parent.insert(
            Key::single(Value::Int32(10248)),
            vec![detail_data(10248, 11), detail_data(10248, 42)],
        );
        children.insert("details".to_string(), per_parent);

        let graph = EntityAssembler::new(&plan).assemble(Materialized {
            roots: vec![order_data(10248), order_data(10249)],
            children,
        });

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.roots[0].collection("details").unwrap().len(), 2);
        // Parents without children still expose the (empty) collection.
        assert_eq!(graph.roots[1].collection("details").unwrap().len(), 0);
    }

    #[test]
    fn test_entry_count_counts_distinct_entities() {
        let plan = test_plan();
        let mut children = HashMap::new();
        let mut per_parent = HashMap::new();
        per_parent.insert(
            Key::single(Value::Int32(10248)),
            vec![
                detail_data(10248, 11),
                detail_data(10248, 42),
                detail_data(10248, 72),
            ],
        );
        children.insert("details".to_string(), per_parent);

        let graph = EntityAssembler::new(&plan).assemble(Materialized {
            roots: vec![order_data(10248)],
            children,
        });

        assert_eq!(graph.entry_count(), 4);
    }

    #[test]
    fn test_empty_graph() {
        let plan = test_plan();
        let graph = EntityAssembler::new(&plan).assemble(Materialized::default());
        assert!(graph.is_empty());
        assert_eq!(graph.entry_count(), 0);
    }
}
