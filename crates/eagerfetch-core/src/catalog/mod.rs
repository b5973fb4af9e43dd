//! Catalog of entity and relation definitions.
//!
//! The catalog is an in-memory registry resolved against at plan time. There
//! is no persisted schema state in this subsystem; definitions are supplied
//! by the caller per catalog instance.

mod entity;
mod relation;

pub use entity::{ColumnDef, ColumnType, EntityDef};
pub use relation::{Cardinality, RelationDef};

use std::collections::HashMap;

use crate::error::Error;

/// Registry of entities and relations.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    entities: HashMap<String, EntityDef>,
    relations: Vec<RelationDef>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity definition.
    pub fn with_entity(mut self, entity: EntityDef) -> Result<Self, Error> {
        entity.validate().map_err(Error::InvalidSchema)?;
        self.entities.insert(entity.name.clone(), entity);
        Ok(self)
    }

    /// Register a relation definition.
    ///
    /// Both endpoints must already be registered and the join columns must
    /// exist on their entities.
    pub fn with_relation(mut self, relation: RelationDef) -> Result<Self, Error> {
        let from = self.entity(&relation.from_entity)?;
        if from.column(&relation.from_key).is_none() {
            return Err(Error::InvalidSchema(format!(
                "relation '{}' joins on '{}.{}' which is not defined",
                relation.name, relation.from_entity, relation.from_key
            )));
        }
        let to = self.entity(&relation.to_entity)?;
        if to.column(&relation.to_key).is_none() {
            return Err(Error::InvalidSchema(format!(
                "relation '{}' joins on '{}.{}' which is not defined",
                relation.name, relation.to_entity, relation.to_key
            )));
        }
        self.relations.push(relation);
        Ok(self)
    }

    /// Look up an entity by name.
    pub fn entity(&self, name: &str) -> Result<&EntityDef, Error> {
        self.entities
            .get(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    /// Look up a relation by source entity and relation name.
    pub fn relation_from(&self, entity: &str, name: &str) -> Result<&RelationDef, Error> {
        self.relations
            .iter()
            .find(|r| r.from_entity == entity && r.name == name)
            .ok_or_else(|| Error::UnknownRelation {
                entity: entity.to_string(),
                relation: name.to_string(),
            })
    }

    /// All relations whose source is the given entity.
    pub fn relations_from(&self, entity: &str) -> Vec<&RelationDef> {
        self.relations
            .iter()
            .filter(|r| r.from_entity == entity)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> Catalog {
        let customer = EntityDef::new("Customer", "customers")
            .with_key(&["id"])
            .with_column(ColumnDef::new("id", ColumnType::Text))
            .with_column(ColumnDef::new("city", ColumnType::Text));
        let order = EntityDef::new("Order", "orders")
            .with_key(&["order_id"])
            .with_column(ColumnDef::new("order_id", ColumnType::Int32))
            .with_column(ColumnDef::new("customer_id", ColumnType::Text));

        Catalog::new()
            .with_entity(customer)
            .unwrap()
            .with_entity(order)
            .unwrap()
            .with_relation(RelationDef::one_to_many(
                "orders",
                "Customer",
                "id",
                "Order",
                "customer_id",
            ))
            .unwrap()
    }

    #[test]
    fn test_entity_lookup() {
        let catalog = sample_catalog();
        assert!(catalog.entity("Customer").is_ok());
        assert!(matches!(
            catalog.entity("Missing"),
            Err(Error::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_relation_lookup() {
        let catalog = sample_catalog();
        let rel = catalog.relation_from("Customer", "orders").unwrap();
        assert_eq!(rel.to_entity, "Order");
        assert!(matches!(
            catalog.relation_from("Customer", "invoices"),
            Err(Error::UnknownRelation { .. })
        ));
    }

    #[test]
    fn test_relation_requires_registered_endpoints() {
        let result = Catalog::new().with_relation(RelationDef::one_to_many(
            "orders",
            "Customer",
            "id",
            "Order",
            "customer_id",
        ));
        assert!(matches!(result, Err(Error::UnknownEntity(_))));
    }

    #[test]
    fn test_relation_requires_join_columns() {
        let customer = EntityDef::new("Customer", "customers")
            .with_key(&["id"])
            .with_column(ColumnDef::new("id", ColumnType::Text));
        let order = EntityDef::new("Order", "orders")
            .with_key(&["order_id"])
            .with_column(ColumnDef::new("order_id", ColumnType::Int32));
        let result = Catalog::new()
            .with_entity(customer)
            .unwrap()
            .with_entity(order)
            .unwrap()
            .with_relation(RelationDef::one_to_many(
                "orders",
                "Customer",
                "id",
                "Order",
                "customer_id",
            ));
        assert!(matches!(result, Err(Error::InvalidSchema(_))));
    }
}
