//! Relation definitions between entities.

use serde::{Deserialize, Serialize};

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// One-to-one relation (unique foreign key).
    OneToOne,
    /// One-to-many relation (foreign key on the many side).
    OneToMany,
}

/// A relation definition between two entities.
///
/// Relations join on a single column pair: `from_key` on the source entity
/// equals `to_key` on the target entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDef {
    /// Relation name (unique per source entity).
    pub name: String,
    /// Source entity name.
    pub from_entity: String,
    /// Join column on the source entity.
    pub from_key: String,
    /// Target entity name.
    pub to_entity: String,
    /// Join column on the target entity (the foreign key for one-to-many).
    pub to_key: String,
    /// Relation cardinality.
    pub cardinality: Cardinality,
}

impl RelationDef {
    /// Create a one-to-one relation.
    pub fn one_to_one(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_key: impl Into<String>,
        to_entity: impl Into<String>,
        to_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            from_key: from_key.into(),
            to_entity: to_entity.into(),
            to_key: to_key.into(),
            cardinality: Cardinality::OneToOne,
        }
    }

    /// Create a one-to-many relation.
    pub fn one_to_many(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_key: impl Into<String>,
        to_entity: impl Into<String>,
        to_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            from_key: from_key.into(),
            to_entity: to_entity.into(),
            to_key: to_key.into(),
            cardinality: Cardinality::OneToMany,
        }
    }

    /// Get the inverse relation (swapping source and target).
    pub fn inverse(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from_entity: self.to_entity.clone(),
            from_key: self.to_key.clone(),
            to_entity: self.from_entity.clone(),
            to_key: self.from_key.clone(),
            cardinality: self.cardinality,
        }
    }
}
