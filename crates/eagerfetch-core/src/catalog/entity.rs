//! Entity definitions.

use serde::{Deserialize, Serialize};

/// Scalar column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Boolean column.
    Bool,
    /// 32-bit signed integer column.
    Int32,
    /// 64-bit signed integer column.
    Int64,
    /// 64-bit floating point column.
    Float64,
    /// UTF-8 text column.
    Text,
    /// Binary column.
    Bytes,
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name (unique within the entity).
    pub name: String,
    /// Column type.
    pub column_type: ColumnType,
}

impl ColumnDef {
    /// Create a new column definition.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// An entity definition (table schema plus identity).
///
/// The identity may be composite; `key` lists the key columns in
/// column-definition order, which is also the tie-break order used when
/// normalizing row ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Entity name (unique within the catalog).
    pub name: String,
    /// Backing table name.
    pub table: String,
    /// Identity column names, in column-definition order.
    pub key: Vec<String>,
    /// Column definitions.
    pub columns: Vec<ColumnDef>,
}

impl EntityDef {
    /// Create a new entity definition with no columns.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            key: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Set the identity columns.
    pub fn with_key(mut self, key: &[&str]) -> Self {
        self.key = key.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Add a column to the entity.
    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column within the definition order.
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Check that every key column is defined.
    pub fn validate(&self) -> Result<(), String> {
        if self.key.is_empty() {
            return Err(format!("entity '{}' has no identity columns", self.name));
        }
        for k in &self.key {
            if self.column(k).is_none() {
                return Err(format!(
                    "entity '{}' lists key column '{}' which is not defined",
                    self.name, k
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_detail() -> EntityDef {
        EntityDef::new("OrderDetail", "order_details")
            .with_key(&["order_id", "product_id"])
            .with_column(ColumnDef::new("order_id", ColumnType::Int32))
            .with_column(ColumnDef::new("product_id", ColumnType::Int32))
            .with_column(ColumnDef::new("quantity", ColumnType::Int32))
    }

    #[test]
    fn test_composite_key_definition() {
        let def = order_detail();
        assert_eq!(def.key, vec!["order_id", "product_id"]);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_column_lookup() {
        let def = order_detail();
        assert!(def.column("quantity").is_some());
        assert_eq!(def.column_position("product_id"), Some(1));
        assert!(def.column("missing").is_none());
    }

    #[test]
    fn test_validate_rejects_unknown_key_column() {
        let def = EntityDef::new("Bad", "bad")
            .with_key(&["id"])
            .with_column(ColumnDef::new("name", ColumnType::Text));
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_key() {
        let def = EntityDef::new("Bad", "bad").with_column(ColumnDef::new("id", ColumnType::Int32));
        assert!(def.validate().is_err());
    }
}
