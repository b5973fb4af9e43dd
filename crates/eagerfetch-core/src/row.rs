//! Row shapes and the row source seam.
//!
//! A generated statement produces flat rows: root columns first, then one
//! column span per include path (joined strategy), per standard outer-join
//! semantics. [`RowShape`] records that layout so downstream stages can
//! resolve identity keys and field values by index.

use std::sync::Arc;

use crate::error::Error;
use crate::sql::SelectStatement;
use crate::value::Value;

/// The column span of one entity within a flat row.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentShape {
    /// Entity name this segment materializes.
    pub entity: String,
    /// Index of the segment's first column within the row.
    pub offset: usize,
    /// Field names in segment order.
    pub fields: Vec<String>,
    /// Absolute row indexes of the identity columns, in column-definition
    /// order (tie-break order).
    pub key: Vec<usize>,
}

impl SegmentShape {
    /// Number of columns in this segment.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the segment has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Absolute row index of a field within this segment.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f == name)
            .map(|p| self.offset + p)
    }
}

/// Column layout of a statement's result rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RowShape {
    /// The root entity segment.
    pub root: SegmentShape,
    /// One segment per include path, in plan order.
    pub includes: Vec<(String, SegmentShape)>,
}

impl RowShape {
    /// Total number of columns per row.
    pub fn width(&self) -> usize {
        self.root.len() + self.includes.iter().map(|(_, s)| s.len()).sum::<usize>()
    }

    /// Get a segment by include path (None = root).
    pub fn segment(&self, path: Option<&str>) -> Option<&SegmentShape> {
        match path {
            None => Some(&self.root),
            Some(p) => self
                .includes
                .iter()
                .find(|(ip, _)| ip == p)
                .map(|(_, s)| s),
        }
    }

    /// Absolute row index of a field in the given segment.
    pub fn column_index(&self, path: Option<&str>, field: &str) -> Option<usize> {
        self.segment(path).and_then(|s| s.field_index(field))
    }
}

/// A lazy, single-pass sequence of raw result rows.
///
/// Finite and exhausted after one full pass; re-running a query means
/// re-issuing its statement. Dropping the cursor mid-stream abandons the
/// query; partially materialized state is discarded, never emitted.
pub type RowCursor = Box<dyn Iterator<Item = Result<Vec<Value>, Error>> + Send>;

/// The SQL execution collaborator seam.
///
/// Implementations execute a statement and yield its rows lazily. Execution
/// failures surface as [`Error::Execution`]; retrying is the connection
/// layer's concern, not this crate's.
pub trait RowSource {
    /// Execute a statement, returning a cursor over its rows.
    fn execute(&self, statement: &SelectStatement) -> Result<RowCursor, Error>;
}

/// A row shape shared across all rows of one statement execution.
pub type SharedShape = Arc<RowShape>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_shape() -> RowShape {
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
                    fields: vec!["order_id".into(), "product_id".into(), "quantity".into()],
                    key: vec![2, 3],
                },
            )],
        }
    }

    #[test]
    fn test_width() {
        assert_eq!(sample_shape().width(), 5);
    }

    #[test]
    fn test_segment_lookup() {
        let shape = sample_shape();
        assert_eq!(shape.segment(None).unwrap().entity, "Order");
        assert_eq!(shape.segment(Some("details")).unwrap().entity, "OrderDetail");
        assert!(shape.segment(Some("missing")).is_none());
    }

    #[test]
    fn test_column_index_is_absolute() {
        let shape = sample_shape();
        assert_eq!(shape.column_index(None, "customer_id"), Some(1));
        assert_eq!(shape.column_index(Some("details"), "quantity"), Some(4));
        assert_eq!(shape.column_index(Some("details"), "missing"), None);
    }
}
