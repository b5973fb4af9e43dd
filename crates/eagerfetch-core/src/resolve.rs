//! Identity key resolution from flat rows.

use crate::error::Error;
use crate::row::RowShape;
use crate::value::{Key, Value};

/// Extracts parent and child identity keys from flat rows.
///
/// Pure over the bound shape; the only failure mode is a row that does not
/// match the shape, which is a programming error upstream.
pub struct KeyResolver<'a> {
    shape: &'a RowShape,
}

impl<'a> KeyResolver<'a> {
    /// Bind a resolver to a row shape.
    pub fn new(shape: &'a RowShape) -> Self {
        Self { shape }
    }

    /// Verify a row matches the shape's width.
    pub fn check_width(&self, row: &[Value]) -> Result<(), Error> {
        if row.len() != self.shape.width() {
            return Err(Error::MalformedRow(format!(
                "row has {} columns, statement shape has {}",
                row.len(),
                self.shape.width()
            )));
        }
        Ok(())
    }

    /// Resolve the root entity's identity key. Root identity columns are
    /// never null.
    pub fn root_key(&self, row: &[Value]) -> Result<Key, Error> {
        let mut parts = Vec::with_capacity(self.shape.root.key.len());
        for &index in &self.shape.root.key {
            let value = row
                .get(index)
                .ok_or_else(|| Error::MalformedRow(format!("missing column {}", index)))?;
            if value.is_null() {
                return Err(Error::MalformedRow(format!(
                    "null root identity column at index {}",
                    index
                )));
            }
            parts.push(value.clone());
        }
        Ok(Key(parts))
    }

    /// Resolve the child identity key for an include path.
    ///
    /// Returns `None` when the outer-joined child side is entirely null (no
    /// child matched this parent row). A partially null composite key means
    /// the row does not come from a well-formed outer join.
    pub fn child_key(&self, row: &[Value], path: &str) -> Result<Option<Key>, Error> {
        let segment = self
            .shape
            .segment(Some(path))
            .ok_or_else(|| Error::MalformedRow(format!("no segment for path '{}'", path)))?;

        let mut parts = Vec::with_capacity(segment.key.len());
        let mut nulls = 0;
        for &index in &segment.key {
            let value = row
                .get(index)
                .ok_or_else(|| Error::MalformedRow(format!("missing column {}", index)))?;
            if value.is_null() {
                nulls += 1;
            }
            parts.push(value.clone());
        }

        if nulls == segment.key.len() {
            return Ok(None);
        }
        if nulls > 0 {
            return Err(Error::MalformedRow(format!(
                "partially null identity for path '{}'",
                path
            )));
        }
        Ok(Some(Key(parts)))
    }

    /// Resolve both keys of a row for one include path.
    pub fn resolve(&self, row: &[Value], path: &str) -> Result<(Key, Option<Key>), Error> {
        Ok((self.root_key(row)?, self.child_key(row, path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::SegmentShape;

    fn shape() -> RowShape {
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
    fn test_resolve_parent_and_child() {
        let shape = shape();
        let resolver = KeyResolver::new(&shape);
        let row = vec![
            Value::Int32(10248),
            Value::String("VINET".into()),
            Value::Int32(10248),
            Value::Int32(11),
            Value::Int32(12),
        ];
        let (parent, child) = resolver.resolve(&row, "details").unwrap();
        assert_eq!(parent, Key(vec![Value::Int32(10248)]));
        assert_eq!(
            child,
            Some(Key(vec![Value::Int32(10248), Value::Int32(11)]))
        );
    }

    #[test]
    fn test_outer_join_miss_yields_absent_child() {
        let shape = shape();
        let resolver = KeyResolver::new(&shape);
        let row = vec![
            Value::Int32(11074),
            Value::String("SIMOB".into()),
            Value::Null,
            Value::Null,
            Value::Null,
        ];
        let (_, child) = resolver.resolve(&row, "details").unwrap();
        assert_eq!(child, None);
    }

    #[test]
    fn test_partially_null_composite_key_is_malformed() {
        let shape = shape();
        let resolver = KeyResolver::new(&shape);
        let row = vec![
            Value::Int32(10248),
            Value::Null,
            Value::Int32(10248),
            Value::Null,
            Value::Null,
        ];
        assert!(matches!(
            resolver.child_key(&row, "details"),
            Err(Error::MalformedRow(_))
        ));
    }

    #[test]
    fn test_null_root_identity_is_malformed() {
        let shape = shape();
        let resolver = KeyResolver::new(&shape);
        let row = vec![Value::Null, Value::Null, Value::Null, Value::Null, Value::Null];
        assert!(matches!(resolver.root_key(&row), Err(Error::MalformedRow(_))));
    }

    #[test]
    fn test_width_check() {
        let shape = shape();
        let resolver = KeyResolver::new(&shape);
        assert!(resolver.check_width(&[const { Value::Null }; 5]).is_ok());
        assert!(matches!(
            resolver.check_width(&[const { Value::Null }; 3]),
            Err(Error::MalformedRow(_))
        ));
    }
}
