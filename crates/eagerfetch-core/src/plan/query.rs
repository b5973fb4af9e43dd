//! Query IR for eager-loading queries.
//!
//! An [`IncludeQuery`] describes a root entity, the relation paths to
//! populate, explicit ordering, pagination, and the load strategy. Nested
//! relations use dot-notation paths (e.g., "orders", "orders.details").

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// An ordering term over a named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Field name to order by.
    pub field: String,
    /// Sort direction.
    pub direction: OrderDirection,
}

impl OrderSpec {
    /// Create ascending order.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Asc,
        }
    }

    /// Create descending order.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Desc,
        }
    }
}

/// Offset/limit pagination over an ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Number of leading elements to skip.
    pub offset: u64,
    /// Maximum number of elements to keep (None = unbounded).
    pub limit: Option<u64>,
}

impl Pagination {
    /// Take the first `n` elements.
    pub fn take(n: u64) -> Self {
        Self {
            offset: 0,
            limit: Some(n),
        }
    }

    /// Skip the first `n` elements.
    pub fn skip(n: u64) -> Self {
        Self {
            offset: n,
            limit: None,
        }
    }

    /// Skip `offset` elements then take `limit`.
    pub fn skip_take(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }
}

/// Filter expression over named fields of a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpr {
    /// Field equals value.
    Eq { field: String, value: Value },
    /// Field not equals value.
    Ne { field: String, value: Value },
    /// Field less than value.
    Lt { field: String, value: Value },
    /// Field less than or equal to value.
    Le { field: String, value: Value },
    /// Field greater than value.
    Gt { field: String, value: Value },
    /// Field greater than or equal to value.
    Ge { field: String, value: Value },
    /// Field is in a set of values.
    In { field: String, values: Vec<Value> },
    /// Field is null.
    IsNull { field: String },
    /// Field is not null.
    IsNotNull { field: String },
    /// All conditions must hold.
    And(Vec<FilterExpr>),
    /// At least one condition must hold.
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        FilterExpr::Eq {
            field: field.into(),
            value,
        }
    }

    /// Create a membership filter.
    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        FilterExpr::In {
            field: field.into(),
            values,
        }
    }

    /// Collect every field name referenced by this expression.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FilterExpr::Eq { field, .. }
            | FilterExpr::Ne { field, .. }
            | FilterExpr::Lt { field, .. }
            | FilterExpr::Le { field, .. }
            | FilterExpr::Gt { field, .. }
            | FilterExpr::Ge { field, .. }
            | FilterExpr::In { field, .. }
            | FilterExpr::IsNull { field }
            | FilterExpr::IsNotNull { field } => out.push(field),
            FilterExpr::And(exprs) | FilterExpr::Or(exprs) => {
                for e in exprs {
                    e.collect_fields(out);
                }
            }
        }
    }
}

/// Group flattened root entities by a field and keep one representative per
/// group, chosen by `pick_order`.
///
/// Picking "the first" of an otherwise-unordered group is ambiguous; callers
/// are expected to supply a total `pick_order` (or narrow the root set with a
/// filter first). The planner flags plans that do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPick {
    /// Root field to group by.
    pub key_field: String,
    /// Ordering that selects the representative within each group.
    pub pick_order: Vec<OrderSpec>,
}

impl GroupPick {
    /// Group by `key_field`, picking the representative by `pick_order`.
    pub fn new(key_field: impl Into<String>, pick_order: Vec<OrderSpec>) -> Self {
        Self {
            key_field: key_field.into(),
            pick_order,
        }
    }
}

/// Eager-loading strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadStrategy {
    /// Single query with one LEFT JOIN per include path; parents are
    /// de-duplicated client-side.
    Joined,
    /// One query for the root set plus one per include path, correlated
    /// client-side by parent key.
    Split,
}

/// An included relation path.
///
/// The `path` field uses dot-notation for nested relations:
/// - "orders" - include orders from the root entity
/// - "orders.details" - include details from orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationInclude {
    /// Dot-separated path to this relation.
    pub path: String,
    /// Optional filter for the related entities.
    pub filter: Option<FilterExpr>,
    /// Ordering for the related entities.
    pub order_by: Vec<OrderSpec>,
    /// Pagination applied to the include's own result set.
    pub pagination: Option<Pagination>,
}

impl RelationInclude {
    /// Create a new include for a relation path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filter: None,
            order_by: vec![],
            pagination: None,
        }
    }

    /// Set a filter for this include.
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Add ordering for this include.
    pub fn with_order(mut self, order: OrderSpec) -> Self {
        self.order_by.push(order);
        self
    }

    /// Set pagination for this include.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Get the relation name (last segment of the path).
    pub fn relation_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// Get the parent path (all segments except the last).
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rsplit_once('.').map(|(parent, _)| parent)
    }

    /// Check if this is a top-level include (no dots in path).
    pub fn is_top_level(&self) -> bool {
        !self.path.contains('.')
    }

    /// Get the depth of this include (number of dots + 1).
    pub fn depth(&self) -> usize {
        self.path.matches('.').count() + 1
    }
}

/// An eager-loading query over a root entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludeQuery {
    /// The root entity type to query.
    pub root_entity: String,
    /// Relation includes (nested relations use dot-notation paths).
    pub includes: Vec<RelationInclude>,
    /// Optional filter for the root entity.
    pub filter: Option<FilterExpr>,
    /// Explicit ordering over root fields.
    pub order_by: Vec<OrderSpec>,
    /// Pagination over the root entity sequence.
    pub pagination: Option<Pagination>,
    /// Optional group-and-pick step over the root sequence.
    pub group: Option<GroupPick>,
    /// Eager-loading strategy.
    pub strategy: LoadStrategy,
}

impl IncludeQuery {
    /// Create a new query for a root entity, joined strategy by default.
    pub fn new(root_entity: impl Into<String>) -> Self {
        Self {
            root_entity: root_entity.into(),
            includes: vec![],
            filter: None,
            order_by: vec![],
            pagination: None,
            group: None,
            strategy: LoadStrategy::Joined,
        }
    }

    /// Add a relation include.
    pub fn include(mut self, include: RelationInclude) -> Self {
        self.includes.push(include);
        self
    }

    /// Set a root filter.
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Add a root ordering term.
    pub fn order_by(mut self, order: OrderSpec) -> Self {
        self.order_by.push(order);
        self
    }

    /// Set root pagination.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Set a group-and-pick step.
    pub fn with_group(mut self, group: GroupPick) -> Self {
        self.group = Some(group);
        self
    }

    /// Set the load strategy.
    pub fn with_strategy(mut self, strategy: LoadStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
