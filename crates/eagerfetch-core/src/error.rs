//! Core error types.

use thiserror::Error;

use crate::value::Key;

/// Errors raised while planning, translating, or materializing a query.
#[derive(Debug, Error)]
pub enum Error {
    /// The row source failed to execute a statement. Propagated as-is;
    /// retry policy belongs to the connection layer.
    #[error("query execution failed: {0}")]
    Execution(String),

    /// A split-path child row referenced a parent key that matched no root
    /// row. Indicates a race or a faulty correlation filter; never dropped.
    #[error("orphaned child row on path '{path}': parent key {parent_key} matched no root row")]
    OrphanedChild {
        /// Include path of the child query.
        path: String,
        /// The unmatched parent key value.
        parent_key: Key,
    },

    /// A row did not match the expected statement shape. Programming error.
    #[error("malformed row: {0}")]
    MalformedRow(String),

    /// Unknown entity name.
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    /// Unknown relation on an entity.
    #[error("unknown relation '{relation}' on entity '{entity}'")]
    UnknownRelation {
        /// Source entity name.
        entity: String,
        /// Relation name that failed to resolve.
        relation: String,
    },

    /// An entity or relation definition is inconsistent.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// The query references fields or paths that do not exist.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// A first-element query matched no rows.
    #[error("query returned no rows")]
    EmptyResult,
}
