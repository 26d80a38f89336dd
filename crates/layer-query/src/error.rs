//! Error types for the query entry model.

use thiserror::Error;

use crate::pivot::Pivot;

/// Errors that can occur when building model values from untrusted input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A pivot name did not match `layer`, `area` or `filter`.
    #[error("invalid pivot: {0}")]
    InvalidPivot(String),

    /// The same pivot appears more than once in a pivot order.
    #[error("duplicate pivot in order: {0}")]
    DuplicatePivot(Pivot),

    /// A pivot order must name at least one pivot.
    #[error("empty pivot order")]
    EmptyPivotOrder,
}

/// Result type for model operations.
pub type QueryResult<T> = std::result::Result<T, QueryError>;
