//! Error types for the combinator crate.

use layer_query::QueryError;
use layer_query_engine::EngineError;

/// Result type for combinator operations.
pub type CombinatorResult<T> = Result<T, CombinatorError>;

/// Errors raised by the combinator controller.
///
/// Building and reconciling trees never fails; these cover API misuse.
#[derive(Debug, thiserror::Error)]
pub enum CombinatorError {
    /// Query model error, e.g. a bad pivot order.
    #[error("query model error: {0}")]
    Model(#[from] QueryError),

    /// Query engine error.
    #[error("query engine error: {0}")]
    Engine(#[from] EngineError),

    /// No node with this id exists in the current tree.
    #[error("unknown tree node: {0}")]
    UnknownNode(String),

    /// The operation needs a tree, but none has been built.
    #[error("no pivot tree has been built")]
    NotBuilt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CombinatorError::UnknownNode("root/ships".to_string());
        assert_eq!(err.to_string(), "unknown tree node: root/ships");
        assert_eq!(CombinatorError::NotBuilt.to_string(), "no pivot tree has been built");
    }

    #[test]
    fn test_from_model_error() {
        let err: CombinatorError = QueryError::EmptyPivotOrder.into();
        assert!(matches!(err, CombinatorError::Model(QueryError::EmptyPivotOrder)));
    }
}
