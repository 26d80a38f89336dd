//! Error types for the query engine.

use thiserror::Error;

/// Errors that can occur in the query engine.
///
/// Entry store operations and wildcard expansion never fail; these errors
/// come from API misuse and from host-supplied hooks.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Model error from the layer-query crate.
    #[error("query model error: {0}")]
    Model(#[from] layer_query::QueryError),

    /// No handler is registered for the layer.
    #[error("Handler not registered for layer: {0}")]
    HandlerNotRegistered(String),

    /// The host persistence hook failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Result type for query engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
