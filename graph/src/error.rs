//! Graph error types.

use thiserror::Error;

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur while mutating or inspecting a tracked graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Unknown navigation property: {name}")]
    UnknownNavigationProperty { name: String },

    #[error("Navigation property already declared: {name}")]
    DuplicateNavigationProperty { name: String },

    #[error("Property {name} is a navigation link; use the reference or collection API")]
    NavigationPropertyWrite { name: String },

    #[error("No backing tracker for reference property: {name}")]
    UnresolvedReferenceTracker { name: String },

    #[error("Index {index} out of bounds for collection of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Navigation inspector failed: {message}")]
    Inspector { message: String },
}
