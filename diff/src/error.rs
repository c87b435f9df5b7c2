use thiserror::Error;

use retrace_graph::GraphError;

/// Result type for diff extraction.
pub type DiffResult<T> = Result<T, DiffError>;

/// Errors surfaced by change-set extraction.
#[derive(Debug, Error)]
pub enum DiffError {
    /// A graph operation failed while restoring, marking, or cloning.
    #[error("graph operation failed during change extraction: {0}")]
    Graph(#[from] GraphError),
}
