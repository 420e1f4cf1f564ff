//! Error types for the linear solver.

use thiserror::Error;

/// Errors that can occur while assembling or solving an MNA system.
#[derive(Debug, Error)]
pub enum Error {
    /// The matrix dimensions did not match the expected shape.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The system's pivot fell below [`crate::linear::PIVOT_EPSILON`]
    /// during elimination.
    #[error("matrix is singular")]
    SingularMatrix,
}

/// Result type for solver operations.
pub type Result<T> = std::result::Result<T, Error>;
