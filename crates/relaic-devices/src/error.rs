//! Error types for model stamping.

use thiserror::Error;

/// Errors that can arise while building or solving a DC/AC model.
#[derive(Debug, Error)]
pub enum Error {
    /// More than one distinct AC frequency was requested across the
    /// circuit's voltage sources.
    #[error("multiple AC frequencies are not supported")]
    MultipleAcFrequencies,

    /// The solver reported a singular matrix even after shunting.
    #[error("network is singular: {0}")]
    Singular(#[from] relaic_solver::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
