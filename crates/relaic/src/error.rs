//! Top-level error kinds returned by the facade (`spec.md` §7).
//!
//! These only cover failures that abort a whole request. Per-component
//! problems (an ungrounded subcircuit, a singular network that had to be
//! shunted to zero) are recorded in [`crate::types::SolveOutcome::solve_errors`]
//! instead — they never reach here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelaicError {
    /// Malformed or incomplete request (missing probe terminals, unknown
    /// component, unknown measurement mode).
    #[error("{0}")]
    Validation(String),

    /// The circuit's topology can't be solved as given (multiple distinct
    /// AC source frequencies).
    #[error("{0}")]
    Topology(String),

    /// A solve that the engine does not degrade gracefully on failed
    /// (the ad hoc resistance-probe network).
    #[error("{0}")]
    Numerical(String),

    /// Save/load/delete I/O failure.
    #[error("{0}")]
    Storage(String),
}

impl RelaicError {
    /// HTTP-shaped status code for callers that expose this over a wire
    /// protocol, mirroring the original service's response codes.
    pub fn status_code(&self) -> u16 {
        match self {
            RelaicError::Validation(_) | RelaicError::Topology(_) => 400,
            RelaicError::Numerical(_) | RelaicError::Storage(_) => 500,
        }
    }
}
