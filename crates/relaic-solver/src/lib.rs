//! Dense MNA assembly and Gaussian elimination.
//!
//! Given a flattened node set (from `relaic-core`) and the resistor /
//! voltage-source stamps a device produces, this crate builds and solves
//! the conductance matrix for both DC and single-frequency AC analysis.

pub mod error;
pub mod linear;
pub mod mna;

pub use error::{Error, Result};
pub use mna::{MnaSolution, ResistorStamp, SourceStamp, solve_mna, solve_mna_ac};
