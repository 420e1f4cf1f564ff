//! DC/AC stamping, floating-node handling, and the discrete-state
//! evaluators that sit between one fixed-point iteration and the next.

pub mod discrete;
pub mod error;
pub mod floating;
pub mod measure;
pub mod model;
pub mod state;

pub use error::{Error, Result};
pub use model::{AcModel, DcModel, ac_frequencies, build_model_ac, build_model_dc};
pub use state::{ContactorStates, PlcOutputStates, TimerState, TimerStates};
