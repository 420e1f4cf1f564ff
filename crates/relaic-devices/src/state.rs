//! The discrete state that is reconciled with the electrical solve on
//! each fixed-point iteration (`spec.md` §3, §4.6-4.9).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// `componentId -> energized`.
pub type ContactorStates = IndexMap<String, bool>;

/// `componentId -> per-output bit` for `plc` components.
pub type PlcOutputStates = IndexMap<String, Vec<bool>>;

/// Shared state machine for both `timer` and `time_timer` components —
/// the latter never sets `running`/`start_at`, only `output_closed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimerState {
    pub running: bool,
    #[serde(rename = "startAt")]
    pub start_at: Option<i64>,
    #[serde(rename = "outputClosed")]
    pub output_closed: bool,
    #[serde(rename = "remainingMs")]
    pub remaining_ms: i64,
}

impl Default for TimerState {
    fn default() -> Self {
        TimerState {
            running: false,
            start_at: None,
            output_closed: false,
            remaining_ms: 0,
        }
    }
}

/// `componentId -> timer state`, shared by `timer` and `time_timer`.
pub type TimerStates = IndexMap<String, TimerState>;
