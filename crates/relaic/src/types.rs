//! Wire-shaped request/response types (`spec.md` §6).

use indexmap::IndexMap;
use num_complex::Complex;
use relaic_core::{Component, Terminal, Wire};
use relaic_devices::{ContactorStates, PlcOutputStates, TimerStates};
use relaic_plc::PlcMeta;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexJson {
    pub re: f64,
    pub im: f64,
}

impl From<Complex<f64>> for ComplexJson {
    fn from(z: Complex<f64>) -> Self {
        ComplexJson { re: z.re, im: z.im }
    }
}

/// A `simulate`/`measure` request body: the static circuit plus an
/// optional simulation clock (falls back to wall-clock millis).
#[derive(Debug, Clone, Deserialize)]
pub struct SolveRequest {
    pub components: Vec<Component>,
    #[serde(default)]
    pub wires: Vec<Wire>,
    #[serde(rename = "simTime", default)]
    pub sim_time: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkDebug {
    pub nodes: usize,
    pub sources: usize,
    pub elements: usize,
    pub floating: usize,
    pub inactive: usize,
    pub active: usize,
    #[serde(rename = "virtualGround")]
    pub virtual_ground: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DebugInfo {
    pub dc: NetworkDebug,
    pub ac: NetworkDebug,
}

/// Everything [`crate::driver::solve_network`] produces — the settled
/// discrete state and both electrical solves. [`crate::simulate_circuit`]
/// layers reporting on top of this; [`crate::measure::measure`] reads
/// straight from it.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub components: Vec<Component>,
    pub terminal_nodes: IndexMap<String, usize>,
    pub contactor_states: ContactorStates,
    pub timer_states: TimerStates,
    pub plc_states: PlcOutputStates,
    pub plc_meta: IndexMap<String, PlcMeta>,
    pub dc_node_voltages: Vec<f64>,
    pub dc_source_currents: IndexMap<String, f64>,
    pub ac_node_voltages: Option<Vec<Complex<f64>>>,
    pub ac_source_currents: IndexMap<String, Complex<f64>>,
    pub solve_errors: IndexMap<String, String>,
    pub debug_info: DebugInfo,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Solution {
    #[serde(rename = "nodeVoltages")]
    pub node_voltages: Vec<f64>,
    #[serde(rename = "terminalNodes")]
    pub terminal_nodes: IndexMap<String, usize>,
    #[serde(rename = "sourceCurrents")]
    pub source_currents: IndexMap<String, f64>,
    #[serde(rename = "acNodeVoltages")]
    pub ac_node_voltages: Vec<ComplexJson>,
    #[serde(rename = "acSourceCurrents")]
    pub ac_source_currents: IndexMap<String, ComplexJson>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulateResponse {
    pub solution: Solution,
    #[serde(rename = "contactorStates")]
    pub contactor_states: ContactorStates,
    #[serde(rename = "lampLit")]
    pub lamp_lit: IndexMap<String, bool>,
    #[serde(rename = "motorRunning")]
    pub motor_running: IndexMap<String, bool>,
    #[serde(rename = "motor3phDirection")]
    pub motor3ph_direction: IndexMap<String, String>,
    pub faults: IndexMap<String, String>,
    #[serde(rename = "solveErrors")]
    pub solve_errors: IndexMap<String, String>,
    #[serde(rename = "timerStates")]
    pub timer_states: TimerStates,
    #[serde(rename = "plcStates")]
    pub plc_states: PlcOutputStates,
    #[serde(rename = "plcMeta")]
    pub plc_meta: IndexMap<String, PlcMeta>,
    #[serde(rename = "debugInfo")]
    pub debug_info: DebugInfo,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureMode {
    Voltage,
    AcVoltage,
    AcPhase,
    Current,
    AcCurrent,
    AcPowerP,
    AcPowerQ,
    AcPowerS,
    AcPf,
    Resistance,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeasureRequest {
    pub components: Vec<Component>,
    #[serde(default)]
    pub wires: Vec<Wire>,
    #[serde(rename = "simTime", default)]
    pub sim_time: Option<i64>,
    pub mode: MeasureMode,
    #[serde(rename = "aRef", default)]
    pub a_ref: Option<Terminal>,
    #[serde(rename = "bRef", default)]
    pub b_ref: Option<Terminal>,
    #[serde(rename = "componentId", default)]
    pub component_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MeasureResponse {
    pub value: Option<f64>,
}
