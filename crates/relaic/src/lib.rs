//! The didactic circuit simulator (`spec.md` OVERVIEW).
//!
//! [`simulate_circuit`] runs the fixed-point DC/AC driver
//! ([`driver::solve_network`]) to a settled discrete state, then layers
//! human-facing readouts ([`report`]) on top. [`measure::measure`] reads
//! a single probe or component off the same settled solve without the
//! reporting pass.

pub mod driver;
pub mod error;
pub mod measure;
pub mod report;
pub mod types;

pub use error::RelaicError;
pub use measure::measure;
pub use types::{
    ComplexJson, DebugInfo, MeasureMode, MeasureRequest, MeasureResponse, NetworkDebug, SimulateResponse, Solution,
    SolveOutcome, SolveRequest,
};

/// Solve a circuit to its settled discrete state plus both electrical
/// solves, then report lamp/motor/fault/direction readouts on top
/// (`spec.md` §4.11-§4.12).
pub fn simulate_circuit(req: &SolveRequest) -> Result<SimulateResponse, RelaicError> {
    let outcome = driver::solve_network(req)?;
    let topo = relaic_core::Topology {
        terminal_nodes: outcome.terminal_nodes.clone(),
        node_count: outcome.dc_node_voltages.len(),
        virtual_ground: outcome.debug_info.dc.virtual_ground,
    };
    let dc = &outcome.dc_node_voltages;
    let ac_slice: &[num_complex::Complex<f64>] = outcome.ac_node_voltages.as_deref().unwrap_or(&[]);

    let lamp_lit = report::lamp_lit(&outcome.components, &topo, dc, ac_slice);
    let motor_running = report::motor_running(&outcome.components, &topo, dc, ac_slice);
    let faults = report::faults(&outcome.components, &topo, dc, ac_slice);
    let motor3ph_direction = report::motor3ph_direction(&outcome.components, &topo, outcome.ac_node_voltages.as_deref());

    Ok(SimulateResponse {
        solution: Solution {
            node_voltages: outcome.dc_node_voltages,
            terminal_nodes: outcome.terminal_nodes,
            source_currents: outcome.dc_source_currents,
            ac_node_voltages: outcome.ac_node_voltages.map(|vs| vs.into_iter().map(ComplexJson::from).collect()).unwrap_or_default(),
            ac_source_currents: outcome.ac_source_currents.into_iter().map(|(k, v)| (k, ComplexJson::from(v))).collect(),
        },
        contactor_states: outcome.contactor_states,
        lamp_lit,
        motor_running,
        motor3ph_direction,
        faults,
        solve_errors: outcome.solve_errors,
        timer_states: outcome.timer_states,
        plc_states: outcome.plc_states,
        plc_meta: outcome.plc_meta,
        debug_info: outcome.debug_info,
    })
}
