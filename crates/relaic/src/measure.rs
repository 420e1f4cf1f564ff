//! The multimeter: ten measurement modes layered on top of one settled
//! solve (`spec.md` §4.11, supplemented catalogue in `SPEC_FULL.md` §8).

use num_complex::Complex;
use relaic_core::{Component, ComponentKind, terminal_key};
use relaic_devices::model::{DcModel, ac_frequencies, build_model_dc};
use relaic_solver::{ResistorStamp, SourceStamp};

use crate::driver::solve_network;
use crate::error::RelaicError;
use crate::types::{MeasureMode, MeasureRequest, MeasureResponse, SolveOutcome, SolveRequest};

fn node_of(outcome: &SolveOutcome, comp_id: &str, idx: usize) -> Option<usize> {
    outcome.terminal_nodes.get(&terminal_key(comp_id, idx)).copied()
}

fn find_component<'a>(outcome: &'a SolveOutcome, id: &str) -> Result<&'a Component, RelaicError> {
    outcome
        .components
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| RelaicError::Validation("component not found".to_string()))
}

fn require_ac(outcome: &SolveOutcome) -> Result<&[Complex<f64>], RelaicError> {
    outcome
        .ac_node_voltages
        .as_deref()
        .ok_or_else(|| RelaicError::Validation("no AC solution available".to_string()))
}

fn require_probe<'a>(
    a_ref: &'a Option<relaic_core::Terminal>,
    b_ref: &'a Option<relaic_core::Terminal>,
) -> Result<(&'a relaic_core::Terminal, &'a relaic_core::Terminal), RelaicError> {
    match (a_ref, b_ref) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(RelaicError::Validation("missing probe terminals".to_string())),
    }
}

fn probe_nodes(outcome: &SolveOutcome, a: &relaic_core::Terminal, b: &relaic_core::Terminal) -> Result<(usize, usize), RelaicError> {
    let na = node_of(outcome, &a.comp_id, a.index).ok_or_else(|| RelaicError::Validation("probe terminal not found".to_string()))?;
    let nb = node_of(outcome, &b.comp_id, b.index).ok_or_else(|| RelaicError::Validation("probe terminal not found".to_string()))?;
    Ok((na, nb))
}

/// Single-phase impedance lookup shared by `ac_current` and the `ac_power_*`
/// modes. `None` means "this component type has no defined current" and a
/// value of `Some(Ok(0.0))`-shaped early return (open switch) is signalled
/// by returning `Ok(None)` for the impedance with the caller treating that
/// as a literal zero current.
enum Impedance {
    Value(Complex<f64>),
    /// An open switch/push-button: current is defined and zero, not
    /// "undefined" — keep it distinct from `Unsupported`.
    OpenCircuit,
    Unsupported,
}

/// `switch_spdt` only has a defined AC impedance for `ac_current` — the
/// original's `ac_power_*` handler has no `switch_spdt` branch and falls
/// through to "unsupported", so `for_power` gates that one arm.
fn ac_impedance(comp: &Component, omega: f64, for_power: bool) -> Impedance {
    match comp.kind {
        ComponentKind::Resistor | ComponentKind::Motor | ComponentKind::Lamp => {
            Impedance::Value(Complex::new(comp.props.f64("value", 1.0), 0.0))
        }
        ComponentKind::Contactor | ComponentKind::Timer => {
            Impedance::Value(Complex::new(comp.props.f64("coilResistance", 120.0), 0.0))
        }
        ComponentKind::Inductor => {
            let l = comp.props.f64("value", 0.0).max(1e-12);
            Impedance::Value(Complex::new(0.0, omega * l))
        }
        ComponentKind::Capacitor => {
            let cap = comp.props.f64("value", 0.0).max(1e-12);
            Impedance::Value(Complex::new(0.0, -1.0 / (omega * cap)))
        }
        ComponentKind::Switch | ComponentKind::PushButton => {
            if comp.props.bool("closed", false) {
                Impedance::Value(Complex::new(0.01, 0.0))
            } else {
                Impedance::OpenCircuit
            }
        }
        ComponentKind::SwitchSpdt if !for_power => Impedance::Value(Complex::new(0.01, 0.0)),
        _ => Impedance::Unsupported,
    }
}

fn motor3ph_current(outcome: &SolveOutcome, comp: &Component, ac: &[Complex<f64>]) -> Option<Complex<f64>> {
    let n1 = node_of(outcome, &comp.id, 0)?;
    let n2 = node_of(outcome, &comp.id, 1)?;
    let n3 = node_of(outcome, &comp.id, 2)?;
    let z = Complex::new(comp.props.f64("value", 12.0), 0.0);
    let v12 = (ac[n1] - ac[n2]).norm();
    let v23 = (ac[n2] - ac[n3]).norm();
    let v31 = (ac[n3] - ac[n1]).norm();
    let v_ll = (v12 + v23 + v31) / 3.0;
    if comp.props.str("connection", "Y") == "Y" {
        let v_phase = Complex::new(v_ll / 3.0_f64.sqrt(), 0.0);
        Some(v_phase / z)
    } else {
        let line_current = Complex::new(v_ll, 0.0) / z;
        Some(line_current * 3.0_f64.sqrt())
    }
}

fn motor3ph_power(outcome: &SolveOutcome, comp: &Component, ac: &[Complex<f64>]) -> Option<Complex<f64>> {
    let n1 = node_of(outcome, &comp.id, 0)?;
    let n2 = node_of(outcome, &comp.id, 1)?;
    let n3 = node_of(outcome, &comp.id, 2)?;
    let z = Complex::new(comp.props.f64("value", 12.0), 0.0);
    let v12 = (ac[n1] - ac[n2]).norm();
    let v23 = (ac[n2] - ac[n3]).norm();
    let v31 = (ac[n3] - ac[n1]).norm();
    let v_ll = (v12 + v23 + v31) / 3.0;
    let (v_phase, i_phase) = if comp.props.str("connection", "Y") == "Y" {
        let v_phase = Complex::new(v_ll / 3.0_f64.sqrt(), 0.0);
        (v_phase, v_phase / z)
    } else {
        let v_phase = Complex::new(v_ll, 0.0);
        (v_phase, v_phase / z)
    };
    let s_phase = v_phase * i_phase.conj();
    Some(s_phase * 3.0)
}

fn one_frequency_omega(components: &[Component]) -> Result<f64, RelaicError> {
    let freqs = ac_frequencies(components);
    if freqs.len() > 1 {
        return Err(RelaicError::Topology("multiple AC frequencies are not supported".to_string()));
    }
    let hz = freqs.first().copied().unwrap_or(50) as f64;
    Ok(2.0 * std::f64::consts::PI * hz)
}

pub fn measure(req: &MeasureRequest) -> Result<MeasureResponse, RelaicError> {
    let solve_req = SolveRequest { components: req.components.clone(), wires: req.wires.clone(), sim_time: req.sim_time };
    let outcome = solve_network(&solve_req)?;

    match req.mode {
        MeasureMode::Voltage => {
            let (a, b) = require_probe(&req.a_ref, &req.b_ref)?;
            let (na, nb) = probe_nodes(&outcome, a, b)?;
            let value = outcome.dc_node_voltages[na] - outcome.dc_node_voltages[nb];
            Ok(MeasureResponse { value: Some(value) })
        }
        MeasureMode::AcVoltage => {
            let (a, b) = require_probe(&req.a_ref, &req.b_ref)?;
            let ac = require_ac(&outcome)?;
            let (na, nb) = probe_nodes(&outcome, a, b)?;
            Ok(MeasureResponse { value: Some((ac[na] - ac[nb]).norm()) })
        }
        MeasureMode::AcPhase => {
            let (a, b) = require_probe(&req.a_ref, &req.b_ref)?;
            let ac = require_ac(&outcome)?;
            let (na, nb) = probe_nodes(&outcome, a, b)?;
            let v = ac[na] - ac[nb];
            Ok(MeasureResponse { value: Some(v.im.atan2(v.re).to_degrees()) })
        }
        MeasureMode::Current => {
            let id = req.component_id.as_deref().ok_or_else(|| RelaicError::Validation("missing component id".to_string()))?;
            let comp = find_component(&outcome, id)?;
            let Some(n1) = node_of(&outcome, &comp.id, 0) else {
                return Ok(MeasureResponse { value: None });
            };
            let Some(n2) = node_of(&outcome, &comp.id, 1) else {
                return Ok(MeasureResponse { value: None });
            };
            let dv = outcome.dc_node_voltages[n1] - outcome.dc_node_voltages[n2];
            let value = match comp.kind {
                ComponentKind::VoltageSource => None,
                ComponentKind::Resistor | ComponentKind::Motor => Some(dv / comp.props.f64("value", 1.0)),
                ComponentKind::Lamp => Some(dv / comp.props.f64("value", 80.0)),
                ComponentKind::Switch => {
                    if comp.props.bool("closed", false) { Some(dv / 0.01) } else { Some(0.0) }
                }
                ComponentKind::Inductor => Some(dv / 0.01),
                ComponentKind::Contactor => Some(dv / comp.props.f64("coilResistance", 120.0)),
                _ => None,
            };
            Ok(MeasureResponse { value })
        }
        MeasureMode::AcCurrent => {
            let id = req.component_id.as_deref().ok_or_else(|| RelaicError::Validation("missing component id".to_string()))?;
            let comp = find_component(&outcome, id)?;
            let ac = require_ac(&outcome)?;
            let (Some(n1), Some(n2)) = (node_of(&outcome, &comp.id, 0), node_of(&outcome, &comp.id, 1)) else {
                return Ok(MeasureResponse { value: None });
            };
            if comp.kind == ComponentKind::Motor3ph {
                return Ok(MeasureResponse { value: motor3ph_current(&outcome, comp, ac).map(|i| i.norm()) });
            }
            if comp.kind == ComponentKind::TimeTimer {
                return Ok(MeasureResponse { value: None });
            }
            let omega = one_frequency_omega(&outcome.components)?;
            let v = ac[n1] - ac[n2];
            let value = match ac_impedance(comp, omega, false) {
                Impedance::Value(z) => Some((v / z).norm()),
                Impedance::OpenCircuit => Some(0.0),
                Impedance::Unsupported => None,
            };
            Ok(MeasureResponse { value })
        }
        MeasureMode::AcPowerP | MeasureMode::AcPowerQ | MeasureMode::AcPowerS | MeasureMode::AcPf => {
            let id = req.component_id.as_deref().ok_or_else(|| RelaicError::Validation("missing component id".to_string()))?;
            let comp = find_component(&outcome, id)?;
            let ac = require_ac(&outcome)?;
            let (Some(n1), Some(n2)) = (node_of(&outcome, &comp.id, 0), node_of(&outcome, &comp.id, 1)) else {
                return Ok(MeasureResponse { value: None });
            };
            if comp.kind == ComponentKind::TimeTimer {
                return Ok(MeasureResponse { value: None });
            }
            let s = if comp.kind == ComponentKind::Motor3ph {
                let Some(s) = motor3ph_power(&outcome, comp, ac) else {
                    return Ok(MeasureResponse { value: None });
                };
                s
            } else {
                let omega = one_frequency_omega(&outcome.components)?;
                let v = ac[n1] - ac[n2];
                match ac_impedance(comp, omega, true) {
                    Impedance::Value(z) => v * (v / z).conj(),
                    Impedance::OpenCircuit => Complex::new(0.0, 0.0),
                    Impedance::Unsupported => return Ok(MeasureResponse { value: None }),
                }
            };
            let value = match req.mode {
                MeasureMode::AcPowerP => Some(s.re),
                MeasureMode::AcPowerQ => Some(s.im),
                MeasureMode::AcPowerS => Some(s.norm()),
                MeasureMode::AcPf => {
                    let mag = s.norm();
                    if mag == 0.0 { None } else { Some(s.re / mag) }
                }
                _ => unreachable!(),
            };
            Ok(MeasureResponse { value })
        }
        MeasureMode::Resistance => {
            let (a, b) = require_probe(&req.a_ref, &req.b_ref)?;
            resistance(&outcome, a, b)
        }
    }
}

/// Rebuild the DC network with every existing source value zeroed, then
/// inject a synthetic 1A test source across the probe terminals and read
/// the equivalent resistance off its branch voltage (`spec.md` §4.11).
fn resistance(outcome: &SolveOutcome, a: &relaic_core::Terminal, b: &relaic_core::Terminal) -> Result<MeasureResponse, RelaicError> {
    let a_node = outcome
        .terminal_nodes
        .get(&terminal_key(&a.comp_id, a.index))
        .copied()
        .ok_or_else(|| RelaicError::Validation("probe terminal not found".to_string()))?;
    let b_node = outcome
        .terminal_nodes
        .get(&terminal_key(&b.comp_id, b.index))
        .copied()
        .ok_or_else(|| RelaicError::Validation("probe terminal not found".to_string()))?;

    let node_count = outcome.terminal_nodes.values().copied().max().unwrap_or(0) + 1;
    // `build_model_dc` only needs `node_of`/`node_count` — reuse the node
    // ids the solve already settled on rather than re-running union-find.
    let derived_topo = relaic_core::Topology {
        terminal_nodes: outcome.terminal_nodes.clone(),
        node_count,
        virtual_ground: false,
    };
    let model: DcModel = build_model_dc(
        &outcome.components,
        &derived_topo,
        &outcome.contactor_states,
        &outcome.timer_states,
        &outcome.plc_states,
    );

    let resistors: Vec<ResistorStamp<f64>> = model.resistors;
    let mut sources: Vec<SourceStamp<f64>> =
        model.sources.iter().map(|s| SourceStamp { id: s.id.clone(), n1: s.n1, n2: s.n2, value: 0.0 }).collect();
    sources.push(SourceStamp { id: "test".to_string(), n1: a_node, n2: b_node, value: 1.0 });

    let solution = relaic_solver::solve_mna(node_count, &resistors, &sources)
        .map_err(|e| RelaicError::Numerical(format!("could not solve the resistance probe network: {e}")))?;
    let current = solution.source_currents.get("test").copied().unwrap_or(0.0);
    if current.abs() < 1e-9 {
        return Ok(MeasureResponse { value: None });
    }
    Ok(MeasureResponse { value: Some(1.0 / current) })
}
