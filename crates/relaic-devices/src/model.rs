//! DC and AC model stamping (`spec.md` §4.3).
//!
//! Each component type contributes zero or more [`ResistorStamp`]s
//! (conductive/admittive elements) and [`SourceStamp`]s (ideal sources)
//! to the network, driven by the component's props and the current
//! discrete state. Terminals whose node is unmapped are skipped
//! silently, matching the original engine.

use num_complex::Complex;
use relaic_core::{Component, ComponentKind, Topology};
use relaic_solver::{ResistorStamp, SourceStamp};

use crate::state::{ContactorStates, PlcOutputStates, TimerStates};

pub const CLOSED_SWITCH_OHMS: f64 = 0.01;
pub const DEFAULT_COIL_OHMS: f64 = 120.0;
pub const INDUCTOR_DC_OHMS: f64 = 0.01;
pub const MIN_REACTIVE_VALUE: f64 = 1e-12;

/// A DC (real-valued) network, ready for [`relaic_solver::solve_mna`].
#[derive(Debug, Clone, Default)]
pub struct DcModel {
    pub resistors: Vec<ResistorStamp<f64>>,
    pub sources: Vec<SourceStamp<f64>>,
}

/// An AC (phasor) network, ready for [`relaic_solver::solve_mna_ac`].
///
/// `topology` may carry extra nodes beyond the static topology — one per
/// Y-connected `motor_3ph`'s internal neutral — so it is returned
/// alongside the model rather than assumed identical to the input.
#[derive(Debug, Clone, Default)]
pub struct AcModel {
    pub resistors: Vec<ResistorStamp<Complex<f64>>>,
    pub sources: Vec<SourceStamp<Complex<f64>>>,
}

fn node_of(topo: &Topology, comp: &Component, idx: usize) -> Option<usize> {
    topo.node_of(&comp.id, idx)
}

/// Collect the distinct AC frequencies requested by voltage sources.
/// `None` when no AC source is present (falls back to a DC-only solve).
pub fn ac_frequencies(components: &[Component]) -> Vec<i64> {
    let mut freqs = Vec::new();
    for comp in components {
        if comp.kind != ComponentKind::VoltageSource {
            continue;
        }
        let supply = comp.props.str("supplyType", "DC");
        if supply == "DC" {
            continue;
        }
        let hz = comp.props.f64("frequency", 50.0) as i64;
        if !freqs.contains(&hz) {
            freqs.push(hz);
        }
    }
    freqs
}

pub fn build_model_dc(
    components: &[Component],
    topo: &Topology,
    contactor_states: &ContactorStates,
    timer_states: &TimerStates,
    plc_states: &PlcOutputStates,
) -> DcModel {
    let mut model = DcModel::default();
    for comp in components {
        stamp_dc(comp, topo, contactor_states, timer_states, plc_states, &mut model);
    }
    model
}

fn stamp_dc(
    comp: &Component,
    topo: &Topology,
    contactor_states: &ContactorStates,
    timer_states: &TimerStates,
    plc_states: &PlcOutputStates,
    model: &mut DcModel,
) {
    match comp.kind {
        ComponentKind::Resistor => stamp_fixed_r(comp, topo, 1.0, &mut model.resistors),
        ComponentKind::Motor => stamp_fixed_r(comp, topo, 10.0, &mut model.resistors),
        ComponentKind::Lamp => stamp_fixed_r(comp, topo, 80.0, &mut model.resistors),
        ComponentKind::Switch | ComponentKind::PushButton => {
            if comp.props.bool("closed", false)
                && let (Some(n1), Some(n2)) = (node_of(topo, comp, 0), node_of(topo, comp, 1))
            {
                model.resistors.push(ResistorStamp {
                    n1,
                    n2,
                    value: CLOSED_SWITCH_OHMS,
                });
            }
        }
        ComponentKind::SwitchSpdt => {
            let contact = if comp.props.str("position", "up") == "up" { 1 } else { 2 };
            if let (Some(n1), Some(n2)) = (node_of(topo, comp, 0), node_of(topo, comp, contact)) {
                model.resistors.push(ResistorStamp {
                    n1,
                    n2,
                    value: CLOSED_SWITCH_OHMS,
                });
            }
        }
        ComponentKind::Inductor => stamp_fixed_r(comp, topo, INDUCTOR_DC_OHMS, &mut model.resistors),
        ComponentKind::Capacitor | ComponentKind::Motor3ph => {}
        ComponentKind::Contactor => stamp_contactor_dc(comp, topo, contactor_states, model),
        ComponentKind::Timer | ComponentKind::TimeTimer => {
            stamp_timer_like_dc(comp, topo, timer_states, model)
        }
        ComponentKind::Plc => stamp_plc_dc(comp, topo, plc_states, model),
        ComponentKind::VoltageSource => stamp_voltage_source_dc(comp, topo, model),
        ComponentKind::Node | ComponentKind::Ground => {}
    }
}

fn stamp_fixed_r(comp: &Component, topo: &Topology, default: f64, out: &mut Vec<ResistorStamp<f64>>) {
    if let (Some(n1), Some(n2)) = (node_of(topo, comp, 0), node_of(topo, comp, 1)) {
        out.push(ResistorStamp {
            n1,
            n2,
            value: comp.props.f64("value", default),
        });
    }
}

fn stamp_contactor_dc(
    comp: &Component,
    topo: &Topology,
    contactor_states: &ContactorStates,
    model: &mut DcModel,
) {
    if let (Some(n1), Some(n2)) = (node_of(topo, comp, 0), node_of(topo, comp, 1)) {
        model.resistors.push(ResistorStamp {
            n1,
            n2,
            value: comp.props.f64("coilResistance", DEFAULT_COIL_OHMS),
        });
    }
    let energized = contactor_states.get(&comp.id).copied().unwrap_or(false);
    stamp_contactor_poles(comp, topo, energized, &mut model.resistors);
}

fn stamp_contactor_poles(
    comp: &Component,
    topo: &Topology,
    energized: bool,
    out: &mut Vec<ResistorStamp<f64>>,
) {
    let poles = comp.props.poles();
    let changeover = comp.props.str("contactType", "standard") == "changeover";
    let k = if changeover { 3 } else { 2 };
    for (i, pole) in poles.iter().enumerate() {
        let base = 2 + k * i;
        if changeover {
            let (common, no, nc) = (base, base + 1, base + 2);
            let target = if energized { no } else { nc };
            if let (Some(n1), Some(n2)) = (node_of(topo, comp, common), node_of(topo, comp, target)) {
                out.push(ResistorStamp {
                    n1,
                    n2,
                    value: CLOSED_SWITCH_OHMS,
                });
            }
        } else {
            let (common, contact) = (base, base + 1);
            let closed = (pole == "NO" && energized) || (pole == "NC" && !energized);
            if closed
                && let (Some(n1), Some(n2)) = (node_of(topo, comp, common), node_of(topo, comp, contact))
            {
                out.push(ResistorStamp {
                    n1,
                    n2,
                    value: CLOSED_SWITCH_OHMS,
                });
            }
        }
    }
}

fn stamp_timer_like_dc(
    comp: &Component,
    topo: &Topology,
    timer_states: &TimerStates,
    model: &mut DcModel,
) {
    if comp.kind == ComponentKind::Timer
        && let (Some(n1), Some(n2)) = (node_of(topo, comp, 0), node_of(topo, comp, 1))
    {
        model.resistors.push(ResistorStamp {
            n1,
            n2,
            value: comp.props.f64("coilResistance", DEFAULT_COIL_OHMS),
        });
    }
    let (common, no, nc) = if comp.kind == ComponentKind::Timer {
        (2, 3, 4)
    } else {
        (0, 1, 2)
    };
    let output_closed = timer_states
        .get(&comp.id)
        .map(|s| s.output_closed)
        .unwrap_or(false);
    let target = if output_closed { no } else { nc };
    if let (Some(n1), Some(n2)) = (node_of(topo, comp, common), node_of(topo, comp, target)) {
        model.resistors.push(ResistorStamp {
            n1,
            n2,
            value: CLOSED_SWITCH_OHMS,
        });
    }
}

fn stamp_plc_dc(comp: &Component, topo: &Topology, plc_states: &PlcOutputStates, model: &mut DcModel) {
    let inputs = comp.props.clamped_i64("inputs", 4, 1, 64);
    let Some(bits) = plc_states.get(&comp.id) else {
        return;
    };
    for (i, &bit) in bits.iter().enumerate() {
        if !bit {
            continue;
        }
        let output_terminal = 2 + inputs + i;
        if let (Some(n1), Some(n2)) = (node_of(topo, comp, 1), node_of(topo, comp, output_terminal)) {
            model.resistors.push(ResistorStamp {
                n1,
                n2,
                value: CLOSED_SWITCH_OHMS,
            });
        }
    }
}

fn stamp_voltage_source_dc(comp: &Component, topo: &Topology, model: &mut DcModel) {
    if comp.props.str("supplyType", "DC") != "DC" {
        return;
    }
    if let (Some(n1), Some(n2)) = (node_of(topo, comp, 0), node_of(topo, comp, 1)) {
        model.sources.push(SourceStamp {
            id: comp.id.clone(),
            n1,
            n2,
            value: comp.props.f64("value", 0.0),
        });
    }
}

// --- AC ---------------------------------------------------------------

pub fn build_model_ac(
    components: &[Component],
    topo: &Topology,
    contactor_states: &ContactorStates,
    timer_states: &TimerStates,
    plc_states: &PlcOutputStates,
    frequency_hz: f64,
) -> (AcModel, Topology) {
    let mut topo = topo.clone();
    let omega = 2.0 * std::f64::consts::PI * frequency_hz;
    let mut model = AcModel::default();
    for comp in components {
        stamp_ac(
            comp,
            &mut topo,
            contactor_states,
            timer_states,
            plc_states,
            omega,
            &mut model,
        );
    }
    (model, topo)
}

fn c(re: f64) -> Complex<f64> {
    Complex::new(re, 0.0)
}

fn stamp_ac(
    comp: &Component,
    topo: &mut Topology,
    contactor_states: &ContactorStates,
    timer_states: &TimerStates,
    plc_states: &PlcOutputStates,
    omega: f64,
    model: &mut AcModel,
) {
    match comp.kind {
        ComponentKind::Resistor => stamp_fixed_z(comp, topo, 1.0, &mut model.resistors),
        ComponentKind::Motor => stamp_fixed_z(comp, topo, 10.0, &mut model.resistors),
        ComponentKind::Lamp => stamp_fixed_z(comp, topo, 80.0, &mut model.resistors),
        ComponentKind::Switch | ComponentKind::PushButton => {
            if comp.props.bool("closed", false)
                && let (Some(n1), Some(n2)) = (node_of(topo, comp, 0), node_of(topo, comp, 1))
            {
                model.resistors.push(ResistorStamp {
                    n1,
                    n2,
                    value: c(CLOSED_SWITCH_OHMS),
                });
            }
        }
        ComponentKind::SwitchSpdt => {
            let contact = if comp.props.str("position", "up") == "up" { 1 } else { 2 };
            if let (Some(n1), Some(n2)) = (node_of(topo, comp, 0), node_of(topo, comp, contact)) {
                model.resistors.push(ResistorStamp {
                    n1,
                    n2,
                    value: c(CLOSED_SWITCH_OHMS),
                });
            }
        }
        ComponentKind::Inductor => {
            let l = comp.props.f64("value", 0.0).max(MIN_REACTIVE_VALUE);
            if let (Some(n1), Some(n2)) = (node_of(topo, comp, 0), node_of(topo, comp, 1)) {
                model.resistors.push(ResistorStamp {
                    n1,
                    n2,
                    value: Complex::new(0.0, omega * l),
                });
            }
        }
        ComponentKind::Capacitor => {
            let cap = comp.props.f64("value", 0.0).max(MIN_REACTIVE_VALUE);
            if let (Some(n1), Some(n2)) = (node_of(topo, comp, 0), node_of(topo, comp, 1)) {
                model.resistors.push(ResistorStamp {
                    n1,
                    n2,
                    value: Complex::new(0.0, -1.0 / (omega * cap)),
                });
            }
        }
        ComponentKind::Motor3ph => stamp_motor3ph_ac(comp, topo, model),
        ComponentKind::Contactor => stamp_contactor_ac(comp, topo, contactor_states, model),
        ComponentKind::Timer | ComponentKind::TimeTimer => {
            stamp_timer_like_ac(comp, topo, timer_states, model)
        }
        ComponentKind::Plc => stamp_plc_ac(comp, topo, plc_states, model),
        ComponentKind::VoltageSource => stamp_voltage_source_ac(comp, topo, model),
        ComponentKind::Node | ComponentKind::Ground => {}
    }
}

fn stamp_fixed_z(
    comp: &Component,
    topo: &Topology,
    default: f64,
    out: &mut Vec<ResistorStamp<Complex<f64>>>,
) {
    if let (Some(n1), Some(n2)) = (node_of(topo, comp, 0), node_of(topo, comp, 1)) {
        out.push(ResistorStamp {
            n1,
            n2,
            value: c(comp.props.f64("value", default)),
        });
    }
}

fn stamp_motor3ph_ac(comp: &Component, topo: &mut Topology, model: &mut AcModel) {
    let z = c(comp.props.f64("value", 12.0));
    let lines: Vec<Option<usize>> = (0..3).map(|i| node_of(topo, comp, i)).collect();
    if comp.props.str("connection", "Y") == "Delta" {
        let pairs = [(0, 1), (1, 2), (2, 0)];
        for (a, b) in pairs {
            if let (Some(n1), Some(n2)) = (lines[a], lines[b]) {
                model.resistors.push(ResistorStamp { n1, n2, value: z });
            }
        }
        return;
    }
    let neutral_key = format!("{}:N", comp.id);
    let neutral = *topo.terminal_nodes.entry(neutral_key).or_insert_with(|| {
        let node = topo.node_count;
        topo.node_count += 1;
        node
    });
    for line in lines.into_iter().flatten() {
        model.resistors.push(ResistorStamp {
            n1: line,
            n2: neutral,
            value: z,
        });
    }
}

fn stamp_contactor_ac(
    comp: &Component,
    topo: &Topology,
    contactor_states: &ContactorStates,
    model: &mut AcModel,
) {
    if let (Some(n1), Some(n2)) = (node_of(topo, comp, 0), node_of(topo, comp, 1)) {
        model.resistors.push(ResistorStamp {
            n1,
            n2,
            value: c(comp.props.f64("coilResistance", DEFAULT_COIL_OHMS)),
        });
    }
    let energized = contactor_states.get(&comp.id).copied().unwrap_or(false);
    let poles = comp.props.poles();
    let changeover = comp.props.str("contactType", "standard") == "changeover";
    let k = if changeover { 3 } else { 2 };
    for (i, pole) in poles.iter().enumerate() {
        let base = 2 + k * i;
        if changeover {
            let (common, no, nc) = (base, base + 1, base + 2);
            let target = if energized { no } else { nc };
            if let (Some(n1), Some(n2)) = (node_of(topo, comp, common), node_of(topo, comp, target)) {
                model.resistors.push(ResistorStamp {
                    n1,
                    n2,
                    value: c(CLOSED_SWITCH_OHMS),
                });
            }
        } else {
            let (common, contact) = (base, base + 1);
            let closed = (pole == "NO" && energized) || (pole == "NC" && !energized);
            if closed
                && let (Some(n1), Some(n2)) = (node_of(topo, comp, common), node_of(topo, comp, contact))
            {
                model.resistors.push(ResistorStamp {
                    n1,
                    n2,
                    value: c(CLOSED_SWITCH_OHMS),
                });
            }
        }
    }
}

fn stamp_timer_like_ac(comp: &Component, topo: &Topology, timer_states: &TimerStates, model: &mut AcModel) {
    if comp.kind == ComponentKind::Timer
        && let (Some(n1), Some(n2)) = (node_of(topo, comp, 0), node_of(topo, comp, 1))
    {
        model.resistors.push(ResistorStamp {
            n1,
            n2,
            value: c(comp.props.f64("coilResistance", DEFAULT_COIL_OHMS)),
        });
    }
    let (common, no, nc) = if comp.kind == ComponentKind::Timer {
        (2, 3, 4)
    } else {
        (0, 1, 2)
    };
    let output_closed = timer_states
        .get(&comp.id)
        .map(|s| s.output_closed)
        .unwrap_or(false);
    let target = if output_closed { no } else { nc };
    if let (Some(n1), Some(n2)) = (node_of(topo, comp, common), node_of(topo, comp, target)) {
        model.resistors.push(ResistorStamp {
            n1,
            n2,
            value: c(CLOSED_SWITCH_OHMS),
        });
    }
}

fn stamp_plc_ac(comp: &Component, topo: &Topology, plc_states: &PlcOutputStates, model: &mut AcModel) {
    let inputs = comp.props.clamped_i64("inputs", 4, 1, 64);
    let Some(bits) = plc_states.get(&comp.id) else {
        return;
    };
    for (i, &bit) in bits.iter().enumerate() {
        if !bit {
            continue;
        }
        let output_terminal = 2 + inputs + i;
        if let (Some(n1), Some(n2)) = (node_of(topo, comp, 1), node_of(topo, comp, output_terminal)) {
            model.resistors.push(ResistorStamp {
                n1,
                n2,
                value: c(CLOSED_SWITCH_OHMS),
            });
        }
    }
}

fn stamp_voltage_source_ac(comp: &Component, topo: &Topology, model: &mut AcModel) {
    let supply = comp.props.str("supplyType", "DC");
    if supply == "DC" {
        return;
    }
    if supply == "AC3" {
        let v_ll = comp.props.f64("value", 400.0);
        if comp.props.str("connection", "Y") == "Delta" {
            let pairs: [(&str, usize, usize, f64); 3] =
                [("L1L2", 0, 1, 0.0), ("L2L3", 1, 2, -120.0), ("L3L1", 2, 0, 120.0)];
            for (label, a, b, deg) in pairs {
                if let (Some(n1), Some(n2)) = (node_of(topo, comp, a), node_of(topo, comp, b)) {
                    model.sources.push(SourceStamp {
                        id: format!("{}:{}", comp.id, label),
                        n1,
                        n2,
                        value: Complex::from_polar(v_ll, deg.to_radians()),
                    });
                }
            }
        } else {
            let v_phase = v_ll / 3.0_f64.sqrt();
            let legs: [(&str, usize, f64); 3] = [("L1", 0, 0.0), ("L2", 1, -120.0), ("L3", 2, 120.0)];
            for (label, line, deg) in legs {
                if let (Some(neutral), Some(n2)) = (node_of(topo, comp, 3), node_of(topo, comp, line)) {
                    model.sources.push(SourceStamp {
                        id: format!("{}:{}", comp.id, label),
                        n1: neutral,
                        n2,
                        value: Complex::from_polar(v_phase, deg.to_radians()),
                    });
                }
            }
        }
        return;
    }
    // AC1
    if let (Some(n1), Some(n2)) = (node_of(topo, comp, 0), node_of(topo, comp, 1)) {
        let value = comp.props.f64("value", 0.0);
        model.sources.push(SourceStamp {
            id: comp.id.clone(),
            n1,
            n2,
            value: Complex::from_polar(value, 0.0),
        });
    }
}
