//! Human-facing readouts derived from a settled solve: lit lamps, running
//! motors, spin direction, and out-of-tolerance faults (`spec.md` §4.11,
//! §4.12).

use indexmap::IndexMap;
use num_complex::Complex;
use relaic_core::{Component, ComponentKind, Topology};
use relaic_devices::measure::{EPSILON_V, voltage_magnitude};

/// Minimum voltage drop before a fault is even considered — a de-energized
/// component reading near zero is not "wrong voltage", it's off.
const FAULT_MIN_V: f64 = 0.1;

/// Fractional band around a component's rated voltage before it's flagged.
const FAULT_TOLERANCE: f64 = 0.1;

pub fn lamp_lit(components: &[Component], topo: &Topology, dc: &[f64], ac: &[Complex<f64>]) -> IndexMap<String, bool> {
    let mut out = IndexMap::new();
    for comp in components {
        if comp.kind != ComponentKind::Lamp {
            continue;
        }
        let lit = match voltage_magnitude(topo, &comp.id, 0, 1, dc, ac) {
            Some(dv) => dv + EPSILON_V >= comp.props.f64("threshold", 0.0),
            None => false,
        };
        out.insert(comp.id.clone(), lit);
    }
    out
}

pub fn motor_running(
    components: &[Component],
    topo: &Topology,
    dc: &[f64],
    ac: &[Complex<f64>],
) -> IndexMap<String, bool> {
    let mut out = IndexMap::new();
    for comp in components {
        if comp.kind != ComponentKind::Motor {
            continue;
        }
        let running = match voltage_magnitude(topo, &comp.id, 0, 1, dc, ac) {
            Some(dv) => dv + EPSILON_V >= comp.props.f64("startVoltage", 0.0),
            None => false,
        };
        out.insert(comp.id.clone(), running);
    }
    out
}

pub fn faults(components: &[Component], topo: &Topology, dc: &[f64], ac: &[Complex<f64>]) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for comp in components {
        if !matches!(comp.kind, ComponentKind::Lamp | ComponentKind::Contactor) {
            continue;
        }
        let Some(dv) = voltage_magnitude(topo, &comp.id, 0, 1, dc, ac) else {
            continue;
        };
        if dv < FAULT_MIN_V {
            continue;
        }
        let (rated, label) = match comp.kind {
            ComponentKind::Lamp => (comp.props.f64("ratedVoltage", comp.props.f64("threshold", 0.0)), "Lamp"),
            ComponentKind::Contactor => {
                (comp.props.f64("coilRatedVoltage", comp.props.f64("pullInVoltage", 0.0)), "Contactor")
            }
            _ => unreachable!(),
        };
        if rated == 0.0 {
            continue;
        }
        let low = rated * (1.0 - FAULT_TOLERANCE);
        let high = rated * (1.0 + FAULT_TOLERANCE);
        if dv < low || dv > high {
            out.insert(comp.id.clone(), format!("{label} wrong voltage ({dv:.2} V / {rated} V)"));
        }
    }
    out
}

fn phase_angle(z: Complex<f64>) -> f64 {
    z.im.atan2(z.re).to_degrees()
}

fn normalize_angle(mut angle: f64) -> f64 {
    while angle <= -180.0 {
        angle += 360.0;
    }
    while angle > 180.0 {
        angle -= 360.0;
    }
    angle
}

pub fn motor3ph_direction(
    components: &[Component],
    topo: &Topology,
    ac: Option<&[Complex<f64>]>,
) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let Some(ac) = ac else {
        return out;
    };
    for comp in components {
        if comp.kind != ComponentKind::Motor3ph {
            continue;
        }
        let nodes = [topo.node_of(&comp.id, 0), topo.node_of(&comp.id, 1), topo.node_of(&comp.id, 2)];
        let (Some(n1), Some(n2), Some(n3)) = (nodes[0], nodes[1], nodes[2]) else {
            out.insert(comp.id.clone(), "stopped".to_string());
            continue;
        };
        let (v1, v2, v3) = (ac[n1], ac[n2], ac[n3]);
        let v12 = (v1 - v2).norm();
        let v23 = (v2 - v3).norm();
        let v31 = (v3 - v1).norm();
        let v_ll = (v12 + v23 + v31) / 3.0;
        let threshold = comp.props.f64("startVoltage", 0.0);
        if v_ll + EPSILON_V < threshold {
            out.insert(comp.id.clone(), "stopped".to_string());
            continue;
        }
        let d12 = normalize_angle(phase_angle(v2) - phase_angle(v1));
        let d13 = normalize_angle(phase_angle(v3) - phase_angle(v1));
        // Every other case, including ties, defaults to cw.
        let direction = if d12 > 0.0 && d13 < 0.0 { "ccw" } else { "cw" };
        out.insert(comp.id.clone(), direction.to_string());
    }
    out
}
