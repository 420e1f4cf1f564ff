//! Shared voltage-lookup helpers used by the discrete-state evaluators
//! and the reporting layer (`spec.md` §4.6, §4.12).

use num_complex::Complex;
use relaic_core::Topology;

/// Tolerance applied to every threshold comparison in the engine
/// (`spec.md` §9 design note — must not be changed per-call).
pub const EPSILON_V: f64 = 1e-2;

pub fn dc_delta(topo: &Topology, comp_id: &str, t0: usize, t1: usize, dc: &[f64]) -> Option<f64> {
    let n0 = topo.node_of(comp_id, t0)?;
    let n1 = topo.node_of(comp_id, t1)?;
    Some(dc.get(n0).copied().unwrap_or(0.0) - dc.get(n1).copied().unwrap_or(0.0))
}

pub fn ac_delta(
    topo: &Topology,
    comp_id: &str,
    t0: usize,
    t1: usize,
    ac: &[Complex<f64>],
) -> Option<Complex<f64>> {
    let n0 = topo.node_of(comp_id, t0)?;
    let n1 = topo.node_of(comp_id, t1)?;
    Some(
        ac.get(n0).copied().unwrap_or_default() - ac.get(n1).copied().unwrap_or_default(),
    )
}

/// `max(|DC delta|, |AC delta|)`, falling back to whichever side is
/// available. `None` when neither terminal is mapped on either side.
pub fn voltage_magnitude(
    topo: &Topology,
    comp_id: &str,
    t0: usize,
    t1: usize,
    dc: &[f64],
    ac: &[Complex<f64>],
) -> Option<f64> {
    let dc_mag = dc_delta(topo, comp_id, t0, t1, dc).map(f64::abs);
    let ac_mag = ac_delta(topo, comp_id, t0, t1, ac).map(|z| z.norm());
    match (dc_mag, ac_mag) {
        (Some(d), Some(a)) => Some(d.max(a)),
        (Some(d), None) => Some(d),
        (None, Some(a)) => Some(a),
        (None, None) => None,
    }
}
