//! The fixed-point driver: reconciles discrete state (contactors, timers,
//! PLC outputs) with the electrical solve (`spec.md` §4.10).
//!
//! Each round rebuilds the DC (and, if one AC frequency is in play, the
//! AC) network from the current discrete state, solves it with the
//! floating-node shunt retry, then recomputes discrete state from the
//! fresh voltages. The loop stops early on a fixed point and otherwise
//! runs a fixed three rounds — ladder logic and timers settle fast, and a
//! hard cap keeps a pathological feedback circuit from looping forever.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use num_complex::Complex;
use relaic_core::{ComponentKind, Topology, build_topology};
use relaic_devices::model::{AcModel, DcModel, ac_frequencies, build_model_ac, build_model_dc};
use relaic_devices::state::{ContactorStates, PlcOutputStates, TimerState, TimerStates};
use relaic_devices::{discrete, floating};
use relaic_plc::PlcMeta;

use crate::error::RelaicError;
use crate::types::{DebugInfo, NetworkDebug, SolveOutcome, SolveRequest};

/// Hard cap on fixed-point rounds (`spec.md` §4.10).
const MAX_ROUNDS: usize = 3;

fn now_ms_wallclock() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn seed_contactor_states(req: &SolveRequest) -> ContactorStates {
    req.components
        .iter()
        .filter(|c| c.kind == ComponentKind::Contactor)
        .map(|c| (c.id.clone(), false))
        .collect()
}

/// The timer baseline a component's `props.timerState` (or, for
/// `time_timer`, the wall clock) describes. This stays fixed across every
/// round of one `solve_network` call — the original engine reads it from
/// the request's static props rather than the loop's running state.
fn seed_timer_states(req: &SolveRequest) -> TimerStates {
    let mut states = TimerStates::new();
    for comp in &req.components {
        if comp.kind == ComponentKind::Timer {
            let seeded = comp
                .props
                .get("timerState")
                .and_then(|v| serde_json::from_value::<TimerState>(v.clone()).ok())
                .unwrap_or_default();
            states.insert(comp.id.clone(), seeded);
        }
    }
    apply_time_timer_states(req, &mut states);
    states
}

fn apply_time_timer_states(req: &SolveRequest, states: &mut TimerStates) {
    let now_minutes = discrete::now_minutes_utc();
    for comp in &req.components {
        if comp.kind != ComponentKind::TimeTimer {
            continue;
        }
        let output_closed = discrete::evaluate_time_timer(comp, now_minutes);
        states.insert(
            comp.id.clone(),
            TimerState {
                running: false,
                start_at: None,
                output_closed,
                remaining_ms: 0,
            },
        );
    }
}

fn seed_plc_states(req: &SolveRequest) -> (PlcOutputStates, IndexMap<String, PlcMeta>) {
    let mut states = PlcOutputStates::new();
    let mut meta = IndexMap::new();
    for comp in &req.components {
        if comp.kind != ComponentKind::Plc {
            continue;
        }
        let outputs = comp.props.clamped_i64("outputs", 4, 1, 64);
        states.insert(comp.id.clone(), vec![false; outputs]);
        meta.insert(comp.id.clone(), PlcMeta::default());
    }
    (states, meta)
}

struct DcSolveResult {
    voltages: Vec<f64>,
    source_currents: IndexMap<String, f64>,
    debug: NetworkDebug,
    diagnostics: Vec<(String, String)>,
}

fn solve_dc_network(components: &[relaic_core::Component], topo: &Topology, model: &DcModel) -> DcSolveResult {
    let edges = floating::dc_edges(model);
    let report = floating::analyze(topo.node_count, &edges);
    let inactive: HashSet<usize> = report.inactive.iter().copied().collect();
    let floating_set: HashSet<usize> = report.floating.iter().copied().collect();
    let dead: HashSet<usize> = floating_set.union(&inactive).copied().collect();

    let source_nodes = floating::source_nodes_dc(model);
    let source_reachable = floating::reachable_from_sources(topo.node_count, &edges, &source_nodes);
    let mut diagnostics =
        floating::component_errors_for_floating(components, topo, &report.floating, &source_reachable, "DC");

    let debug = NetworkDebug {
        nodes: topo.node_count,
        sources: model.sources.len(),
        elements: model.resistors.len() + model.sources.len(),
        floating: report.floating.len(),
        inactive: report.inactive.len(),
        active: report.active.len(),
        virtual_ground: topo.virtual_ground,
    };

    if model.sources.is_empty() {
        return DcSolveResult {
            voltages: vec![0.0; topo.node_count],
            source_currents: IndexMap::new(),
            debug,
            diagnostics,
        };
    }

    let filtered = floating::filter_dc(model, &dead);
    let mut resistors = filtered.resistors;
    resistors.extend(floating::shunt_dc(dead.iter().copied()));

    match relaic_solver::solve_mna(topo.node_count, &resistors, &filtered.sources) {
        Ok(sol) => DcSolveResult {
            voltages: sol.node_voltages,
            source_currents: sol.source_currents,
            debug,
            diagnostics,
        },
        Err(_) => {
            log::warn!("DC network singular after shunting floating/inactive nodes, retrying");
            resistors.extend(floating::shunt_dc(report.active.iter().copied()));
            match relaic_solver::solve_mna(topo.node_count, &resistors, &filtered.sources) {
                Ok(sol) => DcSolveResult {
                    voltages: sol.node_voltages,
                    source_currents: sol.source_currents,
                    debug,
                    diagnostics,
                },
                Err(_) => {
                    diagnostics.push(("__network_dc".to_string(), "could not solve the DC network (singular)".to_string()));
                    DcSolveResult {
                        voltages: vec![0.0; topo.node_count],
                        source_currents: IndexMap::new(),
                        debug,
                        diagnostics,
                    }
                }
            }
        }
    }
}

struct AcSolveResult {
    voltages: Vec<Complex<f64>>,
    source_currents: IndexMap<String, Complex<f64>>,
    debug: NetworkDebug,
    diagnostics: Vec<(String, String)>,
}

fn solve_ac_network(components: &[relaic_core::Component], topo: &Topology, model: &AcModel) -> AcSolveResult {
    let edges = floating::ac_edges(model);
    let report = floating::analyze(topo.node_count, &edges);
    let inactive: HashSet<usize> = report.inactive.iter().copied().collect();
    let floating_set: HashSet<usize> = report.floating.iter().copied().collect();
    let dead: HashSet<usize> = floating_set.union(&inactive).copied().collect();

    let source_nodes = floating::source_nodes_ac(model);
    let source_reachable = floating::reachable_from_sources(topo.node_count, &edges, &source_nodes);
    let mut diagnostics =
        floating::component_errors_for_floating(components, topo, &report.floating, &source_reachable, "AC");

    let debug = NetworkDebug {
        nodes: topo.node_count,
        sources: model.sources.len(),
        elements: model.resistors.len() + model.sources.len(),
        floating: report.floating.len(),
        inactive: report.inactive.len(),
        active: report.active.len(),
        virtual_ground: topo.virtual_ground,
    };

    if model.sources.is_empty() {
        return AcSolveResult {
            voltages: vec![Complex::new(0.0, 0.0); topo.node_count],
            source_currents: IndexMap::new(),
            debug,
            diagnostics,
        };
    }

    let filtered = floating::filter_ac(model, &dead);
    let mut resistors = filtered.resistors;
    resistors.extend(floating::shunt_ac(dead.iter().copied()));

    match relaic_solver::solve_mna_ac(topo.node_count, &resistors, &filtered.sources) {
        Ok(sol) => AcSolveResult {
            voltages: sol.node_voltages,
            source_currents: sol.source_currents,
            debug,
            diagnostics,
        },
        Err(_) => {
            log::warn!("AC network singular after shunting floating/inactive nodes, retrying");
            resistors.extend(floating::shunt_ac(report.active.iter().copied()));
            match relaic_solver::solve_mna_ac(topo.node_count, &resistors, &filtered.sources) {
                Ok(sol) => AcSolveResult {
                    voltages: sol.node_voltages,
                    source_currents: sol.source_currents,
                    debug,
                    diagnostics,
                },
                Err(_) => {
                    diagnostics.push(("__network_ac".to_string(), "could not solve the AC network (singular)".to_string()));
                    AcSolveResult {
                        voltages: vec![Complex::new(0.0, 0.0); topo.node_count],
                        source_currents: IndexMap::new(),
                        debug,
                        diagnostics,
                    }
                }
            }
        }
    }
}

fn recompute_contactors(
    req: &SolveRequest,
    topo: &Topology,
    dc: &[f64],
    ac: &[Complex<f64>],
) -> ContactorStates {
    req.components
        .iter()
        .filter(|c| c.kind == ComponentKind::Contactor)
        .map(|c| (c.id.clone(), discrete::evaluate_contactor(c, topo, dc, ac)))
        .collect()
}

/// Recompute `timer` outputs against the fixed `baseline` seeded at the
/// top of `solve_network`, then fold in the wall-clock `time_timer`
/// states (recomputed fresh every round since real time may have moved
/// on between calls).
fn recompute_timers(
    req: &SolveRequest,
    topo: &Topology,
    dc: &[f64],
    ac: &[Complex<f64>],
    baseline: &TimerStates,
    now_ms: i64,
) -> TimerStates {
    let mut states = TimerStates::new();
    for comp in &req.components {
        if comp.kind != ComponentKind::Timer {
            continue;
        }
        let prior = baseline.get(&comp.id).copied().unwrap_or_default();
        states.insert(comp.id.clone(), discrete::evaluate_timer(comp, topo, dc, ac, prior, now_ms));
    }
    apply_time_timer_states(req, &mut states);
    states
}

fn recompute_plc(
    req: &SolveRequest,
    topo: &Topology,
    dc: &[f64],
    ac: &[Complex<f64>],
    prior_states: &PlcOutputStates,
    prior_meta: &IndexMap<String, PlcMeta>,
    now_ms: i64,
) -> (PlcOutputStates, IndexMap<String, PlcMeta>) {
    let mut states = PlcOutputStates::new();
    let mut meta = IndexMap::new();
    for comp in &req.components {
        if comp.kind != ComponentKind::Plc {
            continue;
        }
        let inputs_count = comp.props.clamped_i64("inputs", 4, 1, 64);
        let outputs_count = comp.props.clamped_i64("outputs", 4, 1, 64);
        let threshold = comp.props.f64("inputThreshold", 9.0);

        let mut inputs = vec![false; inputs_count];
        for (idx, bit) in inputs.iter_mut().enumerate() {
            let dv = relaic_devices::measure::voltage_magnitude(topo, &comp.id, 2 + idx, 0, dc, ac).unwrap_or(0.0);
            *bit = dv + relaic_devices::measure::EPSILON_V >= threshold;
        }

        let program = comp.props.str("program", "");
        let language = comp.props.str("language", "LAD");
        let default_meta = PlcMeta::default();
        let prior = prior_meta.get(&comp.id).unwrap_or(&default_meta);
        let prior_outputs = prior_states
            .get(&comp.id)
            .cloned()
            .unwrap_or_else(|| vec![false; outputs_count]);

        let (outputs, new_meta) =
            relaic_plc::evaluate(&program, &language, &inputs, &prior_outputs, outputs_count, prior, now_ms);
        states.insert(comp.id.clone(), outputs);
        meta.insert(comp.id.clone(), new_meta);
    }
    (states, meta)
}

/// Run the fixed-point driver over a static circuit and return the
/// settled discrete state alongside both electrical solves. Does not
/// fail on an internal solve going singular — see module docs; it only
/// fails when the request itself can't be made into a well-formed
/// network (multiple AC source frequencies).
pub fn solve_network(req: &SolveRequest) -> Result<SolveOutcome, RelaicError> {
    let freqs = ac_frequencies(&req.components);
    if freqs.len() > 1 {
        return Err(RelaicError::Topology("multiple AC frequencies are not supported".to_string()));
    }
    let frequency_hz = freqs.first().map(|&f| f as f64);
    let now_ms = req.sim_time.unwrap_or_else(now_ms_wallclock);

    let mut contactor_states = seed_contactor_states(req);
    let timer_baseline = seed_timer_states(req);
    let mut timer_states = timer_baseline.clone();
    let (mut plc_states, mut plc_meta) = seed_plc_states(req);

    let mut topo = build_topology(&req.components, &req.wires);
    let mut dc_node_voltages: Vec<f64> = vec![0.0; topo.node_count];
    let mut dc_source_currents: IndexMap<String, f64> = IndexMap::new();
    let mut ac_node_voltages: Option<Vec<Complex<f64>>> = None;
    let mut ac_source_currents: IndexMap<String, Complex<f64>> = IndexMap::new();
    let mut solve_errors: IndexMap<String, String> = IndexMap::new();
    let mut debug_info = DebugInfo::default();

    for _ in 0..MAX_ROUNDS {
        topo = build_topology(&req.components, &req.wires);
        let dc_model = build_model_dc(&req.components, &topo, &contactor_states, &timer_states, &plc_states);
        let dc_result = solve_dc_network(&req.components, &topo, &dc_model);
        dc_node_voltages = dc_result.voltages;
        dc_source_currents = dc_result.source_currents;
        debug_info.dc = dc_result.debug;
        for (id, msg) in dc_result.diagnostics {
            solve_errors.insert(id, msg);
        }

        ac_node_voltages = None;
        ac_source_currents = IndexMap::new();
        if let Some(freq) = frequency_hz {
            let (ac_model, ac_topo) =
                build_model_ac(&req.components, &topo, &contactor_states, &timer_states, &plc_states, freq);
            let ac_result = solve_ac_network(&req.components, &ac_topo, &ac_model);
            ac_node_voltages = Some(ac_result.voltages);
            ac_source_currents = ac_result.source_currents;
            debug_info.ac = ac_result.debug;
            for (id, msg) in ac_result.diagnostics {
                solve_errors.insert(id, msg);
            }
        }

        let ac_slice: &[Complex<f64>] = ac_node_voltages.as_deref().unwrap_or(&[]);
        let updated_contactors = recompute_contactors(req, &topo, &dc_node_voltages, ac_slice);
        let updated_timers = recompute_timers(req, &topo, &dc_node_voltages, ac_slice, &timer_baseline, now_ms);
        let (updated_plc, updated_plc_meta) =
            recompute_plc(req, &topo, &dc_node_voltages, ac_slice, &plc_states, &plc_meta, now_ms);

        let converged =
            updated_contactors == contactor_states && updated_timers == timer_states && updated_plc == plc_states;

        contactor_states = updated_contactors;
        timer_states = updated_timers;
        plc_states = updated_plc;
        plc_meta = updated_plc_meta;

        if converged {
            break;
        }
    }

    Ok(SolveOutcome {
        components: req.components.clone(),
        terminal_nodes: topo.terminal_nodes,
        contactor_states,
        timer_states,
        plc_states,
        plc_meta,
        dc_node_voltages,
        dc_source_currents,
        ac_node_voltages,
        ac_source_currents,
        solve_errors,
        debug_info,
    })
}
