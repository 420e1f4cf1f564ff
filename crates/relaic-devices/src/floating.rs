//! Floating-subgraph detection and the shunt-resistor retry policy
//! (`spec.md` §4.4).

use std::collections::{HashSet, VecDeque};

use num_complex::Complex;
use relaic_core::{Component, Topology};
use relaic_solver::ResistorStamp;

use crate::model::{AcModel, DcModel};

/// Shunt resistance used to tie dead nodes to ground so the solver does
/// not see a singular system.
pub const SHUNT_OHMS: f64 = 1e9;

/// Debug/diagnostic summary of one solve's connectivity analysis.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityReport {
    pub active: Vec<usize>,
    pub floating: Vec<usize>,
    pub inactive: Vec<usize>,
}

fn adjacency(node_count: usize, edges: &[(usize, usize)]) -> Vec<HashSet<usize>> {
    let mut adj = vec![HashSet::new(); node_count];
    for &(a, b) in edges {
        if a == b {
            continue;
        }
        adj[a].insert(b);
        adj[b].insert(a);
    }
    adj
}

fn bfs_from(adj: &[HashSet<usize>], seeds: impl IntoIterator<Item = usize>) -> HashSet<usize> {
    let mut seen: HashSet<usize> = HashSet::new();
    let mut queue: VecDeque<usize> = VecDeque::new();
    for s in seeds {
        if seen.insert(s) {
            queue.push_back(s);
        }
    }
    while let Some(node) = queue.pop_front() {
        for &next in &adj[node] {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}

/// `active`, `floating` (active but unreachable from ground), and
/// `inactive` (never touched) node sets.
pub fn analyze(node_count: usize, edges: &[(usize, usize)]) -> ConnectivityReport {
    let mut active: HashSet<usize> = HashSet::new();
    for &(a, b) in edges {
        active.insert(a);
        active.insert(b);
    }
    let adj = adjacency(node_count, edges);
    let reachable = bfs_from(&adj, [0]);

    let floating: Vec<usize> = active.difference(&reachable).copied().collect();
    let inactive: Vec<usize> = (1..node_count).filter(|n| !active.contains(n)).collect();
    ConnectivityReport {
        active: active.into_iter().collect(),
        floating,
        inactive,
    }
}

/// Nodes reachable from any source terminal, used for the "ungrounded
/// subcircuit" diagnostic (only components reachable from a source are
/// worth flagging — truly dead wiring is noise).
pub fn reachable_from_sources(node_count: usize, edges: &[(usize, usize)], source_nodes: &[usize]) -> HashSet<usize> {
    let adj = adjacency(node_count, edges);
    bfs_from(&adj, source_nodes.iter().copied())
}

/// Per-component diagnostic: any terminal in `floating` that is also
/// reachable from a source gets flagged.
pub fn component_errors_for_floating(
    components: &[Component],
    topo: &Topology,
    floating: &[usize],
    source_reachable: &HashSet<usize>,
    label: &str,
) -> Vec<(String, String)> {
    let floating_set: HashSet<usize> = floating.iter().copied().collect();
    let mut errors = Vec::new();
    for comp in components {
        let flagged = (0..relaic_core::terminal_count(comp)).any(|idx| {
            topo.node_of(&comp.id, idx)
                .map(|n| floating_set.contains(&n) && source_reachable.contains(&n))
                .unwrap_or(false)
        });
        if flagged {
            errors.push((comp.id.clone(), format!("Ungrounded subcircuit ({label})")));
        }
    }
    errors
}

/// Drop every resistor/source touching a dead node.
pub fn filter_dc(model: &DcModel, dead: &HashSet<usize>) -> DcModel {
    DcModel {
        resistors: model
            .resistors
            .iter()
            .filter(|r| !dead.contains(&r.n1) && !dead.contains(&r.n2))
            .cloned()
            .collect(),
        sources: model
            .sources
            .iter()
            .filter(|s| !dead.contains(&s.n1) && !dead.contains(&s.n2))
            .cloned()
            .collect(),
    }
}

pub fn filter_ac(model: &AcModel, dead: &HashSet<usize>) -> AcModel {
    AcModel {
        resistors: model
            .resistors
            .iter()
            .filter(|r| !dead.contains(&r.n1) && !dead.contains(&r.n2))
            .cloned()
            .collect(),
        sources: model
            .sources
            .iter()
            .filter(|s| !dead.contains(&s.n1) && !dead.contains(&s.n2))
            .cloned()
            .collect(),
    }
}

pub fn shunt_dc(nodes: impl IntoIterator<Item = usize>) -> Vec<ResistorStamp<f64>> {
    nodes
        .into_iter()
        .filter(|&n| n != 0)
        .map(|n| ResistorStamp {
            n1: n,
            n2: 0,
            value: SHUNT_OHMS,
        })
        .collect()
}

pub fn shunt_ac(nodes: impl IntoIterator<Item = usize>) -> Vec<ResistorStamp<Complex<f64>>> {
    nodes
        .into_iter()
        .filter(|&n| n != 0)
        .map(|n| ResistorStamp {
            n1: n,
            n2: 0,
            value: Complex::new(SHUNT_OHMS, 0.0),
        })
        .collect()
}

pub fn dc_edges(model: &DcModel) -> Vec<(usize, usize)> {
    model
        .resistors
        .iter()
        .map(|r| (r.n1, r.n2))
        .chain(model.sources.iter().map(|s| (s.n1, s.n2)))
        .collect()
}

pub fn ac_edges(model: &AcModel) -> Vec<(usize, usize)> {
    model
        .resistors
        .iter()
        .map(|r| (r.n1, r.n2))
        .chain(model.sources.iter().map(|s| (s.n1, s.n2)))
        .collect()
}

pub fn source_nodes_dc(model: &DcModel) -> Vec<usize> {
    model.sources.iter().flat_map(|s| [s.n1, s.n2]).collect()
}

pub fn source_nodes_ac(model: &AcModel) -> Vec<usize> {
    model.sources.iter().flat_map(|s| [s.n1, s.n2]).collect()
}
