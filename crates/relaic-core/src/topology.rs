//! Topology flattening: turns (components, wires) into a numbered node
//! set with a distinguished ground (`spec.md` §4.2).

use indexmap::{IndexMap, IndexSet};

use crate::component::{Component, ComponentKind, Wire, terminal_count, terminal_exists};

/// Union-find over interned terminal ids, path compression + union by rank
/// (`spec.md` §9 design note).
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// The flattened terminal→node mapping produced by [`build_topology`].
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// `"compId:index" -> node index`; node 0 is always ground.
    pub terminal_nodes: IndexMap<String, usize>,
    /// Total distinct nodes, including ground (`>= 1`).
    pub node_count: usize,
    /// True when no explicit `ground` component was found and the engine
    /// elected a pseudo-ground (first voltage-source terminal, or else the
    /// first terminal encountered).
    pub virtual_ground: bool,
}

impl Topology {
    pub fn node_of(&self, comp_id: &str, index: usize) -> Option<usize> {
        self.terminal_nodes.get(&key(comp_id, index)).copied()
    }
}

pub fn key(comp_id: &str, index: usize) -> String {
    format!("{comp_id}:{index}")
}

pub fn build_topology(components: &[Component], wires: &[Wire]) -> Topology {
    let comp_by_id: IndexMap<&str, &Component> =
        components.iter().map(|c| (c.id.as_str(), c)).collect();

    // Step 1: the `used` terminal-key set, in first-seen order.
    let mut used: IndexSet<String> = IndexSet::new();
    for wire in wires {
        if let Some(comp) = comp_by_id.get(wire.from.comp_id.as_str())
            && terminal_exists(comp, wire.from.index)
        {
            used.insert(key(&wire.from.comp_id, wire.from.index));
        }
        if let Some(comp) = comp_by_id.get(wire.to.comp_id.as_str())
            && terminal_exists(comp, wire.to.index)
        {
            used.insert(key(&wire.to.comp_id, wire.to.index));
        }
    }
    for comp in components {
        match comp.kind {
            ComponentKind::Node => {
                for idx in 0..terminal_count(comp) {
                    used.insert(key(&comp.id, idx));
                }
            }
            ComponentKind::Ground => {
                used.insert(key(&comp.id, 0));
            }
            _ => {}
        }
    }

    // Step 2/3: number the used terminals, union via wires.
    let mut terminals: Vec<String> = Vec::new();
    let mut uf_id: IndexMap<String, usize> = IndexMap::new();
    for comp in components {
        for idx in 0..terminal_count(comp) {
            let k = key(&comp.id, idx);
            if !used.contains(&k) {
                continue;
            }
            uf_id.insert(k.clone(), terminals.len());
            terminals.push(k);
        }
    }

    let mut uf = UnionFind::new(terminals.len());
    for wire in wires {
        let a = key(&wire.from.comp_id, wire.from.index);
        let b = key(&wire.to.comp_id, wire.to.index);
        if let (Some(&ia), Some(&ib)) = (uf_id.get(&a), uf_id.get(&b)) {
            uf.union(ia, ib);
        }
    }

    // Step 4: choose the ground root.
    let ground_root = components
        .iter()
        .find(|c| c.kind == ComponentKind::Ground)
        .and_then(|c| uf_id.get(&key(&c.id, 0)))
        .map(|&id| uf.find(id));

    let mut virtual_ground = false;
    let ground_root = ground_root.or_else(|| {
        for comp in components {
            if comp.kind != ComponentKind::VoltageSource {
                continue;
            }
            for idx in 0..terminal_count(comp) {
                if let Some(&id) = uf_id.get(&key(&comp.id, idx)) {
                    virtual_ground = true;
                    return Some(uf.find(id));
                }
            }
        }
        None
    });
    let ground_root = ground_root.or_else(|| {
        if terminals.is_empty() {
            None
        } else {
            virtual_ground = true;
            Some(uf.find(0))
        }
    });

    // Step 5: number the remaining roots starting at 1.
    let mut terminal_nodes: IndexMap<String, usize> = IndexMap::new();
    let mut node_of_root: IndexMap<usize, usize> = IndexMap::new();
    let mut next_node = 0usize;
    for term in &terminals {
        let id = uf_id[term];
        let root = uf.find(id);
        let node = if Some(root) == ground_root {
            0
        } else if let Some(&n) = node_of_root.get(&root) {
            n
        } else {
            next_node += 1;
            node_of_root.insert(root, next_node);
            next_node
        };
        terminal_nodes.insert(term.clone(), node);
    }

    Topology {
        terminal_nodes,
        node_count: next_node + 1,
        virtual_ground,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Terminal;
    use crate::props::Props;
    use serde_json::json;

    fn comp(id: &str, kind: ComponentKind, props: serde_json::Value) -> Component {
        Component {
            id: id.to_string(),
            kind,
            props: Props::from(props.as_object().cloned().unwrap_or_default()),
        }
    }

    fn wire(a_id: &str, a_idx: usize, b_id: &str, b_idx: usize) -> Wire {
        Wire {
            from: Terminal {
                comp_id: a_id.to_string(),
                index: a_idx,
            },
            to: Terminal {
                comp_id: b_id.to_string(),
                index: b_idx,
            },
        }
    }

    #[test]
    fn resistor_loop_with_ground() {
        let components = vec![
            comp("V", ComponentKind::VoltageSource, json!({"value": 24})),
            comp("R", ComponentKind::Resistor, json!({"value": 48})),
            comp("G", ComponentKind::Ground, json!({})),
        ];
        let wires = vec![
            wire("V", 0, "R", 0),
            wire("V", 1, "R", 1),
            wire("V", 1, "G", 0),
        ];
        let topo = build_topology(&components, &wires);
        assert!(!topo.virtual_ground);
        assert_eq!(topo.node_of("V", 1), Some(0));
        assert_eq!(topo.node_of("V", 0), topo.node_of("R", 0));
        assert_ne!(topo.node_of("V", 0), Some(0));
        assert_eq!(topo.node_count, 2);
    }

    #[test]
    fn virtual_ground_from_voltage_source_when_no_ground_component() {
        let components = vec![
            comp("V", ComponentKind::VoltageSource, json!({"value": 24})),
            comp("R", ComponentKind::Resistor, json!({"value": 48})),
        ];
        let wires = vec![wire("V", 0, "R", 0), wire("V", 1, "R", 1)];
        let topo = build_topology(&components, &wires);
        assert!(topo.virtual_ground);
        assert_eq!(topo.node_of("V", 1), Some(0));
    }

    #[test]
    fn unused_terminals_are_absent() {
        let components = vec![comp("R", ComponentKind::Resistor, json!({"value": 1}))];
        let topo = build_topology(&components, &[]);
        assert_eq!(topo.node_of("R", 0), None);
        assert_eq!(topo.node_of("R", 1), None);
        assert_eq!(topo.node_count, 1);
    }

    #[test]
    fn empty_circuit_has_single_ground_node() {
        let topo = build_topology(&[], &[]);
        assert_eq!(topo.node_count, 1);
        assert!(topo.terminal_nodes.is_empty());
    }
}
