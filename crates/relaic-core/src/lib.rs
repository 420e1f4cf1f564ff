//! Circuit data model and topology flattening.
//!
//! This crate owns the static description of a circuit — components,
//! wires, and their freeform property bags — plus the union-find pass
//! that turns terminals into a numbered node set. It has no notion of
//! solving anything; [`relaic-devices`](../relaic_devices/index.html) and
//! [`relaic-solver`](../relaic_solver/index.html) build on top of it.

pub mod component;
pub mod props;
pub mod topology;

pub use component::{Component, ComponentKind, Terminal, Wire, terminal_count, terminal_exists};
pub use props::Props;
pub use topology::{Topology, build_topology, key as terminal_key};
