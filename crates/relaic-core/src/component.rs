//! The component/wire data model (`spec.md` §3).

use serde::{Deserialize, Serialize};

use crate::props::Props;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Resistor,
    Switch,
    PushButton,
    SwitchSpdt,
    Inductor,
    Capacitor,
    Motor,
    Motor3ph,
    Lamp,
    Contactor,
    Timer,
    TimeTimer,
    Plc,
    VoltageSource,
    Node,
    Ground,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    #[serde(default)]
    pub props: Props,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminal {
    #[serde(rename = "compId")]
    pub comp_id: String,
    pub index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wire {
    pub from: Terminal,
    pub to: Terminal,
}

/// Terminal count per component type (`spec.md` §3, invariant).
pub fn terminal_count(component: &Component) -> usize {
    match component.kind {
        ComponentKind::Contactor => {
            let poles = component.props.poles();
            let k = if component.props.str("contactType", "standard") == "changeover" {
                3
            } else {
                2
            };
            2 + k * poles.len()
        }
        ComponentKind::Timer => 5,
        ComponentKind::TimeTimer => 3,
        ComponentKind::Plc => {
            let inputs = component.props.clamped_i64("inputs", 4, 1, 64);
            let outputs = component.props.clamped_i64("outputs", 4, 1, 64);
            2 + inputs + outputs
        }
        ComponentKind::VoltageSource => {
            let supply = component.props.str("supplyType", "DC");
            if supply == "AC3" {
                if component.props.str("connection", "Y") == "Delta" {
                    3
                } else {
                    4
                }
            } else {
                2
            }
        }
        ComponentKind::SwitchSpdt | ComponentKind::Motor3ph => 3,
        ComponentKind::Node => 4,
        ComponentKind::Ground => 1,
        _ => 2,
    }
}

/// Whether `index` names an actual terminal of `component`.
///
/// Only consulted for wire endpoints — `node`/`ground` "used" terminals are
/// assumed valid without this check (`spec.md` §9 Open Questions).
pub fn terminal_exists(component: &Component, index: usize) -> bool {
    index < terminal_count(component)
}
