//! End-to-end scenarios run against whole circuits: a resistor loop, a
//! lamp threshold and fault band, a contactor seal-in, a series RL
//! network, three-phase direction sensing, and an ungrounded island.

use relaic_core::{Component, ComponentKind, Props, Terminal, Wire};
use relaic_devices::model::{ac_frequencies, build_model_dc};
use relaic::types::{MeasureMode, MeasureRequest};
use relaic::{SolveRequest, measure, simulate_circuit};
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
        from: Terminal { comp_id: a_id.to_string(), index: a_idx },
        to: Terminal { comp_id: b_id.to_string(), index: b_idx },
    }
}

fn req(components: Vec<Component>, wires: Vec<Wire>) -> SolveRequest {
    SolveRequest { components, wires, sim_time: Some(0) }
}

#[test]
fn single_resistor_loop_divides_voltage_and_current() {
    let components = vec![
        comp("V", ComponentKind::VoltageSource, json!({"value": 24})),
        comp("R", ComponentKind::Resistor, json!({"value": 48})),
        comp("G", ComponentKind::Ground, json!({})),
    ];
    let wires = vec![wire("V", 0, "R", 0), wire("V", 1, "R", 1), wire("V", 1, "G", 0)];

    let out = simulate_circuit(&req(components, wires)).unwrap();
    let hot = out.solution.terminal_nodes["V:0"];
    assert_eq!(out.solution.terminal_nodes["V:1"], 0);
    assert!((out.solution.node_voltages[hot] - 24.0).abs() < 1e-9);
    assert!((out.solution.source_currents["V"].abs() - 0.5).abs() < 1e-9);
    assert!(out.solve_errors.is_empty());

    let current = measure(&MeasureRequest {
        components: vec![
            comp("V", ComponentKind::VoltageSource, json!({"value": 24})),
            comp("R", ComponentKind::Resistor, json!({"value": 48})),
            comp("G", ComponentKind::Ground, json!({})),
        ],
        wires: vec![wire("V", 0, "R", 0), wire("V", 1, "R", 1), wire("V", 1, "G", 0)],
        sim_time: Some(0),
        mode: MeasureMode::Current,
        a_ref: None,
        b_ref: None,
        component_id: Some("R".to_string()),
    })
    .unwrap();
    assert!((current.value.unwrap() - 0.5).abs() < 1e-9);
}

#[test]
fn lamp_lights_above_threshold_and_goes_dark_below_it() {
    let bright = vec![
        comp("V", ComponentKind::VoltageSource, json!({"value": 12})),
        comp("L", ComponentKind::Lamp, json!({"value": 80, "threshold": 6})),
        comp("G", ComponentKind::Ground, json!({})),
    ];
    let wires = vec![wire("V", 0, "L", 0), wire("V", 1, "L", 1), wire("V", 1, "G", 0)];
    let out = simulate_circuit(&req(bright, wires.clone())).unwrap();
    assert_eq!(out.lamp_lit["L"], true);

    let dim = vec![
        comp("V", ComponentKind::VoltageSource, json!({"value": 5})),
        comp("L", ComponentKind::Lamp, json!({"value": 80, "threshold": 6})),
        comp("G", ComponentKind::Ground, json!({})),
    ];
    let out = simulate_circuit(&req(dim, wires)).unwrap();
    assert_eq!(out.lamp_lit["L"], false);
}

#[test]
fn lamp_out_of_tolerance_band_is_flagged_as_a_fault() {
    // 20ohm series resistor in front of an 80ohm lamp divides a 12.5V
    // supply down to exactly 10V across the lamp, outside the +-10% band
    // around a 12V rating.
    let components = vec![
        comp("V", ComponentKind::VoltageSource, json!({"value": 12.5})),
        comp("R1", ComponentKind::Resistor, json!({"value": 20})),
        comp("L", ComponentKind::Lamp, json!({"value": 80, "threshold": 6, "ratedVoltage": 12})),
        comp("G", ComponentKind::Ground, json!({})),
    ];
    let wires = vec![
        wire("V", 0, "R1", 0),
        wire("R1", 1, "L", 0),
        wire("L", 1, "V", 1),
        wire("V", 1, "G", 0),
    ];
    let out = simulate_circuit(&req(components, wires)).unwrap();
    let msg = out.faults.get("L").expect("lamp should be flagged out of tolerance");
    assert!(msg.contains("10.00"), "fault message was: {msg}");
}

#[test]
fn contactor_seal_in_converges_with_both_pushbutton_and_pole_conducting() {
    // Pushbutton and the contactor's own NO pole sit in parallel between
    // the supply rail and the coil's feed node, so once the coil pulls in
    // the pole alone reproduces the voltage the button established.
    let components = vec![
        comp("V", ComponentKind::VoltageSource, json!({"value": 24})),
        comp("PB", ComponentKind::PushButton, json!({"closed": true})),
        comp("C", ComponentKind::Contactor, json!({"pullInVoltage": 10})),
        comp("G", ComponentKind::Ground, json!({})),
    ];
    let wires = vec![
        wire("V", 0, "PB", 0),
        wire("V", 0, "C", 2),
        wire("PB", 1, "C", 0),
        wire("PB", 1, "C", 3),
        wire("C", 1, "V", 1),
        wire("V", 1, "G", 0),
    ];
    let out = simulate_circuit(&req(components, wires)).unwrap();
    assert_eq!(out.contactor_states["C"], true);

    // Without the button ever closing, the coil never sees supply and the
    // pole has nothing to seal in.
    let components_open = vec![
        comp("V", ComponentKind::VoltageSource, json!({"value": 24})),
        comp("PB", ComponentKind::PushButton, json!({"closed": false})),
        comp("C", ComponentKind::Contactor, json!({"pullInVoltage": 10})),
        comp("G", ComponentKind::Ground, json!({})),
    ];
    let wires_open = vec![
        wire("V", 0, "PB", 0),
        wire("V", 0, "C", 2),
        wire("PB", 1, "C", 0),
        wire("PB", 1, "C", 3),
        wire("C", 1, "V", 1),
        wire("V", 1, "G", 0),
    ];
    let out_open = simulate_circuit(&req(components_open, wires_open)).unwrap();
    assert_eq!(out_open.contactor_states["C"], false);
}

#[test]
fn ac_series_rl_current_matches_impedance_divider() {
    let components = vec![
        comp("V", ComponentKind::VoltageSource, json!({"supplyType": "AC1", "value": 230, "frequency": 50})),
        comp("R", ComponentKind::Resistor, json!({"value": 10})),
        comp("L", ComponentKind::Inductor, json!({"value": 0.1})),
        comp("G", ComponentKind::Ground, json!({})),
    ];
    let wires = vec![
        wire("V", 0, "R", 0),
        wire("R", 1, "L", 0),
        wire("L", 1, "V", 1),
        wire("V", 1, "G", 0),
    ];
    let measured = measure(&MeasureRequest {
        components,
        wires,
        sim_time: Some(0),
        mode: MeasureMode::AcCurrent,
        a_ref: None,
        b_ref: None,
        component_id: Some("R".to_string()),
    })
    .unwrap();
    // |230 / (10 + j*2*pi*50*0.1)|
    let expected = 6.9762328342271145;
    assert!((measured.value.unwrap() - expected).abs() < 1e-6);
}

fn motor3ph_components_and_wires(swapped: bool) -> (Vec<Component>, Vec<Wire>) {
    let components = vec![
        comp(
            "V",
            ComponentKind::VoltageSource,
            json!({"supplyType": "AC3", "connection": "Y", "value": 400, "frequency": 50}),
        ),
        comp("M", ComponentKind::Motor3ph, json!({"value": 12, "connection": "Y", "startVoltage": 100})),
        comp("G", ComponentKind::Ground, json!({})),
    ];
    let wires = if swapped {
        vec![
            wire("V", 0, "M", 0),
            wire("V", 1, "M", 2),
            wire("V", 2, "M", 1),
            wire("V", 3, "G", 0),
        ]
    } else {
        vec![
            wire("V", 0, "M", 0),
            wire("V", 1, "M", 1),
            wire("V", 2, "M", 2),
            wire("V", 3, "G", 0),
        ]
    };
    (components, wires)
}

#[test]
fn motor3ph_direction_flips_when_two_phases_are_swapped() {
    let (components, wires) = motor3ph_components_and_wires(false);
    let out = simulate_circuit(&req(components, wires)).unwrap();
    assert_eq!(out.motor3ph_direction["M"], "cw");

    let (components, wires) = motor3ph_components_and_wires(true);
    let out = simulate_circuit(&req(components, wires)).unwrap();
    assert_eq!(out.motor3ph_direction["M"], "ccw");
}

#[test]
fn ungrounded_island_is_flagged_without_disturbing_the_grounded_loop() {
    let components = vec![
        comp("V", ComponentKind::VoltageSource, json!({"value": 24})),
        comp("R1", ComponentKind::Resistor, json!({"value": 48})),
        comp("G", ComponentKind::Ground, json!({})),
        // V2/R2 form a closed loop with no wire at all back to the
        // grounded network above, so their nodes have no path to node 0.
        comp("V2", ComponentKind::VoltageSource, json!({"value": 10})),
        comp("R2", ComponentKind::Resistor, json!({"value": 50})),
    ];
    let wires = vec![
        wire("V", 0, "R1", 0),
        wire("V", 1, "R1", 1),
        wire("V", 1, "G", 0),
        wire("V2", 0, "R2", 0),
        wire("V2", 1, "R2", 1),
    ];
    let out = simulate_circuit(&req(components, wires)).unwrap();

    let hot = out.solution.terminal_nodes["V:0"];
    assert!((out.solution.node_voltages[hot] - 24.0).abs() < 1e-9);
    assert!((out.solution.source_currents["V"].abs() - 0.5).abs() < 1e-9);

    assert_eq!(out.solve_errors.get("R2").map(String::as_str), Some("Ungrounded subcircuit (DC)"));
}

#[test]
fn node_count_is_always_at_least_one() {
    let out = simulate_circuit(&req(vec![], vec![])).unwrap();
    assert!(!out.solution.node_voltages.is_empty());
}

#[test]
fn single_ac_frequency_is_accepted_and_mismatched_frequencies_are_rejected() {
    let components = vec![
        comp("V1", ComponentKind::VoltageSource, json!({"supplyType": "AC1", "value": 10, "frequency": 50})),
        comp("V2", ComponentKind::VoltageSource, json!({"supplyType": "AC1", "value": 10, "frequency": 60})),
        comp("R", ComponentKind::Resistor, json!({"value": 10})),
        comp("G", ComponentKind::Ground, json!({})),
    ];
    assert_eq!(ac_frequencies(&components).len(), 2);
    let wires = vec![wire("V1", 0, "R", 0), wire("V1", 1, "R", 1), wire("V1", 1, "G", 0)];
    let err = simulate_circuit(&req(components, wires)).unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[test]
fn dc_model_for_the_resistor_loop_has_one_resistor_and_one_source() {
    let components = vec![
        comp("V", ComponentKind::VoltageSource, json!({"value": 24})),
        comp("R", ComponentKind::Resistor, json!({"value": 48})),
        comp("G", ComponentKind::Ground, json!({})),
    ];
    let wires = vec![wire("V", 0, "R", 0), wire("V", 1, "R", 1), wire("V", 1, "G", 0)];
    let topo = relaic_core::build_topology(&components, &wires);
    let contactors = Default::default();
    let timers = Default::default();
    let plcs = Default::default();
    let model = build_model_dc(&components, &topo, &contactors, &timers, &plcs);
    assert_eq!(model.resistors.len(), 1);
    assert_eq!(model.sources.len(), 1);
}
