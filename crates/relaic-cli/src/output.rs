//! Human-readable rendering of engine responses.

use relaic::types::{MeasureResponse, SimulateResponse};
use relaic_store::SaveSummary;

pub fn print_simulate_response(res: &SimulateResponse) {
    println!("Node Voltages:");
    for (i, v) in res.solution.node_voltages.iter().enumerate() {
        println!("  node[{i}] = {v:.6} V");
    }

    if !res.solution.source_currents.is_empty() {
        println!();
        println!("Source Currents:");
        for (id, i) in &res.solution.source_currents {
            println!("  I({id}) = {i:.6} A");
        }
    }

    if !res.contactor_states.is_empty() {
        println!();
        println!("Contactors:");
        for (id, energized) in &res.contactor_states {
            println!("  {id}: {}", if *energized { "energized" } else { "de-energized" });
        }
    }

    if !res.lamp_lit.is_empty() {
        println!();
        println!("Lamps:");
        for (id, lit) in &res.lamp_lit {
            println!("  {id}: {}", if *lit { "lit" } else { "dark" });
        }
    }

    if !res.motor_running.is_empty() {
        println!();
        println!("Motors:");
        for (id, running) in &res.motor_running {
            let dir = res.motor3ph_direction.get(id).map(String::as_str);
            match dir {
                Some(dir) if *running => println!("  {id}: running ({dir})"),
                _ => println!("  {id}: {}", if *running { "running" } else { "stopped" }),
            }
        }
    }

    if !res.faults.is_empty() {
        println!();
        println!("Faults:");
        for (id, msg) in &res.faults {
            println!("  {id}: {msg}");
        }
    }

    if !res.solve_errors.is_empty() {
        println!();
        println!("Solve Errors:");
        for (id, msg) in &res.solve_errors {
            println!("  {id}: {msg}");
        }
    }
    println!();
}

pub fn print_measure_response(res: &MeasureResponse) {
    match res.value {
        Some(v) => println!("{v:.6}"),
        None => println!("null"),
    }
}

pub fn print_save_summary(save: &SaveSummary) {
    println!("saved {} as {} (updated {})", save.name, save.id, save.updated_at);
}

pub fn print_saves(saves: &[SaveSummary]) {
    if saves.is_empty() {
        println!("(no saves)");
        return;
    }
    for save in saves {
        println!("{}  {}  updated {}", save.id, save.name, save.updated_at);
    }
}
