//! Command-line front end for the Relaic circuit engine.
//!
//! Thin dispatch over [`relaic::simulate_circuit`], [`relaic::measure`],
//! and `relaic_store`'s save/load/list/delete operations — all the
//! actual engine and persistence logic lives in those library crates.

mod circuit;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relaic_core::Terminal;

use circuit::CircuitFile;

#[derive(Parser)]
#[command(name = "relaic", version, about = "Didactic electrical circuit simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a circuit to its settled discrete state and print the readouts.
    Simulate {
        /// Path to a JSON file with `components` and `wires`.
        circuit: PathBuf,
        /// Override the simulation clock (milliseconds), falls back to the file's own value.
        #[arg(long)]
        sim_time: Option<i64>,
    },
    /// Take a single measurement against a circuit.
    Measure {
        circuit: PathBuf,
        /// voltage | ac_voltage | ac_phase | current | ac_current | ac_power_p | ac_power_q | ac_power_s | ac_pf | resistance
        #[arg(long)]
        mode: String,
        /// Probe terminal A, as `compId:index`.
        #[arg(long, value_parser = parse_terminal)]
        a_ref: Option<Terminal>,
        /// Probe terminal B, as `compId:index`.
        #[arg(long, value_parser = parse_terminal)]
        b_ref: Option<Terminal>,
        /// Component id to measure current/power/resistance through.
        #[arg(long)]
        component_id: Option<String>,
        #[arg(long)]
        sim_time: Option<i64>,
    },
    /// Save a circuit snapshot under a name.
    Save {
        circuit: PathBuf,
        #[arg(long)]
        name: String,
        /// Overwrite an existing save by id instead of matching on name.
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        saves_dir: SavesDirArg,
    },
    /// Print a saved circuit's snapshot as JSON.
    Load {
        id: String,
        #[command(flatten)]
        saves_dir: SavesDirArg,
    },
    /// List saved circuits, newest first.
    ListSaves {
        #[command(flatten)]
        saves_dir: SavesDirArg,
    },
    /// Delete a saved circuit.
    DeleteSave {
        id: String,
        #[command(flatten)]
        saves_dir: SavesDirArg,
    },
}

#[derive(clap::Args)]
struct SavesDirArg {
    /// Directory saves are read from/written to (falls back to $RELAIC_SAVES_DIR, then ./relaic-saves).
    #[arg(long)]
    saves_dir: Option<PathBuf>,
}

impl SavesDirArg {
    fn resolve(&self) -> PathBuf {
        self.saves_dir
            .clone()
            .or_else(|| std::env::var_os("RELAIC_SAVES_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("./relaic-saves"))
    }
}

fn parse_terminal(s: &str) -> Result<Terminal, String> {
    let (comp_id, index) = s.split_once(':').ok_or_else(|| format!("expected `compId:index`, got `{s}`"))?;
    let index = index.parse::<usize>().map_err(|e| e.to_string())?;
    Ok(Terminal { comp_id: comp_id.to_string(), index })
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Simulate { circuit, sim_time } => {
            let file = CircuitFile::load(&circuit)?;
            let req = file.into_request(sim_time);
            let response = relaic::simulate_circuit(&req).map_err(|e| anyhow::anyhow!(exit_tagged(e)))?;
            output::print_simulate_response(&response);
            Ok(())
        }
        Command::Measure { circuit, mode, a_ref, b_ref, component_id, sim_time } => {
            let file = CircuitFile::load(&circuit)?;
            let mode_value = serde_json::Value::String(mode.clone());
            let mode = serde_json::from_value(mode_value)
                .with_context(|| format!("unknown measurement mode `{mode}`"))?;
            let req = relaic::types::MeasureRequest {
                components: file.components,
                wires: file.wires,
                sim_time: sim_time.or(file.sim_time),
                mode,
                a_ref,
                b_ref,
                component_id,
            };
            let response = relaic::measure(&req).map_err(|e| anyhow::anyhow!(exit_tagged(e)))?;
            output::print_measure_response(&response);
            Ok(())
        }
        Command::Save { circuit, name, id, saves_dir } => {
            let file = CircuitFile::load(&circuit)?;
            let snapshot = serde_json::to_value(&file).context("serializing circuit for storage")?;
            let dir = saves_dir.resolve();
            let summary = relaic_store::save_snapshot(&dir, &name, snapshot, id.as_deref())
                .with_context(|| format!("saving into {}", dir.display()))?;
            output::print_save_summary(&summary);
            Ok(())
        }
        Command::Load { id, saves_dir } => {
            let dir = saves_dir.resolve();
            let snapshot = relaic_store::load_snapshot(&dir, &id).with_context(|| format!("loading {id} from {}", dir.display()))?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        Command::ListSaves { saves_dir } => {
            let dir = saves_dir.resolve();
            let saves = relaic_store::list_saves(&dir).with_context(|| format!("listing {}", dir.display()))?;
            output::print_saves(&saves);
            Ok(())
        }
        Command::DeleteSave { id, saves_dir } => {
            let dir = saves_dir.resolve();
            relaic_store::delete_save(&dir, &id).with_context(|| format!("deleting {id} from {}", dir.display()))?;
            println!("deleted {id}");
            Ok(())
        }
    }
}

/// Render a `RelaicError` with its status code folded into the message,
/// since the CLI has no HTTP response to carry it in.
fn exit_tagged(err: relaic::RelaicError) -> String {
    format!("[{}] {err}", err.status_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_terminal_reference() {
        let t = parse_terminal("R1:0").unwrap();
        assert_eq!(t.comp_id, "R1");
        assert_eq!(t.index, 0);
    }

    #[test]
    fn rejects_a_malformed_terminal_reference() {
        assert!(parse_terminal("R1").is_err());
        assert!(parse_terminal("R1:x").is_err());
    }

    #[test]
    fn saves_dir_arg_falls_back_to_the_default() {
        let arg = SavesDirArg { saves_dir: None };
        // SAFETY-free: just avoid depending on the real environment in this test.
        unsafe { std::env::remove_var("RELAIC_SAVES_DIR") };
        assert_eq!(arg.resolve(), PathBuf::from("./relaic-saves"));
    }
}
