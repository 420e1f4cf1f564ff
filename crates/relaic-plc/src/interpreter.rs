//! The ladder/statement-list interpreter: one pass over `program`,
//! maintaining ACC and the per-PLC timer/counter/memory/edge registers
//! (`spec.md` §4.9).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::instruction::{Instruction, parse_line};
use crate::operand::Operand;
use crate::registers::{CounterReg, TimerReg};

/// Trace lines beyond this cap are dropped and replaced by one summary
/// line (`spec.md` §4.9).
pub const TRACE_CAP: usize = 200;

/// Per-PLC state that survives across solve calls: timer/counter
/// registers, latched memory bits, edge-trigger history, and the last
/// run's trace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlcMeta {
    pub timers: IndexMap<String, TimerReg>,
    pub mem: IndexMap<String, bool>,
    pub counters: IndexMap<String, CounterReg>,
    pub trig: IndexMap<String, bool>,
    pub trace: Vec<String>,
    #[serde(rename = "nextTickMs", skip_serializing_if = "Option::is_none")]
    pub next_tick_ms: Option<i64>,
}

struct Trace {
    lines: Vec<String>,
    overflowed: usize,
}

impl Trace {
    fn new() -> Self {
        Trace { lines: Vec::new(), overflowed: 0 }
    }

    fn push(&mut self, line: String) {
        if self.lines.len() < TRACE_CAP {
            self.lines.push(line);
        } else {
            self.overflowed += 1;
        }
    }

    fn finish(mut self) -> Vec<String> {
        if self.overflowed > 0 {
            self.lines.push(format!("... {} more lines ...", self.overflowed));
        }
        self.lines
    }
}

struct Engine<'a> {
    inputs: &'a [bool],
    outputs: Vec<bool>,
    mem: IndexMap<String, bool>,
    timers: IndexMap<String, TimerReg>,
    counters: IndexMap<String, CounterReg>,
    trig: IndexMap<String, bool>,
    next_tick_ms: Option<i64>,
}

impl Engine<'_> {
    fn read(&self, op: Operand) -> bool {
        match op {
            Operand::Input(i) => self.inputs.get(i).copied().unwrap_or(false),
            Operand::Output(i) => self.outputs.get(i).copied().unwrap_or(false),
            Operand::Memory(_) => self.mem.get(&op.canonical()).copied().unwrap_or(false),
            Operand::Counter(_) => self.counters.get(&op.canonical()).map(|c| c.q).unwrap_or(false),
            Operand::Timer(_) => self.timers.get(&op.canonical()).map(|t| t.q).unwrap_or(false),
        }
    }

    fn write(&mut self, op: Operand, value: bool) {
        match op {
            Operand::Output(i) => {
                if i < self.outputs.len() {
                    self.outputs[i] = value;
                }
            }
            Operand::Memory(_) => {
                self.mem.insert(op.canonical(), value);
            }
            _ => {}
        }
    }

    fn note_remaining(&mut self, remaining: Option<i64>) {
        if let Some(r) = remaining {
            self.next_tick_ms = Some(self.next_tick_ms.map_or(r, |m| m.min(r)));
        }
    }
}

/// Run one scan of `program` (language `LAD`; anything else is a no-op
/// traced with an explanatory line).
pub fn evaluate(
    program: &str,
    language: &str,
    inputs: &[bool],
    prior_outputs: &[bool],
    outputs_len: usize,
    prior_meta: &PlcMeta,
    now_ms: i64,
) -> (Vec<bool>, PlcMeta) {
    let mut trace = Trace::new();
    let mut outputs = prior_outputs.to_vec();
    outputs.resize(outputs_len, false);

    if !language.eq_ignore_ascii_case("LAD") {
        log::warn!("plc program requested unsupported language '{language}', skipping scan");
        trace.push(format!("unsupported language '{language}', no-op"));
        return (
            outputs,
            PlcMeta {
                timers: prior_meta.timers.clone(),
                mem: prior_meta.mem.clone(),
                counters: prior_meta.counters.clone(),
                trig: prior_meta.trig.clone(),
                trace: trace.finish(),
                next_tick_ms: None,
            },
        );
    }

    let mut engine = Engine {
        inputs,
        outputs,
        mem: prior_meta.mem.clone(),
        timers: prior_meta.timers.clone(),
        counters: prior_meta.counters.clone(),
        trig: prior_meta.trig.clone(),
        next_tick_ms: None,
    };

    trace.push(format!("in: {}", snapshot(inputs)));

    let mut acc: Option<bool> = None;
    for raw_line in program.lines() {
        let instr = parse_line(raw_line);
        match instr {
            Instruction::Empty => {
                acc = None;
                continue;
            }
            Instruction::Load(op) => acc = Some(engine.read(op)),
            Instruction::And(op) => {
                let v = engine.read(op);
                acc = Some(acc.map_or(v, |a| a && v));
            }
            Instruction::AndNot(op) => {
                let v = !engine.read(op);
                acc = Some(acc.map_or(v, |a| a && v));
            }
            Instruction::Or(op) => {
                let v = engine.read(op);
                acc = Some(acc.map_or(v, |a| a || v));
            }
            Instruction::OrNot(op) => {
                let v = !engine.read(op);
                acc = Some(acc.map_or(v, |a| a || v));
            }
            Instruction::Assign(targets) => {
                let v = acc.unwrap_or(false);
                for t in targets {
                    engine.write(t, v);
                }
            }
            Instruction::Set(op) => {
                if acc.unwrap_or(false) {
                    if let Operand::Counter(_) = op {
                        engine.counters.entry(op.canonical()).or_default().set();
                    } else {
                        engine.write(op, true);
                    }
                }
            }
            Instruction::Reset(op) => {
                if acc.unwrap_or(false) {
                    if let Operand::Counter(_) = op {
                        engine.counters.entry(op.canonical()).or_default().reset();
                    } else {
                        engine.write(op, false);
                    }
                }
            }
            Instruction::Move { src, dst } => {
                let v = engine.read(src);
                engine.write(dst, v);
            }
            Instruction::Timer { kind, target, seconds } => {
                let delay_ms = (seconds * 1000.0).round() as i64;
                let acc_val = acc.unwrap_or(false);
                let key = target.canonical();
                let reg = engine.timers.entry(key).or_default();
                let remaining = reg.run(kind, delay_ms, acc_val, now_ms);
                let q = reg.q;
                engine.note_remaining(remaining);
                acc = Some(q);
            }
            Instruction::Counter { kind, target, preset } => {
                let acc_val = acc.unwrap_or(false);
                let key = target.canonical();
                let reg = engine.counters.entry(key).or_default();
                reg.run(kind, preset.0, acc_val);
                acc = Some(reg.q);
            }
            Instruction::RisingTrig(op) => {
                let v = acc.unwrap_or(false);
                let key = format!("R:{}", op.canonical());
                let prev = engine.trig.get(&key).copied().unwrap_or(false);
                let pulse = v && !prev;
                engine.trig.insert(key, v);
                engine.write(op, pulse);
                acc = Some(pulse);
            }
            Instruction::FallingTrig(op) => {
                let v = acc.unwrap_or(false);
                let key = format!("F:{}", op.canonical());
                let prev = engine.trig.get(&key).copied().unwrap_or(false);
                let pulse = !v && prev;
                engine.trig.insert(key, v);
                engine.write(op, pulse);
                acc = Some(pulse);
            }
            Instruction::Transfer(op) => {
                let v = acc.unwrap_or(false);
                engine.write(op, v);
            }
            Instruction::Unrecognized(text) => {
                trace.push(format!("? {text}"));
                continue;
            }
        }

        trace.push(format!(
            "{} -> ACC={}",
            raw_line.trim(),
            acc.unwrap_or(false) as u8
        ));
    }

    trace.push(format!("out: {}", snapshot(&engine.outputs)));

    let meta = PlcMeta {
        timers: engine.timers,
        mem: engine.mem,
        counters: engine.counters,
        trig: engine.trig,
        trace: trace.finish(),
        next_tick_ms: engine.next_tick_ms,
    };
    (engine.outputs, meta)
}

fn snapshot(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}
