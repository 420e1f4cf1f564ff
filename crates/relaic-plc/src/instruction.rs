//! Per-line recursive-descent parsing of one ladder/statement-list
//! instruction (`spec.md` §4.9).

use crate::operand::{Operand, parse_operand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Ton,
    Tof,
    Tp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Ctu,
    Ctd,
}

/// Counter preset: either `PV=n` or a bare trailing integer.
#[derive(Debug, Clone, Copy)]
pub struct CounterPreset(pub i64);

#[derive(Debug, Clone)]
pub enum Instruction {
    /// A blank (comment-only) line — resets ACC.
    Empty,
    Load(Operand),
    And(Operand),
    AndNot(Operand),
    Or(Operand),
    OrNot(Operand),
    Assign(Vec<Operand>),
    Set(Operand),
    Reset(Operand),
    Move { src: Operand, dst: Operand },
    Timer { kind: TimerKind, target: Operand, seconds: f64 },
    Counter { kind: CounterKind, target: Operand, preset: CounterPreset },
    RisingTrig(Operand),
    FallingTrig(Operand),
    Transfer(Operand),
    /// Recognized structure but an operand didn't parse, or the opcode
    /// is unknown — traced, never executed.
    Unrecognized(String),
}

/// Strip a `;`, `//`, or `#` trailing comment and trim whitespace.
fn strip_comment(line: &str) -> &str {
    let mut cut = line.len();
    for pat in [";", "//", "#"] {
        if let Some(pos) = line.find(pat)
            && pos < cut
        {
            cut = pos;
        }
    }
    line[..cut].trim()
}

pub fn parse_line(raw: &str) -> Instruction {
    let line = strip_comment(raw);
    if line.is_empty() {
        return Instruction::Empty;
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let op = tokens[0].to_ascii_uppercase();
    let args = &tokens[1..];

    let operand_at = |i: usize| args.get(i).and_then(|t| parse_operand(t));

    match op.as_str() {
        "L" => operand_at(0).map(Instruction::Load),
        "A" | "U" => operand_at(0).map(Instruction::And),
        "AN" | "UN" => operand_at(0).map(Instruction::AndNot),
        "O" => operand_at(0).map(Instruction::Or),
        "ON" => operand_at(0).map(Instruction::OrNot),
        "=" => {
            let targets: Vec<Operand> = args.iter().filter_map(|t| parse_operand(t)).collect();
            (!targets.is_empty()).then_some(Instruction::Assign(targets))
        }
        "S" => operand_at(0).map(Instruction::Set),
        "R" => operand_at(0).map(Instruction::Reset),
        "T" => operand_at(0).map(Instruction::Transfer),
        "MOVE" => match (operand_at(0), operand_at(1)) {
            (Some(src), Some(dst)) => Some(Instruction::Move { src, dst }),
            _ => None,
        },
        "TON" | "TOF" | "TP" => {
            let kind = match op.as_str() {
                "TON" => TimerKind::Ton,
                "TOF" => TimerKind::Tof,
                _ => TimerKind::Tp,
            };
            match (operand_at(0), args.get(1).and_then(|s| s.parse::<f64>().ok())) {
                (Some(target), Some(seconds)) => Some(Instruction::Timer { kind, target, seconds }),
                _ => None,
            }
        }
        "CTU" | "CTD" => {
            let kind = if op == "CTU" { CounterKind::Ctu } else { CounterKind::Ctd };
            let preset = args
                .get(1)
                .and_then(|raw| {
                    raw.strip_prefix("PV=")
                        .or_else(|| raw.strip_prefix("pv="))
                        .unwrap_or(raw)
                        .parse::<i64>()
                        .ok()
                })
                .unwrap_or(1);
            operand_at(0).map(|target| Instruction::Counter {
                kind,
                target,
                preset: CounterPreset(preset),
            })
        }
        "R_TRIG" => operand_at(0).map(Instruction::RisingTrig),
        "F_TRIG" => operand_at(0).map(Instruction::FallingTrig),
        _ => {
            // A bare operand continues a preceding `=` assignment chain.
            if let Some(op) = parse_operand(tokens[0])
                && tokens.len() == 1
            {
                Some(Instruction::Assign(vec![op]))
            } else {
                None
            }
        }
    }
    .unwrap_or_else(|| Instruction::Unrecognized(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_rung() {
        assert!(matches!(parse_line("L I1"), Instruction::Load(Operand::Input(0))));
        assert!(matches!(parse_line("A I2"), Instruction::And(Operand::Input(1))));
        assert!(matches!(parse_line("= Q1"), Instruction::Assign(_)));
    }

    #[test]
    fn strips_comments() {
        assert!(matches!(parse_line("L I1 ; comment"), Instruction::Load(Operand::Input(0))));
        assert!(matches!(parse_line("  // full line comment"), Instruction::Empty));
        assert!(matches!(parse_line(""), Instruction::Empty));
    }

    #[test]
    fn bare_operand_continues_assign() {
        assert!(matches!(parse_line("Q2"), Instruction::Assign(_)));
    }

    #[test]
    fn timer_with_seconds() {
        match parse_line("TON T1 2.5") {
            Instruction::Timer { kind: TimerKind::Ton, target: Operand::Timer(0), seconds } => {
                assert!((seconds - 2.5).abs() < 1e-9);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn counter_preset_forms() {
        match parse_line("CTU C1 PV=5") {
            Instruction::Counter { preset: CounterPreset(5), .. } => {}
            other => panic!("unexpected: {other:?}"),
        }
        match parse_line("CTD C1 3") {
            Instruction::Counter { preset: CounterPreset(3), .. } => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unknown_opcode_is_traced_not_executed() {
        assert!(matches!(parse_line("FOO BAR"), Instruction::Unrecognized(_)));
    }
}
