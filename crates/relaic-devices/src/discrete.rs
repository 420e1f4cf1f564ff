//! Discrete-state evaluators: contactor pull-in, on/off-delay timer, and
//! the wall-clock schedule timer (`spec.md` §4.6-§4.8).

use std::time::{SystemTime, UNIX_EPOCH};

use num_complex::Complex;
use relaic_core::{Component, ComponentKind, Topology};

use crate::measure::{EPSILON_V, voltage_magnitude};
use crate::state::TimerState;

/// Default coil pull-in voltage when a component omits `pullInVoltage`:
/// any nonzero coil voltage energizes it.
pub const DEFAULT_PULL_IN_V: f64 = 0.0;

/// Default on/off-delay when a `timer` component omits `delayMs`.
pub const DEFAULT_DELAY_MS: i64 = 1000;

pub fn evaluate_contactor(comp: &Component, topo: &Topology, dc: &[f64], ac: &[Complex<f64>]) -> bool {
    let pull_in = comp.props.f64("pullInVoltage", DEFAULT_PULL_IN_V);
    match voltage_magnitude(topo, &comp.id, 0, 1, dc, ac) {
        Some(dv) => dv + EPSILON_V >= pull_in,
        None => false,
    }
}

pub fn evaluate_timer(
    comp: &Component,
    topo: &Topology,
    dc: &[f64],
    ac: &[Complex<f64>],
    prior: TimerState,
    now_ms: i64,
) -> TimerState {
    let delay = comp.props.f64("delayMs", DEFAULT_DELAY_MS as f64) as i64;
    let loops = comp.props.bool("loop", false);
    let initial_closed = comp.props.bool("initialClosed", false);
    let pull_in = comp.props.f64("pullInVoltage", DEFAULT_PULL_IN_V);

    let energized = match voltage_magnitude(topo, &comp.id, 0, 1, dc, ac) {
        Some(dv) => dv + EPSILON_V >= pull_in,
        None => false,
    };

    if !energized {
        return TimerState {
            running: false,
            start_at: None,
            output_closed: initial_closed,
            remaining_ms: delay,
        };
    }

    if !prior.running {
        return TimerState {
            running: true,
            start_at: Some(now_ms),
            output_closed: prior.output_closed,
            remaining_ms: delay,
        };
    }

    let elapsed = now_ms - prior.start_at.unwrap_or(now_ms);
    if elapsed >= delay {
        if loops {
            TimerState {
                running: true,
                start_at: Some(now_ms),
                output_closed: !prior.output_closed,
                remaining_ms: delay,
            }
        } else {
            TimerState {
                running: false,
                start_at: prior.start_at,
                output_closed: true,
                remaining_ms: 0,
            }
        }
    } else {
        TimerState {
            running: true,
            start_at: prior.start_at,
            output_closed: prior.output_closed,
            remaining_ms: delay - elapsed,
        }
    }
}

/// Parse `HH:MM`, falling back to `fallback_minutes` on any malformed or
/// out-of-range input.
pub fn parse_hhmm(value: &str, fallback_minutes: i64) -> i64 {
    let Some((h, m)) = value.split_once(':') else {
        return fallback_minutes;
    };
    let (Ok(h), Ok(m)) = (h.trim().parse::<i64>(), m.trim().parse::<i64>()) else {
        return fallback_minutes;
    };
    if !(0..=23).contains(&h) || !(0..=59).contains(&m) {
        return fallback_minutes;
    }
    h * 60 + m
}

/// Minutes since UTC midnight, used as a stand-in for local wall-clock
/// time since the standard library has no timezone database.
pub fn now_minutes_utc() -> i64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    ((secs % 86_400) / 60) as i64
}

pub fn evaluate_time_timer(comp: &Component, now_minutes: i64) -> bool {
    debug_assert_eq!(comp.kind, ComponentKind::TimeTimer);
    let start = parse_hhmm(&comp.props.str("startTime", "08:00"), 8 * 60);
    let end = parse_hhmm(&comp.props.str("endTime", "17:00"), 17 * 60);
    if start == end {
        false
    } else if end > start {
        now_minutes >= start && now_minutes < end
    } else {
        now_minutes >= start || now_minutes < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hhmm_parses_valid_input() {
        assert_eq!(parse_hhmm("08:30", 0), 8 * 60 + 30);
    }

    #[test]
    fn hhmm_falls_back_on_garbage() {
        assert_eq!(parse_hhmm("nonsense", 42), 42);
        assert_eq!(parse_hhmm("25:00", 42), 42);
        assert_eq!(parse_hhmm("10:70", 42), 42);
    }

    #[test]
    fn time_timer_wraps_past_midnight() {
        let comp = Component {
            id: "T".into(),
            kind: ComponentKind::TimeTimer,
            props: serde_json::from_value(serde_json::json!({
                "startTime": "22:00",
                "endTime": "06:00"
            }))
            .unwrap(),
        };
        assert!(evaluate_time_timer(&comp, 23 * 60));
        assert!(evaluate_time_timer(&comp, 5 * 60));
        assert!(!evaluate_time_timer(&comp, 12 * 60));
    }
}
