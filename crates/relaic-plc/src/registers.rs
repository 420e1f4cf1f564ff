//! Per-PLC timer, counter, and edge-trigger state that persists across
//! fixed-point iterations and solve calls (`spec.md` §4.9).

use serde::{Deserialize, Serialize};

use crate::instruction::{CounterKind, TimerKind};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TimerReg {
    #[serde(rename = "startAt")]
    pub start_at: Option<i64>,
    pub q: bool,
}

impl TimerReg {
    /// Advance the timer one evaluation step and return its remaining
    /// time, if running (used for `nextTickMs`).
    pub fn run(&mut self, kind: TimerKind, delay_ms: i64, acc: bool, now_ms: i64) -> Option<i64> {
        match kind {
            TimerKind::Ton => {
                if acc {
                    let start = *self.start_at.get_or_insert(now_ms);
                    let elapsed = now_ms - start;
                    self.q = elapsed >= delay_ms;
                    Some((delay_ms - elapsed).max(0))
                } else {
                    self.start_at = None;
                    self.q = false;
                    None
                }
            }
            TimerKind::Tof => {
                if acc {
                    self.start_at = None;
                    self.q = true;
                    None
                } else {
                    let start = *self.start_at.get_or_insert(now_ms);
                    let elapsed = now_ms - start;
                    self.q = elapsed < delay_ms;
                    self.q.then_some((delay_ms - elapsed).max(0))
                }
            }
            TimerKind::Tp => {
                if self.start_at.is_none() && acc {
                    self.start_at = Some(now_ms);
                }
                if let Some(start) = self.start_at {
                    let elapsed = now_ms - start;
                    if elapsed >= delay_ms {
                        self.start_at = None;
                        self.q = false;
                        None
                    } else {
                        self.q = true;
                        Some(delay_ms - elapsed)
                    }
                } else {
                    self.q = false;
                    None
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CounterReg {
    pub cv: i64,
    pub pv: i64,
    pub prev: bool,
    pub q: bool,
    #[serde(default)]
    pub initialized: bool,
}

impl CounterReg {
    pub fn run(&mut self, kind: CounterKind, preset: i64, acc: bool) {
        if !self.initialized {
            self.initialized = true;
            if kind == CounterKind::Ctd {
                self.cv = preset;
            }
        }
        self.pv = preset;
        let rising = acc && !self.prev;
        if rising {
            match kind {
                CounterKind::Ctu => self.cv += 1,
                CounterKind::Ctd => self.cv -= 1,
            }
        }
        self.prev = acc;
        self.q = match kind {
            CounterKind::Ctu => self.cv >= self.pv,
            CounterKind::Ctd => self.cv <= 0,
        };
    }

    /// `S` on a counter: reset to its preset, force `q`.
    pub fn set(&mut self) {
        self.initialized = true;
        self.cv = self.pv;
        self.q = true;
    }

    /// `R` on a counter: reset to zero, clear `q`.
    pub fn reset(&mut self) {
        self.initialized = true;
        self.cv = 0;
        self.q = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ton_asserts_after_delay() {
        let mut t = TimerReg::default();
        t.run(TimerKind::Ton, 1000, true, 0);
        assert!(!t.q);
        t.run(TimerKind::Ton, 1000, true, 1500);
        assert!(t.q);
        t.run(TimerKind::Ton, 1000, false, 1600);
        assert!(!t.q);
    }

    #[test]
    fn ctu_counts_rising_edges() {
        let mut c = CounterReg::default();
        c.run(CounterKind::Ctu, 2, true);
        assert_eq!(c.cv, 1);
        c.run(CounterKind::Ctu, 2, true);
        assert_eq!(c.cv, 1);
        c.run(CounterKind::Ctu, 2, false);
        c.run(CounterKind::Ctu, 2, true);
        assert_eq!(c.cv, 2);
        assert!(c.q);
    }
}
