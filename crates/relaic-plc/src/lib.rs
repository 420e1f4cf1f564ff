//! A small LAD-style ladder-logic interpreter. One PLC component's
//! `program` text is re-run every fixed-point iteration; timers,
//! counters, latched memory, and edge-trigger history persist across
//! calls via [`PlcMeta`].

pub mod instruction;
pub mod interpreter;
pub mod operand;
pub mod registers;

pub use interpreter::{PlcMeta, TRACE_CAP, evaluate};
pub use operand::Operand;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_in_latch_with_set_reset() {
        let program = "L I1\nO M1\nAN I2\n= M1\n= Q1";
        let meta = PlcMeta::default();

        // Press start (I1), stop (I2) released.
        let (out1, meta1) = evaluate(program, "LAD", &[true, false], &[false], 1, &meta, 0);
        assert_eq!(out1, vec![true]);

        // Release start; seal-in (M1) should hold Q1 on.
        let (out2, meta2) = evaluate(program, "LAD", &[false, false], &out1, 1, &meta1, 10);
        assert_eq!(out2, vec![true]);

        // Press stop.
        let (out3, _) = evaluate(program, "LAD", &[false, true], &out2, 1, &meta2, 20);
        assert_eq!(out3, vec![false]);
    }

    #[test]
    fn ton_timer_feeds_output() {
        let program = "L I1\nTON T1 1\n= Q1";
        let meta = PlcMeta::default();
        let (out, meta1) = evaluate(program, "LAD", &[true], &[false], 1, &meta, 0);
        assert_eq!(out, vec![false]);
        assert_eq!(meta1.next_tick_ms, Some(1000));

        let (out2, _) = evaluate(program, "LAD", &[true], &out, 1, &meta1, 1200);
        assert_eq!(out2, vec![true]);
    }

    #[test]
    fn unsupported_language_is_a_no_op() {
        let meta = PlcMeta::default();
        let (out, meta1) = evaluate("anything", "FBD", &[true], &[false], 1, &meta, 0);
        assert_eq!(out, vec![false]);
        assert!(meta1.trace[0].contains("unsupported language"));
    }
}
