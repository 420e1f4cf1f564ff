//! Modified Nodal Analysis: conductance stamping and voltage-source
//! constraint rows over a flattened node set.

use indexmap::IndexMap;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex;

use crate::error::Result;
use crate::linear;

/// A resistive (or, for AC, impedance) element between two nodes.
/// `n1 == 0` or `n2 == 0` marks a terminal tied to ground.
#[derive(Debug, Clone, Copy)]
pub struct ResistorStamp<T> {
    pub n1: usize,
    pub n2: usize,
    pub value: T,
}

/// Floors a DC resistance away from zero before it's inverted into a
/// conductance, so a `value == 0.0` element doesn't stamp `Infinity`.
/// AC impedance is left untouched — a zero reactance is a legitimate
/// phasor value, not a degenerate resistor.
trait FloorResistance: Copy {
    fn floor_resistance(self) -> Self;
}

impl FloorResistance for f64 {
    fn floor_resistance(self) -> Self {
        self.max(1e-9)
    }
}

impl FloorResistance for Complex<f64> {
    fn floor_resistance(self) -> Self {
        self
    }
}

/// An ideal voltage source between two nodes, contributing one extra
/// unknown (its branch current) to the system.
#[derive(Debug, Clone)]
pub struct SourceStamp<T> {
    pub id: String,
    pub n1: usize,
    pub n2: usize,
    pub value: T,
}

/// The solved node voltages (index 0 is always ground) and the current
/// drawn through each named source.
#[derive(Debug, Clone)]
pub struct MnaSolution<T> {
    pub node_voltages: Vec<T>,
    pub source_currents: IndexMap<String, T>,
}

/// Solve a DC (real-valued) MNA system.
pub fn solve_mna(
    node_count: usize,
    resistors: &[ResistorStamp<f64>],
    sources: &[SourceStamp<f64>],
) -> Result<MnaSolution<f64>> {
    let (a, b) = assemble(node_count, resistors, sources, 1.0, 0.0);
    let x = linear::solve_dense(&a, &b)?;
    Ok(finish(node_count, sources, x, 0.0))
}

/// Solve an AC (phasor) MNA system at a single angular frequency.
pub fn solve_mna_ac(
    node_count: usize,
    resistors: &[ResistorStamp<Complex<f64>>],
    sources: &[SourceStamp<Complex<f64>>],
) -> Result<MnaSolution<Complex<f64>>> {
    let one = Complex::new(1.0, 0.0);
    let zero = Complex::new(0.0, 0.0);
    let (a, b) = assemble(node_count, resistors, sources, one, zero);
    let x = linear::solve_complex(&a, &b)?;
    Ok(finish(node_count, sources, x, zero))
}

fn assemble<T>(
    node_count: usize,
    resistors: &[ResistorStamp<T>],
    sources: &[SourceStamp<T>],
    one: T,
    zero: T,
) -> (DMatrix<T>, DVector<T>)
where
    T: nalgebra::Scalar
        + Copy
        + std::ops::Add<Output = T>
        + std::ops::Sub<Output = T>
        + std::ops::Neg<Output = T>
        + std::ops::Div<Output = T>
        + FloorResistance,
{
    let n = node_count.saturating_sub(1);
    let m = sources.len();
    let size = n + m;
    let mut a = DMatrix::from_element(size, size, zero);
    let mut b = DVector::from_element(size, zero);

    for r in resistors {
        let g = one / r.value.floor_resistance();
        if r.n1 != 0 {
            a[(r.n1 - 1, r.n1 - 1)] = a[(r.n1 - 1, r.n1 - 1)] + g;
        }
        if r.n2 != 0 {
            a[(r.n2 - 1, r.n2 - 1)] = a[(r.n2 - 1, r.n2 - 1)] + g;
        }
        if r.n1 != 0 && r.n2 != 0 {
            a[(r.n1 - 1, r.n2 - 1)] = a[(r.n1 - 1, r.n2 - 1)] - g;
            a[(r.n2 - 1, r.n1 - 1)] = a[(r.n2 - 1, r.n1 - 1)] - g;
        }
    }

    for (j, s) in sources.iter().enumerate() {
        let row = n + j;
        if s.n1 != 0 {
            a[(s.n1 - 1, row)] = a[(s.n1 - 1, row)] + one;
            a[(row, s.n1 - 1)] = a[(row, s.n1 - 1)] + one;
        }
        if s.n2 != 0 {
            a[(s.n2 - 1, row)] = a[(s.n2 - 1, row)] - one;
            a[(row, s.n2 - 1)] = a[(row, s.n2 - 1)] - one;
        }
        b[row] = s.value;
    }

    (a, b)
}

fn finish<T: Copy>(
    node_count: usize,
    sources: &[SourceStamp<T>],
    x: DVector<T>,
    zero: T,
) -> MnaSolution<T> {
    let n = node_count.saturating_sub(1);
    let mut node_voltages = vec![zero; node_count];
    for i in 0..n {
        node_voltages[i + 1] = x[i];
    }
    let mut source_currents = IndexMap::new();
    for (j, s) in sources.iter().enumerate() {
        source_currents.insert(s.id.clone(), x[n + j]);
    }
    MnaSolution {
        node_voltages,
        source_currents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_divider() {
        // 24V source across node 1-0, 48ohm to node 2, 48ohm node2-0.
        let resistors = vec![
            ResistorStamp {
                n1: 1,
                n2: 2,
                value: 48.0,
            },
            ResistorStamp {
                n1: 2,
                n2: 0,
                value: 48.0,
            },
        ];
        let sources = vec![SourceStamp {
            id: "V1".to_string(),
            n1: 1,
            n2: 0,
            value: 24.0,
        }];
        let sol = solve_mna(3, &resistors, &sources).unwrap();
        assert!((sol.node_voltages[1] - 24.0).abs() < 1e-9);
        assert!((sol.node_voltages[2] - 12.0).abs() < 1e-9);
        assert!((sol.source_currents["V1"] - (-0.25)).abs() < 1e-9);
    }

    #[test]
    fn singular_system_reports_error() {
        let resistors = vec![];
        let sources = vec![
            SourceStamp {
                id: "V1".to_string(),
                n1: 1,
                n2: 0,
                value: 5.0,
            },
            SourceStamp {
                id: "V2".to_string(),
                n1: 1,
                n2: 0,
                value: 5.0,
            },
        ];
        let result = solve_mna(2, &resistors, &sources);
        assert!(result.is_err());
    }
}
