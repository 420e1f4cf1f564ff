//! Dense Gaussian elimination with partial pivoting.
//!
//! Ported deliberately by hand rather than delegated to `nalgebra`'s LU:
//! the fixed-point driver's shunt-retry contract depends on the exact
//! pivot threshold below, not on whatever a general decomposition
//! considers "singular".

use nalgebra::{DMatrix, DVector};
use num_complex::Complex;

use crate::error::{Error, Result};

/// Pivots smaller than this are treated as zero.
pub const PIVOT_EPSILON: f64 = 1e-12;

/// Solve a real linear system `Ax = b` by Gaussian elimination with
/// partial pivoting.
pub fn solve_dense(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    check_dims(a, b)?;
    let n = a.nrows();
    let mut aug = augment(a, b, n);
    eliminate(&mut aug, n, f64::abs)?;
    Ok(DVector::from_vec(back_substitute(&aug, n, 0.0)))
}

/// Solve a complex linear system `Ax = b` by Gaussian elimination with
/// partial pivoting.
pub fn solve_complex(
    a: &DMatrix<Complex<f64>>,
    b: &DVector<Complex<f64>>,
) -> Result<DVector<Complex<f64>>> {
    check_dims(a, b)?;
    let n = a.nrows();
    let mut aug = augment(a, b, n);
    eliminate(&mut aug, n, Complex::norm)?;
    Ok(DVector::from_vec(back_substitute(
        &aug,
        n,
        Complex::new(0.0, 0.0),
    )))
}

fn check_dims<T>(a: &DMatrix<T>, b: &DVector<T>) -> Result<()> {
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.nrows() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }
    Ok(())
}

fn augment<T: Copy>(a: &DMatrix<T>, b: &DVector<T>, n: usize) -> Vec<Vec<T>> {
    (0..n)
        .map(|i| {
            let mut row: Vec<T> = (0..n).map(|j| a[(i, j)]).collect();
            row.push(b[i]);
            row
        })
        .collect()
}

/// In-place forward elimination on an `n x (n+1)` augmented matrix.
fn eliminate<T>(aug: &mut [Vec<T>], n: usize, magnitude: impl Fn(T) -> f64) -> Result<()>
where
    T: Copy
        + std::ops::Sub<Output = T>
        + std::ops::Mul<Output = T>
        + std::ops::Div<Output = T>,
{
    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&r1, &r2| {
                magnitude(aug[r1][col])
                    .partial_cmp(&magnitude(aug[r2][col]))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap();
        if magnitude(aug[pivot_row][col]) < PIVOT_EPSILON {
            return Err(Error::SingularMatrix);
        }
        aug.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = aug[row][col] / aug[col][col];
            if magnitude(factor) == 0.0 {
                continue;
            }
            for k in col..=n {
                aug[row][k] = aug[row][k] - factor * aug[col][k];
            }
        }
    }
    Ok(())
}

fn back_substitute<T>(aug: &[Vec<T>], n: usize, zero: T) -> Vec<T>
where
    T: Copy
        + std::ops::Sub<Output = T>
        + std::ops::Mul<Output = T>
        + std::ops::Div<Output = T>
        + std::ops::AddAssign,
{
    let mut x = vec![zero; n];
    for i in (0..n).rev() {
        let mut sum = aug[i][n];
        for j in (i + 1)..n {
            sum = sum - aug[i][j] * x[j];
        }
        x[i] = sum / aug[i][i];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{dmatrix, dvector};

    #[test]
    fn test_solve_simple() {
        let a = dmatrix![2.0, 1.0; 1.0, 3.0];
        let b = dvector![5.0, 6.0];
        let x = solve_dense(&a, &b).unwrap();
        assert!((x[0] - 1.8).abs() < 1e-10);
        assert!((x[1] - 1.4).abs() < 1e-10);
    }

    #[test]
    fn test_singular_matrix() {
        let a = dmatrix![1.0, 2.0; 2.0, 4.0];
        let b = dvector![1.0, 2.0];
        let result = solve_dense(&a, &b);
        assert!(matches!(result, Err(Error::SingularMatrix)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = dmatrix![1.0, 2.0; 3.0, 4.0];
        let b = dvector![1.0, 2.0, 3.0];
        let result = solve_dense(&a, &b);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_solve_complex_simple() {
        let a = dmatrix![
            Complex::new(2.0, 1.0), Complex::new(1.0, 0.0);
            Complex::new(1.0, 0.0), Complex::new(3.0, -1.0)
        ];
        let b = dvector![Complex::new(5.0, 1.0), Complex::new(6.0, 0.0)];
        let x = solve_complex(&a, &b).unwrap();

        let ax0 = a[(0, 0)] * x[0] + a[(0, 1)] * x[1];
        let ax1 = a[(1, 0)] * x[0] + a[(1, 1)] * x[1];
        assert!((ax0 - b[0]).norm() < 1e-9);
        assert!((ax1 - b[1]).norm() < 1e-9);
    }

    #[test]
    fn test_three_by_three() {
        let a = dmatrix![
            2.0, -1.0, 0.0;
            -1.0, 2.0, -1.0;
            0.0, -1.0, 2.0
        ];
        let b = dvector![1.0, 0.0, 1.0];
        let x = solve_dense(&a, &b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-9);
        assert!((x[1] - 1.0).abs() < 1e-9);
        assert!((x[2] - 1.0).abs() < 1e-9);
    }
}
