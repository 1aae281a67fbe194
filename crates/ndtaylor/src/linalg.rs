//! Dense square-matrix linear algebra on faer's partially pivoted LU.

use faer::Mat;
use faer::linalg::solvers::{PartialPivLu, Solve};

use crate::backend::{AsFaerMat, tensor_from_faer_mat};
use crate::error::TensorError;
use crate::operations::square_size;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// LU factors of a square matrix with its pivot diagnostics.
struct Factored<T: Scalar> {
    lu: PartialPivLu<T>,
    n: usize,
    smallest_pivot: f64,
    threshold: f64,
}

impl<T: Scalar> Factored<T> {
    fn new(matrix: &Tensor<T>) -> Result<Self, TensorError> {
        let n = square_size(matrix)?;
        let lu = matrix.as_faer_mat(n, n).partial_piv_lu();
        let u = lu.U();
        let smallest_pivot = (0..n)
            .map(|i| u[(i, i)].modulus())
            .fold(f64::INFINITY, f64::min);
        Ok(Self {
            lu,
            n,
            smallest_pivot,
            threshold: n as f64 * f64::EPSILON * matrix.max_abs(),
        })
    }

    fn is_singular(&self) -> bool {
        self.n > 0 && self.smallest_pivot <= self.threshold
    }

    /// Product of U's diagonal, signed by the parity of the row permutation.
    fn determinant(&self) -> T {
        if self.is_singular() {
            return T::zero();
        }
        let u = self.lu.U();
        let det = (0..self.n).fold(T::one(), |acc, i| acc * u[(i, i)]);
        if permutation_is_odd(self.lu.P().arrays().0) {
            -det
        } else {
            det
        }
    }
}

fn permutation_is_odd(forward: &[usize]) -> bool {
    let mut seen = vec![false; forward.len()];
    let mut transpositions = 0;
    for start in 0..forward.len() {
        let mut i = start;
        let mut len = 0usize;
        while !seen[i] {
            seen[i] = true;
            i = forward[i];
            len += 1;
        }
        transpositions += len.saturating_sub(1);
    }
    transpositions % 2 == 1
}

/// Determinant of a square matrix.
///
/// Returns exactly zero for numerically singular input.
///
/// # Errors
///
/// Returns `RankMismatch` or `NotSquareMatrix` for non-square input.
///
/// # Example
///
/// ```
/// use ndtaylor::Tensor;
/// use ndtaylor::linalg::determinant;
///
/// let m = Tensor::from_vec(vec![1.0, 3.0, 2.0, 4.0], &[2, 2]).unwrap();
/// assert!((determinant(&m).unwrap() + 2.0).abs() < 1e-12);
/// ```
pub fn determinant<T: Scalar>(matrix: &Tensor<T>) -> Result<T, TensorError> {
    Ok(Factored::new(matrix)?.determinant())
}

/// Inverse of a square matrix.
///
/// # Errors
///
/// Returns `SingularMatrix` when a pivot falls below `n * eps * max|a|`,
/// and `RankMismatch` or `NotSquareMatrix` for non-square input.
///
/// # Example
///
/// ```
/// use ndtaylor::Tensor;
/// use ndtaylor::linalg::inverse;
///
/// let m = Tensor::from_diag(&[2.0, 4.0]);
/// let inv = inverse(&m).unwrap();
/// assert_eq!(inv.get(&[1, 1]), Some(&0.25));
/// ```
pub fn inverse<T: Scalar>(matrix: &Tensor<T>) -> Result<Tensor<T>, TensorError> {
    let factored = Factored::new(matrix)?;
    if factored.is_singular() {
        return Err(TensorError::SingularMatrix {
            pivot: factored.smallest_pivot,
        });
    }

    let n = factored.n;
    let mut x_mat = Mat::from_fn(n, n, |i, j| if i == j { T::one() } else { T::zero() });
    factored.lu.solve_in_place(&mut x_mat);

    tensor_from_faer_mat(x_mat.as_ref())
}
