//! Tensor contraction operations.
//!
//! Label-based contraction:
//! - Negative labels shared by both operands are summed over
//! - Positive labels shared by both operands are batch axes
//! - Other positive labels are kept in the output
//!
//! # Implementations
//!
//! - `naive`: Loop-based reference implementation
//! - `gemm`: Batched GEMM using faer (used by [`tensordot`])
//!
//! # Example
//!
//! ```
//! use ndtaylor::{Tensor, contract};
//!
//! // Matrix multiplication: C[i,k] = A[i,j] * B[j,k]
//! let a = Tensor::<f64>::ones(&[2, 3]);
//! let b = Tensor::<f64>::ones(&[3, 4]);
//! let c = contract(&a, &[1, -1], &b, &[-1, 2]).unwrap();
//! assert_eq!(c.shape(), &[2, 4]);
//! ```

mod gemm;
mod naive;
mod properties;

pub use gemm::contract_gemm;
pub use naive::contract;
pub use properties::ContractionProperties;

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Contract `axes_a` of `a` against `axes_b` of `b`, batched over the first
/// `shared` axes of both.
///
/// The result is laid out as `[shared..., free a..., free b...]`, free axes
/// keeping their original relative order.
///
/// # Errors
///
/// Returns `AxisOrder` if the axis lists differ in length, repeat an axis,
/// or name an axis outside `shared..ndim`. Shape errors come from the
/// contraction itself.
///
/// # Example
///
/// ```
/// use ndtaylor::Tensor;
/// use ndtaylor::contract::tensordot;
///
/// // Batched matrix-vector product over a leading axis of size 3.
/// let m: Tensor<f64> = Tensor::ones(&[3, 2, 4]);
/// let v: Tensor<f64> = Tensor::ones(&[3, 4]);
/// let r = tensordot(&m, &[2], &v, &[1], 1).unwrap();
/// assert_eq!(r.shape(), &[3, 2]);
/// assert_eq!(r.get(&[0, 1]), Some(&4.0));
/// ```
pub fn tensordot<T: Scalar>(
    a: &Tensor<T>,
    axes_a: &[usize],
    b: &Tensor<T>,
    axes_b: &[usize],
    shared: usize,
) -> Result<Tensor<T>, TensorError> {
    crate::operations::check_shared_axes(a, b, shared)?;
    if axes_a.len() != axes_b.len() {
        return Err(axis_error(axes_a, a.ndim(), "contracted axis lists differ in length"));
    }
    for (axes, ndim) in [(axes_a, a.ndim()), (axes_b, b.ndim())] {
        if axes.iter().any(|&ax| ax < shared || ax >= ndim) {
            return Err(axis_error(axes, ndim, "contracted axis out of range"));
        }
        if axes.iter().enumerate().any(|(i, ax)| axes[i + 1..].contains(ax)) {
            return Err(axis_error(axes, ndim, "contracted axis repeated"));
        }
    }

    let mut next = shared as i32;
    let mut fresh = || {
        next += 1;
        next
    };
    let labels_a: Vec<i32> = (0..a.ndim())
        .map(|i| match axes_a.iter().position(|&ax| ax == i) {
            _ if i < shared => i as i32 + 1,
            Some(p) => -(p as i32) - 1,
            None => fresh(),
        })
        .collect();
    let labels_b: Vec<i32> = (0..b.ndim())
        .map(|j| match axes_b.iter().position(|&ax| ax == j) {
            _ if j < shared => j as i32 + 1,
            Some(p) => -(p as i32) - 1,
            None => fresh(),
        })
        .collect();

    contract_gemm(a, &labels_a, b, &labels_b)
}

fn axis_error(axes: &[usize], ndim: usize, reason: &'static str) -> TensorError {
    TensorError::AxisOrder {
        axes: axes.iter().map(|&a| a as isize).collect(),
        base_rank: ndim,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::c64;
    use approx::assert_relative_eq;

    fn sample(shape: &[usize], seed: usize) -> Tensor<f64> {
        Tensor::from_fn(shape, |idx| {
            idx.iter()
                .enumerate()
                .map(|(k, &i)| ((i + 1) * (k + seed + 1)) as f64)
                .sum::<f64>()
                .sin()
        })
    }

    #[test]
    fn test_matmul_values() {
        let a = Tensor::from_vec(vec![1.0, 3.0, 2.0, 4.0], &[2, 2]).unwrap(); // [[1,2],[3,4]]
        let b = Tensor::from_vec(vec![5.0, 7.0, 6.0, 8.0], &[2, 2]).unwrap(); // [[5,6],[7,8]]
        let c = contract(&a, &[1, -1], &b, &[-1, 2]).unwrap();
        assert_eq!(c.data(), &[19.0, 43.0, 22.0, 50.0]);
        let g = contract_gemm(&a, &[1, -1], &b, &[-1, 2]).unwrap();
        assert_eq!(g.data(), c.data());
    }

    #[test]
    fn test_full_contraction_is_rank0() {
        let a = sample(&[2, 3], 0);
        let c = contract(&a, &[-1, -2], &a, &[-1, -2]).unwrap();
        assert_eq!(c.ndim(), 0);
        let expected: f64 = a.data().iter().map(|x| x * x).sum();
        assert_relative_eq!(c.to_scalar().unwrap(), expected, epsilon = 1e-12);
        let g = contract_gemm(&a, &[-1, -2], &a, &[-1, -2]).unwrap();
        assert_relative_eq!(g.to_scalar().unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_gemm_matches_naive_batched() {
        // A[s, k1, i, k2] * B[k2, s, j, k1] -> C[s, i, j]
        let a = sample(&[2, 3, 4, 2], 1);
        let b = sample(&[2, 2, 3, 3], 2);
        let la = [1, -1, 2, -2];
        let lb = [-2, 1, 3, -1];
        let naive = contract(&a, &la, &b, &lb).unwrap();
        let gemm = contract_gemm(&a, &la, &b, &lb).unwrap();
        assert_eq!(naive.shape(), &[2, 4, 3]);
        assert!(naive.approx_eq(&gemm, 1e-12));
    }

    #[test]
    fn test_outer_via_labels() {
        let a = Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        let b = Tensor::from_vec(vec![3.0, 4.0, 5.0], &[3]).unwrap();
        let c = contract_gemm(&a, &[1], &b, &[2]).unwrap();
        assert_eq!(c, crate::operations::outer(&a, &b));
    }

    #[test]
    fn test_tensordot_free_axis_order() {
        let a = sample(&[2, 3, 4], 3);
        let b = sample(&[4, 5], 4);
        let r = tensordot(&a, &[2], &b, &[0], 0).unwrap();
        assert_eq!(r.shape(), &[2, 3, 5]);
        let expected = contract(&a, &[1, 2, -1], &b, &[-1, 3]).unwrap();
        assert!(r.approx_eq(&expected, 1e-12));

        // Contracting a middle axis keeps the remaining ones in order.
        let r = tensordot(&a, &[1], &sample(&[3], 5), &[0], 0).unwrap();
        assert_eq!(r.shape(), &[2, 4]);
    }

    #[test]
    fn test_tensordot_shared() {
        let a = sample(&[3, 2, 2], 6);
        let b = sample(&[3, 2], 7);
        let r = tensordot(&a, &[1], &b, &[1], 1).unwrap();
        assert_eq!(r.shape(), &[3, 2]);
        for s in 0..3 {
            for j in 0..2 {
                let expected: f64 = (0..2)
                    .map(|k| a.get(&[s, k, j]).unwrap() * b.get(&[s, k]).unwrap())
                    .sum();
                assert_relative_eq!(*r.get(&[s, j]).unwrap(), expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_tensordot_complex() {
        let a = Tensor::from_vec(vec![c64::new(0.0, 1.0), c64::new(1.0, 0.0)], &[2]).unwrap();
        let r = tensordot(&a, &[0], &a, &[0], 0).unwrap();
        assert_eq!(r.to_scalar().unwrap(), c64::new(0.0, 0.0));
    }

    #[test]
    fn test_tensordot_axis_errors() {
        let a: Tensor<f64> = Tensor::zeros(&[2, 2]);
        let err =
            |r: Result<Tensor<f64>, TensorError>| matches!(r, Err(TensorError::AxisOrder { .. }));
        assert!(err(tensordot(&a, &[2], &a, &[0], 0)));
        assert!(err(tensordot(&a, &[0, 0], &a, &[0, 1], 0)));
        assert!(err(tensordot(&a, &[0], &a, &[0, 1], 0)));
        assert!(err(tensordot(&a, &[0], &a, &[1], 1)));
    }
}
