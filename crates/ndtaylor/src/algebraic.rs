//! Derivatives of the matrix inverse, the determinant and the reciprocal.
//!
//! Each routine grows its output expansion one order at a time; order `o`
//! only reads orders below `o` of the output and the input expansion.

use tracing::debug;

use crate::combinatorics::integer_partitions;
use crate::derived::{scalarprod_deriv, tensordot_deriv};
use crate::error::TensorError;
use crate::expansion::{Expansion, Orders, Term, accumulate};
use crate::linalg::{determinant, inverse};
use crate::operations::{scale, trace_last2};
use crate::ops::TensorOp;
use crate::propagate::{DerivOptions, tensorops_deriv};
use crate::reexpand::partition_prod;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

fn leading_matrix<T: Scalar>(a: &Expansion<T>) -> Result<&Tensor<T>, TensorError> {
    a.get(0).ok_or(TensorError::SingularMatrix { pivot: 0.0 })
}

/// Derivatives of `A^-1` up to `max_order`.
///
/// Uses `d(A^-1) = -A^-1 dA A^-1`: order `o` is minus the order `o - 1`
/// derivative of the chain `A[1:] . inv . inv`.
///
/// # Errors
///
/// Returns `SingularMatrix` if `A[0]` is zero or not invertible.
///
/// # Example
///
/// ```
/// use ndtaylor::{Expansion, Tensor, matinv_deriv};
///
/// let a = Expansion::from_tensors(vec![
///     Tensor::identity(2),
///     Tensor::from_vec(vec![1.0, 0.0, 0.0, -1.0], &[1, 2, 2]).unwrap(),
/// ]);
/// let inv = matinv_deriv(&a, 1).unwrap();
/// assert_eq!(inv.get(1).unwrap().data(), &[-1.0, 0.0, 0.0, 1.0]);
/// ```
pub fn matinv_deriv<T: Scalar>(
    a: &Expansion<T>,
    max_order: usize,
) -> Result<Expansion<T>, TensorError> {
    let mut inv = Expansion::from_tensors(vec![inverse(leading_matrix(a)?)?]);
    let rest = a.tail(1);
    let ops = [
        TensorOp::contract(vec![1], vec![1]),
        TensorOp::contract(vec![1], vec![0]),
    ];
    for o in 1..=max_order {
        let mut terms = tensorops_deriv(&[&rest, &inv, &inv], &ops, Orders::List(vec![o - 1]), 0)?;
        let next = terms.pop().unwrap_or(Term::Zero).negated();
        debug!(order = o, zero = next.is_zero(), "matrix inverse derivative");
        inv.push(next);
    }
    Ok(inv)
}

/// Derivatives of `det(A)` up to `max_order`, by Jacobi's formula
/// `d det = det * tr(A^-1 dA)`.
///
/// Term `o` has shape `[N; o]` where `N` is the size of A's derivative
/// axes.
///
/// # Errors
///
/// Returns `SingularMatrix` when `max_order > 0` and `A[0]` is not
/// invertible.
pub fn matdet_deriv<T: Scalar>(
    a: &Expansion<T>,
    max_order: usize,
) -> Result<Expansion<T>, TensorError> {
    let a0 = leading_matrix(a)?;
    let mut det = Expansion::from_tensors(vec![Tensor::scalar(determinant(a0)?)]);
    if max_order == 0 {
        return Ok(det);
    }

    let inv = matinv_deriv(a, max_order - 1)?;
    let rest = a.tail(1);
    let traces: Expansion<T> = tensordot_deriv(
        &rest,
        &inv,
        max_order - 1,
        &[1],
        &[1],
        DerivOptions::default(),
    )?
    .into_iter()
    .map(|t| t.try_map(|t| trace_last2(&t)))
    .collect::<Result<Vec<_>, _>>()?
    .into();

    for o in 0..max_order {
        let next = scalarprod_deriv(&det, &traces, Orders::List(vec![o]))?
            .into_terms()
            .pop()
            .unwrap_or(Term::Zero);
        debug!(order = o + 1, zero = next.is_zero(), "determinant derivative");
        det.push(next);
    }
    Ok(det)
}

/// Derivatives of `1 / s` for a scalar-valued expansion `s`.
///
/// Order `o` sums over the integer partitions `λ` of `o` the term
/// `(-1)^l l! / s0^(l+1)` times the symmetrized product of the derivatives
/// of `s` named by `λ`, with `l` the number of parts.
///
/// # Errors
///
/// `SingularMatrix` when `s[0]` is zero and `RankMismatch` when `s` is not
/// scalar-valued.
///
/// # Example
///
/// ```
/// use ndtaylor::{Expansion, Tensor, scalarinv_deriv};
///
/// let s = Expansion::from_tensors(vec![Tensor::scalar(2.0), Tensor::ones(&[1])]);
/// let r = scalarinv_deriv(&s, 1).unwrap();
/// assert_eq!(r.get(0).unwrap().to_scalar().unwrap(), 0.5);
/// assert_eq!(r.get(1).unwrap().data(), &[-0.25]);
/// ```
pub fn scalarinv_deriv<T: Scalar>(
    s: &Expansion<T>,
    max_order: usize,
) -> Result<Expansion<T>, TensorError> {
    let s0 = leading_matrix(s)?.to_scalar()?;
    if s0.modulus() == 0.0 {
        return Err(TensorError::SingularMatrix { pivot: 0.0 });
    }
    let mut out = Expansion::from_tensors(vec![Tensor::scalar(T::one() / s0)]);
    let rest = s.tail(1);

    for o in 1..=max_order {
        let mut total = None;
        for partition in integer_partitions(o).iter() {
            let Some(prod) = partition_prod(partition, &rest, 0)?.into_tensor() else {
                continue;
            };
            let l = partition.len();
            let sign = if l % 2 == 0 { 1.0 } else { -1.0 };
            let factorial: f64 = (1..=l).map(|i| i as f64).product();
            let mut coef = T::from_real(sign * factorial);
            for _ in 0..=l {
                coef = coef / s0;
            }
            accumulate(&mut total, scale(&prod, coef))?;
        }
        debug!(order = o, zero = total.is_none(), "reciprocal derivative");
        out.push(Term::from(total));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inverse_seed() {
        let a0 = Tensor::from_vec(vec![4.0, 2.0, 7.0, 6.0], &[2, 2]).unwrap();
        let a = Expansion::from_tensors(vec![a0.clone()]);
        let inv = matinv_deriv(&a, 1).unwrap();
        assert!(inv.get(0).unwrap().approx_eq(&inverse(&a0).unwrap(), 1e-12));
        assert!(inv.term(1).unwrap().is_zero());
    }

    #[test]
    fn test_inverse_second_order_scalar() {
        // a(t) = 2 + t: (1/a)'' = 2 / a^3 = 0.25.
        let a = Expansion::from_tensors(vec![Tensor::full(&[1, 1], 2.0), Tensor::ones(&[1, 1, 1])]);
        let inv = matinv_deriv(&a, 2).unwrap();
        assert_relative_eq!(inv.get(1).unwrap().data()[0], -0.25);
        assert_eq!(inv.get(2).unwrap().shape(), &[1, 1, 1, 1]);
        assert_relative_eq!(inv.get(2).unwrap().data()[0], 0.25);
    }

    #[test]
    fn test_determinant_jacobi() {
        let a = Expansion::from_tensors(vec![
            Tensor::from_diag(&[2.0, 3.0]),
            Tensor::from_vec(vec![1.0, 0.0, 0.0, 1.0], &[1, 2, 2]).unwrap(),
        ]);
        let det = matdet_deriv(&a, 2).unwrap();
        assert_relative_eq!(det.get(0).unwrap().to_scalar().unwrap(), 6.0);
        assert_eq!(det.get(1).unwrap().shape(), &[1]);
        assert_relative_eq!(det.get(1).unwrap().data()[0], 5.0, epsilon = 1e-12);
        // det(A0 + t I) = 6 + 5t + t^2
        assert_relative_eq!(det.get(2).unwrap().data()[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_determinant_order_zero() {
        let a = Expansion::from_tensors(vec![Tensor::from_diag(&[2.0, 0.0])]);
        let det = matdet_deriv(&a, 0).unwrap();
        assert_eq!(det.len(), 1);
        assert_eq!(det.get(0).unwrap().to_scalar().unwrap(), 0.0);
    }

    #[test]
    fn test_reciprocal_multivariate_hessian() {
        // s = 1 + x + 2y: Hessian of 1/s at 0 is 2 g g^T.
        let g = Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        let s = Expansion::from_tensors(vec![Tensor::scalar(1.0), g]);
        let r = scalarinv_deriv(&s, 2).unwrap();
        assert_eq!(r.get(2).unwrap().data(), &[2.0, 4.0, 4.0, 8.0]);
    }

    #[test]
    fn test_reciprocal_third_order() {
        // s = 2 + t: (1/s)''' = -6 / s^4.
        let s = Expansion::from_tensors(vec![Tensor::scalar(2.0), Tensor::ones(&[1])]);
        let r = scalarinv_deriv(&s, 3).unwrap();
        assert_relative_eq!(r.get(3).unwrap().data()[0], -6.0 / 16.0, epsilon = 1e-14);
    }

    #[test]
    fn test_reciprocal_of_zero() {
        let s = Expansion::from_tensors(vec![Tensor::scalar(0.0), Tensor::ones(&[1])]);
        assert!(matches!(scalarinv_deriv(&s, 1), Err(TensorError::SingularMatrix { .. })));
        let v: Expansion<f64> = Expansion::from_tensors(vec![Tensor::ones(&[2])]);
        assert!(matches!(scalarinv_deriv(&v, 1), Err(TensorError::RankMismatch { .. })));
    }
}
