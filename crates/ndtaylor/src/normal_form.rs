//! Order-by-order coordinate transformation towards a normal form.
//!
//! Given the derivative sequence `V` of a potential (gradient first), the
//! solver builds a transformation `Q` one order at a time:
//!
//! ```text
//! Q[o] = -(V ∘ Q)[o] / ((o + 2) w)
//! ```
//!
//! where `(V ∘ Q)[o]` is the order-`o` reexpansion of `V` through the terms
//! of `Q` found so far and `w` is broadcast along the last axis.

use tracing::debug;

use crate::error::TensorError;
use crate::expansion::{Expansion, Term};
use crate::linalg::inverse;
use crate::operations::{diagonal, div_trailing, is_diagonal, scale};
use crate::reexpand::{ReexpandAxes, tensor_reexpand};
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Off-diagonal magnitude below which a leading Hessian counts as diagonal.
const DIAGONAL_TOL: f64 = 1e-8;

/// Solve for the normal-form transformation up to `max_order`.
///
/// The leading non-zero term of `v` picks the seed:
///
/// - gradient (index 0): `Q[0] = I`, `w` the gradient
/// - diagonal Hessian (index 1): `Q[0] = I`, `w` its diagonal
/// - any other Hessian: `Q[0]` its inverse, `w` all ones
///
/// # Errors
///
/// Returns `UnsupportedLeadingOrder` when both the gradient and the Hessian
/// are zero, and `SingularMatrix` for a non-diagonal singular Hessian.
/// A gradient seed makes `Q[1]` a vector, so asking it for orders past 1
/// fails with `RankMismatch` when the second order mixes ranks.
///
/// # Example
///
/// ```
/// use ndtaylor::{Expansion, Tensor, Term, optimizing_transformation};
///
/// let v = Expansion::new(vec![Term::Zero, Term::Tensor(Tensor::from_diag(&[2.0, 3.0]))]);
/// let q = optimizing_transformation(&v, 2).unwrap();
/// assert_eq!(q.get(0).unwrap(), &Tensor::identity(2));
/// assert!(q.term(1).unwrap().is_zero());
/// assert_eq!(q.get(2).unwrap(), &Tensor::from_diag(&[-0.25, -0.25]));
/// ```
pub fn optimizing_transformation<T: Scalar>(
    v: &Expansion<T>,
    max_order: usize,
) -> Result<Expansion<T>, TensorError> {
    let zero_order = v.leading_zeros();
    let lead = match v.get(zero_order) {
        Some(lead) if zero_order <= 1 => lead,
        _ => return Err(TensorError::UnsupportedLeadingOrder { order: zero_order }),
    };
    let n = *lead.shape().last().ok_or(TensorError::RankMismatch {
        expected: zero_order + 1,
        actual: 0,
    })?;

    let (q0, w) = if zero_order == 0 {
        debug!(n, "normal form seeded from gradient");
        (Tensor::identity(n), lead.clone())
    } else if is_diagonal(lead, DIAGONAL_TOL)? {
        debug!(n, "normal form seeded from diagonal Hessian");
        (Tensor::identity(n), diagonal(lead)?)
    } else {
        debug!(n, "normal form seeded from inverse Hessian");
        (inverse(lead)?, Tensor::ones(&[n]))
    };

    let mut q = Expansion::from_tensors(vec![q0]);
    for o in 1..=max_order {
        let remainder = tensor_reexpand(v, &q, vec![o], ReexpandAxes::default())?
            .pop()
            .unwrap_or(Term::Zero);
        let factor = T::from_real(-1.0 / (o as f64 + 2.0));
        let next = remainder.try_map(|t| Ok(scale(&div_trailing(&t, &w)?, factor)))?;
        debug!(order = o, zero = next.is_zero(), "normal form term");
        q.push(next);
    }
    Ok(q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_diagonal_hessian_seed() {
        let v = Expansion::new(vec![Term::Zero, Term::Tensor(Tensor::from_diag(&[2.0, 3.0]))]);
        let q = optimizing_transformation(&v, 3).unwrap();
        assert_eq!(q.len(), 4);
        assert!(q.term(1).unwrap().is_zero());
        let q2 = q.get(2).unwrap();
        assert_relative_eq!(*q2.get(&[0, 0]).unwrap(), -0.25);
        assert_relative_eq!(*q2.get(&[1, 1]).unwrap(), -0.25);
        assert_relative_eq!(*q2.get(&[0, 1]).unwrap(), 0.0);
    }

    #[test]
    fn test_cubic_term_enters_third_order() {
        let w = [2.0, 4.0];
        let cubic: Tensor<f64> = Tensor::from_fn(&[2, 2, 2], |i| (1 + i[0] + i[1] + i[2]) as f64);
        let v = Expansion::new(vec![
            Term::Zero,
            Term::Tensor(Tensor::from_diag(&w)),
            Term::Tensor(cubic.clone()),
        ]);
        let q = optimizing_transformation(&v, 3).unwrap();
        assert!(q.term(1).unwrap().is_zero());
        assert!(q.get(2).unwrap().approx_eq(&Tensor::from_diag(&[-0.25, -0.25]), 1e-14));

        // Only the all-singleton partition survives at order 3: Q[3] = -V3 / (5 w).
        let q3 = q.get(3).unwrap();
        for idx in [[0, 0, 0], [1, 0, 1], [0, 1, 1], [1, 1, 1]] {
            let expected = -cubic.get(&idx).unwrap() / (5.0 * w[idx[2]]);
            assert_relative_eq!(*q3.get(&idx).unwrap(), expected, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_general_hessian_seed_is_inverse() {
        let h = Tensor::from_vec(vec![2.0, 1.0, 1.0, 3.0], &[2, 2]).unwrap();
        let v = Expansion::new(vec![Term::Zero, Term::Tensor(h.clone())]);
        let q = optimizing_transformation(&v, 0).unwrap();
        assert!(q.get(0).unwrap().approx_eq(&inverse(&h).unwrap(), 1e-12));
    }

    #[test]
    fn test_gradient_seed() {
        let g = Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        let v = Expansion::from_tensors(vec![g]);
        let q = optimizing_transformation(&v, 1).unwrap();
        assert_eq!(q.get(0).unwrap(), &Tensor::identity(2));
        // (V ∘ Q)[1] = g, so Q[1] = -g / (3 g).
        let q1 = q.get(1).unwrap();
        assert_relative_eq!(q1.data()[0], -1.0 / 3.0);
        assert_relative_eq!(q1.data()[1], -1.0 / 3.0);
    }

    #[test]
    fn test_unsupported_leading_order() {
        let v: Expansion<f64> = Expansion::new(vec![
            Term::Zero,
            Term::Zero,
            Term::Tensor(Tensor::ones(&[2, 2, 2])),
        ]);
        assert_eq!(
            optimizing_transformation(&v, 3),
            Err(TensorError::UnsupportedLeadingOrder { order: 2 })
        );
        let empty: Expansion<f64> = Expansion::new(vec![Term::Zero]);
        assert!(matches!(
            optimizing_transformation(&empty, 1),
            Err(TensorError::UnsupportedLeadingOrder { order: 1 })
        ));
    }
}
