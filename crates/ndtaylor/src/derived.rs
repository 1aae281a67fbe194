//! Product rules for contraction, outer product and scalar scaling.
//!
//! These wrap [`op_deriv`] with a fixed operator kind and prepend the
//! order-0 term, so each returns an [`Expansion`] whose first term is the
//! plain product and whose remaining terms follow the requested orders.

use tracing::debug;

use crate::error::TensorError;
use crate::expansion::{Expansion, Orders, Term, accumulate};
use crate::operations::outer;
use crate::ops::TensorOp;
use crate::propagate::{DerivOptions, op_deriv};
use crate::scalar::Scalar;
use crate::symmetrize::{SymmetrizeOptions, symmetrize};

/// Derivatives of `tensordot(A, B, axes_a, axes_b)`.
///
/// # Errors
///
/// `AxisOrder` for invalid axes; shape errors from the contraction.
///
/// # Example
///
/// ```
/// use ndtaylor::{DerivOptions, Expansion, Tensor, Term, tensordot_deriv};
///
/// // B is constant: every derivative is A[o] contracted with B0.
/// let a = Expansion::from_tensors(vec![Tensor::identity(2), Tensor::ones(&[1, 2, 2])]);
/// let b = Expansion::new(vec![Term::Tensor(Tensor::from_diag(&[2.0, 3.0])), Term::Zero]);
/// let d = tensordot_deriv(&a, &b, 1, &[-1], &[0], DerivOptions::default()).unwrap();
/// assert_eq!(d.len(), 2);
/// assert_eq!(d.get(1).unwrap().data(), &[2.0, 2.0, 3.0, 3.0]);
/// ```
pub fn tensordot_deriv<T: Scalar>(
    a: &Expansion<T>,
    b: &Expansion<T>,
    orders: impl Into<Orders>,
    axes_a: &[isize],
    axes_b: &[isize],
    opts: DerivOptions,
) -> Result<Expansion<T>, TensorError> {
    let op = TensorOp::contract(axes_a.to_vec(), axes_b.to_vec());
    with_value(&op, a, b, orders.into(), opts)
}

/// Derivatives of the outer product of A and B over the listed axes.
///
/// Axes of `A0` not named in `axes_a` are taken as shared batch axes and
/// `B0` must carry the same leading axes. A scalar-valued `A` with no
/// listed axes is handled by [`scalarprod_deriv`].
///
/// # Errors
///
/// `AxisOrder` when the listed axes are not the trailing axes of an operand
/// or when the operands disagree on the number of shared axes, and
/// `ShapeMismatch` when the shared axes differ in size.
///
/// # Example
///
/// ```
/// use ndtaylor::{Expansion, Tensor, tensorprod_deriv};
///
/// // Row-wise outer products over one shared axis of size 3.
/// let a = Expansion::from_tensors(vec![Tensor::<f64>::ones(&[3, 2])]);
/// let b = Expansion::from_tensors(vec![Tensor::ones(&[3, 4])]);
/// let d = tensorprod_deriv(&a, &b, 2, &[-1], &[-1], false).unwrap();
/// assert_eq!(d.get(0).unwrap().shape(), &[3, 2, 4]);
/// assert!(d.term(1).unwrap().is_zero());
/// ```
pub fn tensorprod_deriv<T: Scalar>(
    a: &Expansion<T>,
    b: &Expansion<T>,
    orders: impl Into<Orders>,
    axes_a: &[isize],
    axes_b: &[isize],
    identical: bool,
) -> Result<Expansion<T>, TensorError> {
    let orders = orders.into();
    let (Some(shape_a), Some(shape_b)) = (a.value_shape(0)?, b.value_shape(0)?) else {
        return Ok(std::iter::repeat_n(Term::Zero, orders.to_vec().len() + 1).collect());
    };
    if axes_a.is_empty() && shape_a.is_empty() {
        return scalarprod_deriv(a, b, orders);
    }

    let shared = shape_a.len().checked_sub(axes_a.len()).ok_or_else(|| TensorError::AxisOrder {
        axes: axes_a.to_vec(),
        base_rank: shape_a.len(),
        reason: "more outer-product axes than operand axes",
    })?;
    if shape_b.len().checked_sub(axes_b.len()) != Some(shared) {
        return Err(TensorError::AxisOrder {
            axes: axes_b.to_vec(),
            base_rank: shape_b.len(),
            reason: "unlisted axes of B must match the shared axes of A",
        });
    }
    if let Some((&ea, &eb)) = shape_a[..shared]
        .iter()
        .zip(&shape_b[..shared])
        .find(|(x, y)| x != y)
    {
        return Err(TensorError::ShapeMismatch {
            expected: ea,
            actual: eb,
        });
    }

    let op = TensorOp::outer(axes_a.to_vec(), axes_b.to_vec());
    with_value(&op, a, b, orders, DerivOptions { shared, identical })
}

fn with_value<T: Scalar>(
    op: &TensorOp,
    a: &Expansion<T>,
    b: &Expansion<T>,
    orders: Orders,
    opts: DerivOptions,
) -> Result<Expansion<T>, TensorError> {
    let value = match (a.get(0), b.get(0)) {
        (Some(a0), Some(b0)) => Term::Tensor(op.apply(a0, b0, opts.shared)?),
        _ => Term::Zero,
    };
    let mut out = Expansion::new(vec![value]);
    for term in op_deriv(op, a, b, orders, opts)? {
        out.push(term);
    }
    Ok(out)
}

/// Derivatives of `s * A` for a scalar-valued expansion `s`.
///
/// Order `o` is the sum over `j` of `s[o-j] ⊗ A[j]` with the two
/// derivative blocks shuffled together. The result starts with the order-0
/// product, followed by the requested orders (which may include 0).
///
/// # Errors
///
/// Returns `RankMismatch` if `s` is not scalar-valued.
///
/// # Example
///
/// ```
/// use ndtaylor::{Expansion, Tensor, scalarprod_deriv};
///
/// // (2 + x) * (3 + 4x): value 6, first derivative 3 + 8 = 11.
/// let s = Expansion::from_tensors(vec![Tensor::scalar(2.0), Tensor::ones(&[1])]);
/// let a = Expansion::from_tensors(vec![Tensor::scalar(3.0), Tensor::full(&[1], 4.0)]);
/// let d = scalarprod_deriv(&s, &a, 1).unwrap();
/// assert_eq!(d.get(0).unwrap().to_scalar().unwrap(), 6.0);
/// assert_eq!(d.get(1).unwrap().data(), &[11.0]);
/// ```
pub fn scalarprod_deriv<T: Scalar>(
    s: &Expansion<T>,
    a: &Expansion<T>,
    orders: impl Into<Orders>,
) -> Result<Expansion<T>, TensorError> {
    if let Some(shape) = s.value_shape(0)? {
        if !shape.is_empty() {
            return Err(TensorError::RankMismatch {
                expected: 0,
                actual: shape.len(),
            });
        }
    }
    std::iter::once(0)
        .chain(orders.into().to_vec())
        .map(|o| scalarprod_order(s, a, o))
        .collect::<Result<Vec<_>, _>>()
        .map(Expansion::new)
}

fn scalarprod_order<T: Scalar>(
    s: &Expansion<T>,
    a: &Expansion<T>,
    order: usize,
) -> Result<Term<T>, TensorError> {
    let mut total = None;
    for j in 0..=order {
        let k = order - j;
        let (Some(sk), Some(aj)) = (s.get(k), a.get(j)) else {
            continue;
        };
        let mut term = outer(sk, aj);
        if k > 0 && j > 0 {
            term = symmetrize(&term, &[k, j], SymmetrizeOptions::default())?;
        }
        accumulate(&mut total, term)?;
    }
    debug!(order, zero = total.is_none(), "scalar product term");
    Ok(total.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::tensordot;
    use crate::operations::add;
    use crate::tensor::Tensor;

    #[test]
    fn test_product_rule_base_case() {
        let a0: Tensor<f64> = Tensor::from_fn(&[2, 3], |i| (i[0] + 2 * i[1]) as f64 + 0.5);
        let a1: Tensor<f64> = Tensor::from_fn(&[2, 2, 3], |i| (i[0] * 3 + i[1] + i[2]) as f64);
        let b0: Tensor<f64> = Tensor::from_fn(&[3, 2], |i| (i[0] as f64 - i[1] as f64).exp());
        let b1: Tensor<f64> = Tensor::from_fn(&[2, 3, 2], |i| (i[0] + i[1] * i[2]) as f64);
        let a = Expansion::from_tensors(vec![a0.clone(), a1.clone()]);
        let b = Expansion::from_tensors(vec![b0.clone(), b1.clone()]);

        let d = tensordot_deriv(&a, &b, 1, &[1], &[0], DerivOptions::default()).unwrap();
        assert!(d.get(0).unwrap().approx_eq(&tensordot(&a0, &[1], &b0, &[0], 0).unwrap(), 1e-12));

        // [d][i][l] from A1, plus B1's derivative axis moved to the front.
        let from_a = tensordot(&a1, &[2], &b0, &[0], 0).unwrap();
        let from_b = tensordot(&a0, &[1], &b1, &[1], 0).unwrap();
        let from_b = crate::operations::move_block(&from_b, 1, 1, 0).unwrap();
        let expected = add(&from_a, &from_b).unwrap();
        assert!(d.get(1).unwrap().approx_eq(&expected, 1e-12));
    }

    #[test]
    fn test_constant_operand_degeneracy() {
        let a: Expansion<f64> = Expansion::from_tensors(vec![
            Tensor::from_fn(&[2], |i| i[0] as f64 + 1.0),
            Tensor::from_fn(&[2, 2], |i| (i[0] * 2 + i[1]) as f64),
            Tensor::from_fn(&[2, 2, 2], |i| (i[0] + i[1] + i[2]) as f64),
        ]);
        let b0: Tensor<f64> = Tensor::from_fn(&[2, 3], |i| (i[0] + 3 * i[1]) as f64);
        let b = Expansion::new(vec![Term::Tensor(b0.clone()), Term::Zero, Term::Zero]);
        let d = tensordot_deriv(&a, &b, 2, &[-1], &[0], DerivOptions::default()).unwrap();
        for o in 0..=2 {
            let a_o = a.get(o).unwrap();
            let expected = tensordot(a_o, &[a_o.ndim() - 1], &b0, &[0], 0).unwrap();
            assert!(d.get(o).unwrap().approx_eq(&expected, 1e-12), "order {o}");
        }
    }

    #[test]
    fn test_order_zero_is_plain_outer() {
        let a = Expansion::from_tensors(vec![Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap()]);
        let b = Expansion::from_tensors(vec![Tensor::from_vec(vec![3.0, 4.0, 5.0], &[3]).unwrap()]);
        let d = tensorprod_deriv(&a, &b, 1, &[-1], &[-1], false).unwrap();
        assert_eq!(d.get(0).unwrap(), &outer(a.get(0).unwrap(), b.get(0).unwrap()));
    }

    #[test]
    fn test_tensorprod_axis_errors() {
        let a: Expansion<f64> = Expansion::from_tensors(vec![Tensor::ones(&[3, 2])]);
        let b: Expansion<f64> = Expansion::from_tensors(vec![Tensor::ones(&[2])]);
        assert!(matches!(
            tensorprod_deriv(&a, &b, 1, &[-1], &[-1], false),
            Err(TensorError::AxisOrder { .. })
        ));
        let c: Expansion<f64> = Expansion::from_tensors(vec![Tensor::ones(&[4, 2])]);
        assert!(matches!(
            tensorprod_deriv(&a, &c, 1, &[-1], &[-1], false),
            Err(TensorError::ShapeMismatch { expected: 3, actual: 4 })
        ));
    }

    #[test]
    fn test_scalar_times_vector_second_order() {
        // s = x^2, a = x v at x = 1: (s a)'' = 6 v.
        let v = Tensor::from_vec(vec![1.0, -2.0], &[2]).unwrap();
        let s = Expansion::from_tensors(vec![
            Tensor::scalar(1.0),
            Tensor::full(&[1], 2.0),
            Tensor::full(&[1, 1], 2.0),
        ]);
        let a = Expansion::new(vec![
            Term::Tensor(v.clone()),
            Term::Tensor(v.clone().reshape(&[1, 2]).unwrap()),
            Term::Zero,
        ]);
        let d = scalarprod_deriv(&s, &a, 2).unwrap();
        assert_eq!(d.get(1).unwrap().data(), &[3.0, -6.0]);
        assert_eq!(d.get(2).unwrap().shape(), &[1, 1, 2]);
        assert_eq!(d.get(2).unwrap().data(), &[6.0, -12.0]);

        // Delegation from the outer-product entry point gives the same terms.
        let via_prod = tensorprod_deriv(&s, &a, 2, &[], &[], false).unwrap();
        assert_eq!(via_prod, d);
    }

    #[test]
    fn test_scalarprod_rejects_tensor_scale() {
        let s: Expansion<f64> = Expansion::from_tensors(vec![Tensor::ones(&[2])]);
        assert!(matches!(
            scalarprod_deriv(&s, &s, 1),
            Err(TensorError::RankMismatch { expected: 0, actual: 1 })
        ));
    }
}
