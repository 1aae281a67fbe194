//! Faà di Bruno reexpansion and functional inverses.
//!
//! The routines here work on derivative sequences: index `i` of an
//! argument holds the `(i + 1)`-th derivative and the value is omitted.
//! An inner sequence `x(q)` has terms laid out `[q...][x]`; an outer
//! sequence `f(x)` has terms `[x...][f base...]`.

use tracing::debug;

use crate::combinatorics::integer_partitions;
use crate::contract::tensordot;
use crate::error::TensorError;
use crate::expansion::{Expansion, Orders, Term, accumulate};
use crate::linalg::inverse;
use crate::operations::outer_batched;
use crate::scalar::Scalar;
use crate::symmetrize::{SymmetrizeOptions, symmetrize};
use crate::tensor::Tensor;

/// Which inner axis is contracted into which outer axis.
///
/// The outer position advances past the axes each inner term contributes,
/// so successive inner terms land on successive outer derivative axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReexpandAxes {
    pub inner: isize,
    pub outer: isize,
}

impl Default for ReexpandAxes {
    fn default() -> Self {
        Self { inner: -1, outer: 0 }
    }
}

fn normalize_axis(axis: isize, ndim: usize) -> Result<usize, TensorError> {
    let norm = if axis < 0 { ndim as isize + axis } else { axis };
    if norm < 0 || norm >= ndim as isize {
        return Err(TensorError::AxisOrder {
            axes: vec![axis],
            base_rank: ndim,
            reason: "reexpansion axis out of range",
        });
    }
    Ok(norm as usize)
}

/// Derivative `part` of a derivative sequence, `None` for zero or missing.
fn nth_derivative<T: Scalar>(seq: &Expansion<T>, part: usize) -> Option<&Tensor<T>> {
    part.checked_sub(1).and_then(|i| seq.get(i))
}

/// One Faà di Bruno term: the outer derivative of order `partition.len()`
/// contracted with the inner derivatives named by the parts.
///
/// The result has the partition's derivative blocks in partition order,
/// symmetrized with identical singleton blocks and reweighted so that it
/// equals the sum over set partitions of this shape.
///
/// # Errors
///
/// `AxisOrder` for an out-of-range axis and shape errors from the
/// contractions.
pub fn partition_dot<T: Scalar>(
    partition: &[usize],
    inner: &Expansion<T>,
    outer: &Expansion<T>,
    axes: ReexpandAxes,
    shared: usize,
) -> Result<Term<T>, TensorError> {
    let Some(b) = partition.len().checked_sub(1).and_then(|l| outer.get(l)) else {
        return Ok(Term::Zero);
    };
    if partition.iter().any(|&p| nth_derivative(inner, p).is_none()) {
        return Ok(Term::Zero);
    }

    let mut b_ax = normalize_axis(axes.outer, b.ndim())?;
    let mut acc = b.clone();
    for &part in partition.iter().rev() {
        let Some(a) = nth_derivative(inner, part) else {
            return Ok(Term::Zero);
        };
        let a_ax = normalize_axis(axes.inner, a.ndim())?;
        acc = tensordot(a, &[a_ax], &acc, &[b_ax], shared)?;
        b_ax = (b_ax + a.ndim() - shared - 1).min(acc.ndim().saturating_sub(1));
    }

    let sym = SymmetrizeOptions {
        shared,
        identical: true,
        reweight: None,
    };
    symmetrize(&acc, partition, sym).map(Term::Tensor)
}

/// Symmetrized outer product of the derivatives named by `partition`.
///
/// `seq` must be scalar-valued: derivative `p` has exactly `shared + p`
/// axes.
///
/// # Errors
///
/// Returns `RankMismatch` if a selected term carries base axes.
pub fn partition_prod<T: Scalar>(
    partition: &[usize],
    seq: &Expansion<T>,
    shared: usize,
) -> Result<Term<T>, TensorError> {
    let mut acc: Option<Tensor<T>> = None;
    for &part in partition {
        let Some(t) = nth_derivative(seq, part) else {
            return Ok(Term::Zero);
        };
        if t.ndim() != shared + part {
            return Err(TensorError::RankMismatch {
                expected: shared + part,
                actual: t.ndim(),
            });
        }
        acc = Some(match acc {
            Some(prev) => outer_batched(&prev, t, shared)?,
            None => t.clone(),
        });
    }
    let Some(acc) = acc else {
        return Ok(Term::Zero);
    };
    let sym = SymmetrizeOptions {
        shared,
        identical: true,
        reweight: None,
    };
    symmetrize(&acc, partition, sym).map(Term::Tensor)
}

/// Chain rule: derivatives of `f(x(q))` at the requested orders.
///
/// `outer` is the derivative sequence of `f` with respect to `x` and
/// `inner` the derivative sequence of `x` with respect to `q`. Order `o`
/// sums [`partition_dot`] over the integer partitions of `o`.
///
/// # Errors
///
/// Propagates errors from [`partition_dot`].
///
/// # Example
///
/// ```
/// use ndtaylor::{Expansion, ReexpandAxes, Tensor, tensor_reexpand};
///
/// // f(x) = x^2 / 2 composed with x(q) = 3q: d2f/dq2 = 9.
/// let f = Expansion::from_tensors(vec![Tensor::zeros(&[1]), Tensor::ones(&[1, 1])]);
/// let x = Expansion::from_tensors(vec![Tensor::full(&[1, 1], 3.0)]);
/// let d = tensor_reexpand(&f, &x, 2, ReexpandAxes::default()).unwrap();
/// assert_eq!(d[1].as_tensor().unwrap().data(), &[9.0]);
/// ```
pub fn tensor_reexpand<T: Scalar>(
    outer: &Expansion<T>,
    inner: &Expansion<T>,
    orders: impl Into<Orders>,
    axes: ReexpandAxes,
) -> Result<Vec<Term<T>>, TensorError> {
    orders
        .into()
        .to_vec()
        .into_iter()
        .map(|o| {
            let mut total = None;
            for partition in integer_partitions(o).iter() {
                if let Some(t) = partition_dot(partition, inner, outer, axes, 0)?.into_tensor() {
                    accumulate(&mut total, t)?;
                }
            }
            debug!(order = o, zero = total.is_none(), "reexpansion term");
            Ok(Term::from(total))
        })
        .collect()
}

/// Derivative sequence of the inverse of the map whose derivative sequence
/// is `forward`, up to index `max_order`.
///
/// `reverse[0]` is the inverse Jacobian. Each further term is chosen so
/// that the reexpansion of `forward` through `reverse` vanishes at the next
/// order. Terms already present in `seed` are kept and only the missing
/// ones are computed.
///
/// # Errors
///
/// Returns `SingularMatrix` if the Jacobian cannot be inverted.
///
/// # Example
///
/// ```
/// use ndtaylor::{Expansion, Tensor, inverse_transformation};
///
/// // y = 2x + x^2 near 0: x'(y) = 1/2, x''(y) = -y''/y'^3 = -1/4.
/// let forward = Expansion::from_tensors(vec![
///     Tensor::full(&[1, 1], 2.0),
///     Tensor::full(&[1, 1, 1], 2.0),
/// ]);
/// let reverse = inverse_transformation(&forward, 1, None).unwrap();
/// assert_eq!(reverse.get(0).unwrap().data(), &[0.5]);
/// assert!((reverse.get(1).unwrap().data()[0] + 0.25).abs() < 1e-14);
/// ```
pub fn inverse_transformation<T: Scalar>(
    forward: &Expansion<T>,
    max_order: usize,
    seed: Option<Expansion<T>>,
) -> Result<Expansion<T>, TensorError> {
    let mut reverse = match seed {
        Some(seed) if !seed.is_empty() => seed,
        _ => {
            let jacobian = forward.get(0).ok_or(TensorError::SingularMatrix { pivot: 0.0 })?;
            Expansion::from_tensors(vec![inverse(jacobian)?])
        }
    };
    let inv_jacobian = reverse
        .get(0)
        .cloned()
        .ok_or(TensorError::SingularMatrix { pivot: 0.0 })?;

    for o in reverse.len()..=max_order {
        let mut missing = tensor_reexpand(forward, &reverse, vec![o + 1], ReexpandAxes::default())?;
        let next = missing.pop().unwrap_or(Term::Zero).negated().try_map(|t| {
            let last = t.ndim() - 1;
            tensordot(&t, &[last], &inv_jacobian, &[0], 0)
        })?;
        debug!(order = o, zero = next.is_zero(), "inverse transformation term");
        reverse.push(next);
    }
    Ok(reverse)
}
