//! Generalized Leibniz rule for bilinear operators.
//!
//! For `C = op(A, B)` the raw order-`o` derivative is
//!
//! ```text
//! C[o] = sum_{k=0..o} shuffle(op(A[o-k], B[k]))
//! ```
//!
//! where `shuffle` sums over the interleavings of the `k` derivative axes
//! coming from B with the `o-k` coming from A. Chains of operators follow
//! the same rule with compositions of `o` in place of the pair `(o-k, k)`.

use tracing::debug;

use crate::combinatorics::compositions;
use crate::error::TensorError;
use crate::expansion::{Expansion, Orders, Term, accumulate};
use crate::ops::{ResolvedOp, TensorOp};
use crate::scalar::Scalar;
use crate::symmetrize::{SymmetrizeOptions, symmetrize};
use crate::tensor::Tensor;

/// Options shared by the propagation routines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivOptions {
    /// Leading batch axes common to both operands.
    pub shared: usize,
    /// Symmetrize with size-1 blocks treated as identical factors.
    pub identical: bool,
}

/// Derivatives of `op(A, B)` at the requested orders.
///
/// The result holds one term per requested order. A term is [`Term::Zero`]
/// when every contribution involves a zero or missing input term.
///
/// # Errors
///
/// Returns `AxisOrder` for axes that do not fit the operands and shape
/// errors from the kernels.
///
/// # Example
///
/// ```
/// use ndtaylor::{DerivOptions, Expansion, Tensor, TensorOp, op_deriv};
///
/// // f(x) = x * x for a scalar x at x = 3 with dx = 1.
/// let x = Expansion::from_tensors(vec![Tensor::scalar(3.0), Tensor::ones(&[1])]);
/// let op = TensorOp::outer(vec![], vec![]);
/// let d = op_deriv(&op, &x, &x, 2, DerivOptions::default()).unwrap();
/// assert_eq!(d[0].as_tensor().unwrap().data(), &[6.0]);
/// assert_eq!(d[1].as_tensor().unwrap().data(), &[2.0]);
/// ```
pub fn op_deriv<T: Scalar>(
    op: &TensorOp,
    a: &Expansion<T>,
    b: &Expansion<T>,
    orders: impl Into<Orders>,
    opts: DerivOptions,
) -> Result<Vec<Term<T>>, TensorError> {
    let orders = orders.into().to_vec();
    let (Some(shape_a), Some(shape_b)) =
        (a.value_shape(opts.shared)?, b.value_shape(opts.shared)?)
    else {
        return Ok(vec![Term::Zero; orders.len()]);
    };
    let resolved = op.resolve(shape_a.len(), shape_b.len(), opts.shared)?;

    orders
        .iter()
        .map(|&o| binary_order(&resolved, a, b, o, opts))
        .collect()
}

fn binary_order<T: Scalar>(
    op: &ResolvedOp,
    a: &Expansion<T>,
    b: &Expansion<T>,
    order: usize,
    opts: DerivOptions,
) -> Result<Term<T>, TensorError> {
    let mut total = None;
    for k in 0..=order {
        let s = order - k;
        let (Some(at), Some(bt)) = (a.get(s), b.get(k)) else {
            continue;
        };
        let mut term = op.apply_shifted(at, s, bt, k)?;
        if s > 0 && k > 0 {
            let sym = SymmetrizeOptions {
                shared: opts.shared,
                identical: opts.identical,
                reweight: None,
            };
            term = symmetrize(&term, &[k, s], sym)?;
        }
        accumulate(&mut total, term)?;
    }
    debug!(order, zero = total.is_none(), "binary derivative term");
    Ok(total.into())
}

/// Derivatives of a left-to-right chain `op_{n-2}(...op_0(E_0, E_1)..., E_{n-1})`.
///
/// `ops[i]` combines the running result with `operands[i + 1]`; its axes
/// are written against the order-0 shapes of the chain. Contributions come
/// from every composition of the order over the operands, each symmetrized
/// over its non-empty derivative blocks. Requested orders may include 0.
///
/// # Errors
///
/// Returns `OperandCount` unless there are at least two operands and one
/// operator fewer, plus the axis and shape errors of [`op_deriv`].
///
/// # Example
///
/// ```
/// use ndtaylor::{Expansion, Orders, Tensor, TensorOp, tensorops_deriv};
///
/// // d/dx of x * x * x at x = 2 is 12.
/// let x = Expansion::from_tensors(vec![Tensor::scalar(2.0), Tensor::ones(&[1])]);
/// let op = TensorOp::outer(vec![], vec![]);
/// let d = tensorops_deriv(&[&x, &x, &x], &[op.clone(), op], Orders::List(vec![0, 1]), 0).unwrap();
/// assert_eq!(d[0].as_tensor().unwrap().to_scalar().unwrap(), 8.0);
/// assert_eq!(d[1].as_tensor().unwrap().data(), &[12.0]);
/// ```
pub fn tensorops_deriv<T: Scalar>(
    operands: &[&Expansion<T>],
    ops: &[TensorOp],
    orders: impl Into<Orders>,
    shared: usize,
) -> Result<Vec<Term<T>>, TensorError> {
    let orders = orders.into().to_vec();
    if operands.len() < 2 || ops.len() + 1 != operands.len() {
        return Err(TensorError::OperandCount {
            operands: operands.len(),
            expected: operands.len().saturating_sub(1),
            actual: ops.len(),
        });
    }

    let mut ranks = Vec::with_capacity(operands.len());
    for e in operands {
        match e.value_shape(shared)? {
            Some(shape) => ranks.push(shape.len()),
            None => return Ok(vec![Term::Zero; orders.len()]),
        }
    }
    let mut resolved = Vec::with_capacity(ops.len());
    let mut running = ranks[0];
    for (op, &rank_b) in ops.iter().zip(&ranks[1..]) {
        let r = op.resolve(running, rank_b, shared)?;
        running = r.result_rank(rank_b);
        resolved.push(r);
    }

    orders
        .iter()
        .map(|&o| chain_order(&resolved, operands, o, shared))
        .collect()
}

fn chain_order<T: Scalar>(
    ops: &[ResolvedOp],
    operands: &[&Expansion<T>],
    order: usize,
    shared: usize,
) -> Result<Term<T>, TensorError> {
    let mut total = None;
    let mut factors: Vec<&Tensor<T>> = Vec::with_capacity(operands.len());
    'compositions: for comp in compositions(order, operands.len()).iter() {
        factors.clear();
        for (e, &k) in operands.iter().zip(comp) {
            match e.get(k) {
                Some(t) => factors.push(t),
                None => continue 'compositions,
            }
        }

        let mut running = factors[0].clone();
        let mut d = comp[0];
        for ((op, factor), &k) in ops.iter().zip(&factors[1..]).zip(&comp[1..]) {
            running = op.apply_shifted(&running, d, factor, k)?;
            d += k;
        }

        // Each step moved the newest block to the front.
        let blocks: Vec<usize> = comp.iter().rev().copied().filter(|&k| k > 0).collect();
        if blocks.len() > 1 {
            let sym = SymmetrizeOptions {
                shared,
                ..Default::default()
            };
            running = symmetrize(&running, &blocks, sym)?;
        }
        accumulate(&mut total, running)?;
    }
    debug!(order, nops = ops.len(), zero = total.is_none(), "chain derivative term");
    Ok(total.into())
}
