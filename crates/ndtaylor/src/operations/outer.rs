//! Outer product of tensors, optionally batched over leading axes.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Compute the outer product of two tensors.
///
/// For A with shape [a0, a1, ...] and B with shape [b0, b1, ...],
/// returns C with shape [a0, a1, ..., b0, b1, ...] where
/// C[i0, i1, ..., j0, j1, ...] = A[i0, i1, ...] * B[j0, j1, ...]
///
/// # Example
///
/// ```
/// use ndtaylor::Tensor;
/// use ndtaylor::operations::outer;
///
/// let a = Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
/// let b = Tensor::from_vec(vec![3.0, 4.0, 5.0], &[3]).unwrap();
/// let c = outer(&a, &b);
///
/// assert_eq!(c.shape(), &[2, 3]);
/// assert_eq!(c.get(&[1, 0]), Some(&6.0));
/// assert_eq!(c.get(&[1, 2]), Some(&10.0));
/// ```
pub fn outer<T: Scalar>(a: &Tensor<T>, b: &Tensor<T>) -> Tensor<T> {
    let mut shape = a.shape().to_vec();
    shape.extend_from_slice(b.shape());
    let a_len = a.len();
    let mut data = Vec::with_capacity(a_len * b.len());
    for &bj in b.data() {
        data.extend(a.data().iter().map(|&ai| ai * bj));
    }
    Tensor::from_vec(data, &shape).expect("outer: data length follows shape")
}

/// Outer product batched over the first `shared` axes of both operands.
///
/// For A with shape [s..., a...] and B with shape [s..., b...], returns C
/// with shape [s..., a..., b...] where C[s, i, j] = A[s, i] * B[s, j].
/// With `shared == 0` this is [`outer`].
///
/// # Errors
///
/// Returns `RankMismatch` if either operand has fewer than `shared` axes and
/// `ShapeMismatch` if the shared axes differ in size.
///
/// # Example
///
/// ```
/// use ndtaylor::Tensor;
/// use ndtaylor::operations::outer_batched;
///
/// // Row-wise outer products of two batches of vectors.
/// let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
/// let b = Tensor::from_vec(vec![1.0, 10.0], &[2, 1]).unwrap();
/// let c = outer_batched(&a, &b, 1).unwrap();
/// assert_eq!(c.shape(), &[2, 2, 1]);
/// assert_eq!(c.get(&[1, 1, 0]), Some(&40.0));
/// ```
pub fn outer_batched<T: Scalar>(
    a: &Tensor<T>,
    b: &Tensor<T>,
    shared: usize,
) -> Result<Tensor<T>, TensorError> {
    check_shared_axes(a, b, shared)?;
    if shared == 0 {
        return Ok(outer(a, b));
    }

    let batch: usize = a.shape()[..shared].iter().product();
    let a_rest: usize = a.shape()[shared..].iter().product();
    let b_rest: usize = b.shape()[shared..].iter().product();

    let mut shape = a.shape().to_vec();
    shape.extend_from_slice(&b.shape()[shared..]);
    let mut result = Tensor::zeros(&shape);

    // Column-major: batch index varies fastest, then A's rest, then B's rest.
    let (ad, bd) = (a.data(), b.data());
    let out = result.data_mut();
    for j in 0..b_rest {
        for i in 0..a_rest {
            let base = batch * (i + a_rest * j);
            for s in 0..batch {
                out[base + s] = ad[s + batch * i] * bd[s + batch * j];
            }
        }
    }
    Ok(result)
}

pub(crate) fn check_shared_axes<T: Scalar>(
    a: &Tensor<T>,
    b: &Tensor<T>,
    shared: usize,
) -> Result<(), TensorError> {
    for t in [a, b] {
        if t.ndim() < shared {
            return Err(TensorError::RankMismatch {
                expected: shared,
                actual: t.ndim(),
            });
        }
    }
    for (&da, &db) in a.shape()[..shared].iter().zip(&b.shape()[..shared]) {
        if da != db {
            return Err(TensorError::ShapeMismatch {
                expected: da,
                actual: db,
            });
        }
    }
    Ok(())
}
