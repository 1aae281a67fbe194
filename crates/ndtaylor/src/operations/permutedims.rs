//! Axis permutation and block moves.
//!
//! ```text
//! permutedims(tensor, perm)
//!     → validate permutation
//!     → allocate output with permuted shape
//!     → permutedims_into(output, tensor, perm)   # backend dispatch
//!
//! move_block(tensor, start, len, to)
//!     → build the permutation that relocates a contiguous run of axes
//!     → permutedims
//! ```

use crate::backend::{GenericBackend, PermutationBackend};
use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Permute the dimensions of a tensor, returning a new tensor.
///
/// `perm[i]` gives the source dimension for the i-th dimension of the result.
///
/// # Errors
///
/// Returns error if `perm` is not a valid permutation of `0..ndim`.
///
/// # Examples
///
/// ```
/// use ndtaylor::Tensor;
/// use ndtaylor::operations::permutedims;
///
/// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
/// let t2 = permutedims(&t, &[1, 0]).unwrap();
/// assert_eq!(t2.shape(), &[3, 2]);
/// assert_eq!(t.get(&[1, 0]), t2.get(&[0, 1]));
/// ```
pub fn permutedims<T: Scalar>(
    tensor: &Tensor<T>,
    perm: &[usize],
) -> Result<Tensor<T>, TensorError> {
    validate_permutation(perm, tensor.ndim())?;

    if perm.iter().enumerate().all(|(i, &p)| i == p) {
        return Ok(tensor.clone());
    }

    let new_shape: Vec<usize> = perm.iter().map(|&p| tensor.shape()[p]).collect();
    let mut result = Tensor::zeros(&new_shape);
    permutedims_into(&mut result, tensor, perm);
    Ok(result)
}

/// Permute tensor dimensions into an existing output tensor.
///
/// # Panics
///
/// Panics if dest shape doesn't match the permuted src shape.
pub fn permutedims_into<T: Scalar>(dest: &mut Tensor<T>, src: &Tensor<T>, perm: &[usize]) {
    GenericBackend::permute_into(dest, src, perm);
}

/// The permutation that lifts axes `start..start + len` out of a rank-`ndim`
/// layout and reinserts them so that they begin at position `to`.
///
/// # Errors
///
/// Returns `InvalidPermutation` if the block or target lies outside the rank.
pub fn block_move_permutation(
    ndim: usize,
    start: usize,
    len: usize,
    to: usize,
) -> Result<Vec<usize>, TensorError> {
    if start + len > ndim || to + len > ndim {
        return Err(TensorError::InvalidPermutation {
            perm: vec![start, len, to],
            ndim,
        });
    }
    let mut rest: Vec<usize> = (0..start).chain(start + len..ndim).collect();
    let tail = rest.split_off(to);
    rest.extend(start..start + len);
    rest.extend(tail);
    Ok(rest)
}

/// Move a contiguous block of axes to a new position.
///
/// # Examples
///
/// ```
/// use ndtaylor::Tensor;
/// use ndtaylor::operations::move_block;
///
/// // Move the last two axes to the front.
/// let t: Tensor<f64> = Tensor::zeros(&[2, 3, 4, 5]);
/// let moved = move_block(&t, 2, 2, 0).unwrap();
/// assert_eq!(moved.shape(), &[4, 5, 2, 3]);
/// ```
pub fn move_block<T: Scalar>(
    tensor: &Tensor<T>,
    start: usize,
    len: usize,
    to: usize,
) -> Result<Tensor<T>, TensorError> {
    let perm = block_move_permutation(tensor.ndim(), start, len, to)?;
    permutedims(tensor, &perm)
}

/// Validate that perm is a valid permutation of 0..ndim.
fn validate_permutation(perm: &[usize], ndim: usize) -> Result<(), TensorError> {
    let invalid = || TensorError::InvalidPermutation {
        perm: perm.to_vec(),
        ndim,
    };
    if perm.len() != ndim {
        return Err(invalid());
    }
    let mut seen = vec![false; ndim];
    for &p in perm {
        if p >= ndim || seen[p] {
            return Err(invalid());
        }
        seen[p] = true;
    }
    Ok(())
}
