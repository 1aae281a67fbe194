//! Shuffle symmetrization of derivative blocks.
//!
//! A product rule term arrives with its derivative axes grouped into
//! contiguous blocks, one block per factor. The full derivative is the sum
//! over every interleaving (shuffle) of those blocks that keeps the order
//! inside each block. [`symmetrize`] enumerates the interleavings as the
//! distinct permutations of a block label sequence.

use tracing::trace;

use crate::combinatorics::{multiset_permutation_count, unique_permutations};
use crate::error::TensorError;
use crate::operations::{axpy_inplace, permutedims, scale_inplace};
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Options for [`symmetrize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymmetrizeOptions {
    /// Leading axes that are never permuted.
    pub shared: usize,
    /// Treat size-1 blocks as copies of one factor, so permutations that
    /// only exchange them are counted once.
    pub identical: bool,
    /// Divide by the overcount of the enumeration relative to the
    /// multinomial weight of the block sizes. Defaults to `identical`.
    pub reweight: Option<bool>,
}

/// Multinomial weight of a block-size multiset.
///
/// `n! / (prod b_i! * prod m_j!)` with `n` the total size, `b_i` the block
/// sizes and `m_j` the multiplicity of each distinct size: the number of
/// ways to split `n` labelled axes into unordered blocks of these sizes.
/// Evaluated as a product of sorted ratios so large orders stay finite.
///
/// # Example
///
/// ```
/// use ndtaylor::symmetrize::partition_multinomial_weight;
///
/// assert_eq!(partition_multinomial_weight(&[2, 1, 1]), 6.0);
/// assert_eq!(partition_multinomial_weight(&[2, 2]), 3.0);
/// ```
pub fn partition_multinomial_weight(blocks: &[usize]) -> f64 {
    let blocks: Vec<usize> = blocks.iter().copied().filter(|&b| b > 0).collect();
    let n: usize = blocks.iter().sum();

    let mut num: Vec<usize> = (1..=n).collect();
    let mut den: Vec<usize> = blocks.iter().flat_map(|&b| 1..=b).collect();
    let mut sizes = blocks.clone();
    sizes.sort_unstable();
    let mut i = 0;
    while i < sizes.len() {
        let run = sizes[i..].iter().take_while(|&&s| s == sizes[i]).count();
        den.extend(1..=run);
        i += run;
    }

    num.sort_unstable_by(|a, b| b.cmp(a));
    den.sort_unstable_by(|a, b| b.cmp(a));
    let len = num.len().max(den.len());
    num.resize(len, 1);
    den.resize(len, 1);
    num.iter().zip(&den).map(|(&a, &b)| a as f64 / b as f64).product()
}

/// Sum a tensor over all interleavings of its derivative blocks.
///
/// The derivative axes start at `opts.shared` and are split into `blocks`
/// in layout order; axes after the last block stay where they are.
/// Zero-size blocks are ignored. When `opts.identical` is set every size-1
/// block shares one label.
///
/// # Errors
///
/// Returns `RankMismatch` if the blocks run past the tensor's rank.
///
/// # Example
///
/// ```
/// use ndtaylor::Tensor;
/// use ndtaylor::symmetrize::{SymmetrizeOptions, symmetrize};
///
/// // Two rank-1 blocks: T + T^T.
/// let t = Tensor::from_vec(vec![1.0, 3.0, 2.0, 4.0], &[2, 2]).unwrap();
/// let s = symmetrize(&t, &[1, 1], SymmetrizeOptions::default()).unwrap();
/// assert_eq!(s.data(), &[2.0, 5.0, 5.0, 8.0]);
/// ```
pub fn symmetrize<T: Scalar>(
    tensor: &Tensor<T>,
    blocks: &[usize],
    opts: SymmetrizeOptions,
) -> Result<Tensor<T>, TensorError> {
    let blocks: Vec<usize> = blocks.iter().copied().filter(|&b| b > 0).collect();
    let nderiv: usize = blocks.iter().sum();
    let start = opts.shared;
    if start + nderiv > tensor.ndim() {
        return Err(TensorError::RankMismatch {
            expected: start + nderiv,
            actual: tensor.ndim(),
        });
    }

    // Label every derivative axis with the class of its block.
    let mut labels = Vec::with_capacity(nderiv);
    let mut class_axes: Vec<Vec<usize>> = Vec::new();
    let mut singleton_class = None;
    for &b in &blocks {
        let class = if opts.identical && b == 1 {
            *singleton_class.get_or_insert_with(|| {
                class_axes.push(Vec::new());
                class_axes.len() - 1
            })
        } else {
            class_axes.push(Vec::new());
            class_axes.len() - 1
        };
        for _ in 0..b {
            class_axes[class].push(start + labels.len());
            labels.push(class);
        }
    }

    let perms = unique_permutations(&labels);
    trace!(?blocks, nperms = perms.len(), identical = opts.identical, "symmetrize");

    let mut result: Option<Tensor<T>> = None;
    let mut perm: Vec<usize> = (0..tensor.ndim()).collect();
    let mut seen = vec![0usize; class_axes.len()];
    for labelling in perms.iter() {
        seen.fill(0);
        for (p, &class) in labelling.iter().enumerate() {
            perm[start + p] = class_axes[class][seen[class]];
            seen[class] += 1;
        }
        let term = permutedims(tensor, &perm)?;
        match result.as_mut() {
            Some(acc) => axpy_inplace(acc, T::one(), &term)?,
            None => result = Some(term),
        }
    }
    let mut result = result.unwrap_or_else(|| tensor.clone());

    if opts.reweight.unwrap_or(opts.identical) {
        let counts: Vec<usize> = class_axes.iter().map(Vec::len).collect();
        let overcount = multiset_permutation_count(&counts) / partition_multinomial_weight(&blocks);
        if overcount != 1.0 {
            scale_inplace(&mut result, T::from_real(1.0 / overcount));
        }
    }
    Ok(result)
}
