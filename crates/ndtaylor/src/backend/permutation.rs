//! Permutation backend trait.

use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Backend trait for axis permutation.
///
/// The derivative engine spends most of its time moving derivative axes
/// around (symmetrization, block moves), so this is the kernel worth
/// swapping out for a faster transpose.
pub trait PermutationBackend {
    /// Permute `src` into `dest`.
    ///
    /// # Arguments
    ///
    /// * `dest` - Output tensor (must already have the permuted shape)
    /// * `src` - Input tensor
    /// * `perm` - `perm[i]` gives the source dimension for the i-th
    ///   dimension of the result.
    ///
    /// # Panics
    ///
    /// Panics if `dest` does not have the permuted shape.
    fn permute_into<T: Scalar>(dest: &mut Tensor<T>, src: &Tensor<T>, perm: &[usize]);
}
