//! Generic (naive loop-based) backend implementation.

use crate::backend::PermutationBackend;
use crate::scalar::Scalar;
use crate::strides::{cartesian_to_linear, linear_to_cartesian_into};
use crate::tensor::Tensor;

/// Generic backend using naive loop-based implementations.
pub struct GenericBackend;

impl PermutationBackend for GenericBackend {
    fn permute_into<T: Scalar>(dest: &mut Tensor<T>, src: &Tensor<T>, perm: &[usize]) {
        let expected: Vec<usize> = perm.iter().map(|&p| src.shape()[p]).collect();
        assert_eq!(dest.shape(), expected.as_slice(), "destination shape must match permutation");

        // Walk the destination linearly and gather from the source:
        // dest[i0, i1, ...] = src[j] with j[perm[k]] = i_k.
        let src_strides: Vec<usize> = perm.iter().map(|&p| src.strides()[p]).collect();
        let dest_shape = dest.shape().to_vec();
        let mut idx = vec![0; dest_shape.len()];
        for (linear, slot) in dest.data_mut().iter_mut().enumerate() {
            linear_to_cartesian_into(linear, &dest_shape, &mut idx);
            *slot = src.data()[cartesian_to_linear(&idx, &src_strides)];
        }
    }
}
