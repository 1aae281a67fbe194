//! Stride and index utilities.
//!
//! All tensors are stored in column-major (Fortran) order, the layout faer
//! uses for its matrices.

/// Compute column-major strides from shape.
///
/// For shape [d0, d1, d2, ...], returns strides [1, d0, d0*d1, ...].
///
/// # Examples
///
/// ```
/// use ndtaylor::strides::compute_strides;
///
/// assert_eq!(compute_strides(&[3, 4, 5]), vec![1, 3, 12]);
/// assert_eq!(compute_strides(&[]), vec![]);
/// ```
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = Vec::with_capacity(shape.len());
    let mut stride = 1;
    for &dim in shape {
        strides.push(stride);
        stride *= dim;
    }
    strides
}

/// Number of elements held by a tensor of the given shape.
///
/// A rank-0 shape holds a single element.
#[inline]
pub fn shape_len(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Convert cartesian indices to a linear offset.
#[inline]
pub fn cartesian_to_linear(indices: &[usize], strides: &[usize]) -> usize {
    indices
        .iter()
        .zip(strides)
        .map(|(&idx, &stride)| idx * stride)
        .sum()
}

/// Convert a linear offset to cartesian indices.
pub fn linear_to_cartesian(linear: usize, shape: &[usize]) -> Vec<usize> {
    let mut indices = vec![0; shape.len()];
    linear_to_cartesian_into(linear, shape, &mut indices);
    indices
}

/// Convert a linear offset to cartesian indices, writing into `out`.
///
/// `out` must have the same length as `shape`.
#[inline]
pub fn linear_to_cartesian_into(mut linear: usize, shape: &[usize], out: &mut [usize]) {
    for (slot, &dim) in out.iter_mut().zip(shape) {
        *slot = linear % dim;
        linear /= dim;
    }
}
