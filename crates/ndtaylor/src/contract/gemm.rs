//! GEMM-based tensor contraction using faer.
//!
//! Operands are permuted so that every batch slice is a contiguous
//! column-major matrix, then each slice is multiplied with faer's matmul.

use faer::linalg::matmul::matmul;
use faer::{Accum, MatMut, MatRef, Par};

use crate::contract::properties::ContractionProperties;
use crate::error::TensorError;
use crate::operations::permutedims;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Contract two tensors with batched matrix multiplication.
///
/// Same label convention and output order as [`contract`](crate::contract::contract).
///
/// # Example
///
/// ```
/// use ndtaylor::Tensor;
/// use ndtaylor::contract::contract_gemm;
///
/// let a = Tensor::<f64>::ones(&[2, 3]);
/// let b = Tensor::<f64>::ones(&[3, 4]);
/// let c = contract_gemm(&a, &[1, -1], &b, &[-1, 2]).unwrap();
/// assert_eq!(c.shape(), &[2, 4]);
/// assert_eq!(c.get(&[1, 3]), Some(&3.0));
/// ```
pub fn contract_gemm<T: Scalar>(
    a: &Tensor<T>,
    labels_a: &[i32],
    b: &Tensor<T>,
    labels_b: &[i32],
) -> Result<Tensor<T>, TensorError> {
    let props = ContractionProperties::compute(a.shape(), labels_a, b.shape(), labels_b)?;

    let a_work = permutedims(a, &props.perm_a())?;
    let b_work = permutedims(b, &props.perm_b())?;

    let (m, k, n) = (props.dleft, props.dmid, props.dright);
    let mut c = Tensor::zeros(&props.gemm_shape());

    let (a_step, b_step, c_step) = (m * k, k * n, m * n);
    for s in 0..props.dbatch {
        let a_slice = &a_work.data()[s * a_step..(s + 1) * a_step];
        let b_slice = &b_work.data()[s * b_step..(s + 1) * b_step];
        let a_mat = MatRef::from_column_major_slice(a_slice, m, k);
        let b_mat = MatRef::from_column_major_slice(b_slice, k, n);
        let c_slice = &mut c.data_mut()[s * c_step..(s + 1) * c_step];
        let mut c_mat = MatMut::from_column_major_slice_mut(c_slice, m, n);
        matmul(c_mat.as_mut(), Accum::Replace, a_mat, b_mat, T::one(), Par::Seq);
    }

    permutedims(&c, &props.perm_c())
}
