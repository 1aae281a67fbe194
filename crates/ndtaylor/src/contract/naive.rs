//! Loop-based reference contraction.

use crate::contract::properties::ContractionProperties;
use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::strides::linear_to_cartesian_into;
use crate::tensor::Tensor;

/// Contract two tensors using label-based contraction.
///
/// Labels are nonzero integers where:
/// - Negative values appearing in both operands are summed over
/// - Positive values appearing in both operands are batch axes
/// - Positive values appearing in one operand are kept
///
/// # Returns
///
/// Result tensor laid out as `[batch..., free A..., free B...]`. A full
/// contraction returns a rank-0 tensor.
///
/// # Examples
///
/// ```
/// use ndtaylor::{Tensor, contract};
///
/// // Matrix multiplication: C[i,k] = A[i,j] * B[j,k]
/// let a = Tensor::<f64>::ones(&[2, 3]);
/// let b = Tensor::<f64>::ones(&[3, 4]);
/// let c = contract(&a, &[1, -1], &b, &[-1, 2]).unwrap();
/// assert_eq!(c.shape(), &[2, 4]);
///
/// // Inner product
/// let v = Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
/// let dot = contract(&v, &[-1], &v, &[-1]).unwrap();
/// assert_eq!(dot.to_scalar().unwrap(), 5.0);
/// ```
pub fn contract<T: Scalar>(
    a: &Tensor<T>,
    labels_a: &[i32],
    b: &Tensor<T>,
    labels_b: &[i32],
) -> Result<Tensor<T>, TensorError> {
    let props = ContractionProperties::compute(a.shape(), labels_a, b.shape(), labels_b)?;

    let contracted_dims: Vec<usize> = props.contracted.iter().map(|&(i, _)| a.shape()[i]).collect();
    let contracted_total: usize = contracted_dims.iter().product();

    let mut result = Tensor::zeros(&props.output_shape);
    let mut out_idx = vec![0; props.output_shape.len()];
    let mut sum_idx = vec![0; contracted_dims.len()];
    let mut a_idx = vec![0; a.ndim()];
    let mut b_idx = vec![0; b.ndim()];

    let nb = props.batch.len();
    let na = props.free_a.len();

    for (out_linear, slot) in result.data_mut().iter_mut().enumerate() {
        linear_to_cartesian_into(out_linear, &props.output_shape, &mut out_idx);
        for (p, &(i, j)) in props.batch.iter().enumerate() {
            a_idx[i] = out_idx[p];
            b_idx[j] = out_idx[p];
        }
        for (p, &i) in props.free_a.iter().enumerate() {
            a_idx[i] = out_idx[nb + p];
        }
        for (p, &j) in props.free_b.iter().enumerate() {
            b_idx[j] = out_idx[nb + na + p];
        }

        let mut sum = T::zero();
        for c_linear in 0..contracted_total {
            linear_to_cartesian_into(c_linear, &contracted_dims, &mut sum_idx);
            for (p, &(i, j)) in props.contracted.iter().enumerate() {
                a_idx[i] = sum_idx[p];
                b_idx[j] = sum_idx[p];
            }
            let av = *a.get(&a_idx).expect("index within shape");
            let bv = *b.get(&b_idx).expect("index within shape");
            sum = sum + av * bv;
        }
        *slot = sum;
    }

    Ok(result)
}
