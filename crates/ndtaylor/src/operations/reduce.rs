//! Diagonal reductions: traces and matrix diagonals.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Trace over the last two axes.
///
/// A tensor of shape [p..., n, n] becomes [p...]; a plain matrix becomes a
/// rank-0 tensor.
///
/// # Errors
///
/// Returns `RankMismatch` for rank below two and `NotSquareMatrix` if the
/// last two axes differ in size.
///
/// # Example
///
/// ```
/// use ndtaylor::Tensor;
/// use ndtaylor::operations::trace_last2;
///
/// let m = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
/// assert_eq!(trace_last2(&m).unwrap().to_scalar().unwrap(), 5.0);
/// ```
pub fn trace_last2<T: Scalar>(tensor: &Tensor<T>) -> Result<Tensor<T>, TensorError> {
    let nd = tensor.ndim();
    if nd < 2 {
        return Err(TensorError::RankMismatch {
            expected: 2,
            actual: nd,
        });
    }
    let (rows, cols) = (tensor.shape()[nd - 2], tensor.shape()[nd - 1]);
    if rows != cols {
        return Err(TensorError::NotSquareMatrix { rows, cols });
    }
    let prefix_shape = &tensor.shape()[..nd - 2];
    let prefix: usize = prefix_shape.iter().product();
    let mut result = Tensor::zeros(prefix_shape);
    let out = result.data_mut();
    for i in 0..rows {
        let offset = prefix * (i + rows * i);
        for (p, slot) in out.iter_mut().enumerate() {
            *slot = *slot + tensor.data()[offset + p];
        }
    }
    Ok(result)
}

/// Diagonal of a square matrix as a vector.
///
/// # Errors
///
/// Returns `RankMismatch` unless the tensor is rank 2 and `NotSquareMatrix`
/// if it is not square.
pub fn diagonal<T: Scalar>(matrix: &Tensor<T>) -> Result<Tensor<T>, TensorError> {
    let n = square_size(matrix)?;
    let data: Vec<T> = (0..n).map(|i| matrix.data()[i + n * i]).collect();
    Tensor::from_vec(data, &[n])
}

/// True when every off-diagonal entry of a square matrix is within `tol` of zero.
///
/// # Errors
///
/// Same conditions as [`diagonal`].
pub fn is_diagonal<T: Scalar>(matrix: &Tensor<T>, tol: f64) -> Result<bool, TensorError> {
    let n = square_size(matrix)?;
    Ok(matrix
        .data()
        .iter()
        .enumerate()
        .all(|(linear, x)| linear % n == linear / n || x.modulus() <= tol))
}

pub(crate) fn square_size<T: Scalar>(matrix: &Tensor<T>) -> Result<usize, TensorError> {
    if matrix.ndim() != 2 {
        return Err(TensorError::RankMismatch {
            expected: 2,
            actual: matrix.ndim(),
        });
    }
    let (rows, cols) = (matrix.shape()[0], matrix.shape()[1]);
    if rows != cols {
        return Err(TensorError::NotSquareMatrix { rows, cols });
    }
    Ok(rows)
}
