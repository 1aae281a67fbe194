//! Moving square matrices between tensors and faer.
//!
//! Tensors are column-major like faer, so a rank-2 tensor is viewed in
//! place and only results coming back from faer are copied.

use faer::MatRef;

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Zero-copy matrix view of a tensor's data.
pub trait AsFaerMat<T: Scalar> {
    /// View the data as a `rows x cols` column-major matrix.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` differs from the element count.
    ///
    /// # Example
    ///
    /// ```
    /// use ndtaylor::Tensor;
    /// use ndtaylor::backend::AsFaerMat;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// assert_eq!(t.as_faer_mat(2, 2)[(0, 1)], 3.0);
    /// ```
    fn as_faer_mat(&self, rows: usize, cols: usize) -> MatRef<'_, T>;
}

impl<T: Scalar> AsFaerMat<T> for Tensor<T> {
    fn as_faer_mat(&self, rows: usize, cols: usize) -> MatRef<'_, T> {
        assert_eq!(
            rows * cols,
            self.len(),
            "{rows} x {cols} view of a tensor with {} elements",
            self.len()
        );
        MatRef::from_column_major_slice(self.data(), rows, cols)
    }
}

/// Copy a faer matrix into a rank-2 tensor.
pub fn tensor_from_faer_mat<T: Scalar>(mat: MatRef<'_, T>) -> Result<Tensor<T>, TensorError> {
    let (rows, cols) = (mat.nrows(), mat.ncols());
    let data = (0..cols).flat_map(|j| (0..rows).map(move |i| mat[(i, j)])).collect();
    Tensor::from_vec(data, &[rows, cols])
}
