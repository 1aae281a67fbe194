//! Dense n-dimensional tensor.
//!
//! ```text
//! Tensor<T>
//! ├── data    : Vec<T>      column-major
//! ├── shape   : Vec<usize>  empty for a rank-0 (scalar) tensor
//! └── strides : Vec<usize>
//! ```
//!
//! Derivative terms are ordinary tensors; the meaning of each axis (shared,
//! derivative, or base) is tracked by the caller, never by the tensor.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::strides::{cartesian_to_linear, compute_strides, linear_to_cartesian_into, shape_len};

/// A dense n-dimensional tensor stored in column-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T: Scalar> {
    data: Vec<T>,
    shape: Vec<usize>,
    strides: Vec<usize>,
}

impl<T: Scalar> Tensor<T> {
    /// Create a new tensor with the given shape, zero-initialized.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndtaylor::Tensor;
    ///
    /// let t: Tensor<f64> = Tensor::zeros(&[2, 3, 4]);
    /// assert_eq!(t.shape(), &[2, 3, 4]);
    /// assert_eq!(t.len(), 24);
    ///
    /// let s: Tensor<f64> = Tensor::zeros(&[]);
    /// assert_eq!(s.len(), 1);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, T::zero())
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, T::one())
    }

    /// Create a tensor with every element equal to `value`.
    pub fn full(shape: &[usize], value: T) -> Self {
        Self {
            data: vec![value; shape_len(shape)],
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        }
    }

    /// Create a rank-0 tensor holding `value`.
    pub fn scalar(value: T) -> Self {
        Self::full(&[], value)
    }

    /// Create tensor from column-major data and shape.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if data length doesn't match shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndtaylor::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// assert_eq!(t.get(&[1, 0]), Some(&2.0)); // column-major
    /// assert_eq!(t.get(&[0, 1]), Some(&3.0));
    /// ```
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self, TensorError> {
        let expected = shape_len(shape);
        if data.len() != expected {
            return Err(TensorError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        })
    }

    /// Create a tensor by evaluating `f` at every cartesian index.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndtaylor::Tensor;
    ///
    /// let t: Tensor<f64> = Tensor::from_fn(&[2, 2], |idx| (idx[0] * 10 + idx[1]) as f64);
    /// assert_eq!(t.get(&[1, 0]), Some(&10.0));
    /// assert_eq!(t.get(&[1, 1]), Some(&11.0));
    /// ```
    pub fn from_fn<F>(shape: &[usize], mut f: F) -> Self
    where
        F: FnMut(&[usize]) -> T,
    {
        let len = shape_len(shape);
        let mut idx = vec![0; shape.len()];
        let mut data = Vec::with_capacity(len);
        for linear in 0..len {
            linear_to_cartesian_into(linear, shape, &mut idx);
            data.push(f(&idx));
        }
        Self {
            data,
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        }
    }

    /// The `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        Self::from_fn(&[n, n], |idx| if idx[0] == idx[1] { T::one() } else { T::zero() })
    }

    /// A square matrix with `diag` on its diagonal.
    pub fn from_diag(diag: &[T]) -> Self {
        let n = diag.len();
        Self::from_fn(&[n, n], |idx| if idx[0] == idx[1] { diag[idx[0]] } else { T::zero() })
    }

    /// Get the shape of the tensor.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the rank (number of dimensions).
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if tensor has zero elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the tensor and return its column-major data.
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    #[inline]
    pub fn get_linear(&self, i: usize) -> Option<&T> {
        self.data.get(i)
    }

    /// Get element by cartesian indices.
    ///
    /// Returns `None` if indices are out of bounds or wrong in number.
    pub fn get(&self, indices: &[usize]) -> Option<&T> {
        if indices.len() != self.ndim() {
            return None;
        }
        if indices.iter().zip(&self.shape).any(|(&i, &d)| i >= d) {
            return None;
        }
        self.data.get(cartesian_to_linear(indices, &self.strides))
    }

    /// Set element by cartesian indices.
    ///
    /// # Errors
    ///
    /// Returns error if indices are out of bounds or wrong in number.
    pub fn set(&mut self, indices: &[usize], value: T) -> Result<(), TensorError> {
        if indices.len() != self.ndim() {
            return Err(TensorError::WrongNumberOfIndices {
                expected: self.ndim(),
                actual: indices.len(),
            });
        }
        for (&index, &dim_size) in indices.iter().zip(&self.shape) {
            if index >= dim_size {
                return Err(TensorError::IndexOutOfBounds { index, dim_size });
            }
        }
        let linear = cartesian_to_linear(indices, &self.strides);
        self.data[linear] = value;
        Ok(())
    }

    /// Fill all elements with a value.
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    /// The single value of a rank-0 tensor.
    ///
    /// # Errors
    ///
    /// Returns `RankMismatch` if the tensor is not rank 0.
    pub fn to_scalar(&self) -> Result<T, TensorError> {
        if self.ndim() != 0 {
            return Err(TensorError::RankMismatch {
                expected: 0,
                actual: self.ndim(),
            });
        }
        Ok(self.data[0])
    }

    /// Reinterpret the data under a new shape with the same element count.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the element counts differ.
    pub fn reshape(self, new_shape: &[usize]) -> Result<Self, TensorError> {
        Self::from_vec(self.data, new_shape)
    }

    /// Largest element modulus, or zero for an empty tensor.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().map(|x| x.modulus()).fold(0.0, f64::max)
    }

    /// True when every element has modulus at most `tol`.
    pub fn is_zero(&self, tol: f64) -> bool {
        self.data.iter().all(|x| x.modulus() <= tol)
    }

    /// Elementwise comparison with an absolute-plus-relative tolerance.
    ///
    /// Shapes must match exactly.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        self.shape == other.shape
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(&a, &b)| (a - b).modulus() <= tol * (1.0 + a.modulus().max(b.modulus())))
    }

    /// Permute the dimensions of the tensor.
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
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// let t2 = t.permutedims(&[1, 0]).unwrap();
    /// assert_eq!(t2.shape(), &[3, 2]);
    /// assert_eq!(t.get(&[1, 0]), t2.get(&[0, 1]));
    /// ```
    pub fn permutedims(&self, perm: &[usize]) -> Result<Self, TensorError> {
        crate::operations::permutedims(self, perm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::c64;

    fn check_zeros<T: Scalar>() {
        let t: Tensor<T> = Tensor::zeros(&[2, 3]);
        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.strides(), &[1, 2]);
        assert!(t.data().iter().all(|&x| x == T::zero()));
    }

    #[test]
    fn test_zeros_f64() {
        check_zeros::<f64>();
    }

    #[test]
    fn test_zeros_c64() {
        check_zeros::<c64>();
    }

    #[test]
    fn test_from_vec_shape_mismatch() {
        assert!(Tensor::<f64>::from_vec(vec![1.0, 2.0, 3.0], &[2, 3]).is_err());
        assert!(Tensor::<f64>::from_vec(vec![1.0, 2.0], &[]).is_err());
    }

    #[test]
    fn test_scalar_tensor() {
        let t = Tensor::scalar(4.0);
        assert_eq!(t.ndim(), 0);
        assert_eq!(t.len(), 1);
        assert_eq!(t.to_scalar().unwrap(), 4.0);
        assert_eq!(t.get(&[]), Some(&4.0));
        assert!(Tensor::<f64>::zeros(&[1]).to_scalar().is_err());
    }

    #[test]
    fn test_get_out_of_bounds() {
        let t: Tensor<f64> = Tensor::zeros(&[2, 3]);
        assert_eq!(t.get(&[2, 0]), None);
        assert_eq!(t.get(&[0, 3]), None);
        assert_eq!(t.get(&[0]), None);
    }

    #[test]
    fn test_set() {
        let mut t: Tensor<f64> = Tensor::zeros(&[2, 3]);
        t.set(&[1, 2], 42.0).unwrap();
        assert_eq!(t.get(&[1, 2]), Some(&42.0));
        assert!(matches!(
            t.set(&[2, 0], 1.0),
            Err(TensorError::IndexOutOfBounds { index: 2, dim_size: 2 })
        ));
    }

    #[test]
    fn test_identity_and_diag() {
        let i: Tensor<f64> = Tensor::identity(3);
        assert_eq!(i.get(&[1, 1]), Some(&1.0));
        assert_eq!(i.get(&[0, 1]), Some(&0.0));

        let d = Tensor::from_diag(&[2.0, 3.0]);
        assert_eq!(d.data(), &[2.0, 0.0, 0.0, 3.0]);
    }

    #[test]
    fn test_reshape() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[4]).unwrap();
        let m = t.clone().reshape(&[1, 2, 2]).unwrap();
        assert_eq!(m.shape(), &[1, 2, 2]);
        assert_eq!(m.get(&[0, 1, 0]), Some(&2.0));
        assert!(t.reshape(&[3]).is_err());
    }

    #[test]
    fn test_approx_eq_and_zero() {
        let a = Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        let b = Tensor::from_vec(vec![1.0 + 1e-14, 2.0], &[2]).unwrap();
        assert!(a.approx_eq(&b, 1e-10));
        assert!(!a.approx_eq(&Tensor::ones(&[2]), 1e-10));
        assert!(!a.approx_eq(&b.clone().reshape(&[1, 2]).unwrap(), 1e-10));
        assert!(Tensor::<f64>::zeros(&[3]).is_zero(0.0));
        assert_eq!(a.max_abs(), 2.0);
    }

    #[test]
    fn test_permutedims_3d() {
        let t: Tensor<f64> =
            Tensor::from_fn(&[2, 3, 4], |i| (i[0] * 100 + i[1] * 10 + i[2]) as f64);
        let t2 = t.permutedims(&[2, 0, 1]).unwrap();
        assert_eq!(t2.shape(), &[4, 2, 3]);
        for i in 0..2 {
            for j in 0..3 {
                for k in 0..4 {
                    assert_eq!(t.get(&[i, j, k]), t2.get(&[k, i, j]));
                }
            }
        }
    }
}
