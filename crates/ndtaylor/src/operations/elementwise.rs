//! Element-wise tensor arithmetic.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Multiply all elements by a scalar, returning a new tensor.
///
/// # Example
///
/// ```
/// use ndtaylor::Tensor;
/// use ndtaylor::operations::scale;
///
/// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// assert_eq!(scale(&t, 2.0).data(), &[2.0, 4.0, 6.0]);
/// ```
pub fn scale<T: Scalar>(tensor: &Tensor<T>, alpha: T) -> Tensor<T> {
    apply(tensor, |x| x * alpha)
}

/// Scale tensor in-place.
pub fn scale_inplace<T: Scalar>(tensor: &mut Tensor<T>, alpha: T) {
    tensor.data_mut().iter_mut().for_each(|x| *x = *x * alpha);
}

/// Apply a function to every element.
pub fn apply<T: Scalar, F>(tensor: &Tensor<T>, f: F) -> Tensor<T>
where
    F: Fn(T) -> T,
{
    let data: Vec<T> = tensor.data().iter().map(|&x| f(x)).collect();
    Tensor::from_vec(data, tensor.shape()).expect("apply: shape unchanged")
}

/// Combine two same-shaped tensors element by element.
///
/// # Errors
///
/// Returns `ShapeMismatch` if the shapes differ.
pub fn apply_binary<T: Scalar, F>(
    a: &Tensor<T>,
    b: &Tensor<T>,
    f: F,
) -> Result<Tensor<T>, TensorError>
where
    F: Fn(T, T) -> T,
{
    check_same_shape(a, b)?;
    let data: Vec<T> = a.data().iter().zip(b.data()).map(|(&x, &y)| f(x, y)).collect();
    Tensor::from_vec(data, a.shape())
}

/// Element-wise sum.
///
/// # Example
///
/// ```
/// use ndtaylor::Tensor;
/// use ndtaylor::operations::add;
///
/// let a = Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
/// let b = Tensor::from_vec(vec![10.0, 20.0], &[2]).unwrap();
/// assert_eq!(add(&a, &b).unwrap().data(), &[11.0, 22.0]);
/// ```
pub fn add<T: Scalar>(a: &Tensor<T>, b: &Tensor<T>) -> Result<Tensor<T>, TensorError> {
    apply_binary(a, b, |x, y| x + y)
}

/// Element-wise difference.
pub fn sub<T: Scalar>(a: &Tensor<T>, b: &Tensor<T>) -> Result<Tensor<T>, TensorError> {
    apply_binary(a, b, |x, y| x - y)
}

/// `dest += alpha * src`, in place.
///
/// # Errors
///
/// Returns `ShapeMismatch` if the shapes differ.
pub fn axpy_inplace<T: Scalar>(
    dest: &mut Tensor<T>,
    alpha: T,
    src: &Tensor<T>,
) -> Result<(), TensorError> {
    check_same_shape(dest, src)?;
    for (d, &s) in dest.data_mut().iter_mut().zip(src.data()) {
        *d = *d + alpha * s;
    }
    Ok(())
}

/// Divide by `w` broadcast over the leading axes.
///
/// `w.shape()` must equal the trailing `w.ndim()` axes of `tensor`; every
/// slice `tensor[p..., :]` is divided element-wise by `w`.
///
/// # Errors
///
/// Returns `ShapeMismatch` if `w` does not match the trailing axes.
///
/// # Example
///
/// ```
/// use ndtaylor::Tensor;
/// use ndtaylor::operations::div_trailing;
///
/// let t = Tensor::from_vec(vec![2.0, 4.0, 9.0, 12.0], &[2, 2]).unwrap();
/// let w = Tensor::from_vec(vec![2.0, 3.0], &[2]).unwrap();
/// let q = div_trailing(&t, &w).unwrap();
/// assert_eq!(q.data(), &[1.0, 2.0, 3.0, 4.0]);
/// ```
pub fn div_trailing<T: Scalar>(
    tensor: &Tensor<T>,
    w: &Tensor<T>,
) -> Result<Tensor<T>, TensorError> {
    let lead = tensor.ndim().checked_sub(w.ndim()).ok_or(TensorError::RankMismatch {
        expected: w.ndim(),
        actual: tensor.ndim(),
    })?;
    for (&dt, &dw) in tensor.shape()[lead..].iter().zip(w.shape()) {
        if dt != dw {
            return Err(TensorError::ShapeMismatch {
                expected: dw,
                actual: dt,
            });
        }
    }
    let prefix: usize = tensor.shape()[..lead].iter().product();
    let data: Vec<T> = tensor
        .data()
        .iter()
        .enumerate()
        .map(|(linear, &x)| x / w.data()[linear / prefix.max(1)])
        .collect();
    Tensor::from_vec(data, tensor.shape())
}

fn check_same_shape<T: Scalar>(a: &Tensor<T>, b: &Tensor<T>) -> Result<(), TensorError> {
    if a.shape() != b.shape() {
        let first_diff = a
            .shape()
            .iter()
            .zip(b.shape())
            .find(|(x, y)| x != y)
            .map(|(&x, &y)| (x, y));
        let (expected, actual) = first_diff.unwrap_or((a.ndim(), b.ndim()));
        return Err(TensorError::ShapeMismatch { expected, actual });
    }
    Ok(())
}
