//! Random tensors and random derivative expansions.
//!
//! Mostly used by tests: a random expansion with symmetric derivative terms
//! is the natural input for checking propagation identities.

use rand::Rng;
use rand::distr::StandardUniform;
use rand_distr::StandardNormal;

use crate::expansion::Expansion;
use crate::scalar::{Scalar, c64};
use crate::symmetrize::{SymmetrizeOptions, symmetrize};
use crate::tensor::Tensor;

/// Element types that can be drawn uniformly from `[0, 1)`.
pub trait RandomUniform: Scalar {
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self;
}

impl RandomUniform for f64 {
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardUniform)
    }
}

impl RandomUniform for c64 {
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
        c64::new(rng.sample(StandardUniform), rng.sample(StandardUniform))
    }
}

/// Element types that can be drawn from a standard normal distribution.
pub trait RandomNormal: Scalar {
    fn sample_normal<R: Rng>(rng: &mut R) -> Self;
}

impl RandomNormal for f64 {
    fn sample_normal<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardNormal)
    }
}

impl RandomNormal for c64 {
    fn sample_normal<R: Rng>(rng: &mut R) -> Self {
        // Each part is N(0, 1/2) so that E|z|^2 = 1.
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let re: f64 = rng.sample(StandardNormal);
        let im: f64 = rng.sample(StandardNormal);
        c64::new(re * s, im * s)
    }
}

fn sampled<T: Scalar, R: Rng>(
    shape: &[usize],
    rng: &mut R,
    mut draw: impl FnMut(&mut R) -> T,
) -> Tensor<T> {
    Tensor::from_fn(shape, |_| draw(rng))
}

impl<T: Scalar + RandomUniform> Tensor<T> {
    /// Uniform random values in `[0, 1)` from the thread-local generator.
    pub fn random(shape: &[usize]) -> Self {
        Self::random_with_rng(shape, &mut rand::rng())
    }

    /// Uniform random values drawn from `rng`.
    pub fn random_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        sampled(shape, rng, T::sample_uniform)
    }
}

impl<T: Scalar + RandomNormal> Tensor<T> {
    /// Standard normal values from the thread-local generator.
    pub fn randn(shape: &[usize]) -> Self {
        Self::randn_with_rng(shape, &mut rand::rng())
    }

    /// Standard normal values drawn from `rng`.
    ///
    /// # Example
    ///
    /// ```
    /// use ndtaylor::Tensor;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let a: Tensor<f64> = Tensor::randn_with_rng(&[2, 3], &mut StdRng::seed_from_u64(42));
    /// let b: Tensor<f64> = Tensor::randn_with_rng(&[2, 3], &mut StdRng::seed_from_u64(42));
    /// assert_eq!(a, b);
    /// ```
    pub fn randn_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        sampled(shape, rng, T::sample_normal)
    }
}

/// Random expansion of a function of `n` variables with values of shape
/// `value_shape`, up to `max_order`.
///
/// Term `k` has shape `[n; k] ++ value_shape` and is symmetric in its `k`
/// derivative axes, as a true derivative would be.
///
/// # Example
///
/// ```
/// use ndtaylor::random::random_expansion;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let e = random_expansion::<f64, _>(3, &[2], 2, &mut rng);
/// assert_eq!(e.len(), 3);
/// assert_eq!(e.get(2).unwrap().shape(), &[3, 3, 2]);
/// ```
pub fn random_expansion<T, R>(
    n: usize,
    value_shape: &[usize],
    max_order: usize,
    rng: &mut R,
) -> Expansion<T>
where
    T: Scalar + RandomNormal,
    R: Rng,
{
    let opts = SymmetrizeOptions {
        reweight: Some(true),
        ..SymmetrizeOptions::default()
    };
    let terms = (0..=max_order)
        .map(|k| {
            let mut shape = vec![n; k];
            shape.extend_from_slice(value_shape);
            let raw = Tensor::<T>::randn_with_rng(&shape, rng);
            symmetrize(&raw, &vec![1; k], opts).expect("derivative blocks fit the constructed rank")
        })
        .collect();
    Expansion::from_tensors(terms)
}
