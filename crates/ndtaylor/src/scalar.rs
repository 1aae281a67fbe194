//! Scalar trait for tensor element types.

use faer_traits::ComplexField;
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

pub use faer::c64;

/// Trait for scalar types supported by ndtaylor.
///
/// This wraps faer's `ComplexField` with the arithmetic needed by the
/// derivative engine, which only ever adds, scales and multiplies entries.
pub trait Scalar:
    ComplexField
    + Copy
    + Debug
    + Default
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Returns the additive identity (zero).
    fn zero() -> Self {
        Self::default()
    }

    /// Returns the multiplicative identity (one).
    fn one() -> Self;

    /// Embed a real number.
    fn from_real(x: f64) -> Self;

    /// Absolute value (modulus for complex numbers).
    fn modulus(self) -> f64;
}

impl Scalar for f64 {
    fn one() -> Self {
        1.0
    }

    fn from_real(x: f64) -> Self {
        x
    }

    fn modulus(self) -> f64 {
        self.abs()
    }
}

impl Scalar for c64 {
    fn one() -> Self {
        c64::new(1.0, 0.0)
    }

    fn from_real(x: f64) -> Self {
        c64::new(x, 0.0)
    }

    fn modulus(self) -> f64 {
        self.re.hypot(self.im)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_one() {
        assert_eq!(f64::zero(), 0.0);
        assert_eq!(f64::one(), 1.0);
        assert_eq!(c64::zero(), c64::new(0.0, 0.0));
        assert_eq!(c64::one(), c64::new(1.0, 0.0));
    }

    #[test]
    fn test_from_real() {
        assert_eq!(f64::from_real(2.5), 2.5);
        assert_eq!(c64::from_real(-1.0), c64::new(-1.0, 0.0));
    }

    #[test]
    fn test_modulus() {
        assert_relative_eq!((-3.0f64).modulus(), 3.0);
        assert_relative_eq!(c64::new(3.0, 4.0).modulus(), 5.0, epsilon = 1e-12);
    }
}
