//! Derivative expansions.
//!
//! An [`Expansion`] is an ordered list of derivative terms. Term `k` of a
//! value expansion is the `k`-th raw derivative of some tensor-valued
//! function, laid out as
//!
//! ```text
//! [shared axes...] [k derivative axes...] [base axes...]
//! ```
//!
//! Derivative axes are fully symmetric. A [`Term::Zero`] stands for an
//! identically vanishing derivative and is never materialized; missing
//! trailing terms are treated the same way.
//!
//! Some routines work on *derivative sequences* instead, where index `i`
//! holds the `(i + 1)`-th derivative and the value itself is absent. Those
//! functions say so in their docs; [`Expansion::tail`] converts one into the
//! other.

use crate::error::TensorError;
use crate::operations::scale;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// A single derivative term: either a known-zero marker or a dense tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum Term<T: Scalar> {
    Zero,
    Tensor(Tensor<T>),
}

impl<T: Scalar> Term<T> {
    pub fn is_zero(&self) -> bool {
        matches!(self, Term::Zero)
    }

    pub fn as_tensor(&self) -> Option<&Tensor<T>> {
        match self {
            Term::Zero => None,
            Term::Tensor(t) => Some(t),
        }
    }

    pub fn into_tensor(self) -> Option<Tensor<T>> {
        match self {
            Term::Zero => None,
            Term::Tensor(t) => Some(t),
        }
    }

    /// Apply `f` to a dense term; zero terms stay zero.
    pub fn map<F>(self, f: F) -> Self
    where
        F: FnOnce(Tensor<T>) -> Tensor<T>,
    {
        match self {
            Term::Zero => Term::Zero,
            Term::Tensor(t) => Term::Tensor(f(t)),
        }
    }

    /// Fallible version of [`Term::map`].
    pub fn try_map<F>(self, f: F) -> Result<Self, TensorError>
    where
        F: FnOnce(Tensor<T>) -> Result<Tensor<T>, TensorError>,
    {
        match self {
            Term::Zero => Ok(Term::Zero),
            Term::Tensor(t) => f(t).map(Term::Tensor),
        }
    }

    /// The term multiplied by -1.
    pub fn negated(self) -> Self {
        self.map(|t| scale(&t, -T::one()))
    }
}

impl<T: Scalar> From<Tensor<T>> for Term<T> {
    fn from(t: Tensor<T>) -> Self {
        Term::Tensor(t)
    }
}

impl<T: Scalar> From<Option<Tensor<T>>> for Term<T> {
    fn from(t: Option<Tensor<T>>) -> Self {
        t.map_or(Term::Zero, Term::Tensor)
    }
}

/// Ordered derivative terms of one tensor-valued quantity.
///
/// # Example
///
/// ```
/// use ndtaylor::{Expansion, Tensor, Term};
///
/// let e = Expansion::new(vec![
///     Term::Tensor(Tensor::scalar(2.0)),
///     Term::Zero,
///     Term::Tensor(Tensor::ones(&[3, 3])),
/// ]);
/// assert_eq!(e.len(), 3);
/// assert!(e.get(1).is_none());
/// assert!(e.get(7).is_none());
/// assert_eq!(e.get(2).unwrap().shape(), &[3, 3]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expansion<T: Scalar> {
    terms: Vec<Term<T>>,
}

impl<T: Scalar> Expansion<T> {
    pub fn new(terms: Vec<Term<T>>) -> Self {
        Self { terms }
    }

    /// Expansion whose terms are all dense.
    pub fn from_tensors(tensors: Vec<Tensor<T>>) -> Self {
        Self {
            terms: tensors.into_iter().map(Term::Tensor).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Term `k`, or `None` past the end.
    pub fn term(&self, k: usize) -> Option<&Term<T>> {
        self.terms.get(k)
    }

    /// Dense tensor of term `k`; `None` for zero or missing terms.
    pub fn get(&self, k: usize) -> Option<&Tensor<T>> {
        self.terms.get(k).and_then(Term::as_tensor)
    }

    pub fn terms(&self) -> &[Term<T>] {
        &self.terms
    }

    pub fn into_terms(self) -> Vec<Term<T>> {
        self.terms
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Term<T>> {
        self.terms.iter()
    }

    pub fn push(&mut self, term: impl Into<Term<T>>) {
        self.terms.push(term.into());
    }

    /// Expansion with the first `k` terms dropped.
    pub fn tail(&self, k: usize) -> Self {
        Self {
            terms: self.terms.iter().skip(k).cloned().collect(),
        }
    }

    /// Number of leading zero terms.
    pub fn leading_zeros(&self) -> usize {
        self.terms.iter().take_while(|t| t.is_zero()).count()
    }

    /// `[shared..., base...]` shape of the order-0 term, recovered from the
    /// first dense term by removing its derivative axes.
    ///
    /// `None` if every term is zero.
    ///
    /// # Errors
    ///
    /// Returns `RankMismatch` if the first dense term has fewer than
    /// `shared + k` axes.
    pub fn value_shape(&self, shared: usize) -> Result<Option<Vec<usize>>, TensorError> {
        let Some((k, t)) = self
            .terms
            .iter()
            .enumerate()
            .find_map(|(k, term)| term.as_tensor().map(|t| (k, t)))
        else {
            return Ok(None);
        };
        if t.ndim() < shared + k {
            return Err(TensorError::RankMismatch {
                expected: shared + k,
                actual: t.ndim(),
            });
        }
        let shape = t.shape()[..shared]
            .iter()
            .chain(&t.shape()[shared + k..])
            .copied()
            .collect();
        Ok(Some(shape))
    }

    /// Approximate comparison, treating zero terms, missing terms and dense
    /// terms within `tol` of zero as equal.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        let n = self.len().max(other.len());
        (0..n).all(|k| match (self.get(k), other.get(k)) {
            (Some(a), Some(b)) => a.approx_eq(b, tol),
            (Some(a), None) | (None, Some(a)) => a.is_zero(tol),
            (None, None) => true,
        })
    }
}

impl<T: Scalar> From<Vec<Term<T>>> for Expansion<T> {
    fn from(terms: Vec<Term<T>>) -> Self {
        Self::new(terms)
    }
}

impl<T: Scalar> FromIterator<Term<T>> for Expansion<T> {
    fn from_iter<I: IntoIterator<Item = Term<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, T: Scalar> IntoIterator for &'a Expansion<T> {
    type Item = &'a Term<T>;
    type IntoIter = std::slice::Iter<'a, Term<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}

impl<T: Scalar> IntoIterator for Expansion<T> {
    type Item = Term<T>;
    type IntoIter = std::vec::IntoIter<Term<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.into_iter()
    }
}

/// Which derivative orders to compute.
///
/// `UpTo(n)` means orders `1..=n`; `List` names orders explicitly and may
/// include order 0 where the operation defines it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Orders {
    UpTo(usize),
    List(Vec<usize>),
}

impl Orders {
    pub fn to_vec(&self) -> Vec<usize> {
        match self {
            Orders::UpTo(n) => (1..=*n).collect(),
            Orders::List(v) => v.clone(),
        }
    }
}

impl From<usize> for Orders {
    fn from(n: usize) -> Self {
        Orders::UpTo(n)
    }
}

impl From<Vec<usize>> for Orders {
    fn from(v: Vec<usize>) -> Self {
        Orders::List(v)
    }
}

impl From<&[usize]> for Orders {
    fn from(v: &[usize]) -> Self {
        Orders::List(v.to_vec())
    }
}

/// Sum of optional tensors, `None` meaning zero.
pub(crate) fn accumulate<T: Scalar>(
    acc: &mut Option<Tensor<T>>,
    term: Tensor<T>,
) -> Result<(), TensorError> {
    match acc {
        Some(total) => crate::operations::axpy_inplace(total, T::one(), &term),
        None => {
            *acc = Some(term);
            Ok(())
        }
    }
}
