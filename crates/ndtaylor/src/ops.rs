//! Bilinear operators that derivatives are pushed through.
//!
//! A [`TensorOp`] is either a contraction over paired axes or an outer
//! product. Axes are written in the coordinates of the operands' order-0
//! terms, shared axes included, with negative values counting from the end.
//! When the operator is applied to higher-order terms the engine shifts the
//! axes past the derivative block and moves the second operand's derivative
//! block to the front.

use std::str::FromStr;

use crate::contract::tensordot;
use crate::error::TensorError;
use crate::operations::{move_block, outer_batched};
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Kind of bilinear operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Contract,
    Outer,
}

impl FromStr for OpKind {
    type Err = TensorError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "." | "dot" | "contract" | "inner" => Ok(OpKind::Contract),
            "x" | "prod" | "product" | "outer" => Ok(OpKind::Outer),
            _ => Err(TensorError::UnsupportedOperator {
                token: token.to_string(),
            }),
        }
    }
}

/// An operator together with the axes it acts on.
///
/// # Example
///
/// ```
/// use ndtaylor::ops::{OpKind, TensorOp};
///
/// let op = TensorOp::parse("dot", None).unwrap();
/// assert_eq!(op, TensorOp::contract(vec![-1], vec![0]));
///
/// let op = TensorOp::parse("x", Some((vec![-1], vec![-1]))).unwrap();
/// assert_eq!(op.kind, OpKind::Outer);
/// assert!(TensorOp::parse("@", None).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorOp {
    pub kind: OpKind,
    pub axes_a: Vec<isize>,
    pub axes_b: Vec<isize>,
}

impl TensorOp {
    pub fn contract(axes_a: Vec<isize>, axes_b: Vec<isize>) -> Self {
        Self {
            kind: OpKind::Contract,
            axes_a,
            axes_b,
        }
    }

    pub fn outer(axes_a: Vec<isize>, axes_b: Vec<isize>) -> Self {
        Self {
            kind: OpKind::Outer,
            axes_a,
            axes_b,
        }
    }

    /// Contraction of A's last axis with B's first.
    pub fn dot() -> Self {
        Self::contract(vec![-1], vec![0])
    }

    /// Build an operator from a token and optional axes.
    ///
    /// Contractions default to `(-1, 0)` and outer products to `(-1, -1)`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperator` for an unknown token.
    pub fn parse(token: &str, axes: Option<(Vec<isize>, Vec<isize>)>) -> Result<Self, TensorError> {
        let kind: OpKind = token.parse()?;
        let (axes_a, axes_b) = axes.unwrap_or_else(|| match kind {
            OpKind::Contract => (vec![-1], vec![0]),
            OpKind::Outer => (vec![-1], vec![-1]),
        });
        Ok(Self { kind, axes_a, axes_b })
    }

    /// Apply to plain tensors batched over `shared` leading axes.
    ///
    /// # Errors
    ///
    /// Axis errors from [`TensorOp::resolve`] and shape errors from the
    /// underlying kernel.
    pub fn apply<T: Scalar>(
        &self,
        a: &Tensor<T>,
        b: &Tensor<T>,
        shared: usize,
    ) -> Result<Tensor<T>, TensorError> {
        self.resolve(a.ndim(), b.ndim(), shared)?.apply_shifted(a, 0, b, 0)
    }

    /// Normalize and validate the axes against the ranks of the order-0
    /// operands.
    ///
    /// Contraction axes must be distinct, pairwise equal in number and lie
    /// past the shared axes. Outer-product axes must name every non-shared
    /// axis of their operand.
    ///
    /// # Errors
    ///
    /// Returns `AxisOrder` when any of these conditions fails.
    pub(crate) fn resolve(
        &self,
        rank_a: usize,
        rank_b: usize,
        shared: usize,
    ) -> Result<ResolvedOp, TensorError> {
        let axes_a = normalize_axes(&self.axes_a, rank_a, shared)?;
        let axes_b = normalize_axes(&self.axes_b, rank_b, shared)?;
        let (base_a, base_b) = (rank_a - shared, rank_b - shared);
        match self.kind {
            OpKind::Contract => {
                if axes_a.len() != axes_b.len() {
                    return Err(TensorError::AxisOrder {
                        axes: self.axes_a.clone(),
                        base_rank: base_a,
                        reason: "contracted axis lists differ in length",
                    });
                }
            }
            OpKind::Outer => {
                for (axes, raw, base) in [
                    (&axes_a, &self.axes_a, base_a),
                    (&axes_b, &self.axes_b, base_b),
                ] {
                    let mut sorted = axes.clone();
                    sorted.sort_unstable();
                    if !sorted.iter().copied().eq(shared..shared + base) {
                        return Err(TensorError::AxisOrder {
                            axes: raw.clone(),
                            base_rank: base,
                            reason: "outer-product axes must be all trailing base axes",
                        });
                    }
                }
            }
        }
        Ok(ResolvedOp {
            kind: self.kind,
            axes_a,
            axes_b,
            base_a,
            shared,
        })
    }
}

impl Default for TensorOp {
    fn default() -> Self {
        Self::dot()
    }
}

fn normalize_axes(axes: &[isize], rank: usize, shared: usize) -> Result<Vec<usize>, TensorError> {
    let base_rank = rank.saturating_sub(shared);
    let error = |reason| TensorError::AxisOrder {
        axes: axes.to_vec(),
        base_rank,
        reason,
    };
    let mut out = Vec::with_capacity(axes.len());
    for &ax in axes {
        let norm = if ax < 0 { rank as isize + ax } else { ax };
        if norm < shared as isize || norm >= rank as isize {
            return Err(error("axis outside the base axes"));
        }
        let norm = norm as usize;
        if out.contains(&norm) {
            return Err(error("axis repeated"));
        }
        out.push(norm);
    }
    Ok(out)
}

/// A [`TensorOp`] with axes normalized against known operand ranks.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedOp {
    kind: OpKind,
    axes_a: Vec<usize>,
    axes_b: Vec<usize>,
    base_a: usize,
    shared: usize,
}

impl ResolvedOp {
    /// Rank of the order-0 result given B's order-0 rank.
    pub(crate) fn result_rank(&self, rank_b: usize) -> usize {
        let base_b = rank_b - self.shared;
        match self.kind {
            OpKind::Contract => self.shared + self.base_a + base_b - 2 * self.axes_a.len(),
            OpKind::Outer => self.shared + self.base_a + base_b,
        }
    }

    /// Apply to terms carrying `da` and `db` derivative axes.
    ///
    /// Input layouts are `[S][da][A base]` and `[S][db][B base]`; the result
    /// is `[S][db][da][result base]`.
    pub(crate) fn apply_shifted<T: Scalar>(
        &self,
        a: &Tensor<T>,
        da: usize,
        b: &Tensor<T>,
        db: usize,
    ) -> Result<Tensor<T>, TensorError> {
        let s = self.shared;
        let (raw, b_block) = match self.kind {
            OpKind::Contract => {
                let ax_a: Vec<usize> = self.axes_a.iter().map(|&x| x + da).collect();
                let ax_b: Vec<usize> = self.axes_b.iter().map(|&x| x + db).collect();
                let raw = tensordot(a, &ax_a, b, &ax_b, s)?;
                (raw, s + da + self.base_a - self.axes_a.len())
            }
            OpKind::Outer => (outer_batched(a, b, s)?, s + da + self.base_a),
        };
        if db == 0 {
            return Ok(raw);
        }
        move_block(&raw, b_block, db, s)
    }
}
