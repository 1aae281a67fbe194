//! Error types for ndtaylor.

use thiserror::Error;

/// Errors that can occur in tensor operations and derivative propagation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TensorError {
    /// Shape mismatch between two tensors, or between data length and shape.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Index out of bounds.
    #[error("index out of bounds: index {index} is out of range for dimension {dim_size}")]
    IndexOutOfBounds { index: usize, dim_size: usize },

    /// Wrong number of indices provided.
    #[error("wrong number of indices: expected {expected}, got {actual}")]
    WrongNumberOfIndices { expected: usize, actual: usize },

    /// Invalid permutation.
    #[error("invalid permutation {perm:?} for tensor with {ndim} dimensions")]
    InvalidPermutation { perm: Vec<usize>, ndim: usize },

    /// Contraction labels are malformed: zero, repeated within one operand,
    /// or a summed label without a partner.
    #[error("invalid contraction labels {labels:?}")]
    InvalidLabels { labels: Vec<i32> },

    /// Operation requires specific tensor rank.
    #[error("expected tensor of rank {expected}, got rank {actual}")]
    RankMismatch { expected: usize, actual: usize },

    /// Matrix must be square.
    #[error("matrix must be square: got {rows}x{cols}")]
    NotSquareMatrix { rows: usize, cols: usize },

    /// Operated-on axes are out of range, repeated, or not the trailing base axes.
    #[error("invalid operand axes {axes:?} for base rank {base_rank}: {reason}")]
    AxisOrder {
        axes: Vec<isize>,
        base_rank: usize,
        reason: &'static str,
    },

    /// A matrix that must be inverted is singular.
    #[error("matrix is singular (pivot magnitude {pivot:e})")]
    SingularMatrix { pivot: f64 },

    /// The normal-form solver received an expansion whose leading non-zero
    /// term is at order two or higher.
    #[error("leading non-zero term at order {order} is not supported (must be 0 or 1)")]
    UnsupportedLeadingOrder { order: usize },

    /// Operator token not recognised in a multi-operand chain.
    #[error("unsupported operator `{token}`")]
    UnsupportedOperator { token: String },

    /// Number of operators does not fit the number of operands.
    #[error("operand count mismatch: {operands} operands need {expected} operators, got {actual}")]
    OperandCount {
        operands: usize,
        expected: usize,
        actual: usize,
    },
}
