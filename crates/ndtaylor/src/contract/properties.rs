//! Label analysis for contractions.
//!
//! A contraction `C = A * B` with batch labels decomposes into `dbatch`
//! independent matrix products `C_s(dleft, dright) = A_s(dleft, dmid) * B_s(dmid, dright)`.

use crate::error::TensorError;

/// Properties of a labelled contraction.
///
/// Label convention:
/// - negative label shared by both operands: summed (contracted)
/// - positive label shared by both operands: batch axis, kept once
/// - positive label in one operand only: free axis, kept
#[derive(Debug, Clone)]
pub struct ContractionProperties {
    /// Batch axis pairs (index in A, index in B), in A's order.
    pub batch: Vec<(usize, usize)>,

    /// Contracted axis pairs (index in A, index in B), in A's order.
    pub contracted: Vec<(usize, usize)>,

    /// Free axes of A, in order.
    pub free_a: Vec<usize>,

    /// Free axes of B, in order.
    pub free_b: Vec<usize>,

    pub dbatch: usize,
    pub dleft: usize,
    pub dmid: usize,
    pub dright: usize,

    /// Result shape: batch axes, then A's free axes, then B's free axes.
    pub output_shape: Vec<usize>,
}

impl ContractionProperties {
    /// Analyse the labels of a contraction.
    ///
    /// # Errors
    ///
    /// - `WrongNumberOfIndices` if a label list does not match its tensor's rank
    /// - `InvalidLabels` for a zero label, a label repeated within one operand,
    ///   or a negative label without a partner
    /// - `ShapeMismatch` if paired axes differ in size
    pub fn compute(
        a_shape: &[usize],
        labels_a: &[i32],
        b_shape: &[usize],
        labels_b: &[i32],
    ) -> Result<Self, TensorError> {
        for (shape, labels) in [(a_shape, labels_a), (b_shape, labels_b)] {
            if labels.len() != shape.len() {
                return Err(TensorError::WrongNumberOfIndices {
                    expected: shape.len(),
                    actual: labels.len(),
                });
            }
            let repeated = labels
                .iter()
                .enumerate()
                .any(|(i, l)| *l == 0 || labels[i + 1..].contains(l));
            if repeated {
                return Err(invalid(labels_a, labels_b));
            }
        }

        let mut batch = Vec::new();
        let mut contracted = Vec::new();
        let mut free_a = Vec::new();
        for (i, &la) in labels_a.iter().enumerate() {
            match labels_b.iter().position(|&lb| lb == la) {
                Some(j) => {
                    if a_shape[i] != b_shape[j] {
                        return Err(TensorError::ShapeMismatch {
                            expected: a_shape[i],
                            actual: b_shape[j],
                        });
                    }
                    if la < 0 {
                        contracted.push((i, j));
                    } else {
                        batch.push((i, j));
                    }
                }
                None if la < 0 => return Err(invalid(labels_a, labels_b)),
                None => free_a.push(i),
            }
        }

        let mut free_b = Vec::new();
        for (j, &lb) in labels_b.iter().enumerate() {
            if !labels_a.contains(&lb) {
                if lb < 0 {
                    return Err(invalid(labels_a, labels_b));
                }
                free_b.push(j);
            }
        }

        let dbatch: usize = batch.iter().map(|&(i, _)| a_shape[i]).product();
        let dleft: usize = free_a.iter().map(|&i| a_shape[i]).product();
        let dmid: usize = contracted.iter().map(|&(i, _)| a_shape[i]).product();
        let dright: usize = free_b.iter().map(|&j| b_shape[j]).product();

        let output_shape = batch
            .iter()
            .map(|&(i, _)| a_shape[i])
            .chain(free_a.iter().map(|&i| a_shape[i]))
            .chain(free_b.iter().map(|&j| b_shape[j]))
            .collect();

        Ok(Self {
            batch,
            contracted,
            free_a,
            free_b,
            dbatch,
            dleft,
            dmid,
            dright,
            output_shape,
        })
    }

    /// Permutation bringing A to `[free..., contracted..., batch...]`.
    pub fn perm_a(&self) -> Vec<usize> {
        self.free_a
            .iter()
            .copied()
            .chain(self.contracted.iter().map(|&(i, _)| i))
            .chain(self.batch.iter().map(|&(i, _)| i))
            .collect()
    }

    /// Permutation bringing B to `[contracted..., free..., batch...]`.
    pub fn perm_b(&self) -> Vec<usize> {
        self.contracted
            .iter()
            .map(|&(_, j)| j)
            .chain(self.free_b.iter().copied())
            .chain(self.batch.iter().map(|&(_, j)| j))
            .collect()
    }

    /// Permutation from the GEMM layout `[free_a..., free_b..., batch...]`
    /// to the output layout `[batch..., free_a..., free_b...]`.
    pub fn perm_c(&self) -> Vec<usize> {
        let nfree = self.free_a.len() + self.free_b.len();
        (nfree..nfree + self.batch.len()).chain(0..nfree).collect()
    }

    /// Shape of the GEMM output before `perm_c` is applied.
    pub fn gemm_shape(&self) -> Vec<usize> {
        let nb = self.batch.len();
        self.output_shape[nb..]
            .iter()
            .chain(&self.output_shape[..nb])
            .copied()
            .collect()
    }
}

fn invalid(labels_a: &[i32], labels_b: &[i32]) -> TensorError {
    TensorError::InvalidLabels {
        labels: labels_a.iter().chain(labels_b).copied().collect(),
    }
}
