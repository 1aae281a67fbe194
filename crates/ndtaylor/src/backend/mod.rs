//! Backend abstraction for tensor kernels.
//!
//! # Backends
//!
//! - `GenericBackend`: Naive loop-based permutation (always available)
//!
//! # faer Integration
//!
//! The `faer_interop` module views rank-2 tensors as faer matrices without
//! copying, so dense linear algebra (LU, solves) runs on faer.

mod faer_interop;
mod generic;
mod permutation;

pub use faer_interop::{AsFaerMat, tensor_from_faer_mat};
pub use generic::GenericBackend;
pub use permutation::PermutationBackend;
