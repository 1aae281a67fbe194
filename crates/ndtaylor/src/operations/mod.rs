//! Tensor operations.
//!
//! ```text
//! High-level API (permutedims, move_block, outer, trace_last2, ...)
//!     → validate shapes and allocate output
//!     → in-place kernels (permutedims_into)
//!         → backend (GenericBackend)
//! ```

mod elementwise;
mod outer;
mod permutedims;
mod reduce;

pub use elementwise::{
    add, apply, apply_binary, axpy_inplace, div_trailing, scale, scale_inplace, sub,
};
pub use outer::{outer, outer_batched};
pub(crate) use outer::check_shared_axes;
pub use permutedims::{block_move_permutation, move_block, permutedims, permutedims_into};
pub use reduce::{diagonal, is_diagonal, trace_last2};
pub(crate) use reduce::square_size;
