//! ndtaylor - higher-order derivative propagation through tensor expressions
//!
//! A quantity is carried as an [`Expansion`]: its value followed by its raw
//! derivative tensors with respect to a set of variables. Term `k` stores
//! the derivative axes first and the value axes last, so a derivative of
//! order `k` of a tensor of shape `base` has shape `[n; k] ++ base`.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Derivative rules
//!     → tensordot_deriv, tensorprod_deriv, scalarprod_deriv
//!     → matinv_deriv, matdet_deriv, scalarinv_deriv
//!     → tensor_reexpand, inverse_transformation, optimizing_transformation
//!
//! Level 2: Propagation engine
//!     → op_deriv (Leibniz rule), tensorops_deriv (chains)
//!     → partition_dot / partition_prod (Faà di Bruno)
//!     → symmetrize (shuffle sums over derivative blocks)
//!
//! Level 3: Dense kernels
//!     → contract (GEMM via faer), outer, permutedims, LU
//! ```
//!
//! # Example
//!
//! ```
//! use ndtaylor::{DerivOptions, Expansion, Orders, Tensor, TensorOp, op_deriv};
//!
//! // f(x) = x and g(x) = 2 + x, both scalars of one variable.
//! let f = Expansion::from_tensors(vec![Tensor::scalar(0.0), Tensor::ones(&[1])]);
//! let g = Expansion::from_tensors(vec![Tensor::scalar(2.0), Tensor::ones(&[1])]);
//!
//! // (f g)'' = 2 f' g' = 2
//! let op = TensorOp::outer(vec![], vec![]);
//! let d = op_deriv(&op, &f, &g, Orders::UpTo(2), DerivOptions::default()).unwrap();
//! assert_eq!(d[0].as_tensor().unwrap().data(), &[2.0]);
//! assert_eq!(d[1].as_tensor().unwrap().data(), &[2.0]);
//! ```

pub mod algebraic;
pub mod backend;
pub mod combinatorics;
pub mod contract;
pub mod derived;
pub mod error;
pub mod expansion;
pub mod linalg;
pub mod normal_form;
pub mod operations;
pub mod ops;
pub mod propagate;
pub mod random;
pub mod reexpand;
pub mod scalar;
pub mod strides;
pub mod symmetrize;
pub mod tensor;

pub use algebraic::{matdet_deriv, matinv_deriv, scalarinv_deriv};
pub use contract::contract;
pub use derived::{scalarprod_deriv, tensordot_deriv, tensorprod_deriv};
pub use error::TensorError;
pub use expansion::{Expansion, Orders, Term};
pub use normal_form::optimizing_transformation;
pub use ops::{OpKind, TensorOp};
pub use propagate::{DerivOptions, op_deriv, tensorops_deriv};
pub use reexpand::{
    ReexpandAxes, inverse_transformation, partition_dot, partition_prod, tensor_reexpand,
};
pub use scalar::{Scalar, c64};
pub use symmetrize::{SymmetrizeOptions, symmetrize};
pub use tensor::Tensor;
