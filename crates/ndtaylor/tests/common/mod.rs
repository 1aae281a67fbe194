//! Helpers shared by the integration tests.

#![allow(dead_code)]

use ndtaylor::{Tensor, Term};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Dense matrix product of two rank-2 tensors.
pub fn matmul(a: &Tensor<f64>, b: &Tensor<f64>) -> Tensor<f64> {
    let (n, k) = (a.shape()[0], a.shape()[1]);
    let m = b.shape()[1];
    Tensor::from_fn(&[n, m], |idx| {
        (0..k)
            .map(|l| a.get(&[idx[0], l]).unwrap() * b.get(&[l, idx[1]]).unwrap())
            .sum()
    })
}

/// Assert that `term` matches `expected` elementwise; a zero term matches a
/// tensor whose entries all lie within `tol`.
pub fn assert_term_close(term: &Term<f64>, expected: &Tensor<f64>, tol: f64) {
    match term.as_tensor() {
        Some(t) => {
            assert_eq!(t.shape(), expected.shape());
            for (i, (x, y)) in t.data().iter().zip(expected.data()).enumerate() {
                assert!((x - y).abs() <= tol, "entry {i}: {x} vs {y} (tol {tol})");
            }
        }
        None => assert!(
            expected.max_abs() <= tol,
            "zero term but expected max {}",
            expected.max_abs()
        ),
    }
}
