//! Functional inverses and the normal-form solver on seeded random inputs.

mod common;

use common::{assert_term_close, init_tracing};
use ndtaylor::linalg::inverse;
use ndtaylor::operations::{add, apply_binary, scale};
use ndtaylor::random::random_expansion;
use ndtaylor::{
    Expansion, Orders, ReexpandAxes, Tensor, TensorError, Term, inverse_transformation,
    optimizing_transformation, tensor_reexpand,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

const N: usize = 3;

/// Derivative sequence `[J, H, T]` of a random invertible map with a
/// symmetric, diagonally dominant Jacobian.
fn random_forward(seed: u64) -> Expansion<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let e = random_expansion::<f64, _>(N, &[N], 3, &mut rng);
    let noise = e.get(1).unwrap();
    let jacobian = Tensor::from_fn(&[N, N], |idx| {
        let sym =
            0.5 * (noise.get(&[idx[0], idx[1]]).unwrap() + noise.get(&[idx[1], idx[0]]).unwrap());
        let diag = if idx[0] == idx[1] { 2.0 } else { 0.0 };
        diag + 0.1 * sym
    });
    Expansion::from_tensors(vec![
        jacobian,
        scale(e.get(2).unwrap(), 0.3),
        scale(e.get(3).unwrap(), 0.2),
    ])
}

fn assert_identity_sequence(terms: &[Term<f64>]) {
    assert_eq!(terms.len(), 3);
    assert_term_close(&terms[0], &Tensor::identity(N), 1e-9);
    assert_term_close(&terms[1], &Tensor::zeros(&[N, N, N]), 1e-9);
    assert_term_close(&terms[2], &Tensor::zeros(&[N, N, N, N]), 1e-9);
}

#[test]
fn test_inverse_round_trip() {
    init_tracing();
    for seed in [1, 2, 3] {
        let forward = random_forward(seed);
        let reverse = inverse_transformation(&forward, 2, None).unwrap();
        assert_eq!(reverse.len(), 3);

        let there_and_back =
            tensor_reexpand(&forward, &reverse, Orders::UpTo(3), ReexpandAxes::default()).unwrap();
        assert_identity_sequence(&there_and_back);

        let back_and_there =
            tensor_reexpand(&reverse, &forward, Orders::UpTo(3), ReexpandAxes::default()).unwrap();
        assert_identity_sequence(&back_and_there);
    }
}

#[test]
fn test_inverse_extends_partial_seed() {
    let forward = random_forward(4);
    let full = inverse_transformation(&forward, 2, None).unwrap();
    let seed = Expansion::new(full.terms()[..2].to_vec());
    let extended = inverse_transformation(&forward, 2, Some(seed)).unwrap();
    assert!(extended.approx_eq(&full, 1e-12));
}

#[test]
fn test_inverse_of_linear_map_has_no_higher_terms() {
    let jacobian = Tensor::from_vec(vec![2.0, 1.0, 0.0, 3.0], &[2, 2]).unwrap();
    let forward = Expansion::new(vec![Term::Tensor(jacobian), Term::Zero]);
    let reverse = inverse_transformation(&forward, 3, None).unwrap();
    assert_eq!(reverse.len(), 4);
    assert!(reverse.terms()[1..].iter().all(Term::is_zero));
}

/// `(V ∘ Q)[o] + (o + 2) Q[o] w = 0` with `w` broadcast along the last axis.
fn assert_normal_form_recursion(
    v: &Expansion<f64>,
    q: &Expansion<f64>,
    w: &Tensor<f64>,
    max_order: usize,
) {
    for o in 1..=max_order {
        let composed = tensor_reexpand(v, q, vec![o], ReexpandAxes::default())
            .unwrap()
            .pop()
            .unwrap();
        let Some(qo) = q.get(o) else {
            assert!(composed.is_zero());
            continue;
        };
        let broadcast = Tensor::from_fn(qo.shape(), |idx| *w.get(&[idx[idx.len() - 1]]).unwrap());
        let weighted = apply_binary(qo, &broadcast, |a, b| a * b).unwrap();
        let residual =
            add(composed.as_tensor().unwrap(), &scale(&weighted, (o + 2) as f64)).unwrap();
        assert!(residual.max_abs() < 1e-10, "order {o}: residual {}", residual.max_abs());
    }
}

#[test]
fn test_normal_form_with_diagonal_hessian() {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(9);
    let e = random_expansion::<f64, _>(N, &[], 4, &mut rng);
    let w = [1.0, 2.0, 3.0];
    let v = Expansion::new(vec![
        Term::Zero,
        Term::Tensor(Tensor::from_diag(&w)),
        Term::Tensor(e.get(3).unwrap().clone()),
        Term::Tensor(e.get(4).unwrap().clone()),
    ]);

    let q = optimizing_transformation(&v, 3).unwrap();
    assert_eq!(q.len(), 4);
    assert_eq!(q.get(0).unwrap(), &Tensor::identity(N));
    assert_normal_form_recursion(&v, &q, &Tensor::from_vec(w.to_vec(), &[N]).unwrap(), 3);
}

#[test]
fn test_normal_form_with_coupled_hessian() {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(17);
    let e = random_expansion::<f64, _>(N, &[], 4, &mut rng);
    let hessian = Tensor::from_vec(
        vec![4.0, 1.0, 0.5, 1.0, 3.0, 0.2, 0.5, 0.2, 2.0],
        &[N, N],
    )
    .unwrap();
    let v = Expansion::new(vec![
        Term::Zero,
        Term::Tensor(hessian.clone()),
        Term::Tensor(e.get(3).unwrap().clone()),
        Term::Tensor(e.get(4).unwrap().clone()),
    ]);

    let q = optimizing_transformation(&v, 3).unwrap();
    assert_eq!(q.len(), 4);
    assert!(q.get(0).unwrap().approx_eq(&inverse(&hessian).unwrap(), 1e-12));
    assert!(q.term(1).unwrap().is_zero());
    assert_normal_form_recursion(&v, &q, &Tensor::ones(&[N]), 3);
}

#[test]
fn test_normal_form_with_gradient() {
    let g = Tensor::from_vec(vec![1.0, -2.0, 0.5], &[N]).unwrap();
    let mut rng = StdRng::seed_from_u64(13);
    let e = random_expansion::<f64, _>(N, &[], 2, &mut rng);
    let v = Expansion::from_tensors(vec![g.clone(), e.get(2).unwrap().clone()]);

    let q = optimizing_transformation(&v, 1).unwrap();
    assert_eq!(q.get(0).unwrap(), &Tensor::identity(N));
    assert_normal_form_recursion(&v, &q, &g, 1);
}

#[test]
fn test_normal_form_gradient_seed_stops_at_first_order() {
    let g = Tensor::from_vec(vec![1.0, -2.0, 0.5], &[N]).unwrap();
    let v = Expansion::from_tensors(vec![g, Tensor::identity(N)]);
    assert!(matches!(
        optimizing_transformation(&v, 2),
        Err(TensorError::RankMismatch { .. })
    ));
}

#[test]
fn test_normal_form_rejects_higher_leading_order() {
    let v: Expansion<f64> = Expansion::new(vec![
        Term::Zero,
        Term::Zero,
        Term::Tensor(Tensor::ones(&[N, N, N])),
    ]);
    assert_eq!(
        optimizing_transformation(&v, 3),
        Err(TensorError::UnsupportedLeadingOrder { order: 2 })
    );
}
