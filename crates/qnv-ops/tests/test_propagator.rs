//! Tests for matrix-exponential propagation.

use std::f64::consts::FRAC_PI_4;

use num_complex::Complex64;
use rand::{Rng, SeedableRng};

use qnv_ops::{Coupling, OpsError, Operator, OperatorBuilder, PauliOp, Propagator, SpinBasis, TermKind, TermSpec};

fn norm(v: &[Complex64]) -> f64 {
    v.iter().map(|x| x.norm_sqr()).sum::<f64>().sqrt()
}

fn random_dipolar(b: SpinBasis, seed: u64) -> Operator {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let n = b.n_sites();
    let mut xy = Vec::new();
    let mut z = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let c: f64 = rng.gen_range(-1.0..1.0);
            xy.push(Coupling::pair(-c, i, j));
            z.push(Coupling::pair(2.0 * c, i, j));
        }
    }
    let field: Vec<f64> = (0..n).map(|_| rng.gen_range(-0.5..0.5)).collect();
    Operator::build(
        b,
        &[
            TermSpec::new(TermKind::double(PauliOp::X), xy.clone()),
            TermSpec::new(TermKind::double(PauliOp::Y), xy),
            TermSpec::new(TermKind::double(PauliOp::Z), z),
            TermSpec::per_site(PauliOp::Z, &field),
        ],
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Closed forms
// ---------------------------------------------------------------------------

#[test]
fn single_spin_rotation_matches_closed_form() {
    let b = SpinBasis::new(1).unwrap();
    let phi = 0.3;
    let h = OperatorBuilder.total_spin(b, PauliOp::X).unwrap().scale(phi);
    let u = Propagator::unitary(h);

    let mut psi = b.polarized_up();
    let mut work = b.workspace();
    u.apply(&mut psi, &mut work).unwrap();

    // exp(-iφσˣ)|↑⟩ = cos φ |↑⟩ − i sin φ |↓⟩
    assert!((psi[1] - Complex64::new(phi.cos(), 0.0)).norm() < 1e-13);
    assert!((psi[0] - Complex64::new(0.0, -phi.sin())).norm() < 1e-13);
}

#[test]
fn quarter_turn_about_y_polarizes_along_x() {
    let b = SpinBasis::new(3).unwrap();
    let h = Operator::build(b, &[TermSpec::uniform(PauliOp::Y, FRAC_PI_4, 3)]).unwrap();
    let mut psi = b.polarized_up();
    let mut work = b.workspace();
    Propagator::unitary(h).apply(&mut psi, &mut work).unwrap();

    let sx = OperatorBuilder.total_spin(b, PauliOp::X).unwrap();
    let mx = sx.expectation(&psi).unwrap().re / 3.0;
    assert!((mx - 1.0).abs() < 1e-12);
}

#[test]
fn zero_operator_is_identity() {
    let b = SpinBasis::new(2).unwrap();
    let u = Propagator::unitary(Operator::zero(b));
    let mut psi = b.polarized_up();
    let mut work = b.workspace();
    u.apply(&mut psi, &mut work).unwrap();
    assert_eq!(psi, b.polarized_up());
}

// ---------------------------------------------------------------------------
// Structural properties
// ---------------------------------------------------------------------------

#[test]
fn unitary_evolution_preserves_norm_for_large_times() {
    let b = SpinBasis::new(5).unwrap();
    let u = Propagator::unitary(random_dipolar(b, 7).scale(25.0));
    let mut psi = b.polarized_up();
    let mut work = b.workspace();
    for _ in 0..5 {
        u.apply(&mut psi, &mut work).unwrap();
    }
    assert!((norm(&psi) - 1.0).abs() < 1e-10);
}

#[test]
fn split_evolution_composes() {
    let b = SpinBasis::new(4).unwrap();
    let h = random_dipolar(b, 11);
    let mut work = b.workspace();

    let mut once = b.polarized_up();
    Propagator::unitary(h.scale(1.5)).apply(&mut once, &mut work).unwrap();

    let mut twice = b.polarized_up();
    Propagator::unitary(h.scale(0.5)).apply(&mut twice, &mut work).unwrap();
    Propagator::unitary(h.scale(1.0)).apply(&mut twice, &mut work).unwrap();

    for (a, b) in once.iter().zip(&twice) {
        assert!((a - b).norm() < 1e-11);
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn short_workspace_is_error() {
    let b = SpinBasis::new(2).unwrap();
    let u = Propagator::unitary(OperatorBuilder.total_spin(b, PauliOp::Z).unwrap());
    let mut psi = b.polarized_up();
    let mut work = vec![Complex64::new(0.0, 0.0); 4];
    assert!(matches!(
        u.apply(&mut psi, &mut work),
        Err(OpsError::WorkspaceTooSmall { needed: 8, got: 4 })
    ));
}

#[test]
fn wrong_state_length_is_error() {
    let b = SpinBasis::new(2).unwrap();
    let u = Propagator::unitary(OperatorBuilder.total_spin(b, PauliOp::Z).unwrap());
    let mut psi = vec![Complex64::new(1.0, 0.0); 3];
    let mut work = b.workspace();
    assert!(matches!(
        u.apply(&mut psi, &mut work),
        Err(OpsError::DimensionMismatch { expected: 4, got: 3 })
    ));
}
