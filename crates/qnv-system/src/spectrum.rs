//! Exact diagonalization of small Hamiltonians.

use faer::{Mat, Side, c64};
use num_complex::Complex64;
use qnv_ops::Operator;
use tracing::debug;

use crate::error::{SystemError, SystemResult};

/// Largest chain densified for diagonalization (`4096 × 4096`).
pub const MAX_DENSE_SITES: usize = 12;

/// Eigenvalues and eigenvectors of a Hermitian operator, energies ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Eigenvalues.
    pub energies: Vec<f64>,
    /// Normalized eigenvectors; `states[k]` belongs to `energies[k]`.
    pub states: Vec<Vec<Complex64>>,
}

impl Spectrum {
    /// Number of eigenpairs.
    pub fn len(&self) -> usize {
        self.energies.len()
    }

    /// Whether the spectrum is empty.
    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    /// Ground-state energy.
    pub fn ground_energy(&self) -> Option<f64> {
        self.energies.first().copied()
    }
}

/// Diagonalize a Hermitian operator.
///
/// Only the lower triangle is read. Energies are the Rayleigh quotients of
/// the returned eigenvectors.
pub fn diagonalize(op: &Operator) -> SystemResult<Spectrum> {
    let basis = op.basis();
    if basis.n_sites() > MAX_DENSE_SITES {
        return Err(SystemError::InvalidParameter {
            name: "n_sites",
            reason: format!(
                "dense diagonalization supports at most {MAX_DENSE_SITES} spins, got {}",
                basis.n_sites()
            ),
        });
    }

    let dim = basis.dim();
    let dense = op.to_dense();
    let matrix = Mat::<c64>::from_fn(dim, dim, |i, j| {
        let z = dense[i * dim + j];
        c64::new(z.re, z.im)
    });
    let evd = matrix
        .self_adjoint_eigen(Side::Lower)
        .map_err(|e| SystemError::Eigendecomposition(format!("{e:?}")))?;
    let u = evd.U();

    let mut pairs = Vec::with_capacity(dim);
    for k in 0..dim {
        let state: Vec<Complex64> = (0..dim)
            .map(|i| {
                let z = u[(i, k)];
                Complex64::new(z.re, z.im)
            })
            .collect();
        let energy = op.expectation(&state)?.re;
        pairs.push((energy, state));
    }
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    debug!(dim, ground = ?pairs.first().map(|p| p.0), "diagonalized operator");
    let (energies, states) = pairs.into_iter().unzip();
    Ok(Spectrum { energies, states })
}

#[cfg(test)]
mod tests {
    use super::*;
    use qnv_ops::{Coupling, PauliOp, SpinBasis, TermKind, TermSpec};

    fn heisenberg_pair() -> Operator {
        let basis = SpinBasis::new(2).unwrap();
        let pair = || vec![Coupling::pair(1.0, 0, 1)];
        Operator::build(
            basis,
            &[
                TermSpec::new(TermKind::double(PauliOp::X), pair()),
                TermSpec::new(TermKind::double(PauliOp::Y), pair()),
                TermSpec::new(TermKind::double(PauliOp::Z), pair()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_heisenberg_singlet_triplet() {
        let spectrum = diagonalize(&heisenberg_pair()).unwrap();
        assert_eq!(spectrum.len(), 4);
        let expected = [-3.0, 1.0, 1.0, 1.0];
        for (e, x) in spectrum.energies.iter().zip(expected) {
            assert!((e - x).abs() < 1e-10, "{:?}", spectrum.energies);
        }

        // The singlet (|↑↓⟩ − |↓↑⟩)/√2 lives on indices 1 and 2.
        let singlet = &spectrum.states[0];
        assert!(singlet[0].norm() < 1e-10 && singlet[3].norm() < 1e-10);
        assert!((singlet[1] + singlet[2]).norm() < 1e-10);
        assert!((singlet[1].norm_sqr() - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_eigenvectors_satisfy_eigen_equation() {
        let op = heisenberg_pair();
        let spectrum = diagonalize(&op).unwrap();
        let mut out = vec![Complex64::new(0.0, 0.0); 4];
        for (e, v) in spectrum.energies.iter().zip(&spectrum.states) {
            op.apply(v, &mut out).unwrap();
            for (hv, x) in out.iter().zip(v) {
                assert!((*hv - *x * *e).norm() < 1e-10);
            }
        }
    }

    #[test]
    fn test_zero_operator_spectrum() {
        let spectrum = diagonalize(&Operator::zero(SpinBasis::new(1).unwrap())).unwrap();
        assert_eq!(spectrum.energies.len(), 2);
        assert!(spectrum.energies.iter().all(|e| e.abs() < 1e-15));
        assert_eq!(spectrum.ground_energy(), Some(spectrum.energies[0]));
    }

    #[test]
    fn test_large_chain_rejected() {
        let basis = SpinBasis::new(MAX_DENSE_SITES + 1).unwrap();
        assert!(matches!(
            diagonalize(&Operator::zero(basis)),
            Err(SystemError::InvalidParameter { name: "n_sites", .. })
        ));
    }
}
