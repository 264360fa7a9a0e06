//! Sparse spin operators.
//!
//! Every product of Pauli operators maps a basis state `b` to a single basis
//! state `b ^ flip` (the XOR of the sites carrying X or Y) with a phase that
//! only depends on `b`. A sum of such products is therefore stored as one
//! coefficient vector per flip pattern:
//!
//!   (H ψ)[b ^ flip] += coeffs_flip[b] · ψ[b]
//!
//! Diagonal terms (Z words) all share the `flip = 0` block; each XX/YY pair
//! shares one off-diagonal block.

use std::collections::BTreeMap;

use num_complex::Complex64;

use crate::basis::SpinBasis;
use crate::error::{OpsError, OpsResult};
use crate::pauli::{PauliOp, TermSpec};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// A linear operator on a [`SpinBasis`], built from Pauli coupling terms.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    basis: SpinBasis,
    blocks: BTreeMap<usize, Vec<Complex64>>,
}

impl Operator {
    /// The zero operator.
    pub fn zero(basis: SpinBasis) -> Self {
        Self {
            basis,
            blocks: BTreeMap::new(),
        }
    }

    /// Build `Σ c · P` from a list of term specs.
    pub fn build(basis: SpinBasis, terms: &[TermSpec]) -> OpsResult<Self> {
        let mut op = Self::zero(basis);
        for spec in terms {
            let word = spec.kind.ops();
            for coupling in &spec.couplings {
                if coupling.sites.len() != word.len() {
                    return Err(OpsError::ArityMismatch {
                        kind: spec.kind.to_string(),
                        expected: word.len(),
                        got: coupling.sites.len(),
                    });
                }
                let mut seen = 0usize;
                let mut flip = 0usize;
                for &site in &coupling.sites {
                    if site >= basis.n_sites() {
                        return Err(OpsError::SiteOutOfRange {
                            site,
                            n_sites: basis.n_sites(),
                        });
                    }
                    if seen & (1 << site) != 0 {
                        return Err(OpsError::RepeatedSite(site));
                    }
                    seen |= 1 << site;
                }
                for (&pauli, &site) in word.iter().zip(&coupling.sites) {
                    if pauli.flips() {
                        flip |= 1 << site;
                    }
                }

                let block = op
                    .blocks
                    .entry(flip)
                    .or_insert_with(|| vec![ZERO; basis.dim()]);
                for (b, entry) in block.iter_mut().enumerate() {
                    let mut phase = Complex64::new(coupling.coeff, 0.0);
                    for (&pauli, &site) in word.iter().zip(&coupling.sites) {
                        phase *= site_phase(pauli, (b >> site) & 1 == 1);
                    }
                    *entry += phase;
                }
            }
        }
        Ok(op)
    }

    /// The basis this operator acts on.
    pub fn basis(&self) -> SpinBasis {
        self.basis
    }

    /// Number of distinct flip patterns stored.
    pub fn n_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// `self + other`.
    pub fn add(&self, other: &Operator) -> OpsResult<Operator> {
        let mut sum = self.clone();
        sum.add_assign(other)?;
        Ok(sum)
    }

    /// `self += other`.
    pub fn add_assign(&mut self, other: &Operator) -> OpsResult<()> {
        self.check_same_basis(other)?;
        for (&flip, coeffs) in &other.blocks {
            match self.blocks.get_mut(&flip) {
                Some(block) => {
                    for (a, b) in block.iter_mut().zip(coeffs) {
                        *a += b;
                    }
                }
                None => {
                    self.blocks.insert(flip, coeffs.clone());
                }
            }
        }
        Ok(())
    }

    /// `c · self`.
    #[must_use]
    pub fn scale(&self, c: f64) -> Operator {
        self.scale_complex(Complex64::new(c, 0.0))
    }

    /// `c · self` for complex `c`.
    #[must_use]
    pub fn scale_complex(&self, c: Complex64) -> Operator {
        Operator {
            basis: self.basis,
            blocks: self
                .blocks
                .iter()
                .map(|(&flip, coeffs)| (flip, coeffs.iter().map(|a| a * c).collect()))
                .collect(),
        }
    }

    /// `out = self · input`.
    pub fn apply(&self, input: &[Complex64], out: &mut [Complex64]) -> OpsResult<()> {
        self.basis.check_len(input.len())?;
        self.basis.check_len(out.len())?;
        self.apply_unchecked(input, out);
        Ok(())
    }

    pub(crate) fn apply_unchecked(&self, input: &[Complex64], out: &mut [Complex64]) {
        out.fill(ZERO);
        for (&flip, coeffs) in &self.blocks {
            for (b, (&c, &amp)) in coeffs.iter().zip(input).enumerate() {
                out[b ^ flip] += c * amp;
            }
        }
    }

    /// ⟨ψ|self|ψ⟩.
    pub fn expectation(&self, state: &[Complex64]) -> OpsResult<Complex64> {
        self.basis.check_len(state.len())?;
        let mut acc = ZERO;
        for (&flip, coeffs) in &self.blocks {
            for (b, (&c, &amp)) in coeffs.iter().zip(state).enumerate() {
                acc += state[b ^ flip].conj() * c * amp;
            }
        }
        Ok(acc)
    }

    /// Dense row-major matrix, `dim × dim`.
    pub fn to_dense(&self) -> Vec<Complex64> {
        let dim = self.basis.dim();
        let mut dense = vec![ZERO; dim * dim];
        for (&flip, coeffs) in &self.blocks {
            for (b, &c) in coeffs.iter().enumerate() {
                dense[(b ^ flip) * dim + b] += c;
            }
        }
        dense
    }

    /// Trace of the operator.
    pub fn trace(&self) -> Complex64 {
        self.blocks
            .get(&0)
            .map_or(ZERO, |diag| diag.iter().sum())
    }

    /// Induced 1-norm (maximum absolute column sum) of `self - shift·I`.
    pub fn one_norm_shifted(&self, shift: Complex64) -> f64 {
        let mut columns = vec![0.0f64; self.basis.dim()];
        for (&flip, coeffs) in &self.blocks {
            for (b, &c) in coeffs.iter().enumerate() {
                columns[b] += if flip == 0 { (c - shift).norm() } else { c.norm() };
            }
        }
        if !self.blocks.contains_key(&0) {
            for col in &mut columns {
                *col += shift.norm();
            }
        }
        columns.into_iter().fold(0.0, f64::max)
    }

    /// Induced 1-norm of the operator.
    pub fn one_norm(&self) -> f64 {
        self.one_norm_shifted(ZERO)
    }

    fn check_same_basis(&self, other: &Operator) -> OpsResult<()> {
        if self.basis == other.basis {
            Ok(())
        } else {
            Err(OpsError::DimensionMismatch {
                expected: self.basis.dim(),
                got: other.basis.dim(),
            })
        }
    }
}

/// Stateless entry point turning coupling-term lists into operators.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorBuilder;

impl OperatorBuilder {
    /// Build an operator on `basis` from `terms`.
    pub fn build(&self, basis: SpinBasis, terms: &[TermSpec]) -> OpsResult<Operator> {
        Operator::build(basis, terms)
    }

    /// `Σ_j σ^op_j` with unit coefficients.
    pub fn total_spin(&self, basis: SpinBasis, op: PauliOp) -> OpsResult<Operator> {
        Operator::build(basis, &[TermSpec::uniform(op, 1.0, basis.n_sites())])
    }
}

/// Phase picked up by basis state bit `up` under `pauli`.
fn site_phase(pauli: PauliOp, up: bool) -> Complex64 {
    match (pauli, up) {
        (PauliOp::X, _) => Complex64::new(1.0, 0.0),
        (PauliOp::Y, true) => Complex64::new(0.0, 1.0),
        (PauliOp::Y, false) => Complex64::new(0.0, -1.0),
        (PauliOp::Z, true) => Complex64::new(1.0, 0.0),
        (PauliOp::Z, false) => Complex64::new(-1.0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pauli::{Coupling, TermKind};

    fn basis(n: usize) -> SpinBasis {
        SpinBasis::new(n).unwrap()
    }

    #[test]
    fn test_zz_is_diagonal() {
        let op = Operator::build(
            basis(2),
            &[TermSpec::new(
                TermKind::double(PauliOp::Z),
                vec![Coupling::pair(1.0, 0, 1)],
            )],
        )
        .unwrap();
        assert_eq!(op.n_blocks(), 1);
        assert!((op.trace().re).abs() < 1e-15);
    }

    #[test]
    fn test_xx_and_yy_share_block() {
        let op = Operator::build(
            basis(2),
            &[
                TermSpec::new(TermKind::double(PauliOp::X), vec![Coupling::pair(1.0, 0, 1)]),
                TermSpec::new(TermKind::double(PauliOp::Y), vec![Coupling::pair(1.0, 0, 1)]),
            ],
        )
        .unwrap();
        assert_eq!(op.n_blocks(), 1);
        // XX + YY annihilates |↑↑⟩ and |↓↓⟩.
        let up = basis(2).polarized_up();
        let mut out = vec![ZERO; 4];
        op.apply(&up, &mut out).unwrap();
        assert!(out.iter().all(|a| a.norm() < 1e-15));
    }

    #[test]
    fn test_dense_matches_apply() {
        let op = Operator::build(
            basis(2),
            &[
                TermSpec::new(TermKind::double(PauliOp::X), vec![Coupling::pair(0.5, 0, 1)]),
                TermSpec::new(TermKind::single(PauliOp::Y), vec![Coupling::single(0.3, 1)]),
                TermSpec::new(TermKind::single(PauliOp::Z), vec![Coupling::single(-0.7, 0)]),
            ],
        )
        .unwrap();
        let dense = op.to_dense();
        assert_eq!(dense.len(), 16);

        let mut out = vec![ZERO; 4];
        for col in 0..4 {
            let mut e = vec![ZERO; 4];
            e[col] = Complex64::new(1.0, 0.0);
            op.apply(&e, &mut out).unwrap();
            for row in 0..4 {
                assert_eq!(dense[row * 4 + col], out[row], "({row}, {col})");
            }
        }
        // Hermitian
        for row in 0..4 {
            for col in 0..4 {
                assert!((dense[row * 4 + col] - dense[col * 4 + row].conj()).norm() < 1e-15);
            }
        }
    }

    #[test]
    fn test_repeated_site_rejected() {
        let err = Operator::build(
            basis(2),
            &[TermSpec::new(
                TermKind::double(PauliOp::Z),
                vec![Coupling::pair(1.0, 1, 1)],
            )],
        );
        assert!(matches!(err, Err(OpsError::RepeatedSite(1))));
    }

    #[test]
    fn test_one_norm_shift_without_diagonal() {
        let op = OperatorBuilder.total_spin(basis(1), PauliOp::X).unwrap();
        assert!((op.one_norm() - 1.0).abs() < 1e-15);
        assert!((op.one_norm_shifted(Complex64::new(2.0, 0.0)) - 3.0).abs() < 1e-15);
    }
}
