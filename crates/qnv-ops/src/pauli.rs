//! Coupling-term descriptions.
//!
//! An operator is described as a list of term specs, each pairing a Pauli
//! word with the couplings it is applied to:
//!
//!   H = Σ_kind Σ_(c, sites)  c · P_kind(sites)
//!
//! # Example
//!
//! ```rust
//! use qnv_ops::pauli::{Coupling, TermKind, TermSpec};
//!
//! // H = -0.5·X₀X₁ + 1.0·Z₀Z₁
//! let terms = vec![
//!     TermSpec::new(TermKind::parse("xx").unwrap(), vec![Coupling::pair(-0.5, 0, 1)]),
//!     TermSpec::new(TermKind::parse("zz").unwrap(), vec![Coupling::pair(1.0, 0, 1)]),
//! ];
//! assert_eq!(terms[0].kind.arity(), 2);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OpsError, OpsResult};

/// Single-site Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauliOp {
    /// σˣ.
    X,
    /// σʸ.
    Y,
    /// σᶻ.
    Z,
}

impl PauliOp {
    /// Lowercase letter for this operator.
    pub fn as_char(self) -> char {
        match self {
            PauliOp::X => 'x',
            PauliOp::Y => 'y',
            PauliOp::Z => 'z',
        }
    }

    /// Whether the operator flips the spin it acts on.
    pub fn flips(self) -> bool {
        !matches!(self, PauliOp::Z)
    }
}

impl FromStr for PauliOp {
    type Err = OpsError;

    fn from_str(s: &str) -> OpsResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(PauliOp::X),
            "y" => Ok(PauliOp::Y),
            "z" => Ok(PauliOp::Z),
            _ => Err(OpsError::InvalidTermKind(s.to_string())),
        }
    }
}

impl fmt::Display for PauliOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A Pauli word such as `x`, `zz` or `xy`; position `i` of the word acts on
/// the `i`-th site of each coupling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermKind {
    ops: Vec<PauliOp>,
}

impl TermKind {
    /// Parse a word over `x`, `y`, `z` (case-insensitive).
    pub fn parse(word: &str) -> OpsResult<Self> {
        if word.is_empty() {
            return Err(OpsError::InvalidTermKind(word.to_string()));
        }
        let ops = word
            .chars()
            .map(|c| PauliOp::from_str(&c.to_string()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| OpsError::InvalidTermKind(word.to_string()))?;
        Ok(Self { ops })
    }

    /// A single-site kind.
    pub fn single(op: PauliOp) -> Self {
        Self { ops: vec![op] }
    }

    /// A two-site kind with the same operator on both sites.
    pub fn double(op: PauliOp) -> Self {
        Self { ops: vec![op, op] }
    }

    /// Operators in word order.
    pub fn ops(&self) -> &[PauliOp] {
        &self.ops
    }

    /// Number of sites the kind acts on.
    pub fn arity(&self) -> usize {
        self.ops.len()
    }
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            write!(f, "{}", op.as_char())?;
        }
        Ok(())
    }
}

/// A coefficient attached to an ordered list of sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupling {
    /// Real coefficient.
    pub coeff: f64,
    /// Sites, in the order of the term kind's operators.
    pub sites: Vec<usize>,
}

impl Coupling {
    /// Create a new coupling.
    pub fn new(coeff: f64, sites: Vec<usize>) -> Self {
        Self { coeff, sites }
    }

    /// Shorthand: single-site coupling.
    pub fn single(coeff: f64, site: usize) -> Self {
        Self::new(coeff, vec![site])
    }

    /// Shorthand: two-site coupling.
    pub fn pair(coeff: f64, i: usize, j: usize) -> Self {
        Self::new(coeff, vec![i, j])
    }
}

/// A term kind together with every coupling it is applied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermSpec {
    /// The Pauli word.
    pub kind: TermKind,
    /// The couplings.
    pub couplings: Vec<Coupling>,
}

impl TermSpec {
    /// Create a new term spec.
    pub fn new(kind: TermKind, couplings: Vec<Coupling>) -> Self {
        Self { kind, couplings }
    }

    /// The same single-site operator with a uniform coefficient on every site.
    pub fn uniform(op: PauliOp, coeff: f64, n_sites: usize) -> Self {
        Self::new(
            TermKind::single(op),
            (0..n_sites).map(|j| Coupling::single(coeff, j)).collect(),
        )
    }

    /// A single-site operator with per-site coefficients.
    pub fn per_site(op: PauliOp, coeffs: &[f64]) -> Self {
        Self::new(
            TermKind::single(op),
            coeffs
                .iter()
                .enumerate()
                .map(|(j, &c)| Coupling::single(c, j))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_word() {
        let kind = TermKind::parse("XzY").unwrap();
        assert_eq!(kind.ops(), &[PauliOp::X, PauliOp::Z, PauliOp::Y]);
        assert_eq!(kind.to_string(), "xzy");
    }

    #[test]
    fn test_parse_rejects_unknown_letter() {
        assert!(matches!(
            TermKind::parse("xq"),
            Err(OpsError::InvalidTermKind(k)) if k == "xq"
        ));
        assert!(TermKind::parse("").is_err());
    }

    #[test]
    fn test_uniform_spec() {
        let spec = TermSpec::uniform(PauliOp::X, 0.5, 3);
        assert_eq!(spec.couplings.len(), 3);
        assert_eq!(spec.couplings[2], Coupling::single(0.5, 2));
    }
}
