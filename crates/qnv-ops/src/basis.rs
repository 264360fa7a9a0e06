//! Computational basis of a chain of spin-1/2 particles.
//!
//! Basis index bit `j` encodes site `j`; a set bit is spin up, the +1
//! eigenstate of σᶻ.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{OpsError, OpsResult};

/// Largest number of sites a dense state vector is allocated for.
pub const MAX_SITES: usize = 24;

/// Hilbert space of `n_sites` spin-1/2 particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpinBasis {
    n_sites: usize,
}

impl SpinBasis {
    /// Create the basis for `n_sites` spins.
    pub fn new(n_sites: usize) -> OpsResult<Self> {
        if n_sites > MAX_SITES {
            return Err(OpsError::TooManySites(n_sites));
        }
        Ok(Self { n_sites })
    }

    /// Number of sites.
    pub fn n_sites(&self) -> usize {
        self.n_sites
    }

    /// Hilbert space dimension, `2^n_sites`.
    pub fn dim(&self) -> usize {
        1 << self.n_sites
    }

    /// Index of the state with every spin up.
    pub fn all_up_index(&self) -> usize {
        self.dim() - 1
    }

    /// The fully polarized state |↑↑…↑⟩.
    pub fn polarized_up(&self) -> Vec<Complex64> {
        let mut state = vec![Complex64::new(0.0, 0.0); self.dim()];
        state[self.all_up_index()] = Complex64::new(1.0, 0.0);
        state
    }

    /// A zeroed workspace sized for propagating states of this basis.
    pub fn workspace(&self) -> Vec<Complex64> {
        vec![Complex64::new(0.0, 0.0); 2 * self.dim()]
    }

    /// Check that `len` matches the basis dimension.
    pub fn check_len(&self, len: usize) -> OpsResult<()> {
        if len == self.dim() {
            Ok(())
        } else {
            Err(OpsError::DimensionMismatch {
                expected: self.dim(),
                got: len,
            })
        }
    }
}
