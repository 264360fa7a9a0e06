//! Measured quantities.

use num_complex::Complex64;
use qnv_ops::{OpsResult, Operator};

/// A labelled operator whose expectation value is recorded during a run.
#[derive(Debug, Clone)]
pub struct Observable {
    label: String,
    operator: Operator,
}

impl Observable {
    /// Wrap an operator.
    pub fn new(label: impl Into<String>, operator: Operator) -> Self {
        Self {
            label: label.into(),
            operator,
        }
    }

    /// Label used in logs and stored metadata.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The underlying operator.
    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// Hilbert space dimension the observable acts on.
    pub fn dim(&self) -> usize {
        self.operator.basis().dim()
    }

    /// `Re⟨ψ|O|ψ⟩ / n_sites`.
    pub fn per_site(&self, state: &[Complex64]) -> OpsResult<f64> {
        let n = self.operator.basis().n_sites().max(1) as f64;
        Ok(self.operator.expectation(state)?.re / n)
    }
}
