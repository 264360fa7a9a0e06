//! Error types for the ops crate.

use thiserror::Error;

/// Errors produced by operator construction, propagation and quadrature.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OpsError {
    /// A coupling references a site that does not exist in the basis.
    #[error("coupling references site {site} but the basis only has {n_sites} sites")]
    SiteOutOfRange {
        /// The offending site index.
        site: usize,
        /// Number of sites in the basis.
        n_sites: usize,
    },

    /// A term kind string contains something other than x, y or z.
    #[error("term kind '{0}' not understood: expected a word over 'x', 'y', 'z'")]
    InvalidTermKind(String),

    /// The number of sites in a coupling does not match the term kind.
    #[error("term kind '{kind}' acts on {expected} sites, coupling lists {got}")]
    ArityMismatch {
        /// The term kind as written.
        kind: String,
        /// Number of sites the kind acts on.
        expected: usize,
        /// Number of sites in the coupling.
        got: usize,
    },

    /// The same site appears twice in one coupling.
    #[error("site {0} appears more than once in a coupling")]
    RepeatedSite(usize),

    /// Basis too large to represent as a dense state vector.
    #[error("basis with {0} sites exceeds the supported maximum of {max}", max = crate::basis::MAX_SITES)]
    TooManySites(usize),

    /// Two operands live in different Hilbert spaces.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        got: usize,
    },

    /// Propagator workspace is too short.
    #[error("workspace holds {got} elements, propagation needs at least {needed}")]
    WorkspaceTooSmall {
        /// Required number of elements.
        needed: usize,
        /// Provided number of elements.
        got: usize,
    },

    /// A numerical integration failed.
    #[error("quadrature over [{a}, {b}] failed: {reason}")]
    Quadrature {
        /// Lower integration bound.
        a: f64,
        /// Upper integration bound.
        b: f64,
        /// What went wrong.
        reason: String,
    },
}

/// Result type for operator algebra.
pub type OpsResult<T> = Result<T, OpsError>;
