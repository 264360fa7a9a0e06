//! Error types for the system crate.

use thiserror::Error;

/// Errors produced while building a spin system.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SystemError {
    /// The external field direction is not one of x, y, z.
    #[error("field direction must be 'x', 'y' or 'z', got '{0}'")]
    InvalidFieldDirection(String),

    /// A geometric or physical parameter violates its contract.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Rejection sampling ran out of budget before all points were placed.
    #[error(
        "box too small: cannot fit all {requested} points with min distance {min_dist:.3} \
         and max distance {max_dist:.3}; only {placed} could be placed after {attempts} rejections"
    )]
    PlacementFailed {
        /// Points requested.
        requested: usize,
        /// Points successfully placed.
        placed: usize,
        /// Minimum pairwise distance.
        min_dist: f64,
        /// Maximum nearest-neighbour distance.
        max_dist: f64,
        /// Rejections counted when sampling stopped.
        attempts: u64,
    },

    /// The decay experiment never approached 1/e, so no scale can be read off.
    #[error(
        "energy scale undetermined: magnetization closest to 1/e at t = 0 \
         (dt = {dt}, steps = {steps}); the graph has no effective coupling"
    )]
    DegenerateEnergyScale {
        /// Time step of the decay experiment.
        dt: f64,
        /// Number of steps simulated.
        steps: usize,
    },

    /// The dense eigensolver did not converge.
    #[error("eigendecomposition failed: {0}")]
    Eigendecomposition(String),

    /// Operator algebra failure.
    #[error("operator error: {0}")]
    Ops(#[from] qnv_ops::OpsError),
}

/// Result type for system construction.
pub type SystemResult<T> = Result<T, SystemError>;
