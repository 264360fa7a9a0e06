//! Error types for drive compilation and evolution.

use thiserror::Error;

/// Result type for dynamics operations.
pub type DynamicsResult<T> = Result<T, DynamicsError>;

/// Errors raised while compiling or running a drive protocol.
///
/// Everything except [`Ops`](DynamicsError::Ops) and
/// [`Store`](DynamicsError::Store) is detected before the first propagator
/// is applied.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DynamicsError {
    /// A sequence element is malformed.
    #[error("element {element}: {reason}")]
    InvalidElement {
        /// Position within the block.
        element: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// Wraps an error with the index of the building block it came from.
    #[error("building block {block}: {source}")]
    InBlock {
        /// Block index.
        block: usize,
        /// Underlying error.
        #[source]
        source: Box<DynamicsError>,
    },

    /// A per-site detuning list does not have one entry per spin.
    #[error("detuning must have one entry per spin: expected {expected}, got {got}")]
    DetuningLength {
        /// Number of spins.
        expected: usize,
        /// Entries supplied.
        got: usize,
    },

    /// A drive or run parameter violates its contract.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A sequential schedule refers to a block that does not exist.
    #[error("sequence position {position} selects block {index}, but only {n_blocks} blocks exist")]
    BlockIndexOutOfRange {
        /// Position in the schedule.
        position: usize,
        /// Requested block.
        index: usize,
        /// Number of blocks.
        n_blocks: usize,
    },

    /// The modulation list is not aligned with the blocks.
    #[error("expected one modulation entry per block ({expected}), got {got}")]
    ModulationCount {
        /// Number of blocks.
        expected: usize,
        /// Entries supplied.
        got: usize,
    },

    /// An observable acts on a different Hilbert space.
    #[error("observable '{label}' has dimension {got}, system dimension is {expected}")]
    ObservableDimension {
        /// Observable label.
        label: String,
        /// System dimension.
        expected: usize,
        /// Observable dimension.
        got: usize,
    },

    /// Initial state length does not match the Hilbert space.
    #[error("initial state has {got} amplitudes, system dimension is {expected}")]
    StateLength {
        /// System dimension.
        expected: usize,
        /// Supplied length.
        got: usize,
    },

    /// A preallocated measurement buffer received more points than it holds.
    #[error("measurement buffer full: capacity {capacity}")]
    BufferOverflow {
        /// Number of time points the buffer holds.
        capacity: usize,
    },

    /// The pre-drawn noise sequence ran out.
    #[error("noise sequence exhausted after {drawn} draws")]
    NoiseExhausted {
        /// Draws consumed so far.
        drawn: usize,
    },

    /// Operator algebra or quadrature failure.
    #[error("operator error: {0}")]
    Ops(#[from] qnv_ops::OpsError),

    /// Checkpoint write failure.
    #[error("checkpoint error: {0}")]
    Store(#[from] qnv_store::StoreError),
}

impl DynamicsError {
    /// Attach the block index to an error.
    pub fn in_block(self, block: usize) -> Self {
        DynamicsError::InBlock {
            block,
            source: Box::new(self),
        }
    }
}

/// Errors loading or validating a [`RunConfig`](crate::RunConfig).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// The file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The YAML could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    /// An environment override could not be parsed.
    #[error("environment variable {name}={value} is not valid: {reason}")]
    Env {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure.
        reason: String,
    },

    /// The configuration is internally inconsistent.
    #[error("validation error: {0}")]
    Validation(String),

    /// Drive or schedule validation failed.
    #[error(transparent)]
    Dynamics(#[from] DynamicsError),
}
