//! Scheduling policies over a fixed list of building blocks.

use crate::drive::Modulation;
use crate::error::{DynamicsError, DynamicsResult};
use crate::rng::block_draws;

/// Default seed for drawing the block order of a random program.
pub const DEFAULT_SEQUENCE_SEED: u64 = 2;

/// How blocks are chosen at every outer iteration.
#[derive(Debug, Clone)]
pub enum DriveProgram {
    /// Every block, in declaration order, `n_steps` times.
    Periodic {
        /// Outer iterations.
        n_steps: usize,
    },
    /// One uniformly drawn block per iteration.
    Random {
        /// Outer iterations.
        n_steps: usize,
        /// Seed of the block draws.
        sequence_seed: u64,
    },
    /// One block per iteration, given explicitly.
    Sequential {
        /// Block index per iteration.
        indices: Vec<usize>,
    },
    /// Like `Periodic`, with selected blocks recompiled every iteration from
    /// modulated durations.
    TimeDependent {
        /// Outer iterations.
        n_steps: usize,
        /// One entry per block; `None` keeps the block unchanged.
        modulations: Vec<Option<Modulation>>,
    },
}

impl DriveProgram {
    /// Random program with the default sequence seed.
    pub fn random(n_steps: usize) -> Self {
        DriveProgram::Random {
            n_steps,
            sequence_seed: DEFAULT_SEQUENCE_SEED,
        }
    }

    /// Number of outer iterations.
    pub fn n_steps(&self) -> usize {
        match self {
            DriveProgram::Periodic { n_steps }
            | DriveProgram::Random { n_steps, .. }
            | DriveProgram::TimeDependent { n_steps, .. } => *n_steps,
            DriveProgram::Sequential { indices } => indices.len(),
        }
    }

    /// Short name for logs and metadata.
    pub fn mode(&self) -> &'static str {
        match self {
            DriveProgram::Periodic { .. } => "periodic",
            DriveProgram::Random { .. } => "random",
            DriveProgram::Sequential { .. } => "sequential",
            DriveProgram::TimeDependent { .. } => "time_dependent",
        }
    }

    /// Whether the number of measurements is known before the run.
    pub fn is_preallocated(&self) -> bool {
        matches!(
            self,
            DriveProgram::Periodic { .. } | DriveProgram::TimeDependent { .. }
        )
    }

    /// Check the program against `n_blocks` blocks.
    pub fn validate(&self, n_blocks: usize) -> DynamicsResult<()> {
        match self {
            DriveProgram::Sequential { indices } => {
                if let Some((position, &index)) =
                    indices.iter().enumerate().find(|&(_, &i)| i >= n_blocks)
                {
                    return Err(DynamicsError::BlockIndexOutOfRange {
                        position,
                        index,
                        n_blocks,
                    });
                }
            }
            DriveProgram::TimeDependent { modulations, .. } => {
                if modulations.len() != n_blocks {
                    return Err(DynamicsError::ModulationCount {
                        expected: n_blocks,
                        got: modulations.len(),
                    });
                }
            }
            DriveProgram::Random { n_steps, .. } => {
                if n_blocks == 0 && *n_steps > 0 {
                    return Err(DynamicsError::InvalidParameter {
                        name: "blocks",
                        reason: "a random program needs at least one block to draw from".into(),
                    });
                }
            }
            DriveProgram::Periodic { .. } => {}
        }
        Ok(())
    }

    /// Block indices applied at each outer iteration, or `None` when every
    /// block is applied every iteration.
    pub(crate) fn block_order(&self, n_blocks: usize) -> Option<Vec<usize>> {
        match self {
            DriveProgram::Periodic { .. } | DriveProgram::TimeDependent { .. } => None,
            DriveProgram::Random {
                n_steps,
                sequence_seed,
            } => Some(block_draws(*sequence_seed, *n_steps, n_blocks)),
            DriveProgram::Sequential { indices } => Some(indices.clone()),
        }
    }
}
