//! Parameters of a spin system.

use serde::{Deserialize, Serialize};

use crate::geometry::FieldDirection;

/// Everything needed to rebuild an [`NvSystem`](crate::NvSystem)
/// deterministically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// External field direction.
    #[serde(default = "default_direction")]
    pub field_direction: FieldDirection,

    /// Number of spins.
    pub n_sites: usize,

    /// Minimum pairwise distance.
    #[serde(default = "default_min_dist")]
    pub min_dist: f64,

    /// Maximum distance to the nearest earlier spin.
    #[serde(default = "default_max_dist")]
    pub max_dist: f64,

    /// Sampling seed.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Strength of the single-site field relative to the energy scale.
    #[serde(default = "default_scaling_factor")]
    pub scaling_factor: f64,

    /// Time step of the energy-scale decay experiment.
    #[serde(default = "default_decay_dt")]
    pub decay_dt: f64,

    /// Number of steps of the energy-scale decay experiment.
    #[serde(default = "default_decay_steps")]
    pub decay_steps: usize,
}

fn default_direction() -> FieldDirection {
    FieldDirection::Z
}

fn default_min_dist() -> f64 {
    0.9
}

fn default_max_dist() -> f64 {
    1.1
}

fn default_seed() -> u64 {
    1
}

fn default_scaling_factor() -> f64 {
    0.1
}

fn default_decay_dt() -> f64 {
    crate::energy::DEFAULT_DT
}

fn default_decay_steps() -> usize {
    crate::energy::DEFAULT_STEPS
}

impl SystemConfig {
    /// Default parameters for `n_sites` spins.
    pub fn with_sites(n_sites: usize) -> Self {
        Self {
            field_direction: default_direction(),
            n_sites,
            min_dist: default_min_dist(),
            max_dist: default_max_dist(),
            seed: default_seed(),
            scaling_factor: default_scaling_factor(),
            decay_dt: default_decay_dt(),
            decay_steps: default_decay_steps(),
        }
    }
}
