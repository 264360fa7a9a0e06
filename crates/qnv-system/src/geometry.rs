//! Random placement of dipolar-coupled spins.
//!
//! Points are drawn uniformly from a ball of radius [`BOX_HALF_WIDTH`] by
//! rejection. A candidate is accepted when it keeps at least `min_dist` to
//! every placed point and lies within `max_dist` of its nearest placed
//! neighbour, so the cluster stays connected. On acceptance the candidate
//! couples to every earlier point `k` with
//!
//!   c = (3·cos²θ − 1) / r³
//!
//! where θ is the angle between the separation and the external field.
//! The z–z coupling is `2c`, the x–x and y–y couplings are `−c`.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SystemError, SystemResult};

/// Half-width of the sampling box. Never enlarged automatically.
pub const BOX_HALF_WIDTH: f64 = 10.0;

/// Lower bound on the rejection budget for small clusters.
pub const MIN_REJECTION_BUDGET: u64 = 100_000;

/// A point in 3-space.
pub type Position = [f64; 3];

/// Orientation of the external magnetic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldDirection {
    /// Field along x.
    X,
    /// Field along y.
    Y,
    /// Field along z.
    Z,
}

impl FieldDirection {
    /// Unit vector along the field.
    pub fn unit(self) -> Position {
        match self {
            FieldDirection::X => [1.0, 0.0, 0.0],
            FieldDirection::Y => [0.0, 1.0, 0.0],
            FieldDirection::Z => [0.0, 0.0, 1.0],
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldDirection::X => "x",
            FieldDirection::Y => "y",
            FieldDirection::Z => "z",
        }
    }
}

impl FromStr for FieldDirection {
    type Err = SystemError;

    fn from_str(s: &str) -> SystemResult<Self> {
        match s {
            "x" => Ok(FieldDirection::X),
            "y" => Ok(FieldDirection::Y),
            "z" => Ok(FieldDirection::Z),
            other => Err(SystemError::InvalidFieldDirection(other.to_string())),
        }
    }
}

impl fmt::Display for FieldDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coupling coefficient for the ordered pair `(i, j)` with `i < j`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairCoupling {
    /// Coefficient.
    pub coeff: f64,
    /// Earlier site.
    pub i: usize,
    /// Later site.
    pub j: usize,
}

/// A sampled spin configuration and its pairwise couplings.
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinGraph {
    direction: FieldDirection,
    min_dist: f64,
    max_dist: f64,
    seed: u64,
    positions: Vec<Position>,
    xy_couplings: Vec<PairCoupling>,
    z_couplings: Vec<PairCoupling>,
    raw_couplings: Vec<f64>,
}

impl SpinGraph {
    /// Field direction used for the couplings.
    pub fn direction(&self) -> FieldDirection {
        self.direction
    }

    /// Minimum pairwise distance the graph was sampled with.
    pub fn min_dist(&self) -> f64 {
        self.min_dist
    }

    /// Maximum nearest-neighbour distance the graph was sampled with.
    pub fn max_dist(&self) -> f64 {
        self.max_dist
    }

    /// Sampling seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of spins.
    pub fn n_sites(&self) -> usize {
        self.positions.len()
    }

    /// Positions in placement order.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// x–x and y–y coupling list (`−c`).
    pub fn xy_couplings(&self) -> &[PairCoupling] {
        &self.xy_couplings
    }

    /// z–z coupling list (`2c`).
    pub fn z_couplings(&self) -> &[PairCoupling] {
        &self.z_couplings
    }

    /// Bare coefficients `c`, in generation order.
    pub fn raw_couplings(&self) -> &[f64] {
        &self.raw_couplings
    }
}

/// Place `n_sites` spins and derive their couplings.
///
/// Fails with [`SystemError::PlacementFailed`] once more than
/// `max(n_sites⁵, MIN_REJECTION_BUDGET)` candidates were rejected by the
/// distance constraints. The failure is not retried.
pub fn sample_spin_graph(
    direction: FieldDirection,
    min_dist: f64,
    max_dist: f64,
    n_sites: usize,
    seed: u64,
) -> SystemResult<SpinGraph> {
    validate(min_dist, max_dist, n_sites)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let field = direction.unit();
    let budget = (n_sites as u64).saturating_pow(5).max(MIN_REJECTION_BUDGET);

    let mut positions: Vec<Position> = Vec::with_capacity(n_sites);
    let mut xy_couplings = Vec::new();
    let mut z_couplings = Vec::new();
    let mut raw_couplings = Vec::new();
    let mut rejections: u64 = 0;

    while positions.len() < n_sites {
        let candidate: Position = [
            rng.gen_range(-BOX_HALF_WIDTH..BOX_HALF_WIDTH),
            rng.gen_range(-BOX_HALF_WIDTH..BOX_HALF_WIDTH),
            rng.gen_range(-BOX_HALF_WIDTH..BOX_HALF_WIDTH),
        ];
        if norm(candidate) > BOX_HALF_WIDTH {
            continue;
        }

        if !positions.is_empty() {
            let nearest = positions
                .iter()
                .map(|&p| distance(p, candidate))
                .fold(f64::INFINITY, f64::min);
            if nearest < min_dist || nearest > max_dist {
                rejections += 1;
                if rejections > budget {
                    return Err(SystemError::PlacementFailed {
                        requested: n_sites,
                        placed: positions.len(),
                        min_dist,
                        max_dist,
                        attempts: rejections,
                    });
                }
                continue;
            }
        }

        let ell = positions.len();
        for k in (0..ell).rev() {
            let sep = sub(candidate, positions[k]);
            let r = norm(sep);
            let cos_theta = dot(sep, field) / r;
            let c = (3.0 * cos_theta * cos_theta - 1.0) / r.powi(3);
            raw_couplings.push(c);
            z_couplings.push(PairCoupling { coeff: 2.0 * c, i: k, j: ell });
            xy_couplings.push(PairCoupling { coeff: -c, i: k, j: ell });
        }
        positions.push(candidate);
    }

    debug!(n_sites, seed, rejections, "sampled spin graph");
    Ok(SpinGraph {
        direction,
        min_dist,
        max_dist,
        seed,
        positions,
        xy_couplings,
        z_couplings,
        raw_couplings,
    })
}

fn validate(min_dist: f64, max_dist: f64, n_sites: usize) -> SystemResult<()> {
    if !(min_dist.is_finite() && min_dist > 0.0) {
        return Err(SystemError::InvalidParameter {
            name: "min_dist",
            reason: format!("must be a positive number, got {min_dist}"),
        });
    }
    if !(max_dist.is_finite() && max_dist > min_dist) {
        return Err(SystemError::InvalidParameter {
            name: "max_dist",
            reason: format!("must exceed min_dist = {min_dist}, got {max_dist}"),
        });
    }
    if n_sites == 0 {
        return Err(SystemError::InvalidParameter {
            name: "n_sites",
            reason: "at least one spin is required".into(),
        });
    }
    Ok(())
}

pub(crate) fn norm(v: Position) -> f64 {
    dot(v, v).sqrt()
}

pub(crate) fn dot(a: Position, b: Position) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn sub(a: Position, b: Position) -> Position {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Euclidean distance between two points.
pub fn distance(a: Position, b: Position) -> f64 {
    norm(sub(a, b))
}
