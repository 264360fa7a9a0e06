//! Scoped, reproducible randomness.
//!
//! Each thread owns a process generator for draws that do not care about
//! reproducibility. A [`SeedScope`] swaps it for a generator seeded from a
//! run's seed and swaps the previous one back when dropped, on every exit
//! path. Runs therefore see identical numbers for identical seeds no matter
//! what else drew from the process generator before.

use std::cell::RefCell;
use std::marker::PhantomData;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

thread_local! {
    static PROCESS_RNG: RefCell<StdRng> = RefCell::new(StdRng::from_entropy());
}

/// Run `f` with this thread's current generator.
pub fn with_rng<R>(f: impl FnOnce(&mut StdRng) -> R) -> R {
    PROCESS_RNG.with(|rng| f(&mut rng.borrow_mut()))
}

/// Temporarily reseeds the thread's generator.
///
/// ```rust
/// use qnv_dynamics::rng::{SeedScope, with_rng};
/// use rand::Rng;
///
/// let a: f64 = {
///     let _scope = SeedScope::enter(7);
///     with_rng(|r| r.r#gen())
/// };
/// let b: f64 = {
///     let _scope = SeedScope::enter(7);
///     with_rng(|r| r.r#gen())
/// };
/// assert_eq!(a, b);
/// ```
#[must_use = "the seed is only in effect while the scope is alive"]
pub struct SeedScope {
    saved: Option<StdRng>,
    seed: u64,
    // The saved state belongs to this thread's generator.
    _not_send: PhantomData<*const ()>,
}

impl SeedScope {
    /// Snapshot the current generator and install one seeded from `seed`.
    pub fn enter(seed: u64) -> Self {
        let saved = PROCESS_RNG.with(|rng| rng.replace(StdRng::seed_from_u64(seed)));
        trace!(seed, "entered seed scope");
        Self {
            saved: Some(saved),
            seed,
            _not_send: PhantomData,
        }
    }

    /// Seed in effect.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// `n` numbers uniform in `[low, high)`.
    pub fn uniform(&mut self, low: f64, high: f64, n: usize) -> Vec<f64> {
        let dist = Uniform::new(low, high);
        with_rng(|rng| dist.sample_iter(rng).take(n).collect())
    }

    /// `n` integers uniform in `[0, upper)`.
    pub fn indices(&mut self, upper: usize, n: usize) -> Vec<usize> {
        with_rng(|rng| (0..n).map(|_| rng.gen_range(0..upper)).collect())
    }
}

impl Drop for SeedScope {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            PROCESS_RNG.with(|rng| rng.replace(saved));
            trace!(seed = self.seed, "left seed scope");
        }
    }
}

/// `quota` duration perturbations, uniform in `[-1, 1)`.
pub fn noise_draws(seed: u64, quota: usize) -> Vec<f64> {
    SeedScope::enter(seed).uniform(-1.0, 1.0, quota)
}

/// `n_steps` block indices uniform in `[0, n_blocks)`.
///
/// Returns an empty schedule when there are no blocks.
pub fn block_draws(seed: u64, n_steps: usize, n_blocks: usize) -> Vec<usize> {
    if n_blocks == 0 {
        return Vec::new();
    }
    SeedScope::enter(seed).indices(n_blocks, n_steps)
}
