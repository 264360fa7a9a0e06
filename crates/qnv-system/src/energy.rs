//! Energy-scale calibration from a free-induction decay.
//!
//! The fully polarized state is tipped into the transverse plane and
//! evolved under the interaction Hamiltonian in steps of `dt`. The time at
//! which the transverse magnetization is closest to `1/e` defines the
//! characteristic coupling:
//!
//!   J = 1 / (index · dt)
//!
//! All user-facing durations are later measured in units of `1/J`.

use std::f64::consts::FRAC_PI_4;

use num_complex::Complex64;
use qnv_ops::{Operator, OperatorBuilder, PauliOp, Propagator, SpinBasis, TermSpec};
use tracing::debug;

use crate::error::{SystemError, SystemResult};

/// Default time step of the decay experiment.
pub const DEFAULT_DT: f64 = 0.0005;
/// Default number of decay steps.
pub const DEFAULT_STEPS: usize = 1000;

/// Transverse magnetization `⟨ΣX⟩/L` at `t = 0, dt, …, steps·dt`.
pub fn transverse_decay(
    basis: SpinBasis,
    hamiltonian: &Operator,
    dt: f64,
    steps: usize,
) -> SystemResult<Vec<f64>> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(SystemError::InvalidParameter {
            name: "dt",
            reason: format!("must be a positive number, got {dt}"),
        });
    }
    let n = basis.n_sites() as f64;

    let tip = Operator::build(
        basis,
        &[TermSpec::uniform(PauliOp::Y, FRAC_PI_4, basis.n_sites())],
    )?;
    let sx = OperatorBuilder.total_spin(basis, PauliOp::X)?;
    let step = Propagator::new(hamiltonian.clone(), Complex64::new(0.0, -dt));

    let mut psi = basis.polarized_up();
    let mut work = basis.workspace();
    Propagator::unitary(tip).apply(&mut psi, &mut work)?;

    let mut curve = Vec::with_capacity(steps + 1);
    curve.push(sx.expectation(&psi)?.re / n);
    for _ in 0..steps {
        step.apply(&mut psi, &mut work)?;
        curve.push(sx.expectation(&psi)?.re / n);
    }
    Ok(curve)
}

/// Estimate the characteristic coupling of `hamiltonian`.
pub fn estimate_energy_scale(
    basis: SpinBasis,
    hamiltonian: &Operator,
    dt: f64,
    steps: usize,
) -> SystemResult<f64> {
    if steps == 0 {
        return Err(SystemError::InvalidParameter {
            name: "steps",
            reason: "the decay experiment needs at least one step".into(),
        });
    }
    let curve = transverse_decay(basis, hamiltonian, dt, steps)?;
    let target = (-1.0f64).exp();
    let index = curve
        .iter()
        .enumerate()
        .map(|(i, m)| (i, (m.abs() - target).abs()))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
        .0;

    if index == 0 {
        return Err(SystemError::DegenerateEnergyScale { dt, steps });
    }
    let scale = 1.0 / (index as f64 * dt);
    debug!(index, scale, "estimated energy scale");
    Ok(scale)
}
