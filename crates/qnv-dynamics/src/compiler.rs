//! Compilation of building blocks into propagators.
//!
//! For a dipolar element of duration `d` starting at block-local time `t0`
//! the generator is
//!
//!   H = d·H_dd + d·Σ δ_s Z_s + (∫_{t0}^{t0+d} f(t) dt)·Σ Z_s
//!
//! and for a kick about `a` it is `d·Ω·Σ σ^a_s + d·Σ δ_s Z_s`. Each element
//! is applied as `exp(−i·H)`.
//!
//! With noise configured, dipolar elements are left [`PropagatorSlot::Deferred`]
//! and rebuilt at every application by [`SequenceCompiler::build_noisy`].

use std::sync::Arc;

use qnv_ops::{Operator, PauliOp, Propagator, SpinBasis, TermSpec};
use tracing::trace;

use crate::drive::DriveParams;
use crate::error::{DynamicsError, DynamicsResult};
use crate::sequence::{BuildingBlock, ElementKind};

/// Propagator storage for a compiled element.
#[derive(Debug, Clone)]
pub enum PropagatorSlot {
    /// Built once, reused on every application.
    Precomputed(Arc<Propagator>),
    /// Rebuilt with a perturbed duration before every application.
    Deferred,
}

impl PropagatorSlot {
    /// Whether the slot is rebuilt per application.
    pub fn is_deferred(&self) -> bool {
        matches!(self, PropagatorSlot::Deferred)
    }
}

/// An element together with its propagator slot.
#[derive(Debug, Clone)]
pub struct CompiledElement {
    /// Element kind.
    pub kind: ElementKind,
    /// Nominal duration.
    pub duration: f64,
    /// Propagator.
    pub slot: PropagatorSlot,
}

/// A building block ready for application.
#[derive(Debug, Clone)]
pub struct CompiledBlock {
    elements: Vec<CompiledElement>,
    repetitions: usize,
}

impl CompiledBlock {
    /// Compiled elements.
    pub fn elements(&self) -> &[CompiledElement] {
        &self.elements
    }

    /// Repetition count.
    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Measurements taken per use of the block.
    pub fn data_points(&self) -> usize {
        self.elements.iter().filter(|e| e.kind.is_dipolar()).count() * self.repetitions
    }

    /// Elements applied per use of the block.
    pub fn sequence_elements(&self) -> usize {
        self.elements.len() * self.repetitions
    }
}

/// Turns building blocks into propagators for one Hamiltonian and drive.
#[derive(Debug, Clone)]
pub struct SequenceCompiler {
    basis: SpinBasis,
    hamiltonian: Operator,
    drive: DriveParams,
}

impl SequenceCompiler {
    /// Validate the drive against the Hamiltonian's basis.
    pub fn new(hamiltonian: Operator, drive: DriveParams) -> DynamicsResult<Self> {
        let basis = hamiltonian.basis();
        drive.validate(basis.n_sites())?;
        Ok(Self {
            basis,
            hamiltonian,
            drive,
        })
    }

    /// Hilbert space.
    pub fn basis(&self) -> SpinBasis {
        self.basis
    }

    /// Drive parameters.
    pub fn drive(&self) -> &DriveParams {
        &self.drive
    }

    /// Compile every block, tagging failures with the block index.
    pub fn compile(&self, blocks: &[BuildingBlock]) -> DynamicsResult<Vec<CompiledBlock>> {
        blocks
            .iter()
            .enumerate()
            .map(|(b, block)| self.compile_block(block).map_err(|e| e.in_block(b)))
            .collect()
    }

    /// Compile one block. The AC integration window starts at 0 for every
    /// block.
    pub fn compile_block(&self, block: &BuildingBlock) -> DynamicsResult<CompiledBlock> {
        let deferred = self.drive.noise.is_some();
        let mut current_time = 0.0;
        let mut elements = Vec::with_capacity(block.elements().len());

        for element in block.elements() {
            let d = element.duration;
            let slot = match element.kind {
                ElementKind::Dipolar if deferred => PropagatorSlot::Deferred,
                ElementKind::Dipolar => PropagatorSlot::Precomputed(Arc::new(
                    Propagator::unitary(self.dipolar_generator(current_time, d)?),
                )),
                ElementKind::Kick(axis) => PropagatorSlot::Precomputed(Arc::new(
                    Propagator::unitary(self.kick_generator(axis, d)?),
                )),
            };
            elements.push(CompiledElement {
                kind: element.kind,
                duration: d,
                slot,
            });
            current_time += d;
        }

        trace!(
            elements = elements.len(),
            repetitions = block.repetitions(),
            deferred,
            "compiled block"
        );
        Ok(CompiledBlock {
            elements,
            repetitions: block.repetitions(),
        })
    }

    /// Rebuild a dipolar propagator with duration
    /// `nominal · (1 + noise · draw)`; the AC term is integrated over
    /// `[current_time, current_time + actual]`.
    pub fn build_noisy(
        &self,
        current_time: f64,
        nominal: f64,
        draw: f64,
    ) -> DynamicsResult<Propagator> {
        let noise = self.drive.noise.unwrap_or(0.0);
        let actual = nominal * (1.0 + noise * draw);
        if !actual.is_finite() {
            return Err(DynamicsError::InvalidParameter {
                name: "noise",
                reason: format!("perturbed duration is not finite ({nominal} × (1 + {noise}·{draw}))"),
            });
        }
        Ok(Propagator::unitary(self.dipolar_generator(current_time, actual)?))
    }

    /// Generator of a dipolar window `[start, start + duration]`.
    pub fn dipolar_generator(&self, start: f64, duration: f64) -> DynamicsResult<Operator> {
        let mut h = self.hamiltonian.scale(duration);
        if let Some(detuning) = &self.drive.detuning {
            h.add_assign(&self.z_field(&detuning.coefficients(self.n_sites(), duration))?)?;
        }
        if let Some(ac) = &self.drive.ac {
            let coupling = ac.integrate(start, start + duration)?;
            h.add_assign(&self.z_field(&vec![coupling; self.n_sites()])?)?;
        }
        Ok(h)
    }

    /// Generator of a kick about `axis` lasting `duration`.
    pub fn kick_generator(&self, axis: PauliOp, duration: f64) -> DynamicsResult<Operator> {
        let amplitude = duration * self.drive.rabi_freq;
        let mut terms = vec![TermSpec::uniform(axis, amplitude, self.n_sites())];
        if let Some(detuning) = &self.drive.detuning {
            terms.push(TermSpec::per_site(
                PauliOp::Z,
                &detuning.coefficients(self.n_sites(), duration),
            ));
        }
        Ok(Operator::build(self.basis, &terms)?)
    }

    fn z_field(&self, coeffs: &[f64]) -> DynamicsResult<Operator> {
        Ok(Operator::build(
            self.basis,
            &[TermSpec::per_site(PauliOp::Z, coeffs)],
        )?)
    }

    fn n_sites(&self) -> usize {
        self.basis.n_sites()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::{AcDrive, Detuning};
    use num_complex::Complex64;

    fn compiler(drive: DriveParams) -> SequenceCompiler {
        let basis = SpinBasis::new(2).unwrap();
        SequenceCompiler::new(Operator::zero(basis), drive).unwrap()
    }

    #[test]
    fn test_noise_defers_only_dipolar() {
        let c = compiler(DriveParams::new(1.0).with_noise(0.1));
        let block = BuildingBlock::from_raw(&[("dd", 0.2), ("x", 0.5)], 2).unwrap();
        let compiled = c.compile_block(&block).unwrap();
        assert!(compiled.elements()[0].slot.is_deferred());
        assert!(!compiled.elements()[1].slot.is_deferred());
        assert_eq!(compiled.data_points(), 2);
    }

    #[test]
    fn test_kick_is_rotation() {
        // Ω·d = π/2 about x takes ↑ to ↓ on every spin.
        let c = compiler(DriveParams::new(std::f64::consts::FRAC_PI_2));
        let block = BuildingBlock::from_raw(&[("x", 1.0)], 1).unwrap();
        let compiled = c.compile_block(&block).unwrap();
        let PropagatorSlot::Precomputed(p) = &compiled.elements()[0].slot else {
            panic!("kick must be precomputed");
        };
        let basis = c.basis();
        let mut psi = basis.polarized_up();
        let mut work = basis.workspace();
        p.apply(&mut psi, &mut work).unwrap();
        assert!((psi[0].norm() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_ac_window_restarts_per_block() {
        let c = compiler(DriveParams::new(0.0).with_ac(AcDrive::new("t", |t| t)));
        let h0 = c.dipolar_generator(0.0, 1.0).unwrap();
        let h1 = c.dipolar_generator(1.0, 1.0).unwrap();
        // ∫_0^1 t = 1/2, ∫_1^2 t = 3/2, applied as Σ Z on the all-up state.
        let up = c.basis().polarized_up();
        assert!((h0.expectation(&up).unwrap() - Complex64::new(1.0, 0.0)).norm() < 1e-9);
        assert!((h1.expectation(&up).unwrap() - Complex64::new(3.0, 0.0)).norm() < 1e-9);
    }

    fn coupled_compiler(drive: DriveParams) -> SequenceCompiler {
        use qnv_ops::{Coupling, TermKind};
        let basis = SpinBasis::new(2).unwrap();
        let hdd = Operator::build(
            basis,
            &[
                TermSpec::new(TermKind::double(PauliOp::X), vec![Coupling::pair(0.7, 0, 1)]),
                TermSpec::new(TermKind::double(PauliOp::Z), vec![Coupling::pair(-0.3, 0, 1)]),
            ],
        )
        .unwrap();
        SequenceCompiler::new(hdd, drive).unwrap()
    }

    #[test]
    fn test_noisy_rebuild_stretches_every_term() {
        let c = coupled_compiler(
            DriveParams::new(1.0)
                .with_detuning(Detuning::PerSite(vec![0.2, -0.5]))
                .with_ac(AcDrive::cosine(1.5, 3.0))
                .with_noise(0.1),
        );
        let (t0, d) = (0.4, 0.25);

        let stretched = c.build_noisy(t0, d, 1.0).unwrap();
        assert_eq!(stretched.operator(), &c.dipolar_generator(t0, 1.1 * d).unwrap());
        assert_ne!(stretched.operator(), &c.dipolar_generator(t0, d).unwrap());

        let shrunk = c.build_noisy(t0, d, -1.0).unwrap();
        assert_eq!(shrunk.operator(), &c.dipolar_generator(t0, 0.9 * d).unwrap());

        // ⟨↑↑|H|↑↑⟩ = actual·(J_zz + Σδ) + 2·∫_{t0}^{t0+actual} f
        let actual = 1.1 * d;
        let ac = 0.5 * ((3.0 * (t0 + actual)).sin() - (3.0 * t0).sin());
        let expected = actual * (-0.3 + 0.2 - 0.5) + 2.0 * ac;
        let up = c.basis().polarized_up();
        let got = stretched.operator().expectation(&up).unwrap();
        assert!((got - Complex64::new(expected, 0.0)).norm() < 1e-9, "{got}");
    }

    #[test]
    fn test_noisy_rebuild_without_draw_is_nominal() {
        let c = coupled_compiler(
            DriveParams::new(1.0)
                .with_ac(AcDrive::sine(0.8, 5.0))
                .with_noise(0.3),
        );
        let p = c.build_noisy(1.2, 0.35, 0.0).unwrap();
        assert_eq!(p.operator(), &c.dipolar_generator(1.2, 0.35).unwrap());
    }

    #[test]
    fn test_resonant_ac_cancels_in_generator() {
        // Four whole periods of the drive fit inside the window.
        let w = 8.0 * std::f64::consts::PI / 0.2;
        let with_ac = coupled_compiler(DriveParams::new(0.0).with_ac(AcDrive::cosine(1.0, w)));
        let bare = coupled_compiler(DriveParams::new(0.0));
        let up = with_ac.basis().polarized_up();
        let a = with_ac.dipolar_generator(0.0, 0.2).unwrap().expectation(&up).unwrap();
        let b = bare.dipolar_generator(0.0, 0.2).unwrap().expectation(&up).unwrap();
        assert!((a - b).norm() < 1e-9, "{a} vs {b}");
    }

    #[test]
    fn test_detuning_length_fails_before_compiling() {
        let basis = SpinBasis::new(3).unwrap();
        let drive = DriveParams::new(1.0).with_detuning(Detuning::PerSite(vec![0.1, 0.2]));
        assert!(matches!(
            SequenceCompiler::new(Operator::zero(basis), drive),
            Err(DynamicsError::DetuningLength { expected: 3, got: 2 })
        ));
    }
}
