//! Dipolar-coupled spins around a central defect.

use std::f64::consts::FRAC_PI_4;

use num_complex::Complex64;
use qnv_ops::{
    Coupling, Operator, OperatorBuilder, PauliOp, Propagator, SpinBasis, TermKind, TermSpec,
};
use tracing::info;

use crate::config::SystemConfig;
use crate::energy::estimate_energy_scale;
use crate::error::SystemResult;
use crate::fields::single_site_fields;
use crate::geometry::{SpinGraph, sample_spin_graph};
use crate::observable::Observable;
use crate::spectrum::{Spectrum, diagonalize};

/// A sampled spin graph together with its dimensionless Hamiltonian.
///
/// `H_dd = (Σ −c·(XX + YY) + 2c·ZZ + Σ h_s·Z_s) / J`, with `J` the energy
/// scale extracted from the decay of the interaction part alone.
#[derive(Debug, Clone)]
pub struct NvSystem {
    config: SystemConfig,
    graph: SpinGraph,
    basis: SpinBasis,
    field: Vec<f64>,
    energy_scale: f64,
    hamiltonian: Operator,
}

impl NvSystem {
    /// Sample the graph and assemble the Hamiltonian.
    pub fn new(config: SystemConfig) -> SystemResult<Self> {
        let graph = sample_spin_graph(
            config.field_direction,
            config.min_dist,
            config.max_dist,
            config.n_sites,
            config.seed,
        )?;
        let basis = SpinBasis::new(config.n_sites)?;
        let interactions = Operator::build(basis, &interaction_terms(&graph))?;
        let energy_scale =
            estimate_energy_scale(basis, &interactions, config.decay_dt, config.decay_steps)?;

        let field = single_site_fields(
            graph.positions(),
            config.field_direction,
            energy_scale,
            config.scaling_factor,
        );
        let hamiltonian = interactions
            .add(&Operator::build(basis, &[TermSpec::per_site(PauliOp::Z, &field)])?)?
            .scale(1.0 / energy_scale);

        info!(
            n_sites = config.n_sites,
            seed = config.seed,
            energy_scale,
            "assembled spin system"
        );
        Ok(Self {
            config,
            graph,
            basis,
            field,
            energy_scale,
            hamiltonian,
        })
    }

    /// Default geometry (`z` field, distances 0.9–1.1, seed 1, scaling 0.1).
    pub fn with_defaults(n_sites: usize) -> SystemResult<Self> {
        Self::new(SystemConfig::with_sites(n_sites))
    }

    /// Parameters the system was built from.
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// The sampled graph.
    pub fn graph(&self) -> &SpinGraph {
        &self.graph
    }

    /// Number of spins.
    pub fn n_sites(&self) -> usize {
        self.basis.n_sites()
    }

    /// Hilbert space.
    pub fn basis(&self) -> SpinBasis {
        self.basis
    }

    /// Characteristic coupling `J`.
    pub fn energy_scale(&self) -> f64 {
        self.energy_scale
    }

    /// Single-site z field, before division by `J`.
    pub fn single_site_field(&self) -> &[f64] {
        &self.field
    }

    /// Dimensionless Hamiltonian `H_dd`.
    pub fn hamiltonian(&self) -> &Operator {
        &self.hamiltonian
    }

    /// Eigenvalues and eigenvectors of `H_dd`, energies ascending.
    ///
    /// Densifies the Hamiltonian, so only chains of up to
    /// [`MAX_DENSE_SITES`](crate::spectrum::MAX_DENSE_SITES) spins are accepted.
    pub fn spectrum(&self) -> SystemResult<Spectrum> {
        diagonalize(&self.hamiltonian)
    }

    /// Product state with every spin polarized along `axis`.
    pub fn initial_state(&self, axis: PauliOp) -> SystemResult<Vec<Complex64>> {
        let mut psi = self.basis.polarized_up();
        let rotation = match axis {
            PauliOp::Z => return Ok(psi),
            // exp(+iπ/4·ΣX) takes ↑ to +y
            PauliOp::Y => Propagator::new(
                OperatorBuilder.total_spin(self.basis, PauliOp::X)?,
                Complex64::new(0.0, FRAC_PI_4),
            ),
            // exp(−iπ/4·ΣY) takes ↑ to +x
            PauliOp::X => Propagator::new(
                OperatorBuilder.total_spin(self.basis, PauliOp::Y)?,
                Complex64::new(0.0, -FRAC_PI_4),
            ),
        };
        let mut work = self.basis.workspace();
        rotation.apply(&mut psi, &mut work)?;
        Ok(psi)
    }

    /// Total magnetization observables `Σ_j σ^axis_j`, one per axis.
    pub fn magnetization(&self, axes: &[PauliOp]) -> SystemResult<Vec<Observable>> {
        axes.iter()
            .map(|&axis| {
                Ok(Observable::new(
                    format!("m{axis}"),
                    OperatorBuilder.total_spin(self.basis, axis)?,
                ))
            })
            .collect()
    }
}

/// XX, YY and ZZ coupling terms of a graph.
pub fn interaction_terms(graph: &SpinGraph) -> Vec<TermSpec> {
    let xy: Vec<Coupling> = graph
        .xy_couplings()
        .iter()
        .map(|p| Coupling::pair(p.coeff, p.i, p.j))
        .collect();
    let zz: Vec<Coupling> = graph
        .z_couplings()
        .iter()
        .map(|p| Coupling::pair(p.coeff, p.i, p.j))
        .collect();
    vec![
        TermSpec::new(TermKind::double(PauliOp::X), xy.clone()),
        TermSpec::new(TermKind::double(PauliOp::Y), xy),
        TermSpec::new(TermKind::double(PauliOp::Z), zz),
    ]
}
