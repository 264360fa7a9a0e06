//! `qnv-system`: random dipolar spin clusters.
//!
//! Samples nuclear spin positions around a central defect under distance
//! constraints, derives their dipolar couplings, calibrates the energy scale
//! from a decay experiment and assembles the dimensionless Hamiltonian used
//! by the drive engine.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use qnv_ops::PauliOp;
//! use qnv_system::NvSystem;
//!
//! let system = NvSystem::with_defaults(6).unwrap();
//! let psi = system.initial_state(PauliOp::X).unwrap();
//! let mx = &system.magnetization(&[PauliOp::X]).unwrap()[0];
//! assert!((mx.per_site(&psi).unwrap() - 1.0).abs() < 1e-12);
//! ```

pub mod config;
pub mod energy;
pub mod error;
pub mod fields;
pub mod geometry;
pub mod observable;
pub mod spectrum;
pub mod system;

pub use config::SystemConfig;
pub use energy::estimate_energy_scale;
pub use error::{SystemError, SystemResult};
pub use geometry::{FieldDirection, PairCoupling, Position, SpinGraph, sample_spin_graph};
pub use observable::Observable;
pub use spectrum::{Spectrum, diagonalize};
pub use system::NvSystem;
