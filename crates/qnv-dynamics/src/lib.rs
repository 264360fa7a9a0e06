//! `qnv-dynamics`: driven evolution of dipolar spin clusters.
//!
//! Turns declarative pulse sequences into propagators and runs them on a
//! state vector under one of four scheduling policies, measuring
//! magnetization after every dipolar window and checkpointing the
//! trajectory as it grows.
//!
//! # Pipeline
//!
//! ```text
//! BuildingBlock ──► SequenceCompiler ──► CompiledBlock ──► EvolutionEngine ──► Trajectory
//!                        ▲                                      │
//!                   DriveParams                          CheckpointStore
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use qnv_dynamics::{BuildingBlock, DriveParams, DriveProgram, EvolutionEngine, RunOptions};
//! use qnv_ops::PauliOp;
//! use qnv_store::MemoryStore;
//! use qnv_system::NvSystem;
//!
//! let system = NvSystem::with_defaults(4).unwrap();
//! let block = BuildingBlock::from_raw(&[("dd", 0.2), ("x", 0.5)], 1).unwrap();
//! let engine = EvolutionEngine::new(&system, vec![block], DriveParams::new(1.5)).unwrap();
//!
//! let psi = system.initial_state(PauliOp::Z).unwrap();
//! let obs = system.magnetization(&[PauliOp::Z]).unwrap();
//! let mut store = MemoryStore::new();
//! let traj = engine
//!     .evolve(&psi, &DriveProgram::Periodic { n_steps: 3 }, &obs, &RunOptions::default(), Some(&mut store))
//!     .unwrap();
//! assert_eq!(traj.len(), 4);
//! ```

pub mod compiler;
pub mod config;
pub mod drive;
pub mod engine;
pub mod error;
pub mod measurement;
pub mod rng;
pub mod schedule;
pub mod sequence;

pub use compiler::{CompiledBlock, CompiledElement, PropagatorSlot, SequenceCompiler};
pub use config::RunConfig;
pub use drive::{AcDrive, Detuning, DriveParams, Modulation};
pub use engine::{EvolutionEngine, RunOptions, StepReport};
pub use error::{ConfigError, DynamicsError, DynamicsResult};
pub use measurement::{MeasurementBuffer, Trajectory};
pub use rng::SeedScope;
pub use schedule::DriveProgram;
pub use sequence::{BuildingBlock, ElementKind, SequenceElement};
