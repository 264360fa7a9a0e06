//! `qnv-ops`: operator algebra for chains of spin-1/2 particles.
//!
//! Builds sparse operators from Pauli coupling-term lists, applies matrix
//! exponentials of them to state vectors in place, and integrates
//! continuous drive terms:
//!
//! - [`Operator`]: `Σ c · P` with addition, scaling, state application
//! - [`Propagator`]: the action of `exp(a·H)` on a state
//! - [`quad::integrate`]: adaptive Gauss–Kronrod quadrature
//!
//! # Quick start
//!
//! ```rust
//! use qnv_ops::{Operator, Propagator, SpinBasis, TermSpec, PauliOp};
//!
//! let basis = SpinBasis::new(2).unwrap();
//! // π/2 pulse about y on every spin: exp(-i·π/4·ΣY)
//! let h = Operator::build(basis, &[TermSpec::uniform(PauliOp::Y, std::f64::consts::FRAC_PI_4, 2)]).unwrap();
//! let pulse = Propagator::unitary(h);
//!
//! let mut psi = basis.polarized_up();
//! let mut work = basis.workspace();
//! pulse.apply(&mut psi, &mut work).unwrap();
//! ```

pub mod basis;
pub mod error;
pub mod operator;
pub mod pauli;
pub mod propagator;
pub mod quad;

pub use basis::SpinBasis;
pub use error::{OpsError, OpsResult};
pub use operator::{Operator, OperatorBuilder};
pub use pauli::{Coupling, PauliOp, TermKind, TermSpec};
pub use propagator::Propagator;
