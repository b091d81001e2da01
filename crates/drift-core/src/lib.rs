//! Right-hand side of the four-field drift-turbulence model in a cylinder.
//!
//! Bottom-up: differential operators and boundary policies, the azimuthal
//! filter, the Naulin potential iteration, the typestate preparation
//! pipeline and the assembler that produces `ddt(vortD, lnN, uIPar, uEPar)`.
//! Checkpoints and output datasets persist the state as NPZ archives.

pub mod assembler;
pub mod boundary;
pub mod checkpoint;
pub mod domain;
pub mod filter;
pub mod halo;
pub mod naulin;
pub mod noise;
pub mod operator_set;
pub mod operators;
pub mod pipeline;
pub mod source;
pub mod variables;

pub use assembler::{RhsAssembler, TermDiagnostics};
pub use noise::{NoiseState, StartMode};
pub use variables::{Derivatives, EvolvedVariableSet};
