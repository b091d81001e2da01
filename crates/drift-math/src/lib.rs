//! Numerical primitives for the SCPN drift-turbulence core.

pub mod extrapolate;
pub mod fft;
pub mod laplace;
pub mod stencil;
pub mod tridiag;
