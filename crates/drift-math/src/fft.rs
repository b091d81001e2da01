//! Azimuthal FFT wrappers around rustfft.
//!
//! Convention matches numpy:
//! - Forward FFT: unnormalized
//! - Inverse FFT: normalized by 1/nz

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// Forward/inverse plans for one azimuthal resolution.
#[derive(Clone)]
pub struct AzimuthalFft {
    n: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl fmt::Debug for AzimuthalFft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzimuthalFft").field("n", &self.n).finish()
    }
}

impl AzimuthalFft {
    pub fn new(n: usize) -> Self {
        let mut planner = FftPlanner::new();
        AzimuthalFft {
            n,
            forward: planner.plan_fft_forward(n),
            inverse: planner.plan_fft_inverse(n),
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Forward transform of a real line. Matches `numpy.fft.fft()`.
    pub fn forward(&self, line: &[f64]) -> Vec<Complex64> {
        let mut data: Vec<Complex64> = line.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        self.forward.process(&mut data);
        data
    }

    /// Inverse transform to a real line. Matches `numpy.fft.ifft().real`.
    pub fn inverse(&self, spectrum: &[Complex64]) -> Vec<f64> {
        let norm = 1.0 / self.n as f64;
        let mut data = spectrum.to_vec();
        self.inverse.process(&mut data);
        data.iter().map(|c| c.re * norm).collect()
    }

    /// Azimuthal mode number |m| carried by FFT bin `k`.
    pub fn mode_number(&self, k: usize) -> usize {
        if k <= self.n / 2 {
            k
        } else {
            self.n - k
        }
    }

    /// Eigenvalue of the second-order central d²/dθ² for bin `k`:
    /// `−4 sin²(k·dθ/2) / dθ²`.
    pub fn second_difference_eigenvalue(&self, k: usize, dtheta: f64) -> f64 {
        let half = 0.5 * k as f64 * dtheta;
        -4.0 * half.sin().powi(2) / (dtheta * dtheta)
    }
}
