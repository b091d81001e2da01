// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Azimuthal Mode Filter
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Spectral filtering of every (x, y) line along θ.

use drift_math::fft::AzimuthalFft;
use drift_types::config::{FilterConfig, FilterKind};
use drift_types::field::Field3D;
use drift_types::mesh::Mesh3D;
use ndarray::s;
use num_complex::Complex64;

pub trait AzimuthalFilter {
    fn filter(&self, field: &Field3D, mesh: &Mesh3D) -> Field3D;

    fn name(&self) -> &'static str;
}

pub fn create_filter(config: &FilterConfig, mesh: &Mesh3D) -> Box<dyn AzimuthalFilter> {
    match config.kind {
        FilterKind::NoFilter => Box::new(NoFilter),
        FilterKind::LowPass => Box::new(LowPassFilter::new(
            mesh.nz,
            config.resolved_cutoff(mesh.nz),
            config.min_mode,
        )),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilter;

impl AzimuthalFilter for NoFilter {
    fn filter(&self, field: &Field3D, _mesh: &Mesh3D) -> Field3D {
        field.clone()
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Keeps azimuthal modes `min_mode ≤ m ≤ cutoff`, zeroes the rest.
///
/// A line whose discarded content is already at round-off level is passed
/// through untouched, which makes the filter exactly idempotent.
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    cutoff: usize,
    min_mode: usize,
    fft: AzimuthalFft,
}

impl LowPassFilter {
    pub fn new(nz: usize, cutoff: usize, min_mode: usize) -> Self {
        LowPassFilter {
            cutoff,
            min_mode,
            fft: AzimuthalFft::new(nz),
        }
    }

    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    pub fn min_mode(&self) -> usize {
        self.min_mode
    }

    fn keeps(&self, k: usize) -> bool {
        let m = self.fft.mode_number(k);
        m >= self.min_mode && m <= self.cutoff
    }

    /// `None` when the discarded modes are already at round-off level
    /// relative to the largest mode; the line is then returned untouched.
    ///
    /// The skip makes the filter linear only up to round-off: a sum of two
    /// lines may be transformed while one of its terms alone is not.
    fn filter_line(&self, line: &[f64]) -> Option<Vec<f64>> {
        let mut spectrum = self.fft.forward(line);
        let mut largest: f64 = 0.0;
        let mut removed: f64 = 0.0;
        for (k, c) in spectrum.iter().enumerate() {
            let norm = c.norm();
            largest = largest.max(norm);
            if !self.keeps(k) {
                removed = removed.max(norm);
            }
        }
        let floor = 64.0 * f64::EPSILON * self.fft.len() as f64 * largest;
        if removed <= floor {
            return None;
        }
        for (k, c) in spectrum.iter_mut().enumerate() {
            if !self.keeps(k) {
                *c = Complex64::new(0.0, 0.0);
            }
        }
        Some(self.fft.inverse(&spectrum))
    }
}

impl AzimuthalFilter for LowPassFilter {
    fn filter(&self, field: &Field3D, mesh: &Mesh3D) -> Field3D {
        let (sx, sy, _) = mesh.shape();
        let mut out = field.clone();
        for i in 0..sx {
            for j in 0..sy {
                let line = field.data().slice(s![i, j, ..]).to_vec();
                if let Some(filtered) = self.filter_line(&line) {
                    out.data_mut()
                        .slice_mut(s![i, j, ..])
                        .assign(&ndarray::ArrayView1::from(&filtered[..]));
                }
            }
        }
        out
    }

    fn name(&self) -> &'static str {
        "lowPass"
    }
}
