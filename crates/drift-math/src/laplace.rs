// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Cylindrical Laplace Inversion
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Direct inversion of the perpendicular Laplacian on each y-plane.
//!
//! The discrete operator is the conservative face-flux form
//!
//! ```text
//! L φ_i = [ (J g¹¹)_{i+½} (φ_{i+1} − φ_i) − (J g¹¹)_{i−½} (φ_i − φ_{i−1}) ] / (J_i dx²)
//!       + g³³_i (φ_{k+1} − 2φ_k + φ_{k−1}) / dz²
//! ```
//!
//! closed by the diametric axis continuation `φ(−ρ, θ) = φ(ρ, θ + π)` and a
//! homogeneous Dirichlet value on the outer face. An FFT in θ decouples the
//! azimuthal modes; each mode is a tridiagonal system in ρ.

use crate::fft::AzimuthalFft;
use crate::tridiag::thomas_solve_complex;
use drift_types::error::{DriftError, DriftResult};
use drift_types::field::Field3D;
use drift_types::mesh::Mesh3D;
use drift_types::metric::Metric;
use ndarray::s;
use num_complex::Complex64;

#[derive(Debug, Clone)]
pub struct CylinderLaplaceInverter {
    mesh: Mesh3D,
    lower: Vec<f64>,
    upper: Vec<f64>,
    centre: Vec<f64>,
    g33: Vec<f64>,
    eigen: Vec<f64>,
    fft: AzimuthalFft,
}

impl CylinderLaplaceInverter {
    pub fn new(mesh: &Mesh3D, metric: &Metric) -> DriftResult<Self> {
        if mesh.nz % 2 != 0 {
            return Err(DriftError::ConfigError(format!(
                "diametric axis closure needs an even nz, got {}",
                mesh.nz
            )));
        }
        let dx2 = mesh.dx * mesh.dx;
        let mut lower = Vec::with_capacity(mesh.nx);
        let mut upper = Vec::with_capacity(mesh.nx);
        let mut centre = Vec::with_capacity(mesh.nx);
        let mut g33 = Vec::with_capacity(mesh.nx);
        for i in mesh.xs() {
            let jc = metric.j[i];
            if jc <= 0.0 {
                return Err(DriftError::PhysicsViolation(format!(
                    "non-positive Jacobian {jc} at interior x={i}"
                )));
            }
            let a = metric.jg11_face(i - 1) / (jc * dx2);
            let c = metric.jg11_face(i) / (jc * dx2);
            lower.push(a);
            upper.push(c);
            centre.push(-(a + c));
            g33.push(metric.g33[i]);
        }
        let fft = AzimuthalFft::new(mesh.nz);
        let eigen = (0..mesh.nz)
            .map(|k| fft.second_difference_eigenvalue(k, mesh.dz))
            .collect();
        Ok(CylinderLaplaceInverter {
            mesh: mesh.clone(),
            lower,
            upper,
            centre,
            g33,
            eigen,
            fft,
        })
    }

    pub fn mesh(&self) -> &Mesh3D {
        &self.mesh
    }

    /// Solve `L φ = rhs` on every interior y-plane. Ghosts of the result are zero.
    pub fn invert(&self, rhs: &Field3D) -> DriftResult<Field3D> {
        let mesh = &self.mesh;
        if rhs.dim() != mesh.shape() {
            return Err(DriftError::ShapeMismatch {
                expected: mesh.shape(),
                found: rhs.dim(),
            });
        }
        rhs.ensure_finite(mesh)?;
        let nx = mesh.nx;
        let nz = mesh.nz;
        let mut out = Field3D::zeros(mesh, "phi");
        let mut diag = vec![0.0; nx];
        let mut forcing = vec![Complex64::new(0.0, 0.0); nx];

        for j in mesh.ys() {
            let spectra: Vec<Vec<Complex64>> = mesh
                .xs()
                .map(|i| {
                    let line: Vec<f64> = rhs.data().slice(s![i, j, ..]).to_vec();
                    self.fft.forward(&line)
                })
                .collect();

            let mut solved = vec![vec![Complex64::new(0.0, 0.0); nz]; nx];
            for k in 0..nz {
                let parity = if k % 2 == 0 { 1.0 } else { -1.0 };
                for n in 0..nx {
                    diag[n] = self.centre[n] + self.g33[n] * self.eigen[k];
                    forcing[n] = spectra[n][k];
                }
                diag[0] += self.lower[0] * parity;
                diag[nx - 1] -= self.upper[nx - 1];
                let x = thomas_solve_complex(&self.lower, &diag, &self.upper, &forcing)?;
                for n in 0..nx {
                    solved[n][k] = x[n];
                }
            }

            for (n, i) in mesh.xs().enumerate() {
                let line = self.fft.inverse(&solved[n]);
                out.data_mut()
                    .slice_mut(s![i, j, ..])
                    .assign(&ndarray::ArrayView1::from(&line[..]));
            }
        }
        Ok(out)
    }

    /// Apply the discrete operator with the same axis and outer closures.
    pub fn apply(&self, phi: &Field3D) -> DriftResult<Field3D> {
        let mesh = &self.mesh;
        if phi.dim() != mesh.shape() {
            return Err(DriftError::ShapeMismatch {
                expected: mesh.shape(),
                found: phi.dim(),
            });
        }
        let dz2 = mesh.dz * mesh.dz;
        let mut out = Field3D::zeros(mesh, "laplace_perp");
        for (n, i) in mesh.xs().enumerate() {
            for j in mesh.ys() {
                for k in 0..mesh.nz {
                    let centre = phi.get(i, j, k);
                    let inner = if n == 0 {
                        phi.get(i, j, mesh.opposite_z(k))
                    } else {
                        phi.get(i - 1, j, k)
                    };
                    let outer = if n == mesh.nx - 1 {
                        -centre
                    } else {
                        phi.get(i + 1, j, k)
                    };
                    let zz = phi.get(i, j, mesh.wrap_z(k, 1)) - 2.0 * centre
                        + phi.get(i, j, mesh.wrap_z(k, -1));
                    let value = self.lower[n] * inner
                        + self.centre[n] * centre
                        + self.upper[n] * outer
                        + self.g33[n] * zz / dz2;
                    out.set(i, j, k, value);
                }
            }
        }
        Ok(out)
    }
}
