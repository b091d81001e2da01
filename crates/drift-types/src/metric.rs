// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Metric
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Clebsch metric of a straight magnetised cylinder.
//!
//! Coordinates are x = ρ, y along the field, z = θ. The metric depends on
//! ρ only, so every component is a radial profile indexed like the x
//! storage of a field (ghosts included).

use crate::error::{DriftError, DriftResult};
use crate::mesh::Mesh3D;
use ndarray::Array1;

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Jacobian J.
    pub j: Array1<f64>,
    /// Contravariant g^xx.
    pub g11: Array1<f64>,
    /// Contravariant g^yy.
    pub g22: Array1<f64>,
    /// Contravariant g^zz.
    pub g33: Array1<f64>,
    /// Covariant g_xx.
    pub g_11: Array1<f64>,
    /// Covariant g_yy.
    pub g_22: Array1<f64>,
    /// Covariant g_zz.
    pub g_33: Array1<f64>,
}

impl Metric {
    /// J = ρ, g^xx = 1, g^zz = 1/ρ².
    ///
    /// Inside the axis ghosts ρ is negative, so J changes sign there and the
    /// face product `J·g^xx` vanishes exactly on the axis.
    pub fn cylinder(mesh: &Mesh3D) -> Self {
        let rho = &mesh.rho;
        let ones = Array1::ones(rho.len());
        Metric {
            j: rho.clone(),
            g11: ones.clone(),
            g22: ones.clone(),
            g33: rho.mapv(|r| 1.0 / (r * r)),
            g_11: ones.clone(),
            g_22: ones,
            g_33: rho.mapv(|r| r * r),
        }
    }

    /// Metric from externally supplied radial profiles of J, g^xx and g^zz.
    pub fn from_profiles(
        mesh: &Mesh3D,
        j: Array1<f64>,
        g11: Array1<f64>,
        g33: Array1<f64>,
    ) -> DriftResult<Self> {
        let sx = mesh.shape().0;
        for (name, profile) in [("J", &j), ("g11", &g11), ("g33", &g33)] {
            if profile.len() != sx {
                return Err(DriftError::PhysicsViolation(format!(
                    "metric profile {name} has length {}, expected {sx}",
                    profile.len()
                )));
            }
            if profile.iter().any(|v| !v.is_finite()) {
                return Err(DriftError::PhysicsViolation(format!(
                    "metric profile {name} contains non-finite values"
                )));
            }
        }
        for i in mesh.xs() {
            if j[i] <= 0.0 || g11[i] <= 0.0 || g33[i] <= 0.0 {
                return Err(DriftError::PhysicsViolation(format!(
                    "metric must be positive in the interior: J={}, g11={}, g33={} at x={i}",
                    j[i], g11[i], g33[i]
                )));
            }
        }
        let ones = Array1::ones(sx);
        Ok(Metric {
            g_11: g11.mapv(|v| 1.0 / v),
            g_33: g33.mapv(|v| 1.0 / v),
            g22: ones.clone(),
            g_22: ones,
            j,
            g11,
            g33,
        })
    }

    /// `J·g^xx` on the face between storage cells `i` and `i + 1`.
    pub fn jg11_face(&self, i: usize) -> f64 {
        0.5 * (self.j[i] * self.g11[i] + self.j[i + 1] * self.g11[i + 1])
    }
}
