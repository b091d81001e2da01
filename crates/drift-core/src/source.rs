// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Particle Source and Sheath Damping Profiles
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Static profiles built once at setup.
//!
//! The particle source is a product of two tanh steps:
//!   S(ρ, y) = a · ½(1 − tanh((ρ − b_ρ)/c_ρ)) · ½(1 − tanh((y − b_z)/c_z))

use drift_types::config::{DampingConfig, SourceCoefficients};
use drift_types::field::Field3D;
use drift_types::mesh::Mesh3D;
use ndarray::Array2;

/// Smooth step from 1 (well below `centre`) to 0 (well above it).
pub fn tanh_step(x: f64, centre: f64, width: f64) -> f64 {
    0.5 * (1.0 - ((x - centre) / width).tanh())
}

/// Density source evaluated on the whole storage grid.
pub fn particle_source(mesh: &Mesh3D, coeffs: &SourceCoefficients) -> Field3D {
    if coeffs.a == 0.0 {
        return Field3D::zeros(mesh, "S");
    }
    Field3D::from_fn(mesh, "S", |rho, y, _| {
        coeffs.a * tanh_step(rho, coeffs.b_rho, coeffs.c_rho) * tanh_step(y, coeffs.b_z, coeffs.c_z)
    })
}

/// Radial sheath damping over (x storage, z).
///
/// Without an edge radius the profile is uniform at the configured amplitude.
pub fn damping_profile(mesh: &Mesh3D, config: &DampingConfig) -> Array2<f64> {
    let (sx, _, nz) = mesh.shape();
    Array2::from_shape_fn((sx, nz), |(i, _)| match config.rho_edge {
        Some(edge) => config.amplitude * tanh_step(mesh.rho[i], edge, config.width),
        None => config.amplitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh() -> Mesh3D {
        Mesh3D::new(16, 8, 8, 2.0, 10.0, 2, 2).unwrap()
    }

    #[test]
    fn test_source_zero_when_amplitude_zero() {
        let m = mesh();
        let s = particle_source(&m, &SourceCoefficients::default());
        assert_eq!(s.max_abs_interior(&m), 0.0);
        assert_eq!(s.name(), "S");
    }

    #[test]
    fn test_source_peaks_on_axis_near_lower_end() {
        let m = mesh();
        let coeffs = SourceCoefficients {
            a: 2.0,
            b_rho: 0.5,
            b_z: 3.0,
            c_rho: 0.1,
            c_z: 0.5,
        };
        let s = particle_source(&m, &coeffs);
        let core = s.get(m.x_first(), m.y_first(), 0);
        let edge = s.get(m.x_last(), m.y_first(), 0);
        let far = s.get(m.x_first(), m.y_last(), 0);
        assert!(core > 1.9 && core <= 2.0, "core {core}");
        assert!(edge < 1e-4, "edge {edge}");
        assert!(far < 1e-4, "far {far}");
        // azimuthally symmetric
        for k in 0..m.nz {
            assert_eq!(s.get(5, 4, k), s.get(5, 4, 0));
        }
    }

    #[test]
    fn test_damping_profile_shape_and_values() {
        let m = mesh();
        let uniform = damping_profile(&m, &DampingConfig::default());
        assert_eq!(uniform.dim(), (m.shape().0, m.nz));
        assert!(uniform.iter().all(|&d| d == 1.0));

        let edged = damping_profile(
            &m,
            &DampingConfig {
                amplitude: 1.0,
                rho_edge: Some(1.0),
                width: 0.05,
            },
        );
        assert!(edged[[m.x_first(), 0]] > 0.999);
        assert!(edged[[m.x_last(), 3]] < 1e-3);
    }

    #[test]
    fn test_tanh_step_midpoint() {
        assert!((tanh_step(0.3, 0.3, 0.1) - 0.5).abs() < 1e-15);
    }
}
