// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Property-Based Tests (proptest) for drift-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for drift-math using proptest.
//!
//! Covers: complex Thomas solver, Lagrange extrapolation exactness,
//! azimuthal FFT roundtrip, stencil consistency, Laplace inversion.

use drift_math::extrapolate::{extrapolate, lagrange_weights};
use drift_math::fft::AzimuthalFft;
use drift_math::laplace::CylinderLaplaceInverter;
use drift_math::stencil::CentralStencil;
use drift_math::tridiag::thomas_solve_complex;
use drift_types::field::Field3D;
use drift_types::mesh::Mesh3D;
use drift_types::metric::Metric;
use num_complex::Complex64;
use proptest::prelude::*;

// ── Thomas Solver Properties ─────────────────────────────────────────

proptest! {
    /// For any diagonally dominant tridiagonal system, x = thomas_solve(a,b,c,d)
    /// should satisfy Ax = d within floating-point tolerance.
    #[test]
    fn thomas_solve_ax_eq_d(n in 3usize..30, off in 0.05f64..0.45, phase in 0.0f64..3.0) {
        let a: Vec<f64> = (0..n).map(|i| if i > 0 { -off } else { 0.0 }).collect();
        let b = vec![1.0; n];
        let c: Vec<f64> = (0..n).map(|i| if i < n - 1 { -off } else { 0.0 }).collect();
        let d: Vec<Complex64> = (0..n)
            .map(|i| Complex64::new((i as f64 + phase).sin(), (i as f64).cos()))
            .collect();

        let x = thomas_solve_complex(&a, &b, &c, &d).unwrap();

        for i in 0..n {
            let mut ax_i = x[i] * b[i];
            if i > 0 { ax_i += x[i - 1] * a[i]; }
            if i < n - 1 { ax_i += x[i + 1] * c[i]; }
            prop_assert!((ax_i - d[i]).norm() < 1e-10,
                "Ax[{}] = {}, d[{}] = {}", i, ax_i, i, d[i]);
        }
    }
}

// ── Extrapolation Properties ─────────────────────────────────────────

proptest! {
    /// Integer polynomials of degree ≤ order are reproduced exactly.
    #[test]
    fn extrapolation_reproduces_polynomials(
        c0 in -20i64..20,
        c1 in -20i64..20,
        c2 in -20i64..20,
        distance in 1usize..3,
    ) {
        let p = |s: i64| (c0 + c1 * s + c2 * s * s) as f64;
        let interior: Vec<f64> = (0..3).map(p).collect();
        let ghost = extrapolate(&interior, 2, distance).unwrap();
        prop_assert_eq!(ghost, p(-(distance as i64)));
    }

    /// Weights sum to one (constants are preserved).
    #[test]
    fn extrapolation_weights_partition_unity(order in 1usize..6, distance in 1usize..4) {
        let w = lagrange_weights(order, distance).unwrap();
        prop_assert_eq!(w.len(), order + 1);
        let sum: f64 = w.iter().sum();
        prop_assert_eq!(sum, 1.0);
    }
}

// ── FFT Properties ───────────────────────────────────────────────────

proptest! {
    /// inverse(forward(x)) == x for any line length.
    #[test]
    fn fft_roundtrip(half in 2usize..40, seed in 0.0f64..10.0) {
        let n = 2 * half;
        let fft = AzimuthalFft::new(n);
        let line: Vec<f64> = (0..n).map(|k| (seed * k as f64).sin() + 0.1 * k as f64).collect();
        let back = fft.inverse(&fft.forward(&line));
        for (a, b) in line.iter().zip(back.iter()) {
            prop_assert!((a - b).abs() < 1e-10);
        }
    }
}

// ── Stencil Properties ───────────────────────────────────────────────

proptest! {
    /// First-order central difference is exact for quadratics.
    #[test]
    fn first_derivative_exact_for_quadratic(
        a in -5.0f64..5.0,
        b in -5.0f64..5.0,
        x0 in -1.0f64..1.0,
        h in 0.01f64..0.2,
    ) {
        let s = CentralStencil::new(1).unwrap();
        let d = s.apply(h, |o| a * (x0 + o as f64 * h).powi(2) + b * (x0 + o as f64 * h));
        prop_assert!((d - (2.0 * a * x0 + b)).abs() < 1e-9);
    }
}

// ── Laplace Inversion Properties ─────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// apply(invert(r)) == r for smooth forcing.
    #[test]
    fn laplace_inversion_is_exact_inverse(
        half_nz in 4usize..10,
        nx in 6usize..20,
        amp in 0.1f64..3.0,
        m in 0usize..3,
    ) {
        let mesh = Mesh3D::new(nx, 1, 2 * half_nz, 1.0, 1.0, 2, 1).unwrap();
        let inv = CylinderLaplaceInverter::new(&mesh, &Metric::cylinder(&mesh)).unwrap();
        let rhs = Field3D::from_fn(&mesh, "rhs", |rho, _, theta| {
            amp * (1.0 - rho) * (m as f64 * theta).cos() + 0.5
        });
        let phi = inv.invert(&rhs).unwrap();
        let back = inv.apply(&phi).unwrap();
        let scale = rhs.max_abs_interior(&mesh);
        for i in mesh.xs() {
            for k in 0..mesh.nz {
                let j = mesh.y_first();
                prop_assert!((back.get(i, j, k) - rhs.get(i, j, k)).abs() < 1e-9 * scale);
            }
        }
    }
}
