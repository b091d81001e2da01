// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Tridiag
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Thomas algorithm for complex tridiagonal systems.
//!
//! Used per azimuthal Fourier mode by the cylindrical Laplace inversion,
//! where the diagonal is real but the forcing is complex.

use drift_types::error::{DriftError, DriftResult};
use num_complex::Complex64;

/// Smallest pivot magnitude accepted before the system is declared singular.
const PIVOT_FLOOR: f64 = 1e-300;

/// Solve tridiagonal system Ax = d using the Thomas algorithm.
///
/// - `a`: sub-diagonal \[n\] (a\[0\] unused)
/// - `b`: main diagonal \[n\]
/// - `c`: super-diagonal \[n\] (c\[n-1\] unused)
/// - `d`: right-hand side \[n\]
///
/// Returns the solution vector, or `LinAlg` when a pivot vanishes.
pub fn thomas_solve_complex(
    a: &[f64],
    b: &[f64],
    c: &[f64],
    d: &[Complex64],
) -> DriftResult<Vec<Complex64>> {
    let n = d.len();
    if n == 0 {
        return Err(DriftError::LinAlg("tridiagonal system is empty".to_string()));
    }
    if a.len() != n || b.len() != n || c.len() != n {
        return Err(DriftError::LinAlg(format!(
            "tridiagonal band lengths a={}, b={}, c={} do not match rhs {n}",
            a.len(),
            b.len(),
            c.len()
        )));
    }

    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![Complex64::new(0.0, 0.0); n];

    // Forward sweep
    if b[0].abs() < PIVOT_FLOOR {
        return Err(DriftError::LinAlg("zero pivot at row 0".to_string()));
    }
    c_prime[0] = c[0] / b[0];
    d_prime[0] = d[0] / b[0];

    for i in 1..n {
        let den = b[i] - a[i] * c_prime[i - 1];
        if den.abs() < PIVOT_FLOOR {
            return Err(DriftError::LinAlg(format!("zero pivot at row {i}")));
        }
        if i < n - 1 {
            c_prime[i] = c[i] / den;
        }
        d_prime[i] = (d[i] - d_prime[i - 1] * a[i]) / den;
    }

    // Back substitution
    let mut x = vec![Complex64::new(0.0, 0.0); n];
    x[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d_prime[i] - x[i + 1] * c_prime[i];
    }

    Ok(x)
}
