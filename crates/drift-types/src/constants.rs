// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Spitzer parallel resistivity coefficient multiplying ν_ei in the
/// electron-ion friction terms (Braginskii, Z = 1).
pub const SPITZER_RESISTIVITY: f64 = 0.51;

/// Default amplitude of the one-shot azimuthal perturbation on ln(n).
pub const DEFAULT_NOISE_AMPLITUDE: f64 = 1e-3;

/// Default Lagrange extrapolation order for parallel ghost cells.
pub const DEFAULT_EXTRAPOLATION_ORDER: usize = 2;

/// Default ghost width along x and y. Third and fourth derivatives need two.
pub const DEFAULT_GHOST_WIDTH: usize = 2;

/// Fraction of the resolvable azimuthal spectrum retained by default (2/3 rule).
pub const DEALIAS_FRACTION: f64 = 2.0 / 3.0;

/// Normalised Bohm speed imposed on the ion flow at the sheath entrance.
pub const BOHM_ION_VELOCITY: f64 = 1.0;
