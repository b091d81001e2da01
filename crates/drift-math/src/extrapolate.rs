// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Ghost Extrapolation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Lagrange extrapolation weights on a uniform grid.
//!
//! The polynomial of degree `order` through the interior samples at
//! offsets 0, 1, …, order (counted inwards from the boundary) is evaluated
//! at the ghost position −distance. All weights are integers, computed in
//! integer arithmetic, so polynomials of degree ≤ order with dyadic values
//! are reproduced bit for bit.

use drift_types::error::{DriftError, DriftResult};

/// Weights `w_k`, k = 0..=order, such that
/// `ghost(−distance) = Σ w_k · interior(k)`.
pub fn lagrange_weights(order: usize, distance: usize) -> DriftResult<Vec<f64>> {
    if order == 0 || distance == 0 {
        return Err(DriftError::ConfigError(format!(
            "extrapolation needs order >= 1 and distance >= 1, got order={order}, distance={distance}"
        )));
    }
    let x = -(distance as i128);
    let nodes: Vec<i128> = (0..=order as i128).collect();
    let mut weights = Vec::with_capacity(nodes.len());
    for &k in &nodes {
        let mut num: i128 = 1;
        let mut den: i128 = 1;
        for &m in &nodes {
            if m != k {
                num *= x - m;
                den *= k - m;
            }
        }
        weights.push((num / den) as f64);
    }
    Ok(weights)
}

/// Extrapolate one ghost value from interior samples ordered inwards.
pub fn extrapolate(interior: &[f64], order: usize, distance: usize) -> DriftResult<f64> {
    let weights = lagrange_weights(order, distance)?;
    if interior.len() < weights.len() {
        return Err(DriftError::PhysicsViolation(format!(
            "order-{order} extrapolation needs {} interior points, got {}",
            weights.len(),
            interior.len()
        )));
    }
    Ok(weights.iter().zip(interior).map(|(w, v)| w * v).sum())
}
