// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Central Stencils
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Second-order central finite-difference stencils of derivative order 1–4.
//!
//! | order | weights                  | scale      |
//! |-------|--------------------------|------------|
//! | 1     | −1, 0, 1                 | 1/(2h)     |
//! | 2     | 1, −2, 1                 | 1/h²       |
//! | 3     | −1, 2, 0, −2, 1          | 1/(2h³)    |
//! | 4     | 1, −4, 6, −4, 1          | 1/h⁴       |

use drift_types::error::{DriftError, DriftResult};

const FIRST: [f64; 3] = [-0.5, 0.0, 0.5];
const SECOND: [f64; 3] = [1.0, -2.0, 1.0];
const THIRD: [f64; 5] = [-0.5, 1.0, 0.0, -1.0, 0.5];
const FOURTH: [f64; 5] = [1.0, -4.0, 6.0, -4.0, 1.0];

/// Central stencil for one derivative order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralStencil {
    order: usize,
    weights: &'static [f64],
}

impl CentralStencil {
    pub fn new(order: usize) -> DriftResult<Self> {
        let weights: &'static [f64] = match order {
            1 => &FIRST,
            2 => &SECOND,
            3 => &THIRD,
            4 => &FOURTH,
            _ => {
                return Err(DriftError::ConfigError(format!(
                    "no central stencil for derivative order {order}"
                )))
            }
        };
        Ok(CentralStencil { order, weights })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Points needed on each side of the centre.
    pub fn half_width(&self) -> usize {
        self.weights.len() / 2
    }

    /// Weights from offset `−half_width` to `+half_width`.
    pub fn weights(&self) -> &'static [f64] {
        self.weights
    }

    /// Derivative at offset 0 given a sampler for signed offsets.
    #[inline]
    pub fn apply(&self, h: f64, sample: impl Fn(isize) -> f64) -> f64 {
        let hw = self.half_width() as isize;
        let mut acc = 0.0;
        for (n, w) in self.weights.iter().enumerate() {
            if *w != 0.0 {
                acc += w * sample(n as isize - hw);
            }
        }
        acc / h.powi(self.order as i32)
    }
}

/// Half-width of the central stencil for `order`, without building it.
pub fn half_width(order: usize) -> usize {
    if order <= 2 {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(x: f64) -> f64 {
        // 2 + 3x − x² + 0.5x³ + 0.25x⁴
        2.0 + 3.0 * x - x * x + 0.5 * x.powi(3) + 0.25 * x.powi(4)
    }

    #[test]
    fn test_first_and_second_exact_for_quadratic() {
        let h = 0.1;
        let x0 = 0.7;
        let q = |x: f64| 1.0 + 2.0 * x - 3.0 * x * x;
        let d1 = CentralStencil::new(1).unwrap().apply(h, |o| q(x0 + o as f64 * h));
        let d2 = CentralStencil::new(2).unwrap().apply(h, |o| q(x0 + o as f64 * h));
        assert!((d1 - (2.0 - 6.0 * x0)).abs() < 1e-12);
        assert!((d2 + 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_third_derivative_exact_for_quartic() {
        let h = 0.05;
        let x0 = 0.3;
        let d3 = CentralStencil::new(3).unwrap().apply(h, |o| poly(x0 + o as f64 * h));
        // f''' = 3 + 6x; quartic term contributes 6x exactly, h² error term is
        // proportional to f⁽⁵⁾ = 0
        let exact = 3.0 + 6.0 * x0;
        assert!((d3 - exact).abs() < 1e-6, "d3={d3}, exact={exact}");
    }

    #[test]
    fn test_fourth_derivative_of_quartic_is_constant() {
        let h = 0.05;
        let d4 = CentralStencil::new(4).unwrap().apply(h, |o| poly(0.4 + o as f64 * h));
        assert!((d4 - 6.0).abs() < 1e-4, "d4={d4}");
    }

    #[test]
    fn test_half_widths() {
        for order in 1..=4 {
            let s = CentralStencil::new(order).unwrap();
            assert_eq!(s.half_width(), half_width(order));
            let sum: f64 = s.weights().iter().sum();
            assert!(sum.abs() < 1e-15, "weights of order {order} must annihilate constants");
        }
        assert!(CentralStencil::new(5).is_err());
        assert!(CentralStencil::new(0).is_err());
    }
}
