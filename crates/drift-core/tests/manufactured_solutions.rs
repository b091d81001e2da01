// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Manufactured-Solution Convergence Tests
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Operators checked against closed-form results on three successively
//! finer grids, asserting the observed order of accuracy. Fields are
//! filled analytically including the ghost layers, so the comparison is
//! restricted to the annulus 0.25 ≤ ρ ≤ 0.75 where no boundary closure
//! enters the stencils.

use drift_core::boundary::BoundaryPolicy;
use drift_core::operator_set::{create_operator_set, ExbInputs, OperatorSet};
use drift_core::operators::DifferentialOperators;
use drift_types::config::{GhostPolicy, OperatorKind};
use drift_types::field::Field3D;
use drift_types::mesh::Mesh3D;
use drift_types::metric::Metric;
use std::sync::Arc;

fn operators(nx: usize, nz: usize) -> (DifferentialOperators, BoundaryPolicy) {
    let mesh = Mesh3D::new(nx, 4, nz, 1.0, 1.0, 2, 2).unwrap();
    let metric = Arc::new(Metric::cylinder(&mesh));
    let policy = BoundaryPolicy::new(&mesh, 2).unwrap();
    (
        DifferentialOperators::new(mesh, metric, GhostPolicy::Strict).unwrap(),
        policy,
    )
}

/// Largest deviation from `exact` over the annulus.
fn annulus_error(mesh: &Mesh3D, got: &Field3D, exact: impl Fn(f64, f64) -> f64) -> f64 {
    let j = mesh.y_first();
    let mut err: f64 = 0.0;
    for i in mesh.xs() {
        let rho = mesh.rho[i];
        if !(0.25..=0.75).contains(&rho) {
            continue;
        }
        for k in 0..mesh.nz {
            err = err.max((got.get(i, j, k) - exact(rho, mesh.theta[k])).abs());
        }
    }
    err
}

// ── ∇·(f∇⊥g) ─────────────────────────────────────────────────────────

fn div_f_grad_g_error(nx: usize, nz: usize) -> f64 {
    let (ops, _) = operators(nx, nz);
    let m = ops.mesh().clone();
    let f = Field3D::from_fn(&m, "f", |rho, _, _| 1.0 + rho * rho);
    let g = Field3D::from_fn(&m, "g", |rho, _, theta| rho.powi(3) * theta.cos());
    let out = ops.div_f_grad_perp_g(&f, &g);
    annulus_error(&m, &out, |rho, theta| {
        theta.cos() * (8.0 * rho + 14.0 * rho.powi(3))
    })
}

/// Observed orders `log2(e_coarse / e_fine)` between successive grids.
fn observed_orders(errors: &[f64]) -> Vec<f64> {
    errors.windows(2).map(|w| (w[0] / w[1]).log2()).collect()
}

#[test]
fn test_div_f_grad_perp_g_is_second_order() {
    let errors: Vec<f64> = [16, 32, 64].iter().map(|&n| div_f_grad_g_error(n, n)).collect();
    assert!(errors[2] < 0.05, "fine error {}", errors[2]);
    for order in observed_orders(&errors) {
        assert!(order > 1.7, "observed order {order} from errors {errors:?}");
    }
}

// ── E×B advection of the generalised vorticity ───────────────────────
//
// φ = ½ρ² sin 2θ and n = exp(aρ cos θ), i.e. φ = xy and n = e^{ax} in
// Cartesian form. Then ω_D = ∇·(n∇⊥φ) = a ρ sin θ n and
// ∇·(u_E·∇(n∇⊥φ)) = a²ρ² sin θ cos θ n.

const A: f64 = 1.0;

fn exact_density(rho: f64, theta: f64) -> f64 {
    (A * rho * theta.cos()).exp()
}

fn exact_full(rho: f64, theta: f64) -> f64 {
    A * A * rho * rho * theta.sin() * theta.cos() * exact_density(rho, theta)
}

fn exb_error(kind: OperatorKind, nx: usize, nz: usize) -> f64 {
    let (ops, policy) = operators(nx, nz);
    let m = ops.mesh().clone();
    let phi = Field3D::from_fn(&m, "phi", |rho, _, theta| 0.5 * rho * rho * (2.0 * theta).sin());
    let n = Field3D::from_fn(&m, "n", |rho, _, theta| exact_density(rho, theta));
    let vort_d = Field3D::from_fn(&m, "vortD", |rho, _, theta| {
        A * rho * theta.sin() * exact_density(rho, theta)
    });
    let set = create_operator_set(kind, ops);
    let adv = set
        .div_exb_advection(&ExbInputs {
            n: &n,
            phi: &phi,
            vort_d: &vort_d,
            boundary: &policy,
        })
        .unwrap();
    match kind {
        // Drops the kinetic-energy bracket ½[|∇⊥φ|², n] = a ρ sin θ n.
        OperatorKind::OnlyBracket => annulus_error(&m, &adv.total, |rho, theta| {
            exact_full(rho, theta) - A * rho * theta.sin() * exact_density(rho, theta)
        }),
        _ => annulus_error(&m, &adv.total, exact_full),
    }
}

#[test]
fn test_exb_advection_operator_sets_are_second_order() {
    for kind in [
        OperatorKind::DirectDifference,
        OperatorKind::OnlyBracket,
        OperatorKind::TwoBrackets,
    ] {
        let errors: Vec<f64> = [(16, 32), (32, 64), (64, 128)]
            .iter()
            .map(|&(nx, nz)| exb_error(kind, nx, nz))
            .collect();
        assert!(errors[2] < 0.1, "{kind:?}: fine error {}", errors[2]);
        for order in observed_orders(&errors) {
            assert!(order > 1.7, "{kind:?}: observed order {order} from errors {errors:?}");
        }
    }
}

#[test]
fn test_two_brackets_and_direct_difference_agree() {
    let (ops, policy) = operators(32, 64);
    let m = ops.mesh().clone();
    let phi = Field3D::from_fn(&m, "phi", |rho, _, theta| 0.5 * rho * rho * (2.0 * theta).sin());
    let n = Field3D::from_fn(&m, "n", |rho, _, theta| exact_density(rho, theta));
    let vort_d = Field3D::from_fn(&m, "vortD", |rho, _, theta| {
        A * rho * theta.sin() * exact_density(rho, theta)
    });
    let inputs = ExbInputs {
        n: &n,
        phi: &phi,
        vort_d: &vort_d,
        boundary: &policy,
    };
    let two = create_operator_set(OperatorKind::TwoBrackets, ops.clone())
        .div_exb_advection(&inputs)
        .unwrap();
    let direct = create_operator_set(OperatorKind::DirectDifference, ops)
        .div_exb_advection(&inputs)
        .unwrap();
    let diff = annulus_error(&m, &(&two.total - &direct.total), |_, _| 0.0);
    assert!(diff < 0.1, "discretisations differ by {diff}");
}
