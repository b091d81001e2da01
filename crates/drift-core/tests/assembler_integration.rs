// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Right-Hand-Side Integration Tests
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! End-to-end evaluation of the assembler: conservation, communication
//! order, call-history independence, noise bookkeeping, failure reporting
//! and restarts.

use drift_core::checkpoint::Checkpoint;
use drift_core::halo::HaloExchange;
use drift_core::variables::FieldRole;
use drift_core::{Derivatives, EvolvedVariableSet, NoiseState, RhsAssembler, StartMode};
use drift_types::config::{DriftConfig, NonConvergencePolicy};
use drift_types::error::{DriftError, DriftResult};
use drift_types::field::Field3D;
use drift_types::metric::Metric;
use std::cell::RefCell;
use std::rc::Rc;

fn config() -> DriftConfig {
    DriftConfig::from_json_str(
        r#"{
            "geom": {"Lx": 1.0, "Ly": 4.0},
            "mesh": {"nx": 8, "ny": 6, "nz": 8},
            "cst": {"mu": 50.0, "Lambda": 2.0}
        }"#,
    )
    .unwrap()
}

fn perturbed_state(asm: &RhsAssembler) -> EvolvedVariableSet {
    let m = asm.mesh();
    let cfg = asm.config();
    let ln_n = Field3D::from_fn(m, "lnN", |rho, y, theta| {
        -rho * rho + 0.05 * rho * theta.cos() * (0.3 * y).sin()
    });
    let vort_d = Field3D::from_fn(m, "vortD", |rho, _, theta| 0.2 * rho * (1.0 - rho) * theta.sin());
    let u_i_par = Field3D::from_fn(m, "uIPar", |_, y, _| 0.1 * y);
    let u_e_par = Field3D::from_fn(m, "uEPar", |rho, y, _| 0.1 * y * (1.0 - rho));
    EvolvedVariableSet::from_fields(m, &cfg.boundary, vort_d, ln_n, u_i_par, u_e_par).unwrap()
}

// ── Conservation ─────────────────────────────────────────────────────

#[test]
fn test_diffusive_density_terms_conserve_particles() {
    let mut cfg = config();
    cfg.cst.art_visc_par_ln_n = 1.0;
    cfg.cst.art_visc_perp_ln_n = 1.0;
    let mut asm = RhsAssembler::new(&cfg, StartMode::Fresh).unwrap();
    let state = perturbed_state(&asm);
    let ddt = asm.diffusive(&state, 0.0).unwrap();

    let m = asm.mesh().clone();
    let metric = Metric::cylinder(&m);
    let net = ddt.ln_n.volume_integral(&m, &metric.j);
    let magnitude = ddt.ln_n.map(f64::abs).volume_integral(&m, &metric.j);
    assert!(magnitude > 1e-6, "test field produced no diffusion");
    assert!(net.abs() < 1e-10 * magnitude, "net {net} vs magnitude {magnitude}");
}

/// Net over total E×B advection of ln n for `n = exp(sin ρ cos θ)` with
/// every source, collision and viscosity coefficient at zero.
fn advection_imbalance(nx: usize, nz: usize) -> f64 {
    let cfg = DriftConfig::from_json_str(&format!(
        r#"{{
            "geom": {{"Lx": 1.0, "Ly": 4.0}},
            "mesh": {{"nx": {nx}, "ny": 4, "nz": {nz}}},
            "cst": {{"mu": 1.0}},
            "naulin": {{"maxIt": 200}}
        }}"#
    ))
    .unwrap();
    let mut asm = RhsAssembler::new(&cfg, StartMode::Fresh).unwrap();
    let m = asm.mesh().clone();
    let ln_n = Field3D::from_fn(&m, "lnN", |rho, _, theta| rho.sin() * theta.cos());
    let vort_d = Field3D::from_fn(&m, "vortD", |rho, _, theta| {
        rho * (1.0 - rho) * (theta.sin() + 0.5 * (2.0 * theta).cos())
    });
    let zero = Field3D::zeros(&m, "u");
    let mut state =
        EvolvedVariableSet::from_fields(&m, &cfg.boundary, vort_d, ln_n, zero.clone(), zero).unwrap();
    asm.convective(&mut state, 0.0).unwrap();

    let adv = asm.diagnostics().unwrap().get("lnNAdv").unwrap().clone();
    let metric = Metric::cylinder(&m);
    let net = adv.volume_integral(&m, &metric.j);
    let magnitude = adv.map(f64::abs).volume_integral(&m, &metric.j);
    assert!(magnitude > 1e-8, "no advection on {nx}x{nz}");
    (net / magnitude).abs()
}

#[test]
fn test_convective_density_advection_conserves_particles() {
    let coarse = advection_imbalance(8, 16);
    let fine = advection_imbalance(16, 32);
    assert!(fine < 0.05, "imbalance {fine} on the fine grid");
    assert!(fine < coarse, "imbalance grows under refinement: {coarse} -> {fine}");
}

// ── Potential Solve ──────────────────────────────────────────────────

#[test]
fn test_uniform_density_converges_in_one_iteration() {
    let cfg = config();
    let mut asm = RhsAssembler::new(&cfg, StartMode::Fresh).unwrap();
    let mut state = EvolvedVariableSet::new(asm.mesh(), &cfg.boundary);
    state.vort_d = Field3D::from_fn(asm.mesh(), "vortD", |rho, _, theta| rho * (1.0 - rho) * theta.cos())
        .with_boundary(FieldRole::VortD.boundary(&cfg.boundary));
    asm.rhs(&mut state, 0.0).unwrap();
    assert_eq!(asm.diagnostics().unwrap().naulin_iterations, 1);
}

#[test]
fn test_abort_policy_fails_evaluation() {
    let mut cfg = config();
    cfg.naulin.max_iterations = 1;
    cfg.naulin.rtol = 1e-14;
    cfg.naulin.atol = 1e-14;
    cfg.naulin.non_convergence = NonConvergencePolicy::Abort;
    let mut asm = RhsAssembler::new(&cfg, StartMode::Fresh).unwrap();
    let mut state = perturbed_state(&asm);
    match asm.rhs(&mut state, 0.0) {
        Err(DriftError::NotConverged { iterations, .. }) => assert_eq!(iterations, 1),
        other => panic!("expected NotConverged, got {other:?}"),
    }

    cfg.naulin.non_convergence = NonConvergencePolicy::Warn;
    let mut asm = RhsAssembler::new(&cfg, StartMode::Fresh).unwrap();
    assert!(asm.rhs(&mut state, 0.0).is_ok());
}

// ── Communication Order ──────────────────────────────────────────────

#[derive(Clone, Default)]
struct RecordingExchange {
    calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl HaloExchange for RecordingExchange {
    fn communicate(&self, fields: &mut [&mut Field3D]) -> DriftResult<()> {
        let names = fields.iter().map(|f| f.name().to_string()).collect();
        self.calls.borrow_mut().push(names);
        Ok(())
    }
}

#[test]
fn test_halo_exchange_order_in_convective_pass() {
    let cfg = config();
    let recorder = RecordingExchange::default();
    let mut asm = RhsAssembler::new(&cfg, StartMode::Fresh)
        .unwrap()
        .with_halo(Box::new(recorder.clone()));
    let mut state = perturbed_state(&asm);
    asm.convective(&mut state, 0.0).unwrap();

    let calls = recorder.calls.borrow();
    assert_eq!(calls[0], vec!["lnN".to_string()], "density is exchanged first");
    let all: Vec<String> = ["vortD", "lnN", "uIPar", "uEPar", "phi"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let full = calls
        .iter()
        .position(|c| *c == all)
        .expect("evolved fields and phi exchanged together");
    let last_phi = calls
        .iter()
        .rposition(|c| *c == vec!["phi".to_string()])
        .expect("phi exchanged during the solve");
    assert!(last_phi < full, "full exchange happens after the potential is final");
    assert_eq!(calls.len(), full + 2, "one derived field exchanged afterwards");
}

#[test]
fn test_halo_exchange_order_in_diffusive_pass() {
    let cfg = config();
    let recorder = RecordingExchange::default();
    let mut asm = RhsAssembler::new(&cfg, StartMode::Fresh)
        .unwrap()
        .with_halo(Box::new(recorder.clone()));
    let state = perturbed_state(&asm);
    asm.diffusive(&state, 0.0).unwrap();

    let calls = recorder.calls.borrow();
    assert!(calls.len() >= 3, "recorded only {} exchanges", calls.len());
    assert_eq!(calls[0], vec!["lnN".to_string()], "density is exchanged first");
    let phi_only = vec!["phi".to_string()];
    let solve = &calls[1..calls.len() - 1];
    assert!(!solve.is_empty(), "no potential exchange before the full one");
    assert!(solve.iter().all(|c| *c == phi_only), "unexpected exchange in {solve:?}");
    let all: Vec<String> = ["vortD", "lnN", "uIPar", "uEPar", "phi"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(calls[calls.len() - 1], all, "full exchange closes the preparation");
}

// ── Call History ─────────────────────────────────────────────────────

fn max_difference(a: &Derivatives, b: &Derivatives, asm: &RhsAssembler) -> f64 {
    a.fields()
        .iter()
        .zip(b.fields().iter())
        .map(|(x, y)| (*x - *y).max_abs_interior(asm.mesh()))
        .fold(0.0, f64::max)
}

#[test]
fn test_diffusive_pass_is_independent_of_call_history() {
    let mut cfg = config();
    cfg.cst.art_visc_par_ue_par = 1.0;
    cfg.naulin.rtol = 1e-12;
    cfg.naulin.atol = 1e-14;
    cfg.naulin.max_iterations = 500;

    let mut fresh = RhsAssembler::new(&cfg, StartMode::Fresh).unwrap();
    let state = perturbed_state(&fresh);
    let alone = fresh.diffusive(&state, 0.0).unwrap();

    let mut warm = RhsAssembler::new(&cfg, StartMode::Fresh).unwrap();
    let mut warm_state = state.clone();
    warm.convective(&mut warm_state, 0.0).unwrap();
    let after = warm.diffusive(&warm_state, 0.0).unwrap();

    let diff = max_difference(&alone, &after, &fresh);
    assert!(diff < 1e-6, "diffusive pass changed by {diff} after a convective pass");
    assert!(fresh.potential().phi().max_abs_interior(fresh.mesh()) > 0.0, "potential was not solved");
}

// ── Noise ────────────────────────────────────────────────────────────

fn noisy_config() -> DriftConfig {
    let mut cfg = config();
    cfg.switches.include_noise = true;
    cfg
}

#[test]
fn test_noise_is_added_once() {
    let cfg = noisy_config();
    let mut asm = RhsAssembler::new(&cfg, StartMode::Fresh).unwrap();
    let mut state = EvolvedVariableSet::new(asm.mesh(), &cfg.boundary);
    assert_eq!(asm.noise_state(), NoiseState::Uninitialized);

    asm.rhs(&mut state, 0.0).unwrap();
    assert_eq!(asm.noise_state(), NoiseState::Applied);
    let after_first = state.ln_n.clone();
    assert!(after_first.max_abs_interior(asm.mesh()) > 0.0);

    asm.rhs(&mut state, 0.1).unwrap();
    assert_eq!(state.ln_n, after_first);
}

#[test]
fn test_restart_does_not_add_noise_unless_forced() {
    let cfg = noisy_config();
    let start = StartMode::Restart {
        noise_state: NoiseState::Uninitialized,
    };
    let mut asm = RhsAssembler::new(&cfg, start).unwrap();
    let mut state = EvolvedVariableSet::new(asm.mesh(), &cfg.boundary);
    asm.rhs(&mut state, 0.0).unwrap();
    assert_eq!(state.ln_n.max_abs_interior(asm.mesh()), 0.0);

    let mut forced = noisy_config();
    forced.switches.force_add_noise = true;
    let mut asm = RhsAssembler::new(&forced, start).unwrap();
    asm.rhs(&mut state, 0.0).unwrap();
    assert!(state.ln_n.max_abs_interior(asm.mesh()) > 0.0);
    assert_eq!(asm.noise_state(), NoiseState::Applied);
}

// ── Failure Reporting ────────────────────────────────────────────────

#[test]
fn test_nan_in_state_is_reported() {
    let cfg = config();
    let mut asm = RhsAssembler::new(&cfg, StartMode::Fresh).unwrap();
    let mut state = perturbed_state(&asm);
    let (i, j) = (asm.mesh().x_first() + 2, asm.mesh().y_first() + 1);
    state.u_i_par.set(i, j, 3, f64::NAN);
    match asm.rhs(&mut state, 0.0) {
        Err(DriftError::NonFinite { field, .. }) => assert!(field.starts_with("ddt(")),
        other => panic!("expected NonFinite, got {other:?}"),
    }
}

// ── Restart ──────────────────────────────────────────────────────────

#[test]
fn test_restart_from_checkpoint_reproduces_rhs() {
    let cfg = noisy_config();
    let mut asm = RhsAssembler::new(&cfg, StartMode::Fresh).unwrap();
    let mut state = perturbed_state(&asm);
    asm.rhs(&mut state, 0.0).unwrap();

    let path = std::env::temp_dir().join(format!("drift_core_restart_{}.npz", std::process::id()));
    Checkpoint::capture(0.5, &state, &asm).write(&path).unwrap();
    let cp = Checkpoint::read(&path, asm.mesh(), &cfg.boundary).unwrap();
    std::fs::remove_file(&path).ok();

    let mut resumed = RhsAssembler::new(&cfg, cp.start_mode()).unwrap();
    resumed.set_potential(cp.phi.clone());
    let mut resumed_state = cp.state.clone();

    let expected = asm.rhs(&mut state, 0.5).unwrap();
    let got = resumed.rhs(&mut resumed_state, cp.time).unwrap();
    assert_eq!(resumed_state, state, "no noise on restart");
    assert_eq!(got, expected);
}
