// -------------------------------------------------------------------------
// SCPN Drift Core -- Right-Hand-Side Benchmark
// Full convective + diffusive evaluation for the three E×B operator sets,
// plus the Naulin-dominated convective pass alone, on a 16x8x32 grid.
// -------------------------------------------------------------------------

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use drift_core::variables::FieldRole;
use drift_core::{EvolvedVariableSet, RhsAssembler, StartMode};
use drift_types::config::{DriftConfig, OperatorKind};
use drift_types::field::Field3D;
use std::hint::black_box;

fn make_config(kind: OperatorKind) -> DriftConfig {
    let mut cfg = DriftConfig::from_json_str(
        r#"{
            "geom": {"Lx": 1.0, "Ly": 8.0},
            "mesh": {"nx": 16, "ny": 8, "nz": 32},
            "cst": {"mu": 100.0, "Lambda": 3.0, "nuEI": 0.5, "nuIN": 0.05,
                    "artViscPerpLnN": 1.0, "artViscPerpVortD": 1.0, "artViscParUEPar": 1.0},
            "src": {"a": 0.5, "bRho": 0.3, "cRho": 0.05, "bZ": 0.5, "cZ": 0.1}
        }"#,
    )
    .expect("valid bench config");
    cfg.operators.kind = kind;
    cfg
}

fn make_state(asm: &RhsAssembler) -> EvolvedVariableSet {
    let m = asm.mesh();
    let cfg = asm.config();
    let mut state = EvolvedVariableSet::new(m, &cfg.boundary);
    state.ln_n = Field3D::from_fn(m, "lnN", |rho, y, theta| {
        -2.0 * rho * rho + 0.02 * rho * (3.0 * theta).cos() * (0.4 * y).sin()
    })
    .with_boundary(FieldRole::LnN.boundary(&cfg.boundary));
    state.vort_d = Field3D::from_fn(m, "vortD", |rho, _, theta| 0.1 * rho * (1.0 - rho) * (2.0 * theta).sin())
        .with_boundary(FieldRole::VortD.boundary(&cfg.boundary));
    state
}

fn bench_rhs_operator_sets(c: &mut Criterion) {
    let mut group = c.benchmark_group("rhs_16x8x32");
    group.sample_size(10);
    for kind in [
        OperatorKind::OnlyBracket,
        OperatorKind::TwoBrackets,
        OperatorKind::DirectDifference,
    ] {
        let cfg = make_config(kind);
        let mut asm = RhsAssembler::new(&cfg, StartMode::Fresh).expect("assembler");
        let state = make_state(&asm);
        group.bench_with_input(BenchmarkId::new("rhs", format!("{kind:?}")), &state, |b, s| {
            b.iter(|| {
                let mut s = s.clone();
                black_box(asm.rhs(&mut s, 0.0).expect("rhs"))
            })
        });
    }
    group.finish();
}

fn bench_convective_only(c: &mut Criterion) {
    let cfg = make_config(OperatorKind::TwoBrackets);
    let mut asm = RhsAssembler::new(&cfg, StartMode::Fresh).expect("assembler");
    let state = make_state(&asm);
    let mut group = c.benchmark_group("convective_16x8x32");
    group.sample_size(10);
    group.bench_function("convective", |b| {
        b.iter(|| {
            let mut s = state.clone();
            black_box(asm.convective(&mut s, 0.0).expect("convective"))
        })
    });
    group.bench_function("diffusive", |b| {
        b.iter(|| black_box(asm.diffusive(&state, 0.0).expect("diffusive")))
    });
    group.finish();
}

criterion_group!(benches, bench_rhs_operator_sets, bench_convective_only);
criterion_main!(benches);
