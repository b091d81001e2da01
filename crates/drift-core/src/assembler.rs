// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Right-Hand-Side Assembler
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! RhsAssembler — time derivatives of the four-field drift model.
//!
//! Evolves the generalised vorticity `ω_D = ∇·(n∇⊥φ)`, `ln n` and the ion
//! and electron parallel velocities in a straight magnetised cylinder.
//! The right-hand side is split into a convective part (E×B and parallel
//! advection, collisions, sources) and a diffusive part (artificial and
//! resistive diffusion), callable separately by an IMEX integrator or
//! together through [`RhsAssembler::rhs`].

use crate::boundary::BoundaryPolicy;
use crate::filter::{create_filter, AzimuthalFilter};
use crate::halo::{HaloExchange, SerialExchange};
use crate::naulin::{NaulinSolver, PotentialState};
use crate::noise::{NoiseInjection, NoiseState, StartMode};
use crate::operator_set::{create_operator_set, ExbInputs, OperatorSet};
use crate::operators::DifferentialOperators;
use crate::pipeline::{Evaluable, PotentialSolve, SheathParameters, Snapshot};
use crate::source::{damping_profile, particle_source};
use crate::variables::{Derivatives, EvolvedVariableSet, FieldRole};
use drift_math::laplace::CylinderLaplaceInverter;
use drift_types::config::{DriftConfig, OperatorKind, PhysicsConstants};
use drift_types::constants::SPITZER_RESISTIVITY;
use drift_types::error::DriftResult;
use drift_types::field::Field3D;
use drift_types::mesh::Mesh3D;
use drift_types::metric::Metric;
use ndarray::Array2;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Artificial viscosities after grid scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledViscosities {
    pub par_ln_n: f64,
    pub par_u_e_par: f64,
    pub par_u_i_par: f64,
    pub par_vort_d: f64,
    pub perp_ln_n: f64,
    pub perp_u_e_par: f64,
    pub perp_u_i_par: f64,
    pub perp_vort_d: f64,
    pub hyper_vort_d: f64,
}

impl ScaledViscosities {
    /// Parallel coefficients scale with `dy²`, perpendicular with `dx²`
    /// and the azimuthal hyper-viscosity with `dz⁴`.
    pub fn new(cst: &PhysicsConstants, mesh: &Mesh3D) -> Self {
        let par = mesh.dy * mesh.dy;
        let perp = mesh.dx * mesh.dx;
        let hyper = mesh.dz.powi(4);
        ScaledViscosities {
            par_ln_n: cst.art_visc_par_ln_n * par,
            par_u_e_par: cst.art_visc_par_ue_par * par,
            par_u_i_par: cst.art_visc_par_ui_par * par,
            par_vort_d: cst.art_visc_par_vort_d * par,
            perp_ln_n: cst.art_visc_perp_ln_n * perp,
            perp_u_e_par: cst.art_visc_perp_ue_par * perp,
            perp_u_i_par: cst.art_visc_perp_ui_par * perp,
            perp_vort_d: cst.art_visc_perp_vort_d * perp,
            hyper_vort_d: cst.art_hyper_az_vort_d * hyper,
        }
    }
}

/// Individual equation terms kept for output.
#[derive(Debug, Clone, Default)]
pub struct TermDiagnostics {
    pub terms: BTreeMap<String, Field3D>,
    pub ddt: Option<Derivatives>,
    pub naulin_iterations: usize,
}

impl TermDiagnostics {
    pub fn get(&self, name: &str) -> Option<&Field3D> {
        self.terms.get(name)
    }
}

/// Signed contributions to one equation.
struct Terms {
    mesh: Mesh3D,
    equation: &'static str,
    parts: Vec<Field3D>,
}

impl Terms {
    fn new(mesh: &Mesh3D, equation: &'static str) -> Self {
        Terms {
            mesh: mesh.clone(),
            equation,
            parts: Vec::new(),
        }
    }

    fn push(&mut self, name: &str, term: Field3D) {
        self.parts.push(term.named(name));
    }

    fn total(&self) -> Field3D {
        let mut out = Field3D::zeros(&self.mesh, &format!("ddt({})", self.equation));
        for p in &self.parts {
            out += p;
        }
        out
    }
}

pub struct RhsAssembler {
    config: DriftConfig,
    mesh: Mesh3D,
    operators: Box<dyn OperatorSet>,
    filter: Box<dyn AzimuthalFilter>,
    boundary: BoundaryPolicy,
    solver: NaulinSolver,
    halo: Box<dyn HaloExchange>,
    potential: PotentialState,
    noise: NoiseInjection,
    source: Field3D,
    damping: Array2<f64>,
    viscosity: ScaledViscosities,
    resistive: f64,
    diagnostics: Option<TermDiagnostics>,
}

impl RhsAssembler {
    /// Build the assembler for the full mesh described by `config`.
    pub fn new(config: &DriftConfig, start: StartMode) -> DriftResult<Self> {
        let mesh = Mesh3D::from_config(config)?;
        Self::on_mesh(config, mesh, start)
    }

    pub fn from_file(path: &str, start: StartMode) -> DriftResult<Self> {
        let config = DriftConfig::from_file(path)?;
        Self::new(&config, start)
    }

    /// Build on a given (possibly slab-local) mesh.
    pub fn on_mesh(config: &DriftConfig, mesh: Mesh3D, start: StartMode) -> DriftResult<Self> {
        config.validate()?;
        let metric = Arc::new(Metric::cylinder(&mesh));
        let ops = DifferentialOperators::new(mesh.clone(), Arc::clone(&metric), config.operators.ghost_policy)?;
        let operators = create_operator_set(config.operators.kind, ops);
        let filter = create_filter(&config.filter, &mesh);
        let boundary = BoundaryPolicy::new(&mesh, config.boundary.extrapolation_order)?;
        let inverter = CylinderLaplaceInverter::new(&mesh, &metric)?;
        let solver = NaulinSolver::new(config.naulin.clone(), Box::new(inverter));
        let potential = PotentialState::new(&mesh, FieldRole::Phi.boundary(&config.boundary));
        let noise = NoiseInjection::new(&config.switches, &config.noise, start);
        let source = particle_source(&mesh, &config.src);
        let damping = damping_profile(&mesh, &config.boundary.damping);
        let viscosity = ScaledViscosities::new(&config.cst, &mesh);
        let resistive = if config.cst.nu_ei == 0.0 {
            0.0
        } else {
            SPITZER_RESISTIVITY * config.cst.nu_ei / config.cst.mu
        };

        log::info!(
            "{}: {}x{}x{} cells, operators {:?}, filter {}, naulin maxIt={} rtol={:.1e}",
            config.run_name,
            mesh.nx,
            mesh.ny,
            mesh.nz,
            config.operators.kind,
            filter.name(),
            config.naulin.max_iterations,
            config.naulin.rtol
        );
        log::debug!("scaled viscosities: {viscosity:?}");

        Ok(RhsAssembler {
            config: config.clone(),
            mesh,
            operators,
            filter,
            boundary,
            solver,
            halo: Box::new(SerialExchange),
            potential,
            noise,
            source,
            damping,
            viscosity,
            resistive,
            diagnostics: None,
        })
    }

    /// Replace the serial halo exchange, e.g. with a distributed one.
    pub fn with_halo(mut self, halo: Box<dyn HaloExchange>) -> Self {
        self.halo = halo;
        self
    }

    pub fn mesh(&self) -> &Mesh3D {
        &self.mesh
    }

    pub fn config(&self) -> &DriftConfig {
        &self.config
    }

    pub fn operator_kind(&self) -> OperatorKind {
        self.operators.kind()
    }

    pub fn potential(&self) -> &PotentialState {
        &self.potential
    }

    /// Seed the warm start, e.g. from a checkpoint.
    pub fn set_potential(&mut self, phi: Field3D) {
        let phi = phi
            .named("phi")
            .with_boundary(FieldRole::Phi.boundary(&self.config.boundary));
        let vort = self.operators.laplace_perp(&phi).named("vort");
        self.potential.update(phi, vort);
    }

    pub fn noise_state(&self) -> NoiseState {
        self.noise.state()
    }

    pub fn source(&self) -> &Field3D {
        &self.source
    }

    pub fn damping(&self) -> &Array2<f64> {
        &self.damping
    }

    pub fn viscosities(&self) -> &ScaledViscosities {
        &self.viscosity
    }

    pub fn diagnostics(&self) -> Option<&TermDiagnostics> {
        self.diagnostics.as_ref()
    }

    fn prepare(&mut self, state: &EvolvedVariableSet) -> DriftResult<Evaluable> {
        let ops = self.operators.ops();
        let solve = PotentialSolve {
            solver: &self.solver,
            ops,
            boundary: &self.boundary,
            halo: self.halo.as_ref(),
            filter: self.filter.as_ref(),
        };
        let sheath = SheathParameters {
            lambda_low: self.config.cst.lambda,
            lambda_high: self.config.cst.lambda,
            damping: &self.damping,
        };
        Snapshot::capture(state)
            .apply_boundaries(&self.boundary)?
            .exchange_density(self.halo.as_ref(), ops)?
            .solve_potential(&solve, &mut self.potential)?
            .apply_parallel_boundaries(&self.boundary, &sheath)?
            .exchange_all(self.halo.as_ref())
    }

    /// Convective part of the right-hand side.
    ///
    /// On the first call of a run with noise enabled, the density
    /// perturbation is added to `state.ln_n`; afterwards `state` is only read.
    pub fn convective(&mut self, state: &mut EvolvedVariableSet, t: f64) -> DriftResult<Derivatives> {
        self.noise.apply(&mut state.ln_n, &self.mesh);
        log::trace!("convective RHS at t={t}");
        let ready = self.prepare(state)?;
        let (ddt, terms) = self.convective_terms(&ready)?;
        let ddt = self.finish(ddt)?;
        if self.config.switches.save_terms || self.config.switches.save_ddt {
            let mut diag = TermDiagnostics {
                naulin_iterations: ready.naulin_iterations(),
                ..TermDiagnostics::default()
            };
            if self.config.switches.save_terms {
                diag.terms = terms;
                diag.terms.insert("phi".to_string(), ready.phi().clone());
                diag.terms.insert("vort".to_string(), ready.vort().clone());
            }
            if self.config.switches.save_ddt {
                diag.ddt = Some(ddt.clone());
            }
            self.diagnostics = Some(diag);
        }
        Ok(ddt)
    }

    /// Diffusive part of the right-hand side.
    ///
    /// Runs the same preparation as [`Self::convective`], potential solve
    /// included, so the sheath closure never sees a stale φ.
    pub fn diffusive(&mut self, state: &EvolvedVariableSet, t: f64) -> DriftResult<Derivatives> {
        log::trace!("diffusive RHS at t={t}");
        let ready = self.prepare(state)?;
        let (ddt, terms) = self.diffusive_terms(ready.state())?;
        let ddt = self.finish(ddt)?;
        if self.config.switches.save_terms || self.config.switches.save_ddt {
            let diag = self.diagnostics.get_or_insert_with(TermDiagnostics::default);
            if self.config.switches.save_terms {
                diag.terms.extend(terms);
            }
            if self.config.switches.save_ddt {
                diag.ddt = Some(ddt.clone());
            }
        }
        Ok(ddt)
    }

    /// Unsplit right-hand side, `convective + diffusive`.
    pub fn rhs(&mut self, state: &mut EvolvedVariableSet, t: f64) -> DriftResult<Derivatives> {
        let convective = self.convective(state, t)?;
        let diffusive = self.diffusive(state, t)?;
        let total = convective.sum(&diffusive);
        if let Some(diag) = self.diagnostics.as_mut() {
            if diag.ddt.is_some() {
                diag.ddt = Some(total.clone());
            }
        }
        Ok(total)
    }

    /// Filter every derivative, then fail collectively on non-finite values.
    fn finish(&self, mut ddt: Derivatives) -> DriftResult<Derivatives> {
        for f in ddt.fields_mut() {
            *f = self.filter.filter(f, &self.mesh);
        }
        let status = ddt.ensure_finite(&self.mesh);
        if let Err(err) = &status {
            log::error!("right-hand side rejected: {err}");
        }
        self.halo.synchronize_status(status)?;
        Ok(ddt)
    }

    fn convective_terms(
        &self,
        ready: &Evaluable,
    ) -> DriftResult<(Derivatives, BTreeMap<String, Field3D>)> {
        let ops = self.operators.ops();
        let cst = &self.config.cst;
        let s = ready.state();
        let n = ready.n();
        let phi = ready.phi();
        let inv_n = n.map(|v| 1.0 / v);
        let s_over_n = &self.source * &inv_n;

        // ln n
        let mut ln_n = Terms::new(&self.mesh, "lnN");
        ln_n.push("lnNAdv", -&self.operators.exb_advection(phi, &s.ln_n));
        ln_n.push("gradUEPar", -&ops.ddy(&s.u_e_par));
        ln_n.push("uEParGradLnN", -&ops.vpar_grad_par(&s.u_e_par, &s.ln_n));
        ln_n.push("srcN", s_over_n.clone());

        // electron parallel momentum
        let mut u_e = Terms::new(&self.mesh, "uEPar");
        u_e.push("uEParAdv", -&self.operators.exb_advection(phi, &s.u_e_par));
        u_e.push("uEParParAdv", -&ops.vpar_grad_par(&s.u_e_par, &s.u_e_par));
        u_e.push("gradPhiLnN", ops.ddy(&(phi - &s.ln_n)).scaled(cst.mu));
        let slip = &s.u_e_par - &s.u_i_par;
        u_e.push("elResistivity", slip.scaled(-SPITZER_RESISTIVITY * cst.nu_ei));
        u_e.push("elNeutralColl", s.u_e_par.scaled(-cst.nu_en));
        u_e.push("elSrc", -&(&s_over_n * &s.u_e_par));

        // ion parallel momentum
        let mut u_i = Terms::new(&self.mesh, "uIPar");
        u_i.push("uIParAdv", -&self.operators.exb_advection(phi, &s.u_i_par));
        u_i.push("uIParParAdv", -&ops.vpar_grad_par(&s.u_i_par, &s.u_i_par));
        u_i.push("gradPhi", -&ops.ddy(phi));
        u_i.push("ionResistivity", slip.scaled(self.resistive));
        u_i.push("ionNeutralColl", s.u_i_par.scaled(-cst.nu_in));
        u_i.push("ionSrc", -&(&s_over_n * &s.u_i_par));

        // generalised vorticity
        let mut vort = Terms::new(&self.mesh, "vortD");
        if cst.nu_in != 0.0 {
            vort.push("vortNeutral", (n * ready.vort()).scaled(-cst.nu_in));
            let grad_phi = ops.grad_perp(phi);
            let grad_n = ops.grad_perp(n);
            vort.push("potNeutral", ops.dot(&grad_phi, &grad_n).scaled(-cst.nu_in));
        }
        let ui_n = &s.u_i_par * n;
        let flux = self
            .operators
            .div_f_grad_perp_g(&ui_n, phi)
            .named("uIParNGradPerpPhi");
        let par_flux = ready.parallel_gradient_of_derived(flux, &self.boundary, self.halo.as_ref(), ops)?;
        vort.push("parDerDivUIParNGradPerpPhi", -&par_flux);
        vort.push("nGradUiUe", ops.ddy(&(n * &(&s.u_i_par - &s.u_e_par))));
        let exb = self.operators.div_exb_advection(&ExbInputs {
            n,
            phi,
            vort_d: &s.vort_d,
            boundary: &self.boundary,
        })?;
        for part in &exb.parts {
            vort.push(part.name(), -part);
        }

        let ddt = Derivatives {
            vort_d: vort.total(),
            ln_n: ln_n.total(),
            u_i_par: u_i.total(),
            u_e_par: u_e.total(),
        };
        let mut terms = BTreeMap::new();
        for group in [ln_n, u_e, u_i, vort] {
            for p in group.parts {
                terms.insert(p.name().to_string(), p);
            }
        }
        Ok((ddt, terms))
    }

    fn diffusive_terms(
        &self,
        s: &EvolvedVariableSet,
    ) -> DriftResult<(Derivatives, BTreeMap<String, Field3D>)> {
        let ops = self.operators.ops();
        let v = &self.viscosity;

        let mut ln_n = Terms::new(&self.mesh, "lnN");
        if self.resistive != 0.0 {
            let grad = ops.grad_perp(&s.ln_n);
            let diffusion = &ops.laplace_perp(&s.ln_n) + &ops.dot(&grad, &grad);
            ln_n.push("resistiveDiffusion", diffusion.scaled(self.resistive));
        }
        ln_n.push("lnNParArtVisc", ops.d2dy2(&s.ln_n).scaled(v.par_ln_n));
        ln_n.push("lnNPerpArtVisc", ops.laplace_perp(&s.ln_n).scaled(v.perp_ln_n));

        let mut u_e = Terms::new(&self.mesh, "uEPar");
        u_e.push("uEParParArtVisc", ops.d2dy2(&s.u_e_par).scaled(v.par_u_e_par));
        u_e.push("uEParPerpArtVisc", ops.laplace_perp(&s.u_e_par).scaled(v.perp_u_e_par));

        let mut u_i = Terms::new(&self.mesh, "uIPar");
        u_i.push("uIParParArtVisc", ops.d2dy2(&s.u_i_par).scaled(v.par_u_i_par));
        u_i.push("uIParPerpArtVisc", ops.laplace_perp(&s.u_i_par).scaled(v.perp_u_i_par));

        let mut vort = Terms::new(&self.mesh, "vortD");
        vort.push("vortDParArtVisc", ops.d2dy2(&s.vort_d).scaled(v.par_vort_d));
        vort.push("vortDPerpArtVisc", ops.laplace_perp(&s.vort_d).scaled(v.perp_vort_d));
        if self.config.switches.use_hyper_visc_az_vort_d {
            vort.push("vortDHyperViscAz", ops.d4dz4(&s.vort_d)?.scaled(-v.hyper_vort_d));
        }

        let ddt = Derivatives {
            vort_d: vort.total(),
            ln_n: ln_n.total(),
            u_i_par: u_i.total(),
            u_e_par: u_e.total(),
        };
        let mut terms = BTreeMap::new();
        for group in [ln_n, u_e, u_i, vort] {
            for p in group.parts {
                terms.insert(p.name().to_string(), p);
            }
        }
        Ok((ddt, terms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DriftConfig {
        DriftConfig::from_json_str(
            r#"{
                "geom": {"Lx": 1.0, "Ly": 4.0},
                "mesh": {"nx": 8, "ny": 6, "nz": 8},
                "cst": {"mu": 100.0, "Lambda": 3.0, "nuEI": 2.0, "nuIN": 0.1,
                        "artViscParLnN": 1.0, "artViscPerpVortD": 2.0, "artHyperAzVortD": 1.0}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_viscosities_scaled_by_grid() {
        let cfg = config();
        let asm = RhsAssembler::new(&cfg, StartMode::Fresh).unwrap();
        let m = asm.mesh();
        let v = asm.viscosities();
        assert!((v.par_ln_n - m.dy * m.dy).abs() < 1e-15);
        assert!((v.perp_vort_d - 2.0 * m.dx * m.dx).abs() < 1e-15);
        assert!((v.hyper_vort_d - m.dz.powi(4)).abs() < 1e-15);
        assert_eq!(v.par_vort_d, 0.0);
    }

    #[test]
    fn test_resistive_coefficient() {
        let cfg = config();
        let asm = RhsAssembler::new(&cfg, StartMode::Fresh).unwrap();
        assert!((asm.resistive - 0.51 * 2.0 / 100.0).abs() < 1e-15);

        let mut no_collisions = config();
        no_collisions.cst.nu_ei = 0.0;
        no_collisions.cst.mu = 0.0;
        let asm = RhsAssembler::new(&no_collisions, StartMode::Fresh).unwrap();
        assert_eq!(asm.resistive, 0.0);
    }

    #[test]
    fn test_missing_grid_key_is_reported() {
        let cfg = DriftConfig::from_json_str(r#"{"geom": {"Lx": 1.0, "Ly": 1.0}, "mesh": {"nx": 8, "nz": 8}}"#)
            .unwrap();
        match RhsAssembler::new(&cfg, StartMode::Fresh) {
            Err(drift_types::error::DriftError::MissingConfig(key)) => assert_eq!(key, "mesh.ny"),
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(_) => panic!("expected MissingConfig"),
        }
    }

    #[test]
    fn test_diagnostics_collect_named_terms() {
        let cfg = config();
        let mut asm = RhsAssembler::new(&cfg, StartMode::Fresh).unwrap();
        let mut state = EvolvedVariableSet::new(asm.mesh(), &cfg.boundary);
        asm.rhs(&mut state, 0.0).unwrap();
        let diag = asm.diagnostics().unwrap();
        // the default operator set is the direct difference
        for name in [
            "lnNAdv",
            "srcN",
            "gradPhiLnN",
            "divExBAdvGradPerpPhiN",
            "lnNParArtVisc",
            "phi",
        ] {
            assert!(diag.get(name).is_some(), "missing {name}");
        }
        assert!(diag.get("vortDHyperViscAz").is_none(), "hyper-viscosity switch is off");
        assert_eq!(diag.naulin_iterations, 1);
    }

    #[test]
    fn test_set_potential_updates_warm_start() {
        let cfg = config();
        let mut asm = RhsAssembler::new(&cfg, StartMode::Fresh).unwrap();
        let m = asm.mesh().clone();
        asm.set_potential(Field3D::from_fn(&m, "anything", |rho, _, _| 1.0 - rho * rho));
        assert_eq!(asm.potential().phi().name(), "phi");
        assert!(asm.potential().vort().max_abs_interior(&m) > 0.0);
    }
}
