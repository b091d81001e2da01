// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Naulin Potential Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fixed-point solve of `∇·(n∇⊥φ) = ω_D` for the electrostatic potential.
//!
//! Dividing by n gives `∇⊥²φ = ω_D/n − ∇⊥ln n · ∇⊥φ`. The right-hand side
//! is frozen at the current iterate and the perpendicular Laplacian is
//! inverted exactly, repeating until the forcing stops changing.

use crate::boundary::BoundaryPolicy;
use crate::halo::HaloExchange;
use crate::operators::DifferentialOperators;
use drift_math::laplace::CylinderLaplaceInverter;
use drift_types::config::{NaulinConfig, NonConvergencePolicy};
use drift_types::error::{DriftError, DriftResult};
use drift_types::field::{BoundarySpec, Field3D, Vector3D};
use drift_types::mesh::Mesh3D;

/// Exact inversion of the discrete perpendicular Laplacian.
pub trait LaplaceInversion {
    fn invert(&self, rhs: &Field3D) -> DriftResult<Field3D>;
}

impl LaplaceInversion for CylinderLaplaceInverter {
    fn invert(&self, rhs: &Field3D) -> DriftResult<Field3D> {
        CylinderLaplaceInverter::invert(self, rhs)
    }
}

/// Potential and its Laplacian carried between evaluations as a warm start.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialState {
    phi: Field3D,
    vort: Field3D,
}

impl PotentialState {
    pub fn new(mesh: &Mesh3D, phi_boundary: BoundarySpec) -> Self {
        PotentialState {
            phi: Field3D::zeros(mesh, "phi").with_boundary(phi_boundary),
            vort: Field3D::zeros(mesh, "vort"),
        }
    }

    pub fn phi(&self) -> &Field3D {
        &self.phi
    }

    pub fn vort(&self) -> &Field3D {
        &self.vort
    }

    pub fn update(&mut self, phi: Field3D, vort: Field3D) {
        self.phi = phi;
        self.vort = vort;
    }
}

/// Inputs frozen for one potential solve.
pub struct NaulinContext<'a> {
    pub vort_d: &'a Field3D,
    pub n: &'a Field3D,
    pub grad_perp_ln_n: &'a Vector3D,
    pub ops: &'a DifferentialOperators,
    pub boundary: &'a BoundaryPolicy,
    pub halo: &'a dyn HaloExchange,
}

#[derive(Debug, Clone)]
pub enum NaulinOutcome {
    Converged {
        phi: Field3D,
        vort: Field3D,
        iterations: usize,
        residual: f64,
    },
    DidNotConverge {
        phi: Field3D,
        vort: Field3D,
        iterations: usize,
        residual: f64,
    },
}

impl NaulinOutcome {
    pub fn converged(&self) -> bool {
        matches!(self, NaulinOutcome::Converged { .. })
    }

    pub fn iterations(&self) -> usize {
        match self {
            NaulinOutcome::Converged { iterations, .. }
            | NaulinOutcome::DidNotConverge { iterations, .. } => *iterations,
        }
    }

    pub fn residual(&self) -> f64 {
        match self {
            NaulinOutcome::Converged { residual, .. }
            | NaulinOutcome::DidNotConverge { residual, .. } => *residual,
        }
    }

    pub fn phi(&self) -> &Field3D {
        match self {
            NaulinOutcome::Converged { phi, .. } | NaulinOutcome::DidNotConverge { phi, .. } => phi,
        }
    }

    /// `(phi, vort)`.
    pub fn into_fields(self) -> (Field3D, Field3D) {
        match self {
            NaulinOutcome::Converged { phi, vort, .. }
            | NaulinOutcome::DidNotConverge { phi, vort, .. } => (phi, vort),
        }
    }
}

pub struct NaulinSolver {
    config: NaulinConfig,
    inverter: Box<dyn LaplaceInversion>,
}

impl NaulinSolver {
    pub fn new(config: NaulinConfig, inverter: Box<dyn LaplaceInversion>) -> Self {
        NaulinSolver { config, inverter }
    }

    pub fn config(&self) -> &NaulinConfig {
        &self.config
    }

    fn forcing(&self, ctx: &NaulinContext<'_>, phi: &Field3D) -> Field3D {
        let grad_phi = ctx.ops.grad_perp(phi);
        let coupling = ctx.ops.dot(ctx.grad_perp_ln_n, &grad_phi);
        (&(ctx.vort_d / ctx.n) - &coupling).named("naulinRHS")
    }

    fn prepare(&self, ctx: &NaulinContext<'_>, phi: &mut Field3D) -> DriftResult<()> {
        ctx.boundary.apply_physical(phi)?;
        ctx.halo.communicate(&mut [phi])
    }

    /// Iterate from `guess` until the forcing settles.
    ///
    /// The returned potential carries `guess`'s boundary spec with all
    /// physical ghosts applied and halos communicated; `vort` is `∇⊥²φ`.
    pub fn solve(&self, ctx: &NaulinContext<'_>, guess: &Field3D) -> DriftResult<NaulinOutcome> {
        let mesh = ctx.ops.mesh();
        let spec = *guess.boundary();
        let mut phi = guess.clone().named("phi");
        self.prepare(ctx, &mut phi)?;
        let mut forcing = self.forcing(ctx, &phi);
        let mut residual = f64::INFINITY;

        for iteration in 1..=self.config.max_iterations {
            let mut next = self.inverter.invert(&forcing)?.with_boundary(spec).named("phi");
            if let Some((x, y, z)) = next.first_non_finite(mesh) {
                return Err(DriftError::SolverDiverged {
                    iteration,
                    message: format!("non-finite potential at ({x}, {y}, {z})"),
                });
            }
            self.prepare(ctx, &mut next)?;
            let next_forcing = self.forcing(ctx, &next);

            let scale = ctx.halo.global_max(forcing.max_abs_interior(mesh))?;
            let change = ctx.halo.global_max((&next_forcing - &forcing).max_abs_interior(mesh))?;
            let (value, tolerance) = if scale > self.config.atol {
                (change / scale, self.config.rtol)
            } else {
                (change, self.config.atol)
            };
            residual = value;
            phi = next;
            forcing = next_forcing;
            log::trace!("naulin iteration {iteration}: residual {residual:.3e}");

            if !residual.is_finite() {
                return Err(DriftError::SolverDiverged {
                    iteration,
                    message: "non-finite residual".to_string(),
                });
            }
            if residual < tolerance {
                let vort = ctx.ops.laplace_perp(&phi).named("vort");
                return Ok(NaulinOutcome::Converged {
                    phi,
                    vort,
                    iterations: iteration,
                    residual,
                });
            }
        }

        let vort = ctx.ops.laplace_perp(&phi).named("vort");
        Ok(NaulinOutcome::DidNotConverge {
            phi,
            vort,
            iterations: self.config.max_iterations,
            residual,
        })
    }

    /// Apply the configured non-convergence policy to an outcome.
    pub fn resolve(&self, outcome: NaulinOutcome) -> DriftResult<(Field3D, Field3D)> {
        if outcome.converged() {
            return Ok(outcome.into_fields());
        }
        let iterations = outcome.iterations();
        let residual = outcome.residual();
        match self.config.non_convergence {
            NonConvergencePolicy::Warn => {
                log::warn!(
                    "potential solve did not converge after {iterations} iterations (residual {residual:.3e})"
                );
                Ok(outcome.into_fields())
            }
            NonConvergencePolicy::Abort => Err(DriftError::NotConverged {
                iterations,
                residual,
            }),
        }
    }
}
