// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Evaluation Pipeline
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ordered preparation of the fields before any equation term is formed.
//!
//! ```text
//! Snapshot ─apply_boundaries─▶ BoundariesApplied ─exchange_density─▶ DensityReady
//!   ─solve_potential─▶ PotentialSolved ─apply_parallel_boundaries─▶
//!   ParallelBoundariesApplied ─exchange_all─▶ Evaluable
//! ```
//!
//! Each stage consumes the previous one, so the sequence cannot be
//! reordered or partially skipped.

use crate::boundary::BoundaryPolicy;
use crate::filter::AzimuthalFilter;
use crate::halo::HaloExchange;
use crate::naulin::{NaulinContext, NaulinSolver, PotentialState};
use crate::operators::DifferentialOperators;
use crate::variables::EvolvedVariableSet;
use drift_types::error::DriftResult;
use drift_types::field::{Field3D, Vector3D};
use ndarray::Array2;

/// Sheath inputs for the electron parallel velocity.
#[derive(Debug, Clone, Copy)]
pub struct SheathParameters<'a> {
    pub lambda_low: f64,
    pub lambda_high: f64,
    pub damping: &'a Array2<f64>,
}

/// Working copy of the evolved fields. The caller's state is not touched again.
#[derive(Debug)]
pub struct Snapshot {
    state: EvolvedVariableSet,
}

impl Snapshot {
    pub fn capture(state: &EvolvedVariableSet) -> Self {
        Snapshot {
            state: state.clone(),
        }
    }

    /// Axis, outer radial and non-sheath parallel ghosts of every field.
    pub fn apply_boundaries(mut self, policy: &BoundaryPolicy) -> DriftResult<BoundariesApplied> {
        for f in self.state.fields_mut() {
            policy.apply_physical(f)?;
        }
        Ok(BoundariesApplied { state: self.state })
    }
}

#[derive(Debug)]
pub struct BoundariesApplied {
    state: EvolvedVariableSet,
}

impl BoundariesApplied {
    /// Communicate ln n and derive `n = exp(ln n)` and `∇⊥ln n`.
    pub fn exchange_density(
        mut self,
        halo: &dyn HaloExchange,
        ops: &DifferentialOperators,
    ) -> DriftResult<DensityReady> {
        halo.communicate(&mut [&mut self.state.ln_n])?;
        let n = self.state.ln_n.exp().named("n");
        let grad_perp_ln_n = ops.grad_perp(&self.state.ln_n);
        Ok(DensityReady {
            state: self.state,
            n,
            grad_perp_ln_n,
        })
    }
}

#[derive(Debug)]
pub struct DensityReady {
    state: EvolvedVariableSet,
    n: Field3D,
    grad_perp_ln_n: Vector3D,
}

/// Collaborators of the potential solve.
pub struct PotentialSolve<'a> {
    pub solver: &'a NaulinSolver,
    pub ops: &'a DifferentialOperators,
    pub boundary: &'a BoundaryPolicy,
    pub halo: &'a dyn HaloExchange,
    pub filter: &'a dyn AzimuthalFilter,
}

impl DensityReady {
    pub fn n(&self) -> &Field3D {
        &self.n
    }

    /// Naulin solve warm-started from `potential`, then filtered.
    ///
    /// `potential` is updated with the filtered result.
    pub fn solve_potential(
        self,
        solve: &PotentialSolve<'_>,
        potential: &mut PotentialState,
    ) -> DriftResult<PotentialSolved> {
        let ctx = NaulinContext {
            vort_d: &self.state.vort_d,
            n: &self.n,
            grad_perp_ln_n: &self.grad_perp_ln_n,
            ops: solve.ops,
            boundary: solve.boundary,
            halo: solve.halo,
        };
        let outcome = solve.solver.solve(&ctx, potential.phi())?;
        let iterations = outcome.iterations();
        let (phi, _) = solve.solver.resolve(outcome)?;

        let mut phi = solve.filter.filter(&phi, solve.ops.mesh());
        solve.boundary.apply_physical(&mut phi)?;
        solve.halo.communicate(&mut [&mut phi])?;
        // The filter changes φ, so the solver's ∇⊥²φ no longer matches it.
        let vort = solve.ops.laplace_perp(&phi).named("vort");
        potential.update(phi.clone(), vort.clone());

        Ok(PotentialSolved {
            state: self.state,
            n: self.n,
            grad_perp_ln_n: self.grad_perp_ln_n,
            phi,
            vort,
            iterations,
        })
    }
}

#[derive(Debug)]
pub struct PotentialSolved {
    state: EvolvedVariableSet,
    n: Field3D,
    grad_perp_ln_n: Vector3D,
    phi: Field3D,
    vort: Field3D,
    iterations: usize,
}

impl PotentialSolved {
    /// Extrapolate φ along y, then close the electron velocity at the sheath.
    pub fn apply_parallel_boundaries(
        mut self,
        policy: &BoundaryPolicy,
        sheath: &SheathParameters<'_>,
    ) -> DriftResult<ParallelBoundariesApplied> {
        policy.apply_physical(&mut self.phi)?;
        policy.apply_sheath_boundary(
            &mut self.state.u_e_par,
            &self.phi,
            sheath.lambda_low,
            sheath.lambda_high,
            sheath.damping,
        )?;
        Ok(ParallelBoundariesApplied {
            state: self.state,
            n: self.n,
            grad_perp_ln_n: self.grad_perp_ln_n,
            phi: self.phi,
            vort: self.vort,
            iterations: self.iterations,
        })
    }
}

#[derive(Debug)]
pub struct ParallelBoundariesApplied {
    state: EvolvedVariableSet,
    n: Field3D,
    grad_perp_ln_n: Vector3D,
    phi: Field3D,
    vort: Field3D,
    iterations: usize,
}

impl ParallelBoundariesApplied {
    /// Communicate every evolved field and φ.
    pub fn exchange_all(mut self, halo: &dyn HaloExchange) -> DriftResult<Evaluable> {
        {
            let s = &mut self.state;
            halo.communicate(&mut [
                &mut s.vort_d,
                &mut s.ln_n,
                &mut s.u_i_par,
                &mut s.u_e_par,
                &mut self.phi,
            ])?;
        }
        Ok(Evaluable {
            state: self.state,
            n: self.n,
            grad_perp_ln_n: self.grad_perp_ln_n,
            phi: self.phi,
            vort: self.vort,
            iterations: self.iterations,
        })
    }
}

/// Fields with every ghost valid; safe input for the equation terms.
#[derive(Debug)]
pub struct Evaluable {
    state: EvolvedVariableSet,
    n: Field3D,
    grad_perp_ln_n: Vector3D,
    phi: Field3D,
    vort: Field3D,
    iterations: usize,
}

impl Evaluable {
    pub fn state(&self) -> &EvolvedVariableSet {
        &self.state
    }

    pub fn n(&self) -> &Field3D {
        &self.n
    }

    pub fn grad_perp_ln_n(&self) -> &Vector3D {
        &self.grad_perp_ln_n
    }

    pub fn phi(&self) -> &Field3D {
        &self.phi
    }

    pub fn vort(&self) -> &Field3D {
        &self.vort
    }

    pub fn naulin_iterations(&self) -> usize {
        self.iterations
    }

    /// `∂y` of a quantity derived from the prepared fields.
    ///
    /// The derived field has no valid y ghosts of its own; they are
    /// extrapolated at physical ends and communicated across slab faces
    /// first.
    pub fn parallel_gradient_of_derived(
        &self,
        mut field: Field3D,
        boundary: &BoundaryPolicy,
        halo: &dyn HaloExchange,
        ops: &DifferentialOperators,
    ) -> DriftResult<Field3D> {
        boundary.extrapolate_ghost(&mut field)?;
        halo.communicate(&mut [&mut field])?;
        Ok(ops.ddy(&field))
    }
}
