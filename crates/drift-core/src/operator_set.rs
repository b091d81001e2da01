// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — E×B Advection Operator Sets
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Interchangeable discretisations of `∇·(u_E·∇(n∇⊥φ))`.
//!
//! All three variants share the same [`DifferentialOperators`]; they only
//! differ in how the E×B advection of the generalised vorticity is built.
//!
//! | kind               | terms                                        |
//! |--------------------|----------------------------------------------|
//! | `simpleStupid`     | expanded cylindrical derivatives (one term)  |
//! | `onlyBracket`      | `J⁻¹[φ, ω_D]`                                |
//! | `2Brackets`        | `J⁻¹[φ, ω_D] + ½ J⁻¹[|∇⊥φ|², n]`             |

use crate::boundary::BoundaryPolicy;
use crate::operators::DifferentialOperators;
use drift_types::config::OperatorKind;
use drift_types::error::{DriftError, DriftResult};
use drift_types::field::{AxisParity, BoundarySpec, Field3D, ParallelEnd, RadialOuter, Vector3D};

/// Fields needed by [`OperatorSet::div_exb_advection`].
///
/// `n` and `phi` need valid ghosts to the depth of the widest stencil
/// (two radial layers for the direct difference).
pub struct ExbInputs<'a> {
    pub n: &'a Field3D,
    pub phi: &'a Field3D,
    pub vort_d: &'a Field3D,
    pub boundary: &'a BoundaryPolicy,
}

/// Result of the advection term with its named constituents.
#[derive(Debug, Clone)]
pub struct ExbAdvection {
    pub total: Field3D,
    pub parts: Vec<Field3D>,
}

pub trait OperatorSet {
    fn kind(&self) -> OperatorKind;

    fn ops(&self) -> &DifferentialOperators;

    fn div_exb_advection(&self, inputs: &ExbInputs<'_>) -> DriftResult<ExbAdvection>;

    fn div_f_grad_perp_g(&self, f: &Field3D, g: &Field3D) -> Field3D {
        self.ops().div_f_grad_perp_g(f, g)
    }

    fn laplace_perp(&self, f: &Field3D) -> Field3D {
        self.ops().laplace_perp(f)
    }

    fn exb_advection(&self, phi: &Field3D, f: &Field3D) -> Field3D {
        self.ops().exb_advection(phi, f)
    }

    fn grad_perp(&self, f: &Field3D) -> Vector3D {
        self.ops().grad_perp(f)
    }
}

pub fn create_operator_set(kind: OperatorKind, ops: DifferentialOperators) -> Box<dyn OperatorSet> {
    match kind {
        OperatorKind::DirectDifference => Box::new(DirectDifference { ops }),
        OperatorKind::OnlyBracket => Box::new(OnlyBracket { ops }),
        OperatorKind::TwoBrackets => Box::new(TwoBrackets { ops }),
    }
}

fn check_shapes(ops: &DifferentialOperators, inputs: &ExbInputs<'_>) -> DriftResult<()> {
    let expected = ops.mesh().shape();
    for f in [inputs.n, inputs.phi, inputs.vort_d] {
        if f.dim() != expected {
            return Err(DriftError::ShapeMismatch {
                expected,
                found: f.dim(),
            });
        }
    }
    Ok(())
}

// ── onlyBracket ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OnlyBracket {
    ops: DifferentialOperators,
}

impl OperatorSet for OnlyBracket {
    fn kind(&self) -> OperatorKind {
        OperatorKind::OnlyBracket
    }

    fn ops(&self) -> &DifferentialOperators {
        &self.ops
    }

    fn div_exb_advection(&self, inputs: &ExbInputs<'_>) -> DriftResult<ExbAdvection> {
        check_shapes(&self.ops, inputs)?;
        let adv = self.ops.exb_advection(inputs.phi, inputs.vort_d).named("vortDAdv");
        Ok(ExbAdvection {
            total: adv.clone().named("divExBAdvGradPerpPhiN"),
            parts: vec![adv],
        })
    }
}

// ── 2Brackets ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TwoBrackets {
    ops: DifferentialOperators,
}

impl OperatorSet for TwoBrackets {
    fn kind(&self) -> OperatorKind {
        OperatorKind::TwoBrackets
    }

    fn ops(&self) -> &DifferentialOperators {
        &self.ops
    }

    fn div_exb_advection(&self, inputs: &ExbInputs<'_>) -> DriftResult<ExbAdvection> {
        check_shapes(&self.ops, inputs)?;
        let grad_phi = self.ops.grad_perp(inputs.phi);
        let mut kinetic = self.ops.dot(&grad_phi, &grad_phi).named("gradPerpPhiSquared");
        kinetic.set_boundary(BoundarySpec::new(
            AxisParity::Diametric,
            RadialOuter::Neumann,
            ParallelEnd::Neumann,
            ParallelEnd::Neumann,
        ));
        inputs.boundary.apply_axis_boundary(&mut kinetic);
        inputs.boundary.apply_outer_radial(&mut kinetic);

        let vort_adv = self.ops.exb_advection(inputs.phi, inputs.vort_d).named("vortDAdv");
        let kin_adv = self
            .ops
            .exb_advection(&kinetic, inputs.n)
            .scaled(0.5)
            .named("kinEnAdvN");
        let total = (&vort_adv + &kin_adv).named("divExBAdvGradPerpPhiN");
        Ok(ExbAdvection {
            total,
            parts: vec![vort_adv, kin_adv],
        })
    }
}

// ── simpleStupid ─────────────────────────────────────────────────────

/// Expanded form of `∇·(u_E·∇(n∇⊥φ))` for the cylinder metric, written
/// out with explicit radial and azimuthal derivatives up to third order.
#[derive(Debug, Clone)]
pub struct DirectDifference {
    ops: DifferentialOperators,
}

impl OperatorSet for DirectDifference {
    fn kind(&self) -> OperatorKind {
        OperatorKind::DirectDifference
    }

    fn ops(&self) -> &DifferentialOperators {
        &self.ops
    }

    fn div_exb_advection(&self, inputs: &ExbInputs<'_>) -> DriftResult<ExbAdvection> {
        check_shapes(&self.ops, inputs)?;
        let ops = &self.ops;
        let mesh = ops.mesh();
        let r = &ops.metric().j;
        let phi = inputs.phi;
        let n = inputs.n;

        let p_x = ops.ddx(phi);
        let p_xx = ops.d2dx2(phi);
        let p_xxx = ops.d3dx3(phi)?;
        let p_z = ops.ddz(phi);
        let p_zz = ops.d2dz2(phi);
        let p_zzz = ops.d3dz3(phi)?;
        let p_xz = ops.mixed_xz(phi, 1, 1)?;
        let p_xxz = ops.mixed_xz(phi, 2, 1)?;
        let p_xzz = ops.mixed_xz(phi, 1, 2)?;

        let n_x = ops.ddx(n);
        let n_xx = ops.d2dx2(n);
        let n_z = ops.ddz(n);
        let n_zz = ops.d2dz2(n);
        let n_xz = ops.mixed_xz(n, 1, 1)?;

        let mut out = Field3D::zeros(mesh, "divExBAdvGradPerpPhiN");
        for i in mesh.xs() {
            let r1 = r[i];
            let r2 = r1 * r1;
            let r3 = r2 * r1;
            for j in mesh.ys() {
                for k in 0..mesh.nz {
                    let px = p_x.get(i, j, k);
                    let pxx = p_xx.get(i, j, k);
                    let pxxx = p_xxx.get(i, j, k);
                    let pz = p_z.get(i, j, k);
                    let pzz = p_zz.get(i, j, k);
                    let pzzz = p_zzz.get(i, j, k);
                    let pxz = p_xz.get(i, j, k);
                    let pxxz = p_xxz.get(i, j, k);
                    let pxzz = p_xzz.get(i, j, k);
                    let nv = n.get(i, j, k);
                    let nx = n_x.get(i, j, k);
                    let nxx = n_xx.get(i, j, k);
                    let nz = n_z.get(i, j, k);
                    let nzz = n_zz.get(i, j, k);
                    let nxz = n_xz.get(i, j, k);

                    // ∇⊥²φ and its gradient
                    let lap = pxx + px / r1 + pzz / r2;
                    let lap_x = pxxx + pxx / r1 - px / r2 + pxzz / r2 - 2.0 * pzz / r3;
                    let lap_z = pxxz + pxz / r1 + pzzz / r2;

                    // ω = ∇·(n∇⊥φ) and its gradient
                    let w_x = nx * lap + nv * lap_x + nxx * px + nx * pxx + (nxz * pz + nz * pxz) / r2
                        - 2.0 * nz * pz / r3;
                    let w_z = nz * lap + nv * lap_z + nxz * px + nx * pxz + (nzz * pz + nz * pzz) / r2;
                    let advect = (pz * w_x - px * w_z) / r1;

                    // ∇u_E : ∇(n∇⊥φ)
                    let urr = pxz / r1 - pz / r2;
                    let urt = -pxx;
                    let utr = pzz / r2 + px / r1;
                    let utt = -pxz / r1 + pz / r2;
                    let vrr = nx * px + nv * pxx;
                    let vrt = (nx * pz + nv * pxz) / r1 - nv * pz / r2;
                    let vtr = (nz * px + nv * pxz) / r1 - nv * pz / r2;
                    let vtt = (nz * pz + nv * pzz) / r2 + nv * px / r1;
                    let shear = urr * vrr + urt * vtr + utr * vrt + utt * vtt;

                    out.set(i, j, k, advect + shear);
                }
            }
        }
        Ok(ExbAdvection {
            total: out.clone(),
            parts: vec![out],
        })
    }
}
