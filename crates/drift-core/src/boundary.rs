// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Boundary Policy
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ghost-cell rules for the axis, the outer wall and the parallel ends.
//!
//! Every operation writes ghost cells only and reads interior values only
//! (plus, for corners, ghost rows set by an earlier radial pass), so each
//! one is idempotent. Parallel rules act only on a mesh that owns the
//! corresponding physical end; interior slab faces belong to the halo
//! exchange.

use drift_math::extrapolate::lagrange_weights;
use drift_types::error::{DriftError, DriftResult};
use drift_types::field::{AxisParity, Field3D, ParallelEnd, RadialOuter};
use drift_types::mesh::Mesh3D;
use ndarray::Array2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Lower,
    Upper,
}

#[derive(Debug, Clone)]
pub struct BoundaryPolicy {
    mesh: Mesh3D,
    extrapolation_order: usize,
    /// `weights[g − 1]` extrapolates the ghost at distance g.
    weights: Vec<Vec<f64>>,
}

impl BoundaryPolicy {
    pub fn new(mesh: &Mesh3D, extrapolation_order: usize) -> DriftResult<Self> {
        if mesh.ny < extrapolation_order + 1 {
            return Err(DriftError::ConfigError(format!(
                "order-{extrapolation_order} extrapolation needs ny >= {}, got {}",
                extrapolation_order + 1,
                mesh.ny
            )));
        }
        let weights = (1..=mesh.myg)
            .map(|g| lagrange_weights(extrapolation_order, g))
            .collect::<DriftResult<Vec<_>>>()?;
        Ok(BoundaryPolicy {
            mesh: mesh.clone(),
            extrapolation_order,
            weights,
        })
    }

    pub fn mesh(&self) -> &Mesh3D {
        &self.mesh
    }

    pub fn extrapolation_order(&self) -> usize {
        self.extrapolation_order
    }

    /// Fill the axis ghosts from the field's [`AxisParity`].
    pub fn apply_axis_boundary(&self, field: &mut Field3D) {
        let mesh = &self.mesh;
        let parity = field.boundary().axis;
        let sy = mesh.shape().1;
        for g in 1..=mesh.mxg {
            let ghost = mesh.mxg - g;
            let mirror = mesh.mxg + g - 1;
            for j in 0..sy {
                for k in 0..mesh.nz {
                    let value = match parity {
                        AxisParity::Even => field.get(mirror, j, k),
                        AxisParity::Odd => -field.get(mirror, j, k),
                        AxisParity::Diametric => field.get(mirror, j, mesh.opposite_z(k)),
                    };
                    field.set(ghost, j, k, value);
                }
            }
        }
    }

    /// Fill the outer radial ghosts from the field's [`RadialOuter`] rule.
    pub fn apply_outer_radial(&self, field: &mut Field3D) {
        let mesh = &self.mesh;
        let rule = field.boundary().outer;
        let last = mesh.x_last();
        let sy = mesh.shape().1;
        for g in 1..=mesh.mxg {
            let ghost = last + g;
            let mirror = last + 1 - g;
            for j in 0..sy {
                for k in 0..mesh.nz {
                    let inner = field.get(mirror, j, k);
                    let value = match rule {
                        RadialOuter::Neumann => inner,
                        RadialOuter::DirichletFace(v) => 2.0 * v - inner,
                    };
                    field.set(ghost, j, k, value);
                }
            }
        }
    }

    /// Apply the parallel rules of the field's spec at the physical ends.
    /// `Sheath` ends are left for [`apply_sheath_boundary`](Self::apply_sheath_boundary).
    pub fn apply_parallel(&self, field: &mut Field3D) -> DriftResult<()> {
        let spec = *field.boundary();
        if self.mesh.lower_y_boundary {
            self.apply_end(field, End::Lower, spec.lower)?;
        }
        if self.mesh.upper_y_boundary {
            self.apply_end(field, End::Upper, spec.upper)?;
        }
        Ok(())
    }

    /// Axis, outer radial and parallel rules in that order.
    pub fn apply_physical(&self, field: &mut Field3D) -> DriftResult<()> {
        self.apply_axis_boundary(field);
        self.apply_outer_radial(field);
        self.apply_parallel(field)
    }

    /// Lagrange-extrapolate the y ghosts at both physical ends.
    pub fn extrapolate_ghost(&self, field: &mut Field3D) -> DriftResult<()> {
        if self.mesh.lower_y_boundary {
            self.apply_end(field, End::Lower, ParallelEnd::Extrapolate)?;
        }
        if self.mesh.upper_y_boundary {
            self.apply_end(field, End::Upper, ParallelEnd::Extrapolate)?;
        }
        Ok(())
    }

    /// Bohm sheath outflow at every end whose rule is [`ParallelEnd::Sheath`].
    ///
    /// The face potential is the mean of the last interior cell and the
    /// first ghost of `phi`, whose ghosts must already be extrapolated. The
    /// face velocity is `+D·exp(Λ_high − φ_b)` at the upper end and
    /// `−D·exp(Λ_low − φ_b)` at the lower end; ghosts are mirrored so the
    /// face mean equals it.
    pub fn apply_sheath_boundary(
        &self,
        target: &mut Field3D,
        phi: &Field3D,
        reference_low: f64,
        reference_high: f64,
        damping: &Array2<f64>,
    ) -> DriftResult<()> {
        let mesh = &self.mesh;
        let (sx, _, nz) = mesh.shape();
        if damping.dim() != (sx, nz) {
            return Err(DriftError::PhysicsViolation(format!(
                "damping profile has shape {:?}, expected ({sx}, {nz})",
                damping.dim()
            )));
        }
        let spec = *target.boundary();
        let ends = [
            (End::Lower, spec.lower, mesh.lower_y_boundary, reference_low, -1.0),
            (End::Upper, spec.upper, mesh.upper_y_boundary, reference_high, 1.0),
        ];
        for (end, rule, owned, reference, sign) in ends {
            if rule != ParallelEnd::Sheath || !owned {
                continue;
            }
            let (edge, ghost0) = match end {
                End::Lower => (mesh.y_first(), mesh.y_first() - 1),
                End::Upper => (mesh.y_last(), mesh.y_last() + 1),
            };
            for i in 0..sx {
                for k in 0..nz {
                    let phi_face = 0.5 * (phi.get(i, edge, k) + phi.get(i, ghost0, k));
                    let face = sign * damping[[i, k]] * (reference - phi_face).exp();
                    for g in 1..=mesh.myg {
                        let (ghost, mirror) = self.ghost_and_mirror(end, g);
                        let value = 2.0 * face - target.get(i, mirror, k);
                        target.set(i, ghost, k, value);
                    }
                }
            }
        }
        Ok(())
    }

    fn ghost_and_mirror(&self, end: End, g: usize) -> (usize, usize) {
        match end {
            End::Lower => (self.mesh.y_first() - g, self.mesh.y_first() + g - 1),
            End::Upper => (self.mesh.y_last() + g, self.mesh.y_last() + 1 - g),
        }
    }

    fn apply_end(&self, field: &mut Field3D, end: End, rule: ParallelEnd) -> DriftResult<()> {
        let mesh = &self.mesh;
        let (sx, _, nz) = mesh.shape();
        match rule {
            ParallelEnd::Sheath => Ok(()),
            ParallelEnd::Neumann | ParallelEnd::DirichletFace(_) => {
                for g in 1..=mesh.myg {
                    let (ghost, mirror) = self.ghost_and_mirror(end, g);
                    for i in 0..sx {
                        for k in 0..nz {
                            let inner = field.get(i, mirror, k);
                            let value = match rule {
                                ParallelEnd::DirichletFace(v) => 2.0 * v - inner,
                                _ => inner,
                            };
                            field.set(i, ghost, k, value);
                        }
                    }
                }
                Ok(())
            }
            ParallelEnd::Extrapolate => {
                let order = self.extrapolation_order;
                if mesh.ny < order + 1 {
                    return Err(DriftError::PhysicsViolation(format!(
                        "order-{order} extrapolation needs {} interior y cells, slab has {}",
                        order + 1,
                        mesh.ny
                    )));
                }
                let inward = |n: usize| match end {
                    End::Lower => mesh.y_first() + n,
                    End::Upper => mesh.y_last() - n,
                };
                for g in 1..=mesh.myg {
                    let (ghost, _) = self.ghost_and_mirror(end, g);
                    let w = &self.weights[g - 1];
                    for i in 0..sx {
                        for k in 0..nz {
                            let mut value = 0.0;
                            for (n, wn) in w.iter().enumerate() {
                                value += wn * field.get(i, inward(n), k);
                            }
                            field.set(i, ghost, k, value);
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
