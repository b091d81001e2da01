// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Differential Operators
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Perpendicular and parallel operators on the cylindrical Clebsch mesh.
//!
//! Every operator fills the interior of its result and leaves the ghosts at
//! zero. Inputs must carry valid ghosts to the depth of the stencil.

use drift_math::stencil::CentralStencil;
use drift_types::config::GhostPolicy;
use drift_types::error::{DriftError, DriftResult};
use drift_types::field::{Field3D, Vector3D};
use drift_types::mesh::Mesh3D;
use drift_types::metric::Metric;
use std::ops::Range;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    X,
    Y,
    Z,
}

impl Direction {
    fn label(self) -> char {
        match self {
            Direction::X => 'x',
            Direction::Y => 'y',
            Direction::Z => 'z',
        }
    }
}

#[derive(Debug, Clone)]
pub struct DifferentialOperators {
    mesh: Mesh3D,
    metric: Arc<Metric>,
    ghost_policy: GhostPolicy,
    stencils: [CentralStencil; 4],
}

impl DifferentialOperators {
    pub fn new(mesh: Mesh3D, metric: Arc<Metric>, ghost_policy: GhostPolicy) -> DriftResult<Self> {
        if metric.j.len() != mesh.shape().0 {
            return Err(DriftError::PhysicsViolation(format!(
                "metric profiles have length {}, mesh has {} radial points",
                metric.j.len(),
                mesh.shape().0
            )));
        }
        let stencils = [
            CentralStencil::new(1)?,
            CentralStencil::new(2)?,
            CentralStencil::new(3)?,
            CentralStencil::new(4)?,
        ];
        Ok(DifferentialOperators {
            mesh,
            metric,
            ghost_policy,
            stencils,
        })
    }

    pub fn mesh(&self) -> &Mesh3D {
        &self.mesh
    }

    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    pub fn shared_metric(&self) -> Arc<Metric> {
        Arc::clone(&self.metric)
    }

    pub fn ghost_policy(&self) -> GhostPolicy {
        self.ghost_policy
    }

    fn spacing(&self, dir: Direction) -> f64 {
        match dir {
            Direction::X => self.mesh.dx,
            Direction::Y => self.mesh.dy,
            Direction::Z => self.mesh.dz,
        }
    }

    /// Central derivative of `order` (1–4) along `dir`.
    ///
    /// Third and fourth orders need two ghost layers along x and y. With
    /// too few, strict mode fails with `GhostWidth`; permissive mode logs a
    /// warning and leaves the unreachable points at zero.
    pub fn derivative(&self, f: &Field3D, dir: Direction, order: usize) -> DriftResult<Field3D> {
        if order == 0 || order > 4 {
            return Err(DriftError::ConfigError(format!(
                "unsupported derivative order {order}"
            )));
        }
        self.check_ghost_width(dir, order)?;
        let xs = self.mesh.xs();
        Ok(self.stencil_pass(f, dir, order, xs))
    }

    fn check_ghost_width(&self, dir: Direction, order: usize) -> DriftResult<()> {
        let required = self.stencils[order - 1].half_width();
        let available = match dir {
            Direction::X => self.mesh.mxg,
            Direction::Y => self.mesh.myg,
            Direction::Z => return Ok(()),
        };
        if required <= available {
            return Ok(());
        }
        match self.ghost_policy {
            GhostPolicy::Strict => Err(DriftError::GhostWidth {
                direction: dir.label(),
                order,
                required,
                available,
            }),
            GhostPolicy::Permissive => {
                log::warn!(
                    "order-{order} derivative along {} needs {required} ghost layers, mesh has {available}; \
                     points next to the boundary are left at zero",
                    dir.label()
                );
                Ok(())
            }
        }
    }

    fn stencil_pass(&self, f: &Field3D, dir: Direction, order: usize, xs: Range<usize>) -> Field3D {
        let stencil = &self.stencils[order - 1];
        let hw = stencil.half_width();
        let h = self.spacing(dir);
        let (sx, sy, _) = self.mesh.shape();
        let data = f.data();
        let mut out = Field3D::zeros(&self.mesh, f.name());
        for i in xs {
            if dir == Direction::X && (i < hw || i + hw >= sx) {
                continue;
            }
            for j in self.mesh.ys() {
                if dir == Direction::Y && (j < hw || j + hw >= sy) {
                    continue;
                }
                for k in 0..self.mesh.nz {
                    let value = match dir {
                        Direction::X => {
                            stencil.apply(h, |o| data[[(i as isize + o) as usize, j, k]])
                        }
                        Direction::Y => {
                            stencil.apply(h, |o| data[[i, (j as isize + o) as usize, k]])
                        }
                        Direction::Z => stencil.apply(h, |o| data[[i, j, self.mesh.wrap_z(k, o)]]),
                    };
                    out.set(i, j, k, value);
                }
            }
        }
        out
    }

    pub fn ddx(&self, f: &Field3D) -> Field3D {
        self.stencil_pass(f, Direction::X, 1, self.mesh.xs())
    }

    pub fn ddy(&self, f: &Field3D) -> Field3D {
        self.stencil_pass(f, Direction::Y, 1, self.mesh.xs())
    }

    pub fn ddz(&self, f: &Field3D) -> Field3D {
        self.stencil_pass(f, Direction::Z, 1, self.mesh.xs())
    }

    pub fn d2dx2(&self, f: &Field3D) -> Field3D {
        self.stencil_pass(f, Direction::X, 2, self.mesh.xs())
    }

    pub fn d2dy2(&self, f: &Field3D) -> Field3D {
        self.stencil_pass(f, Direction::Y, 2, self.mesh.xs())
    }

    pub fn d2dz2(&self, f: &Field3D) -> Field3D {
        self.stencil_pass(f, Direction::Z, 2, self.mesh.xs())
    }

    pub fn d3dx3(&self, f: &Field3D) -> DriftResult<Field3D> {
        self.derivative(f, Direction::X, 3)
    }

    pub fn d3dz3(&self, f: &Field3D) -> DriftResult<Field3D> {
        self.derivative(f, Direction::Z, 3)
    }

    pub fn d4dz4(&self, f: &Field3D) -> DriftResult<Field3D> {
        self.derivative(f, Direction::Z, 4)
    }

    /// ∂ˣ∂ᶻ-type mixed derivative: `x_order` along ρ of `z_order` along θ.
    pub fn mixed_xz(&self, f: &Field3D, x_order: usize, z_order: usize) -> DriftResult<Field3D> {
        if !(1..=4).contains(&x_order) || !(1..=4).contains(&z_order) {
            return Err(DriftError::ConfigError(format!(
                "unsupported mixed derivative orders x={x_order}, z={z_order}"
            )));
        }
        self.check_ghost_width(Direction::X, x_order)?;
        // θ needs no ghosts, so the inner pass can cover the radial ghosts too.
        let all_rows = 0..self.mesh.shape().0;
        let dz = self.stencil_pass(f, Direction::Z, z_order, all_rows);
        Ok(self.stencil_pass(&dz, Direction::X, x_order, self.mesh.xs()))
    }

    /// Contravariant perpendicular gradient `(g^xx ∂x f, 0, g^zz ∂z f)`.
    pub fn grad_perp(&self, f: &Field3D) -> Vector3D {
        let name = format!("gradPerp({})", f.name());
        let x = self.ddx(f).scale_rows(&self.metric.g11).named(&format!("{name}_x"));
        let z = self.ddz(f).scale_rows(&self.metric.g33).named(&format!("{name}_z"));
        Vector3D {
            x,
            y: Field3D::zeros(&self.mesh, &format!("{name}_y")),
            z,
            covariant: false,
        }
    }

    /// Inner product of two vectors with the appropriate metric.
    pub fn dot(&self, a: &Vector3D, b: &Vector3D) -> Field3D {
        let m = &self.metric;
        let products = [(&a.x, &b.x), (&a.y, &b.y), (&a.z, &b.z)];
        let weights = match (a.covariant, b.covariant) {
            (false, false) => Some([&m.g_11, &m.g_22, &m.g_33]),
            (true, true) => Some([&m.g11, &m.g22, &m.g33]),
            _ => None,
        };
        let mut out = Field3D::zeros(&self.mesh, "dot");
        for (n, (u, v)) in products.iter().enumerate() {
            let term = *u * *v;
            match weights {
                Some(w) => out += &term.scale_rows(w[n]),
                None => out += &term,
            }
        }
        out
    }

    /// ∇·(f ∇⊥g) in conservative face-flux form.
    ///
    /// Face values of f are arithmetic means of the neighbouring cells. The
    /// radial face product `J g^xx` vanishes on the axis, so no flux crosses it.
    pub fn div_f_grad_perp_g(&self, f: &Field3D, g: &Field3D) -> Field3D {
        self.flux_divergence(Some(f), g)
    }

    /// ∇⊥²f, identical to `div_f_grad_perp_g(1, f)`.
    pub fn laplace_perp(&self, f: &Field3D) -> Field3D {
        self.flux_divergence(None, f)
    }

    fn flux_divergence(&self, f: Option<&Field3D>, g: &Field3D) -> Field3D {
        let mesh = &self.mesh;
        let m = &self.metric;
        let dx2 = mesh.dx * mesh.dx;
        let dz2 = mesh.dz * mesh.dz;
        let gd = g.data();
        let coef = |i: usize, j: usize, k: usize| f.map_or(1.0, |f| f.get(i, j, k));
        let mut out = Field3D::zeros(mesh, g.name());
        for i in mesh.xs() {
            let face_hi = m.jg11_face(i);
            let face_lo = m.jg11_face(i - 1);
            let jz = m.j[i] * m.g33[i];
            for j in mesh.ys() {
                for k in 0..mesh.nz {
                    let kp = mesh.wrap_z(k, 1);
                    let km = mesh.wrap_z(k, -1);
                    let c = coef(i, j, k);
                    let fx_hi = 0.5 * (c + coef(i + 1, j, k));
                    let fx_lo = 0.5 * (coef(i - 1, j, k) + c);
                    let fz_hi = 0.5 * (c + coef(i, j, kp));
                    let fz_lo = 0.5 * (coef(i, j, km) + c);
                    let centre = gd[[i, j, k]];
                    let x_flux = face_hi * fx_hi * (gd[[i + 1, j, k]] - centre)
                        - face_lo * fx_lo * (centre - gd[[i - 1, j, k]]);
                    let z_flux = jz * (fz_hi * (gd[[i, j, kp]] - centre) - fz_lo * (centre - gd[[i, j, km]]));
                    out.set(i, j, k, (x_flux / dx2 + z_flux / dz2) / m.j[i]);
                }
            }
        }
        out
    }

    /// Arakawa bracket `[φ, f] ≈ ∂zφ ∂xf − ∂xφ ∂zf` in index space.
    ///
    /// Divide by J for the physical E×B advection `u_E·∇f`.
    pub fn bracket(&self, phi: &Field3D, f: &Field3D) -> Field3D {
        let mesh = &self.mesh;
        let p = phi.data();
        let a = f.data();
        let norm = 1.0 / (12.0 * mesh.dx * mesh.dz);
        let mut out = Field3D::zeros(mesh, f.name());
        for i in mesh.xs() {
            for j in mesh.ys() {
                for k in 0..mesh.nz {
                    let kp = mesh.wrap_z(k, 1);
                    let km = mesh.wrap_z(k, -1);
                    let jpp = (p[[i, j, kp]] - p[[i, j, km]]) * (a[[i + 1, j, k]] - a[[i - 1, j, k]])
                        - (p[[i + 1, j, k]] - p[[i - 1, j, k]]) * (a[[i, j, kp]] - a[[i, j, km]]);
                    let jpx = a[[i + 1, j, k]] * (p[[i + 1, j, kp]] - p[[i + 1, j, km]])
                        - a[[i - 1, j, k]] * (p[[i - 1, j, kp]] - p[[i - 1, j, km]])
                        - a[[i, j, kp]] * (p[[i + 1, j, kp]] - p[[i - 1, j, kp]])
                        + a[[i, j, km]] * (p[[i + 1, j, km]] - p[[i - 1, j, km]]);
                    let jxp = a[[i + 1, j, kp]] * (p[[i, j, kp]] - p[[i + 1, j, k]])
                        - a[[i - 1, j, km]] * (p[[i - 1, j, k]] - p[[i, j, km]])
                        - a[[i - 1, j, kp]] * (p[[i, j, kp]] - p[[i - 1, j, k]])
                        + a[[i + 1, j, km]] * (p[[i + 1, j, k]] - p[[i, j, km]]);
                    out.set(i, j, k, (jpp + jpx + jxp) * norm);
                }
            }
        }
        out
    }

    /// `J⁻¹ [φ, f]`, the E×B advection of f.
    pub fn exb_advection(&self, phi: &Field3D, f: &Field3D) -> Field3D {
        let inv_j = self.metric.j.mapv(|j| 1.0 / j);
        self.bracket(phi, f).scale_rows(&inv_j)
    }

    /// ∇∥f along the straight field.
    pub fn grad_par(&self, f: &Field3D) -> Field3D {
        self.ddy(f)
    }

    /// `v ∇∥f`.
    pub fn vpar_grad_par(&self, v: &Field3D, f: &Field3D) -> Field3D {
        v * &self.ddy(f)
    }
}
