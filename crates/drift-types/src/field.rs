// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Fields
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Scalar and vector grid functions over a [`Mesh3D`].
//!
//! Arithmetic acts on the full storage, ghosts included, so products and
//! sums of fields with valid ghosts have valid ghosts. Derivative
//! operators only fill the interior.

use crate::error::{DriftError, DriftResult};
use crate::mesh::Mesh3D;
use ndarray::{s, Array3, ArrayView3, Zip};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Continuation of a field across the coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisParity {
    /// ghost(−k, θ) = f(+k, θ)
    Even,
    /// ghost(−k, θ) = −f(+k, θ)
    Odd,
    /// ghost(−k, θ) = f(+k, θ + π), the geometric continuation through ρ = 0.
    #[default]
    Diametric,
}

/// Rule at the outer radial boundary.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RadialOuter {
    #[default]
    Neumann,
    /// Value imposed on the outer face.
    DirichletFace(f64),
}

/// Rule at a physical parallel end.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParallelEnd {
    #[default]
    Neumann,
    /// Value imposed on the end face.
    DirichletFace(f64),
    /// Lagrange extrapolation from the interior.
    Extrapolate,
    /// Bohm sheath outflow, set from the potential by the boundary policy.
    Sheath,
}

/// Boundary rules attached to one field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundarySpec {
    pub axis: AxisParity,
    pub outer: RadialOuter,
    pub lower: ParallelEnd,
    pub upper: ParallelEnd,
}

impl BoundarySpec {
    pub fn new(axis: AxisParity, outer: RadialOuter, lower: ParallelEnd, upper: ParallelEnd) -> Self {
        BoundarySpec {
            axis,
            outer,
            lower,
            upper,
        }
    }
}

/// Scalar field on the (ρ, y, θ) storage of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Field3D {
    name: String,
    data: Array3<f64>,
    boundary: BoundarySpec,
}

impl Field3D {
    pub fn zeros(mesh: &Mesh3D, name: &str) -> Self {
        Self::constant(mesh, name, 0.0)
    }

    pub fn constant(mesh: &Mesh3D, name: &str, value: f64) -> Self {
        Field3D {
            name: name.to_string(),
            data: Array3::from_elem(mesh.shape(), value),
            boundary: BoundarySpec::default(),
        }
    }

    /// Evaluate `f(ρ, y, θ)` at every storage point, ghosts included.
    pub fn from_fn(mesh: &Mesh3D, name: &str, f: impl Fn(f64, f64, f64) -> f64) -> Self {
        let data = Array3::from_shape_fn(mesh.shape(), |(i, j, k)| {
            f(mesh.rho[i], mesh.y[j], mesh.theta[k])
        });
        Field3D {
            name: name.to_string(),
            data,
            boundary: BoundarySpec::default(),
        }
    }

    /// Wrap existing storage; the shape must match the mesh.
    pub fn from_array(mesh: &Mesh3D, name: &str, data: Array3<f64>) -> DriftResult<Self> {
        if data.dim() != mesh.shape() {
            return Err(DriftError::ShapeMismatch {
                expected: mesh.shape(),
                found: data.dim(),
            });
        }
        Ok(Field3D {
            name: name.to_string(),
            data,
            boundary: BoundarySpec::default(),
        })
    }

    pub fn with_boundary(mut self, boundary: BoundarySpec) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn boundary(&self) -> &BoundarySpec {
        &self.boundary
    }

    pub fn set_boundary(&mut self, boundary: BoundarySpec) {
        self.boundary = boundary;
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array3<f64> {
        &mut self.data
    }

    pub fn into_data(self) -> Array3<f64> {
        self.data
    }

    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[[i, j, k]]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: f64) {
        self.data[[i, j, k]] = value;
    }

    pub fn interior(&self, mesh: &Mesh3D) -> ArrayView3<'_, f64> {
        self.data.slice(s![mesh.xs(), mesh.ys(), ..])
    }

    /// Same name and boundary rules, new storage.
    pub fn like(&self, data: Array3<f64>) -> Self {
        Field3D {
            name: self.name.clone(),
            data,
            boundary: self.boundary,
        }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        self.like(self.data.mapv(f))
    }

    pub fn zip_map(&self, other: &Field3D, f: impl Fn(f64, f64) -> f64) -> Self {
        let mut out = self.data.clone();
        Zip::from(&mut out)
            .and(&other.data)
            .for_each(|a, &b| *a = f(*a, b));
        self.like(out)
    }

    pub fn exp(&self) -> Self {
        self.map(f64::exp)
    }

    pub fn scaled(&self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    /// Multiply every radial storage row by `profile[i]`.
    pub fn scale_rows(&self, profile: &ndarray::Array1<f64>) -> Self {
        let mut out = self.data.clone();
        for (i, mut plane) in out.outer_iter_mut().enumerate() {
            plane.mapv_inplace(|v| v * profile[i]);
        }
        self.like(out)
    }

    /// Set every interior point to zero, keeping ghosts.
    pub fn zero_interior(&mut self, mesh: &Mesh3D) {
        self.data.slice_mut(s![mesh.xs(), mesh.ys(), ..]).fill(0.0);
    }

    /// Copy the interior of `other` into this field.
    pub fn assign_interior(&mut self, mesh: &Mesh3D, other: &Field3D) {
        self.data
            .slice_mut(s![mesh.xs(), mesh.ys(), ..])
            .assign(&other.interior(mesh));
    }

    pub fn max_abs_interior(&self, mesh: &Mesh3D) -> f64 {
        self.interior(mesh)
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Storage index of the first non-finite interior value.
    pub fn first_non_finite(&self, mesh: &Mesh3D) -> Option<(usize, usize, usize)> {
        for i in mesh.xs() {
            for j in mesh.ys() {
                for k in 0..mesh.nz {
                    if !self.data[[i, j, k]].is_finite() {
                        return Some((i, j, k));
                    }
                }
            }
        }
        None
    }

    /// `NonFinite` error naming this field if any interior value is NaN/Inf.
    pub fn ensure_finite(&self, mesh: &Mesh3D) -> DriftResult<()> {
        match self.first_non_finite(mesh) {
            Some((x, y, z)) => Err(DriftError::NonFinite {
                field: self.name.clone(),
                x,
                y,
                z,
            }),
            None => Ok(()),
        }
    }

    /// Jacobian-weighted interior sum `Σ J f dx dy dz`.
    pub fn volume_integral(&self, mesh: &Mesh3D, jacobian: &ndarray::Array1<f64>) -> f64 {
        let mut total = 0.0;
        for i in mesh.xs() {
            let w = jacobian[i] * mesh.dx * mesh.dy * mesh.dz;
            for j in mesh.ys() {
                for k in 0..mesh.nz {
                    total += w * self.data[[i, j, k]];
                }
            }
        }
        total
    }
}

impl<'a> Add<&'a Field3D> for &'a Field3D {
    type Output = Field3D;
    fn add(self, rhs: &'a Field3D) -> Field3D {
        self.like(&self.data + &rhs.data)
    }
}

impl<'a> Sub<&'a Field3D> for &'a Field3D {
    type Output = Field3D;
    fn sub(self, rhs: &'a Field3D) -> Field3D {
        self.like(&self.data - &rhs.data)
    }
}

impl<'a> Mul<&'a Field3D> for &'a Field3D {
    type Output = Field3D;
    fn mul(self, rhs: &'a Field3D) -> Field3D {
        self.like(&self.data * &rhs.data)
    }
}

impl<'a> Div<&'a Field3D> for &'a Field3D {
    type Output = Field3D;
    fn div(self, rhs: &'a Field3D) -> Field3D {
        self.like(&self.data / &rhs.data)
    }
}

impl Mul<f64> for &Field3D {
    type Output = Field3D;
    fn mul(self, rhs: f64) -> Field3D {
        self.scaled(rhs)
    }
}

impl Neg for &Field3D {
    type Output = Field3D;
    fn neg(self) -> Field3D {
        self.map(|v| -v)
    }
}

impl AddAssign<&Field3D> for Field3D {
    fn add_assign(&mut self, rhs: &Field3D) {
        self.data += &rhs.data;
    }
}

/// Three-component vector of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector3D {
    pub x: Field3D,
    pub y: Field3D,
    pub z: Field3D,
    /// Components are covariant (lower index) rather than contravariant.
    pub covariant: bool,
}

impl Vector3D {
    pub fn zeros(mesh: &Mesh3D, name: &str, covariant: bool) -> Self {
        Vector3D {
            x: Field3D::zeros(mesh, &format!("{name}_x")),
            y: Field3D::zeros(mesh, &format!("{name}_y")),
            z: Field3D::zeros(mesh, &format!("{name}_z")),
            covariant,
        }
    }
}
