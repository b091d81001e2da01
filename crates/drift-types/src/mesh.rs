// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Mesh
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Cell-centred (ρ, y, θ) mesh of a cylindrical plasma column.
//!
//! Storage index `i` along x covers `mxg` ghost cells on each side of the
//! `nx` interior cells; likewise `j` along y with `myg`. θ is periodic and
//! stored without ghosts. The first interior radial cell sits at `ρ = dx/2`,
//! so the axis is the face between storage cells `mxg − 1` and `mxg`.

use crate::config::DriftConfig;
use crate::error::{DriftError, DriftResult};
use ndarray::Array1;
use std::f64::consts::TAU;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh3D {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub mxg: usize,
    pub myg: usize,
    pub lx: f64,
    pub ly: f64,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    /// Global parallel resolution; equals `ny` on an undecomposed mesh.
    pub global_ny: usize,
    /// Global index of the first local interior y cell.
    pub y_offset: usize,
    /// This mesh owns the lower physical parallel end.
    pub lower_y_boundary: bool,
    /// This mesh owns the upper physical parallel end.
    pub upper_y_boundary: bool,
    /// ρ at every radial storage index (negative inside the axis ghosts).
    pub rho: Array1<f64>,
    /// y at every parallel storage index.
    pub y: Array1<f64>,
    /// θ at every azimuthal index.
    pub theta: Array1<f64>,
}

impl Mesh3D {
    /// Build an undecomposed mesh.
    pub fn new(
        nx: usize,
        ny: usize,
        nz: usize,
        lx: f64,
        ly: f64,
        mxg: usize,
        myg: usize,
    ) -> DriftResult<Self> {
        if nx < 2 || ny < 1 {
            return Err(DriftError::ConfigError(format!(
                "mesh requires nx >= 2 and ny >= 1, got nx={nx}, ny={ny}"
            )));
        }
        if nz < 4 || nz % 2 != 0 {
            return Err(DriftError::ConfigError(format!(
                "mesh requires an even nz >= 4, got {nz}"
            )));
        }
        if mxg < 1 || myg < 1 {
            return Err(DriftError::ConfigError(format!(
                "mesh requires ghost widths >= 1, got mxg={mxg}, myg={myg}"
            )));
        }
        if !lx.is_finite() || lx <= 0.0 || !ly.is_finite() || ly <= 0.0 {
            return Err(DriftError::ConfigError(format!(
                "mesh extents must be finite and > 0, got lx={lx}, ly={ly}"
            )));
        }
        Ok(Self::build(nx, ny, nz, lx, ly, mxg, myg, ny, 0, true, true))
    }

    /// Build the mesh described by a validated configuration.
    pub fn from_config(config: &DriftConfig) -> DriftResult<Self> {
        let g = config.validate()?;
        Self::new(g.nx, g.ny, g.nz, g.lx, g.ly, g.mxg, g.myg)
    }

    /// Local mesh for the y-slab `[y_start, y_start + local_ny)` of this mesh.
    pub fn slab(&self, y_start: usize, local_ny: usize) -> DriftResult<Self> {
        if local_ny == 0 || y_start + local_ny > self.ny {
            return Err(DriftError::PhysicsViolation(format!(
                "slab [{y_start}, {}) outside parallel extent {}",
                y_start + local_ny,
                self.ny
            )));
        }
        Ok(Self::build(
            self.nx,
            local_ny,
            self.nz,
            self.lx,
            self.ly,
            self.mxg,
            self.myg,
            self.global_ny,
            self.y_offset + y_start,
            self.lower_y_boundary && y_start == 0,
            self.upper_y_boundary && y_start + local_ny == self.ny,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        nx: usize,
        ny: usize,
        nz: usize,
        lx: f64,
        ly: f64,
        mxg: usize,
        myg: usize,
        global_ny: usize,
        y_offset: usize,
        lower_y_boundary: bool,
        upper_y_boundary: bool,
    ) -> Self {
        let dx = lx / nx as f64;
        let dy = ly / global_ny as f64;
        let dz = TAU / nz as f64;
        let sx = nx + 2 * mxg;
        let sy = ny + 2 * myg;
        let rho = Array1::from_shape_fn(sx, |i| (i as f64 - mxg as f64 + 0.5) * dx);
        let y = Array1::from_shape_fn(sy, |j| {
            (j as f64 - myg as f64 + y_offset as f64 + 0.5) * dy
        });
        let theta = Array1::from_shape_fn(nz, |k| k as f64 * dz);
        Mesh3D {
            nx,
            ny,
            nz,
            mxg,
            myg,
            lx,
            ly,
            dx,
            dy,
            dz,
            global_ny,
            y_offset,
            lower_y_boundary,
            upper_y_boundary,
            rho,
            y,
            theta,
        }
    }

    /// Storage shape `(nx + 2·mxg, ny + 2·myg, nz)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.nx + 2 * self.mxg, self.ny + 2 * self.myg, self.nz)
    }

    /// Interior radial storage indices.
    pub fn xs(&self) -> Range<usize> {
        self.mxg..self.mxg + self.nx
    }

    /// Interior parallel storage indices.
    pub fn ys(&self) -> Range<usize> {
        self.myg..self.myg + self.ny
    }

    pub fn x_first(&self) -> usize {
        self.mxg
    }

    pub fn x_last(&self) -> usize {
        self.mxg + self.nx - 1
    }

    pub fn y_first(&self) -> usize {
        self.myg
    }

    pub fn y_last(&self) -> usize {
        self.myg + self.ny - 1
    }

    /// Storage index of a signed radial index counted from the axis.
    ///
    /// `+k` is the k-th interior cell outwards from the axis and `−k` its
    /// mirror ghost; zero does not name a cell.
    pub fn radial_index(&self, signed: isize) -> DriftResult<usize> {
        let mxg = self.mxg as isize;
        let storage = match signed {
            0 => None,
            k if k > 0 && k <= self.nx as isize + mxg => Some(mxg + k - 1),
            k if k < 0 && -k <= mxg => Some(mxg + k),
            _ => None,
        };
        storage.map(|s| s as usize).ok_or_else(|| {
            DriftError::PhysicsViolation(format!("signed radial index {signed} outside storage"))
        })
    }

    /// Azimuthal index diametrically opposite `k` (θ + π).
    pub fn opposite_z(&self, k: usize) -> usize {
        (k + self.nz / 2) % self.nz
    }

    /// Periodic azimuthal neighbour `k + offset`.
    pub fn wrap_z(&self, k: usize, offset: isize) -> usize {
        (k as isize + offset).rem_euclid(self.nz as isize) as usize
    }

    /// Number of interior points.
    pub fn interior_len(&self) -> usize {
        self.nx * self.ny * self.nz
    }
}
