// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Evolved Variables
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The four evolved fields, their time derivatives and their boundary rules.

use drift_types::config::BoundaryConfig;
use drift_types::constants::BOHM_ION_VELOCITY;
use drift_types::error::{DriftError, DriftResult};
use drift_types::field::{AxisParity, BoundarySpec, Field3D, ParallelEnd, RadialOuter};
use drift_types::mesh::Mesh3D;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    LnN,
    VortD,
    UIPar,
    UEPar,
    Phi,
}

impl FieldRole {
    pub const EVOLVED: [FieldRole; 4] = [
        FieldRole::VortD,
        FieldRole::LnN,
        FieldRole::UIPar,
        FieldRole::UEPar,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FieldRole::LnN => "lnN",
            FieldRole::VortD => "vortD",
            FieldRole::UIPar => "uIPar",
            FieldRole::UEPar => "uEPar",
            FieldRole::Phi => "phi",
        }
    }

    /// Ghost rules of this field.
    pub fn boundary(self, config: &BoundaryConfig) -> BoundarySpec {
        let axis = AxisParity::Diametric;
        match self {
            FieldRole::LnN => BoundarySpec::new(axis, RadialOuter::Neumann, ParallelEnd::Neumann, ParallelEnd::Neumann),
            FieldRole::VortD => BoundarySpec::new(
                axis,
                RadialOuter::DirichletFace(0.0),
                ParallelEnd::Neumann,
                ParallelEnd::Neumann,
            ),
            FieldRole::UIPar => BoundarySpec::new(
                axis,
                RadialOuter::Neumann,
                ParallelEnd::DirichletFace(0.0),
                ParallelEnd::DirichletFace(BOHM_ION_VELOCITY),
            ),
            FieldRole::UEPar => {
                let lower = if config.sheath_at_lower_end {
                    ParallelEnd::Sheath
                } else {
                    ParallelEnd::DirichletFace(0.0)
                };
                BoundarySpec::new(axis, RadialOuter::Neumann, lower, ParallelEnd::Sheath)
            }
            FieldRole::Phi => BoundarySpec::new(
                axis,
                RadialOuter::DirichletFace(0.0),
                ParallelEnd::Extrapolate,
                ParallelEnd::Extrapolate,
            ),
        }
    }
}

/// Evolved state owned by the time integrator.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolvedVariableSet {
    pub vort_d: Field3D,
    pub ln_n: Field3D,
    pub u_i_par: Field3D,
    pub u_e_par: Field3D,
}

impl EvolvedVariableSet {
    /// All fields zero (n ≡ 1, no flow).
    pub fn new(mesh: &Mesh3D, config: &BoundaryConfig) -> Self {
        let make = |role: FieldRole| Field3D::zeros(mesh, role.name()).with_boundary(role.boundary(config));
        EvolvedVariableSet {
            vort_d: make(FieldRole::VortD),
            ln_n: make(FieldRole::LnN),
            u_i_par: make(FieldRole::UIPar),
            u_e_par: make(FieldRole::UEPar),
        }
    }

    /// Wrap existing arrays, renaming them and attaching the standard rules.
    pub fn from_fields(
        mesh: &Mesh3D,
        config: &BoundaryConfig,
        vort_d: Field3D,
        ln_n: Field3D,
        u_i_par: Field3D,
        u_e_par: Field3D,
    ) -> DriftResult<Self> {
        let tag = |f: Field3D, role: FieldRole| -> DriftResult<Field3D> {
            if f.dim() != mesh.shape() {
                return Err(DriftError::ShapeMismatch {
                    expected: mesh.shape(),
                    found: f.dim(),
                });
            }
            Ok(f.named(role.name()).with_boundary(role.boundary(config)))
        };
        Ok(EvolvedVariableSet {
            vort_d: tag(vort_d, FieldRole::VortD)?,
            ln_n: tag(ln_n, FieldRole::LnN)?,
            u_i_par: tag(u_i_par, FieldRole::UIPar)?,
            u_e_par: tag(u_e_par, FieldRole::UEPar)?,
        })
    }

    pub fn fields(&self) -> [&Field3D; 4] {
        [&self.vort_d, &self.ln_n, &self.u_i_par, &self.u_e_par]
    }

    pub fn fields_mut(&mut self) -> [&mut Field3D; 4] {
        [
            &mut self.vort_d,
            &mut self.ln_n,
            &mut self.u_i_par,
            &mut self.u_e_par,
        ]
    }

    /// Forward-Euler step of the interior: `f += dt · ∂f/∂t`.
    pub fn advance(&mut self, dt: f64, ddt: &Derivatives) {
        for (f, d) in self.fields_mut().into_iter().zip(ddt.fields()) {
            *f += &d.scaled(dt);
        }
    }
}

/// Time derivatives of the evolved variables. Ghosts are always zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivatives {
    pub vort_d: Field3D,
    pub ln_n: Field3D,
    pub u_i_par: Field3D,
    pub u_e_par: Field3D,
}

impl Derivatives {
    pub fn zeros(mesh: &Mesh3D) -> Self {
        let make = |role: FieldRole| Field3D::zeros(mesh, &format!("ddt({})", role.name()));
        Derivatives {
            vort_d: make(FieldRole::VortD),
            ln_n: make(FieldRole::LnN),
            u_i_par: make(FieldRole::UIPar),
            u_e_par: make(FieldRole::UEPar),
        }
    }

    pub fn fields(&self) -> [&Field3D; 4] {
        [&self.vort_d, &self.ln_n, &self.u_i_par, &self.u_e_par]
    }

    pub fn fields_mut(&mut self) -> [&mut Field3D; 4] {
        [
            &mut self.vort_d,
            &mut self.ln_n,
            &mut self.u_i_par,
            &mut self.u_e_par,
        ]
    }

    /// Component-wise sum, keeping this set's names.
    pub fn sum(&self, other: &Derivatives) -> Derivatives {
        Derivatives {
            vort_d: &self.vort_d + &other.vort_d,
            ln_n: &self.ln_n + &other.ln_n,
            u_i_par: &self.u_i_par + &other.u_i_par,
            u_e_par: &self.u_e_par + &other.u_e_par,
        }
    }

    /// First non-finite interior value across all four fields.
    pub fn ensure_finite(&self, mesh: &Mesh3D) -> DriftResult<()> {
        self.fields().iter().try_for_each(|f| f.ensure_finite(mesh))
    }
}
