// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Run configuration for the drift-turbulence right-hand side.
//!
//! Section and key names follow the CELMA input deck (`cst.nuEI`,
//! `switch.includeNoise`, ...). Every physics key has a default; the grid
//! sizes and the domain extents do not, and `validate` reports their
//! absence before any field is allocated.

use crate::constants::{
    DEALIAS_FRACTION, DEFAULT_EXTRAPOLATION_ORDER, DEFAULT_GHOST_WIDTH, DEFAULT_NOISE_AMPLITUDE,
};
use crate::error::{DriftError, DriftResult};
use serde::{Deserialize, Serialize};

/// Top-level run configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriftConfig {
    #[serde(default = "default_run_name")]
    pub run_name: String,
    #[serde(default)]
    pub geom: GeometryConfig,
    #[serde(default)]
    pub mesh: MeshConfig,
    #[serde(default)]
    pub cst: PhysicsConstants,
    #[serde(default)]
    pub src: SourceCoefficients,
    #[serde(default, rename = "switch")]
    pub switches: Switches,
    #[serde(default, alias = "ownOperators")]
    pub operators: OperatorConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub naulin: NaulinConfig,
    #[serde(default)]
    pub boundary: BoundaryConfig,
    #[serde(default)]
    pub noise: NoiseConfig,
}

fn default_run_name() -> String {
    "celma".to_string()
}

/// Domain extents. Both are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Radial extent of the column.
    #[serde(rename = "Lx", default, skip_serializing_if = "Option::is_none")]
    pub lx: Option<f64>,
    /// Parallel length of the column.
    #[serde(rename = "Ly", default, skip_serializing_if = "Option::is_none")]
    pub ly: Option<f64>,
}

/// Grid resolution. `nx`, `ny`, `nz` are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nx: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ny: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nz: Option<usize>,
    /// Radial ghost width.
    #[serde(rename = "MXG", default = "default_ghost_width")]
    pub mxg: usize,
    /// Parallel ghost width.
    #[serde(rename = "MYG", default = "default_ghost_width")]
    pub myg: usize,
}

fn default_ghost_width() -> usize {
    DEFAULT_GHOST_WIDTH
}

impl Default for MeshConfig {
    fn default() -> Self {
        MeshConfig {
            nx: None,
            ny: None,
            nz: None,
            mxg: default_ghost_width(),
            myg: default_ghost_width(),
        }
    }
}

/// Normalised physical constants and artificial viscosities.
///
/// The viscosities are given in grid units; the assembler scales them by
/// `dy²`, `dx²` and `dz⁴` at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsConstants {
    #[serde(default)]
    pub mu: f64,
    #[serde(default, rename = "Lambda")]
    pub lambda: f64,
    #[serde(default, rename = "nuEI")]
    pub nu_ei: f64,
    #[serde(default, rename = "nuEN")]
    pub nu_en: f64,
    #[serde(default, rename = "nuIN")]
    pub nu_in: f64,
    #[serde(default)]
    pub art_visc_par_ln_n: f64,
    #[serde(default, rename = "artViscParUEPar")]
    pub art_visc_par_ue_par: f64,
    #[serde(default, rename = "artViscParUIPar")]
    pub art_visc_par_ui_par: f64,
    #[serde(default, rename = "artViscParVortD")]
    pub art_visc_par_vort_d: f64,
    #[serde(default)]
    pub art_visc_perp_ln_n: f64,
    #[serde(default, rename = "artViscPerpUEPar")]
    pub art_visc_perp_ue_par: f64,
    #[serde(default, rename = "artViscPerpUIPar")]
    pub art_visc_perp_ui_par: f64,
    #[serde(default, rename = "artViscPerpVortD")]
    pub art_visc_perp_vort_d: f64,
    #[serde(default, rename = "artHyperAzVortD")]
    pub art_hyper_az_vort_d: f64,
}

/// Coefficients of the particle source
/// `S = a·½(1 − tanh((ρ − bRho)/cRho))·½(1 − tanh((y − bZ)/cZ))`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceCoefficients {
    #[serde(default)]
    pub a: f64,
    #[serde(default, rename = "bRho")]
    pub b_rho: f64,
    #[serde(default, rename = "bZ")]
    pub b_z: f64,
    #[serde(default, rename = "cRho")]
    pub c_rho: f64,
    #[serde(default, rename = "cZ")]
    pub c_z: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Switches {
    #[serde(default)]
    pub use_hyper_visc_az_vort_d: bool,
    #[serde(default)]
    pub include_noise: bool,
    #[serde(default)]
    pub force_add_noise: bool,
    #[serde(default)]
    pub save_ddt: bool,
    #[serde(default = "default_true")]
    pub save_terms: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Switches {
    fn default() -> Self {
        Switches {
            use_hyper_visc_az_vort_d: false,
            include_noise: false,
            force_add_noise: false,
            save_ddt: false,
            save_terms: default_true(),
        }
    }
}

/// Discretisation of ∇·(u_E·∇(n∇⊥φ)).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorKind {
    /// Direct finite differences of the expanded expression.
    #[default]
    #[serde(rename = "simpleStupid", alias = "directDifference")]
    DirectDifference,
    /// Single Arakawa bracket of φ with the vorticity.
    #[serde(rename = "onlyBracket")]
    OnlyBracket,
    /// Vorticity bracket plus the kinetic-energy bracket with n.
    #[serde(rename = "2Brackets", alias = "twoBrackets")]
    TwoBrackets,
}

/// What to do when a higher-order stencil does not fit in the ghost layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GhostPolicy {
    #[default]
    Strict,
    Permissive,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    #[serde(default, rename = "type")]
    pub kind: OperatorKind,
    #[serde(default)]
    pub ghost_policy: GhostPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    #[serde(alias = "none")]
    NoFilter,
    #[default]
    LowPass,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    #[serde(default, rename = "type")]
    pub kind: FilterKind,
    /// Highest retained azimuthal mode. Defaults to the 2/3 rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<usize>,
    /// Lowest retained azimuthal mode.
    #[serde(default)]
    pub min_mode: usize,
}

impl FilterConfig {
    /// Cutoff mode for an azimuthal resolution of `nz` points.
    pub fn resolved_cutoff(&self, nz: usize) -> usize {
        self.cutoff
            .unwrap_or_else(|| ((nz / 2) as f64 * DEALIAS_FRACTION).floor() as usize)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonConvergencePolicy {
    /// Log a warning and continue with the last iterate.
    #[default]
    Warn,
    /// Fail the evaluation.
    Abort,
}

/// Naulin fixed-point iteration controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaulinConfig {
    #[serde(default = "default_max_iterations", rename = "maxIt")]
    pub max_iterations: usize,
    /// Absolute floor below which the residual is not normalised.
    #[serde(default = "default_atol")]
    pub atol: f64,
    /// Relative convergence threshold.
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    #[serde(default)]
    pub non_convergence: NonConvergencePolicy,
}

fn default_max_iterations() -> usize {
    100
}
fn default_atol() -> f64 {
    1e-10
}
fn default_rtol() -> f64 {
    1e-7
}

impl Default for NaulinConfig {
    fn default() -> Self {
        NaulinConfig {
            max_iterations: default_max_iterations(),
            atol: default_atol(),
            rtol: default_rtol(),
            non_convergence: NonConvergencePolicy::default(),
        }
    }
}

/// Radial damping of the sheath outflow, `A·½(1 − tanh((ρ − ρ_edge)/w))`.
/// Uniform `A` when `rhoEdge` is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DampingConfig {
    #[serde(default = "default_damping_amplitude")]
    pub amplitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rho_edge: Option<f64>,
    #[serde(default = "default_damping_width")]
    pub width: f64,
}

fn default_damping_amplitude() -> f64 {
    1.0
}
fn default_damping_width() -> f64 {
    0.1
}

impl Default for DampingConfig {
    fn default() -> Self {
        DampingConfig {
            amplitude: default_damping_amplitude(),
            rho_edge: None,
            width: default_damping_width(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryConfig {
    #[serde(default = "default_extrapolation_order")]
    pub extrapolation_order: usize,
    /// Apply the sheath condition at the lower parallel end too.
    #[serde(default)]
    pub sheath_at_lower_end: bool,
    #[serde(default, rename = "dampProf")]
    pub damping: DampingConfig,
}

fn default_extrapolation_order() -> usize {
    DEFAULT_EXTRAPOLATION_ORDER
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        BoundaryConfig {
            extrapolation_order: default_extrapolation_order(),
            sheath_at_lower_end: false,
            damping: DampingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    #[serde(default = "default_noise_amplitude")]
    pub amplitude: f64,
    #[serde(default)]
    pub seed: u64,
}

fn default_noise_amplitude() -> f64 {
    DEFAULT_NOISE_AMPLITUDE
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig {
            amplitude: default_noise_amplitude(),
            seed: 0,
        }
    }
}

/// Grid and extents after the required keys have been checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedGrid {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub mxg: usize,
    pub myg: usize,
    pub lx: f64,
    pub ly: f64,
}

fn required<T: Copy>(value: Option<T>, key: &str) -> DriftResult<T> {
    value.ok_or_else(|| DriftError::MissingConfig(key.to_string()))
}

impl DriftConfig {
    /// Load from a JSON file.
    pub fn from_file(path: &str) -> DriftResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> DriftResult<Self> {
        let config: Self = serde_json::from_str(contents)?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> DriftResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Required grid keys, or `MissingConfig` naming the first absent one.
    pub fn grid(&self) -> DriftResult<ResolvedGrid> {
        Ok(ResolvedGrid {
            nx: required(self.mesh.nx, "mesh.nx")?,
            ny: required(self.mesh.ny, "mesh.ny")?,
            nz: required(self.mesh.nz, "mesh.nz")?,
            mxg: self.mesh.mxg,
            myg: self.mesh.myg,
            lx: required(self.geom.lx, "geom.Lx")?,
            ly: required(self.geom.ly, "geom.Ly")?,
        })
    }

    /// Check required keys and physical consistency.
    pub fn validate(&self) -> DriftResult<ResolvedGrid> {
        let grid = self.grid()?;
        if !grid.lx.is_finite() || grid.lx <= 0.0 || !grid.ly.is_finite() || grid.ly <= 0.0 {
            return Err(DriftError::ConfigError(format!(
                "domain extents must be finite and > 0, got Lx={}, Ly={}",
                grid.lx, grid.ly
            )));
        }
        if grid.nx < 2 || grid.ny < 1 {
            return Err(DriftError::ConfigError(format!(
                "grid requires nx >= 2 and ny >= 1, got nx={}, ny={}",
                grid.nx, grid.ny
            )));
        }
        if grid.nz < 4 || grid.nz % 2 != 0 {
            return Err(DriftError::ConfigError(format!(
                "nz must be even and >= 4 for the diametric axis condition, got {}",
                grid.nz
            )));
        }
        if grid.mxg < 1 || grid.myg < 1 {
            return Err(DriftError::ConfigError(format!(
                "ghost widths must be >= 1, got MXG={}, MYG={}",
                grid.mxg, grid.myg
            )));
        }
        if self.cst.nu_ei != 0.0 && self.cst.mu <= 0.0 {
            return Err(DriftError::ConfigError(format!(
                "cst.mu must be > 0 when cst.nuEI != 0 (mu={})",
                self.cst.mu
            )));
        }
        if self.src.a != 0.0 && (self.src.c_rho <= 0.0 || self.src.c_z <= 0.0) {
            return Err(DriftError::ConfigError(format!(
                "source widths must be > 0 when src.a != 0 (cRho={}, cZ={})",
                self.src.c_rho, self.src.c_z
            )));
        }
        if self.boundary.damping.rho_edge.is_some() && self.boundary.damping.width <= 0.0 {
            return Err(DriftError::ConfigError(format!(
                "dampProf.width must be > 0, got {}",
                self.boundary.damping.width
            )));
        }
        if self.boundary.extrapolation_order < 1 {
            return Err(DriftError::ConfigError(
                "boundary.extrapolationOrder must be >= 1".to_string(),
            ));
        }
        if self.naulin.max_iterations == 0 || self.naulin.rtol <= 0.0 || self.naulin.atol < 0.0 {
            return Err(DriftError::ConfigError(format!(
                "invalid Naulin controls: maxIt={}, rtol={}, atol={}",
                self.naulin.max_iterations, self.naulin.rtol, self.naulin.atol
            )));
        }
        let cutoff = self.filter.resolved_cutoff(grid.nz);
        if self.filter.kind == FilterKind::LowPass && self.filter.min_mode > cutoff {
            return Err(DriftError::ConfigError(format!(
                "filter.minMode={} exceeds cutoff={}",
                self.filter.min_mode, cutoff
            )));
        }
        Ok(grid)
    }
}
