// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Checkpoints and Output Datasets
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! NPZ persistence of the evolved state and of diagnostic output.
//!
//! A checkpoint stores the four evolved fields, the last potential, the
//! simulation time and whether the initial noise has been added, which is
//! all a restart needs. Output datasets hold write-once profiles and
//! constants plus numbered frames `{name}_{index:04}`.

use crate::assembler::{RhsAssembler, TermDiagnostics};
use crate::noise::{NoiseState, StartMode};
use crate::variables::{EvolvedVariableSet, FieldRole};
use drift_types::config::BoundaryConfig;
use drift_types::error::{DriftError, DriftResult};
use drift_types::field::Field3D;
use drift_types::mesh::Mesh3D;
use ndarray::{Array1, Array2, Array3, Ix1, Ix3, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

fn npz_error(context: &str, e: impl std::fmt::Display) -> DriftError {
    DriftError::Npz(format!("{context}: {e}"))
}

fn read_array3(npz: &mut NpzReader<File>, key: &str) -> DriftResult<Array3<f64>> {
    npz.by_name::<OwnedRepr<f64>, Ix3>(&format!("{key}.npy"))
        .or_else(|_| npz.by_name::<OwnedRepr<f64>, Ix3>(key))
        .map_err(|e| npz_error(&format!("failed to read '{key}'"), e))
}

fn read_array1(npz: &mut NpzReader<File>, key: &str) -> DriftResult<Array1<f64>> {
    npz.by_name::<OwnedRepr<f64>, Ix1>(&format!("{key}.npy"))
        .or_else(|_| npz.by_name::<OwnedRepr<f64>, Ix1>(key))
        .map_err(|e| npz_error(&format!("failed to read '{key}'"), e))
}

fn read_flag(npz: &mut NpzReader<File>, key: &str) -> DriftResult<bool> {
    let v = npz
        .by_name::<OwnedRepr<i64>, Ix1>(&format!("{key}.npy"))
        .or_else(|_| npz.by_name::<OwnedRepr<i64>, Ix1>(key))
        .map_err(|e| npz_error(&format!("failed to read '{key}'"), e))?;
    v.iter()
        .next()
        .map(|x| *x != 0)
        .ok_or_else(|| DriftError::Npz(format!("'{key}' is empty")))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub time: f64,
    pub state: EvolvedVariableSet,
    pub phi: Field3D,
    pub noise: NoiseState,
}

impl Checkpoint {
    pub fn capture(time: f64, state: &EvolvedVariableSet, assembler: &RhsAssembler) -> Self {
        Checkpoint {
            time,
            state: state.clone(),
            phi: assembler.potential().phi().clone(),
            noise: assembler.noise_state(),
        }
    }

    /// Start mode for an assembler resuming from this checkpoint.
    pub fn start_mode(&self) -> StartMode {
        StartMode::Restart {
            noise_state: self.noise,
        }
    }

    pub fn write(&self, path: impl AsRef<Path>) -> DriftResult<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = NpzWriter::new(file);
        let ctx = "failed to write checkpoint";
        for f in self.state.fields() {
            writer.add_array(f.name(), f.data()).map_err(|e| npz_error(ctx, e))?;
        }
        writer
            .add_array(FieldRole::Phi.name(), self.phi.data())
            .map_err(|e| npz_error(ctx, e))?;
        writer
            .add_array("time", &Array1::from_vec(vec![self.time]))
            .map_err(|e| npz_error(ctx, e))?;
        let applied = i64::from(self.noise == NoiseState::Applied);
        writer
            .add_array("noise_applied", &Array1::from_vec(vec![applied]))
            .map_err(|e| npz_error(ctx, e))?;
        writer.finish().map_err(|e| npz_error(ctx, e))?;
        log::info!("checkpoint written at t={}: {}", self.time, path.as_ref().display());
        Ok(())
    }

    /// Read a checkpoint written for `mesh`.
    pub fn read(path: impl AsRef<Path>, mesh: &Mesh3D, boundary: &BoundaryConfig) -> DriftResult<Self> {
        let file = File::open(path.as_ref())?;
        let mut npz = NpzReader::new(file).map_err(|e| {
            npz_error(&format!("failed to open checkpoint '{}'", path.as_ref().display()), e)
        })?;
        let mut load = |role: FieldRole| -> DriftResult<Field3D> {
            let data = read_array3(&mut npz, role.name())?;
            Field3D::from_array(mesh, role.name(), data)
        };
        let vort_d = load(FieldRole::VortD)?;
        let ln_n = load(FieldRole::LnN)?;
        let u_i_par = load(FieldRole::UIPar)?;
        let u_e_par = load(FieldRole::UEPar)?;
        let phi = load(FieldRole::Phi)?.with_boundary(FieldRole::Phi.boundary(boundary));
        let state = EvolvedVariableSet::from_fields(mesh, boundary, vort_d, ln_n, u_i_par, u_e_par)?;

        let time = read_array1(&mut npz, "time")?
            .iter()
            .next()
            .copied()
            .ok_or_else(|| DriftError::Npz("'time' is empty".to_string()))?;
        let noise = if read_flag(&mut npz, "noise_applied")? {
            NoiseState::Applied
        } else {
            NoiseState::Uninitialized
        };
        Ok(Checkpoint {
            time,
            state,
            phi,
            noise,
        })
    }
}

/// Collected output, written as one NPZ archive.
#[derive(Debug, Clone, Default)]
pub struct OutputDataset {
    scalars: BTreeMap<String, f64>,
    profiles: BTreeMap<String, Array2<f64>>,
    fields: BTreeMap<String, Array3<f64>>,
    times: Vec<f64>,
}

impl OutputDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dataset pre-filled with the static profiles and constants of a run.
    pub fn for_run(assembler: &RhsAssembler) -> DriftResult<Self> {
        let mut out = Self::new();
        out.add_once_field("S", assembler.source())?;
        out.add_once_profile("dampingProfile", assembler.damping().clone())?;
        let cfg = assembler.config();
        let (cst, src) = (&cfg.cst, &cfg.src);
        let mesh = assembler.mesh();
        // viscosities as applied, i.e. already scaled by the grid spacing
        let v = assembler.viscosities();
        for (name, value) in [
            ("mu", cst.mu),
            ("Lambda", cst.lambda),
            ("nuEI", cst.nu_ei),
            ("nuEN", cst.nu_en),
            ("nuIN", cst.nu_in),
            ("a", src.a),
            ("bRho", src.b_rho),
            ("bZ", src.b_z),
            ("cRho", src.c_rho),
            ("cZ", src.c_z),
            ("Lx", mesh.lx),
            ("Ly", mesh.ly),
            ("artViscParLnN", v.par_ln_n),
            ("artViscParUEPar", v.par_u_e_par),
            ("artViscParUIPar", v.par_u_i_par),
            ("artViscParVortD", v.par_vort_d),
            ("artViscPerpLnN", v.perp_ln_n),
            ("artViscPerpUEPar", v.perp_u_e_par),
            ("artViscPerpUIPar", v.perp_u_i_par),
            ("artViscPerpVortD", v.perp_vort_d),
            ("artHyperAzVortD", v.hyper_vort_d),
        ] {
            out.add_scalar(name, value)?;
        }
        Ok(out)
    }

    fn ensure_new(&self, name: &str) -> DriftResult<()> {
        if self.scalars.contains_key(name) || self.profiles.contains_key(name) || self.fields.contains_key(name) {
            return Err(DriftError::ConfigError(format!(
                "output variable '{name}' is write-once and already present"
            )));
        }
        Ok(())
    }

    pub fn add_scalar(&mut self, name: &str, value: f64) -> DriftResult<()> {
        self.ensure_new(name)?;
        self.scalars.insert(name.to_string(), value);
        Ok(())
    }

    pub fn add_once_profile(&mut self, name: &str, profile: Array2<f64>) -> DriftResult<()> {
        self.ensure_new(name)?;
        self.profiles.insert(name.to_string(), profile);
        Ok(())
    }

    pub fn add_once_field(&mut self, name: &str, field: &Field3D) -> DriftResult<()> {
        self.ensure_new(name)?;
        self.fields.insert(name.to_string(), field.data().clone());
        Ok(())
    }

    pub fn frame_count(&self) -> usize {
        self.times.len()
    }

    /// Append one output frame; returns its index.
    pub fn push_frame(
        &mut self,
        time: f64,
        state: &EvolvedVariableSet,
        diagnostics: Option<&TermDiagnostics>,
    ) -> usize {
        let index = self.times.len();
        let mut store = |name: &str, field: &Field3D| {
            self.fields
                .insert(format!("{name}_{index:04}"), field.data().clone());
        };
        for f in state.fields() {
            store(f.name(), f);
        }
        if let Some(diag) = diagnostics {
            for (name, field) in &diag.terms {
                store(name, field);
            }
            if let Some(ddt) = &diag.ddt {
                for f in ddt.fields() {
                    store(f.name(), f);
                }
            }
        }
        self.times.push(time);
        index
    }

    pub fn field(&self, name: &str) -> Option<&Array3<f64>> {
        self.fields.get(name)
    }

    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.scalars.get(name).copied()
    }

    pub fn write(&self, path: impl AsRef<Path>) -> DriftResult<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = NpzWriter::new(file);
        let ctx = "failed to write output";
        for (name, value) in &self.scalars {
            writer
                .add_array(name.as_str(), &Array1::from_vec(vec![*value]))
                .map_err(|e| npz_error(ctx, e))?;
        }
        for (name, profile) in &self.profiles {
            writer.add_array(name.as_str(), profile).map_err(|e| npz_error(ctx, e))?;
        }
        for (name, field) in &self.fields {
            writer.add_array(name.as_str(), field).map_err(|e| npz_error(ctx, e))?;
        }
        writer
            .add_array("t_array", &Array1::from_vec(self.times.clone()))
            .map_err(|e| npz_error(ctx, e))?;
        writer.finish().map_err(|e| npz_error(ctx, e))?;
        Ok(())
    }
}
