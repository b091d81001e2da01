// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Halo Exchange
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Parallel halo communication seam.
//!
//! The right-hand-side pipeline calls [`HaloExchange::communicate`] at
//! fixed points; a distributed driver supplies an implementation that
//! fills the y halo rows of interior slab faces from neighbouring ranks.

use drift_types::error::DriftResult;
use drift_types::field::Field3D;

pub trait HaloExchange {
    /// Fill the halo rows of every field in `fields`.
    fn communicate(&self, fields: &mut [&mut Field3D]) -> DriftResult<()>;

    /// Agree on an error status across ranks. Serial runs return it unchanged.
    fn synchronize_status(&self, status: DriftResult<()>) -> DriftResult<()> {
        status
    }

    /// Maximum of `local` over all ranks; NaN on any rank yields NaN.
    ///
    /// Convergence decisions go through this so every rank runs the same
    /// number of collective exchanges.
    fn global_max(&self, local: f64) -> DriftResult<f64> {
        Ok(local)
    }
}

/// Single rank owning the whole parallel extent. Communication is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialExchange;

impl HaloExchange for SerialExchange {
    fn communicate(&self, _fields: &mut [&mut Field3D]) -> DriftResult<()> {
        Ok(())
    }
}
