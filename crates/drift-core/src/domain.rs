// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Parallel Domain Decomposition
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Splitting of the parallel (y) extent into slabs with halo rows.
//!
//! Each slab keeps the full radial and azimuthal extent and `myg` halo
//! rows on either side. Interior slab faces are filled by the exchange;
//! the outermost slabs keep the physical parallel ghosts.
//!
//! [`SlabExchange`] runs one slab per thread and moves halo rows and
//! reductions over channels between neighbouring slabs.

use crate::halo::HaloExchange;
use crossbeam_channel::{unbounded, Receiver, Sender};
use drift_types::error::{DriftError, DriftResult};
use drift_types::field::Field3D;
use drift_types::mesh::Mesh3D;
use ndarray::{s, Array3};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSlice {
    pub rank: usize,
    pub nranks: usize,
    pub global_ny: usize,
    pub local_ny: usize,
    pub halo: usize,
    pub y_start: usize,
    pub y_end: usize,
}

impl DomainSlice {
    pub fn has_lower_neighbor(&self) -> bool {
        self.rank > 0
    }

    pub fn has_upper_neighbor(&self) -> bool {
        self.rank + 1 < self.nranks
    }

    /// Local mesh of this slab.
    pub fn mesh(&self, global: &Mesh3D) -> DriftResult<Mesh3D> {
        global.slab(self.y_start, self.local_ny)
    }
}

/// Contiguous balanced split of `global_ny` interior rows over `nranks`.
pub fn decompose_y(global_ny: usize, nranks: usize, halo: usize) -> DriftResult<Vec<DomainSlice>> {
    if nranks < 1 {
        return Err(DriftError::PhysicsViolation(
            "decomposition requires nranks >= 1".to_string(),
        ));
    }
    if global_ny < nranks * halo.max(1) {
        return Err(DriftError::PhysicsViolation(format!(
            "cannot split ny={global_ny} across {nranks} ranks with {halo} halo rows"
        )));
    }

    let base = global_ny / nranks;
    let rem = global_ny % nranks;
    let mut out = Vec::with_capacity(nranks);
    let mut cursor = 0usize;
    for rank in 0..nranks {
        let local_ny = base + usize::from(rank < rem);
        let y_start = cursor;
        let y_end = y_start + local_ny;
        cursor = y_end;
        out.push(DomainSlice {
            rank,
            nranks,
            global_ny,
            local_ny,
            halo,
            y_start,
            y_end,
        });
    }
    Ok(out)
}

fn check_slices(global: &Mesh3D, slices: &[DomainSlice]) -> DriftResult<()> {
    if slices.is_empty() {
        return Err(DriftError::PhysicsViolation(
            "no slices provided".to_string(),
        ));
    }
    for sdef in slices {
        if sdef.global_ny != global.ny || sdef.halo != global.myg {
            return Err(DriftError::PhysicsViolation(format!(
                "slice {} built for ny={} halo={}, mesh has ny={} myg={}",
                sdef.rank, sdef.global_ny, sdef.halo, global.ny, global.myg
            )));
        }
        if sdef.y_start >= sdef.y_end || sdef.y_end > sdef.global_ny {
            return Err(DriftError::PhysicsViolation(format!(
                "invalid slice bounds y_start={} y_end={} global_ny={}",
                sdef.y_start, sdef.y_end, sdef.global_ny
            )));
        }
    }
    Ok(())
}

/// Copy each slab, including `halo` rows on either side, out of `global`.
pub fn split_with_halo(
    global: &Field3D,
    mesh: &Mesh3D,
    slices: &[DomainSlice],
) -> DriftResult<Vec<Field3D>> {
    check_slices(mesh, slices)?;
    if global.dim() != mesh.shape() {
        return Err(DriftError::ShapeMismatch {
            expected: mesh.shape(),
            found: global.dim(),
        });
    }
    let mut out = Vec::with_capacity(slices.len());
    for sdef in slices {
        // storage row y_start of the slab is global storage row y_start
        let rows = sdef.y_start..sdef.y_end + 2 * sdef.halo;
        let block = global.data().slice(s![.., rows, ..]).to_owned();
        out.push(global.like(block));
    }
    Ok(out)
}

/// Reassemble the interior rows, plus the physical ghosts of the end slabs.
pub fn stitch_without_halo(
    locals: &[Field3D],
    mesh: &Mesh3D,
    slices: &[DomainSlice],
) -> DriftResult<Field3D> {
    check_slices(mesh, slices)?;
    if locals.len() != slices.len() {
        return Err(DriftError::PhysicsViolation(format!(
            "locals/slices mismatch: {} vs {}",
            locals.len(),
            slices.len()
        )));
    }
    let mut global = locals[0].like(ndarray::Array3::zeros(mesh.shape()));
    for (local, sdef) in locals.iter().zip(slices.iter()) {
        let expected = (mesh.shape().0, sdef.local_ny + 2 * sdef.halo, mesh.nz);
        if local.dim() != expected {
            return Err(DriftError::ShapeMismatch {
                expected,
                found: local.dim(),
            });
        }
        let lo = if sdef.has_lower_neighbor() { sdef.halo } else { 0 };
        let hi = if sdef.has_upper_neighbor() {
            sdef.halo + sdef.local_ny
        } else {
            2 * sdef.halo + sdef.local_ny
        };
        global
            .data_mut()
            .slice_mut(s![.., sdef.y_start + lo..sdef.y_start + hi, ..])
            .assign(&local.data().slice(s![.., lo..hi, ..]));
    }
    Ok(global)
}

/// Exchange halo rows between neighbouring slabs held in one process.
pub fn serial_halo_exchange(locals: &mut [Field3D], slices: &[DomainSlice]) -> DriftResult<()> {
    if locals.len() != slices.len() {
        return Err(DriftError::PhysicsViolation(format!(
            "locals/slices mismatch: {} vs {}",
            locals.len(),
            slices.len()
        )));
    }
    let mut from_top = Vec::with_capacity(locals.len());
    let mut from_bottom = Vec::with_capacity(locals.len());
    for (local, sdef) in locals.iter().zip(slices.iter()) {
        let h = sdef.halo;
        if local.dim().1 != sdef.local_ny + 2 * h || sdef.local_ny < h {
            return Err(DriftError::PhysicsViolation(format!(
                "slab {} has {} rows, cannot provide {h} halo rows",
                sdef.rank,
                local.dim().1
            )));
        }
        let d = local.data();
        from_bottom.push(d.slice(s![.., h..2 * h, ..]).to_owned());
        from_top.push(d.slice(s![.., sdef.local_ny..sdef.local_ny + h, ..]).to_owned());
    }
    for (i, (local, sdef)) in locals.iter_mut().zip(slices.iter()).enumerate() {
        let h = sdef.halo;
        if sdef.has_lower_neighbor() {
            local
                .data_mut()
                .slice_mut(s![.., 0..h, ..])
                .assign(&from_top[i - 1]);
        }
        if sdef.has_upper_neighbor() {
            let top = sdef.local_ny + h;
            local
                .data_mut()
                .slice_mut(s![.., top..top + h, ..])
                .assign(&from_bottom[i + 1]);
        }
    }
    Ok(())
}

// ── Threaded Exchange ────────────────────────────────────────────────

#[derive(Debug)]
enum Message {
    Rows(Vec<Array3<f64>>),
    Value(f64),
}

/// Both directions of the channel pair to one neighbouring slab.
#[derive(Debug)]
struct Link {
    peer: usize,
    tx: Sender<Message>,
    rx: Receiver<Message>,
}

impl Link {
    fn send(&self, message: Message) -> DriftResult<()> {
        self.tx
            .send(message)
            .map_err(|_| DriftError::Communication(format!("slab {} hung up", self.peer)))
    }

    fn recv(&self) -> DriftResult<Message> {
        self.rx
            .recv()
            .map_err(|_| DriftError::Communication(format!("slab {} hung up", self.peer)))
    }

    fn recv_rows(&self, count: usize) -> DriftResult<Vec<Array3<f64>>> {
        match self.recv()? {
            Message::Rows(rows) if rows.len() == count => Ok(rows),
            other => Err(DriftError::Communication(format!(
                "expected {count} halo blocks from slab {}, got {other:?}",
                self.peer
            ))),
        }
    }

    fn recv_value(&self) -> DriftResult<f64> {
        match self.recv()? {
            Message::Value(v) => Ok(v),
            other => Err(DriftError::Communication(format!(
                "expected a reduction value from slab {}, got {other:?}",
                self.peer
            ))),
        }
    }
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// Halo exchange for one slab of a y-decomposed domain.
///
/// Every slab must issue the same sequence of collective calls; messages
/// on each link are matched in order.
#[derive(Debug)]
pub struct SlabExchange {
    slice: DomainSlice,
    lower: Option<Link>,
    upper: Option<Link>,
}

impl SlabExchange {
    pub fn slice(&self) -> &DomainSlice {
        &self.slice
    }

    fn check_rows(&self, field: &Field3D) -> DriftResult<()> {
        let rows = field.dim().1;
        if rows != self.slice.local_ny + 2 * self.slice.halo {
            return Err(DriftError::Communication(format!(
                "slab {} got '{}' with {rows} rows, expected {}",
                self.slice.rank,
                field.name(),
                self.slice.local_ny + 2 * self.slice.halo
            )));
        }
        Ok(())
    }
}

/// Connected exchanges for `slices`, one per slab, in rank order.
pub fn slab_exchanges(slices: &[DomainSlice]) -> DriftResult<Vec<SlabExchange>> {
    for (rank, sdef) in slices.iter().enumerate() {
        if sdef.rank != rank || sdef.nranks != slices.len() {
            return Err(DriftError::PhysicsViolation(format!(
                "slice {rank} claims rank {} of {}",
                sdef.rank, sdef.nranks
            )));
        }
    }
    let mut exchanges: Vec<SlabExchange> = slices
        .iter()
        .map(|sdef| SlabExchange {
            slice: sdef.clone(),
            lower: None,
            upper: None,
        })
        .collect();
    for rank in 1..exchanges.len() {
        let (up_tx, up_rx) = unbounded();
        let (down_tx, down_rx) = unbounded();
        exchanges[rank - 1].upper = Some(Link {
            peer: rank,
            tx: up_tx,
            rx: down_rx,
        });
        exchanges[rank].lower = Some(Link {
            peer: rank - 1,
            tx: down_tx,
            rx: up_rx,
        });
    }
    Ok(exchanges)
}

impl HaloExchange for SlabExchange {
    fn communicate(&self, fields: &mut [&mut Field3D]) -> DriftResult<()> {
        let h = self.slice.halo;
        let ny = self.slice.local_ny;
        let count = fields.len();
        for f in fields.iter() {
            self.check_rows(f)?;
        }
        if let Some(lower) = &self.lower {
            let rows = fields.iter().map(|f| f.data().slice(s![.., h..2 * h, ..]).to_owned());
            lower.send(Message::Rows(rows.collect()))?;
        }
        if let Some(upper) = &self.upper {
            let rows = fields.iter().map(|f| f.data().slice(s![.., ny..ny + h, ..]).to_owned());
            upper.send(Message::Rows(rows.collect()))?;
        }
        if let Some(lower) = &self.lower {
            for (f, rows) in fields.iter_mut().zip(lower.recv_rows(count)?) {
                f.data_mut().slice_mut(s![.., 0..h, ..]).assign(&rows);
            }
        }
        if let Some(upper) = &self.upper {
            for (f, rows) in fields.iter_mut().zip(upper.recv_rows(count)?) {
                f.data_mut().slice_mut(s![.., ny + h..ny + 2 * h, ..]).assign(&rows);
            }
        }
        Ok(())
    }

    fn synchronize_status(&self, status: DriftResult<()>) -> DriftResult<()> {
        let failed = self.global_max(if status.is_err() { 1.0 } else { 0.0 })?;
        match status {
            Ok(()) if failed > 0.0 => Err(DriftError::Communication(format!(
                "right-hand side failed on another slab (seen from slab {})",
                self.slice.rank
            ))),
            other => other,
        }
    }

    /// Chain reduction up to the last slab, then broadcast back down.
    fn global_max(&self, local: f64) -> DriftResult<f64> {
        let mut value = local;
        if let Some(lower) = &self.lower {
            value = nan_max(value, lower.recv_value()?);
        }
        if let Some(upper) = &self.upper {
            upper.send(Message::Value(value))?;
            value = upper.recv_value()?;
        }
        if let Some(lower) = &self.lower {
            lower.send(Message::Value(value))?;
        }
        Ok(value)
    }
}
