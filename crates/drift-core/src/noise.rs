// ─────────────────────────────────────────────────────────────────────
// SCPN Drift Core — Initial Density Noise
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! One-shot azimuthal perturbation of ln n on the first evaluation.
//!
//! Every resolved mode `1 ≤ m < nz/2` gets equal amplitude and a random
//! phase drawn from a seeded ChaCha8 stream, so a given seed always
//! reproduces the same perturbation.

use drift_types::config::{NoiseConfig, Switches};
use drift_types::field::Field3D;
use drift_types::mesh::Mesh3D;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseState {
    #[default]
    Uninitialized,
    Applied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMode {
    #[default]
    Fresh,
    Restart { noise_state: NoiseState },
}

#[derive(Debug, Clone)]
pub struct NoiseInjection {
    enabled: bool,
    amplitude: f64,
    seed: u64,
    state: NoiseState,
}

impl NoiseInjection {
    pub fn new(switches: &Switches, config: &NoiseConfig, start: StartMode) -> Self {
        let (enabled, state) = match start {
            StartMode::Fresh => (switches.include_noise, NoiseState::Uninitialized),
            StartMode::Restart { .. } if switches.include_noise && switches.force_add_noise => {
                log::info!("restart with forced noise: perturbation will be added again");
                (true, NoiseState::Uninitialized)
            }
            StartMode::Restart { noise_state } => {
                if switches.include_noise {
                    log::warn!(
                        "noise requested on restart without forceAddNoise; the restarted state is left unperturbed"
                    );
                }
                (false, noise_state)
            }
        };
        NoiseInjection {
            enabled,
            amplitude: config.amplitude,
            seed: config.seed,
            state,
        }
    }

    pub fn state(&self) -> NoiseState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True until the perturbation has been added once.
    pub fn pending(&self) -> bool {
        self.enabled && self.state == NoiseState::Uninitialized
    }

    /// `A · sin(πρ/L_x) · Σ_m cos(mθ + ϕ_m)` on the interior, zero in ghosts.
    pub fn perturbation(&self, mesh: &Mesh3D) -> Field3D {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let phases = Uniform::new(0.0, TAU);
        let modes: Vec<(f64, f64)> = (1..mesh.nz / 2)
            .map(|m| (m as f64, rng.sample(phases)))
            .collect();
        let mut out = Field3D::zeros(mesh, "noise");
        for i in mesh.xs() {
            let envelope = self.amplitude * (PI * mesh.rho[i] / mesh.lx).sin();
            for k in 0..mesh.nz {
                let theta = mesh.theta[k];
                let sum: f64 = modes.iter().map(|(m, ph)| (m * theta + ph).cos()).sum();
                for j in mesh.ys() {
                    out.set(i, j, k, envelope * sum);
                }
            }
        }
        out
    }

    /// Add the perturbation to `ln_n` if it is still pending.
    pub fn apply(&mut self, ln_n: &mut Field3D, mesh: &Mesh3D) -> bool {
        if !self.pending() {
            return false;
        }
        *ln_n += &self.perturbation(mesh);
        self.state = NoiseState::Applied;
        log::info!(
            "added azimuthal noise to {} (amplitude {:.3e}, seed {})",
            ln_n.name(),
            self.amplitude,
            self.seed
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh() -> Mesh3D {
        Mesh3D::new(8, 4, 16, 1.0, 1.0, 2, 2).unwrap()
    }

    fn switches(include: bool, force: bool) -> Switches {
        Switches {
            include_noise: include,
            force_add_noise: force,
            ..Switches::default()
        }
    }

    #[test]
    fn test_fresh_start_applies_once() {
        let m = mesh();
        let mut noise = NoiseInjection::new(&switches(true, false), &NoiseConfig::default(), StartMode::Fresh);
        let mut ln_n = Field3D::zeros(&m, "lnN");
        assert!(noise.apply(&mut ln_n, &m));
        let after_first = ln_n.clone();
        assert!(!noise.apply(&mut ln_n, &m));
        assert_eq!(ln_n, after_first);
        assert_eq!(noise.state(), NoiseState::Applied);
        assert!(ln_n.max_abs_interior(&m) > 0.0);
    }

    #[test]
    fn test_same_seed_same_perturbation() {
        let m = mesh();
        let config = NoiseConfig { amplitude: 1e-2, seed: 42 };
        let a = NoiseInjection::new(&switches(true, false), &config, StartMode::Fresh).perturbation(&m);
        let b = NoiseInjection::new(&switches(true, false), &config, StartMode::Fresh).perturbation(&m);
        assert_eq!(a, b);
        let other = NoiseConfig { amplitude: 1e-2, seed: 43 };
        let c = NoiseInjection::new(&switches(true, false), &other, StartMode::Fresh).perturbation(&m);
        assert_ne!(a, c);
    }

    #[test]
    fn test_perturbation_has_no_mean_and_zero_ghosts() {
        let m = mesh();
        let noise = NoiseInjection::new(&switches(true, false), &NoiseConfig::default(), StartMode::Fresh);
        let p = noise.perturbation(&m);
        for i in m.xs() {
            let mean: f64 = (0..m.nz).map(|k| p.get(i, 2, k)).sum::<f64>() / m.nz as f64;
            assert!(mean.abs() < 1e-15);
        }
        assert_eq!(p.get(0, 2, 3), 0.0);
        assert_eq!(p.get(m.x_first(), 0, 3), 0.0);
    }

    #[test]
    fn test_restart_without_force_disables() {
        let m = mesh();
        let start = StartMode::Restart {
            noise_state: NoiseState::Applied,
        };
        let mut noise = NoiseInjection::new(&switches(true, false), &NoiseConfig::default(), start);
        assert!(!noise.is_enabled());
        let mut ln_n = Field3D::zeros(&m, "lnN");
        assert!(!noise.apply(&mut ln_n, &m));
        assert_eq!(noise.state(), NoiseState::Applied);
    }

    #[test]
    fn test_restart_with_force_reapplies() {
        let m = mesh();
        let start = StartMode::Restart {
            noise_state: NoiseState::Applied,
        };
        let mut noise = NoiseInjection::new(&switches(true, true), &NoiseConfig::default(), start);
        assert!(noise.pending());
        let mut ln_n = Field3D::zeros(&m, "lnN");
        assert!(noise.apply(&mut ln_n, &m));
    }

    #[test]
    fn test_disabled_noise_never_applies() {
        let m = mesh();
        let mut noise = NoiseInjection::new(&switches(false, false), &NoiseConfig::default(), StartMode::Fresh);
        let mut ln_n = Field3D::constant(&m, "lnN", 0.5);
        assert!(!noise.apply(&mut ln_n, &m));
        assert_eq!(noise.state(), NoiseState::Uninitialized);
    }
}
