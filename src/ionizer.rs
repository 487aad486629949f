//! Photoabsorption of the virtual photon and relaxation of the atomic shells.
//!
//! An energy transfer `Eγ` [eV] from the tracked particle is treated as a
//! photon absorbed in one of the silicon shells. The photoelectron and every
//! Auger electron and hole produced while the vacancies relax are returned as
//! a stack of carrier energies. Shell branching follows the photoabsorption
//! data of Fraser et al.; Auger yields are from the silicon K, L1 and L2,3
//! relaxation tables.

use crate::data::silicon::{K_EDGE, L1_EDGE, L23_EDGE, VALENCE_EDGE};
use crate::data::{
    AUGER_K_CUMULATIVE, AUGER_K_ENERGIES, AUGER_L1_MM, AUGER_L23_MM, COSTER_KRONIG_L1,
    PHOTO_ENERGIES, PHOTO_K, PHOTO_L1, PHOTO_L23, PHOTO_M,
};
use crate::utilities::interpolate_left_continuous;
use rand::Rng;
use tracing::{debug, trace};

/// Absorbing shell. `Valence` includes the M shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shell {
    Valence,
    L23,
    L1,
    K,
}

impl Shell {
    /// Binding energy [eV]
    pub fn binding_energy(&self) -> f64 {
        match self {
            Shell::Valence => VALENCE_EDGE,
            Shell::L23 => L23_EDGE,
            Shell::L1 => L1_EDGE,
            Shell::K => K_EDGE,
        }
    }
}

/// Carriers produced by one photoabsorption.
///
/// `carriers` is used as a stack: the last entry is processed first.
/// `retained` is the energy that did not reach any carrier, the binding energy
/// of a vacancy left unfilled or a transfer dropped entirely. For every
/// absorption the carrier energies plus `retained` equal `Eγ`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ionization {
    pub carriers: Vec<f64>,
    pub retained: f64,
}

impl Ionization {
    pub fn is_empty(&self) -> bool {
        self.carriers.is_empty()
    }

    /// Sum of carrier energies plus retained energy
    pub fn total(&self) -> f64 {
        self.carriers.iter().sum::<f64>() + self.retained
    }
}

/// Photoabsorption of `energy_gamma` [eV] in a shell sampled from the
/// tabulated absorption probabilities
pub fn ionize<R: Rng + ?Sized>(energy_gamma: f64, rng: &mut R) -> Ionization {
    let shell = sample_shell(energy_gamma, rng);
    trace!(energy_gamma, ?shell, "photoabsorption");
    absorb_in_shell(shell, energy_gamma, rng)
}

/// Choose the absorbing shell for a photon of `energy_gamma` [eV].
///
/// Up to the L2,3 edge only the valence band can absorb and no random number
/// is consumed.
pub fn sample_shell<R: Rng + ?Sized>(energy_gamma: f64, rng: &mut R) -> Shell {
    if energy_gamma <= L23_EDGE {
        return Shell::Valence;
    }
    let probabilities = [
        interpolate_left_continuous(&PHOTO_ENERGIES, &PHOTO_M, energy_gamma),
        interpolate_left_continuous(&PHOTO_ENERGIES, &PHOTO_L23, energy_gamma),
        interpolate_left_continuous(&PHOTO_ENERGIES, &PHOTO_L1, energy_gamma),
        interpolate_left_continuous(&PHOTO_ENERGIES, &PHOTO_K, energy_gamma),
    ];
    let total: f64 = probabilities.iter().sum();
    let r = rng.gen::<f64>();
    let shells = [Shell::Valence, Shell::L23, Shell::L1, Shell::K];
    let mut cumulative = 0.0;
    for (shell, p) in shells.iter().zip(probabilities.iter()) {
        cumulative += p;
        if cumulative / total > r {
            return *shell;
        }
    }
    Shell::K
}

/// Photoabsorption of `energy_gamma` [eV] in the given shell.
///
/// If the photon cannot free an electron from `shell` nothing is produced and
/// the whole energy is retained.
pub fn absorb_in_shell<R: Rng + ?Sized>(shell: Shell, energy_gamma: f64, rng: &mut R) -> Ionization {
    let mut relaxation = Relaxation {
        out: Ionization::default(),
        rng,
    };

    if shell == Shell::Valence {
        if energy_gamma < 0.1 {
            relaxation.out.retained = energy_gamma;
            return relaxation.out;
        }
        let rv = relaxation.uniform();
        if energy_gamma < VALENCE_EDGE {
            relaxation.push(rv * energy_gamma);
            relaxation.push((1.0 - rv) * energy_gamma);
        } else {
            relaxation.push(rv * VALENCE_EDGE);
            relaxation.push(energy_gamma - rv * VALENCE_EDGE);
        }
        return relaxation.out;
    }

    let photoelectron = energy_gamma - shell.binding_energy();
    if photoelectron <= 0.0 {
        debug!(
            energy_gamma,
            ?shell,
            binding = shell.binding_energy(),
            "photoelectron with non-positive energy, dropping transfer"
        );
        relaxation.out.retained = energy_gamma;
        return relaxation.out;
    }
    relaxation.push(photoelectron);

    let raug = relaxation.uniform();
    match shell {
        Shell::L23 => {
            if raug <= AUGER_L23_MM {
                relaxation.transition(L23_EDGE);
            } else {
                relaxation.out.retained += L23_EDGE;
            }
        }
        Shell::L1 => {
            if raug <= AUGER_L1_MM {
                relaxation.transition(L1_EDGE);
            } else {
                relaxation.coster_kronig_l1();
            }
        }
        Shell::K => relaxation.relax_k(raug),
        Shell::Valence => unreachable!(),
    }
    relaxation.out
}

struct Relaxation<'a, R: Rng + ?Sized> {
    out: Ionization,
    rng: &'a mut R,
}

impl<R: Rng + ?Sized> Relaxation<'_, R> {
    fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn push(&mut self, energy: f64) {
        self.out.carriers.push(energy);
    }

    /// Draw from the density |t| on [-1, 1]
    fn triangular(&mut self) -> f64 {
        let u = self.uniform();
        if u < 0.5 {
            -(1.0 - 2.0 * u).sqrt()
        } else {
            (2.0 * u - 1.0).sqrt()
        }
    }

    /// X -> M M transition: an Auger electron and two valence holes which
    /// share the energy `e`, each staying below the valence band edge
    fn transition(&mut self, auger_energy: f64) {
        let e = (1.0 + self.triangular()) * VALENCE_EDGE;
        self.push(auger_energy - e);
        let low = (e - VALENCE_EDGE).max(0.0);
        let high = e.min(VALENCE_EDGE);
        let hole = low + (high - low) * self.uniform();
        self.push(hole);
        self.push(e - hole);
    }

    /// Auger electron of energy `auger_energy` sharing with one valence hole
    fn with_valence_hole(&mut self, auger_energy: f64) {
        let hole = VALENCE_EDGE * self.uniform();
        self.push(hole);
        self.push(auger_energy - hole);
    }

    fn fill_l23(&mut self) {
        if self.uniform() <= AUGER_L23_MM {
            self.transition(L23_EDGE);
        } else {
            self.out.retained += L23_EDGE;
        }
    }

    /// L1 -> L2,3 M, leaving an L2,3 vacancy
    fn coster_kronig_l1(&mut self) {
        self.with_valence_hole(COSTER_KRONIG_L1);
        self.fill_l23();
    }

    fn fill_l1(&mut self) {
        if self.uniform() > AUGER_L1_MM {
            self.coster_kronig_l1();
        } else {
            self.transition(L1_EDGE);
        }
    }

    fn relax_k(&mut self, raug: f64) {
        let channel = AUGER_K_CUMULATIVE
            .partition_point(|&c| c <= raug)
            .min(AUGER_K_ENERGIES.len() - 1);
        let auger = AUGER_K_ENERGIES[channel];
        match channel {
            // K M M
            7 | 8 => self.transition(auger),
            // K L23 M
            5 | 6 => {
                self.with_valence_hole(auger);
                self.fill_l23();
            }
            // K L1 M
            3 | 4 => {
                self.with_valence_hole(auger);
                self.fill_l1();
            }
            // K L23 L23
            2 => {
                self.push(auger);
                self.fill_l23();
                self.fill_l23();
            }
            // K L1 L23
            1 => {
                self.push(auger);
                self.fill_l23();
                self.fill_l1();
            }
            // K L1 L1
            _ => {
                self.push(auger);
                self.fill_l1();
                self.fill_l1();
            }
        }
    }
}
