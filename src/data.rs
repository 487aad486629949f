// src/data.rs
// Physical constants, silicon properties and the static tables used by the
// shell ionization model. Doc comments summarize each table; the literals are
// the canonical values (Fraser et al. photoabsorption branching, Auger yields).
use once_cell::sync::Lazy;

/// Electron rest mass [MeV]
pub const ELECTRON_MASS: f64 = 0.51099906;
/// Rydberg energy [eV]
pub const RYDBERG: f64 = 13.6056981;
/// Bohr radius [cm]
pub const BOHR_RADIUS: f64 = 0.529177e-8;
/// Avogadro constant [1/mol]
pub const AVOGADRO: f64 = 6.0221367e23;
/// e^2 [MeV cm]
pub const ELEMENTARY_CHARGE_SQUARED: f64 = 14.4e-14;
/// Speed of light [mm/ns]
pub const SPEED_OF_LIGHT: f64 = 299.792458;
/// Converts Im(-1/epsilon) into df/dE per eV: 2 / (pi * E_plasma^2) for silicon
pub const OSCILLATOR_FACTOR: f64 = 0.0092456;

/// Silicon target properties
pub mod silicon {
    /// Atomic number
    pub const Z: f64 = 14.0;
    /// Atomic weight [g/mol]
    pub const A: f64 = 28.086;
    /// Density [g/cm^3]
    pub const DENSITY: f64 = 2.329;
    /// Radiation length [cm]
    pub const RADIATION_LENGTH: f64 = 9.36;
    /// Atoms per cm^3
    pub const ATOM_DENSITY: f64 = super::AVOGADRO * DENSITY / A;
    /// Optical phonon energy [eV]
    pub const PHONON_ENERGY: f64 = 0.063;
    /// Impact ionization strength relative to phonon emission (Alig)
    pub const ALIG_CONSTANT: f64 = 5.2;
    /// Mean energy per electron-hole pair [eV]
    pub const PAIR_CREATION_ENERGY: f64 = 3.645;
    /// Top of the valence band relative to the bottom [eV]
    pub const VALENCE_EDGE: f64 = 12.0;
    /// L2,3 shell binding energy [eV]
    pub const L23_EDGE: f64 = 99.2;
    /// L1 shell binding energy [eV]
    pub const L1_EDGE: f64 = 148.7;
    /// K shell binding energy [eV]
    pub const K_EDGE: f64 = 1839.0;

    /// Band gap [eV] at temperature `t` [K], Varshni parametrisation
    pub fn band_gap(t: f64) -> f64 {
        1.17 - 4.73e-4 * t * t / (t + 636.0)
    }

    /// Minimum energy for impact ionization [eV].
    ///
    /// Only the 0 K gap is scaled by 1.5; the temperature shift of the
    /// Varshni term enters unscaled.
    pub fn ionization_threshold(t: f64) -> f64 {
        1.5 * 1.17 - 4.73e-4 * t * t / (t + 636.0)
    }
}

/// Bins per factor two in energy
pub const BINS_PER_OCTAVE: usize = 64;
/// Number of energy bins in the collision tables
pub const ENERGY_BINS: usize = 1250;
/// EMERC overrides the low-energy bins only
pub const EMERC_ROWS: usize = 200;

/// Logarithmic energy grid shared by all tables.
///
/// The lowest energy is chosen so that a bin edge falls exactly on the silicon
/// K edge: `E_min = 1839 / 2^(ken / 64)` where `ken` is the number of bins
/// between 1.5 eV and the edge.
#[derive(Debug, Clone)]
pub struct EnergyGrid {
    /// Bin energies [eV]
    pub energies: Vec<f64>,
    /// Bin widths [eV]
    pub widths: Vec<f64>,
}

impl EnergyGrid {
    fn new() -> Self {
        let u = std::f64::consts::LN_2 / BINS_PER_OCTAVE as f64;
        let um = u.exp();
        let ken = ((silicon::K_EDGE / 1.5).ln() / u) as usize;
        let e_min = silicon::K_EDGE / 2f64.powi((ken / BINS_PER_OCTAVE) as i32);

        let mut energies = Vec::with_capacity(ENERGY_BINS);
        let mut energy = e_min;
        for _ in 0..ENERGY_BINS {
            energies.push(energy);
            energy *= um;
        }
        let widths = energies.iter().map(|e| e * (um - 1.0)).collect();
        EnergyGrid { energies, widths }
    }

    /// Index of the bin whose energy is closest to `energy` from below
    pub fn bin_of(&self, energy: f64) -> Option<usize> {
        let idx = self.energies.partition_point(|&e| e <= energy);
        idx.checked_sub(1)
    }
}

pub static ENERGY_GRID: Lazy<EnergyGrid> = Lazy::new(EnergyGrid::new);

/// Photon energies [eV] at which the shell absorption probabilities are tabulated
pub const PHOTO_ENERGIES: [f64; 14] = [
    0.0, 40.0, 50.0, 99.2, 99.2, 148.7, 148.7, 150.0, 300.0, 500.0, 1000.0, 1839.0, 1839.0, 2000.0,
];
/// Probability of absorption in the M shell (valence band)
pub const PHOTO_M: [f64; 14] = [
    0.0, 1.0, 1.0, 1.0, 0.03, 0.03, 0.02, 0.02, 0.02, 0.02, 0.03, 0.05, 0.0, 0.0,
];
/// Probability of absorption in the L2,3 shell
pub const PHOTO_L23: [f64; 14] = [
    0.0, 0.0, 0.0, 0.0, 0.97, 0.92, 0.88, 0.88, 0.83, 0.70, 0.55, 0.39, 0.0, 0.0,
];
/// Probability of absorption in the L1 shell
pub const PHOTO_L1: [f64; 14] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.1, 0.1, 0.15, 0.28, 0.42, 0.56, 0.08, 0.08,
];
/// Probability of absorption in the K shell
pub const PHOTO_K: [f64; 14] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.92, 0.92,
];

/// Auger electron energies [eV] for the nine K vacancy channels
pub const AUGER_K_ENERGIES: [f64; 9] = [
    1541.6, 1591.1, 1640.6, 1690.3, 1690.3, 1739.8, 1739.8, 1839.0, 1839.0,
];
/// Branching ratios of the nine K vacancy channels
pub const AUGER_K_PROBABILITIES: [f64; 9] = [
    0.1920, 0.3885, 0.2325, 0.0720, 0.0030, 0.1000, 0.0040, 0.0070, 0.0010,
];
/// Probability that an L1 vacancy decays by an L1 -> M M transition
pub const AUGER_L1_MM: f64 = 0.025;
/// Auger energy of the L1 -> L23 M Coster-Kronig electron [eV]
pub const COSTER_KRONIG_L1: f64 = 49.5;
/// Probability that an L23 vacancy decays by an L23 -> M M transition
pub const AUGER_L23_MM: f64 = 0.999;

/// Cumulative K channel probabilities
pub static AUGER_K_CUMULATIVE: Lazy<[f64; 9]> = Lazy::new(|| {
    let mut cumulative = [0.0; 9];
    let mut sum = 0.0;
    for (c, p) in cumulative.iter_mut().zip(AUGER_K_PROBABILITIES.iter()) {
        sum += p;
        *c = sum;
    }
    cumulative
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_grid_lands_on_k_edge() {
        let grid = &*ENERGY_GRID;
        assert_eq!(grid.energies.len(), ENERGY_BINS);
        let hit = grid
            .energies
            .iter()
            .any(|e| (e - silicon::K_EDGE).abs() < 1e-6);
        assert!(hit, "no bin energy at the K edge");
        assert!((grid.energies[0] - 1839.0 / 1024.0).abs() < 1e-12);
    }

    #[test]
    fn test_energy_grid_octaves() {
        let grid = &*ENERGY_GRID;
        let ratio = grid.energies[BINS_PER_OCTAVE] / grid.energies[0];
        assert!((ratio - 2.0).abs() < 1e-9);
        for (e, w) in grid.energies.windows(2).zip(grid.widths.iter()) {
            assert!((e[1] - e[0] - w).abs() < 1e-9 * e[1]);
        }
    }

    #[test]
    fn test_bin_of() {
        let grid = &*ENERGY_GRID;
        assert_eq!(grid.bin_of(0.5), None);
        assert_eq!(grid.bin_of(grid.energies[10]), Some(10));
        assert_eq!(grid.bin_of(grid.energies[10] * 1.001), Some(10));
    }

    #[test]
    fn test_auger_k_cumulative_is_normalized() {
        assert!((AUGER_K_CUMULATIVE[8] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_at_room_temperature() {
        let thr = silicon::ionization_threshold(293.15);
        assert!((thr - 1.71125).abs() < 1e-5, "threshold {}", thr);
        // the temperature shift is the same as the band gap's
        let shift = silicon::ionization_threshold(0.0) - thr;
        assert!((shift - (silicon::band_gap(0.0) - silicon::band_gap(293.15))).abs() < 1e-12);
    }
}
