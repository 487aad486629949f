//! Energy dependent collision parameters of a charged particle in silicon.
//!
//! The inelastic spectrum is built from the tabulated dielectric response
//! following Bichsel (Rev. Mod. Phys. 60, 663): distant transverse and
//! longitudinal excitations from the dielectric constant (Fano), the
//! transverse correction term and close collisions from the generalized
//! oscillator strength integral with the Uehling (heavy particles) or Møller
//! (electrons) factor. Elastic scattering uses a screened Rutherford cross
//! section for electrons and a radiation-length estimate for heavier
//! particles.

use crate::data::silicon::{ATOM_DENSITY, RADIATION_LENGTH, Z};
use crate::data::{BOHR_RADIUS, ELECTRON_MASS, ELEMENTARY_CHARGE_SQUARED, OSCILLATOR_FACTOR, RYDBERG};
use crate::error::{DepositionError, Result};
use crate::particle::Particle;
use crate::tables::CrossSectionTables;
use rand::Rng;
use std::f64::consts::PI;

/// Prefactor 8 pi R^2 a0^2 / m_e of the Bethe cross section [eV cm^2]
fn bethe_prefactor() -> f64 {
    8.0 * PI * RYDBERG * RYDBERG * BOHR_RADIUS * BOHR_RADIUS / ELECTRON_MASS / 1e6
}

/// Collision rates and the transfer spectrum at one kinetic energy
#[derive(Debug, Clone)]
pub struct CollisionParameters {
    /// Kinetic energy the parameters were computed for [MeV]
    pub energy: f64,
    /// Largest kinematically allowed energy transfer [eV]
    pub max_transfer: f64,
    /// Inverse inelastic mean free path [1/cm]
    pub inelastic_rate: f64,
    /// Inverse elastic mean free path [1/cm]
    pub elastic_rate: f64,
    /// Screening parameter of the elastic angular distribution
    pub screening: f64,
    /// Mean energy loss per path length [eV/cm]
    pub stopping_power: f64,
    /// Normalized running integral of the spectrum over bins `0..=last`
    cumulative: Vec<f64>,
}

/// Largest energy transfer [MeV] to a free electron
pub fn max_energy_transfer(particle: &Particle) -> f64 {
    if particle.is_electron() {
        return 0.5 * particle.energy();
    }
    let m = particle.mass();
    let g = particle.gamma();
    m * (g * g - 1.0) / (0.5 * m / ELECTRON_MASS + 0.5 * ELECTRON_MASS / m + g)
}

/// Moliere screening parameter for the current momentum.
///
/// Heavy particles get the same momentum dependence as electrons instead of
/// a fixed value of 1, which would scatter GeV hadrons through large angles.
pub fn screening_parameter(particle: &Particle) -> f64 {
    let p = particle.momentum();
    2.0 * 2.61 * Z.powf(2.0 / 3.0) / (p * p) * 1e-6
}

/// Elastic rate [1/cm] and screening for the current energy
pub fn elastic_parameters(particle: &Particle) -> (f64, f64) {
    let screening = screening_parameter(particle);
    let rate = if particle.is_electron() {
        let e = particle.energy();
        let ff = 0.5 * PI * ELEMENTARY_CHARGE_SQUARED * ELEMENTARY_CHARGE_SQUARED * Z * Z / (e * e);
        let cross_section = 2.0 * ff / (screening * (2.0 + screening));
        ATOM_DENSITY * cross_section
    } else {
        let p = particle.momentum();
        let ratio = p * p / (particle.total_energy() * particle.particle_type().charge());
        (2232.0 * RADIATION_LENGTH * ratio * ratio).min(10.0 * RADIATION_LENGTH)
    };
    (rate, screening)
}

impl CollisionParameters {
    /// Build the collision spectrum for the particle's current energy.
    ///
    /// Returns `Ok(None)` when fewer than two table bins lie below the
    /// largest allowed transfer, so no energy can be lost on the tabulated
    /// grid. A spectrum that integrates to zero means the tables are unusable
    /// and is an error.
    pub fn compute(particle: &Particle, tables: &CrossSectionTables) -> Result<Option<Self>> {
        let b2 = particle.beta_squared();
        let z = particle.particle_type().charge();
        let max_transfer = max_energy_transfer(particle) * 1e6;
        let ek_ev = particle.energy() * 1e6;
        let gamma = particle.gamma();
        let me_ev = ELECTRON_MASS * 1e6;
        let dec = z * z * ATOM_DENSITY * bethe_prefactor() / b2;

        let mut spectrum = Vec::new();
        let mut total = 0.0;
        let mut stopping_power = 0.0;
        for bin in 0..tables.bins() {
            let entry = match tables.lookup(bin) {
                Some(entry) => entry,
                None => break,
            };
            let e = entry.energy;
            if e > max_transfer {
                break;
            }

            let q1 = if e < 11.9 {
                entry.xkmn * entry.xkmn * RYDBERG
            } else if e < 100.0 {
                0.025 * 0.025 * RYDBERG
            } else {
                RYDBERG
            };
            let qmin = e * e / (2.0 * me_ev * b2);

            let transverse = if e < 11.9 && q1 < qmin {
                0.0
            } else {
                e * entry.dfde * (q1 / qmin).ln()
            };

            let epbe = (1.0 - b2 * entry.eps_real).max(1e-20);
            let longitudinal =
                e * entry.dfde * (-0.5) * (epbe * epbe + (b2 * entry.eps_imag).powi(2)).ln();

            let mut theta = (entry.eps_imag * b2 / epbe).atan();
            if theta < 0.0 {
                theta += PI;
            }
            let eps_abs2 = entry.eps_real * entry.eps_real + entry.eps_imag * entry.eps_imag;
            let correction = OSCILLATOR_FACTOR * e * e * theta * (b2 - entry.eps_real / eps_abs2);

            let uef = if particle.is_electron() {
                1.0 + (e / (ek_ev - e)).powi(2) + ((gamma - 1.0) / gamma * e / ek_ev).powi(2)
                    - (2.0 * gamma - 1.0) * e / (gamma * gamma * (ek_ev - e))
            } else {
                1.0 - e * b2 / max_transfer
            };
            let close = 2.0 * entry.oscillator_integral * uef;

            let sigma = transverse + longitudinal + correction + close;
            total += sigma * entry.width / (e * e);
            let h = sigma * dec / (e * e);
            stopping_power += h * e * entry.width;
            spectrum.push(h * entry.width);
        }

        if spectrum.len() < 2 {
            return Ok(None);
        }

        let inelastic_rate = total * dec;
        let mut cumulative = spectrum;
        let mut running = 0.0;
        for value in cumulative.iter_mut() {
            running += *value;
            *value = running;
        }
        let norm = running;
        if !(inelastic_rate > 0.0 && norm > 0.0) || !inelastic_rate.is_finite() {
            return Err(DepositionError::DegenerateCrossSection {
                particle: particle.particle_type().to_string(),
                energy_mev: particle.energy(),
            });
        }
        for value in cumulative.iter_mut() {
            *value /= norm;
        }

        let (elastic_rate, screening) = elastic_parameters(particle);
        Ok(Some(CollisionParameters {
            energy: particle.energy(),
            max_transfer,
            inelastic_rate,
            elastic_rate,
            screening,
            stopping_power,
            cumulative,
        }))
    }

    /// Refresh the elastic part after an energy loss
    pub fn update_elastic(&mut self, particle: &Particle) {
        let (rate, screening) = elastic_parameters(particle);
        self.elastic_rate = rate;
        self.screening = screening;
    }

    /// Whether a particle at `energy` [MeV] has lost more than
    /// `update_fraction` of the energy these parameters were built for
    pub fn is_outdated(&self, energy: f64, update_fraction: f64) -> bool {
        energy < (1.0 - update_fraction) * self.energy
    }

    /// Total mean free path [cm]
    pub fn mean_free_path(&self) -> f64 {
        1.0 / (self.inelastic_rate + self.elastic_rate)
    }

    /// Probability that a collision is elastic
    pub fn elastic_fraction(&self) -> f64 {
        self.elastic_rate * self.mean_free_path()
    }

    /// Index of the highest bin in the spectrum
    pub fn last_bin(&self) -> usize {
        self.cumulative.len() - 1
    }

    /// Sample an energy transfer [eV] by inverting the running integral and
    /// spreading uniformly within the selected bin
    pub fn sample_transfer<R: Rng + ?Sized>(&self, tables: &CrossSectionTables, rng: &mut R) -> f64 {
        let energies = tables.energies();
        let last = self.last_bin();
        let yr = rng.gen::<f64>();
        let bin = (1 + self.cumulative[1..=last].partition_point(|&c| c <= yr)).min(last);
        let low = energies[bin - 1];
        let high = energies[bin];
        low + (high - low) * rng.gen::<f64>()
    }
}
