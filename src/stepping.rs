//! Event-by-event stepping of charged particles through the sensor.
//!
//! A primary and all the delta rays it knocks out are tracked one at a time
//! from a LIFO work stack. Between collisions the particle flies in a straight
//! line; each collision is either elastic (direction change only) or
//! inelastic, in which case the transferred energy is handed to the shell
//! ionizer and the resulting carriers are converted into electron-hole pairs.

use crate::bank::{BankedParticle, ParticleBank};
use crate::cascade::{poisson_pairs, CarrierCascade};
use crate::collision::CollisionParameters;
use crate::error::Result;
use crate::geometry::SensorGeometry;
use crate::ionizer::ionize;
use crate::output::{Cluster, EventRecord, EventStats, Termination};
use crate::particle::{Particle, ParticleType};
use crate::physics::{sample_delta_direction, sample_elastic_direction};
use crate::settings::Settings;
use crate::tables::CrossSectionTables;
use rand::Rng;
use tracing::{debug, trace};

/// Kinetic energy [MeV] below which a particle counts as stopped
const MIN_ENERGY: f64 = 1e-6;

/// Tracking parameters taken from the run settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Carriers above this energy [MeV] become tracked delta rays
    pub delta_energy_cut: f64,
    /// Smallest transfer that ionizes [eV]
    pub energy_threshold: f64,
    /// Mean energy per pair in fast mode [eV]
    pub pair_creation_energy: f64,
    /// Relative energy loss that triggers a new collision spectrum
    pub update_fraction: f64,
    /// Poisson pair statistics instead of the carrier cascade
    pub fast: bool,
}

impl From<&Settings> for EngineConfig {
    fn from(settings: &Settings) -> Self {
        EngineConfig {
            delta_energy_cut: settings.delta_energy_cut,
            energy_threshold: settings.energy_threshold(),
            pair_creation_energy: settings.pair_creation_energy,
            update_fraction: settings.update_fraction,
            fast: settings.fast,
        }
    }
}

/// Transports one event worth of particles through a sensor
pub struct DepositionEngine<'a> {
    tables: &'a CrossSectionTables,
    geometry: &'a dyn SensorGeometry,
    config: EngineConfig,
    cascade: CarrierCascade,
}

/// Outcome of a single inelastic collision
struct Collision {
    transfer: f64,
    forced: bool,
}

impl<'a> DepositionEngine<'a> {
    pub fn new(
        tables: &'a CrossSectionTables,
        geometry: &'a dyn SensorGeometry,
        config: EngineConfig,
    ) -> Self {
        DepositionEngine {
            tables,
            geometry,
            config,
            cascade: CarrierCascade::new(config.energy_threshold),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Track `primary` and every secondary it produces until the work stack
    /// is empty. The primary must already be inside the sensor.
    pub fn transport<R: Rng + ?Sized>(&self, primary: Particle, rng: &mut R) -> Result<EventRecord> {
        let mut record = EventRecord::default();
        let mut bank = ParticleBank::new();

        let id = record.history.register(&primary);
        bank.add_source_particle(id, primary);

        while let Some(BankedParticle { id, particle }) = bank.pop_particle() {
            debug!(
                "tracking particle {} ({}, {:.6} MeV, parent {:?})",
                id,
                particle.particle_type(),
                particle.energy(),
                particle.parent()
            );
            let (particle, termination) = self.track(id, particle, &mut record, &mut bank, rng)?;
            debug!(
                "particle {} {:?} at {:?} with {:.6} MeV",
                id,
                termination,
                particle.position(),
                particle.energy()
            );
            record.history.finish(id, &particle, termination)?;
        }

        Ok(record)
    }

    /// Follow one particle until it stops, is absorbed or leaves the sensor
    fn track<R: Rng + ?Sized>(
        &self,
        id: usize,
        mut particle: Particle,
        record: &mut EventRecord,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Result<(Particle, Termination)> {
        let mut cache = ParameterCache::new(self.config.update_fraction);

        loop {
            if cache.refresh(&particle, self.tables)? {
                record.stats.updates += 1;
            }
            let Some(current) = cache.current() else {
                return Ok((particle, Termination::Stopped));
            };

            let mean_free_path = current.mean_free_path();
            let step = -(1.0 - rng.gen::<f64>()).ln() * mean_free_path * 10.0;
            particle.step(step);
            record.stats.steps += 1;

            if !self.geometry.is_within_sensor(particle.position()) {
                return Ok((particle, Termination::Escaped));
            }

            if rng.gen::<f64>() > current.elastic_fraction() {
                record.stats.inelastic += 1;
                let collision = self.sample_collision(&particle, current, rng);
                self.deposit(id, &particle, collision.transfer, record, bank, rng);

                if collision.forced {
                    particle.set_energy(0.0);
                } else {
                    particle.set_energy(particle.energy() - collision.transfer * 1e-6);
                }
                trace!(
                    "inelastic: {:.3} eV at {:?}, {:.6} MeV left",
                    collision.transfer,
                    particle.position(),
                    particle.energy()
                );
                if particle.energy() < MIN_ENERGY || collision.forced {
                    return Ok((particle, Termination::Absorbed));
                }
                if particle.is_electron() {
                    current.update_elastic(&particle);
                }
            } else {
                record.stats.elastic += 1;
                let direction = sample_elastic_direction(particle.direction(), current.screening, rng);
                particle.set_direction(direction);
                trace!("elastic at {:?}", particle.position());
            }
        }
    }

    /// Draw the energy transfer of an inelastic collision, clamping it to the
    /// full kinetic energy when the remainder would drop below the delta cut
    fn sample_collision<R: Rng + ?Sized>(
        &self,
        particle: &Particle,
        parameters: &CollisionParameters,
        rng: &mut R,
    ) -> Collision {
        let transfer = parameters.sample_transfer(self.tables, rng);
        let residual = particle.energy() - transfer * 1e-6;
        if residual < self.config.delta_energy_cut {
            Collision {
                transfer: particle.energy() * 1e6,
                forced: true,
            }
        } else {
            Collision {
                transfer,
                forced: false,
            }
        }
    }

    /// Turn an energy transfer [eV] into carriers, delta rays and a cluster
    fn deposit<R: Rng + ?Sized>(
        &self,
        id: usize,
        particle: &Particle,
        transfer: f64,
        record: &mut EventRecord,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) {
        let stats = &mut record.stats;
        stats.energy_loss += transfer;
        let delta_direction = sample_delta_direction(particle.direction(), transfer, particle.energy(), rng);

        if transfer <= self.config.energy_threshold {
            stats.subthreshold += transfer;
            return;
        }

        let ionization = ionize(transfer, rng);
        stats.retained += ionization.retained;

        let delta_cut = self.config.delta_energy_cut * 1e6;
        let mut thermal = Vec::with_capacity(ionization.carriers.len());
        for &carrier in ionization.carriers.iter().rev() {
            if carrier > delta_cut {
                let delta = Particle::new(
                    carrier * 1e-6,
                    *particle.position(),
                    delta_direction,
                    ParticleType::Electron,
                    particle.time(),
                    Some(id),
                );
                let delta_id = record.history.register(&delta);
                trace!("delta ray {} with {:.1} eV from particle {}", delta_id, carrier, id);
                bank.bank_secondary(delta_id, delta);
                stats.deltas += 1;
                stats.energy_loss -= carrier;
            } else {
                stats.deposited += carrier;
                thermal.push(carrier);
            }
        }

        let energy: f64 = thermal.iter().sum();
        let pairs = if self.config.fast {
            poisson_pairs(energy, self.config.pair_creation_energy, rng)
        } else {
            self.cascade.pairs(&thermal, rng)
        };
        if pairs > 0 {
            record_cluster(
                &mut record.clusters,
                &mut record.stats,
                Cluster {
                    pairs,
                    position: *particle.position(),
                    time: particle.time(),
                    particle: id,
                    energy,
                },
            );
        }
    }
}

/// Collision parameters of the tracked particle, rebuilt once its energy has
/// dropped by more than `update_fraction` since the last build
struct ParameterCache {
    parameters: Option<CollisionParameters>,
    update_fraction: f64,
    built: bool,
}

impl ParameterCache {
    fn new(update_fraction: f64) -> Self {
        ParameterCache {
            parameters: None,
            update_fraction,
            built: false,
        }
    }

    /// Rebuild the parameters if needed, returns whether they were rebuilt
    fn refresh(&mut self, particle: &Particle, tables: &CrossSectionTables) -> Result<bool> {
        let outdated = match &self.parameters {
            None => !self.built,
            Some(p) => p.is_outdated(particle.energy(), self.update_fraction),
        };
        if !outdated {
            return Ok(false);
        }
        self.parameters = CollisionParameters::compute(particle, tables)?;
        self.built = true;
        if let Some(p) = &self.parameters {
            debug!(
                "collision parameters at {:.6} MeV: inelastic mfp {:.4} um, elastic mfp {:.4} um, dE/dx {:.2} eV/um",
                p.energy,
                1e4 / p.inelastic_rate,
                1e4 / p.elastic_rate,
                p.stopping_power * 1e-4
            );
        }
        Ok(true)
    }

    /// `None` once the particle is too slow to lose energy on the table grid
    fn current(&mut self) -> Option<&mut CollisionParameters> {
        self.parameters.as_mut()
    }
}

fn record_cluster(clusters: &mut Vec<Cluster>, stats: &mut EventStats, cluster: Cluster) {
    stats.clusters += 1;
    stats.pairs += cluster.pairs;
    stats.pairs_squared += cluster.pairs * cluster.pairs;
    clusters.push(cluster);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EMERC_ROWS, ENERGY_BINS, ENERGY_GRID};
    use crate::geometry::BoxSensor;
    use nalgebra::{Point3, Vector3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    /// Tables without any dielectric response: only close collisions with
    /// a constant oscillator strength integral remain
    fn free_electron_tables() -> CrossSectionTables {
        let grid = &*ENERGY_GRID;
        let mut heps = format!("64 {}\n", ENERGY_BINS);
        let mut macom = format!("64 {}\n", ENERGY_BINS);
        let mut emerc = String::from("EMERC\nfree electrons\n\n j E AE XKMN\n");
        for j in 0..ENERGY_BINS {
            let e = grid.energies[j];
            heps += &format!("{} {:.8e} 1.0 0.0 0.0\n", j + 1, e);
            macom += &format!("{} {:.8e} 1.0\n", j + 1, e);
            if j < EMERC_ROWS {
                emerc += &format!("{} {:.8e} 1.0 0.025\n", j + 1, e);
            }
        }
        CrossSectionTables::from_readers(Cursor::new(heps), Cursor::new(macom), Cursor::new(emerc))
            .unwrap()
    }

    fn electron(energy: f64) -> Particle {
        Particle::new(energy, Point3::origin(), Vector3::z(), ParticleType::Electron, 0.0, None)
    }

    fn config(update_fraction: f64) -> EngineConfig {
        EngineConfig {
            delta_energy_cut: 0.009,
            energy_threshold: 1.71125,
            pair_creation_energy: 3.645,
            update_fraction,
            fast: true,
        }
    }

    #[test]
    fn test_parameters_kept_until_energy_drops() {
        let tables = free_electron_tables();
        let mut particle = electron(0.05);
        let mut cache = ParameterCache::new(0.1);

        assert!(cache.refresh(&particle, &tables).unwrap());
        assert_eq!(cache.current().unwrap().energy, 0.05);

        particle.set_energy(0.0451);
        assert!(!cache.refresh(&particle, &tables).unwrap());
        assert_eq!(cache.current().unwrap().energy, 0.05);

        particle.set_energy(0.0449);
        assert!(cache.refresh(&particle, &tables).unwrap());
        assert_eq!(cache.current().unwrap().energy, 0.0449);
        assert!(!cache.refresh(&particle, &tables).unwrap());
    }

    #[test]
    fn test_larger_update_fraction_keeps_parameters_longer() {
        let tables = free_electron_tables();
        let mut particle = electron(0.05);
        let mut cache = ParameterCache::new(0.5);
        assert!(cache.refresh(&particle, &tables).unwrap());

        particle.set_energy(0.0449);
        assert!(!cache.refresh(&particle, &tables).unwrap());
        particle.set_energy(0.0249);
        assert!(cache.refresh(&particle, &tables).unwrap());
        assert_eq!(cache.current().unwrap().energy, 0.0249);
    }

    #[test]
    fn test_too_slow_particle_has_no_parameters() {
        let tables = free_electron_tables();
        let mut cache = ParameterCache::new(0.1);
        assert!(cache.refresh(&electron(3e-6), &tables).unwrap());
        assert!(cache.current().is_none());
        assert!(!cache.refresh(&electron(3e-6), &tables).unwrap());
    }

    #[test]
    fn test_update_fraction_sets_number_of_rebuilds() {
        let tables = free_electron_tables();
        let sensor = BoxSensor::new(Vector3::new(1000.0, 1000.0, 1000.0)).unwrap();

        let rebuilds = |update_fraction: f64| {
            let engine = DepositionEngine::new(&tables, &sensor, config(update_fraction));
            let mut rng = StdRng::seed_from_u64(21);
            let mut total = 0;
            for _ in 0..10 {
                let record = engine.transport(electron(0.05), &mut rng).unwrap();
                // every tracked particle builds its parameters at least once
                assert!(record.stats.updates >= record.stats.deltas + 1);
                total += record.stats.updates;
            }
            total
        };

        let fine = rebuilds(0.1);
        let coarse = rebuilds(0.5);
        // 50 keV down to the 9 keV cut: about 16 rebuilds per electron at
        // 10%, about 3 at 50%
        assert!(fine > 80, "{} rebuilds at 10%", fine);
        assert!(fine > 2 * coarse, "{} rebuilds at 10%, {} at 50%", fine, coarse);
    }
}
