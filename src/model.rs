use crate::config::DataPaths;
use crate::error::Result;
use crate::geometry::SensorGeometry;
use crate::output::EventResult;
use crate::particle::Particle;
use crate::rng::EventRng;
use crate::settings::Settings;
use crate::stepping::{DepositionEngine, EngineConfig};
use crate::tables::CrossSectionTables;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// A configured simulation: collision tables, sensor and run settings.
///
/// The tables and the geometry are shared read-only between events, every
/// event gets its own generator seeded from the run seed and the event
/// number, so a run gives the same results whether its events are processed
/// one by one or in parallel.
pub struct Model {
    tables: Arc<CrossSectionTables>,
    geometry: Arc<dyn SensorGeometry + Send + Sync>,
    settings: Settings,
    seed: u64,
}

impl Model {
    pub fn new(
        tables: Arc<CrossSectionTables>,
        geometry: Arc<dyn SensorGeometry + Send + Sync>,
        settings: Settings,
    ) -> Result<Self> {
        settings.validate()?;
        let seed = match settings.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u64>();
                info!(seed, "no seed configured, drew a random one");
                seed
            }
        };
        Ok(Model {
            tables,
            geometry,
            settings,
            seed,
        })
    }

    /// Load the collision tables from the configured data paths and the
    /// environment defaults
    pub fn from_settings(
        settings: Settings,
        geometry: Arc<dyn SensorGeometry + Send + Sync>,
    ) -> Result<Self> {
        settings.validate()?;
        let paths = DataPaths::with_defaults(&settings.data_paths);
        let tables = CrossSectionTables::load(&paths)?;
        Self::new(Arc::new(tables), geometry, settings)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tables(&self) -> &Arc<CrossSectionTables> {
        &self.tables
    }

    /// Seed in effect for this run
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Simulate event number `event`
    pub fn run_event(&self, event: u64) -> Result<EventResult> {
        let mut rng = EventRng::for_event(self.seed, event);
        let sampled = self.settings.source.sample(&mut rng);
        let geometry: &dyn SensorGeometry = self.geometry.as_ref();

        // Without a configured start the beam comes in from outside, aimed at the centre
        let origin = sampled.position.unwrap_or_else(|| {
            geometry.sensor_center() - sampled.direction * (geometry.sensor_size().norm() + 1.0)
        });
        let Some(distance) = geometry.entry_distance(&origin, &sampled.direction) else {
            debug!(event, "primary misses the sensor");
            return Ok(EventResult::empty(event));
        };

        let primary = Particle::new(
            sampled.energy,
            origin + sampled.direction * distance,
            sampled.direction,
            sampled.particle_type,
            0.0,
            None,
        );
        let time_offset = if primary.velocity() > 0.0 {
            distance / primary.velocity()
        } else {
            0.0
        };

        let engine = DepositionEngine::new(&self.tables, geometry, EngineConfig::from(&self.settings));
        let mut record = engine.transport(primary, &mut rng)?;
        record.time_offset = time_offset;
        let result = record.into_result(event, geometry)?;

        info!(
            event,
            particles = result.mc_particles.len(),
            clusters = result.stats.clusters,
            pairs = result.stats.pairs,
            energy_loss_kev = result.stats.energy_loss * 1e-3,
            "event finished"
        );
        Ok(result)
    }

    /// Simulate all configured events, in parallel, returned in event order
    pub fn run(&self) -> Result<Vec<EventResult>> {
        info!(
            events = self.settings.events,
            seed = self.seed,
            particle = %self.settings.source.particle_type,
            energy_mev = self.settings.source.energy,
            fast = self.settings.fast,
            "starting run"
        );
        (0..self.settings.events)
            .into_par_iter()
            .map(|event| self.run_event(event))
            .collect()
    }
}
