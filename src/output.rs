//! Event output: clusters, Monte Carlo truth particles and deposited charges.
//!
//! While an event is tracked every particle gets a slot in a
//! [`ParticleHistory`] the moment it is created, so parents always have a
//! smaller index than their children. Once the work stack is empty the slots
//! are frozen into [`MCParticle`] records and parent links are checked in a
//! second pass.

use crate::error::{DepositionError, Result};
use crate::geometry::SensorGeometry;
use crate::particle::{Particle, ParticleType};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Sign of a charge carrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarrierType {
    Electron,
    Hole,
}

impl CarrierType {
    pub fn sign(&self) -> i32 {
        match self {
            CarrierType::Electron => -1,
            CarrierType::Hole => 1,
        }
    }
}

/// Why tracking of a particle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Kinetic energy used up inside the sensor
    Absorbed,
    /// Stepped out of the sensitive volume
    Escaped,
    /// Energy too low for any tabulated energy transfer
    Stopped,
}

/// Electron-hole pairs created at one inelastic collision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub pairs: u64,
    /// Local position [mm]
    pub position: Point3<f64>,
    /// Local time [ns]
    pub time: f64,
    /// Index of the generating particle in the event's particle list
    pub particle: usize,
    /// Energy of the carriers that thermalized here [eV]
    pub energy: f64,
}

/// Monte Carlo truth record of a tracked particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MCParticle {
    pub local_start: Point3<f64>,
    pub local_end: Point3<f64>,
    pub global_start: Point3<f64>,
    pub global_end: Point3<f64>,
    pub particle_type: ParticleType,
    pub pdg_code: i32,
    /// Creation time in the sensor clock [ns]
    pub local_time: f64,
    /// Creation time in the event clock [ns]
    pub global_time: f64,
    /// Kinetic energy at creation [MeV]
    pub initial_energy: f64,
    /// Kinetic energy when tracking ended [MeV]
    pub final_energy: f64,
    pub termination: Termination,
    pub parent: Option<usize>,
}

impl MCParticle {
    pub fn is_primary(&self) -> bool {
        self.parent.is_none()
    }
}

/// One carrier species of a cluster, handed to charge propagation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositedCharge {
    pub local_position: Point3<f64>,
    pub global_position: Point3<f64>,
    pub carrier: CarrierType,
    pub charge: u64,
    pub local_time: f64,
    pub global_time: f64,
    /// Index into [`EventResult::mc_particles`]
    pub mc_particle: usize,
}

/// Counters collected while an event is tracked
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
    pub steps: u64,
    /// Collision spectra computed, at least one per tracked particle
    #[serde(default)]
    pub updates: u64,
    pub elastic: u64,
    pub inelastic: u64,
    pub deltas: u64,
    pub clusters: u64,
    pub pairs: u64,
    /// Sum of squared pair counts per cluster
    pub pairs_squared: u64,
    /// Energy transferred in collisions minus the energy handed to delta rays [eV]
    pub energy_loss: f64,
    /// Energy of carriers below the delta-ray cut [eV]
    pub deposited: f64,
    /// Binding energy of unfilled vacancies and dropped transfers [eV]
    pub retained: f64,
    /// Transfers below the ionization threshold [eV]
    pub subthreshold: f64,
}

impl EventStats {
    /// Energy loss not accounted for by deposition, retention or
    /// sub-threshold transfers [eV]
    pub fn energy_balance(&self) -> f64 {
        self.energy_loss - self.deposited - self.retained - self.subthreshold
    }
}

#[derive(Debug, Clone)]
struct HistorySlot {
    particle_type: ParticleType,
    start: Point3<f64>,
    time: f64,
    initial_energy: f64,
    parent: Option<usize>,
    end: Option<(Point3<f64>, f64, Termination)>,
}

/// Arena of all particles created in an event
#[derive(Debug, Clone, Default)]
pub struct ParticleHistory {
    slots: Vec<HistorySlot>,
}

impl ParticleHistory {
    pub fn new() -> Self {
        ParticleHistory { slots: Vec::new() }
    }

    /// Reserve a slot for a newly created particle and return its index
    pub fn register(&mut self, particle: &Particle) -> usize {
        self.slots.push(HistorySlot {
            particle_type: particle.particle_type(),
            start: *particle.position_start(),
            time: particle.time(),
            initial_energy: particle.energy(),
            parent: particle.parent(),
            end: None,
        });
        self.slots.len() - 1
    }

    /// Record the final state of particle `id`
    pub fn finish(&mut self, id: usize, particle: &Particle, termination: Termination) -> Result<()> {
        let slot = self.slots.get_mut(id).ok_or_else(|| {
            DepositionError::ParticleHistory(format!("finishing unknown particle {}", id))
        })?;
        if slot.end.is_some() {
            return Err(DepositionError::ParticleHistory(format!(
                "particle {} finished twice",
                id
            )));
        }
        slot.end = Some((*particle.position(), particle.energy(), termination));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Freeze the arena into truth records, validating parent links
    pub fn into_mc_particles(
        self,
        geometry: &dyn SensorGeometry,
        time_offset: f64,
    ) -> Result<Vec<MCParticle>> {
        let mut particles = Vec::with_capacity(self.slots.len());
        for (id, slot) in self.slots.into_iter().enumerate() {
            if let Some(parent) = slot.parent {
                if parent >= id {
                    return Err(DepositionError::ParticleHistory(format!(
                        "particle {} refers to parent {} which was not created before it",
                        id, parent
                    )));
                }
            }
            let (end, final_energy, termination) = slot.end.ok_or_else(|| {
                DepositionError::ParticleHistory(format!("particle {} was never finished", id))
            })?;
            particles.push(MCParticle {
                local_start: slot.start,
                local_end: end,
                global_start: geometry.to_global(&slot.start),
                global_end: geometry.to_global(&end),
                particle_type: slot.particle_type,
                pdg_code: slot.particle_type.pdg_code(),
                local_time: slot.time,
                global_time: slot.time + time_offset,
                initial_energy: slot.initial_energy,
                final_energy,
                termination,
                parent: slot.parent,
            });
        }
        Ok(particles)
    }
}

/// Everything the stepping engine produced for one event, before aggregation
#[derive(Debug, Clone, Default)]
pub struct EventRecord {
    pub history: ParticleHistory,
    pub clusters: Vec<Cluster>,
    pub stats: EventStats,
    /// Time between the event start and the primary entering the sensor [ns]
    pub time_offset: f64,
}

/// Output of one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResult {
    pub event: u64,
    pub mc_particles: Vec<MCParticle>,
    pub clusters: Vec<Cluster>,
    pub deposited_charges: Vec<DepositedCharge>,
    pub stats: EventStats,
}

impl EventResult {
    /// Event in which the beam missed the sensor
    pub fn empty(event: u64) -> Self {
        EventResult {
            event,
            mc_particles: Vec::new(),
            clusters: Vec::new(),
            deposited_charges: Vec::new(),
            stats: EventStats::default(),
        }
    }

    pub fn total_pairs(&self) -> u64 {
        self.clusters.iter().map(|c| c.pairs).sum()
    }

    pub fn primary(&self) -> Option<&MCParticle> {
        self.mc_particles.iter().find(|p| p.is_primary())
    }
}

impl EventRecord {
    /// Resolve the particle history and split every cluster into an electron
    /// and a hole deposit
    pub fn into_result(self, event: u64, geometry: &dyn SensorGeometry) -> Result<EventResult> {
        let time_offset = self.time_offset;
        let mc_particles = self.history.into_mc_particles(geometry, time_offset)?;

        let mut deposited_charges = Vec::with_capacity(2 * self.clusters.len());
        for cluster in &self.clusters {
            if cluster.particle >= mc_particles.len() {
                return Err(DepositionError::ParticleHistory(format!(
                    "cluster refers to unknown particle {}",
                    cluster.particle
                )));
            }
            let global_position = geometry.to_global(&cluster.position);
            for carrier in [CarrierType::Electron, CarrierType::Hole] {
                deposited_charges.push(DepositedCharge {
                    local_position: cluster.position,
                    global_position,
                    carrier,
                    charge: cluster.pairs,
                    local_time: cluster.time,
                    global_time: cluster.time + time_offset,
                    mc_particle: cluster.particle,
                });
            }
        }

        Ok(EventResult {
            event,
            mc_particles,
            clusters: self.clusters,
            deposited_charges,
            stats: self.stats,
        })
    }
}
