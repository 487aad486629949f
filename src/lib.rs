//! Monte Carlo energy deposition of charged particles in silicon sensors
//! using Bichsel's straggling model, with shell-resolved ionization and
//! electron-hole pair creation.

pub mod bank;
pub mod bounding_box;
pub mod cascade;
pub mod collision;
pub mod config;
pub mod data;
pub mod error;
pub mod geometry;
pub mod ionizer;
pub mod model;
pub mod output;
pub mod particle;
pub mod physics;
pub mod rng;
pub mod settings;
pub mod source;
pub mod stepping;
pub mod tables;
pub mod tally;
mod utilities;

pub use bounding_box::BoundingBox;
pub use collision::CollisionParameters;
pub use config::DataPaths;
pub use error::{DepositionError, Result};
pub use geometry::{BoxSensor, SensorGeometry};
pub use ionizer::{absorb_in_shell, ionize, Ionization, Shell};
pub use model::Model;
pub use output::{
    CarrierType, Cluster, DepositedCharge, EventResult, EventStats, MCParticle, Termination,
};
pub use particle::{Particle, ParticleType};
pub use rng::EventRng;
pub use settings::Settings;
pub use source::BeamSource;
pub use stepping::{DepositionEngine, EngineConfig};
pub use tables::CrossSectionTables;
pub use tally::{RunSummary, Tally};
