use crate::data::silicon;
use crate::error::{DepositionError, Result};
use crate::source::BeamSource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Run configuration, loadable from JSON.
///
/// Energies of particles are in MeV, carrier energies in eV and the
/// temperature in K. Every key except `source.energy` has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_events")]
    pub events: u64,
    /// Run seed; a random one is drawn and logged when absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Poisson pair statistics instead of the explicit carrier cascade
    #[serde(default = "default_fast")]
    pub fast: bool,
    /// Carriers above this energy [MeV] are tracked as delta rays
    #[serde(default = "default_delta_energy_cut")]
    pub delta_energy_cut: f64,
    /// Ionization threshold [eV], derived from the band gap when absent
    #[serde(default)]
    pub energy_threshold: Option<f64>,
    /// Mean energy per pair in the Poisson model [eV]
    #[serde(default = "default_pair_creation_energy")]
    pub pair_creation_energy: f64,
    /// Relative energy loss after which the collision spectrum is recomputed
    #[serde(default = "default_update_fraction")]
    pub update_fraction: f64,
    /// Files or directories searched for the collision tables
    #[serde(default)]
    pub data_paths: Vec<PathBuf>,
    pub source: BeamSource,
}

fn default_events() -> u64 {
    1
}

fn default_temperature() -> f64 {
    293.15
}

fn default_fast() -> bool {
    true
}

fn default_delta_energy_cut() -> f64 {
    0.009
}

fn default_pair_creation_energy() -> f64 {
    silicon::PAIR_CREATION_ENERGY
}

fn default_update_fraction() -> f64 {
    0.1
}

impl Settings {
    pub fn new(source: BeamSource) -> Self {
        Settings {
            events: default_events(),
            seed: None,
            temperature: default_temperature(),
            fast: default_fast(),
            delta_energy_cut: default_delta_energy_cut(),
            energy_threshold: None,
            pair_creation_energy: default_pair_creation_energy(),
            update_fraction: default_update_fraction(),
            data_paths: Vec::new(),
            source,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| DepositionError::io(path, e))?;
        Self::from_json_str(&json)
    }

    /// Ionization threshold [eV] in effect
    pub fn energy_threshold(&self) -> f64 {
        self.energy_threshold
            .unwrap_or_else(|| silicon::ionization_threshold(self.temperature))
    }

    pub fn validate(&self) -> Result<()> {
        positive("temperature", self.temperature)?;
        positive("delta_energy_cut", self.delta_energy_cut)?;
        positive("pair_creation_energy", self.pair_creation_energy)?;
        if let Some(threshold) = self.energy_threshold {
            positive("energy_threshold", threshold)?;
        }
        if !(self.update_fraction > 0.0 && self.update_fraction < 1.0) {
            return Err(DepositionError::invalid_setting(
                "update_fraction",
                format!("must lie in (0, 1), got {}", self.update_fraction),
            ));
        }
        self.source.validate()
    }
}

fn positive(key: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(DepositionError::invalid_setting(
            key,
            format!("must be positive, got {}", value),
        ))
    }
}
