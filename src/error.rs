//! Error types for table loading, configuration and event simulation

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for deposition operations
pub type Result<T> = std::result::Result<T, DepositionError>;

/// Errors that can occur while configuring or running the deposition engine
#[derive(Error, Debug)]
pub enum DepositionError {
    /// No data file with the requested name in any search path
    #[error("could not find data file '{name}' in any of the search paths {searched:?}")]
    DataFileNotFound { name: String, searched: Vec<PathBuf> },

    /// Reading a file failed
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A table row or header could not be parsed
    #[error("malformed table {table} at line {line}: {reason}")]
    TableFormat {
        table: String,
        line: usize,
        reason: String,
    },

    /// Particle type name or code is not known
    #[error("invalid particle type '{0}'")]
    InvalidParticleType(String),

    /// A configuration value is outside its physical range
    #[error("invalid setting '{key}': {reason}")]
    InvalidSettings { key: String, reason: String },

    /// Settings file is not valid JSON or misses required keys
    #[error("failed to parse settings: {0}")]
    SettingsParse(#[from] serde_json::Error),

    /// The collision spectrum is empty at this energy
    #[error("no inelastic cross section for a {particle} at {energy_mev} MeV")]
    DegenerateCrossSection { particle: String, energy_mev: f64 },

    /// Particle history bookkeeping is inconsistent
    #[error("particle history error: {0}")]
    ParticleHistory(String),
}

impl DepositionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DepositionError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_setting(key: &str, reason: impl Into<String>) -> Self {
        DepositionError::InvalidSettings {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
