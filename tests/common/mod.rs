// Shared fixtures for the integration tests.
//
// The collision tables are generated from a Drude-Lorentz model of the
// silicon dielectric response: three damped oscillators for the valence band,
// the L shell and the K shell whose strengths add up to the 14 electrons of
// silicon. The tables are written in the on-disk format and read back through
// the real loader.
#![allow(dead_code)]

use bichsel_deposition::data::{ENERGY_GRID, EMERC_ROWS, ENERGY_BINS, OSCILLATOR_FACTOR};
use bichsel_deposition::{
    BeamSource, BoxSensor, CrossSectionTables, DataPaths, Model, ParticleType, SensorGeometry,
    Settings,
};
use nalgebra::Vector3;
use once_cell::sync::Lazy;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// (oscillator strength, resonance energy [eV], damping [eV])
const OSCILLATORS: [(f64, f64, f64); 3] = [(4.0, 4.0, 3.5), (8.0, 120.0, 150.0), (2.0, 1900.0, 2000.0)];

/// Sensor thickness [mm]
pub const THICKNESS: f64 = 0.285;

/// Real and imaginary part of the dielectric constant at `energy` [eV]
pub fn dielectric(energy: f64) -> (f64, f64) {
    let plasma2 = 1.0 / (OSCILLATOR_FACTOR * std::f64::consts::FRAC_PI_2);
    let mut eps1 = 1.0;
    let mut eps2 = 0.0;
    for (f, e0, width) in OSCILLATORS {
        let re = e0 * e0 - energy * energy;
        let im = energy * width;
        let norm = re * re + im * im;
        eps1 += f * plasma2 * re / norm;
        eps2 += f * plasma2 * im / norm;
    }
    (eps1, eps2)
}

/// Energy loss function Im(-1/eps)
pub fn loss_function(energy: f64) -> f64 {
    let (eps1, eps2) = dielectric(energy);
    eps2 / (eps1 * eps1 + eps2 * eps2)
}

/// Write HEPS.TAB, MACOM.TAB and EMERC.TAB into `dir`
pub fn write_tables(dir: &Path) {
    let grid = &*ENERGY_GRID;
    let mut heps = format!("64 {}\n", ENERGY_BINS);
    let mut macom = format!("64 {}\n", ENERGY_BINS);
    let mut emerc = String::from("EMERC\nDrude-Lorentz fixture\n\n   j        E        AE      XKMN\n");

    let mut integral = 0.0;
    for j in 0..ENERGY_BINS {
        let e = grid.energies[j];
        let (eps1, eps2) = dielectric(e);
        let rim = loss_function(e);
        integral += rim * OSCILLATOR_FACTOR * e * grid.widths[j];
        let ae = 0.5 * integral;

        writeln!(heps, "{} {:.8e} {:.8e} {:.8e} {:.8e}", j + 1, e, eps1, eps2, rim).unwrap();
        writeln!(macom, "{} {:.8e} {:.8e}", j + 1, e, ae).unwrap();
        if j < EMERC_ROWS {
            writeln!(emerc, "{} {:.8e} {:.8e} {:.8e}", j + 1, e, ae, 0.025).unwrap();
        }
    }

    std::fs::write(dir.join("HEPS.TAB"), heps).unwrap();
    std::fs::write(dir.join("MACOM.TAB"), macom).unwrap();
    std::fs::write(dir.join("EMERC.TAB"), emerc).unwrap();
}

static TABLES: Lazy<Arc<CrossSectionTables>> = Lazy::new(|| {
    let dir = tempfile::tempdir().unwrap();
    write_tables(dir.path());
    let tables = CrossSectionTables::load(&DataPaths::new(vec![dir.path().to_path_buf()])).unwrap();
    Arc::new(tables)
});

/// Fixture tables, generated once per test binary
pub fn tables() -> Arc<CrossSectionTables> {
    TABLES.clone()
}

/// 10 x 10 mm pixel sensor of the standard thickness
pub fn sensor() -> BoxSensor {
    BoxSensor::new(Vector3::new(10.0, 10.0, THICKNESS)).unwrap()
}

pub fn settings(particle_type: ParticleType, energy: f64, events: u64, seed: u64) -> Settings {
    let mut settings = Settings::new(BeamSource::new(particle_type, energy));
    settings.events = events;
    settings.seed = Some(seed);
    settings
}

pub fn model(settings: Settings) -> Model {
    model_with_geometry(settings, Arc::new(sensor()))
}

pub fn model_with_geometry(
    settings: Settings,
    geometry: Arc<dyn SensorGeometry + Send + Sync>,
) -> Model {
    Model::new(tables(), geometry, settings).unwrap()
}

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
