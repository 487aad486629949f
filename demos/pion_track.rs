// Simulates minimum ionizing pions crossing a 285 um pixel sensor and prints
// the pair statistics.
//
// Usage: cargo run --example pion_track [settings.json]
//
// The collision tables are searched in the `data_paths` of the settings,
// $BICHSEL_DATA_DIR and $XDG_DATA_DIRS/bichsel-deposition/data. Set RUST_LOG
// (e.g. RUST_LOG=bichsel_deposition=debug) for tracking output.

use bichsel_deposition::{BeamSource, BoxSensor, Model, ParticleType, RunSummary, Settings};
use nalgebra::Vector3;
use std::sync::Arc;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> bichsel_deposition::Result<()> {
    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_json_file(path)?,
        None => {
            let mut settings = Settings::new(BeamSource::new(ParticleType::Pion, 1000.0));
            settings.events = 100;
            settings
        }
    };

    let sensor = BoxSensor::new(Vector3::new(10.0, 10.0, 0.285))?;
    let model = Model::from_settings(settings, Arc::new(sensor))?;
    let results = model.run()?;

    let summary = RunSummary::from_results(&results);
    println!("Seed: {}", model.seed());
    println!("{}", summary);
    if let Some(w) = summary.energy_per_pair() {
        println!("Energy per pair: {:.3} eV", w);
    }
    if let Some(first) = results.iter().find(|r| !r.mc_particles.is_empty()) {
        println!(
            "Event {}: {} particles, {} clusters, {} deposited charges",
            first.event,
            first.mc_particles.len(),
            first.clusters.len(),
            first.deposited_charges.len()
        );
    }
    Ok(())
}
