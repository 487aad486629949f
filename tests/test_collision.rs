mod common;

use bichsel_deposition::collision::max_energy_transfer;
use bichsel_deposition::{CollisionParameters, DepositionError, Particle, ParticleType};
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn particle(particle_type: ParticleType, energy: f64) -> Particle {
    Particle::new(energy, Point3::origin(), Vector3::z(), particle_type, 0.0, None)
}

#[test]
fn test_minimum_ionizing_pion_stopping_power() {
    let tables = common::tables();
    let pion = particle(ParticleType::Pion, 1000.0);
    let p = CollisionParameters::compute(&pion, &tables).unwrap().unwrap();

    assert!(p.inelastic_rate > 0.0 && p.elastic_rate > 0.0);
    // mean energy loss of a fast pion in silicon is a few hundred eV per um
    let de_dx = p.stopping_power * 1e-4;
    assert!(de_dx > 200.0 && de_dx < 330.0, "dE/dx = {} eV/um", de_dx);
    // several collisions per um
    let per_um = p.inelastic_rate * 1e-4;
    assert!(per_um > 1.0 && per_um < 10.0, "{} collisions per um", per_um);
    assert!(p.elastic_fraction() < 0.5);
}

#[test]
fn test_electron_spectrum_ends_at_half_energy() {
    let tables = common::tables();
    let electron = particle(ParticleType::Electron, 0.05);
    let p = CollisionParameters::compute(&electron, &tables).unwrap().unwrap();
    assert_eq!(p.max_transfer, 0.5 * 0.05 * 1e6);
    assert!(tables.energies()[p.last_bin()] <= p.max_transfer);
    assert!(tables.energies()[p.last_bin() + 1] > p.max_transfer);
}

#[test]
fn test_sampled_transfers_stay_in_range() {
    let tables = common::tables();
    let mut rng = StdRng::seed_from_u64(7);
    for (particle_type, energy) in [
        (ParticleType::Electron, 0.02),
        (ParticleType::Proton, 10.0),
        (ParticleType::Muon, 500.0),
    ] {
        let incoming = particle(particle_type, energy);
        let p = CollisionParameters::compute(&incoming, &tables).unwrap().unwrap();
        for _ in 0..2000 {
            let transfer = p.sample_transfer(&tables, &mut rng);
            assert!(transfer >= tables.energies()[0]);
            assert!(transfer <= tables.energies()[p.last_bin()]);
            assert!(transfer <= p.max_transfer);
        }
    }
}

#[test]
fn test_transfer_spectrum_peaks_near_plasmon() {
    let tables = common::tables();
    let mut rng = StdRng::seed_from_u64(8);
    let pion = particle(ParticleType::Pion, 1000.0);
    let p = CollisionParameters::compute(&pion, &tables).unwrap().unwrap();
    let n = 20000;
    let near_plasmon = (0..n)
        .map(|_| p.sample_transfer(&tables, &mut rng))
        .filter(|&e| e > 10.0 && e < 30.0)
        .count();
    assert!(near_plasmon as f64 / n as f64 > 0.4, "{} of {}", near_plasmon, n);
}

#[test]
fn test_too_slow_particle_has_no_spectrum() {
    let tables = common::tables();
    // 1.5 eV maximum transfer lies below the first grid bin
    let electron = particle(ParticleType::Electron, 3e-6);
    assert!(max_energy_transfer(&electron) * 1e6 < tables.energies()[1]);
    assert!(CollisionParameters::compute(&electron, &tables).unwrap().is_none());
}

#[test]
fn test_heavier_charge_loses_more_energy() {
    let tables = common::tables();
    let proton = particle(ParticleType::Proton, 4000.0);
    let alpha = particle(ParticleType::Helium, 3727.379 / 938.2723 * 4000.0);
    let sp = CollisionParameters::compute(&proton, &tables).unwrap().unwrap();
    let sa = CollisionParameters::compute(&alpha, &tables).unwrap().unwrap();
    // same velocity, z^2 = 4
    let ratio = sa.inelastic_rate / sp.inelastic_rate;
    assert!(ratio > 3.5 && ratio < 4.5, "ratio {}", ratio);
}

#[test]
fn test_empty_response_is_degenerate() {
    let dir = tempfile::tempdir().unwrap();
    let mut heps = String::from("64 1250\n");
    let mut macom = String::from("64 1250\n");
    let mut emerc = String::from("h\nh\nh\nh\n");
    for (j, e) in bichsel_deposition::data::ENERGY_GRID.energies.iter().enumerate() {
        heps += &format!("{} {:.8e} 1.0 0.0 0.0\n", j + 1, e);
        macom += &format!("{} {:.8e} 0.0\n", j + 1, e);
        if j < 200 {
            emerc += &format!("{} {:.8e} 0.0 0.025\n", j + 1, e);
        }
    }
    std::fs::write(dir.path().join("HEPS.TAB"), heps).unwrap();
    std::fs::write(dir.path().join("MACOM.TAB"), macom).unwrap();
    std::fs::write(dir.path().join("EMERC.TAB"), emerc).unwrap();
    let tables = bichsel_deposition::CrossSectionTables::load(&bichsel_deposition::DataPaths::new(
        vec![dir.path().to_path_buf()],
    ))
    .unwrap();

    let pion = particle(ParticleType::Pion, 1000.0);
    assert!(matches!(
        CollisionParameters::compute(&pion, &tables),
        Err(DepositionError::DegenerateCrossSection { .. })
    ));
}
