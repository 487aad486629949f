// Runs with the same seed must give identical events, regardless of how the
// events are scheduled across threads.

mod common;

use bichsel_deposition::{ParticleType, RunSummary};

#[test]
fn test_reproducibility_with_same_seed() {
    let settings = common::settings(ParticleType::Pion, 1000.0, 6, 42);
    let first = common::model(settings.clone()).run().unwrap();
    let second = common::model(settings).run().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parallel_run_matches_single_events() {
    let mut settings = common::settings(ParticleType::Electron, 0.2, 8, 7);
    settings.source.energy_spread = 0.01;
    settings.source.divergence = [0.05, 0.05];
    let model = common::model(settings);

    let parallel = model.run().unwrap();
    let sequential: Vec<_> = (0..8).map(|e| model.run_event(e).unwrap()).collect();
    assert_eq!(parallel, sequential);
    for (i, result) in parallel.iter().enumerate() {
        assert_eq!(result.event, i as u64);
    }
}

#[test]
fn test_different_seeds_differ() {
    let a = common::model(common::settings(ParticleType::Pion, 1000.0, 2, 1)).run().unwrap();
    let b = common::model(common::settings(ParticleType::Pion, 1000.0, 2, 2)).run().unwrap();
    assert_ne!(a[0].clusters, b[0].clusters);
}

#[test]
fn test_slow_mode_is_reproducible() {
    let mut settings = common::settings(ParticleType::Electron, 0.03, 3, 11);
    settings.fast = false;
    let first = common::model(settings.clone()).run().unwrap();
    let second = common::model(settings).run().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_summary_over_run() {
    let results = common::model(common::settings(ParticleType::Pion, 1000.0, 5, 3))
        .run()
        .unwrap();
    let summary = RunSummary::from_results(&results);
    assert_eq!(summary.pairs.n_events, 5);
    assert_eq!(summary.empty_events, 0);
    assert!(summary.pairs.mean > 0.0);
    let w = summary.energy_per_pair().unwrap();
    assert!(w > 3.0 && w < 5.0, "{} eV per pair", w);
}
