use crate::output::EventResult;
use std::fmt;

/// Per-event values of one observable and their statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    pub name: String,
    pub units: String,
    /// One entry per event
    pub event_data: Vec<f64>,
    pub mean: f64,
    pub std_dev: f64,
    /// Relative error of the mean
    pub rel_error: f64,
    pub n_events: u64,
    /// Running sum of squared deviations from the mean
    squared_deviations: f64,
}

impl Tally {
    pub fn with_name_and_units(name: &str, units: &str) -> Self {
        Self {
            name: name.to_string(),
            units: units.to_string(),
            ..Self::default()
        }
    }

    /// Add the value of one event
    pub fn add_event(&mut self, value: f64) {
        self.event_data.push(value);
        self.n_events += 1;
        let delta = value - self.mean;
        self.mean += delta / self.n_events as f64;
        self.squared_deviations += delta * (value - self.mean);
        self.update_statistics();
    }

    fn update_statistics(&mut self) {
        let n = self.n_events as f64;
        let variance = self.squared_deviations / (n - 1.0).max(1.0);
        self.std_dev = variance.max(0.0).sqrt();
        self.rel_error = if self.mean != 0.0 {
            self.std_dev / (self.mean.abs() * n.sqrt())
        } else {
            0.0
        };
    }

    pub fn total(&self) -> f64 {
        self.event_data.iter().sum()
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        writeln!(f, "  Mean: {:.6} {} per event", self.mean, self.units)?;
        writeln!(f, "    Std Dev: {:.6}", self.std_dev)?;
        writeln!(f, "    Rel Error: {:.4} ({:.2}%)", self.rel_error, self.rel_error * 100.0)?;
        write!(f, "    Events: {}", self.n_events)
    }
}

/// Run-level statistics over a set of events
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub pairs: Tally,
    pub energy_loss: Tally,
    pub clusters: Tally,
    /// Events in which the primary missed the sensor
    pub empty_events: u64,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSummary {
    pub fn new() -> Self {
        RunSummary {
            pairs: Tally::with_name_and_units("Electron-hole pairs", "pairs"),
            energy_loss: Tally::with_name_and_units("Energy loss", "keV"),
            clusters: Tally::with_name_and_units("Clusters", "clusters"),
            empty_events: 0,
        }
    }

    pub fn add_event(&mut self, result: &EventResult) {
        if result.mc_particles.is_empty() {
            self.empty_events += 1;
        }
        self.pairs.add_event(result.stats.pairs as f64);
        self.energy_loss.add_event(result.stats.energy_loss * 1e-3);
        self.clusters.add_event(result.stats.clusters as f64);
    }

    pub fn from_results(results: &[EventResult]) -> Self {
        let mut summary = Self::new();
        for result in results {
            summary.add_event(result);
        }
        summary
    }

    /// Mean energy per created pair [eV] over the whole run
    pub fn energy_per_pair(&self) -> Option<f64> {
        let pairs = self.pairs.total();
        if pairs > 0.0 {
            Some(self.energy_loss.total() * 1e3 / pairs)
        } else {
            None
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.pairs)?;
        writeln!(f, "{}", self.energy_loss)?;
        writeln!(f, "{}", self.clusters)?;
        write!(f, "Events without a hit: {}", self.empty_events)
    }
}
