use crate::data::{ELECTRON_MASS, SPEED_OF_LIGHT};
use crate::error::{DepositionError, Result};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Charged particle species that can be tracked through the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleType {
    Proton,
    Pion,
    Kaon,
    Electron,
    Muon,
    Helium,
    Lithium,
    Carbon,
    Iron,
}

impl ParticleType {
    pub const ALL: [ParticleType; 9] = [
        ParticleType::Proton,
        ParticleType::Pion,
        ParticleType::Kaon,
        ParticleType::Electron,
        ParticleType::Muon,
        ParticleType::Helium,
        ParticleType::Lithium,
        ParticleType::Carbon,
        ParticleType::Iron,
    ];

    /// Rest mass [MeV]
    pub fn mass(&self) -> f64 {
        match self {
            ParticleType::Proton => 938.2723,
            ParticleType::Pion => 139.578,
            ParticleType::Kaon => 493.67,
            ParticleType::Electron => ELECTRON_MASS,
            ParticleType::Muon => 105.65932,
            ParticleType::Helium => 3727.379,
            ParticleType::Lithium => 6533.833,
            ParticleType::Carbon => 11174.862,
            ParticleType::Iron => 52089.808,
        }
    }

    /// Charge number, only its square enters the collision rates
    pub fn charge(&self) -> f64 {
        match self {
            ParticleType::Helium => 2.0,
            ParticleType::Lithium => 3.0,
            ParticleType::Carbon => 6.0,
            ParticleType::Iron => 26.0,
            _ => 1.0,
        }
    }

    /// PDG Monte Carlo particle code
    pub fn pdg_code(&self) -> i32 {
        match self {
            ParticleType::Proton => 2212,
            ParticleType::Pion => 211,
            ParticleType::Kaon => 321,
            ParticleType::Electron => 11,
            ParticleType::Muon => 13,
            ParticleType::Helium => 1000020040,
            ParticleType::Lithium => 1000030070,
            ParticleType::Carbon => 1000060120,
            ParticleType::Iron => 1000260560,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParticleType::Proton => "proton",
            ParticleType::Pion => "pion",
            ParticleType::Kaon => "kaon",
            ParticleType::Electron => "electron",
            ParticleType::Muon => "muon",
            ParticleType::Helium => "helium",
            ParticleType::Lithium => "lithium",
            ParticleType::Carbon => "carbon",
            ParticleType::Iron => "iron",
        }
    }
}

impl fmt::Display for ParticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParticleType {
    type Err = DepositionError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        ParticleType::ALL
            .iter()
            .copied()
            .find(|t| t.name() == lower)
            .ok_or_else(|| DepositionError::InvalidParticleType(s.to_string()))
    }
}

/// Numeric codes 1..=9 in the order proton, pion, kaon, electron, muon,
/// helium, lithium, carbon, iron.
impl TryFrom<u32> for ParticleType {
    type Error = DepositionError;

    fn try_from(code: u32) -> Result<Self> {
        match code {
            1..=9 => Ok(ParticleType::ALL[code as usize - 1]),
            _ => Err(DepositionError::InvalidParticleType(code.to_string())),
        }
    }
}

/// Transient transport state of a particle inside the sensor.
///
/// Positions are in local sensor coordinates [mm], time in ns and the kinetic
/// energy in MeV. The relativistic quantities are recomputed on every energy
/// change, so they always match `energy`.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    particle_type: ParticleType,
    energy: f64,
    position_start: Point3<f64>,
    position: Point3<f64>,
    direction: Vector3<f64>,
    time: f64,
    parent: Option<usize>,
    gamma: f64,
    beta_squared: f64,
    momentum: f64,
    velocity: f64,
}

impl Particle {
    pub fn new(
        energy: f64,
        position: Point3<f64>,
        direction: Vector3<f64>,
        particle_type: ParticleType,
        time: f64,
        parent: Option<usize>,
    ) -> Self {
        let mut particle = Particle {
            particle_type,
            energy,
            position_start: position,
            position,
            direction,
            time,
            parent,
            gamma: 1.0,
            beta_squared: 0.0,
            momentum: 0.0,
            velocity: 0.0,
        };
        particle.update();
        particle
    }

    fn update(&mut self) {
        let mass = self.particle_type.mass();
        self.gamma = self.energy / mass + 1.0;
        let beta_gamma = (self.gamma * self.gamma - 1.0).max(0.0).sqrt();
        self.beta_squared = beta_gamma * beta_gamma / (1.0 + beta_gamma * beta_gamma);
        self.momentum = mass * beta_gamma;
        self.velocity = beta_gamma / self.gamma * SPEED_OF_LIGHT;
    }

    pub fn set_energy(&mut self, energy: f64) {
        self.energy = energy;
        self.update();
    }

    /// Move `distance` [mm] along the direction of flight and advance the clock
    pub fn step(&mut self, distance: f64) {
        self.position += distance * self.direction;
        if self.velocity > 0.0 {
            self.time += distance / self.velocity;
        }
    }

    pub fn set_direction(&mut self, direction: Vector3<f64>) {
        self.direction = direction;
    }

    pub fn particle_type(&self) -> ParticleType {
        self.particle_type
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn mass(&self) -> f64 {
        self.particle_type.mass()
    }

    /// Total energy [MeV]
    pub fn total_energy(&self) -> f64 {
        self.energy + self.mass()
    }

    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    pub fn position_start(&self) -> &Point3<f64> {
        &self.position_start
    }

    pub fn direction(&self) -> &Vector3<f64> {
        &self.direction
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn beta_squared(&self) -> f64 {
        self.beta_squared
    }

    /// Momentum [MeV/c]
    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    /// Velocity [mm/ns]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn is_electron(&self) -> bool {
        self.particle_type == ParticleType::Electron
    }
}
