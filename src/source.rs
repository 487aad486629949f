use crate::error::{DepositionError, Result};
use crate::particle::ParticleType;
use crate::physics::rotate_into_frame;
use nalgebra::{Point3, Vector3};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Beam that provides the primary particle of every event.
///
/// Energies are in MeV, lengths in mm and angles in rad. The position is in
/// local sensor coordinates; when it is absent the beam is aimed at the sensor
/// centre from outside and enters through the face it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamSource {
    #[serde(default = "default_particle_type")]
    pub particle_type: ParticleType,
    pub energy: f64,
    /// Gaussian sigma of the kinetic energy
    #[serde(default)]
    pub energy_spread: f64,
    #[serde(default)]
    pub position: Option<[f64; 3]>,
    #[serde(default = "default_direction")]
    pub direction: [f64; 3],
    /// Gaussian sigma of the lateral beam profile
    #[serde(default)]
    pub beam_size: f64,
    /// Gaussian sigma of the angular spread around the local x and y axes of
    /// the beam frame
    #[serde(default)]
    pub divergence: [f64; 2],
}

fn default_particle_type() -> ParticleType {
    ParticleType::Electron
}

fn default_direction() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

/// Starting point of a primary before it is transported to the sensor
#[derive(Debug, Clone, PartialEq)]
pub struct SampledPrimary {
    pub particle_type: ParticleType,
    pub energy: f64,
    pub position: Option<Point3<f64>>,
    pub direction: Vector3<f64>,
}

impl BeamSource {
    /// Pencil beam along +z entering through the lower sensor face
    pub fn new(particle_type: ParticleType, energy: f64) -> Self {
        Self {
            particle_type,
            energy,
            energy_spread: 0.0,
            position: None,
            direction: default_direction(),
            beam_size: 0.0,
            divergence: [0.0, 0.0],
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.energy > 0.0) || !self.energy.is_finite() {
            return Err(DepositionError::invalid_setting(
                "source.energy",
                format!("must be positive, got {}", self.energy),
            ));
        }
        if !(self.energy_spread >= 0.0) {
            return Err(DepositionError::invalid_setting(
                "source.energy_spread",
                "must not be negative",
            ));
        }
        let direction = Vector3::from(self.direction);
        if !(direction.norm() > 0.0) || !direction.norm().is_finite() {
            return Err(DepositionError::invalid_setting(
                "source.direction",
                "must be a non-zero vector",
            ));
        }
        if !(self.beam_size >= 0.0) {
            return Err(DepositionError::invalid_setting("source.beam_size", "must not be negative"));
        }
        if self.divergence.iter().any(|d| !(*d >= 0.0)) {
            return Err(DepositionError::invalid_setting(
                "source.divergence",
                "must not be negative",
            ));
        }
        if let Some(p) = self.position {
            if p.iter().any(|x| !x.is_finite()) {
                return Err(DepositionError::invalid_setting("source.position", "must be finite"));
            }
        }
        Ok(())
    }

    /// Unit vector of the nominal beam axis
    pub fn axis(&self) -> Vector3<f64> {
        Vector3::from(self.direction).normalize()
    }

    /// Sample energy, position and direction of one primary. Call
    /// [`BeamSource::validate`] first; invalid widths are treated as zero.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SampledPrimary {
        let axis = self.axis();

        let mut energy = self.energy;
        if self.energy_spread > 0.0 {
            if let Ok(normal) = Normal::new(self.energy, self.energy_spread) {
                energy = loop {
                    let e = normal.sample(rng);
                    if e > 0.0 {
                        break e;
                    }
                };
            }
        }

        let mut direction = axis;
        if self.divergence.iter().any(|&d| d > 0.0) {
            let tilt_x = gaussian(self.divergence[0], rng);
            let tilt_y = gaussian(self.divergence[1], rng);
            let local = Vector3::new(tilt_x.tan(), tilt_y.tan(), 1.0).normalize();
            direction = rotate_into_frame(&axis, &local).normalize();
        }

        let position = self.position.map(|p| {
            let mut position = Point3::from(p);
            if self.beam_size > 0.0 {
                let offset = Vector3::new(
                    gaussian(self.beam_size, rng),
                    gaussian(self.beam_size, rng),
                    0.0,
                );
                position += rotate_into_frame(&axis, &offset);
            }
            position
        });

        SampledPrimary {
            particle_type: self.particle_type,
            energy,
            position,
            direction,
        }
    }
}

fn gaussian<R: Rng + ?Sized>(sigma: f64, rng: &mut R) -> f64 {
    if !(sigma > 0.0) {
        return 0.0;
    }
    Normal::new(0.0, sigma).map(|n| n.sample(rng)).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_pencil_beam() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = BeamSource::new(ParticleType::Pion, 1000.0);
        s.position = Some([0.1, 0.2, -0.5]);

        for _ in 0..10 {
            let p = s.sample(&mut rng);
            assert_eq!(p.particle_type, ParticleType::Pion);
            assert_eq!(p.energy, 1000.0);
            assert_eq!(p.position, Some(Point3::new(0.1, 0.2, -0.5)));
            assert_eq!(p.direction, Vector3::new(0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn test_direction_is_normalized() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut s = BeamSource::new(ParticleType::Muon, 4000.0);
        s.direction = [0.0, 3.0, 4.0];
        let p = s.sample(&mut rng);
        assert!((p.direction - Vector3::new(0.0, 0.6, 0.8)).norm() < 1e-12);
    }

    #[test]
    fn test_energy_spread() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut s = BeamSource::new(ParticleType::Electron, 5.0);
        s.energy_spread = 0.5;
        let n = 5000;
        let energies: Vec<f64> = (0..n).map(|_| s.sample(&mut rng).energy).collect();
        let mean = energies.iter().sum::<f64>() / n as f64;
        let var = energies.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        assert!((mean - 5.0).abs() < 0.05);
        assert!((var.sqrt() - 0.5).abs() < 0.05);
        assert!(energies.iter().all(|&e| e > 0.0));
    }

    #[test]
    fn test_beam_profile_is_lateral() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut s = BeamSource::new(ParticleType::Proton, 100.0);
        s.position = Some([0.0, 0.0, -1.0]);
        s.beam_size = 0.01;
        let mut moved = 0;
        for _ in 0..100 {
            let p = s.sample(&mut rng).position.unwrap();
            assert_eq!(p.z, -1.0);
            if p.x != 0.0 || p.y != 0.0 {
                moved += 1;
            }
        }
        assert_eq!(moved, 100);
    }

    #[test]
    fn test_divergence_tilts_direction() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut s = BeamSource::new(ParticleType::Pion, 120.0);
        s.divergence = [0.001, 0.002];
        let n = 2000;
        let mut sum_angle = 0.0;
        for _ in 0..n {
            let d = s.sample(&mut rng).direction;
            assert!((d.norm() - 1.0).abs() < 1e-12);
            sum_angle += d.z.min(1.0).acos();
        }
        let mean = sum_angle / n as f64;
        assert!(mean > 0.0005 && mean < 0.005, "mean polar angle {}", mean);
    }

    #[test]
    fn test_validate() {
        let good = BeamSource::new(ParticleType::Kaon, 10.0);
        assert!(good.validate().is_ok());

        let mut bad = good.clone();
        bad.energy = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = good.clone();
        bad.direction = [0.0, 0.0, 0.0];
        assert!(bad.validate().is_err());

        let mut bad = good.clone();
        bad.divergence = [-1.0, 0.0];
        assert!(bad.validate().is_err());

        let mut bad = good;
        bad.energy_spread = f64::NAN;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_deserialize_defaults() {
        let s: BeamSource = serde_json::from_str(r#"{"energy": 0.05}"#).unwrap();
        assert_eq!(s.particle_type, ParticleType::Electron);
        assert_eq!(s.direction, [0.0, 0.0, 1.0]);
        assert_eq!(s.position, None);
        let s: BeamSource =
            serde_json::from_str(r#"{"particle_type": "pion", "energy": 1000, "position": [0, 0, -1]}"#)
                .unwrap();
        assert_eq!(s.particle_type, ParticleType::Pion);
        assert_eq!(s.position, Some([0.0, 0.0, -1.0]));
        assert!(serde_json::from_str::<BeamSource>(r#"{"particle_type": "pion"}"#).is_err());
    }
}
