//! Sensor geometry as seen by the deposition engine.
//!
//! The engine only needs to know whether a local point is inside the sensitive
//! volume and how to map local coordinates to the global frame. Anything that
//! can answer those questions can be plugged in through [`SensorGeometry`].

use crate::bounding_box::BoundingBox;
use crate::error::{DepositionError, Result};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

/// Capabilities of a sensor used by the stepping engine. Local coordinates
/// are in mm with the origin at the sensor centre.
pub trait SensorGeometry {
    /// True if `local` is inside the sensitive volume, faces included
    fn is_within_sensor(&self, local: &Point3<f64>) -> bool;

    /// Map a local position to global coordinates
    fn to_global(&self, local: &Point3<f64>) -> Point3<f64>;

    /// Full extent of the sensitive volume [mm]
    fn sensor_size(&self) -> Vector3<f64>;

    /// Centre of the sensitive volume in local coordinates
    fn sensor_center(&self) -> Point3<f64>;

    /// Distance along `direction` until the sensor is entered, zero if
    /// already inside, `None` if never
    fn entry_distance(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Option<f64>;
}

/// Rectangular silicon sensor placed in the global frame
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSensor {
    bounds: BoundingBox,
    placement: Isometry3<f64>,
}

impl BoxSensor {
    /// Sensor of the given size [mm] centred on the local origin, placed at
    /// the global origin without rotation
    pub fn new(size: Vector3<f64>) -> Result<Self> {
        if size.iter().any(|&s| !(s > 0.0) || !s.is_finite()) {
            return Err(DepositionError::invalid_setting(
                "sensor_size",
                format!("all dimensions must be positive, got {:?}", size.as_slice()),
            ));
        }
        Ok(BoxSensor {
            bounds: BoundingBox::centered(Point3::origin(), size),
            placement: Isometry3::identity(),
        })
    }

    /// Place the sensor centre at `position` [mm] in the global frame with
    /// the given rotation (roll, pitch, yaw) [rad]
    pub fn with_placement(mut self, position: Vector3<f64>, orientation: [f64; 3]) -> Self {
        let rotation = UnitQuaternion::from_euler_angles(orientation[0], orientation[1], orientation[2]);
        self.placement = Isometry3::from_parts(Translation3::from(position), rotation);
        self
    }

    /// Sensor thickness along the local z axis [mm]
    pub fn thickness(&self) -> f64 {
        self.bounds.width.z
    }

    pub fn placement(&self) -> &Isometry3<f64> {
        &self.placement
    }
}

impl SensorGeometry for BoxSensor {
    fn is_within_sensor(&self, local: &Point3<f64>) -> bool {
        self.bounds.contains(local)
    }

    fn to_global(&self, local: &Point3<f64>) -> Point3<f64> {
        self.placement.transform_point(local)
    }

    fn sensor_size(&self) -> Vector3<f64> {
        self.bounds.width
    }

    fn sensor_center(&self) -> Point3<f64> {
        self.bounds.center
    }

    fn entry_distance(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Option<f64> {
        self.bounds.entry_distance(origin, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_sensor_containment() {
        let sensor = BoxSensor::new(Vector3::new(10.0, 10.0, 0.285)).unwrap();
        assert!(sensor.is_within_sensor(&Point3::new(0.0, 0.0, 0.1425)));
        assert!(!sensor.is_within_sensor(&Point3::new(0.0, 0.0, 0.143)));
        assert_eq!(sensor.thickness(), 0.285);
        assert_eq!(sensor.sensor_center(), Point3::origin());
    }

    #[test]
    fn test_invalid_size_rejected() {
        assert!(BoxSensor::new(Vector3::new(1.0, 0.0, 1.0)).is_err());
        assert!(BoxSensor::new(Vector3::new(1.0, 1.0, -0.3)).is_err());
        assert!(BoxSensor::new(Vector3::new(f64::NAN, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_to_global_translation_and_rotation() {
        let sensor = BoxSensor::new(Vector3::new(10.0, 10.0, 0.3))
            .unwrap()
            .with_placement(Vector3::new(0.0, 0.0, 100.0), [0.0, 0.0, std::f64::consts::FRAC_PI_2]);
        let global = sensor.to_global(&Point3::new(1.0, 0.0, 0.0));
        assert!((global - Point3::new(0.0, 1.0, 100.0)).norm() < 1e-12);
    }

    #[test]
    fn test_geometry_is_object_safe() {
        let sensor: Box<dyn SensorGeometry + Send + Sync> =
            Box::new(BoxSensor::new(Vector3::new(1.0, 1.0, 1.0)).unwrap());
        assert_eq!(sensor.sensor_size(), Vector3::new(1.0, 1.0, 1.0));
    }
}
