// Angular sampling for elastic deflection and delta-ray emission

use crate::data::ELECTRON_MASS;
use nalgebra::Vector3;
use rand::Rng;
use std::f64::consts::PI;

/// Express `local`, given in a frame whose z axis is `direction`, in the
/// sensor frame. The frame's x axis lies in the plane spanned by `direction`
/// and the sensor z axis.
pub fn rotate_into_frame(direction: &Vector3<f64>, local: &Vector3<f64>) -> Vector3<f64> {
    let cz = direction.z;
    let sz = (1.0 - cz * cz).max(0.0).sqrt();
    let phi = direction.y.atan2(direction.x);
    let (sin_phi, cos_phi) = phi.sin_cos();
    Vector3::new(
        cz * cos_phi * local.x - sin_phi * local.y + sz * cos_phi * local.z,
        cz * sin_phi * local.x + cos_phi * local.y + sz * sin_phi * local.z,
        -sz * local.x + cz * local.z,
    )
}

/// Rotate `direction` by polar angle `acos(mu)` and azimuth `phi`
pub fn rotate_direction(direction: &Vector3<f64>, mu: f64, phi: f64) -> Vector3<f64> {
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();
    let local = Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), mu);
    rotate_into_frame(direction, &local).normalize()
}

/// Cosine of the delta-ray emission angle from two-body kinematics.
///
/// `transfer` is the energy given to the atomic electron [eV] and `energy` the
/// kinetic energy of the incoming particle [MeV]. Values above one (possible
/// for a full absorption) are returned as is and give a forward delta ray.
pub fn delta_ray_cos_theta(transfer: f64, energy: f64) -> f64 {
    let me_ev = ELECTRON_MASS * 1e6;
    (transfer / (2.0 * me_ev + transfer) * (energy + 2.0 * ELECTRON_MASS) / energy).sqrt()
}

/// Direction of a delta ray emitted by a particle flying along `direction`
pub fn sample_delta_direction<R: Rng + ?Sized>(
    direction: &Vector3<f64>,
    transfer: f64,
    energy: f64,
    rng: &mut R,
) -> Vector3<f64> {
    let mu = delta_ray_cos_theta(transfer, energy).min(1.0);
    let phi = 2.0 * PI * rng.gen::<f64>();
    rotate_direction(direction, mu, phi)
}

/// Deflection cosine for screened Rutherford scattering with screening
/// parameter `screening` and uniform draw `r`
pub fn screened_rutherford_cos_theta(screening: f64, r: f64) -> f64 {
    1.0 - 2.0 * screening * r / (2.0 + screening - 2.0 * r)
}

/// New direction after an elastic collision
pub fn sample_elastic_direction<R: Rng + ?Sized>(
    direction: &Vector3<f64>,
    screening: f64,
    rng: &mut R,
) -> Vector3<f64> {
    let mu = screened_rutherford_cos_theta(screening, rng.gen::<f64>());
    let phi = 2.0 * PI * rng.gen::<f64>();
    rotate_direction(direction, mu, phi)
}
