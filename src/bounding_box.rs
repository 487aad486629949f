use nalgebra::{Point3, Vector3};

/// Axis-aligned box in local sensor coordinates [mm]
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub lower_left: Point3<f64>,
    pub upper_right: Point3<f64>,
    pub center: Point3<f64>,
    pub width: Vector3<f64>,
}

impl BoundingBox {
    pub fn new(lower_left: Point3<f64>, upper_right: Point3<f64>) -> Self {
        let center = nalgebra::center(&lower_left, &upper_right);
        let width = upper_right - lower_left;
        BoundingBox {
            lower_left,
            upper_right,
            center,
            width,
        }
    }

    /// Box of size `width` centred on `center`
    pub fn centered(center: Point3<f64>, width: Vector3<f64>) -> Self {
        let half = 0.5 * width;
        BoundingBox::new(center - half, center + half)
    }

    /// Points on the faces count as inside
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| 2.0 * (point[i] - self.center[i]).abs() <= self.width[i])
    }

    /// Distance along `direction` from `origin` to where the ray enters the
    /// box, zero if `origin` is already inside and `None` if the ray misses.
    pub fn entry_distance(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Option<f64> {
        let mut t_enter = f64::NEG_INFINITY;
        let mut t_exit = f64::INFINITY;
        for i in 0..3 {
            if direction[i] == 0.0 {
                if origin[i] < self.lower_left[i] || origin[i] > self.upper_right[i] {
                    return None;
                }
                continue;
            }
            let t1 = (self.lower_left[i] - origin[i]) / direction[i];
            let t2 = (self.upper_right[i] - origin[i]) / direction[i];
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
        }
        if t_exit < t_enter.max(0.0) {
            return None;
        }
        Some(t_enter.max(0.0))
    }
}
