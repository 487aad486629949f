/// Utility functions for tabulated data

/// Linear interpolation of a left-continuous tabulated function.
///
/// `x` must be sorted and may repeat an abscissa to mark a discontinuity such
/// as an absorption edge. For `x_new` inside `(x[i-1], x[i]]` the value is
/// interpolated on that interval, so at an edge the value from below is
/// returned. Outside the range the first or last `y` value is returned.
pub fn interpolate_left_continuous(x: &[f64], y: &[f64], x_new: f64) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    if x.len() == 1 || x_new <= x[0] {
        return y[0];
    }
    if x_new > x[x.len() - 1] {
        return y[y.len() - 1];
    }

    // smallest idx with x[idx] >= x_new; idx >= 1 here
    let idx = x.partition_point(|&v| v < x_new);
    let x1 = x[idx - 1];
    let x2 = x[idx];
    let y1 = y[idx - 1];
    let y2 = y[idx];
    if x2 == x1 {
        return y2;
    }
    y1 + (x_new - x1) * (y2 - y1) / (x2 - x1)
}
