//! Vector type alias for plot-local positions and offsets.

use nalgebra::Vector2;

/// 2D vector type for plot-local positions and offsets.
///
/// This is a simple alias for `nalgebra::Vector2<f64>`. `x` points east and
/// `y` points north, in feet, with the origin at the center of subplot 1.
pub type Vec2 = Vector2<f64>;

/// Offset of a point `distance` away along compass bearing `azimuth`.
///
/// Bearings are clockwise from north, so 0° is `+y` and 90° is `+x`.
#[inline]
#[must_use]
pub fn polar_offset(distance: f64, azimuth_degrees: f64) -> Vec2 {
    let (sin, cos) = azimuth_degrees.to_radians().sin_cos();
    Vec2::new(distance * sin, distance * cos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_polar_offset_cardinal_bearings() {
        let north = polar_offset(10.0, 0.0);
        assert_abs_diff_eq!(north.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(north.y, 10.0, epsilon = 1e-12);

        let east = polar_offset(10.0, 90.0);
        assert_abs_diff_eq!(east.x, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(east.y, 0.0, epsilon = 1e-12);

        let south = polar_offset(10.0, 180.0);
        assert_abs_diff_eq!(south.y, -10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_polar_offset_zero_distance() {
        let o = polar_offset(0.0, 237.0);
        assert_abs_diff_eq!(o.norm(), 0.0, epsilon = 1e-12);
    }
}
