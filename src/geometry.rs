//! Geometry primitives shared by detections and tracks.

use nalgebra::Vector2;
use std::ops::Sub;

/// Per-frame displacement in pixels, (dx, dy).
pub type Velocity = Vector2<f64>;

/// A 2D point in image coordinates.
///
/// Coordinates are opaque integers: they may be negative or lie outside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }

    /// Offset this point by `delta`, rounding to the nearest pixel.
    pub fn offset(&self, delta: &Velocity) -> Point {
        Point {
            x: (f64::from(self.x) + delta.x).round() as i32,
            y: (f64::from(self.y) + delta.y).round() as i32,
        }
    }

    /// Integer midpoint, rounding towards negative infinity.
    pub fn midpoint(&self, other: &Point) -> Point {
        // The floored mean of two i32 values always fits back into i32
        let mid = |a: i32, b: i32| (i64::from(a) + i64::from(b)).div_euclid(2) as i32;
        Point {
            x: mid(self.x, other.x),
            y: mid(self.y, other.y),
        }
    }

    /// Point from wide coordinates, saturating at the `i32` range.
    pub(crate) fn saturating_from_i64(x: i64, y: i64) -> Point {
        let clamp = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        Point {
            x: clamp(x),
            y: clamp(y),
        }
    }
}

impl Sub for Point {
    type Output = Velocity;

    fn sub(self, rhs: Point) -> Velocity {
        Velocity::new(
            f64::from(self.x) - f64::from(rhs.x),
            f64::from(self.y) - f64::from(rhs.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(b.distance(&a), 5.0);
    }

    #[test]
    fn test_sub_gives_displacement() {
        let d = Point::new(15, 12) - Point::new(10, 10);
        assert_eq!(d, Velocity::new(5.0, 2.0));
    }

    #[test]
    fn test_offset_rounds() {
        let p = Point::new(10, 10);
        assert_eq!(p.offset(&Velocity::new(2.5, -1.4)), Point::new(13, 9));
        assert_eq!(p.offset(&Velocity::zeros()), p);
    }

    #[test]
    fn test_midpoint_negative() {
        assert_eq!(Point::new(-3, 4).midpoint(&Point::new(0, 7)), Point::new(-2, 5));
        assert_eq!(Point::new(10, 10).midpoint(&Point::new(15, 12)), Point::new(12, 11));
    }

    #[test]
    fn test_midpoint_near_integer_limits() {
        let a = Point::new(2_147_483_000, -2_147_483_000);
        let b = Point::new(2_147_483_646, -2_147_483_648);
        assert_eq!(a.midpoint(&b), Point::new(2_147_483_323, -2_147_483_324));
        assert_eq!(
            Point::new(i32::MAX, i32::MIN).midpoint(&Point::new(i32::MAX, i32::MIN)),
            Point::new(i32::MAX, i32::MIN)
        );
    }

    #[test]
    fn test_saturating_from_wide_coordinates() {
        assert_eq!(Point::saturating_from_i64(5, -7), Point::new(5, -7));
        assert_eq!(
            Point::saturating_from_i64(i64::from(i32::MAX) + 10, i64::from(i32::MIN) - 10),
            Point::new(i32::MAX, i32::MIN)
        );
    }
}
