//! Detection struct for input to the tracker.

use crate::geometry::Point;

/// A detection to be tracked.
///
/// One axis-aligned bounding box reported by the motion detector for a single
/// frame. Detections carry no identity; two detections with the same box are
/// the same detection.
///
/// Width and height are not validated: degenerate or negative boxes are
/// carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Detection {
    /// Top-left corner of the box. This is the anchor used for matching.
    pub origin: Point,

    /// Box width in pixels.
    pub width: i32,

    /// Box height in pixels.
    pub height: i32,
}

impl Detection {
    /// Create a new detection from its top-left corner and size.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            origin: Point::new(x, y),
            width,
            height,
        }
    }

    /// Create a detection anchored at `origin`.
    pub const fn at(origin: Point, width: i32, height: i32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Center of the box (integer division, rounding down).
    ///
    /// Saturates at the `i32` range for boxes reaching past it.
    pub fn center(&self) -> Point {
        let half = |origin: i32, size: i32| (2 * i64::from(origin) + i64::from(size)).div_euclid(2);
        Point::saturating_from_i64(half(self.origin.x, self.width), half(self.origin.y, self.height))
    }

    /// Bottom-right corner of the box, saturating at the `i32` range.
    pub fn bottom_right(&self) -> Point {
        Point::saturating_from_i64(
            i64::from(self.origin.x) + i64::from(self.width),
            i64::from(self.origin.y) + i64::from(self.height),
        )
    }
}

/// Deduplicate detections by value, keeping first-seen order.
///
/// The tracker treats a frame as a set; this gives that set a stable
/// iteration order.
pub fn dedup_detections<I>(detections: I) -> Vec<Detection>
where
    I: IntoIterator<Item = Detection>,
{
    let mut seen = std::collections::HashSet::new();
    detections
        .into_iter()
        .filter(|det| seen.insert(*det))
        .collect()
}
