//! Track struct for identified objects maintained by the tracker.
//!
//! A track is a detection lineage: the box it was last confirmed with, an id,
//! a per-frame position history, and the constant-velocity predictor used to
//! bridge frames in which the detector missed it.

use crate::detection::Detection;
use crate::geometry::{Point, Velocity};

/// Track identifier. Unique per tracker, assigned in creation order.
pub type TrackId = u64;

/// An identified object maintained by the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Identifier, never reassigned.
    pub id: TrackId,

    /// Last confirmed box. Its origin is the track position, which is kept
    /// unchanged while the track is missed.
    pub bbox: Detection,

    /// One entry per update since creation; `None` marks a missed frame.
    pub history: Vec<Option<Point>>,

    /// Most recent finite-difference velocity, in pixels per frame.
    pub velocity: Velocity,

    /// Consecutive frames since the last confirmed match.
    pub missed_tracks: u32,

    /// Base gating radius in pixels.
    pub prediction_range: u32,
}

impl Track {
    /// Start a new track from an unmatched detection.
    pub fn new(id: TrackId, detection: Detection, prediction_range: u32) -> Self {
        Self {
            id,
            bbox: detection,
            history: vec![Some(detection.origin)],
            velocity: Velocity::zeros(),
            missed_tracks: 0,
            prediction_range,
        }
    }

    /// Current top-left anchor.
    pub fn position(&self) -> Point {
        self.bbox.origin
    }

    pub fn width(&self) -> i32 {
        self.bbox.width
    }

    pub fn height(&self) -> i32 {
        self.bbox.height
    }

    /// Velocity-extrapolated position for the next frame.
    ///
    /// After a match this is `position + velocity`; after `k` consecutive misses
    /// it is `position + velocity * k`.
    pub fn predicted_position(&self) -> Point {
        let steps = f64::from(self.missed_tracks.max(1));
        self.position().offset(&(self.velocity * steps))
    }

    /// Gating radius for the next match: widens linearly with consecutive misses.
    pub fn gate_radius(&self) -> f64 {
        f64::from(self.prediction_range) * f64::from(self.missed_tracks + 1)
    }

    /// Whether `detection` falls inside this track's gate.
    pub fn is_self(&self, detection: &Detection) -> bool {
        self.gate_distance(detection).is_some()
    }

    /// Distance from `detection`'s anchor to the predicted position, if inside the gate.
    pub fn gate_distance(&self, detection: &Detection) -> Option<f64> {
        let dist = detection.origin.distance(&self.predicted_position());
        (dist <= self.gate_radius()).then_some(dist)
    }

    /// Whether the track has been missed for more than `max_missed_frames` frames.
    pub fn is_expired(&self, max_missed_frames: u32) -> bool {
        self.missed_tracks > max_missed_frames
    }

    /// Register a confirmed detection for this frame.
    pub fn update_with_point(&mut self, point: Point, width: i32, height: i32) {
        if let Some((frames_ago, last)) = self.last_confirmed_with_age() {
            self.velocity = (point - last) / frames_ago as f64;
        }
        self.missed_tracks = 0;
        self.bbox = Detection::at(point, width, height);
        self.history.push(Some(point));
    }

    /// Register a frame in which no detection matched.
    pub fn update_without_point(&mut self) {
        self.missed_tracks += 1;
        self.history.push(None);
    }

    /// Most recent confirmed point in the history.
    pub fn last_confirmed(&self) -> Option<Point> {
        self.history.iter().rev().flatten().next().copied()
    }

    /// Confirmed points in frame order.
    pub fn confirmed_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.history.iter().flatten().copied()
    }

    pub fn confirmed_count(&self) -> usize {
        self.history.iter().filter(|p| p.is_some()).count()
    }

    /// Pairs of confirmed points in adjacent frames.
    pub fn steps(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.history.windows(2).filter_map(|w| match (w[0], w[1]) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        })
    }

    /// Pairs of consecutive confirmed points, bridging missed frames.
    pub fn segments(&self) -> Vec<(Point, Point)> {
        let points: Vec<Point> = self.confirmed_points().collect();
        points.windows(2).map(|w| (w[0], w[1])).collect()
    }

    // Frames elapsed since the last confirmed point, counted from the next history slot.
    fn last_confirmed_with_age(&self) -> Option<(usize, Point)> {
        let len = self.history.len();
        self.history
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, p)| p.as_ref().map(|p| (len - i, *p)))
    }
}
