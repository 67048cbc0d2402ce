//! Flow field aggregation.
//!
//! A coarse grid over the frame accumulating the per-frame displacement of
//! long-lived tracks, summarising where things tend to move. The field only
//! ever grows: nothing is removed once accumulated.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result, Track, Velocity};

/// Configuration for the flow field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Cell edge length in pixels.
    pub cell_size: u32,

    /// Tracks need more confirmed points than this to contribute.
    pub min_confirmed_points: usize,

    /// Mean vectors at or below this magnitude have no direction.
    pub direction_epsilon: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            cell_size: 32,
            min_confirmed_points: 10,
            direction_epsilon: 1e-2,
        }
    }
}

impl FlowConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cell_size == 0 {
            return Err(Error::InvalidConfig("cell_size must be positive".to_string()));
        }
        if !(self.direction_epsilon >= 0.0) {
            return Err(Error::InvalidConfig(
                "direction_epsilon must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// What a renderer should draw for one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowCell {
    /// Unit vector of the mean motion.
    Arrow(Velocity),
    /// No data, or no clear direction.
    Dot,
}

/// Grid of accumulated motion vectors.
#[derive(Debug, Clone)]
pub struct FlowField {
    config: FlowConfig,
    sum_dx: DMatrix<f64>,
    sum_dy: DMatrix<f64>,
    counts: DMatrix<u32>,
}

impl FlowField {
    /// Create a flow field covering a `frame_width` x `frame_height` frame.
    ///
    /// The grid has `frame / cell_size` cells per axis, and at least one.
    pub fn new(frame_width: u32, frame_height: u32, config: FlowConfig) -> Result<Self> {
        config.validate()?;
        if frame_width == 0 || frame_height == 0 {
            return Err(Error::InvalidConfig(format!(
                "frame dimensions must be positive, got {}x{}",
                frame_width, frame_height
            )));
        }

        let cols = (frame_width / config.cell_size).max(1) as usize;
        let rows = (frame_height / config.cell_size).max(1) as usize;

        Ok(Self {
            config,
            sum_dx: DMatrix::zeros(rows, cols),
            sum_dy: DMatrix::zeros(rows, cols),
            counts: DMatrix::zeros(rows, cols),
        })
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Grid size as (columns, rows).
    pub fn grid_size(&self) -> (usize, usize) {
        (self.counts.ncols(), self.counts.nrows())
    }

    /// Accumulate the movement of long-lived tracks.
    ///
    /// Only steps between confirmed points in adjacent frames count. Each step
    /// is binned by its midpoint. Every call walks each track's whole history,
    /// so a track passed in on every frame is weighted by how long it lived.
    pub fn update<'a, I>(&mut self, tracks: I)
    where
        I: IntoIterator<Item = &'a Track>,
    {
        for track in tracks {
            if track.confirmed_count() <= self.config.min_confirmed_points {
                continue;
            }

            let mut added = 0usize;
            for (a, b) in track.steps() {
                let mid = a.midpoint(&b);
                let (col, row) = self.cell_of(mid.x, mid.y);
                let step = b - a;
                self.sum_dx[(row, col)] += step.x;
                self.sum_dy[(row, col)] += step.y;
                self.counts[(row, col)] += 1;
                added += 1;
            }

            if added > 0 {
                debug!(track_id = track.id, steps = added, "flow field accumulated");
            }
        }
    }

    /// Mean motion vector of a cell, `None` when the cell has no data or is outside the grid.
    pub fn query(&self, col: usize, row: usize) -> Option<Velocity> {
        let count = *self.counts.get((row, col))?;
        if count == 0 {
            return None;
        }
        let n = f64::from(count);
        Some(Velocity::new(self.sum_dx[(row, col)] / n, self.sum_dy[(row, col)] / n))
    }

    /// Number of steps accumulated into a cell.
    pub fn count(&self, col: usize, row: usize) -> u32 {
        self.counts.get((row, col)).copied().unwrap_or(0)
    }

    /// Normalised direction of a cell for drawing.
    pub fn direction(&self, col: usize, row: usize) -> FlowCell {
        match self.query(col, row) {
            Some(mean) if mean.norm() > self.config.direction_epsilon => {
                FlowCell::Arrow(mean.normalize())
            }
            _ => FlowCell::Dot,
        }
    }

    /// Pixel center of a cell.
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        let size = f64::from(self.config.cell_size);
        ((col as f64 + 0.5) * size, (row as f64 + 0.5) * size)
    }

    /// Cell holding a pixel. Pixels outside the frame clamp to the border cells.
    pub fn cell_of(&self, x: i32, y: i32) -> (usize, usize) {
        let size = i64::from(self.config.cell_size);
        let clamp = |v: i32, cells: usize| -> usize {
            let idx = i64::from(v).div_euclid(size).clamp(0, cells as i64 - 1);
            idx as usize
        };
        (clamp(x, self.counts.ncols()), clamp(y, self.counts.nrows()))
    }

    /// Total number of steps accumulated.
    pub fn total_steps(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Detection, Point, TrackId, Tracker};
    use approx::assert_relative_eq;

    /// Track moving by (dx, dy) for `frames` confirmed frames starting at (x, y).
    fn moving_track(id: TrackId, x: i32, y: i32, dx: i32, dy: i32, frames: i32) -> Track {
        let mut track = Track::new(id, Detection::new(x, y, 5, 5), 30);
        for i in 1..frames {
            track.update_with_point(Point::new(x + dx * i, y + dy * i), 5, 5);
        }
        track
    }

    fn field() -> FlowField {
        FlowField::new(640, 480, FlowConfig::default()).unwrap()
    }

    #[test]
    fn test_grid_size() {
        assert_eq!(field().grid_size(), (20, 15));
        let tiny = FlowField::new(10, 10, FlowConfig::default()).unwrap();
        assert_eq!(tiny.grid_size(), (1, 1));
    }

    #[test]
    fn test_invalid_config() {
        let config = FlowConfig {
            cell_size: 0,
            ..FlowConfig::default()
        };
        assert!(FlowField::new(640, 480, config).is_err());
        assert!(FlowField::new(0, 480, FlowConfig::default()).is_err());
    }

    #[test]
    fn test_short_tracks_are_ignored() {
        let mut flow = field();
        // Exactly 10 confirmed points is not enough
        flow.update([&moving_track(0, 100, 100, 1, 0, 10)]);
        assert_eq!(flow.total_steps(), 0);

        flow.update([&moving_track(1, 100, 100, 1, 0, 11)]);
        assert_eq!(flow.total_steps(), 10);
    }

    #[test]
    fn test_query_returns_mean_vector() {
        let mut flow = field();
        // Horizontal motion of 2px per frame, all inside cell (3, 3)
        flow.update([&moving_track(0, 100, 100, 2, 0, 11)]);

        let mean = flow.query(3, 3).unwrap();
        assert_relative_eq!(mean.x, 2.0);
        assert_relative_eq!(mean.y, 0.0);
        assert_eq!(flow.count(3, 3), 10);
        assert_eq!(flow.direction(3, 3), FlowCell::Arrow(Velocity::new(1.0, 0.0)));

        assert!(flow.query(0, 0).is_none());
        assert_eq!(flow.direction(0, 0), FlowCell::Dot);
        assert!(flow.query(100, 100).is_none());
    }

    #[test]
    fn test_opposite_motion_cancels_to_dot() {
        let mut flow = field();
        let right = moving_track(0, 100, 100, 1, 0, 11);
        let left = moving_track(1, 110, 100, -1, 0, 11);
        flow.update([&right, &left]);

        let mean = flow.query(3, 3).unwrap();
        assert_relative_eq!(mean.norm(), 0.0);
        assert_eq!(flow.direction(3, 3), FlowCell::Dot);
    }

    #[test]
    fn test_repeated_updates_reweight_long_tracks() {
        let mut flow = field();
        let mut track = moving_track(0, 100, 100, 1, 1, 11);
        flow.update([&track]);
        flow.update([&track]);
        assert_eq!(flow.total_steps(), 20);

        track.update_with_point(Point::new(111, 111), 5, 5);
        flow.update([&track]);
        assert_eq!(flow.total_steps(), 31);
    }

    #[test]
    fn test_tracks_from_separate_trackers_both_count() {
        // Both trackers number their first track 0
        let mut flow = field();
        let first = moving_track(0, 100, 100, 1, 0, 11);
        let second = moving_track(0, 300, 300, 0, 1, 11);
        flow.update([&first]);
        flow.update([&second]);
        assert_eq!(flow.total_steps(), 20);
    }

    #[test]
    fn test_coordinates_near_integer_limit() {
        let mut tracker = Tracker::default();
        for i in 0..12 {
            tracker.update(vec![Detection::new(2_000_000_000 + i, 2_147_483_000 + i, 5, 5)]);
        }

        let mut flow = field();
        flow.update(tracker.tracks());
        assert_eq!(flow.total_steps(), 11);

        let (col, row) = flow.grid_size();
        let mean = flow.query(col - 1, row - 1).unwrap();
        assert_relative_eq!(mean.x, 1.0);
        assert_relative_eq!(mean.y, 1.0);
    }

    #[test]
    fn test_gaps_do_not_contribute() {
        let mut flow = field();
        let mut track = moving_track(0, 100, 100, 1, 0, 11);
        track.update_without_point();
        track.update_with_point(Point::new(200, 100), 5, 5);
        flow.update([&track]);
        assert_eq!(flow.total_steps(), 10);
    }

    #[test]
    fn test_out_of_frame_points_clamp() {
        let flow = field();
        assert_eq!(flow.cell_of(-50, -1), (0, 0));
        assert_eq!(flow.cell_of(10_000, 10_000), (19, 14));
        assert_eq!(flow.cell_of(32, 63), (1, 1));
    }

    #[test]
    fn test_cell_center() {
        let flow = field();
        assert_eq!(flow.cell_center(0, 0), (16.0, 16.0));
        assert_eq!(flow.cell_center(2, 1), (80.0, 48.0));
    }
}
