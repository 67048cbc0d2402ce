//! Track heatmap accumulation.
//!
//! Each call rasterizes the given tracks' paths into a per-track mask and adds
//! the masks to a per-pixel grid, so pixels that tracks keep passing over grow
//! hot. Rendering (colour mapping, blending) is left to the caller.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::{Error, Point, Result, Track};

/// Configuration for the track heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Stroke width of a track path in pixels.
    pub line_thickness: u32,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self { line_thickness: 2 }
    }
}

impl HeatmapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.line_thickness == 0 {
            return Err(Error::InvalidConfig(
                "line_thickness must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-pixel accumulation of track paths.
#[derive(Debug, Clone)]
pub struct TrackHeatmap {
    config: HeatmapConfig,
    /// Accumulated heat (rows = frame height, cols = frame width).
    pixels: DMatrix<f32>,
}

impl TrackHeatmap {
    pub fn new(frame_width: u32, frame_height: u32, config: HeatmapConfig) -> Result<Self> {
        config.validate()?;
        if frame_width == 0 || frame_height == 0 {
            return Err(Error::InvalidConfig(format!(
                "frame dimensions must be positive, got {}x{}",
                frame_width, frame_height
            )));
        }
        Ok(Self {
            config,
            pixels: DMatrix::zeros(frame_height as usize, frame_width as usize),
        })
    }

    /// Add one pass of each track's path.
    pub fn update<'a, I>(&mut self, tracks: I)
    where
        I: IntoIterator<Item = &'a Track>,
    {
        for track in tracks {
            self.add_track(track);
        }
    }

    /// Add one pass of a track's path.
    ///
    /// Consecutive confirmed points are joined, bridging missed frames. A track
    /// adds at most 1 to any pixel per call, however often its path crosses it.
    pub fn add_track(&mut self, track: &Track) {
        let mut mask = DMatrix::<u8>::zeros(self.pixels.nrows(), self.pixels.ncols());
        for (a, b) in track.segments() {
            self.draw_line(&mut mask, a, b);
        }
        for (heat, &hit) in self.pixels.iter_mut().zip(mask.iter()) {
            *heat += f32::from(hit);
        }
    }

    /// Heat at a pixel, 0 outside the frame.
    pub fn value(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 {
            return 0.0;
        }
        self.pixels
            .get((y as usize, x as usize))
            .copied()
            .unwrap_or(0.0)
    }

    /// Raw accumulated grid.
    pub fn pixels(&self) -> &DMatrix<f32> {
        &self.pixels
    }

    pub fn max(&self) -> f32 {
        self.pixels.max()
    }

    /// Min-max scaled copy of the grid in 0..=255. A flat grid maps to all zeros.
    pub fn normalized(&self) -> DMatrix<u8> {
        let min = self.pixels.min();
        let max = self.pixels.max();
        let range = max - min;
        if range <= 0.0 {
            return DMatrix::zeros(self.pixels.nrows(), self.pixels.ncols());
        }
        self.pixels
            .map(|v| ((v - min) / range * 255.0).round().clamp(0.0, 255.0) as u8)
    }

    // Bresenham line, stamped with a square brush of the configured thickness.
    fn draw_line(&self, mask: &mut DMatrix<u8>, a: Point, b: Point) {
        let (mut x, mut y) = (i64::from(a.x), i64::from(a.y));
        let (x1, y1) = (i64::from(b.x), i64::from(b.y));
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.stamp(mask, x, y);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn stamp(&self, mask: &mut DMatrix<u8>, x: i64, y: i64) {
        let thickness = i64::from(self.config.line_thickness);
        let half = thickness / 2;
        let (rows, cols) = (mask.nrows() as i64, mask.ncols() as i64);
        for oy in -half..thickness - half {
            for ox in -half..thickness - half {
                let (px, py) = (x + ox, y + oy);
                if px >= 0 && py >= 0 && px < cols && py < rows {
                    mask[(py as usize, px as usize)] = 1;
                }
            }
        }
    }
}
