//! Movement pattern scoring.
//!
//! Bats fly fast and erratically compared with most other things a motion
//! detector picks up at dusk (insects near the lens excepted). The score is
//! the mean per-step speed relative to a reference speed, capped at 1.
//!
//! Long-lived tracks can also be summarised by where they came from and
//! where they went, paired with that score.

use serde::{Deserialize, Serialize};

use crate::{Error, Point, Result, Track, TrackId, Velocity};

/// Configuration for the movement classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Mean speed, in pixels per frame, that scores 1.0.
    pub reference_speed: f64,

    /// Tracks need more confirmed points than this to be summarised.
    pub summary_min_points: usize,

    /// Confirmed points averaged at each end of a track for its summary.
    pub summary_window: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            reference_speed: 10.0,
            summary_min_points: 10,
            summary_window: 20,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.reference_speed > 0.0) || !self.reference_speed.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "reference_speed must be positive and finite, got {}",
                self.reference_speed
            )));
        }
        if self.summary_window == 0 {
            return Err(Error::InvalidConfig("summary_window must be positive".to_string()));
        }
        Ok(())
    }
}

/// Dominant compass direction in image coordinates (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Direction of travel from `start` to `end`.
    ///
    /// Horizontal wins only when it strictly dominates; ties and zero
    /// movement resolve vertically, with no movement reading as `Up`.
    pub fn between(start: &Velocity, end: &Velocity) -> Direction {
        let delta = end - start;
        if delta.x.abs() > delta.y.abs() {
            if delta.x > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if delta.y > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }
}

/// Movement summary of one long-lived track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub id: TrackId,
    /// Heading from the mean of the first points to the mean of the last ones.
    pub incoming: Direction,
    /// Heading from the mean of the last points back to the first ones.
    pub outgoing: Direction,
    /// Erratic-flight likelihood of the whole track.
    pub likelihood: f64,
}

/// Scores how likely a track's movement is to be erratic flight.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MovementClassifier {
    config: ClassifierConfig,
}

impl MovementClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Displacement vectors between consecutive confirmed points of a track.
    ///
    /// Missed frames are bridged, so a step across a gap is one displacement.
    pub fn displacements(track: &Track) -> Vec<Velocity> {
        track.segments().into_iter().map(|(a, b)| b - a).collect()
    }

    /// Likelihood in [0, 1] for a sequence of displacement vectors.
    ///
    /// An empty sequence scores 0.
    pub fn likelihood(&self, movement: &[Velocity]) -> f64 {
        if movement.is_empty() {
            return 0.0;
        }
        let total: f64 = movement.iter().map(|v| v.norm()).sum();
        let average = total / movement.len() as f64;
        (average / self.config.reference_speed).min(1.0)
    }

    /// Likelihood in [0, 1] for a track's full history.
    pub fn score(&self, track: &Track) -> f64 {
        self.likelihood(&Self::displacements(track))
    }

    /// Summarise a track, `None` when it has too few confirmed points.
    pub fn summarize(&self, track: &Track) -> Option<TrackSummary> {
        let points: Vec<Point> = track.confirmed_points().collect();
        if points.len() <= self.config.summary_min_points {
            return None;
        }

        let window = self.config.summary_window.min(points.len());
        let entry = mean_position(&points[..window]);
        let exit = mean_position(&points[points.len() - window..]);

        Some(TrackSummary {
            id: track.id,
            incoming: Direction::between(&entry, &exit),
            outgoing: Direction::between(&exit, &entry),
            likelihood: self.score(track),
        })
    }

    /// Summaries of every long-enough track, in input order.
    pub fn summarize_all<'a, I>(&self, tracks: I) -> Vec<TrackSummary>
    where
        I: IntoIterator<Item = &'a Track>,
    {
        tracks
            .into_iter()
            .filter_map(|track| self.summarize(track))
            .collect()
    }
}

fn mean_position(points: &[Point]) -> Velocity {
    let sum = points.iter().fold(Velocity::zeros(), |acc, p| {
        acc + Velocity::new(f64::from(p.x), f64::from(p.y))
    });
    sum / points.len() as f64
}
