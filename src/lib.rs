//! # Batometer - Motion Detection Tracking Library
//!
//! Turns per-frame, unordered sets of anonymous bounding boxes (as produced by a
//! background-subtraction motion detector) into persistent, identified tracks.
//!
//! ## Features
//!
//! - Gated nearest-neighbour association with a gate that widens while a track is missed
//! - Constant-velocity extrapolation across detection gaps
//! - Flow field aggregation of long-lived tracks
//! - Track heatmap accumulation
//! - Movement pattern scoring and per-track movement summaries
//!
//! ## Example
//!
//! ```rust,ignore
//! use batometer_rs::{Detection, Tracker, TrackerConfig};
//!
//! let mut tracker = Tracker::new(TrackerConfig::default());
//!
//! let frame = vec![Detection::new(10, 10, 5, 5), Detection::new(100, 100, 5, 5)];
//! let update = tracker.update(frame);
//! for track in &update.matched {
//!     println!("{} at {:?}", track.id, track.position());
//! }
//! ```

// Public modules
pub mod geometry;
pub mod detection;
pub mod track;
pub mod matching;
pub mod tracker;
pub mod flow;
pub mod classifier;
pub mod heatmap;
pub mod config;

// Re-exports for convenience
pub use geometry::{Point, Velocity};
pub use detection::Detection;
pub use track::{Track, TrackId};
pub use matching::MatchingStrategy;
pub use tracker::{FrameTracks, Tracker, TrackerConfig};
pub use flow::{FlowCell, FlowConfig, FlowField};
pub use classifier::{ClassifierConfig, Direction, MovementClassifier, TrackSummary};
pub use heatmap::{HeatmapConfig, TrackHeatmap};
pub use config::Settings;

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur in the batometer library
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Settings parse error: {0}")]
        Json(#[from] serde_json::Error),
    }

    /// Result type for batometer operations
    pub type Result<T> = std::result::Result<T, Error>;
}
