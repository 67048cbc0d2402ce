//! Settings bundle for every tunable in the library.
//!
//! All sections and fields are optional in the JSON form; anything missing
//! takes its default.
//!
//! ```json
//! {
//!   "tracker": { "prediction_range": 30, "max_missed_frames": 10, "matching": "first_fit" },
//!   "flow": { "cell_size": 32 },
//!   "classifier": { "reference_speed": 10.0, "summary_window": 20 }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    ClassifierConfig, FlowConfig, FlowField, HeatmapConfig, MovementClassifier, Result,
    TrackHeatmap, Tracker, TrackerConfig,
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tracker: TrackerConfig,
    pub flow: FlowConfig,
    pub classifier: ClassifierConfig,
    pub heatmap: HeatmapConfig,
}

impl Settings {
    /// Parse settings from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.flow.validate()?;
        self.classifier.validate()?;
        self.heatmap.validate()?;
        Ok(())
    }

    pub fn build_tracker(&self) -> Tracker {
        Tracker::new(self.tracker.clone())
    }

    pub fn build_flow_field(&self, frame_width: u32, frame_height: u32) -> Result<FlowField> {
        FlowField::new(frame_width, frame_height, self.flow.clone())
    }

    pub fn build_classifier(&self) -> Result<MovementClassifier> {
        MovementClassifier::new(self.classifier.clone())
    }

    pub fn build_heatmap(&self, frame_width: u32, frame_height: u32) -> Result<TrackHeatmap> {
        TrackHeatmap::new(frame_width, frame_height, self.heatmap.clone())
    }
}
