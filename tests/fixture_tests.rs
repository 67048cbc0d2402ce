//! End-to-end fixture tests for the tracker.
//!
//! Each fixture scripts a sequence of frames and the ids the tracker must
//! report for every one of them.
//!
//! Run with: cargo test fixture

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use batometer_rs::{Detection, Point, TrackId, Tracker, TrackerConfig};

// ============================================================================
// Fixture JSON Schema
// ============================================================================

#[derive(Debug, Deserialize)]
struct Fixture {
    #[allow(dead_code)]
    description: String,
    tracker_config: TrackerConfig,
    steps: Vec<Step>,
    final_positions: BTreeMap<TrackId, [i32; 2]>,
    total_tracks: usize,
}

#[derive(Debug, Deserialize)]
struct Step {
    frame_id: usize,
    /// Boxes as [x, y, width, height].
    detections: Vec<[i32; 4]>,
    matched_ids: Vec<TrackId>,
    unmatched_ids: Vec<TrackId>,
}

// ============================================================================
// Test Helpers
// ============================================================================

fn find_testdata_dir() -> PathBuf {
    let candidates = [
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/fixtures"),
        PathBuf::from("testdata/fixtures"),
        PathBuf::from("../testdata/fixtures"),
    ];

    for candidate in &candidates {
        if candidate.exists() {
            return candidate.clone();
        }
    }
    panic!("Could not find testdata/fixtures directory");
}

fn load_fixture(scenario: &str) -> Fixture {
    let path = find_testdata_dir().join(format!("fixture_{}.json", scenario));

    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture file {:?}: {}", path, e));

    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture file {:?}: {}", path, e))
}

fn run_fixture(scenario: &str) {
    let fixture = load_fixture(scenario);
    let mut tracker = Tracker::new(fixture.tracker_config.clone());

    for step in &fixture.steps {
        let detections: Vec<Detection> = step
            .detections
            .iter()
            .map(|&[x, y, w, h]| Detection::new(x, y, w, h))
            .collect();

        let frame = tracker.update(detections);
        let unmatched: Vec<TrackId> = frame.unmatched_live.iter().map(|t| t.id).collect();

        assert_eq!(
            frame.matched_ids(),
            step.matched_ids,
            "{}: matched ids diverge at frame {}",
            scenario,
            step.frame_id
        );
        assert_eq!(
            unmatched, step.unmatched_ids,
            "{}: unmatched ids diverge at frame {}",
            scenario, step.frame_id
        );
    }

    assert_eq!(tracker.total_track_count(), fixture.total_tracks, "{}: track count", scenario);
    for (id, [x, y]) in &fixture.final_positions {
        let track = tracker
            .get(*id)
            .unwrap_or_else(|| panic!("{}: track {} missing", scenario, id));
        assert_eq!(track.position(), Point::new(*x, *y), "{}: track {} position", scenario, id);
        assert_eq!(track.history.len() + track_birth_frame(&fixture, *id) - 1, fixture.steps.len());
    }
}

// Frame in which `id` first appears in the matched ids (1-based).
fn track_birth_frame(fixture: &Fixture, id: TrackId) -> usize {
    fixture
        .steps
        .iter()
        .position(|s| s.matched_ids.contains(&id))
        .map(|i| i + 1)
        .unwrap_or_else(|| panic!("track {} never matched", id))
}

// ============================================================================
// Fixture Tests
// ============================================================================

#[test]
fn test_fixture_crossing() {
    run_fixture("crossing");
}

#[test]
fn test_fixture_coasting() {
    run_fixture("coasting");
}

#[test]
fn test_fixture_nearest_first() {
    run_fixture("nearest_first");
}
