//! Detection-to-track matching algorithms.
//!
//! Both strategies are greedy and neither is globally optimal. Given the same
//! track order and detection order they are fully deterministic.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::{Detection, Track};

/// How gated detections are assigned to live tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingStrategy {
    /// Visit tracks in creation order; each takes the first remaining detection
    /// inside its gate.
    #[default]
    FirstFit,

    /// Commit gated (detection, track) pairs in ascending distance order.
    NearestFirst,
}

impl MatchingStrategy {
    /// Match detections to tracks.
    ///
    /// # Returns
    /// Tuple of (matched_det_indices, matched_track_indices) where entry i
    /// indicates the matched pair.
    pub fn assign(&self, tracks: &[&Track], detections: &[Detection]) -> (Vec<usize>, Vec<usize>) {
        match self {
            MatchingStrategy::FirstFit => match_first_fit(tracks, detections),
            MatchingStrategy::NearestFirst => {
                let distances = gated_distance_matrix(tracks, detections);
                match_detections_and_objects(&distances)
            }
        }
    }
}

/// Gated distance matrix (n_detections x n_tracks).
///
/// Entries are the distance from the detection anchor to the track's predicted
/// position, or infinity when the detection falls outside the track's gate.
pub fn gated_distance_matrix(tracks: &[&Track], detections: &[Detection]) -> DMatrix<f64> {
    DMatrix::from_fn(detections.len(), tracks.len(), |i, j| {
        tracks[j].gate_distance(&detections[i]).unwrap_or(f64::INFINITY)
    })
}

/// First-fit matching: tracks are served in order, each claiming the first
/// unclaimed detection inside its gate.
pub fn match_first_fit(tracks: &[&Track], detections: &[Detection]) -> (Vec<usize>, Vec<usize>) {
    let mut used_dets = vec![false; detections.len()];
    let mut matched_dets = Vec::new();
    let mut matched_tracks = Vec::new();

    for (track_idx, track) in tracks.iter().enumerate() {
        let hit = detections
            .iter()
            .enumerate()
            .find(|(det_idx, det)| !used_dets[*det_idx] && track.is_self(det));

        if let Some((det_idx, _)) = hit {
            used_dets[det_idx] = true;
            matched_dets.push(det_idx);
            matched_tracks.push(track_idx);
        }
    }

    (matched_dets, matched_tracks)
}

/// Match detections to tracks using greedy minimum-distance matching.
///
/// Non-finite entries are never matched. Ties are broken by detection index,
/// then track index.
///
/// # Arguments
/// * `distance_matrix` - Distance matrix (n_detections x n_tracks)
pub fn match_detections_and_objects(distance_matrix: &DMatrix<f64>) -> (Vec<usize>, Vec<usize>) {
    let n_detections = distance_matrix.nrows();
    let n_tracks = distance_matrix.ncols();

    if n_detections == 0 || n_tracks == 0 {
        return (Vec::new(), Vec::new());
    }

    let mut pairs: Vec<(f64, usize, usize)> = Vec::new();
    for i in 0..n_detections {
        for j in 0..n_tracks {
            let dist = distance_matrix[(i, j)];
            if dist.is_finite() {
                pairs.push((dist, i, j));
            }
        }
    }

    // Stable sort keeps row-major order among equal distances
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut used_dets = vec![false; n_detections];
    let mut used_tracks = vec![false; n_tracks];

    let mut matched_dets = Vec::new();
    let mut matched_tracks = Vec::new();

    for (_dist, det_idx, track_idx) in pairs {
        if used_dets[det_idx] || used_tracks[track_idx] {
            continue;
        }

        matched_dets.push(det_idx);
        matched_tracks.push(track_idx);
        used_dets[det_idx] = true;
        used_tracks[track_idx] = true;
    }

    (matched_dets, matched_tracks)
}

/// Get unmatched indices from a match result.
pub fn get_unmatched(total: usize, matched: &[usize]) -> Vec<usize> {
    let mut is_matched = vec![false; total];
    for &idx in matched {
        is_matched[idx] = true;
    }
    (0..total).filter(|&i| !is_matched[i]).collect()
}
