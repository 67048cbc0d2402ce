//! Main tracker implementation.
//!
//! The tracker is the association engine: once per frame it reconciles the
//! frame's detections with the live tracks, spawns tracks for unmatched
//! detections and retires tracks that have been missed for too long.
//!
//! Every track ever created stays in the tracker's archive, keyed by id, so
//! downstream analytics can read full histories after a track has expired.
//! `update` is not re-entrant; callers that detect in parallel must feed
//! frames into the tracker one at a time, in order.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::detection::dedup_detections;
use crate::matching::{get_unmatched, MatchingStrategy};
use crate::{Detection, Track, TrackId};

/// Configuration for the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Base gating radius in pixels, given to every new track.
    pub prediction_range: u32,

    /// Tracks missed for more than this many consecutive frames are retired.
    pub max_missed_frames: u32,

    /// Confirmed points a track needs before it may be matched after a miss.
    ///
    /// Tracks below this count are only matched while they are being seen on
    /// consecutive frames. `0` or `1` lets every track coast.
    pub min_hits_to_coast: u32,

    /// How gated detections are assigned to tracks.
    pub matching: MatchingStrategy,
}

impl TrackerConfig {
    /// Create a configuration with the given gate and expiry, other values default.
    pub fn new(prediction_range: u32, max_missed_frames: u32) -> Self {
        Self {
            prediction_range,
            max_missed_frames,
            ..Self::default()
        }
    }

    /// Select the matching strategy.
    pub fn with_matching(mut self, matching: MatchingStrategy) -> Self {
        self.matching = matching;
        self
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            prediction_range: 30,
            max_missed_frames: 10,
            min_hits_to_coast: 2,
            matching: MatchingStrategy::FirstFit,
        }
    }
}

/// Result of one tracker update.
#[derive(Debug)]
pub struct FrameTracks<'a> {
    /// Tracks matched or created this frame, in creation order.
    pub matched: Vec<&'a Track>,

    /// Live tracks that found no detection this frame, in creation order.
    pub unmatched_live: Vec<&'a Track>,
}

impl FrameTracks<'_> {
    /// Ids of the tracks matched or created this frame.
    pub fn matched_ids(&self) -> Vec<TrackId> {
        self.matched.iter().map(|t| t.id).collect()
    }
}

/// Object tracker.
///
/// Maintains the live track set and the archive of every track ever created,
/// matching new detections to live tracks and managing track lifecycles.
#[derive(Debug, Clone, Default)]
pub struct Tracker {
    /// Tracker configuration.
    pub config: TrackerConfig,

    /// Every track ever created, keyed by id.
    tracks: BTreeMap<TrackId, Track>,

    /// Ids of live tracks, in creation order.
    live: Vec<TrackId>,

    next_id: TrackId,

    frame_count: u64,
}

impl Tracker {
    /// Create a new tracker with the given configuration.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracks: BTreeMap::new(),
            live: Vec::new(),
            next_id: 0,
            frame_count: 0,
        }
    }

    /// Update the tracker with this frame's detections.
    ///
    /// Duplicate detections collapse to one. Coordinates are used as given,
    /// whatever their sign or range.
    ///
    /// # Returns
    /// The tracks matched or created this frame, and the live tracks that were missed.
    pub fn update<I>(&mut self, detections: I) -> FrameTracks<'_>
    where
        I: IntoIterator<Item = Detection>,
    {
        self.frame_count += 1;
        let detections = dedup_detections(detections);

        self.expire_tracks();

        // Tracks without a motion estimate are not resumed after a miss
        let min_hits = self.config.min_hits_to_coast as usize;
        let candidate_ids: Vec<TrackId> = self
            .live
            .iter()
            .copied()
            .filter(|id| {
                self.tracks
                    .get(id)
                    .is_some_and(|t| t.missed_tracks == 0 || t.confirmed_count() >= min_hits)
            })
            .collect();

        let (matched_dets, matched_tracks) = {
            let candidates: Vec<&Track> = candidate_ids
                .iter()
                .filter_map(|id| self.tracks.get(id))
                .collect();
            self.config.matching.assign(&candidates, &detections)
        };

        let mut seen: HashSet<TrackId> = HashSet::with_capacity(self.live.len() + detections.len());
        for (&det_idx, &track_idx) in matched_dets.iter().zip(matched_tracks.iter()) {
            let id = candidate_ids[track_idx];
            let det = &detections[det_idx];
            if let Some(track) = self.tracks.get_mut(&id) {
                trace!(track_id = id, x = det.origin.x, y = det.origin.y, "matched detection");
                track.update_with_point(det.origin, det.width, det.height);
                seen.insert(id);
            }
        }

        for id in &self.live {
            if seen.contains(id) {
                continue;
            }
            if let Some(track) = self.tracks.get_mut(id) {
                track.update_without_point();
            }
        }

        for det_idx in get_unmatched(detections.len(), &matched_dets) {
            let id = self.create_track(detections[det_idx]);
            seen.insert(id);
        }

        debug!(
            frame = self.frame_count,
            detections = detections.len(),
            matched = matched_dets.len(),
            live = self.live.len(),
            "tracker update"
        );

        let mut frame = FrameTracks {
            matched: Vec::with_capacity(seen.len()),
            unmatched_live: Vec::new(),
        };
        for id in &self.live {
            if let Some(track) = self.tracks.get(id) {
                if seen.contains(id) {
                    frame.matched.push(track);
                } else {
                    frame.unmatched_live.push(track);
                }
            }
        }
        frame
    }

    /// Live tracks in creation order.
    pub fn live_tracks(&self) -> impl Iterator<Item = &Track> + '_ {
        self.live.iter().filter_map(|id| self.tracks.get(id))
    }

    /// Every track ever created, in id order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> + '_ {
        self.tracks.values()
    }

    /// Look up any track, live or retired.
    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Whether `id` is still being matched against.
    pub fn is_live(&self, id: TrackId) -> bool {
        self.live.contains(&id)
    }

    /// Get the total number of tracks created.
    pub fn total_track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Get the current number of live tracks.
    pub fn live_track_count(&self) -> usize {
        self.live.len()
    }

    /// Number of update calls so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    // Internal: retire tracks missed for more than max_missed_frames
    fn expire_tracks(&mut self) {
        let max_missed = self.config.max_missed_frames;
        let tracks = &self.tracks;
        self.live.retain(|id| match tracks.get(id) {
            Some(track) if track.is_expired(max_missed) => {
                debug!(track_id = id, history = track.history.len(), "track expired");
                false
            }
            Some(_) => true,
            None => false,
        });
    }

    // Internal: start a new track for an unmatched detection
    fn create_track(&mut self, detection: Detection) -> TrackId {
        let id = self.next_id;
        self.next_id += 1;

        debug!(
            track_id = id,
            x = detection.origin.x,
            y = detection.origin.y,
            "new track"
        );

        self.tracks
            .insert(id, Track::new(id, detection, self.config.prediction_range));
        self.live.push(id);
        id
    }
}
