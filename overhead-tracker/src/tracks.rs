//! Track accumulation
//!
//! Keeps the most recent positions of every aircraft seen since startup.
//! Each cycle appends the latest fix and trims to a sliding window of
//! [`MAX_TRACK_POINTS`]; older points are dropped, never resampled.
//!
//! Tracks of aircraft missing from a cycle are kept (no expiry), so an
//! aircraft that drops out of coverage resumes its line when it returns.

use std::collections::{HashMap, VecDeque};

use overhead_common::Position;

use crate::feed::AircraftSnapshot;

/// Upper bound on stored points per aircraft
pub const MAX_TRACK_POINTS: usize = 1000;

/// `[lon, lat]` pairs, oldest first
pub type Track = Vec<[f64; 2]>;

/// A snapshot after accumulation
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedAircraft {
    pub snapshot: AircraftSnapshot,
    /// Normalized registration; `None` for aircraft kept out of history
    pub rego: Option<String>,
    /// Recent positions including this cycle's, when the aircraft is tracked
    pub track: Option<Track>,
}

impl TrackedAircraft {
    pub fn position(&self) -> Option<Position> {
        self.snapshot.position()
    }
}

/// Registration-keyed bounded position history
#[derive(Debug)]
pub struct TrackAccumulator {
    tracks: HashMap<String, VecDeque<[f64; 2]>>,
    max_points: usize,
}

impl Default for TrackAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackAccumulator {
    pub fn new() -> Self {
        Self::with_max_points(MAX_TRACK_POINTS)
    }

    pub fn with_max_points(max_points: usize) -> Self {
        Self {
            tracks: HashMap::new(),
            max_points: max_points.max(1),
        }
    }

    /// Fold one cycle's snapshot into history
    ///
    /// Every input comes back out in order. Aircraft without a resolvable
    /// registration are passed through untracked so they can still be
    /// geofenced on their instantaneous position. An aircraft with a
    /// registration but no position keeps its existing track unchanged.
    pub fn accumulate(&mut self, snapshots: Vec<AircraftSnapshot>) -> Vec<TrackedAircraft> {
        snapshots
            .into_iter()
            .map(|snapshot| {
                let Some(rego) = snapshot.rego() else {
                    return TrackedAircraft {
                        snapshot,
                        rego: None,
                        track: None,
                    };
                };

                let track = match snapshot.position() {
                    Some(position) => Some(self.append(&rego, position)),
                    None => self.track(&rego),
                };

                TrackedAircraft {
                    snapshot,
                    rego: Some(rego),
                    track,
                }
            })
            .collect()
    }

    fn append(&mut self, rego: &str, position: Position) -> Track {
        let points = self.tracks.entry(rego.to_string()).or_default();
        points.push_back(position.as_pair());
        while points.len() > self.max_points {
            points.pop_front();
        }
        points.iter().copied().collect()
    }

    /// Current track for a registration
    pub fn track(&self, rego: &str) -> Option<Track> {
        self.tracks
            .get(rego)
            .map(|points| points.iter().copied().collect())
    }

    pub fn track_len(&self, rego: &str) -> usize {
        self.tracks.get(rego).map_or(0, VecDeque::len)
    }

    /// Number of aircraft with history
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(rego: Option<&str>, lon: f64, lat: f64) -> AircraftSnapshot {
        AircraftSnapshot {
            registration: rego.map(str::to_string),
            lon: Some(lon),
            lat: Some(lat),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_sighting_starts_track() {
        let mut acc = TrackAccumulator::new();
        let out = acc.accumulate(vec![snapshot(Some("VH-ABC"), 153.0, -27.5)]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rego.as_deref(), Some("VH-ABC"));
        assert_eq!(out[0].track, Some(vec![[153.0, -27.5]]));
    }

    #[test]
    fn test_appends_oldest_first() {
        let mut acc = TrackAccumulator::new();
        acc.accumulate(vec![snapshot(Some("VH-ABC"), 1.0, 1.0)]);
        acc.accumulate(vec![snapshot(Some("VH-ABC"), 2.0, 2.0)]);
        let out = acc.accumulate(vec![snapshot(Some("VH-ABC"), 3.0, 3.0)]);

        assert_eq!(out[0].track, Some(vec![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]));
    }

    #[test]
    fn test_registration_normalized_for_identity() {
        let mut acc = TrackAccumulator::new();
        acc.accumulate(vec![snapshot(Some(" vh-abc"), 1.0, 1.0)]);
        acc.accumulate(vec![snapshot(Some("VH-ABC "), 2.0, 2.0)]);

        assert_eq!(acc.len(), 1);
        assert_eq!(acc.track_len("VH-ABC"), 2);
    }

    #[test]
    fn test_length_is_min_of_observations_and_cap() {
        let mut acc = TrackAccumulator::new();
        for i in 0..(MAX_TRACK_POINTS + 250) {
            acc.accumulate(vec![snapshot(Some("VH-ABC"), i as f64, 0.0)]);
            assert_eq!(acc.track_len("VH-ABC"), (i + 1).min(MAX_TRACK_POINTS));
        }
    }

    #[test]
    fn test_trim_drops_oldest_points() {
        let mut acc = TrackAccumulator::with_max_points(3);
        let mut out = Vec::new();
        for i in 0..5 {
            out = acc.accumulate(vec![snapshot(Some("VH-ABC"), i as f64, 0.0)]);
        }
        assert_eq!(out[0].track, Some(vec![[2.0, 0.0], [3.0, 0.0], [4.0, 0.0]]));
    }

    #[test]
    fn test_unresolvable_registration_passes_through_untracked() {
        let mut acc = TrackAccumulator::new();
        let out = acc.accumulate(vec![
            snapshot(None, 1.0, 1.0),
            snapshot(Some("  "), 2.0, 2.0),
            snapshot(Some("VH-ABC"), 3.0, 3.0),
        ]);

        assert_eq!(out.len(), 3, "untracked aircraft still returned");
        assert_eq!(out[0].track, None);
        assert_eq!(out[0].position(), Some(Position::new(1.0, 1.0)));
        assert_eq!(out[1].rego, None);
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn test_absent_aircraft_history_is_retained() {
        let mut acc = TrackAccumulator::new();
        acc.accumulate(vec![snapshot(Some("VH-AAA"), 1.0, 1.0)]);
        let out = acc.accumulate(vec![snapshot(Some("VH-BBB"), 2.0, 2.0)]);

        assert_eq!(out.len(), 1, "returned set is this cycle's aircraft only");
        assert_eq!(acc.track_len("VH-AAA"), 1);

        let out = acc.accumulate(vec![snapshot(Some("VH-AAA"), 1.5, 1.5)]);
        assert_eq!(out[0].track, Some(vec![[1.0, 1.0], [1.5, 1.5]]));
    }

    #[test]
    fn test_missing_position_does_not_append() {
        let mut acc = TrackAccumulator::new();
        acc.accumulate(vec![snapshot(Some("VH-ABC"), 1.0, 1.0)]);
        let out = acc.accumulate(vec![AircraftSnapshot {
            registration: Some("VH-ABC".to_string()),
            ..Default::default()
        }]);

        assert_eq!(out[0].track, Some(vec![[1.0, 1.0]]));
        assert_eq!(acc.track_len("VH-ABC"), 1);
    }
}
