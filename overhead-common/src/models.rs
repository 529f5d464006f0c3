//! Position history models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Elevation reported in grouped output when none was recorded
///
/// Kept distinct from `0.0`, which means the aircraft reported being on the ground.
pub const MISSING_ELEVATION: f64 = -1.0;

/// One observation of one aircraft, as persisted in `locations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Local timestamp, `YYYY-MM-DDTHH:MM:SS`
    pub timestamp: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rego: String,
    /// Barometric altitude in feet; `Some(0.0)` on the ground, `None` when unreported
    pub elevation: Option<f64>,
}

/// Last-observed descriptive data for an aircraft, keyed by registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AircraftMetadata {
    pub rego: String,
    pub model: Option<String>,
    pub airline: Option<String>,
    pub category: Option<String>,
    pub year: Option<String>,
    pub own_op: Option<String>,
}

/// `[lon, lat, elevation]` with [`MISSING_ELEVATION`] standing in for null
pub type TrackPoint = [f64; 3];

/// Ordered points for one aircraft within a queried range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedTrack {
    pub points: Vec<TrackPoint>,
}

/// Tracks grouped by registration; ordered map so responses are stable
pub type GroupedTracks = BTreeMap<String, GroupedTrack>;

/// First and last calendar dates present in position history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}
