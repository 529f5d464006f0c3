//! Ingestion feed client
//!
//! Fetches the aircraft currently within a radius of a fixed point from an
//! adsb.fi style `v2` endpoint:
//! `GET {base}/lat/{lat}/lon/{lon}/dist/{radius}` returning `{"aircraft": [...]}`.
//!
//! Every per-aircraft field is optional on the wire; accessors normalize the
//! pieces the pipeline cares about (registration, position, elevation).

use async_trait::async_trait;
use overhead_common::config::FeedSettings;
use overhead_common::Position;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::{TrackerError, TrackerResult};

/// Marker the feed sends in place of a number when the aircraft is on the ground
pub const ON_GROUND_MARKER: &str = "ground";

/// Barometric altitude as sent by the feed: feet, or a marker string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BaroAltitude {
    Feet(f64),
    Marker(String),
}

/// One aircraft in one polling cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftSnapshot {
    /// 24-bit ICAO transponder address, hex encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
    /// Registration (rego)
    #[serde(rename = "r", default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_baro: Option<BaroAltitude>,
    /// Flight designator / callsign, often space padded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight: Option<String>,
    /// Emitter category code (A1..A7, B1.., etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Aircraft type description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// Aircraft type designator
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub type_code: Option<String>,
    /// Registered owner / operator
    #[serde(rename = "ownOp", default, skip_serializing_if = "Option::is_none")]
    pub own_op: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<String>,
}

impl AircraftSnapshot {
    /// Registration trimmed and uppercased; `None` when missing or blank
    pub fn rego(&self) -> Option<String> {
        normalize_identifier(self.registration.as_deref()?)
    }

    /// Position, when the feed reported both coordinates
    pub fn position(&self) -> Option<Position> {
        match (self.lon, self.lat) {
            (Some(lon), Some(lat)) => Some(Position::new(lon, lat)),
            _ => None,
        }
    }

    /// Elevation in feet: the on-ground marker maps to 0, absence stays absent
    pub fn elevation(&self) -> Option<f64> {
        match &self.alt_baro {
            Some(BaroAltitude::Feet(feet)) => Some(*feet),
            Some(BaroAltitude::Marker(marker)) if marker.eq_ignore_ascii_case(ON_GROUND_MARKER) => {
                Some(0.0)
            }
            _ => None,
        }
    }

    /// Flight designator without padding
    pub fn flight_number(&self) -> Option<&str> {
        self.flight.as_deref().map(str::trim).filter(|f| !f.is_empty())
    }
}

/// Trim and uppercase an identifier; blank identifiers are unresolvable
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) => Some(text),
        Some(Raw::Number(number)) => Some(number.to_string()),
        None => None,
    })
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    aircraft: Vec<AircraftSnapshot>,
}

/// Parse a feed document; a missing `aircraft` array is an empty snapshot
pub fn parse_feed(body: &str) -> TrackerResult<Vec<AircraftSnapshot>> {
    let response: FeedResponse = serde_json::from_str(body)
        .map_err(|e| TrackerError::Parse(format!("Invalid feed document: {}", e)))?;
    Ok(response.aircraft)
}

/// Source of per-cycle aircraft snapshots
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> TrackerResult<Vec<AircraftSnapshot>>;
}

/// HTTP client for the ADS-B feed
pub struct AdsbFeedClient {
    http_client: Client,
    url: String,
}

impl AdsbFeedClient {
    /// Build a client for the configured centre point and search radius
    pub fn new(settings: &FeedSettings, radius: f64) -> TrackerResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("overhead-tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            url: feed_url(settings, radius),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Feed URL for a centre point and radius
pub fn feed_url(settings: &FeedSettings, radius: f64) -> String {
    format!(
        "{}/lat/{}/lon/{}/dist/{}",
        settings.base_url.trim_end_matches('/'),
        settings.center_lat,
        settings.center_lon,
        radius
    )
}

#[async_trait]
impl SnapshotSource for AdsbFeedClient {
    async fn fetch(&self) -> TrackerResult<Vec<AircraftSnapshot>> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TrackerError::Timeout("aircraft feed")
                } else {
                    TrackerError::Http(e)
                }
            })?
            .error_for_status()?;

        let body = response.text().await?;
        let aircraft = parse_feed(&body)?;
        debug!(count = aircraft.len(), "Fetched aircraft snapshot");
        Ok(aircraft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "aircraft": [
            {
                "hex": "7c6b2d",
                "r": " vh-vxa ",
                "t": "B738",
                "desc": "BOEING 737-800",
                "ownOp": "QANTAS AIRWAYS LTD",
                "year": "2002",
                "flight": "QFA512  ",
                "category": "A3",
                "lat": -27.49,
                "lon": 153.0,
                "alt_baro": 3250
            },
            {
                "hex": "7c0001",
                "r": "VH-GND",
                "lat": -27.38,
                "lon": 153.11,
                "alt_baro": "ground",
                "year": 1998
            },
            { "hex": "7c0002" }
        ],
        "ctime": 1722150000000,
        "total": 3
    }"#;

    #[test]
    fn test_parse_sample_feed() {
        let aircraft = parse_feed(SAMPLE).unwrap();
        assert_eq!(aircraft.len(), 3);

        let first = &aircraft[0];
        assert_eq!(first.rego().as_deref(), Some("VH-VXA"));
        assert_eq!(first.position(), Some(Position::new(153.0, -27.49)));
        assert_eq!(first.elevation(), Some(3250.0));
        assert_eq!(first.flight_number(), Some("QFA512"));
        assert_eq!(first.own_op.as_deref(), Some("QANTAS AIRWAYS LTD"));
        assert_eq!(first.year.as_deref(), Some("2002"));
    }

    #[test]
    fn test_on_ground_marker_maps_to_zero() {
        let aircraft = parse_feed(SAMPLE).unwrap();
        assert_eq!(aircraft[1].elevation(), Some(0.0));
        assert_eq!(aircraft[1].year.as_deref(), Some("1998"));
    }

    #[test]
    fn test_missing_fields_stay_absent() {
        let aircraft = parse_feed(SAMPLE).unwrap();
        let bare = &aircraft[2];
        assert_eq!(bare.rego(), None);
        assert_eq!(bare.position(), None);
        assert_eq!(bare.elevation(), None, "missing altitude is not zero");
        assert_eq!(bare.flight_number(), None);
    }

    #[test]
    fn test_unknown_marker_is_absent() {
        let snapshot = AircraftSnapshot {
            alt_baro: Some(BaroAltitude::Marker("unknown".to_string())),
            ..Default::default()
        };
        assert_eq!(snapshot.elevation(), None);
    }

    #[test]
    fn test_blank_registration_is_unresolvable() {
        let snapshot = AircraftSnapshot {
            registration: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(snapshot.rego(), None);
    }

    #[test]
    fn test_missing_aircraft_array_is_empty() {
        assert!(parse_feed(r#"{"total": 0}"#).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_document_is_parse_error() {
        assert!(matches!(parse_feed("<html>"), Err(TrackerError::Parse(_))));
    }

    #[test]
    fn test_feed_url() {
        let settings = FeedSettings {
            base_url: "https://opendata.adsb.fi/api/v2/".to_string(),
            ..FeedSettings::default()
        };
        assert_eq!(
            feed_url(&settings, 15.0),
            "https://opendata.adsb.fi/api/v2/lat/-27.4495399/lon/153.0486157/dist/15"
        );
    }

    #[test]
    fn test_serialized_snapshot_uses_feed_field_names() {
        let aircraft = parse_feed(SAMPLE).unwrap();
        let value = serde_json::to_value(&aircraft[0]).unwrap();
        assert_eq!(value["r"], " vh-vxa ");
        assert_eq!(value["ownOp"], "QANTAS AIRWAYS LTD");
        assert!(value.get("registration").is_none());
    }
}
