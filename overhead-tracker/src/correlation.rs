//! Secondary-source correlation
//!
//! Enriches a detected aircraft with route data by asking a flight-data
//! service (the FlightRadar24 zone feed) for every flight in a small box
//! around its position, then picking the matching one:
//! - exactly one candidate: accepted as is
//! - several: the one whose registration matches, case-insensitively
//! - otherwise: a miss, logged at info level
//!
//! Correlation is best-effort. Transport errors, timeouts and malformed
//! responses all come back as `None` so the caller announces without a route.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use overhead_common::config::CorrelationSettings;
use overhead_common::Position;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::feed::normalize_identifier;
use crate::{TrackerError, TrackerResult};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Browser-like agent; the zone feed rejects unknown clients
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// A flight as reported by the secondary source
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlightRecord {
    pub registration: Option<String>,
    pub origin_airport_iata: Option<String>,
    pub destination_airport_iata: Option<String>,
    pub number: Option<String>,
    pub callsign: Option<String>,
}

impl FlightRecord {
    /// Origin and destination, when both are known
    pub fn route(&self) -> Option<(&str, &str)> {
        match (&self.origin_airport_iata, &self.destination_airport_iata) {
            (Some(origin), Some(destination)) => Some((origin.as_str(), destination.as_str())),
            _ => None,
        }
    }
}

/// Latitude/longitude box in the zone feed's `bounds` order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneBounds {
    pub lat_max: f64,
    pub lat_min: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl ZoneBounds {
    /// Square box whose half-side is `radius_m`, centred on `position`
    ///
    /// Corners are found by travelling the half-diagonal along the 45° and
    /// 225° bearings on a spherical Earth.
    pub fn around(position: Position, radius_m: f64) -> Self {
        let half_side_km = radius_m.abs() / 1000.0;
        let lat = position.lat.to_radians();
        let lon = position.lon.to_radians();
        let angular = (2.0 * half_side_km.powi(2)).sqrt() / EARTH_RADIUS_KM;

        let corner = |bearing_deg: f64| {
            let bearing = bearing_deg.to_radians();
            let corner_lat =
                (lat.sin() * angular.cos() + lat.cos() * angular.sin() * bearing.cos()).asin();
            let corner_lon = lon
                + (bearing.sin() * angular.sin() * lat.cos())
                    .atan2(angular.cos() - lat.sin() * corner_lat.sin());
            (corner_lat.to_degrees(), corner_lon.to_degrees())
        };

        let (lat_min, lon_min) = corner(225.0);
        let (lat_max, lon_max) = corner(45.0);

        Self {
            lat_max,
            lat_min,
            lon_min,
            lon_max,
        }
    }
}

impl fmt::Display for ZoneBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6},{:.6},{:.6},{:.6}",
            self.lat_max, self.lat_min, self.lon_min, self.lon_max
        )
    }
}

/// Source of flights inside a bounding box
#[async_trait]
pub trait FlightSource: Send + Sync {
    async fn flights_in(&self, bounds: &ZoneBounds) -> TrackerResult<Vec<FlightRecord>>;
}

/// FlightRadar24 zone feed client
pub struct FlightRadarClient {
    http_client: Client,
    feed_url: String,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl FlightRadarClient {
    pub fn new(settings: &CorrelationSettings) -> TrackerResult<Self> {
        let per_second = NonZeroU32::new(settings.requests_per_second).ok_or_else(|| {
            TrackerError::Config("correlation.requests_per_second must be positive".to_string())
        })?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http_client,
            feed_url: settings.feed_url.clone(),
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }
}

#[async_trait]
impl FlightSource for FlightRadarClient {
    async fn flights_in(&self, bounds: &ZoneBounds) -> TrackerResult<Vec<FlightRecord>> {
        self.rate_limiter.until_ready().await;

        let bounds_param = bounds.to_string();
        let response = self
            .http_client
            .get(&self.feed_url)
            .query(&[
                ("bounds", bounds_param.as_str()),
                ("faa", "1"),
                ("satellite", "1"),
                ("mlat", "1"),
                ("flarm", "1"),
                ("adsb", "1"),
                ("gnd", "1"),
                ("air", "1"),
                ("vehicles", "1"),
                ("estimated", "1"),
                ("maxage", "14400"),
                ("gliders", "1"),
                ("stats", "1"),
                ("limit", "5000"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| TrackerError::Parse(format!("Invalid zone feed: {}", e)))?;

        let flights = parse_zone_feed(&body)?;
        debug!(bounds = %bounds_param, count = flights.len(), "Fetched zone feed");
        Ok(flights)
    }
}

/// Extract flight records from a zone feed document
///
/// Flights are arrays keyed by flight id; bookkeeping entries such as
/// `full_count`, `version` and `stats` are not arrays and are skipped.
pub fn parse_zone_feed(body: &Value) -> TrackerResult<Vec<FlightRecord>> {
    let entries = body
        .as_object()
        .ok_or_else(|| TrackerError::Parse("Zone feed is not an object".to_string()))?;

    Ok(entries
        .values()
        .filter_map(Value::as_array)
        .map(|info| FlightRecord {
            registration: text_at(info, 9),
            origin_airport_iata: text_at(info, 11),
            destination_airport_iata: text_at(info, 12),
            number: text_at(info, 13),
            callsign: text_at(info, 16),
        })
        .collect())
}

fn text_at(info: &[Value], index: usize) -> Option<String> {
    info.get(index)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Pick the flight matching `rego` from a candidate list
///
/// A single candidate is accepted without checking its registration.
pub fn select_candidate(mut candidates: Vec<FlightRecord>, rego: &str) -> Option<FlightRecord> {
    if candidates.len() == 1 {
        return candidates.pop();
    }

    let wanted = normalize_identifier(rego)?;
    candidates.into_iter().find(|flight| {
        flight
            .registration
            .as_deref()
            .is_some_and(|reg| reg.trim().eq_ignore_ascii_case(&wanted))
    })
}

/// Best-effort correlation with bounded fan-out and a per-lookup deadline
pub struct CorrelationClient {
    source: Arc<dyn FlightSource>,
    radius_m: f64,
    timeout: Duration,
    permits: Semaphore,
}

impl CorrelationClient {
    pub fn new(source: Arc<dyn FlightSource>, settings: &CorrelationSettings) -> Self {
        Self {
            source,
            radius_m: settings.radius_m,
            timeout: Duration::from_secs(settings.timeout_secs),
            permits: Semaphore::new(settings.max_concurrent.max(1)),
        }
    }

    /// Route data for the aircraft at `position`, or `None`
    pub async fn correlate(&self, position: Position, rego: &str) -> Option<FlightRecord> {
        let Ok(_permit) = self.permits.acquire().await else {
            return None;
        };

        let bounds = ZoneBounds::around(position, self.radius_m);
        let lookup = tokio::time::timeout(self.timeout, self.source.flights_in(&bounds)).await;

        let candidates = match lookup {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => {
                warn!(rego = %rego, "Correlation lookup failed: {}", e);
                return None;
            }
            Err(_) => {
                warn!(rego = %rego, timeout_secs = self.timeout.as_secs(), "Correlation lookup timed out");
                return None;
            }
        };

        let candidate_count = candidates.len();
        let summary = if candidate_count > 1 {
            serde_json::to_string(&candidates).unwrap_or_default()
        } else {
            String::new()
        };

        let selected = select_candidate(candidates, rego);
        if selected.is_none() {
            info!(
                rego = %rego,
                candidates = candidate_count,
                "Correlation miss: no matching flight {}",
                summary
            );
        }
        selected
    }
}
