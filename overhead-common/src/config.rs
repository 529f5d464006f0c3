//! Settings loading and database path resolution

use crate::geo::BoundingBox;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default database file name, created next to the executable
pub const DEFAULT_DB_FILE: &str = "flights.db";

/// Environment variable naming the database path
pub const DB_PATH_ENV: &str = "DB_PATH";

/// Ingestion feed settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Base URL of the snapshot feed; `/lat/{lat}/lon/{lon}/dist/{radius}` is appended
    pub base_url: String,
    /// Latitude the feed search is centred on
    pub center_lat: f64,
    /// Longitude the feed search is centred on
    pub center_lon: f64,
    pub timeout_secs: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: "https://opendata.adsb.fi/api/v2".to_string(),
            center_lat: -27.4495399,
            center_lon: 153.0486157,
            timeout_secs: 10,
        }
    }
}

/// Secondary flight-data source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationSettings {
    /// Feed endpoint returning flights inside a bounding box
    pub feed_url: String,
    /// Search radius around the detected aircraft, in metres
    pub radius_m: f64,
    pub timeout_secs: u64,
    /// Upper bound on correlation lookups in flight at once
    pub max_concurrent: usize,
    /// Request rate cap towards the secondary source
    pub requests_per_second: u32,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            feed_url: "https://data-cloud.flightradar24.com/zones/fcgi/feed.js".to_string(),
            radius_m: 1000.0,
            timeout_secs: 10,
            max_concurrent: 4,
            requests_per_second: 2,
        }
    }
}

/// Settings file contents; every field has a default so the file is optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db_path: Option<PathBuf>,
    pub geofence: BoundingBox,
    pub feed: FeedSettings,
    pub correlation: CorrelationSettings,
    pub poll_interval_secs: u64,
    /// Minutes east of UTC used for stored timestamps and day boundaries
    pub utc_offset_minutes: i32,
    /// Map viewer that `/go/:code` redirects to; the code is appended
    pub map_viewer_url: String,
    /// User-agent substrings refused by `/go/:code`
    pub blocked_user_agents: Vec<String>,
    /// JSON object of IATA airport code to airport name
    pub airports_file: Option<PathBuf>,
    /// JSON object of ICAO airline code to airline name
    pub airlines_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: None,
            geofence: BoundingBox::default(),
            feed: FeedSettings::default(),
            correlation: CorrelationSettings::default(),
            poll_interval_secs: 30,
            utc_offset_minutes: 600,
            map_viewer_url: "https://globe.adsb.fi/?icao=".to_string(),
            blocked_user_agents: vec!["Mastodon".to_string()],
            airports_file: None,
            airlines_file: None,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read settings {}: {}", path.display(), e))
        })?;

        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{} in {}", e, path.display())))
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        let g = &self.geofence;
        if g.top < g.bottom || g.right < g.left {
            return Err(Error::Config(format!(
                "Geofence is inverted: top {} bottom {} right {} left {}",
                g.top, g.bottom, g.right, g.left
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::Config("poll_interval_secs must be positive".to_string()));
        }
        if self.correlation.requests_per_second == 0 {
            return Err(Error::Config(
                "correlation.requests_per_second must be positive".to_string(),
            ));
        }
        if self.correlation.max_concurrent == 0 {
            return Err(Error::Config(
                "correlation.max_concurrent must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database path resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Settings file
/// 4. `flights.db` next to the executable (fallback)
pub fn resolve_db_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    settings: &Settings,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: Settings file
    if let Some(path) = &settings.db_path {
        return path.clone();
    }

    // Priority 4: Compiled default
    default_db_path()
}

fn default_db_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_DB_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}
