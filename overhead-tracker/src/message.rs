//! Notification message formatting
//!
//! Turns a detected aircraft (plus optional route data) into one line of
//! human-readable text. Airport and airline names come from optional lookup
//! tables; when a code is unknown it is shown as is.

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::correlation::FlightRecord;
use crate::feed::{normalize_identifier, AircraftSnapshot};
use crate::{TrackerError, TrackerResult};

/// Emitter category for rotorcraft
const HELICOPTER_CATEGORY: &str = "A7";

/// Categories whose flight designators carry a usable ICAO airline prefix.
/// Light aircraft callsigns rarely map to an airline code.
const AIRLINE_CATEGORIES: [&str; 3] = ["A0", "A2", "A5"];

const UNKNOWN_OPERATOR: &str = "Unknown operator";

/// Words kept lowercase by [`titlecase`] unless they start the phrase
const SMALL_WORDS: [&str; 12] = [
    "a", "an", "and", "as", "at", "by", "for", "in", "of", "on", "the", "to",
];

/// Static airport and airline name tables
#[derive(Debug, Clone, Default)]
pub struct NameDirectory {
    airports: HashMap<String, String>,
    airlines: HashMap<String, String>,
}

impl NameDirectory {
    pub fn new(airports: HashMap<String, String>, airlines: HashMap<String, String>) -> Self {
        Self { airports, airlines }
    }

    /// Load tables from JSON objects mapping code to name; missing paths give empty tables
    pub fn load(airports: Option<&Path>, airlines: Option<&Path>) -> TrackerResult<Self> {
        Ok(Self {
            airports: load_table(airports)?,
            airlines: load_table(airlines)?,
        })
    }

    /// Airport name by IATA code
    pub fn airport(&self, iata: &str) -> Option<&str> {
        self.airports.get(iata).map(String::as_str)
    }

    /// Airline name by ICAO code
    pub fn airline(&self, icao: &str) -> Option<&str> {
        self.airlines.get(icao).map(String::as_str)
    }
}

fn load_table(path: Option<&Path>) -> TrackerResult<HashMap<String, String>> {
    let Some(path) = path else {
        return Ok(HashMap::new());
    };

    let content = std::fs::read_to_string(path)?;
    let table: HashMap<String, String> = serde_json::from_str(&content).map_err(|e| {
        TrackerError::Config(format!("Invalid name table {}: {}", path.display(), e))
    })?;

    info!("Loaded {} names from {}", table.len(), path.display());
    Ok(table)
}

/// Operator name for an aircraft
///
/// Airliner-sized categories are looked up by the first three characters of
/// the flight designator. Otherwise, or on a miss, the registered operator is
/// title-cased.
pub fn resolve_airline(snapshot: &AircraftSnapshot, directory: &NameDirectory) -> String {
    let airline_category = snapshot
        .category
        .as_deref()
        .is_some_and(|category| AIRLINE_CATEGORIES.contains(&category));

    if airline_category {
        let from_code = snapshot
            .flight_number()
            .filter(|flight| flight.len() > 3)
            .and_then(|flight| flight.get(..3))
            .and_then(|icao| directory.airline(icao));
        if let Some(name) = from_code {
            return name.to_string();
        }
    }

    match snapshot.own_op.as_deref().map(str::trim) {
        Some(own_op) if !own_op.is_empty() => titlecase(own_op),
        _ => UNKNOWN_OPERATOR.to_string(),
    }
}

/// Title-case a phrase, keeping short joining words lowercase
pub fn titlecase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i > 0 && SMALL_WORDS.contains(&lower.as_str()) {
                return lower;
            }
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Prefix a word with "a" or "an"
pub fn articleise(word: &str) -> String {
    let starts_with_vowel = word
        .chars()
        .next()
        .is_some_and(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'));

    if starts_with_vowel {
        format!("an {}", word)
    } else {
        format!("a {}", word)
    }
}

/// Display name for the aircraft type
pub fn sanitise_model(desc: Option<&str>) -> String {
    match desc.map(str::trim) {
        Some(desc) if !desc.is_empty() => titlecase(desc),
        _ => titlecase("unknown aircraft"),
    }
}

/// Compose the announcement for one aircraft
///
/// `base_url` is the public address of the read API; the deep link points at
/// its `/go/:code` redirect and is only included when the transponder
/// address is known.
pub fn compose_message(
    snapshot: &AircraftSnapshot,
    flight: Option<&FlightRecord>,
    directory: &NameDirectory,
    base_url: &str,
) -> String {
    let airline = resolve_airline(snapshot, directory);
    let model = articleise(&sanitise_model(snapshot.desc.as_deref()));
    let flight_number = snapshot.flight_number().unwrap_or("unknown");

    let tag = snapshot
        .rego()
        .or_else(|| snapshot.hex.as_deref().and_then(normalize_identifier))
        .map(|id| format!(" ({})", id))
        .unwrap_or_default();

    let link = snapshot
        .hex
        .as_deref()
        .map(str::trim)
        .filter(|hex| !hex.is_empty())
        .map(|hex| format!(" {}/go/{}", base_url.trim_end_matches('/'), hex))
        .unwrap_or_default();

    if snapshot.category.as_deref() == Some(HELICOPTER_CATEGORY) {
        return format!("🚁 {} is flying {} helicopter{} overhead{}", airline, model, tag, link);
    }

    if let Some((origin, destination)) = flight.and_then(FlightRecord::route) {
        let origin_name = directory.airport(origin).unwrap_or(origin);
        let destination_name = directory.airport(destination).unwrap_or(destination);
        return format!(
            "✈️ {} flight {} from {} to {}, operating {}{} is passing overhead{}",
            airline, flight_number, origin_name, destination_name, model, tag, link
        );
    }

    format!(
        "{}, flight {} operating {}{} is passing overhead{}",
        airline, flight_number, model, tag, link
    )
}
