//! Observation persistence
//!
//! Every aircraft with a resolvable registration gets its metadata upserted;
//! those with a position also get a location row. Storage errors are logged
//! and dropped so ingestion keeps running while the database is unavailable.

use overhead_common::models::{AircraftMetadata, LocationRecord};
use overhead_common::PositionStore;
use tracing::{debug, error};

use crate::message::{resolve_airline, NameDirectory};
use crate::tracks::TrackedAircraft;

/// Rows derived from one tracked aircraft
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub aircraft: AircraftMetadata,
    pub location: Option<LocationRecord>,
}

/// Build the rows for one cycle
///
/// `timestamp` is the cycle's local time, shared by every row so a cycle's
/// observations sort together.
pub fn build_observations(
    tracked: &[TrackedAircraft],
    timestamp: &str,
    directory: &NameDirectory,
) -> Vec<Observation> {
    tracked
        .iter()
        .filter_map(|entry| {
            let rego = entry.rego.clone()?;
            let snapshot = &entry.snapshot;

            let location = entry.position().map(|position| LocationRecord {
                timestamp: timestamp.to_string(),
                latitude: position.lat,
                longitude: position.lon,
                rego: rego.clone(),
                elevation: snapshot.elevation(),
            });

            let aircraft = AircraftMetadata {
                rego,
                model: snapshot.desc.clone(),
                airline: Some(resolve_airline(snapshot, directory)),
                category: snapshot.category.clone(),
                year: snapshot.year.clone(),
                own_op: snapshot.own_op.clone(),
            };

            Some(Observation { aircraft, location })
        })
        .collect()
}

/// Write a cycle's observations, logging and skipping failed rows
///
/// Returns the number of location rows written.
pub async fn persist_observations(store: &PositionStore, observations: Vec<Observation>) -> usize {
    let mut written = 0;

    for observation in observations {
        if let Err(e) = store.upsert_aircraft(&observation.aircraft).await {
            error!(rego = %observation.aircraft.rego, "Failed to save aircraft: {}", e);
        }

        if let Some(location) = &observation.location {
            match store.insert_location(location).await {
                Ok(()) => written += 1,
                Err(e) => error!(rego = %location.rego, "Failed to save location: {}", e),
            }
        }
    }

    debug!(written, "Persisted cycle observations");
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{AircraftSnapshot, BaroAltitude};

    fn tracked(rego: Option<&str>, position: Option<(f64, f64)>) -> TrackedAircraft {
        TrackedAircraft {
            snapshot: AircraftSnapshot {
                registration: rego.map(str::to_string),
                lon: position.map(|p| p.0),
                lat: position.map(|p| p.1),
                alt_baro: Some(BaroAltitude::Marker("ground".to_string())),
                desc: Some("CESSNA 172".to_string()),
                own_op: Some("FLYING CLUB".to_string()),
                ..Default::default()
            },
            rego: rego.map(str::to_string),
            track: None,
        }
    }

    #[test]
    fn test_rows_for_positioned_aircraft() {
        let rows = build_observations(
            &[tracked(Some("VH-ABC"), Some((153.0, -27.5)))],
            "2024-07-28T10:00:00",
            &NameDirectory::default(),
        );

        assert_eq!(rows.len(), 1);
        let location = rows[0].location.as_ref().unwrap();
        assert_eq!(location.timestamp, "2024-07-28T10:00:00");
        assert_eq!(location.longitude, 153.0);
        assert_eq!(location.elevation, Some(0.0));
        assert_eq!(rows[0].aircraft.model.as_deref(), Some("CESSNA 172"));
        assert_eq!(rows[0].aircraft.airline.as_deref(), Some("Flying Club"));
    }

    #[test]
    fn test_metadata_without_position() {
        let rows = build_observations(
            &[tracked(Some("VH-ABC"), None)],
            "2024-07-28T10:00:00",
            &NameDirectory::default(),
        );
        assert_eq!(rows.len(), 1);
        assert!(rows[0].location.is_none());
    }

    #[test]
    fn test_unresolvable_registration_skipped() {
        let rows = build_observations(
            &[tracked(None, Some((153.0, -27.5)))],
            "2024-07-28T10:00:00",
            &NameDirectory::default(),
        );
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_persist_writes_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = PositionStore::new(dir.path().join("flights.db"));
        let rows = build_observations(
            &[
                tracked(Some("VH-ABC"), Some((153.0, -27.5))),
                tracked(Some("VH-DEF"), None),
            ],
            "2024-07-28T10:00:00",
            &NameDirectory::default(),
        );

        assert_eq!(persist_observations(&store, rows).await, 1);

        let aircraft = store
            .query_aircraft_by_date_range("2024-07-28T00:00:00", "2024-07-28T23:59:59")
            .await
            .unwrap();
        assert_eq!(aircraft.len(), 1);
        assert_eq!(aircraft[0].rego, "VH-ABC");
    }

    #[tokio::test]
    async fn test_unavailable_store_is_not_fatal() {
        let store = PositionStore::read_only("/nonexistent/dir/flights.db");
        let rows = build_observations(
            &[tracked(Some("VH-ABC"), Some((153.0, -27.5)))],
            "2024-07-28T10:00:00",
            &NameDirectory::default(),
        );
        assert_eq!(persist_observations(&store, rows).await, 0);
    }
}
