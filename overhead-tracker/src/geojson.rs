//! GeoJSON snapshot export
//!
//! Each cycle the current picture (aircraft positions, their recent tracks and
//! the geofence outline) is written as one `FeatureCollection` for map
//! tooling to pick up.

use std::path::Path;

use overhead_common::BoundingBox;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::tracks::TrackedAircraft;

/// Build the collection for one cycle
///
/// Point features carry the raw snapshot fields as properties. A line is
/// only emitted once a track has two points.
pub fn feature_collection(tracked: &[TrackedAircraft], geofence: &BoundingBox) -> Value {
    let mut features = Vec::new();

    for entry in tracked {
        let Some(position) = entry.position() else {
            continue;
        };

        let properties = serde_json::to_value(&entry.snapshot).unwrap_or_else(|_| json!({}));
        features.push(json!({
            "type": "Feature",
            "properties": properties,
            "geometry": {
                "type": "Point",
                "coordinates": position.as_pair(),
            },
        }));

        if let Some(track) = entry.track.as_ref().filter(|track| track.len() > 1) {
            features.push(json!({
                "type": "Feature",
                "properties": { "rego": entry.rego },
                "geometry": {
                    "type": "LineString",
                    "coordinates": track,
                },
            }));
        }
    }

    features.push(json!({
        "type": "Feature",
        "properties": {},
        "geometry": {
            "type": "Polygon",
            "coordinates": [geofence.ring()],
        },
    }));

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Write a collection to disk; failures are logged
pub async fn write_snapshot(path: &Path, collection: &Value) {
    let body = match serde_json::to_vec(collection) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to encode GeoJSON snapshot: {}", e);
            return;
        }
    };

    match tokio::fs::write(path, body).await {
        Ok(()) => debug!(path = %path.display(), "Wrote GeoJSON snapshot"),
        Err(e) => error!(path = %path.display(), "Failed to write GeoJSON snapshot: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::AircraftSnapshot;

    fn tracked(rego: &str, track: Vec<[f64; 2]>) -> TrackedAircraft {
        let [lon, lat] = *track.last().unwrap();
        TrackedAircraft {
            snapshot: AircraftSnapshot {
                registration: Some(rego.to_string()),
                lon: Some(lon),
                lat: Some(lat),
                ..Default::default()
            },
            rego: Some(rego.to_string()),
            track: Some(track),
        }
    }

    fn geometry_types(collection: &Value) -> Vec<String> {
        collection["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["geometry"]["type"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_single_point_has_no_line() {
        let collection = feature_collection(
            &[tracked("VH-ABC", vec![[153.0, -27.5]])],
            &BoundingBox::default(),
        );
        assert_eq!(collection["type"], "FeatureCollection");
        assert_eq!(geometry_types(&collection), vec!["Point", "Polygon"]);
        assert_eq!(collection["features"][0]["properties"]["r"], "VH-ABC");
    }

    #[test]
    fn test_track_becomes_line() {
        let collection = feature_collection(
            &[tracked("VH-ABC", vec![[153.0, -27.5], [153.01, -27.49]])],
            &BoundingBox::default(),
        );
        assert_eq!(geometry_types(&collection), vec!["Point", "LineString", "Polygon"]);
        assert_eq!(
            collection["features"][1]["geometry"]["coordinates"],
            json!([[153.0, -27.5], [153.01, -27.49]])
        );
    }

    #[test]
    fn test_unpositioned_aircraft_omitted() {
        let unpositioned = TrackedAircraft {
            snapshot: AircraftSnapshot::default(),
            rego: None,
            track: None,
        };
        let collection = feature_collection(&[unpositioned], &BoundingBox::default());
        assert_eq!(geometry_types(&collection), vec!["Polygon"]);
    }

    #[test]
    fn test_geofence_ring_closed() {
        let geofence = BoundingBox::new(1.0, 2.0, -1.0, -2.0);
        let collection = feature_collection(&[], &geofence);
        let ring = &collection["features"][0]["geometry"]["coordinates"][0];
        assert_eq!(ring, &json!([[-2.0, 1.0], [2.0, 1.0], [2.0, -1.0], [-2.0, -1.0], [-2.0, 1.0]]));
    }

    #[tokio::test]
    async fn test_write_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flights.geo.json");
        let collection = feature_collection(&[], &BoundingBox::default());

        write_snapshot(&path, &collection).await;

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, collection);
    }

    #[tokio::test]
    async fn test_write_failure_is_logged_not_raised() {
        let collection = feature_collection(&[], &BoundingBox::default());
        write_snapshot(Path::new("/nonexistent/dir/out.json"), &collection).await;
    }
}
