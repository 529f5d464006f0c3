//! Ingestion cycle
//!
//! One cycle: fetch a snapshot, fold it into track history, hand the rows to
//! the store without waiting, export GeoJSON, then announce every aircraft
//! that is overhead and not recently announced.
//!
//! Track history and the announcement window share one lock. Accumulation,
//! geofencing and the dedup check-and-record all happen inside a single
//! critical section, so two cycles can never interleave on that state.
//! Correlation and notification run after the lock is released, bounded by
//! the correlation client's own permits.
//!
//! Cycles are single-flight: a tick that fires while the previous cycle is
//! still running is skipped with a warning.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use futures::future::join_all;
use overhead_common::config::Settings;
use overhead_common::time::{format_timestamp, now_at, offset_from_minutes};
use overhead_common::{is_overhead, BoundingBox, PositionStore};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::announce::AnnouncementWindow;
use crate::correlation::CorrelationClient;
use crate::feed::{normalize_identifier, SnapshotSource};
use crate::geojson::{feature_collection, write_snapshot};
use crate::message::{compose_message, NameDirectory};
use crate::notify::Notifier;
use crate::persist::{build_observations, persist_observations};
use crate::tracks::{TrackAccumulator, TrackedAircraft};
use crate::TrackerResult;

/// Per-deployment cycle parameters
#[derive(Debug, Clone)]
pub struct CycleConfig {
    pub geofence: BoundingBox,
    /// Public address of the read API, used for message deep links
    pub base_url: String,
    /// Offset applied to stored timestamps
    pub utc_offset: FixedOffset,
    /// Where to write the GeoJSON snapshot; `None` disables export
    pub geojson_path: Option<PathBuf>,
}

impl CycleConfig {
    pub fn from_settings(
        settings: &Settings,
        base_url: impl Into<String>,
        geojson_path: Option<PathBuf>,
    ) -> TrackerResult<Self> {
        Ok(Self {
            geofence: settings.geofence,
            base_url: base_url.into(),
            utc_offset: offset_from_minutes(settings.utc_offset_minutes)?,
            geojson_path,
        })
    }
}

/// Counts from one completed cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Aircraft in the snapshot
    pub observed: usize,
    /// Aircraft with a resolvable registration
    pub tracked: usize,
    /// Aircraft inside the geofence
    pub overhead: usize,
    /// Messages sent
    pub announced: usize,
}

struct TrackerState {
    tracks: TrackAccumulator,
    announcements: AnnouncementWindow,
}

/// Overhead candidate that passed the dedup gate
struct Announcement {
    aircraft: TrackedAircraft,
    identity: String,
}

pub struct IngestionCycle {
    config: CycleConfig,
    source: Arc<dyn SnapshotSource>,
    store: PositionStore,
    correlation: Arc<CorrelationClient>,
    notifier: Arc<dyn Notifier>,
    directory: Arc<NameDirectory>,
    state: Mutex<TrackerState>,
    running: Mutex<()>,
}

impl IngestionCycle {
    pub fn new(
        config: CycleConfig,
        source: Arc<dyn SnapshotSource>,
        store: PositionStore,
        correlation: Arc<CorrelationClient>,
        notifier: Arc<dyn Notifier>,
        directory: Arc<NameDirectory>,
    ) -> Self {
        Self {
            config,
            source,
            store,
            correlation,
            notifier,
            directory,
            state: Mutex::new(TrackerState {
                tracks: TrackAccumulator::new(),
                announcements: AnnouncementWindow::new(),
            }),
            running: Mutex::new(()),
        }
    }

    /// Run one cycle to completion
    ///
    /// Only a failed fetch is an error. Persistence, export, correlation and
    /// notification failures are logged inside their own steps.
    pub async fn run_once(&self) -> TrackerResult<CycleReport> {
        info!("tracking...");

        let snapshots = self.source.fetch().await?;
        let observed = snapshots.len();
        let timestamp = format_timestamp(&now_at(self.config.utc_offset));

        let (tracked, overhead, pending) = {
            let mut state = self.state.lock().await;
            let tracked = state.tracks.accumulate(snapshots);

            let overhead: Vec<&TrackedAircraft> = tracked
                .iter()
                .filter(|entry| {
                    entry
                        .position()
                        .is_some_and(|position| is_overhead(position, &self.config.geofence))
                })
                .collect();
            let overhead_count = overhead.len();

            let pending: Vec<Announcement> = overhead
                .into_iter()
                .filter_map(|entry| {
                    let identity = announcement_identity(entry);
                    if state.announcements.should_announce(&identity) {
                        Some(Announcement {
                            aircraft: entry.clone(),
                            identity,
                        })
                    } else {
                        debug!(id = %identity, "Already announced");
                        None
                    }
                })
                .collect();

            (tracked, overhead_count, pending)
        };

        let observations = build_observations(&tracked, &timestamp, &self.directory);
        let store = self.store.clone();
        tokio::spawn(async move {
            persist_observations(&store, observations).await;
        });

        if let Some(path) = &self.config.geojson_path {
            write_snapshot(path, &feature_collection(&tracked, &self.config.geofence)).await;
        }

        let announced = pending.len();
        join_all(pending.into_iter().map(|pending| self.announce(pending))).await;

        let report = CycleReport {
            observed,
            tracked: tracked.iter().filter(|entry| entry.rego.is_some()).count(),
            overhead,
            announced,
        };
        info!(
            observed = report.observed,
            tracked = report.tracked,
            overhead = report.overhead,
            announced = report.announced,
            "Cycle complete"
        );
        Ok(report)
    }

    async fn announce(&self, pending: Announcement) {
        let Announcement { aircraft, identity } = pending;

        let flight = match aircraft.position() {
            Some(position) => self.correlation.correlate(position, &identity).await,
            None => None,
        };

        let message = compose_message(
            &aircraft.snapshot,
            flight.as_ref(),
            &self.directory,
            &self.config.base_url,
        );
        self.notifier.notify(&message).await;
    }

    /// Run a cycle unless one is already in flight
    ///
    /// Returns `None` when the tick was skipped or the cycle failed.
    pub async fn tick(&self) -> Option<CycleReport> {
        let Ok(_running) = self.running.try_lock() else {
            warn!("Previous cycle still running, skipping tick");
            return None;
        };

        match self.run_once().await {
            Ok(report) => Some(report),
            Err(e) => {
                error!("Ingestion cycle failed: {}", e);
                None
            }
        }
    }

    /// Start the periodic trigger; the first cycle starts immediately
    pub fn spawn_scheduler(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        info!("Starting ingestion (interval: {}s)", period.as_secs());

        tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                timer.tick().await;
                let cycle = Arc::clone(&self);
                tokio::spawn(async move {
                    cycle.tick().await;
                });
            }
        })
    }

    /// Stored points for a registration
    pub async fn track_len(&self, rego: &str) -> usize {
        self.state.lock().await.tracks.track_len(rego)
    }

    /// Announcement window contents, most recent first
    pub async fn recent_announcements(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .announcements
            .recent()
            .map(str::to_string)
            .collect()
    }
}

/// Registration, or the transponder address for unregistered aircraft
fn announcement_identity(entry: &TrackedAircraft) -> String {
    entry
        .rego
        .clone()
        .or_else(|| entry.snapshot.hex.as_deref().and_then(normalize_identifier))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::AircraftSnapshot;

    #[test]
    fn test_identity_prefers_registration() {
        let entry = TrackedAircraft {
            snapshot: AircraftSnapshot {
                hex: Some("7c6b2d".to_string()),
                ..Default::default()
            },
            rego: Some("VH-VXA".to_string()),
            track: None,
        };
        assert_eq!(announcement_identity(&entry), "VH-VXA");
    }

    #[test]
    fn test_identity_falls_back_to_hex() {
        let entry = TrackedAircraft {
            snapshot: AircraftSnapshot {
                hex: Some(" 7c6b2d".to_string()),
                ..Default::default()
            },
            rego: None,
            track: None,
        };
        assert_eq!(announcement_identity(&entry), "7C6B2D");
    }

    #[test]
    fn test_config_from_settings() {
        let config =
            CycleConfig::from_settings(&Settings::default(), "http://localhost:3000", None).unwrap();
        assert_eq!(config.utc_offset.local_minus_utc(), 600 * 60);
        assert_eq!(config.geofence, BoundingBox::default());
    }
}
