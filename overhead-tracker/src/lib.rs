//! overhead-tracker library interface
//!
//! Polls a public ADS-B feed, keeps a bounded track per aircraft, and
//! announces aircraft that enter the geofence. Exposed as a library so the
//! cycle can be driven directly from integration tests.

pub mod announce;
pub mod correlation;
pub mod cycle;
pub mod error;
pub mod feed;
pub mod geojson;
pub mod message;
pub mod notify;
pub mod persist;
pub mod tracks;

pub use crate::error::{TrackerError, TrackerResult};
pub use crate::cycle::{CycleConfig, CycleReport, IngestionCycle};
