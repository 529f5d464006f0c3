//! # Overhead Common Library
//!
//! Shared code for the overhead tracker and its read API:
//! - Error and result types
//! - Settings and database path resolution
//! - Geofence geometry
//! - Timestamp helpers
//! - Position history models and the SQLite-backed store

pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use db::PositionStore;
pub use geo::{is_overhead, BoundingBox, Position};
