//! Position history store
//!
//! Owns the connection pool behind a one-time readiness cell: the first
//! operation to arrive initializes the schema and runs migrations, and every
//! concurrent caller waits on that same initialization instead of failing.
//! No read or write reaches SQLite before migration has completed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::db::init::{connect_readonly, init_database};
use crate::models::{
    AircraftMetadata, DateRange, GroupedTracks, LocationRecord, MISSING_ELEVATION,
};
use crate::Result;

/// Cloneable handle to the position history database
#[derive(Clone)]
pub struct PositionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    db_path: PathBuf,
    read_only: bool,
    pool: OnceCell<SqlitePool>,
}

impl PositionStore {
    /// Store that creates and migrates the database on first use
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self::build(db_path.into(), false)
    }

    /// Store over an existing database; writes are rejected by SQLite
    pub fn read_only(db_path: impl Into<PathBuf>) -> Self {
        Self::build(db_path.into(), true)
    }

    fn build(db_path: PathBuf, read_only: bool) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                db_path,
                read_only,
                pool: OnceCell::new(),
            }),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.inner.db_path
    }

    /// Wait for schema initialization, running it if nobody has yet
    pub async fn ready(&self) -> Result<()> {
        self.pool().await.map(|_| ())
    }

    /// Connection pool, available once the schema is ready
    pub async fn pool(&self) -> Result<&SqlitePool> {
        self.inner
            .pool
            .get_or_try_init(|| async {
                if self.inner.read_only {
                    connect_readonly(&self.inner.db_path).await
                } else {
                    init_database(&self.inner.db_path).await
                }
            })
            .await
    }

    /// Append one observation to position history
    pub async fn insert_location(&self, record: &LocationRecord) -> Result<()> {
        let pool = self.pool().await?;

        sqlx::query(
            "INSERT INTO locations (timestamp, latitude, longitude, rego, elevation)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.timestamp)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(&record.rego)
        .bind(record.elevation)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Insert or fully replace the metadata row for a registration
    ///
    /// Every column takes the latest value, including replacing a known value
    /// with NULL when the feed stops reporting it.
    pub async fn upsert_aircraft(&self, aircraft: &AircraftMetadata) -> Result<()> {
        let pool = self.pool().await?;

        sqlx::query(
            r#"
            INSERT INTO aircraft (rego, model, airline, category, year, own_op)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(rego) DO UPDATE SET
                model = excluded.model,
                airline = excluded.airline,
                category = excluded.category,
                year = excluded.year,
                own_op = excluded.own_op
            "#,
        )
        .bind(&aircraft.rego)
        .bind(&aircraft.model)
        .bind(&aircraft.airline)
        .bind(&aircraft.category)
        .bind(&aircraft.year)
        .bind(&aircraft.own_op)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Positions between two timestamps (inclusive), grouped by registration
    ///
    /// Points within a group are in timestamp order. Coordinates are rounded
    /// to four decimal places; a NULL elevation becomes [`MISSING_ELEVATION`].
    pub async fn query_by_date_range(&self, start: &str, end: &str) -> Result<GroupedTracks> {
        let pool = self.pool().await?;

        let rows: Vec<(String, f64, f64, Option<f64>)> = sqlx::query_as(
            r#"
            SELECT rego, longitude, latitude, elevation
            FROM locations
            WHERE timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

        debug!(start, end, rows = rows.len(), "Queried location history");

        let mut grouped = GroupedTracks::new();
        for (rego, longitude, latitude, elevation) in rows {
            grouped.entry(rego).or_default().points.push([
                round4(longitude),
                round4(latitude),
                elevation.unwrap_or(MISSING_ELEVATION),
            ]);
        }

        Ok(grouped)
    }

    /// Distinct aircraft observed at least once between two timestamps
    pub async fn query_aircraft_by_date_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<AircraftMetadata>> {
        let pool = self.pool().await?;

        let aircraft = sqlx::query_as::<_, AircraftMetadata>(
            r#"
            SELECT DISTINCT a.rego, a.model, a.airline, a.category, a.year, a.own_op
            FROM aircraft a
            INNER JOIN locations l ON l.rego = a.rego
            WHERE l.timestamp >= ? AND l.timestamp <= ?
            ORDER BY a.rego ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

        Ok(aircraft)
    }

    /// First and last calendar dates with any recorded position
    pub async fn available_date_range(&self) -> Result<DateRange> {
        let pool = self.pool().await?;

        let (first_date, last_date): (Option<String>, Option<String>) = sqlx::query_as(
            "SELECT MIN(substr(timestamp, 1, 10)), MAX(substr(timestamp, 1, 10)) FROM locations",
        )
        .fetch_one(pool)
        .await?;

        Ok(DateRange {
            first_date,
            last_date,
        })
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round4() {
        assert_eq!(round4(153.023_456_7), 153.0235);
        assert_eq!(round4(-27.465_34), -27.4653);
        assert_eq!(round4(1.0), 1.0);
    }

    #[tokio::test]
    async fn test_read_only_store_requires_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let store = PositionStore::read_only(dir.path().join("missing.db"));
        assert!(matches!(store.ready().await, Err(crate::Error::NotFound(_))));
    }
}
