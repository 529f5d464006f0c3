//! Database initialization
//!
//! Creates the database file and tables on first run, then brings older
//! databases up to date through the migration framework.

use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // WAL lets the read API scan history while the tracker appends
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Idempotent - safe to call on every startup
    create_schema_version_table(&pool).await?;
    create_locations_table(&pool).await?;
    create_aircraft_table(&pool).await?;

    crate::db::migrations::run_migrations(&pool).await?;

    create_indexes(&pool).await?;

    Ok(pool)
}

/// Connect to an existing database without write access
///
/// Used by the standalone read API, which must never create or alter the schema.
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!(
            "Database not found: {}. Run overhead-tracker first to create it.",
            db_path.display()
        )));
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .read_only(true)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    info!("Opened database read-only: {}", db_path.display());
    Ok(pool)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the locations table
///
/// Append-only position history. The nullable `elevation` column is added by
/// migration v1 so databases created before it existed upgrade the same way.
pub async fn create_locations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS locations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            rego TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the aircraft table
///
/// One row per registration holding the most recently observed metadata.
pub async fn create_aircraft_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS aircraft (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            rego TEXT NOT NULL UNIQUE,
            model TEXT,
            airline TEXT,
            category TEXT,
            year TEXT,
            own_op TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_locations_timestamp ON locations(timestamp)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_locations_rego ON locations(rego)")
        .execute(pool)
        .await?;

    Ok(())
}
