//! Database schema migrations
//!
//! Versioned, additive migrations tracked in `schema_version`. Each migration
//! is idempotent: re-running it against a database that already has the
//! change is a no-op rather than an error.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Get current schema version from database
///
/// Returns 0 if schema_version has no rows
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    Ok(())
}

/// Migration v1: Add nullable elevation column to locations
///
/// Databases written before schema tracking existed may already carry the
/// column, so "duplicate column" is treated as already applied.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    match sqlx::query("ALTER TABLE locations ADD COLUMN elevation REAL")
        .execute(pool)
        .await
    {
        Ok(_) => {
            info!("Migration v1: Added elevation column to locations");
            Ok(())
        }
        Err(e) if is_duplicate_column(&e) => {
            info!("Migration v1: elevation column already present");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn is_duplicate_column(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_err) => db_err.message().contains("duplicate column name"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::{create_locations_table, init_database};

    async fn column_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('locations') WHERE name = 'elevation'",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_fresh_database_has_elevation() {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_database(&dir.path().join("fresh.db")).await.unwrap();

        assert_eq!(column_count(&pool).await, 1);
        assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_rerun_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_database(&dir.path().join("rerun.db")).await.unwrap();

        run_migrations(&pool).await.unwrap();
        assert_eq!(column_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_untracked_database_with_column_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");

        // A database from before schema tracking, already carrying the column
        {
            let pool = sqlx::SqlitePool::connect(&format!("sqlite://{}?mode=rwc", path.display()))
                .await
                .unwrap();
            create_locations_table(&pool).await.unwrap();
            sqlx::query("ALTER TABLE locations ADD COLUMN elevation REAL")
                .execute(&pool)
                .await
                .unwrap();
            pool.close().await;
        }

        let pool = init_database(&path).await.unwrap();
        assert_eq!(column_count(&pool).await, 1);
        assert_eq!(get_schema_version(&pool).await.unwrap(), 1);
    }
}
