//! # Catalog Schema Migrations
//!
//! The products, variants, media and product-log tables are created by the
//! SQL files under `migrations/sqlite/`, embedded at compile time.
//!
//! Files are applied in sequence order and recorded in `_sqlx_migrations`.
//! A shipped file is never edited; schema changes go in a new
//! `NNN_description.sql`.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every catalog migration not yet recorded as successful.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!(known = MIGRATOR.migrations.len(), "Applying catalog migrations");
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// How far the connected database's schema is behind this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaVersion {
    /// Migrations embedded in this build.
    pub known: usize,
    /// Migrations recorded as successfully applied.
    pub applied: usize,
}

impl SchemaVersion {
    /// True when every embedded migration has been applied.
    pub fn is_current(&self) -> bool {
        self.applied >= self.known
    }
}

/// Reads the applied-migration count.
///
/// Fails when the bookkeeping table is missing, i.e. the database was
/// opened with migrations disabled and never migrated.
pub async fn schema_version(pool: &SqlitePool) -> DbResult<SchemaVersion> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok(SchemaVersion {
        known: MIGRATOR.migrations.len(),
        applied: applied as usize,
    })
}
