//! Embedded schema migrations.

use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration {version} failed: {source}")]
    Apply {
        version: i64,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to read schema version: {0}")]
    Version(#[source] sqlx::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub sql: &'static str,
}

/// Migrations compiled into the binary, in version order.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "task ledger, areas, layers, events and widgets",
    sql: include_str!("../../../migrations/001_initial_schema.sql"),
}];

/// Highest applied migration version; 0 for a fresh database.
pub async fn schema_version(pool: &SqlitePool) -> Result<i64, MigrationError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now')),
            description TEXT
        )",
    )
    .execute(pool)
    .await
    .map_err(MigrationError::Version)?;

    let (version,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .map_err(MigrationError::Version)?;
    Ok(version)
}

/// Apply every migration newer than the schema version, each in its own
/// transaction. Returns how many were applied.
pub async fn migrate(pool: &SqlitePool, migrations: &[Migration]) -> Result<usize, MigrationError> {
    let current = schema_version(pool).await?;
    let mut applied = 0;

    for migration in migrations.iter().filter(|m| m.version > current) {
        let fail = |source| MigrationError::Apply {
            version: migration.version,
            source,
        };
        let mut tx = pool.begin().await.map_err(fail)?;
        sqlx::raw_sql(migration.sql).execute(&mut *tx).await.map_err(fail)?;
        sqlx::query("INSERT INTO schema_migrations (version, description) VALUES (?, ?)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(fail)?;
        tx.commit().await.map_err(fail)?;

        tracing::debug!(version = migration.version, description = migration.description, "applied migration");
        applied += 1;
    }

    Ok(applied)
}
