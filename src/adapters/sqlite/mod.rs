//! SQLite database adapters for the geodispatch entity store.

pub mod area_repository;
pub mod connection;
pub mod event_repository;
pub mod layer_repository;
pub mod migrations;
pub mod task_record_repository;
pub mod widget_repository;

pub use area_repository::SqliteAreaRepository;
pub use connection::{create_pool, create_test_pool, ConnectionError};
pub use event_repository::SqliteEventRepository;
pub use layer_repository::SqliteLayerRepository;
pub use migrations::{migrate, schema_version, Migration, MigrationError, MIGRATIONS};
pub use task_record_repository::SqliteTaskRecordRepository;
pub use widget_repository::SqliteWidgetRepository;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::DatabaseConfig;
use crate::services::map_engine::Repositories;

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a `YYYY-MM-DD` string from a SQLite row field.
pub fn parse_date(s: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| DomainError::SerializationError(e.to_string()))
}

/// Parse an optional `YYYY-MM-DD` string from a SQLite row field.
pub fn parse_optional_date(s: Option<String>) -> DomainResult<Option<NaiveDate>> {
    s.map(|s| parse_date(&s)).transpose()
}

/// Encode an optional day as epoch milliseconds, `-1` when unset.
pub fn date_to_millis(date: Option<NaiveDate>) -> i64 {
    date.and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(-1, |dt| dt.and_utc().timestamp_millis())
}

/// Decode epoch milliseconds into a day; negative values mean unset.
pub fn millis_to_date(millis: i64) -> Option<NaiveDate> {
    if millis < 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

/// Parse a JSON string from a SQLite row field.
pub fn parse_json<T: serde::de::DeserializeOwned>(s: &str) -> DomainResult<T> {
    serde_json::from_str(s).map_err(|e| DomainError::SerializationError(e.to_string()))
}

/// Map a unique-index violation to a concurrency conflict.
pub(crate) fn map_unique_violation(err: sqlx::Error, entity: &str, id: &str) -> DomainError {
    let is_unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if is_unique {
        DomainError::ConcurrencyConflict {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    } else {
        DomainError::from(err)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
}

pub async fn initialize_database(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(config).await?;
    migrate(&pool, MIGRATIONS).await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    migrate(&pool, MIGRATIONS).await?;
    Ok(pool)
}

/// Entity store handles backed by one SQLite pool.
pub fn repositories(pool: SqlitePool) -> Repositories {
    Repositories {
        tasks: Arc::new(SqliteTaskRecordRepository::new(pool.clone())),
        areas: Arc::new(SqliteAreaRepository::new(pool.clone())),
        layers: Arc::new(SqliteLayerRepository::new(pool.clone())),
        events: Arc::new(SqliteEventRepository::new(pool.clone())),
        widgets: Arc::new(SqliteWidgetRepository::new(pool)),
    }
}
