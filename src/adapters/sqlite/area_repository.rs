//! SQLite implementation of the AreaRepository.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

use super::{date_to_millis, millis_to_date, parse_json};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Area, BoundingBox};
use crate::domain::ports::AreaRepository;

#[derive(Clone)]
pub struct SqliteAreaRepository {
    pool: SqlitePool,
}

impl SqliteAreaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AreaRepository for SqliteAreaRepository {
    async fn insert(&self, area: &Area) -> DomainResult<()> {
        let bbox_json = serde_json::to_string(&area.bbox)?;
        let plugins_json = serde_json::to_string(&area.plugins)?;

        sqlx::query(
            r#"INSERT INTO areas (id, name, polygon, bbox, plugins,
               archive_start_date, archive_end_date, active)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(&area.id)
        .bind(&area.name)
        .bind(&area.polygon)
        .bind(&bbox_json)
        .bind(&plugins_json)
        .bind(date_to_millis(area.archive_start_date))
        .bind(date_to_millis(area.archive_end_date))
        .bind(area.active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Area>> {
        let row: Option<AreaRow> = sqlx::query_as("SELECT * FROM areas WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, active_only: bool) -> DomainResult<Vec<Area>> {
        let query = if active_only {
            "SELECT * FROM areas WHERE active = 1 ORDER BY id"
        } else {
            "SELECT * FROM areas ORDER BY id"
        };

        let rows: Vec<AreaRow> = sqlx::query_as(query).fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_archive_window(
        &self,
        id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> DomainResult<()> {
        let result = sqlx::query("UPDATE areas SET archive_start_date = ?, archive_end_date = ? WHERE id = ?")
            .bind(date_to_millis(start))
            .bind(date_to_millis(end))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AreaNotFound(id.to_string()));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct AreaRow {
    id: String,
    name: String,
    polygon: String,
    bbox: String,
    plugins: String,
    archive_start_date: i64,
    archive_end_date: i64,
    active: bool,
}

impl TryFrom<AreaRow> for Area {
    type Error = DomainError;

    fn try_from(row: AreaRow) -> Result<Self, Self::Error> {
        let bbox: BoundingBox = parse_json(&row.bbox)?;
        let plugins: Vec<String> = parse_json(&row.plugins)?;

        Ok(Area {
            id: row.id,
            name: row.name,
            polygon: row.polygon,
            bbox,
            plugins,
            archive_start_date: millis_to_date(row.archive_start_date),
            archive_end_date: millis_to_date(row.archive_end_date),
            active: row.active,
        })
    }
}
