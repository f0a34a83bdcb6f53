//! SQLite implementation of the LayerRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::parse_datetime;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Layer;
use crate::domain::ports::LayerRepository;

#[derive(Clone)]
pub struct SqliteLayerRepository {
    pool: SqlitePool,
}

impl SqliteLayerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LayerRepository for SqliteLayerRepository {
    async fn insert(&self, layer: &Layer) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO layers (id, map_id, area_id, plugin_id, reference_date,
               link, source, published, published_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(&layer.id)
        .bind(&layer.map_id)
        .bind(&layer.area_id)
        .bind(&layer.plugin_id)
        .bind(&layer.reference_date)
        .bind(&layer.link)
        .bind(&layer.source)
        .bind(layer.published)
        .bind(layer.published_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Layer>> {
        let row: Option<LayerRow> = sqlx::query_as("SELECT * FROM layers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update(&self, layer: &Layer) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE layers SET map_id = ?, area_id = ?, plugin_id = ?, reference_date = ?,
               link = ?, source = ?, published = ?, published_at = ?
               WHERE id = ?"#
        )
        .bind(&layer.map_id)
        .bind(&layer.area_id)
        .bind(&layer.plugin_id)
        .bind(&layer.reference_date)
        .bind(&layer.link)
        .bind(&layer.source)
        .bind(layer.published)
        .bind(layer.published_at.to_rfc3339())
        .bind(&layer.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::LayerNotFound(layer.id.clone()));
        }

        Ok(())
    }

    async fn list_by_area(&self, area_id: &str, map_id: Option<&str>) -> DomainResult<Vec<Layer>> {
        let rows: Vec<LayerRow> = match map_id {
            Some(map_id) => {
                sqlx::query_as(
                    "SELECT * FROM layers WHERE area_id = ? AND map_id = ? ORDER BY reference_date, id",
                )
                .bind(area_id)
                .bind(map_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM layers WHERE area_id = ? ORDER BY reference_date, id")
                    .bind(area_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct LayerRow {
    id: String,
    map_id: String,
    area_id: String,
    plugin_id: String,
    reference_date: String,
    link: String,
    source: String,
    published: bool,
    published_at: String,
}

impl TryFrom<LayerRow> for Layer {
    type Error = DomainError;

    fn try_from(row: LayerRow) -> Result<Self, Self::Error> {
        Ok(Layer {
            id: row.id,
            map_id: row.map_id,
            area_id: row.area_id,
            plugin_id: row.plugin_id,
            reference_date: row.reference_date,
            link: row.link,
            source: row.source,
            published: row.published,
            published_at: parse_datetime(&row.published_at)?,
        })
    }
}
