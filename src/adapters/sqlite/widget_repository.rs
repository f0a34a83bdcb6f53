//! SQLite implementation of the WidgetRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::BTreeMap;

use super::{map_unique_violation, parse_json};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::WidgetInfo;
use crate::domain::ports::WidgetRepository;

#[derive(Clone)]
pub struct SqliteWidgetRepository {
    pool: SqlitePool,
}

impl SqliteWidgetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WidgetRepository for SqliteWidgetRepository {
    async fn get(&self, id: &str) -> DomainResult<Option<WidgetInfo>> {
        let row: Option<WidgetRow> = sqlx::query_as("SELECT * FROM widget_infos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn insert(&self, widget: &WidgetInfo) -> DomainResult<()> {
        let contributors_json = serde_json::to_string(&widget.contributors)?;

        sqlx::query(
            r#"INSERT INTO widget_infos (id, kind, area_id, reference_date, value, contributors)
               VALUES (?, ?, ?, ?, ?, ?)"#
        )
        .bind(&widget.id)
        .bind(&widget.kind)
        .bind(&widget.area_id)
        .bind(&widget.reference_date)
        .bind(widget.value)
        .bind(&contributors_json)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "widget", &widget.id))?;

        Ok(())
    }

    async fn update(&self, widget: &WidgetInfo) -> DomainResult<()> {
        let contributors_json = serde_json::to_string(&widget.contributors)?;

        let result = sqlx::query("UPDATE widget_infos SET value = ?, contributors = ? WHERE id = ?")
            .bind(widget.value)
            .bind(&contributors_json)
            .bind(&widget.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::WidgetNotFound(widget.id.clone()));
        }

        Ok(())
    }

    async fn list_by_area(&self, area_id: &str) -> DomainResult<Vec<WidgetInfo>> {
        let rows: Vec<WidgetRow> =
            sqlx::query_as("SELECT * FROM widget_infos WHERE area_id = ? ORDER BY reference_date, kind")
                .bind(area_id)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct WidgetRow {
    id: String,
    kind: String,
    area_id: String,
    reference_date: String,
    value: f64,
    contributors: String,
}

impl TryFrom<WidgetRow> for WidgetInfo {
    type Error = DomainError;

    fn try_from(row: WidgetRow) -> Result<Self, Self::Error> {
        let contributors: BTreeMap<String, String> = parse_json(&row.contributors)?;

        Ok(WidgetInfo {
            id: row.id,
            kind: row.kind,
            area_id: row.area_id,
            reference_date: row.reference_date,
            value: row.value,
            contributors,
        })
    }
}
