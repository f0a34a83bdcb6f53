//! SQLite implementation of the EventRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{map_unique_violation, parse_date, parse_optional_date};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Event, EventType};
use crate::domain::ports::EventRepository;

#[derive(Clone)]
pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn insert(&self, event: &Event) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO events (id, area_id, event_type, bbox, start_date, peak_date,
               end_date, peak_value, in_going)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(&event.id)
        .bind(&event.area_id)
        .bind(event.event_type.as_str())
        .bind(&event.bbox)
        .bind(event.start_date.to_string())
        .bind(event.peak_date.to_string())
        .bind(event.end_date.map(|d| d.to_string()))
        .bind(event.peak_value)
        .bind(event.in_going)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "event", &event.id))?;

        Ok(())
    }

    async fn update(&self, event: &Event) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE events SET bbox = ?, start_date = ?, peak_date = ?, end_date = ?,
               peak_value = ?, in_going = ?
               WHERE id = ?"#
        )
        .bind(&event.bbox)
        .bind(event.start_date.to_string())
        .bind(event.peak_date.to_string())
        .bind(event.end_date.map(|d| d.to_string()))
        .bind(event.peak_value)
        .bind(event.in_going)
        .bind(&event.id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "event", &event.id))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EventNotFound(event.id.clone()));
        }

        Ok(())
    }

    async fn find_open(&self, area_id: &str, event_type: EventType) -> DomainResult<Option<Event>> {
        let row: Option<EventRow> =
            sqlx::query_as("SELECT * FROM events WHERE area_id = ? AND event_type = ? AND in_going = 1")
                .bind(area_id)
                .bind(event_type.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_by_area(&self, area_id: &str) -> DomainResult<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as("SELECT * FROM events WHERE area_id = ? ORDER BY start_date, id")
            .bind(area_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: String,
    area_id: String,
    event_type: String,
    bbox: String,
    start_date: String,
    peak_date: String,
    end_date: Option<String>,
    peak_value: f64,
    in_going: bool,
}

impl TryFrom<EventRow> for Event {
    type Error = DomainError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let event_type = EventType::from_str(&row.event_type)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid event type: {}", row.event_type)))?;

        Ok(Event {
            id: row.id,
            area_id: row.area_id,
            event_type,
            bbox: row.bbox,
            start_date: parse_date(&row.start_date)?,
            peak_date: parse_date(&row.peak_date)?,
            end_date: parse_optional_date(row.end_date)?,
            peak_value: row.peak_value,
            in_going: row.in_going,
        })
    }
}
