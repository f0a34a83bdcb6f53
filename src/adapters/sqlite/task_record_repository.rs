//! SQLite implementation of the TaskRecordRepository (the job ledger).

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{map_unique_violation, parse_datetime, parse_json};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{TaskPayload, TaskRecord, TaskStatus};
use crate::domain::ports::{TaskRecordFilter, TaskRecordRepository};

#[derive(Clone)]
pub struct SqliteTaskRecordRepository {
    pool: SqlitePool,
}

impl SqliteTaskRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRecordRepository for SqliteTaskRecordRepository {
    async fn insert(&self, record: &TaskRecord) -> DomainResult<()> {
        let params_json = serde_json::to_string(&record.input_params)?;
        let payload_json = serde_json::to_string(&record.payload)?;
        let dedup_key = record.dedup_key();

        sqlx::query(
            r#"INSERT INTO task_records (id, area_id, map_id, plugin_id, workspace_id,
               started_at, processor, reference_date, input_params, payload, status, dedup_key)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(&record.id)
        .bind(&record.area_id)
        .bind(&record.map_id)
        .bind(&record.plugin_id)
        .bind(&record.workspace_id)
        .bind(record.started_at.to_rfc3339())
        .bind(&record.processor)
        .bind(&record.reference_date)
        .bind(&params_json)
        .bind(&payload_json)
        .bind(record.status.as_str())
        .bind(&dedup_key)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "task_record", &dedup_key))?;

        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<TaskRecord>> {
        let row: Option<TaskRecordRow> = sqlx::query_as("SELECT * FROM task_records WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_status(&self, id: &str, status: TaskStatus) -> DomainResult<()> {
        let result = sqlx::query("UPDATE task_records SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TaskRecordNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn list(&self, filter: TaskRecordFilter) -> DomainResult<Vec<TaskRecord>> {
        let mut query = String::from("SELECT * FROM task_records WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        let columns = [
            ("area_id", &filter.area_id),
            ("map_id", &filter.map_id),
            ("plugin_id", &filter.plugin_id),
            ("workspace_id", &filter.workspace_id),
            ("processor", &filter.processor),
            ("reference_date", &filter.reference_date),
        ];
        for (column, value) in columns {
            if let Some(value) = value {
                query.push_str(&format!(" AND {column} = ?"));
                bindings.push(value.clone());
            }
        }
        if let Some(status) = &filter.status {
            query.push_str(" AND status = ?");
            bindings.push(status.as_str().to_string());
        }
        if filter.active_only {
            query.push_str(" AND status IN ('created', 'running')");
        }

        query.push_str(" ORDER BY started_at, id");
        if let Some(limit) = filter.limit {
            query.push_str(&format!(" LIMIT {limit}"));
        }

        let mut q = sqlx::query_as::<_, TaskRecordRow>(&query);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let rows: Vec<TaskRecordRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct TaskRecordRow {
    id: String,
    area_id: String,
    map_id: String,
    plugin_id: String,
    workspace_id: String,
    started_at: String,
    processor: String,
    reference_date: String,
    input_params: String,
    payload: String,
    status: String,
}

impl TryFrom<TaskRecordRow> for TaskRecord {
    type Error = DomainError;

    fn try_from(row: TaskRecordRow) -> Result<Self, Self::Error> {
        let status = TaskStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid status: {}", row.status)))?;
        let payload: TaskPayload = parse_json(&row.payload)?;

        Ok(TaskRecord {
            id: row.id,
            area_id: row.area_id,
            map_id: row.map_id,
            plugin_id: row.plugin_id,
            workspace_id: row.workspace_id,
            started_at: parse_datetime(&row.started_at)?,
            processor: row.processor,
            reference_date: row.reference_date,
            input_params: parse_json(&row.input_params)?,
            payload,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_test_repo() -> SqliteTaskRecordRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteTaskRecordRepository::new(pool)
    }

    fn short_archive(id: &str) -> TaskRecord {
        TaskRecord::new(id, "A1", "sar_flood", "flood", "ws-1", "edrift_flood")
            .with_payload(TaskPayload::ShortArchive)
    }

    #[tokio::test]
    async fn test_insert_and_get_record() {
        let repo = setup_test_repo().await;
        let record = short_archive("job-1");

        repo.insert(&record).await.unwrap();

        let retrieved = repo.get("job-1").await.unwrap().unwrap();
        assert_eq!(retrieved.payload, TaskPayload::ShortArchive);
        assert_eq!(retrieved.status, TaskStatus::Created);
        assert_eq!(retrieved.map_id, "sar_flood");
    }

    #[tokio::test]
    async fn test_second_active_record_for_same_unit_conflicts() {
        let repo = setup_test_repo().await;
        repo.insert(&short_archive("job-1")).await.unwrap();

        let err = repo.insert(&short_archive("job-2")).await.unwrap_err();
        assert!(matches!(err, DomainError::ConcurrencyConflict { .. }));
    }

    #[tokio::test]
    async fn test_terminal_record_frees_the_unit() {
        let repo = setup_test_repo().await;
        repo.insert(&short_archive("job-1")).await.unwrap();
        repo.update_status("job-1", TaskStatus::Error).await.unwrap();

        repo.insert(&short_archive("job-2")).await.unwrap();
        let all = repo.list(TaskRecordFilter::for_area("A1")).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let repo = setup_test_repo().await;
        repo.insert(&short_archive("job-1")).await.unwrap();
        repo.insert(
            &TaskRecord::new("job-2", "A1", "sar_flood", "flood", "ws-1", "edrift_flood")
                .with_payload(TaskPayload::Daily)
                .with_reference_date("2024-05-07"),
        )
        .await
        .unwrap();
        repo.insert(&TaskRecord::new("job-3", "A2", "active_fire", "fire", "ws-2", "fire_proc"))
            .await
            .unwrap();
        repo.update_status("job-1", TaskStatus::Done).await.unwrap();

        let a1 = repo.list(TaskRecordFilter::for_area("A1").plugin("flood")).await.unwrap();
        assert_eq!(a1.len(), 2);

        let dated = repo
            .list(TaskRecordFilter::for_area("A1").reference_date("2024-05-07"))
            .await
            .unwrap();
        assert_eq!(dated.len(), 1);
        assert_eq!(dated[0].id, "job-2");

        let active = repo.list(TaskRecordFilter::default().active()).await.unwrap();
        let ids: Vec<_> = active.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains(&"job-1"));
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let repo = setup_test_repo().await;
        let err = repo.update_status("missing", TaskStatus::Done).await.unwrap_err();
        assert!(matches!(err, DomainError::TaskRecordNotFound(_)));
    }
}
