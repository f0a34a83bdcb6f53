use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{TaskRecord, TaskStatus};

/// Filters for querying task records. Unset fields match everything.
#[derive(Default, Debug, Clone)]
pub struct TaskRecordFilter {
    pub area_id: Option<String>,
    pub map_id: Option<String>,
    pub plugin_id: Option<String>,
    pub workspace_id: Option<String>,
    pub processor: Option<String>,
    pub reference_date: Option<String>,
    pub status: Option<TaskStatus>,
    /// Only CREATED and RUNNING records.
    pub active_only: bool,
    pub limit: Option<i64>,
}

impl TaskRecordFilter {
    pub fn for_area(area_id: impl Into<String>) -> Self {
        Self {
            area_id: Some(area_id.into()),
            ..Default::default()
        }
    }

    pub fn plugin(mut self, plugin_id: impl Into<String>) -> Self {
        self.plugin_id = Some(plugin_id.into());
        self
    }

    pub fn map(mut self, map_id: impl Into<String>) -> Self {
        self.map_id = Some(map_id.into());
        self
    }

    pub fn workspace(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    pub fn processor(mut self, processor: impl Into<String>) -> Self {
        self.processor = Some(processor.into());
        self
    }

    pub fn reference_date(mut self, date: impl Into<String>) -> Self {
        self.reference_date = Some(date.into());
        self
    }

    pub fn active(mut self) -> Self {
        self.active_only = true;
        self
    }
}

/// Repository port for the job ledger
#[async_trait]
pub trait TaskRecordRepository: Send + Sync {
    /// Insert a new record; fails with a concurrency conflict if another
    /// active record already holds the same dedup key
    async fn insert(&self, record: &TaskRecord) -> DomainResult<()>;

    /// Get a record by remote job id
    async fn get(&self, id: &str) -> DomainResult<Option<TaskRecord>>;

    /// Update only the status of a record
    async fn update_status(&self, id: &str, status: TaskStatus) -> DomainResult<()>;

    /// List records matching the filter, oldest first
    async fn list(&self, filter: TaskRecordFilter) -> DomainResult<Vec<TaskRecord>>;
}
