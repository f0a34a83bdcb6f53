//! Compute dispatch client.
//!
//! Thin service over the [`ComputeBackend`] port that maps raw backend
//! statuses onto [`TaskStatus`] and logs every remote call.

use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;

use crate::domain::errors::DomainResult;
use crate::domain::models::{TaskRecord, TaskStatus};
use crate::domain::ports::ComputeBackend;

pub struct DispatchClient {
    backend: Arc<dyn ComputeBackend>,
}

impl DispatchClient {
    pub fn new(backend: Arc<dyn ComputeBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn open_workspace(&self, name: &str) -> DomainResult<String> {
        self.backend.open_or_create_workspace(name).await
    }

    #[instrument(skip(self, params), level = "debug")]
    pub async fn submit(&self, workspace_id: &str, processor: &str, params: &Map<String, Value>) -> DomainResult<String> {
        let job_id = self.backend.submit(workspace_id, processor, params).await?;
        tracing::info!(job_id = %job_id, processor, workspace_id, "job submitted");
        Ok(job_id)
    }

    /// Current status of the job behind `record`.
    pub async fn poll(&self, record: &TaskRecord) -> DomainResult<TaskStatus> {
        let raw = self.backend.get_status(&record.id).await?;
        let status = TaskStatus::from_remote(&raw);
        tracing::debug!(job_id = %record.id, remote_status = %raw, status = status.as_str(), "polled job");
        Ok(status)
    }

    pub async fn result_payload(&self, job_id: &str) -> DomainResult<Option<Value>> {
        self.backend.get_result_payload(job_id).await
    }

    pub async fn list_files(&self, workspace_id: &str) -> DomainResult<Vec<String>> {
        self.backend.list_workspace_files(workspace_id).await
    }

    pub async fn fetch(&self, workspace_id: &str, file_name: &str) -> DomainResult<PathBuf> {
        self.backend.fetch_file(workspace_id, file_name).await
    }
}
