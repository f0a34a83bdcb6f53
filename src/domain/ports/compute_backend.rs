use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::domain::errors::DomainResult;

/// Port for the remote compute backend.
///
/// Jobs run inside named workspaces; a workspace exposes a flat namespace
/// of output files.
#[async_trait]
pub trait ComputeBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Open the workspace with this name, creating it if missing; returns its id
    async fn open_or_create_workspace(&self, name: &str) -> DomainResult<String>;

    /// Submit a processor run; returns the remote job id
    async fn submit(
        &self,
        workspace_id: &str,
        processor: &str,
        params: &Map<String, Value>,
    ) -> DomainResult<String>;

    /// Raw status string of a job (`RUNNING`, `DONE`, `ERROR`, `STOPPED`, ...)
    async fn get_status(&self, job_id: &str) -> DomainResult<String>;

    /// JSON result payload of a job, if the processor produced one
    async fn get_result_payload(&self, job_id: &str) -> DomainResult<Option<Value>>;

    /// File names currently in the workspace
    async fn list_workspace_files(&self, workspace_id: &str) -> DomainResult<Vec<String>>;

    /// Download a workspace file locally; returns the local path.
    /// The caller owns the copy and removes it once done.
    async fn fetch_file(&self, workspace_id: &str, file_name: &str) -> DomainResult<PathBuf>;
}
