//! In-memory compute backend for testing.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::ComputeBackend;

/// A job submission observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub job_id: String,
    pub workspace_id: String,
    pub processor: String,
    pub params: Map<String, Value>,
}

/// Mock compute backend.
///
/// New jobs report `RUNNING` until a test moves them with [`set_status`].
/// Workspace files are only names; [`fetch_file`] touches disk only when a
/// download directory is set with [`with_download_dir`].
///
/// [`set_status`]: MockComputeBackend::set_status
/// [`fetch_file`]: ComputeBackend::fetch_file
/// [`with_download_dir`]: MockComputeBackend::with_download_dir
#[derive(Default, Clone)]
pub struct MockComputeBackend {
    workspaces: Arc<RwLock<HashMap<String, String>>>,
    submissions: Arc<RwLock<Vec<Submission>>>,
    statuses: Arc<RwLock<HashMap<String, String>>>,
    payloads: Arc<RwLock<HashMap<String, Value>>>,
    files: Arc<RwLock<HashMap<String, Vec<String>>>>,
    next_id: Arc<AtomicU64>,
    unavailable: Arc<AtomicBool>,
    download_dir: Option<PathBuf>,
}

impl MockComputeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an empty local copy under `dir` for every fetched file.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}-{n}")
    }

    fn check_available(&self) -> DomainResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::ComputeUnavailable("mock backend is down".to_string()));
        }
        Ok(())
    }

    /// Make every call fail with `ComputeUnavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn set_status(&self, job_id: &str, status: &str) {
        self.statuses.write().await.insert(job_id.to_string(), status.to_string());
    }

    /// Set the status of every submitted job.
    pub async fn set_all_statuses(&self, status: &str) {
        let jobs: Vec<String> = self.submissions.read().await.iter().map(|s| s.job_id.clone()).collect();
        let mut statuses = self.statuses.write().await;
        for job in jobs {
            statuses.insert(job, status.to_string());
        }
    }

    pub async fn set_payload(&self, job_id: &str, payload: Value) {
        self.payloads.write().await.insert(job_id.to_string(), payload);
    }

    pub async fn add_file(&self, workspace_id: &str, file_name: &str) {
        self.files
            .write()
            .await
            .entry(workspace_id.to_string())
            .or_default()
            .push(file_name.to_string());
    }

    /// Id of the workspace opened under `name`, if any.
    pub async fn workspace_id(&self, name: &str) -> Option<String> {
        self.workspaces.read().await.get(name).cloned()
    }

    pub async fn submissions(&self) -> Vec<Submission> {
        self.submissions.read().await.clone()
    }

    pub async fn submissions_for(&self, processor: &str) -> Vec<Submission> {
        self.submissions
            .read()
            .await
            .iter()
            .filter(|s| s.processor == processor)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ComputeBackend for MockComputeBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn open_or_create_workspace(&self, name: &str) -> DomainResult<String> {
        self.check_available()?;
        let mut workspaces = self.workspaces.write().await;
        let id = workspaces
            .entry(name.to_string())
            .or_insert_with(|| self.next_id("ws"))
            .clone();
        Ok(id)
    }

    async fn submit(&self, workspace_id: &str, processor: &str, params: &Map<String, Value>) -> DomainResult<String> {
        self.check_available()?;
        let job_id = self.next_id("job");
        self.submissions.write().await.push(Submission {
            job_id: job_id.clone(),
            workspace_id: workspace_id.to_string(),
            processor: processor.to_string(),
            params: params.clone(),
        });
        self.statuses.write().await.insert(job_id.clone(), "RUNNING".to_string());
        Ok(job_id)
    }

    async fn get_status(&self, job_id: &str) -> DomainResult<String> {
        self.check_available()?;
        Ok(self
            .statuses
            .read()
            .await
            .get(job_id)
            .cloned()
            .unwrap_or_else(|| "RUNNING".to_string()))
    }

    async fn get_result_payload(&self, job_id: &str) -> DomainResult<Option<Value>> {
        self.check_available()?;
        Ok(self.payloads.read().await.get(job_id).cloned())
    }

    async fn list_workspace_files(&self, workspace_id: &str) -> DomainResult<Vec<String>> {
        self.check_available()?;
        Ok(self.files.read().await.get(workspace_id).cloned().unwrap_or_default())
    }

    async fn fetch_file(&self, workspace_id: &str, file_name: &str) -> DomainResult<PathBuf> {
        self.check_available()?;
        let Some(dir) = &self.download_dir else {
            return Ok(PathBuf::from("mock").join(workspace_id).join(file_name));
        };
        let local = dir.join(workspace_id).join(file_name);
        let write = async {
            if let Some(parent) = local.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&local, b"").await
        };
        write
            .await
            .map_err(|e| DomainError::ComputeUnavailable(format!("cannot write {}: {e}", local.display())))?;
        Ok(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_workspace_is_reused_by_name() {
        let backend = MockComputeBackend::new();
        let first = backend.open_or_create_workspace("A1|flood|sar_flood").await.unwrap();
        let second = backend.open_or_create_workspace("A1|flood|sar_flood").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_submitted_jobs_run_until_moved() {
        let backend = MockComputeBackend::new();
        let job = backend.submit("ws-1", "proc", &Map::new()).await.unwrap();
        assert_eq!(backend.get_status(&job).await.unwrap(), "RUNNING");

        backend.set_status(&job, "DONE").await;
        assert_eq!(backend.get_status(&job).await.unwrap(), "DONE");
        assert_eq!(backend.submissions_for("proc").await.len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_backend_fails_calls() {
        let backend = MockComputeBackend::new();
        backend.set_unavailable(true);
        let err = backend.submit("ws-1", "proc", &Map::new()).await.unwrap_err();
        assert!(err.is_collaborator_unavailable());
    }
}
