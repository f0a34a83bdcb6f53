//! HTTP client for the remote compute backend.
//!
//! Wraps the backend's REST API: workspaces, processor runs, process
//! status and result payloads, and workspace file listing/download.
//! Transport failures, 5xx and 429 responses are retried with
//! exponential backoff; other client errors fail immediately.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ComputeConfig;
use crate::domain::ports::ComputeBackend;

#[derive(Debug, Deserialize)]
struct WorkspaceDto {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "processId")]
    process_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    #[serde(default)]
    files: Vec<String>,
}

/// HTTP-backed [`ComputeBackend`].
#[derive(Debug, Clone)]
pub struct HttpComputeBackend {
    http: Client,
    base_url: String,
    api_key: String,
    download_dir: PathBuf,
    initial_backoff: Duration,
    max_retry_elapsed: Duration,
}

impl HttpComputeBackend {
    pub fn new(config: &ComputeConfig) -> DomainResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::ComputeUnavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            download_dir: PathBuf::from(&config.download_dir),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_retry_elapsed: Duration::from_millis(config.max_retry_elapsed_ms),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        if self.api_key.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.api_key)
        }
    }

    /// Send a request built by `build`, retrying transient failures.
    ///
    /// Returns the first response that is neither a server error nor 429.
    async fn send<F>(&self, what: &str, build: F) -> DomainResult<Response>
    where
        F: Fn() -> RequestBuilder + Sync,
    {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_elapsed_time(Some(self.max_retry_elapsed))
            .build();

        let build = &build;
        let attempt = move || async move {
            let response = build().send().await.map_err(|e| {
                tracing::debug!(operation = what, error = %e, "compute request failed, retrying");
                backoff::Error::transient(DomainError::ComputeUnavailable(format!("{what}: {e}")))
            })?;

            let status = response.status();
            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                tracing::debug!(operation = what, %status, "compute backend busy, retrying");
                return Err(backoff::Error::transient(DomainError::ComputeUnavailable(format!(
                    "{what} returned {status}"
                ))));
            }
            Ok(response)
        };

        backoff::future::retry(policy, attempt).await
    }

    async fn expect_success(what: &str, response: Response) -> DomainResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(DomainError::ComputeUnavailable(format!("{what} returned {status}: {body}")))
    }

    async fn find_workspace(&self, name: &str) -> DomainResult<Option<String>> {
        let response = self
            .send("find_workspace", || {
                self.request(Method::GET, "/workspaces").query(&[("name", name)])
            })
            .await?;
        let response = Self::expect_success("find_workspace", response).await?;
        let workspaces: Vec<WorkspaceDto> = response.json().await?;

        Ok(workspaces
            .into_iter()
            .find(|ws| ws.name == name)
            .map(|ws| ws.id))
    }

    fn local_path(&self, workspace_id: &str, file_name: &str) -> PathBuf {
        let dir: String = workspace_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.download_dir.join(dir).join(file_name)
    }
}

#[async_trait]
impl ComputeBackend for HttpComputeBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn open_or_create_workspace(&self, name: &str) -> DomainResult<String> {
        if let Some(id) = self.find_workspace(name).await? {
            return Ok(id);
        }

        let body = json!({ "name": name });
        let response = self
            .send("create_workspace", || self.request(Method::POST, "/workspaces").json(&body))
            .await?;
        let response = Self::expect_success("create_workspace", response).await?;
        let created: WorkspaceDto = response.json().await?;

        tracing::info!(workspace = name, workspace_id = %created.id, "created compute workspace");
        Ok(created.id)
    }

    async fn submit(&self, workspace_id: &str, processor: &str, params: &Map<String, Value>) -> DomainResult<String> {
        let path = format!("/workspaces/{workspace_id}/processors/{processor}/run");
        let response = self
            .send("submit", || self.request(Method::POST, &path).json(params))
            .await?;
        let response = Self::expect_success("submit", response).await?;
        let submitted: SubmitResponse = response.json().await?;

        if submitted.process_id.is_empty() {
            return Err(DomainError::ComputeUnavailable(format!(
                "submit of {processor} returned an empty process id"
            )));
        }
        Ok(submitted.process_id)
    }

    async fn get_status(&self, job_id: &str) -> DomainResult<String> {
        let path = format!("/processes/{job_id}/status");
        let response = self.send("get_status", || self.request(Method::GET, &path)).await?;
        let response = Self::expect_success("get_status", response).await?;
        let status: StatusResponse = response.json().await?;
        Ok(status.status)
    }

    async fn get_result_payload(&self, job_id: &str) -> DomainResult<Option<Value>> {
        let path = format!("/processes/{job_id}/payload");
        let response = self
            .send("get_result_payload", || self.request(Method::GET, &path))
            .await?;

        if matches!(response.status(), StatusCode::NO_CONTENT | StatusCode::NOT_FOUND) {
            return Ok(None);
        }
        let response = Self::expect_success("get_result_payload", response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text).map(Some).map_err(|e| DomainError::MalformedResult {
            job_id: job_id.to_string(),
            reason: e.to_string(),
        })
    }

    async fn list_workspace_files(&self, workspace_id: &str) -> DomainResult<Vec<String>> {
        let path = format!("/workspaces/{workspace_id}/files");
        let response = self
            .send("list_workspace_files", || self.request(Method::GET, &path))
            .await?;
        let response = Self::expect_success("list_workspace_files", response).await?;
        let files: FilesResponse = response.json().await?;
        Ok(files.files)
    }

    async fn fetch_file(&self, workspace_id: &str, file_name: &str) -> DomainResult<PathBuf> {
        let path = format!("/workspaces/{workspace_id}/files/{file_name}");
        let response = self.send("fetch_file", || self.request(Method::GET, &path)).await?;
        let response = Self::expect_success("fetch_file", response).await?;
        let bytes = response.bytes().await?;

        let local = self.local_path(workspace_id, file_name);
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::ComputeUnavailable(format!("cannot create {}: {e}", parent.display())))?;
        }
        if let Err(e) = tokio::fs::write(&local, &bytes).await {
            let _ = tokio::fs::remove_file(&local).await;
            return Err(DomainError::ComputeUnavailable(format!("cannot write {}: {e}", local.display())));
        }

        tracing::debug!(file = file_name, path = %local.display(), bytes = bytes.len(), "fetched workspace file");
        Ok(local)
    }
}
